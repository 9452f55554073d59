use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub id: &'static str,
    pub title: &'static str,
    pub body: &'static str,
}

/// Client-side view state: which sections are expanded and where to scroll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    expanded: BTreeSet<String>,
    scroll_target: Option<String>,
}

impl PageState {
    /// Expand a collapsed section or collapse an expanded one.
    /// Returns whether the section is expanded afterwards.
    pub fn toggle(&mut self, section_id: &str) -> bool {
        if self.expanded.remove(section_id) {
            false
        } else {
            self.expanded.insert(section_id.to_string());
            true
        }
    }

    pub fn is_expanded(&self, section_id: &str) -> bool {
        self.expanded.contains(section_id)
    }

    pub fn scroll_to(&mut self, section_id: &str) {
        self.scroll_target = Some(section_id.to_string());
    }

    pub fn clear_scroll(&mut self) {
        self.scroll_target = None;
    }

    pub fn scroll_target(&self) -> Option<&str> {
        self.scroll_target.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_expansion() {
        let mut state = PageState::default();
        assert!(state.toggle("how-it-works"));
        assert!(state.is_expanded("how-it-works"));
        assert!(!state.toggle("how-it-works"));
        assert!(!state.is_expanded("how-it-works"));
    }

    #[test]
    fn sections_toggle_independently() {
        let mut state = PageState::default();
        state.toggle("faq");
        state.toggle("pricing");
        state.toggle("faq");
        assert!(!state.is_expanded("faq"));
        assert!(state.is_expanded("pricing"));
    }

    #[test]
    fn scroll_target_is_replaced_and_cleared() {
        let mut state = PageState::default();
        state.scroll_to("pricing");
        state.scroll_to("faq");
        assert_eq!(state.scroll_target(), Some("faq"));
        state.clear_scroll();
        assert_eq!(state.scroll_target(), None);
    }
}
