use super::model::{PageState, Section};
use crate::invites::template::escape_html;

pub const SECTIONS: &[Section] = &[
    Section {
        id: "how-it-works",
        title: "How CLARENCE works",
        body: "Customers describe the service they need, invite providers, and negotiate every clause in one shared workspace.",
    },
    Section {
        id: "for-customers",
        title: "For customers",
        body: "Compare provider positions side by side and see where agreement is close and where it is not.",
    },
    Section {
        id: "for-providers",
        title: "For providers",
        body: "Respond to invitations, propose alternative terms, and keep a record of every concession.",
    },
    Section {
        id: "beta",
        title: "Join the beta",
        body: "Beta testers get early access to new negotiation features and a direct line to the team.",
    },
];

/// Render the marketing page. Expanded sections are rendered open; the
/// scroll target, if any, is passed to the page script.
pub fn render_page(state: &PageState) -> String {
    let mut nav = String::new();
    let mut sections = String::new();
    for section in SECTIONS {
        nav.push_str(&format!(
            "<a href=\"#{id}\" data-scroll-to=\"{id}\">{title}</a>\n",
            id = section.id,
            title = escape_html(section.title)
        ));
        sections.push_str(&format!(
            "<details id=\"{id}\"{open}>\n<summary>{title}</summary>\n<p>{body}</p>\n</details>\n",
            id = section.id,
            open = if state.is_expanded(section.id) { " open" } else { "" },
            title = escape_html(section.title),
            body = escape_html(section.body)
        ));
    }

    let scroll_target = state
        .scroll_target()
        .map(|target| format!(" data-scroll-target=\"{}\"", escape_html(target)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>CLARENCE</title></head>
<body{scroll_target}>
<header><h1>CLARENCE</h1><p>Contract negotiation, without the back and forth.</p></header>
<nav>
{nav}</nav>
<main>
{sections}</main>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_section_collapsed_by_default() {
        let html = render_page(&PageState::default());
        for section in SECTIONS {
            assert!(html.contains(&format!("<details id=\"{}\">", section.id)));
        }
        assert!(!html.contains("data-scroll-target"));
    }

    #[test]
    fn renders_state() {
        let mut state = PageState::default();
        state.toggle("beta");
        state.scroll_to("beta");
        let html = render_page(&state);
        assert!(html.contains("<details id=\"beta\" open>"));
        assert!(html.contains("<body data-scroll-target=\"beta\">"));
    }
}
