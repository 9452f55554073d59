//! Repair UTF-8 text that was decoded as Windows-1252 or Latin-1 and
//! saved again as UTF-8 (mojibake such as `cafÃ©` for `café`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Longest line excerpt kept in a [`LineChange`].
const SAMPLE_WIDTH: usize = 80;
const MAX_SAMPLES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Cp1252,
    Latin1,
}

/// Tried in this order: cp1252 first, it covers smart quotes and dashes.
pub const CODECS: [Codec; 2] = [Codec::Cp1252, Codec::Latin1];

/// Windows-1252 bytes 0x80..=0x9F. `None` marks the five unassigned bytes.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20ac}'), None, Some('\u{201a}'), Some('\u{0192}'),
    Some('\u{201e}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02c6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017d}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201c}'),
    Some('\u{201d}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02dc}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203a}'),
    Some('\u{0153}'), None, Some('\u{017e}'), Some('\u{0178}'),
];

impl Codec {
    pub fn name(self) -> &'static str {
        match self {
            Codec::Cp1252 => "cp1252",
            Codec::Latin1 => "latin-1",
        }
    }

    fn encode_char(self, c: char) -> Option<u8> {
        let code = c as u32;
        match self {
            Codec::Latin1 => u8::try_from(code).ok(),
            Codec::Cp1252 => match code {
                0x80..=0x9f => None,
                0..=0xff => Some(code as u8),
                _ => CP1252_HIGH
                    .iter()
                    .position(|mapped| *mapped == Some(c))
                    .map(|i| 0x80 + i as u8),
            },
        }
    }

    /// Encode `text` in this codec. `None` when a character has no byte.
    pub fn encode(self, text: &str) -> Option<Vec<u8>> {
        text.chars().map(|c| self.encode_char(c)).collect()
    }
}

/// Undo one wrong decode: encode with `codec`, decode the bytes as UTF-8.
pub fn reverse(text: &str, codec: Codec) -> Option<String> {
    String::from_utf8(codec.encode(text)?).ok()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Repair one run of garbled characters, twice if it was encoded three times.
pub fn fix_segment(segment: &str) -> String {
    for codec in CODECS {
        if let Some(fixed) = reverse(segment, codec) {
            if let Some(again) = reverse(&fixed, codec) {
                if again != fixed && char_len(&again) < char_len(&fixed) {
                    return again;
                }
            }
            return fixed;
        }
    }
    segment.to_string()
}

/// Repair each run of non-ASCII characters that starts at U+00C0 or above,
/// leaving the rest of the line alone.
pub fn fix_line_segments(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] as u32 >= 0xc0 {
            let end = chars[i..]
                .iter()
                .position(|c| (*c as u32) < 0x80)
                .map_or(chars.len(), |n| i + n);
            let segment: String = chars[i..end].iter().collect();
            out.push_str(&fix_segment(&segment));
            i = end;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    FullFile(Codec),
    LineByLine { lines_fixed: usize },
    Unchanged,
}

/// Codec reversal over the whole text, then per line, then per segment.
pub fn reverse_codec(content: &str) -> (String, Method) {
    for codec in CODECS {
        if let Some(fixed) = reverse(content, codec) {
            if char_len(&fixed) < char_len(content) {
                return (fixed, Method::FullFile(codec));
            }
        }
    }

    let mut lines_fixed = 0;
    let lines: Vec<String> = content
        .split('\n')
        .map(|line| {
            let fixed = CODECS
                .iter()
                .find_map(|codec| reverse(line, *codec))
                .unwrap_or_else(|| fix_line_segments(line));
            if fixed != line {
                lines_fixed += 1;
            }
            fixed
        })
        .collect();

    let method = if lines_fixed > 0 {
        Method::LineByLine { lines_fixed }
    } else {
        Method::Unchanged
    };
    (lines.join("\n"), method)
}

/// Sequences holding C1 control characters, which no codec pass can reverse.
pub const CONTROL_CHAR_FIXES: &[(&str, &str, &str)] = &[
    ("\u{e2}\u{2020}\u{90}", "\u{2190}", "left arrow"),
    ("\u{e2}\u{153}\u{8f}\u{ef}\u{b8}\u{8f}", "\u{270f}\u{fe0f}", "pencil"),
    ("\u{e2}\u{153}\u{8f}", "\u{270f}", "pencil"),
    ("\u{e2}\u{161}\u{a0}", "\u{26a0}", "warning"),
    ("\u{e2}\u{161}\u{a1}", "\u{26a1}", "lightning"),
    ("\u{e2}\u{178}\u{b3}", "\u{27f3}", "reload"),
];

/// Direct replacements, applied only when garbled markers survive.
pub const KNOWN_REPLACEMENTS: &[(&str, &str, &str)] = &[
    ("\u{e2}\u{153}\u{201c}", "\u{2713}", "checkmark"),
    ("\u{e2}\u{153}\u{2022}", "\u{2715}", "X mark"),
    ("\u{e2}\u{153}\u{201d}", "\u{2713}", "checkmark variant"),
    ("\u{e2}\u{2013}\u{b6}", "\u{25b6}", "triangle right"),
    ("\u{e2}\u{2020}\u{2019}", "\u{2192}", "right arrow"),
    ("\u{e2}\u{2020}\u{90}", "\u{2190}", "left arrow"),
    ("\u{e2}\u{20ac}\u{201c}", "\u{2013}", "en dash"),
    ("\u{e2}\u{20ac}\u{201d}", "\u{2014}", "em dash"),
    ("\u{e2}\u{20ac}\u{2122}", "\u{2019}", "right single quote"),
    ("\u{e2}\u{20ac}\u{2dc}", "\u{2018}", "left single quote"),
    ("\u{e2}\u{20ac}\u{153}", "\u{201c}", "left double quote"),
    ("\u{e2}\u{20ac}\u{9d}", "\u{201d}", "right double quote"),
    ("\u{e2}\u{20ac}\u{a2}", "\u{2022}", "bullet"),
    ("\u{e2}\u{20ac}\u{a6}", "\u{2026}", "ellipsis"),
    ("\u{c2}\u{a3}", "\u{a3}", "pound sign"),
];

/// Prefixes that only show up in garbled text.
pub const GARBLED_MARKERS: &[&str] = &[
    "\u{e2}\u{153}",
    "\u{e2}\u{20ac}",
    "\u{e2}\u{2013}",
    "\u{e2}\u{2020}",
    "\u{c2}\u{a3}",
    "\u{c3}\u{a2}",
    "\u{c3}\u{a9}",
    "\u{c3}\u{a8}",
    "\u{c3}\u{192}",
    "\u{c3}\u{201a}",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub description: &'static str,
    pub count: usize,
}

fn apply_table(
    content: &mut String,
    table: &[(&str, &str, &'static str)],
) -> Vec<Replacement> {
    let mut applied = Vec::new();
    for &(garbled, correct, description) in table {
        let count = content.matches(garbled).count();
        if count > 0 {
            *content = content.replace(garbled, correct);
            applied.push(Replacement { description, count });
        }
    }
    applied
}

/// Markers still present in `content`, with their counts.
pub fn scan_remaining(content: &str) -> Vec<(&'static str, usize)> {
    GARBLED_MARKERS
        .iter()
        .map(|marker| (*marker, content.matches(marker).count()))
        .filter(|(_, count)| *count > 0)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    /// 1-based.
    pub line: usize,
    pub was: String,
    pub now: String,
}

fn excerpt(line: &str) -> String {
    line.trim().chars().take(SAMPLE_WIDTH).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixReport {
    pub method: Method,
    pub control_fixes: Vec<Replacement>,
    pub fallback: Vec<Replacement>,
    pub changed_lines: usize,
    pub samples: Vec<LineChange>,
    pub remaining: Vec<(&'static str, usize)>,
    pub original_chars: usize,
    pub fixed: String,
}

impl FixReport {
    pub fn fixed_chars(&self) -> usize {
        char_len(&self.fixed)
    }

    /// Repairs never add or remove newlines, so any change shows up as a line change.
    pub fn is_changed(&self) -> bool {
        self.changed_lines > 0
    }

    /// Closing line under the samples: how many lines beyond the shown
    /// ones changed, or the total when all fit.
    pub fn change_summary(&self) -> Option<String> {
        match self.changed_lines {
            0 => None,
            n if n > MAX_SAMPLES => Some(format!("... and {} more lines changed", n - MAX_SAMPLES)),
            n => Some(format!("{} lines changed total", n)),
        }
    }

    pub fn remaining_count(&self) -> usize {
        self.remaining.iter().map(|(_, count)| count).sum()
    }
}

/// Run every repair pass over `content`.
pub fn repair(content: &str) -> FixReport {
    let (mut fixed, method) = reverse_codec(content);
    let control_fixes = apply_table(&mut fixed, CONTROL_CHAR_FIXES);

    let fallback = if scan_remaining(&fixed).is_empty() {
        Vec::new()
    } else {
        apply_table(&mut fixed, KNOWN_REPLACEMENTS)
    };

    let mut changed_lines = 0;
    let mut samples = Vec::new();
    for (i, (was, now)) in content.split('\n').zip(fixed.split('\n')).enumerate() {
        if was == now {
            continue;
        }
        changed_lines += 1;
        let (was, now) = (excerpt(was), excerpt(now));
        if changed_lines <= MAX_SAMPLES && !was.is_empty() && !now.is_empty() {
            samples.push(LineChange { line: i + 1, was, now });
        }
    }

    FixReport {
        method,
        control_fixes,
        fallback,
        changed_lines,
        samples,
        remaining: scan_remaining(&fixed),
        original_chars: char_len(content),
        fixed,
    }
}

#[derive(Debug)]
pub struct FileOutcome {
    pub report: FixReport,
    /// Set when a backup was written and the file replaced.
    pub backup: Option<PathBuf>,
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".backup");
    PathBuf::from(name)
}

/// Repair one file in place, keeping a `<file>.backup` copy. With `dry_run`
/// nothing is written.
pub fn fix_file(path: &Path, dry_run: bool) -> Result<FileOutcome> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;

    let report = repair(&content);
    if dry_run || !report.is_changed() {
        return Ok(FileOutcome { report, backup: None });
    }

    let backup = backup_path(path);
    fs::copy(path, &backup).with_context(|| format!("writing {}", backup.display()))?;
    fs::write(path, &report.fixed).with_context(|| format!("writing {}", path.display()))?;

    Ok(FileOutcome {
        report,
        backup: Some(backup),
    })
}
