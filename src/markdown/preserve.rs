//! Turns runs of extra blank lines into sized spacer blocks.
//!
//! Markdown collapses any number of blank lines into one paragraph break.
//! A run of N >= 3 line breaks is N - 1 visible blank lines, so we replace it
//! with a raw HTML `<div>` of matching height. Runs of one or two breaks are
//! left alone. This works on raw text only: blank lines inside fenced code
//! blocks are rewritten too.

use super::options::{BlankLineSettings, DEFAULT_HEIGHT_PER_BLANK};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

pub const SPACER_CLASS: &str = "mkdocs-preserved-blank";

const PARAGRAPH_BREAK: &str = "\n\n";

// Three or more line breaks, LF or CRLF, mixed freely
static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n){3,}").unwrap());

#[derive(Debug, Clone, Default)]
pub struct BlankRunTransformer {
    settings: BlankLineSettings,
}

impl BlankRunTransformer {
    pub fn new(settings: BlankLineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BlankLineSettings {
        &self.settings
    }

    /// Replace every run of 3+ line breaks. Borrows the input when nothing
    /// matched.
    pub fn transform<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.transform_counted(text).0
    }

    /// Like [`transform`](Self::transform), also returning how many spacers
    /// were inserted.
    pub fn transform_counted<'a>(&self, text: &'a str) -> (Cow<'a, str>, usize) {
        let mut spacers = 0;

        let result = BLANK_RUN_RE.replace_all(text, |caps: &Captures<'_>| {
            let newlines = caps[0].bytes().filter(|&b| b == b'\n').count();
            let blanks = newlines
                .saturating_sub(1)
                .min(self.settings.max_blanks());

            if blanks == 0 {
                return PARAGRAPH_BREAK.to_string();
            }

            spacers += 1;
            self.spacer(blanks)
        });

        (result, spacers)
    }

    /// Line-sequence form used by preprocessor hosts: lines are joined with
    /// `\n`, transformed, and split again.
    pub fn transform_lines(&self, lines: &[String]) -> Vec<String> {
        let text = lines.join("\n");
        self.transform(&text).split('\n').map(String::from).collect()
    }

    /// The standalone HTML block emitted for `blank_lines` blank lines,
    /// including the surrounding paragraph breaks.
    pub fn spacer(&self, blank_lines: usize) -> String {
        format!(
            "{PARAGRAPH_BREAK}<div class=\"{SPACER_CLASS}\" style=\"height:{};line-height:0;margin:0;padding:0\"></div>{PARAGRAPH_BREAK}",
            self.size_token(blank_lines)
        )
    }

    pub fn size_token(&self, blank_lines: usize) -> String {
        let mut size = self.settings.height_per_blank() * blank_lines as f64;
        if !size.is_finite() {
            tracing::warn!(
                "Spacer size overflowed for height_per_blank {}, using {}",
                self.settings.height_per_blank(),
                DEFAULT_HEIGHT_PER_BLANK
            );
            size = DEFAULT_HEIGHT_PER_BLANK * blank_lines as f64;
        }
        format!("{}{}", format_size(size), self.settings.unit())
    }
}

/// Transform `text` with a one-off transformer.
pub fn preserve_blank_lines<'a>(text: &'a str, settings: &BlankLineSettings) -> Cow<'a, str> {
    BlankRunTransformer::new(settings.clone()).transform(text)
}

fn format_size(size: f64) -> String {
    if size.fract() == 0.0 && size.abs() < i64::MAX as f64 {
        (size as i64).to_string()
    } else {
        size.to_string()
    }
}
