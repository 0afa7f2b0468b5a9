//! Callout block extraction.
//!
//! A callout is a block-quoted region opened by a `> [!label]` line:
//!
//! ```markdown
//! > [!summary] Optional title
//! > First line
//! > Second line
//! ```
//!
//! [`extract`] slices the raw text of the first callout with a given label.
//! What happens to that text afterwards (kept as plain text, or rendered to
//! HTML for Anki) is decided by a [`CalloutRenderer`].

use serde::{Deserialize, Serialize};

/// Extract the content of the first callout labeled `label`.
///
/// The label and the `[!...]` keyword match case-insensitively. Every line
/// directly after the opener that starts with `>` belongs to the block; one
/// `>` and at most one following space are stripped from each. The joined
/// content is trimmed.
///
/// Returns `None` when no opener exists. An opener without continuation
/// lines yields `Some("")`.
#[must_use]
pub fn extract(text: &str, label: &str) -> Option<String> {
    let mut lines = text.lines();
    lines.by_ref().find(|line| is_opener(line, label))?;

    let body: Vec<&str> = lines
        .take_while(|line| line.starts_with('>'))
        .map(strip_quote_marker)
        .collect();

    Some(body.join("\n").trim().to_string())
}

/// Whether `line` opens a callout with the given label.
fn is_opener(line: &str, label: &str) -> bool {
    let Some(rest) = line.strip_prefix('>') else {
        return false;
    };
    let Some(rest) = rest.trim_start_matches([' ', '\t']).strip_prefix("[!") else {
        return false;
    };
    let Some(end) = rest.find(']') else {
        return false;
    };
    rest[..end].to_lowercase() == label.to_lowercase()
}

fn strip_quote_marker(line: &str) -> &str {
    let rest = &line[1..];
    rest.strip_prefix(' ').unwrap_or(rest)
}

// ── Rendering ────────────────────────────────────────────────

/// Post-processing applied to extracted callout text before it becomes a
/// field value.
pub trait CalloutRenderer: Send + Sync {
    /// Render extracted callout content.
    fn render(&self, content: &str) -> String;
}

/// Keeps the extracted text as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl CalloutRenderer for PlainText {
    fn render(&self, content: &str) -> String {
        content.to_string()
    }
}

/// Renders extracted text as minimal HTML for Anki's field editor.
///
/// Blank-line separated paragraphs become `<p>` blocks and line breaks
/// inside a paragraph become `<br>`. Markup characters are escaped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Html;

impl CalloutRenderer for Html {
    fn render(&self, content: &str) -> String {
        let mut paragraphs: Vec<Vec<&str>> = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for line in content.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    paragraphs.push(std::mem::take(&mut current));
                }
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            paragraphs.push(current);
        }

        paragraphs
            .iter()
            .map(|lines| {
                let inner: Vec<String> = lines.iter().map(|l| escape_html(l)).collect();
                format!("<p>{}</p>", inner.join("<br>"))
            })
            .collect()
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Configured callout output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutFormat {
    /// Plain joined text.
    #[default]
    Plain,
    /// HTML paragraphs.
    Html,
}

impl CalloutFormat {
    /// The renderer implementing this format.
    #[must_use]
    pub fn renderer(self) -> &'static dyn CalloutRenderer {
        match self {
            Self::Plain => &PlainText,
            Self::Html => &Html,
        }
    }
}

impl std::fmt::Display for CalloutFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Html => write!(f, "html"),
        }
    }
}

impl std::str::FromStr for CalloutFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "html" => Ok(Self::Html),
            _ => Err(format!("Unknown callout format: {s} (expected plain or html)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_joins_continuation_lines() {
        let text = "> [!L]\n> line1\n> line2\n";
        assert_eq!(extract(text, "L"), Some("line1\nline2".to_string()));
    }

    #[test]
    fn test_extract_absent_label() {
        let text = "# Paper\n\n> [!summary]\n> short\n\n> [!quote]\n> cited\n";
        assert_eq!(extract(text, "critique"), None);
    }

    #[test]
    fn test_extract_is_case_insensitive() {
        let text = "> [!Summary] The gist\n> It works.\n";
        assert_eq!(extract(text, "SUMMARY"), Some("It works.".to_string()));
    }

    #[test]
    fn test_extract_stops_at_first_unquoted_line() {
        let text = "intro\n> [!summary]\n> kept\n>\n> also kept\nnot quoted\n> stray\n";
        assert_eq!(
            extract(text, "summary"),
            Some("kept\n\nalso kept".to_string())
        );
    }

    #[test]
    fn test_extract_empty_callout_is_not_absent() {
        assert_eq!(extract("> [!todo]\nplain text\n", "todo"), Some(String::new()));
        assert_eq!(extract("> [!todo]", "todo"), Some(String::new()));
    }

    #[test]
    fn test_extract_first_occurrence_only() {
        let text = "> [!note]\n> first\n\n> [!note]\n> second\n";
        assert_eq!(extract(text, "note"), Some("first".to_string()));
    }

    #[test]
    fn test_extract_strips_one_space_only() {
        let text = "> [!code]\n>     indented\n>no space\n";
        assert_eq!(
            extract(text, "code"),
            Some("indented\nno space".to_string())
        );
        let text = "> [!code]\n> a\n>     b\n";
        assert_eq!(extract(text, "code"), Some("a\n    b".to_string()));
    }

    #[test]
    fn test_extract_handles_fold_marker_and_crlf() {
        let text = "> [!faq]- Folded\r\n> answer\r\n";
        // fold markers are trailing text after the closing bracket
        assert_eq!(extract(text, "faq"), Some("answer".to_string()));
    }

    #[test]
    fn test_label_must_match_exactly() {
        assert_eq!(extract("> [!summary-long]\n> x\n", "summary"), None);
    }

    #[test]
    fn test_html_renderer_paragraphs() {
        let out = Html.render("a < b\nnext\n\nsecond & last");
        assert_eq!(out, "<p>a &lt; b<br>next</p><p>second &amp; last</p>");
        assert_eq!(Html.render(""), "");
    }

    #[test]
    fn test_format_parse_and_renderer() {
        assert_eq!("HTML".parse::<CalloutFormat>(), Ok(CalloutFormat::Html));
        assert!("markdown".parse::<CalloutFormat>().is_err());
        assert_eq!(CalloutFormat::Plain.renderer().render("x\ny"), "x\ny");
    }
}
