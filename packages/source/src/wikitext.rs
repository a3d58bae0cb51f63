//! Wikitext markup stripping for infobox location values.
//!
//! Infobox fields arrive as raw wikitext: `[[Perth|Perth, WA]]`,
//! `{{flagicon|Australia}}`, stray HTML and entities. The cleaner keeps
//! the *target* side of piped links, not the display side, because the
//! target is typically the canonical location name.

use std::sync::LazyLock;

use regex::Regex;

/// `[[target|display]]` links; the capture is the target.
static PIPED_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]|]+)\|[^\]]*\]\]").expect("valid regex"));

/// `[[target]]` links.
static PLAIN_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("valid regex"));

/// `{{...}}` templates. Nested templates survive one level; the outer
/// whitespace collapse mops up most of the residue.
static TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[^}]*\}\}").expect("valid regex"));

/// HTML tags, including `<br/>` and `<ref>`.
static HTML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Runs of whitespace.
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strips wikitext markup from an infobox location value.
#[must_use]
pub fn clean_wikitext_location(raw: &str) -> String {
    let cleaned = PIPED_LINK_RE.replace_all(raw, "$1");
    let cleaned = PLAIN_LINK_RE.replace_all(&cleaned, "$1");
    let cleaned = TEMPLATE_RE.replace_all(&cleaned, "");
    let cleaned = HTML_TAG_RE.replace_all(&cleaned, "");
    let cleaned = cleaned.replace("&nbsp;", " ");
    let cleaned = WHITESPACE_RE.replace_all(&cleaned, " ");
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_target_of_piped_link() {
        assert_eq!(
            clean_wikitext_location("[[Perth, Western Australia|Perth]]"),
            "Perth, Western Australia"
        );
    }

    #[test]
    fn unwraps_plain_link() {
        assert_eq!(clean_wikitext_location("[[Canberra]]"), "Canberra");
    }

    #[test]
    fn strips_templates() {
        assert_eq!(
            clean_wikitext_location("{{flagicon|Australia}} [[Sydney]], Australia"),
            "Sydney, Australia"
        );
    }

    #[test]
    fn strips_html_and_entities() {
        assert_eq!(
            clean_wikitext_location("London,<br/> England,&nbsp;UK"),
            "London, England, UK"
        );
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(
            clean_wikitext_location("  [[London]] ,   England "),
            "London , England"
        );
    }
}
