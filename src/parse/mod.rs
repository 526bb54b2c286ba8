//! Free-text parsing: hashtag extraction from task titles and
//! slash-prefixed template commands.

use std::sync::LazyLock;

use regex::Regex;

/// A hashtag token: `#` plus the token character class, valid only when
/// preceded by start-of-string or whitespace.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)#([A-Za-z0-9_-]+)").expect("static tag regex"));

/// Collapse internal whitespace runs to single spaces and trim.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a free-form tag: lowercase, strip a leading `#`, collapse
/// internal whitespace to hyphens, and drop characters outside the
/// token class. May come back empty for degenerate input.
pub fn normalize_tag(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix('#').unwrap_or(trimmed);
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter_map(|c| {
            let c = c.to_ascii_lowercase();
            (c.is_ascii_alphanumeric() || c == '_' || c == '-').then_some(c)
        })
        .collect()
}

/// Extract hashtag tokens from free text. Returns the remaining title
/// (whitespace-collapsed) and the tags in first-seen order, deduplicated.
///
/// `"Ship release #urgent #urgent"` → `("Ship release", ["urgent"])`.
pub fn extract_tags(text: &str) -> (String, Vec<String>) {
    let mut tags: Vec<String> = Vec::new();
    let mut title = String::with_capacity(text.len());
    let mut last = 0;

    for caps in TAG_RE.captures_iter(text) {
        let (Some(whole), Some(lead), Some(tag)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        title.push_str(&text[last..whole.start()]);
        // Keep the boundary whitespace so surrounding words stay apart.
        title.push_str(lead.as_str());
        last = whole.end();

        let tag = tag.as_str().to_ascii_lowercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    title.push_str(&text[last..]);

    (collapse_whitespace(&title), tags)
}

/// Recognize a `/name rest-of-text` template command. Only matches when
/// the slash sits at position 0; returns the command name and the
/// remainder after the first whitespace run (empty when absent).
pub fn parse_template_command(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix('/')?;
    let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let name = &rest[..name_end];
    if name.is_empty() {
        return None;
    }
    let remainder = rest[name_end..].trim_start();
    Some((name, remainder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_dedupes_tags() {
        let (title, tags) = extract_tags("Ship release #urgent #urgent");
        assert_eq!(title, "Ship release");
        assert_eq!(tags, vec!["urgent"]);
    }

    #[test]
    fn tags_require_a_whitespace_boundary() {
        let (title, tags) = extract_tags("see issue#42 and #real-tag");
        assert_eq!(title, "see issue#42 and");
        assert_eq!(tags, vec!["real-tag"]);
    }

    #[test]
    fn tag_at_start_of_string_counts() {
        let (title, tags) = extract_tags("#first things first");
        assert_eq!(title, "things first");
        assert_eq!(tags, vec!["first"]);
    }

    #[test]
    fn adjacent_hash_runs_only_match_the_bounded_token() {
        // "#a#b": only "#a" is preceded by a boundary; "#b" stays in the title.
        let (title, tags) = extract_tags("#a#b");
        assert_eq!(title, "#b");
        assert_eq!(tags, vec!["a"]);
    }

    #[test]
    fn extraction_preserves_first_seen_order() {
        let (_, tags) = extract_tags("x #beta y #alpha z #beta");
        assert_eq!(tags, vec!["beta", "alpha"]);
    }

    #[test]
    fn normalize_tag_rules() {
        assert_eq!(normalize_tag("#Urgent"), "urgent");
        assert_eq!(normalize_tag("  two  words "), "two-words");
        assert_eq!(normalize_tag("we!rd(chars)"), "werdchars");
        assert_eq!(normalize_tag("#"), "");
        assert_eq!(normalize_tag("под"), "");
    }

    #[test]
    fn template_command_only_at_position_zero() {
        assert_eq!(
            parse_template_command("/bug crashes on start"),
            Some(("bug", "crashes on start"))
        );
        assert_eq!(parse_template_command("/bug"), Some(("bug", "")));
        assert_eq!(parse_template_command(" /bug text"), None);
        assert_eq!(parse_template_command("no command"), None);
        assert_eq!(parse_template_command("/"), None);
    }

    #[test]
    fn collapse_whitespace_trims_and_squashes() {
        assert_eq!(collapse_whitespace("  a \t b\n c  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
