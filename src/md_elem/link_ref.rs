//! Parsing and canonicalization for `[label]: url "title"` lines.

use crate::md_elem::elem::LinkRef;
use fancy_regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// The line grammar. The negative look-ahead keeps a quoted title from being eaten as the url;
/// the url itself is lazy so a trailing `"title"` field can claim its quotes.
static LINK_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\[([^\]]+)\]:\s*((?!").*?)?\s*(?:"(.*?)")?\s*$"#).expect("static pattern"));

/// Parses one `[label]: url "title"` line, or `None` if the line doesn't fit the grammar.
///
/// The url is right-trimmed; blank urls and titles come back as `None` fields. The title is
/// unescaped: `\\` becomes `\` and `\"` becomes `"`.
pub(crate) fn parse_link_ref(line: &str) -> Option<LinkRef> {
    let captures = LINK_REF.captures(line).ok()??;
    let label = captures.get(1)?.as_str();
    let url = captures.get(2).map(|m| m.as_str().trim_end().to_string());
    let title = captures.get(3).map(|m| unescape_title(m.as_str()));
    Some(LinkRef::new(label, url, title))
}

/// Undoes [escape_title]: `\\` to `\`, `\"` to `"`. Any other backslash stays put.
pub(crate) fn unescape_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut chars = title.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\\' || next == '"' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

/// Escapes a title for serialization: `\` to `\\`, `"` to `\"`.
pub(crate) fn escape_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch == '\\' || ch == '"' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Deduplicates by label (last occurrence wins) and sorts lexicographically by label.
pub(crate) fn canonicalize(link_refs: Vec<LinkRef>) -> Vec<LinkRef> {
    let mut by_label = BTreeMap::new();
    for link_ref in link_refs {
        by_label.insert(link_ref.label.clone(), link_ref);
    }
    by_label.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain() {
        check("[a]: https://example.com", "a", Some("https://example.com"), None);
    }

    #[test]
    fn url_and_title() {
        check(
            r#"[a]: https://example.com "the title""#,
            "a",
            Some("https://example.com"),
            Some("the title"),
        );
    }

    #[test]
    fn title_only() {
        check(r#"[a]: "just a title""#, "a", None, Some("just a title"));
    }

    #[test]
    fn no_url_no_title() {
        check("[a]:", "a", None, None);
        check("[a]:   ", "a", None, None);
    }

    #[test]
    fn url_with_spaces() {
        check("[a]: foo bar", "a", Some("foo bar"), None);
    }

    #[test]
    fn url_with_inner_quotes() {
        // A quote mid-field doesn't start a title unless it closes at end of line.
        check(r#"[a]: foo "b" c"#, "a", Some(r#"foo "b" c"#), None);
    }

    #[test]
    fn escaped_title() {
        check(r#"[a]: url "say \"hi\" \\ done""#, "a", Some("url"), Some(r#"say "hi" \ done"#));
    }

    #[test]
    fn not_a_link_ref() {
        assert_eq!(parse_link_ref("[a] missing colon"), None);
        assert_eq!(parse_link_ref("[]: empty label"), None);
        assert_eq!(parse_link_ref("plain text"), None);
        // a lone quote right after the colon: the url arm's look-ahead refuses it and the
        // title arm never closes, so the grammar has no matching path at all
        assert_eq!(parse_link_ref("[a]:\"orphan"), None);
    }

    #[test]
    fn escape_round_trip() {
        let title = r#"a "quoted" \ backslash"#;
        assert_eq!(unescape_title(&escape_title(title)), title);
    }

    #[test]
    fn canonicalize_sorts_and_dedupes() {
        let refs = vec![
            LinkRef::new("url", Some("url".to_string()), None),
            LinkRef::new("dup", Some("dup".to_string()), None),
            LinkRef::new("dup", Some("dup".to_string()), Some("last".to_string())),
        ];
        assert_eq!(
            canonicalize(refs),
            vec![
                LinkRef::new("dup", Some("dup".to_string()), Some("last".to_string())),
                LinkRef::new("url", Some("url".to_string()), None),
            ]
        );
    }

    fn check(line: &str, label: &str, url: Option<&str>, title: Option<&str>) {
        let parsed = parse_link_ref(line).unwrap();
        assert_eq!(parsed.label, label);
        assert_eq!(parsed.url.as_deref(), url);
        assert_eq!(parsed.title.as_deref(), title);
    }
}
