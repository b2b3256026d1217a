//! Tokenizing one step of a MarkdQL expression.
//!
//! A step is `sep (token index? | index)`, matched against the head of the remaining query
//! string:
//!
//! - `sep` is up to three flag characters: a leading `..` makes the step recursive, a trailing
//!   `|` makes it match tables instead of headers, and a bare `.` is just a separator.
//! - `token` is a bareword, a `"quoted"` string, or a `/regex/`.
//! - `index` is `[...]` holding `*`, an integer (negatives count from the end), a `col,row` pair
//!   (for tables), or a name.
//!
//! Quoted and regex tokens both unescape with the universal rule (a backslash makes the next
//! character literal), and for regexes that happens *before* compilation, so `\/` works but
//! regex classes like `\d` need a doubled backslash.

use crate::query::QueryError;
use regex::Regex;
use std::sync::LazyLock;

/// The step grammar. Everything is optional, so this always matches; a zero-length match on a
/// non-empty remainder is how "unrecognized query" gets detected.
static STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"^(?P<sep>(?:\.\.|\.)?\|?)"#,
        r#"(?:(?P<quoted>"(?:[^"\\]|\\.)*")|(?P<regex>/(?:[^/\\]|\\.)+/)|(?P<bare>[^"/\[. |][^.|\[]*))?"#,
        r#"(?:\[(?:(?P<index_quoted>"(?:[^"\\]|\\.)*")|(?P<index_bare>[^\]]*))\])?"#,
    ))
    .expect("static pattern")
});

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").expect("static pattern"));

/// One parsed step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    /// `..`: search the whole subtree instead of immediate children.
    pub recursive: bool,
    /// `|`: match table titles (head cells) instead of header titles.
    pub table: bool,
    pub token: Token,
    pub index: Option<Index>,
    consumed: usize,
}

/// A step's token: what to match titles against.
#[derive(Clone, Debug)]
pub enum Token {
    /// No token. On its own this is an identity step; combined with a `sep` flag it matches the
    /// first header (or table) regardless of title.
    None,
    /// A bareword or quoted token; titles match by equality.
    Text(String),
    /// A `/…/` token; titles match by regex search.
    Pattern(fancy_regex::Regex),
}

impl Token {
    pub fn matches(&self, title: &str) -> bool {
        match self {
            Token::None => true,
            Token::Text(text) => title == text,
            Token::Pattern(pattern) => pattern.is_match(title).unwrap_or(false),
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::None, Token::None) => true,
            (Token::Text(a), Token::Text(b)) => a == b,
            (Token::Pattern(a), Token::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Token {}

/// A step's `[...]` index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Index {
    /// `[*]`: every child.
    Star,
    /// `[n]` / `[-k]`: one child by position; negatives count back from the end.
    Position(i64),
    /// Anything else: a header title, a table row head, or a table's `col,row` pair.
    Name(String),
}

impl Step {
    /// Parses one step off the head of `remainder`. `original` is the full query expression,
    /// which error values carry.
    pub fn parse(remainder: &str, original: &str) -> Result<Step, QueryError> {
        let captures = STEP.captures(remainder).expect("all parts optional");
        let whole = captures.get(0).expect("full match");
        if whole.end() == 0 {
            return Err(QueryError::UnrecognizedQuery(original.to_string()));
        }

        let sep = &captures["sep"];
        let token = if let Some(quoted) = captures.name("quoted") {
            let text = unescape(strip_delimiters(quoted.as_str()));
            if text.is_empty() {
                Token::None
            } else {
                Token::Text(text)
            }
        } else if let Some(pattern) = captures.name("regex") {
            let pattern = unescape(strip_delimiters(pattern.as_str()));
            match fancy_regex::Regex::new(&pattern) {
                Ok(compiled) => Token::Pattern(compiled),
                Err(_) => return Err(QueryError::InvalidRegex(pattern)),
            }
        } else if let Some(bare) = captures.name("bare") {
            Token::Text(bare.as_str().to_string())
        } else {
            Token::None
        };

        let index = if let Some(quoted) = captures.name("index_quoted") {
            Some(parse_index(&unescape(strip_delimiters(quoted.as_str()))))
        } else {
            captures.name("index_bare").map(|bare| parse_index(bare.as_str()))
        };

        Ok(Step {
            recursive: sep.starts_with(".."),
            table: sep.ends_with('|'),
            token,
            index,
            consumed: whole.end(),
        })
    }

    /// How many bytes of the remainder this step used up.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

fn parse_index(text: &str) -> Index {
    if text == "*" {
        Index::Star
    } else if INTEGER.is_match(text) {
        // absurdly long digit strings overflow; treat them as names (which simply miss)
        text.parse().map(Index::Position).unwrap_or_else(|_| Index::Name(text.to_string()))
    } else {
        Index::Name(text.to_string())
    }
}

/// Drops the single delimiter character off each end (`"…"` or `/…/`).
fn strip_delimiters(text: &str) -> &str {
    &text[1..text.len() - 1]
}

/// The universal unescape: a backslash makes the next character literal.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
                continue;
            }
        }
        out.push(ch);
    }
    out
}
