//! The parsing pipeline: raw text to an organized header tree.
//!
//! Four passes plus an organization pass:
//!
//! 1. segment the input into comments, fenced code blocks, link-reference lines and paragraph
//!    runs;
//! 2. split paragraphs around setext/atx header lines;
//! 3. offer each paragraph the chance to refine into a table;
//! 4. treeify the flat stream by header level.
//!
//! Organization then reorders each header's children (text first, then link references, then
//! subsections) and re-expresses the synthetic level-0 root as a [`Document`].
//!
//! Parsing never fails: anything the passes don't recognize stays behind as opaque paragraph
//! text, so no input is ever lost.

use crate::md_elem::link_ref::{canonicalize, parse_link_ref};
use crate::md_elem::{elem::*, MdElem, ParseOptions};
use regex::Regex;
use std::iter::Peekable;
use std::sync::LazyLock;
use std::vec::IntoIter;

/// Pass 1, as one alternation. Order encodes precedence: comment, then fenced code, then
/// link-reference line, then paragraph run.
///
/// The fence and link-ref arms consume the newline *before* them (or match at input start), and
/// the fence's closing newline is a look-ahead rather than a consumed character, so the next
/// arm's leading-newline anchor still has something to bite on. The paragraph arm is lazy,
/// terminated by the look-ahead set: end of input, a comment opener, a fence line, a link-ref
/// line, or a blank line.
static SEGMENTS: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
    fancy_regex::Regex::new(
        r#"(?s)<!--(?P<comment>.*?)-->|(?:\A|\n)```(?P<code_lang>[^\n]*)\n(?P<code_body>.*?)```(?=\n|\z)|(?:\A|\n)(?P<link_ref>\[[^\]\n]+\]:[^\n]*)|(?P<para>.+?(?=\z|<!--|\n```|\n\[[^\]\n]+\]:|\n[ \t]*\n))"#,
    )
    .expect("static pattern")
});

/// Pass 2: header lines inside a paragraph. Setext before atx.
static HEADER_LINES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?P<setext1>[^\n]+)\n={3,}[ \t]*$|^(?P<setext2>[^\n]+)\n-{3,}[ \t]*$|^(?P<atx>#{1,9}) (?P<atx_title>[^\n]*)$")
        .expect("static pattern")
});

impl Document {
    /// Parses Markdown text into a document tree.
    ///
    /// This never fails: unrecognized constructs are preserved as opaque paragraphs. The result
    /// is organized, meaning that within each header, text nodes come first, then link
    /// references (canonicalized per [`ParseOptions::sort_link_refs`]), then subsections.
    ///
    /// ```
    /// use markdql::md_elem::{elem::*, MdElem, ParseOptions};
    ///
    /// let doc = Document::parse("# Greeting\nHello, world\n", &ParseOptions::default());
    /// let MdElem::Header(greeting) = &doc.children[0] else { panic!() };
    /// assert_eq!(greeting.title, "Greeting");
    /// assert_eq!(greeting.children, vec![MdElem::Paragraph(Paragraph::new("Hello, world"))]);
    /// ```
    pub fn parse(text: &str, options: &ParseOptions) -> Document {
        let segments = segment(text);
        let split = extract_headers(segments);
        let refined = refine_tables(split);
        let root = organize(treeify(refined), options);
        Document { children: root.children }
    }
}

impl MdElem {
    /// Parses Markdown text, rooted at an [`MdElem::Document`].
    ///
    /// Convenience for [`Document::parse`] when you want the node form that
    /// [`query`](crate::query::query) and [`write_md`](crate::output::write_md) take.
    pub fn parse(text: &str, options: &ParseOptions) -> MdElem {
        MdElem::Document(Document::parse(text, options))
    }
}

/// Pass 1: structural segmentation.
fn segment(text: &str) -> Vec<MdElem> {
    let mut out = Vec::new();
    for captures in SEGMENTS.captures_iter(text).flatten() {
        if let Some(body) = captures.name("comment") {
            out.push(MdElem::Comment(Comment {
                text: body.as_str().to_string(),
            }));
        } else if let Some(lang) = captures.name("code_lang") {
            let body = captures.name("code_body").map(|m| m.as_str()).unwrap_or("");
            out.push(MdElem::Code(Code::new(lang.as_str(), body)));
        } else if let Some(line) = captures.name("link_ref") {
            // A line that looks like a link ref but won't parse survives as an opaque
            // paragraph, same as an unrecognized fence. No content is ever lost.
            match parse_link_ref(line.as_str()) {
                Some(link_ref) => out.push(MdElem::LinkRef(link_ref)),
                None => out.push(MdElem::Paragraph(Paragraph::new(line.as_str()))),
            }
        } else if let Some(para) = captures.name("para") {
            let trimmed = para.as_str().trim();
            if !trimmed.is_empty() {
                out.push(MdElem::Paragraph(Paragraph::new(trimmed)));
            }
        }
    }
    out
}

/// Pass 2: split each paragraph around header lines; everything else passes through.
fn extract_headers(nodes: Vec<MdElem>) -> Vec<MdElem> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            MdElem::Paragraph(para) => split_headers(&para.text, &mut out),
            other => out.push(other),
        }
    }
    out
}

fn split_headers(text: &str, out: &mut Vec<MdElem>) {
    let mut last = 0;
    for captures in HEADER_LINES.captures_iter(text) {
        let whole = captures.get(0).expect("full match");
        push_paragraph(out, &text[last..whole.start()]);
        let header = if let Some(title) = captures.name("setext1") {
            Header::new(1, title.as_str().trim())
        } else if let Some(title) = captures.name("setext2") {
            Header::new(2, title.as_str().trim())
        } else {
            let level = captures.name("atx").expect("atx arm").as_str().len() as u8;
            Header::new(level, captures.name("atx_title").expect("atx arm").as_str().trim())
        };
        out.push(MdElem::Header(header));
        last = whole.end();
    }
    push_paragraph(out, &text[last..]);
}

fn push_paragraph(out: &mut Vec<MdElem>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        out.push(MdElem::Paragraph(Paragraph::new(trimmed)));
    }
}

/// Pass 3: each paragraph may reinterpret itself as a table.
fn refine_tables(nodes: Vec<MdElem>) -> Vec<MdElem> {
    nodes
        .into_iter()
        .map(|node| match node {
            MdElem::Paragraph(para) => match Table::parse(&para.text) {
                Some(table) => MdElem::Table(table),
                None => MdElem::Paragraph(para),
            },
            other => other,
        })
        .collect()
}

/// Pass 4: fold the flat stream into a tree under a synthetic level-0 root.
///
/// A header of strictly greater level than the current one becomes a child and recursively
/// collects its own children; a header of equal or lower level returns control to a shallower
/// frame. Skipped levels attach wherever they're first seen.
fn treeify(nodes: Vec<MdElem>) -> Header {
    let mut iter = nodes.into_iter().peekable();
    fill(Header::new(0, ""), &mut iter)
}

fn fill(mut current: Header, iter: &mut Peekable<IntoIter<MdElem>>) -> Header {
    loop {
        let next_header_level = match iter.peek() {
            None => break,
            Some(MdElem::Header(header)) => Some(header.level),
            Some(_) => None,
        };
        match next_header_level {
            Some(level) if level > current.level => {
                let Some(MdElem::Header(child)) = iter.next() else {
                    unreachable!("peek said header");
                };
                current.children.push(MdElem::Header(fill(child, iter)));
            }
            Some(_) => break,
            None => current.children.push(iter.next().expect("peeked")),
        }
    }
    current
}

/// The organization pass: (text nodes, link refs, subsections), recursively.
fn organize(header: Header, options: &ParseOptions) -> Header {
    let Header { level, title, children } = header;
    let mut others = Vec::new();
    let mut link_refs = Vec::new();
    let mut headers = Vec::new();
    for child in children {
        match child {
            MdElem::LinkRef(link_ref) => link_refs.push(link_ref),
            MdElem::Header(child) => headers.push(MdElem::Header(organize(child, options))),
            other => others.push(other),
        }
    }
    if options.sort_link_refs {
        link_refs = canonicalize(link_refs);
    }
    let mut children = others;
    children.extend(link_refs.into_iter().map(MdElem::LinkRef));
    children.extend(headers);
    Header { level, title, children }
}
