use derive_builder::Builder;

use elem::*;

/// Options for parsing Markdown.
///
/// See: [`Document::parse`](elem::Document::parse).
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
#[builder(default)]
pub struct ParseOptions {
    /// Whether to canonicalize link references after parsing. Defaults to `true`.
    ///
    /// When set, the link references at the end of each header's children are deduplicated by
    /// label (the last occurrence wins) and sorted lexicographically by label. When unset, they
    /// keep their original order, duplicates included.
    pub sort_link_refs: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { sort_link_refs: true }
    }
}

/// A single node of parsed Markdown.
///
/// Three of the variants are containers, meaning they hold other `MdElem`s: [`MdElem::Document`],
/// [`MdElem::Header`] and [`MdElem::Table`] (a table's children are its rows). Everything else is
/// a leaf. See the individual structs in [`elem`] for what each variant holds and how it
/// serializes.
///
/// Nodes are value-like: every rewriting operation returns a new `MdElem` rather than mutating in
/// place, and a parent exclusively owns its children. There are no parent pointers and no cycles.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MdElem {
    /// An invisible top-level container.
    ///
    /// This is what [`Document::parse`](elem::Document::parse) returns: it holds the text before
    /// the first header, and the top-level headers themselves. It emits no text of its own when
    /// serialized.
    Document(Document),

    /// A section: a title at some level, plus everything under it.
    Header(Header),

    /// A trimmed blob of text.
    Paragraph(Paragraph),

    /// An HTML-style comment, `<!--` and `-->` not included.
    Comment(Comment),

    /// A fenced code block.
    Code(Code),

    /// A `[label]: url "title"` link reference line.
    LinkRef(LinkRef),

    /// A table: column alignments plus rows. Row 0 is the header row.
    Table(Table),

    /// One row of a table. Cells are plain strings, not nodes.
    TableRow(TableRow),
}

impl MdElem {
    /// Whether this node can hold child nodes.
    pub fn is_container(&self) -> bool {
        matches!(self, MdElem::Document(_) | MdElem::Header(_) | MdElem::Table(_))
    }

    /// This node's children, or `None` if it's a leaf.
    ///
    /// A [`Table`]'s children are its rows, each wrapped as an [`MdElem::TableRow`]. A
    /// [`TableRow`] is a leaf here: its cells are strings, not nodes.
    pub fn children(&self) -> Option<Vec<MdElem>> {
        match self {
            MdElem::Document(doc) => Some(doc.children.clone()),
            MdElem::Header(header) => Some(header.children.clone()),
            MdElem::Table(table) => Some(table.rows.iter().cloned().map(MdElem::TableRow).collect()),
            _ => None,
        }
    }

    /// A copy of this node with its children replaced.
    ///
    /// Leaves come back unchanged. A [`Table`] keeps only the `TableRow`s from the new children;
    /// anything else has no place in a table and is dropped.
    pub fn with_children(&self, children: Vec<MdElem>) -> MdElem {
        match self {
            MdElem::Document(_) => MdElem::Document(Document { children }),
            MdElem::Header(header) => MdElem::Header(Header {
                level: header.level,
                title: header.title.clone(),
                children,
            }),
            MdElem::Table(table) => MdElem::Table(Table {
                alignments: table.alignments.clone(),
                rows: children
                    .into_iter()
                    .filter_map(|child| match child {
                        MdElem::TableRow(row) => Some(row),
                        _ => None,
                    })
                    .collect(),
            }),
            other => other.clone(),
        }
    }

    /// The title this node exposes to MarkdQL token matching: a header's title, or a table's head
    /// cell. Leaves have none.
    pub(crate) fn query_title(&self) -> Option<&str> {
        match self {
            MdElem::Header(header) => Some(&header.title),
            MdElem::Table(table) => Some(table.title()),
            _ => None,
        }
    }
}

/// Inner details of the [MdElem] variants.
pub mod elem {
    use super::*;

    /// The invisible root of a parsed document.
    ///
    /// Behaves like a [`Header`] of level 0 with no title: children serialize in order, separated
    /// by blank lines, with no title line of their own.
    #[derive(Clone, Default, Debug, PartialEq, Eq, Hash)]
    pub struct Document {
        pub children: Vec<MdElem>,
    }

    /// A section title and its body.
    ///
    /// ```markdown
    /// Title at level one
    /// ==================
    ///
    /// Body of the section.
    /// ```
    ///
    /// `level` runs from 0 to 9. Level 0 is reserved for the synthetic root the parser builds
    /// (callers only ever see it as a [`Document`]); 1 through 9 are user-visible. Levels 1 and 2
    /// serialize setext-style with a 78-character underline of `=` or `-`; deeper levels are atx
    /// (`### Title`).
    ///
    /// Header nesting is strictly monotonic: every `Header` child of a `Header` has a greater
    /// level than its parent. The parser guarantees this; rewriting operations preserve whatever
    /// children they're given.
    ///
    /// # Examples
    ///
    /// ```
    /// use markdql::md_elem::{elem::*, MdElem, ParseOptions};
    ///
    /// let doc = Document::parse("### The section title\n\nSome contents\n", &ParseOptions::default());
    ///
    /// let expected = vec![MdElem::Header(Header {
    ///     level: 3,
    ///     title: "The section title".to_string(),
    ///     children: vec![MdElem::Paragraph(Paragraph::new("Some contents"))],
    /// })];
    /// assert_eq!(doc.children, expected);
    /// ```
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Header {
        pub level: u8,
        pub title: String,
        pub children: Vec<MdElem>,
    }

    impl Header {
        pub fn new<S: Into<String>>(level: u8, title: S) -> Self {
            Self {
                level,
                title: title.into(),
                children: Vec::new(),
            }
        }

        /// Adds a child header one level deeper than `self`, with `inner` as its children.
        ///
        /// The new header lands after all of this header's non-header children but before its
        /// existing header children, so it becomes the first subsection. If a subsection with the
        /// same title already exists at that level, `self` comes back unchanged.
        pub fn prepend<I>(&self, title: &str, inner: I) -> Header
        where
            I: IntoIterator<Item = MdElem>,
        {
            let level = self.level + 1;
            let exists = self.children.iter().any(|child| match child {
                MdElem::Header(h) => h.level == level && h.title == title,
                _ => false,
            });
            if exists {
                return self.clone();
            }
            let inserted = MdElem::Header(Header {
                level,
                title: title.to_string(),
                children: inner.into_iter().collect(),
            });
            let at = self
                .children
                .iter()
                .position(|child| matches!(child, MdElem::Header(_)))
                .unwrap_or(self.children.len());
            let mut children = self.children.clone();
            children.insert(at, inserted);
            Header {
                level: self.level,
                title: self.title.clone(),
                children,
            }
        }
    }

    /// A trimmed run of text.
    ///
    /// Anything the parser doesn't recognize as a more specific construct ends up here, inline
    /// markup included: emphasis, lists, block quotes and the like are all preserved as opaque
    /// paragraph text.
    ///
    /// # Examples
    ///
    /// ```
    /// use markdql::md_elem::{elem::*, MdElem, ParseOptions};
    ///
    /// let doc = Document::parse("Hello, world\n", &ParseOptions::default());
    /// assert_eq!(doc.children, vec![MdElem::Paragraph(Paragraph::new("Hello, world"))]);
    /// ```
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Paragraph {
        pub text: String,
    }

    impl Paragraph {
        /// Creates a paragraph, trimming the text.
        pub fn new<S: AsRef<str>>(text: S) -> Self {
            Self {
                text: text.as_ref().trim().to_string(),
            }
        }
    }

    /// An HTML-style comment.
    ///
    /// `text` is the raw body between `<!--` and `-->`, newlines and all.
    ///
    /// # Examples
    ///
    /// ```
    /// use markdql::md_elem::{elem::*, MdElem, ParseOptions};
    ///
    /// let doc = Document::parse("<!-- draft -->\n", &ParseOptions::default());
    /// assert_eq!(
    ///     doc.children,
    ///     vec![MdElem::Comment(Comment { text: " draft ".to_string() })],
    /// );
    /// ```
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Comment {
        pub text: String,
    }

    /// A fenced code block.
    ///
    /// ````markdown
    /// ```rust
    /// println!("hello");
    /// ```
    /// ````
    ///
    /// `language` may be empty. `content` is everything between the fence lines and always ends
    /// with a newline (unless it is empty).
    ///
    /// # Examples
    ///
    /// ````
    /// use markdql::md_elem::{elem::*, MdElem, ParseOptions};
    ///
    /// let doc = Document::parse("```rust\nfoo()\n```\n", &ParseOptions::default());
    /// assert_eq!(doc.children, vec![MdElem::Code(Code::new("rust", "foo()\n"))]);
    /// ````
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Code {
        pub language: String,
        pub content: String,
    }

    impl Code {
        /// Creates a code block, terminating non-empty content with a newline if it lacks one.
        pub fn new<L: Into<String>, C: Into<String>>(language: L, content: C) -> Self {
            let mut content = content.into();
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            Self {
                language: language.into(),
                content,
            }
        }
    }

    /// A link reference definition.
    ///
    /// ```markdown
    /// [label]: https://example.com/url "optional title"
    /// ```
    ///
    /// Blank urls and titles normalize to `None`. The label is the reference's identity: when the
    /// parser canonicalizes (see [`ParseOptions::sort_link_refs`]), references with the same label
    /// collapse to the last occurrence.
    ///
    /// # Examples
    ///
    /// ```
    /// use markdql::md_elem::{elem::*, MdElem, ParseOptions};
    ///
    /// let doc = Document::parse(
    ///     "[hello]: https://example.com \"the title\"\n",
    ///     &ParseOptions::default(),
    /// );
    /// assert_eq!(
    ///     doc.children,
    ///     vec![MdElem::LinkRef(LinkRef::new(
    ///         "hello",
    ///         Some("https://example.com".to_string()),
    ///         Some("the title".to_string()),
    ///     ))],
    /// );
    /// ```
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct LinkRef {
        pub label: String,
        pub url: Option<String>,
        pub title: Option<String>,
    }

    impl LinkRef {
        /// Creates a link reference, normalizing blank url/title to `None`.
        pub fn new<S: Into<String>>(label: S, url: Option<String>, title: Option<String>) -> Self {
            Self {
                label: label.into(),
                url: url.filter(|u| !u.is_empty()),
                title: title.filter(|t| !t.is_empty()),
            }
        }
    }

    /// A table.
    ///
    /// ```markdown
    /// | Id  | Name |
    /// |-----|-----:|
    /// | 1   |  One |
    /// ```
    ///
    /// `alignments` defines the column grid: the column count is `alignments.len()`, always. Rows
    /// may have fewer cells than that (missing cells read as empty) or more (the extras are
    /// ragged overflow, preserved on round-trip but outside the aligned grid). Row 0 is the
    /// header row.
    ///
    /// # Examples
    ///
    /// ```
    /// use markdql::md_elem::{elem::*, MdElem, ParseOptions};
    ///
    /// let md = "| Id | Name |\n|:--:|------|\n| 1  | One  |\n";
    /// let doc = Document::parse(md, &ParseOptions::default());
    ///
    /// let expected = Table {
    ///     alignments: vec![ColumnAlignment::Center, ColumnAlignment::Left],
    ///     rows: vec![TableRow::new(["Id", "Name"]), TableRow::new(["1", "One"])],
    /// };
    /// assert_eq!(doc.children, vec![MdElem::Table(expected)]);
    /// ```
    #[derive(Clone, Default, Debug, PartialEq, Eq, Hash)]
    pub struct Table {
        pub alignments: Vec<ColumnAlignment>,
        pub rows: Vec<TableRow>,
    }

    /// One row of a [`Table`]. Cells are trimmed strings.
    #[derive(Clone, Default, Debug, PartialEq, Eq, Hash)]
    pub struct TableRow {
        pub cells: Vec<String>,
    }

    impl TableRow {
        pub fn new<I, S>(cells: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                cells: cells.into_iter().map(Into::into).collect(),
            }
        }

        /// The cell at `i`, or `""` past the end.
        pub fn cell(&self, i: usize) -> &str {
            self.cells.get(i).map(String::as_str).unwrap_or("")
        }

        /// The row's head cell, or `""` for an empty row.
        pub fn head(&self) -> &str {
            self.cell(0)
        }
    }

    /// Left, right, or center for table columns.
    ///
    /// A plain `---` separator cell parses as `Left`, and `Left` serializes back as plain dashes;
    /// only `Center` and `Right` carry `:` markers in the output.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum ColumnAlignment {
        Left,
        Center,
        Right,
    }
}

macro_rules! from_for_md_elem {
    ($elem:ident) => {
        impl From<$elem> for MdElem {
            fn from(value: $elem) -> Self {
                MdElem::$elem(value)
            }
        }
    };
}

from_for_md_elem! { Document }
from_for_md_elem! { Header }
from_for_md_elem! { Paragraph }
from_for_md_elem! { Comment }
from_for_md_elem! { Code }
from_for_md_elem! { LinkRef }
from_for_md_elem! { Table }
from_for_md_elem! { TableRow }
