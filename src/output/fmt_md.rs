//! Serialize a tree back to Markdown with stable normalization.

use crate::md_elem::elem::*;
use crate::md_elem::link_ref::escape_title;
use crate::md_elem::MdElem;
use crate::output::json_codec::JsonCodec;
use crate::util::str_utils::pad_to;

/// Width of the `===` / `---` underline for setext headers.
const UNDERLINE_WIDTH: usize = 78;

/// Code-block languages that get per-line JSON minification.
const JSON_LINES_LANGUAGES: [&str; 4] = ["jsonline", "jsonlines", "json line", "json lines"];

/// Output-style configuration.
///
/// Currently a placeholder: the default configuration is the only one, and it is what every
/// convenience entry point uses. Future options (atx vs setext headers, minified output) will
/// live here, which is why it's `#[non_exhaustive]`.
#[non_exhaustive]
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash)]
pub struct FormatCfg {}

/// Serializes [`MdElem`]s to Markdown text.
///
/// The writer owns the [`FormatCfg`] and, optionally, a [`JsonCodec`] for code-block
/// post-processing. Without a codec, code blocks are emitted with their content unchanged no
/// matter the language.
pub struct MdWriter<'a> {
    pub cfg: FormatCfg,
    codec: Option<&'a dyn JsonCodec>,
}

/// Serializes one node with the default [`FormatCfg`] and no JSON codec.
///
/// ```
/// use markdql::md_elem::{elem::*, MdElem, ParseOptions};
/// use markdql::output::write_md;
///
/// let doc = Document::parse("### Hi\ntext\n", &ParseOptions::default());
/// assert_eq!(write_md(&MdElem::Document(doc)), "### Hi\n\ntext\n");
/// ```
pub fn write_md(node: &MdElem) -> String {
    MdWriter::new(FormatCfg::default()).write(node)
}

impl<'a> MdWriter<'a> {
    pub fn new(cfg: FormatCfg) -> Self {
        Self { cfg, codec: None }
    }

    pub fn with_codec(cfg: FormatCfg, codec: &'a dyn JsonCodec) -> Self {
        Self { cfg, codec: Some(codec) }
    }

    pub fn write(&self, node: &MdElem) -> String {
        let mut out = String::with_capacity(256);
        self.write_into(&mut out, node);
        out
    }

    /// Appends `node`'s serialized form to a caller-supplied buffer.
    pub fn write_into(&self, out: &mut String, node: &MdElem) {
        match node {
            MdElem::Document(doc) => self.write_children(out, &doc.children, false),
            MdElem::Header(header) => self.write_header(out, header),
            MdElem::Paragraph(para) => {
                out.push_str(para.text.trim());
                out.push('\n');
            }
            MdElem::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(&comment.text);
                out.push_str("-->\n");
            }
            MdElem::Code(code) => self.write_code(out, code),
            MdElem::LinkRef(link_ref) => write_link_ref(out, link_ref),
            MdElem::Table(table) => write_table(out, table),
            MdElem::TableRow(row) => write_bare_row(out, row),
        }
    }

    /// The inter-sibling whitespace contract: one blank line between siblings, nothing before
    /// the first, and nothing between two adjacent link references.
    fn pre_space(&self, out: &mut String, prev: Option<&MdElem>, node: &MdElem) {
        match prev {
            None => {}
            Some(MdElem::LinkRef(_)) if matches!(node, MdElem::LinkRef(_)) => {}
            Some(_) => out.push('\n'),
        }
    }

    fn write_children(&self, out: &mut String, children: &[MdElem], after_title: bool) {
        let mut prev: Option<&MdElem> = None;
        for child in children {
            match prev {
                None if after_title => out.push('\n'),
                _ => self.pre_space(out, prev, child),
            }
            self.write_into(out, child);
            prev = Some(child);
        }
    }

    fn write_header(&self, out: &mut String, header: &Header) {
        match header.level {
            0 => {}
            1 | 2 => {
                let underline = if header.level == 1 { '=' } else { '-' };
                out.push_str(&header.title);
                out.push('\n');
                (0..UNDERLINE_WIDTH).for_each(|_| out.push(underline));
                out.push('\n');
            }
            level => {
                (0..level).for_each(|_| out.push('#'));
                out.push(' ');
                out.push_str(&header.title);
                out.push('\n');
            }
        }
        self.write_children(out, &header.children, header.level > 0);
    }

    fn write_code(&self, out: &mut String, code: &Code) {
        out.push_str("```");
        out.push_str(&code.language);
        out.push('\n');
        out.push_str(&self.process_code_body(&code.language, &code.content));
        out.push_str("```\n");
    }

    /// JSON post-processing, when a codec is installed and the language asks for it. Any codec
    /// failure falls back to the original content.
    fn process_code_body(&self, language: &str, content: &str) -> String {
        let Some(codec) = self.codec else {
            return content.to_string();
        };
        if language == "json" {
            match codec.pretty_json(content) {
                Ok(mut pretty) => {
                    if !pretty.ends_with('\n') {
                        pretty.push('\n');
                    }
                    pretty
                }
                Err(_) => content.to_string(),
            }
        } else if JSON_LINES_LANGUAGES.contains(&language) {
            let mut out = String::with_capacity(content.len());
            for line in content.lines() {
                match codec.minify_json(line) {
                    Ok(minified) => out.push_str(&minified),
                    Err(_) => out.push_str(line),
                }
                out.push('\n');
            }
            out
        } else {
            content.to_string()
        }
    }
}

fn write_link_ref(out: &mut String, link_ref: &LinkRef) {
    out.push('[');
    out.push_str(&link_ref.label);
    out.push_str("]:");
    if let Some(url) = &link_ref.url {
        out.push(' ');
        out.push_str(url);
    }
    if let Some(title) = &link_ref.title {
        out.push_str(" \"");
        out.push_str(&escape_title(title));
        out.push('"');
    }
    out.push('\n');
}

fn write_table(out: &mut String, table: &Table) {
    let col_size = table.col_size();
    // Column width: at least 1, at most the longest cell in the column across all rows. Ragged
    // overflow cells don't participate.
    let mut widths = vec![1usize; col_size];
    for row in &table.rows {
        for (i, cell) in row.cells.iter().enumerate().take(col_size) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    if let Some(header) = table.rows.first() {
        write_aligned_row(out, header, table, &widths);
    }
    out.push('|');
    for (align, width) in table.alignments.iter().zip(&widths) {
        let dashes = width + 2;
        match align {
            ColumnAlignment::Left => (0..dashes).for_each(|_| out.push('-')),
            ColumnAlignment::Center => {
                out.push(':');
                (0..dashes - 2).for_each(|_| out.push('-'));
                out.push(':');
            }
            ColumnAlignment::Right => {
                (0..dashes - 1).for_each(|_| out.push('-'));
                out.push(':');
            }
        }
        out.push('|');
    }
    out.push('\n');
    for row in table.rows.iter().skip(1) {
        write_aligned_row(out, row, table, &widths);
    }
}

fn write_aligned_row(out: &mut String, row: &TableRow, table: &Table, widths: &[usize]) {
    out.push('|');
    for (i, width) in widths.iter().enumerate() {
        out.push(' ');
        pad_to(out, row.cell(i), *width, table.alignments[i]);
        out.push_str(" |");
    }
    // ragged overflow: appended past the aligned grid, no padding
    for cell in row.cells.iter().skip(widths.len()) {
        out.push(' ');
        out.push_str(cell);
        out.push_str(" |");
    }
    out.push('\n');
}

/// A row serialized on its own (outside a table) has no alignments or widths to honor.
fn write_bare_row(out: &mut String, row: &TableRow) {
    out.push('|');
    for cell in &row.cells {
        out.push(' ');
        out.push_str(cell);
        out.push_str(" |");
    }
    out.push('\n');
}
