//! The stepwise MarkdQL evaluator.

use crate::md_elem::elem::Paragraph;
use crate::md_elem::MdElem;
use crate::query::step::{Index, Step, Token};
use crate::query::QueryError;

/// Evaluates a MarkdQL expression against a root node.
///
/// The result is the final candidate set: empty when nothing matched (a normal outcome), and an
/// `Err` only for an expression the tokenizer can't consume ([`QueryError::UnrecognizedQuery`])
/// or a regex token that won't compile ([`QueryError::InvalidRegex`]).
///
/// ```
/// use markdql::md_elem::{elem::*, MdElem, ParseOptions};
/// use markdql::query::query;
///
/// let doc = Document::parse("# A\n## B\n### C\nHello ABC\n", &ParseOptions::default());
/// let root = MdElem::Document(doc);
/// let found = query("A.B.C[*]", &root).unwrap();
/// assert_eq!(found, vec![MdElem::Paragraph(Paragraph::new("Hello ABC"))]);
/// ```
pub fn query(expr: &str, root: &MdElem) -> Result<Vec<MdElem>, QueryError> {
    let mut state = QueryState::Run(Query::new(expr, root));
    loop {
        match state {
            QueryState::Run(running) => state = running.next()?,
            QueryState::Done(mds) => return Ok(mds),
        }
    }
}

impl MdElem {
    /// Evaluates a MarkdQL expression against this node. See [`query`].
    pub fn query(&self, expr: &str) -> Result<Vec<MdElem>, QueryError> {
        query(expr, self)
    }
}

/// An in-flight MarkdQL walk: the current candidate set plus the unconsumed tail of the
/// expression.
///
/// [`query`] drives this to completion, but the stepper is public so a walk can be observed one
/// step at a time: each [`Query::next`] consumes one `sep token index` step and applies it.
#[derive(Clone, Debug)]
pub struct Query {
    /// The current candidate set.
    pub mds: Vec<MdElem>,
    original: String,
    cursor: usize,
}

/// What [`Query::next`] produced: either a walk with more to do, or the final candidate set.
#[derive(Clone, Debug)]
pub enum QueryState {
    Run(Query),
    Done(Vec<MdElem>),
}

impl Query {
    pub fn new(expr: &str, root: &MdElem) -> Query {
        Query {
            mds: vec![root.clone()],
            original: expr.to_string(),
            cursor: 0,
        }
    }

    /// The unconsumed tail of the expression.
    pub fn remainder(&self) -> &str {
        &self.original[self.cursor..]
    }

    /// Consumes one step and applies it to the candidate set.
    ///
    /// The walk is done when the candidates run dry or the remainder is exhausted (a lone
    /// trailing `.` counts as exhausted). Indexing past the end of a container yields nothing;
    /// indexing *into* a leaf clamps, yielding the leaf itself.
    pub fn next(mut self) -> Result<QueryState, QueryError> {
        if self.mds.is_empty() || self.remainder().is_empty() || self.remainder() == "." {
            return Ok(QueryState::Done(self.mds));
        }
        let step = Step::parse(self.remainder(), &self.original)?;
        self.cursor += step.consumed();
        self.mds = apply_step(&step, &self.mds);
        Ok(QueryState::Run(self))
    }
}

fn apply_step(step: &Step, mds: &[MdElem]) -> Vec<MdElem> {
    let identity = matches!(step.token, Token::None) && !step.table && !step.recursive;
    let matched: Vec<MdElem> = if identity {
        mds.to_vec()
    } else {
        // Descending needs exactly one container to descend into.
        match mds {
            [single] if single.is_container() => find_match(single, step).into_iter().collect(),
            _ => Vec::new(),
        }
    };
    match &step.index {
        None => matched,
        Some(index) => matched.iter().flat_map(|node| apply_index(node, index)).collect(),
    }
}

/// First node in scope whose title the token accepts. Scope is the immediate children, or the
/// whole subtree (self included) for a recursive step.
fn find_match(root: &MdElem, step: &Step) -> Option<MdElem> {
    if step.recursive {
        root.collect_first_recursive(|node| accept(node, step).then(|| node.clone()))
    } else {
        root.children()?.iter().find(|child| accept(child, step)).cloned()
    }
}

fn accept(node: &MdElem, step: &Step) -> bool {
    match (step.table, node) {
        (true, MdElem::Table(_)) | (false, MdElem::Header(_)) => {}
        _ => return false,
    }
    step.token.matches(node.query_title().unwrap_or(""))
}

fn apply_index(node: &MdElem, index: &Index) -> Vec<MdElem> {
    match node {
        MdElem::Document(_) | MdElem::Header(_) => {
            let children = node.children().expect("container");
            match index {
                Index::Star => children,
                Index::Position(position) => resolve(*position, children.len())
                    .map(|i| vec![children[i].clone()])
                    .unwrap_or_default(),
                Index::Name(name) => children
                    .iter()
                    .find(|child| matches!(child, MdElem::Header(h) if h.title == *name))
                    .cloned()
                    .into_iter()
                    .collect(),
            }
        }
        MdElem::Table(table) => match index {
            Index::Star => table.rows.iter().cloned().map(MdElem::TableRow).collect(),
            Index::Position(position) => resolve(*position, table.rows.len())
                .map(|i| vec![MdElem::TableRow(table.rows[i].clone())])
                .unwrap_or_default(),
            Index::Name(name) => match name.split_once(',') {
                // column-first: `col` names a header-row cell, `row` a row's head cell
                Some((col, row)) => match (table.col_index_of(col), table.row_index_of(row)) {
                    (Some(col), Some(row)) => vec![MdElem::Paragraph(Paragraph::new(table.cell(col, row)))],
                    _ => Vec::new(),
                },
                None => table
                    .row_index_of(name)
                    .map(|i| vec![MdElem::TableRow(table.rows[i].clone())])
                    .unwrap_or_default(),
            },
        },
        MdElem::TableRow(row) => match index {
            Index::Star => row.cells.iter().map(|cell| MdElem::Paragraph(Paragraph::new(cell))).collect(),
            Index::Position(position) => resolve(*position, row.cells.len())
                .map(|i| vec![MdElem::Paragraph(Paragraph::new(&row.cells[i]))])
                .unwrap_or_default(),
            Index::Name(_) => Vec::new(),
        },
        // indexing can't descend into a leaf: clamp, returning the leaf itself
        leaf => vec![leaf.clone()],
    }
}

fn resolve(position: i64, len: usize) -> Option<usize> {
    let index = if position >= 0 { position } else { len as i64 + position };
    (index >= 0 && index < len as i64).then_some(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::md_elem::{elem::*, ParseOptions};
    use indoc::indoc;

    fn root(text: &str) -> MdElem {
        MdElem::Document(Document::parse(text, &ParseOptions::default()))
    }

    fn para(text: &str) -> MdElem {
        MdElem::Paragraph(Paragraph::new(text))
    }

    mod walking {
        use super::*;

        #[test]
        fn dotted_path_with_star() {
            let root = root("# A\n## B\n### C\nHello ABC\n");
            assert_eq!(query("A.B.C[*]", &root).unwrap(), vec![para("Hello ABC")]);
        }

        #[test]
        fn missing_title_yields_empty() {
            let root = root("# A\n");
            assert_eq!(query("Nope", &root).unwrap(), vec![]);
            assert_eq!(query("A.Nope", &root).unwrap(), vec![]);
        }

        #[test]
        fn trailing_dot_terminates() {
            let root = root("# A\n");
            let with_dot = query("A.", &root).unwrap();
            assert_eq!(with_dot, query("A", &root).unwrap());
            assert_eq!(with_dot.len(), 1);
        }

        #[test]
        fn identity_step() {
            let root = root("# A\n");
            assert_eq!(query("[0]", &root).unwrap(), vec![root.children().unwrap()[0].clone()]);
        }

        #[test]
        fn quoted_token() {
            let root = root("# Weird.Title\ntext\n");
            assert_eq!(query(r#""Weird.Title"[*]"#, &root).unwrap(), vec![para("text")]);
        }

        #[test]
        fn regex_token() {
            let root = root("# Alpha\n# Beta\n");
            let found = query("/^Bet/[*]", &root).unwrap();
            assert_eq!(found, vec![]);
            let headers = query("/^Bet/", &root).unwrap();
            let MdElem::Header(beta) = &headers[0] else {
                panic!("expected a header");
            };
            assert_eq!(beta.title, "Beta");
        }

        #[test]
        fn recursive_descent() {
            let root = root("# A\n## B\n### C\n### C2\n");
            let found = query("..B[-1]", &root).unwrap();
            let MdElem::Header(c2) = &found[0] else {
                panic!("expected a header");
            };
            assert_eq!(c2.title, "C2");
        }

        #[test]
        fn recursive_finds_first_in_preorder() {
            let root = root("# A\n## X\n# B\n## X\nsecond\n");
            let found = query("..X[*]", &root).unwrap();
            assert_eq!(found, vec![]); // the first X (under A) is empty
        }
    }

    mod indexing {
        use super::*;

        #[test]
        fn positions_and_negatives() {
            let root = root("# A\none\n\ntwo\n\nthree\n");
            assert_eq!(query("A[0]", &root).unwrap(), vec![para("one")]);
            assert_eq!(query("A[2]", &root).unwrap(), vec![para("three")]);
            assert_eq!(query("A[-1]", &root).unwrap(), vec![para("three")]);
            assert_eq!(query("A[-3]", &root).unwrap(), vec![para("one")]);
        }

        #[test]
        fn out_of_range_is_empty() {
            let root = root("# A\none\n");
            assert_eq!(query("A[5]", &root).unwrap(), vec![]);
            assert_eq!(query("A[-2]", &root).unwrap(), vec![]);
        }

        #[test]
        fn name_index_picks_child_header() {
            let root = root("# A\n## B\n## C\n");
            let found = query("A[C]", &root).unwrap();
            let MdElem::Header(c) = &found[0] else {
                panic!("expected a header");
            };
            assert_eq!(c.title, "C");
        }

        #[test]
        fn indexing_past_a_leaf_clamps() {
            let root = root("# A\nleaf\n");
            assert_eq!(query("A[0][0][0]", &root).unwrap(), vec![para("leaf")]);
        }
    }

    mod tables {
        use super::*;

        fn table_root() -> MdElem {
            root(indoc! {"
                # Section
                | To Do | Description |
                |-------|-------------|
                | R1    | D1          |
                | R2    | D2          |
            "})
        }

        #[test]
        fn cell_by_col_and_row() {
            assert_eq!(
                query("..|To Do[Description,R2]", &table_root()).unwrap(),
                vec![para("D2")]
            );
        }

        #[test]
        fn table_flag_does_not_match_headers() {
            assert_eq!(query("|Section", &table_root()).unwrap(), vec![]);
        }

        #[test]
        fn missing_column_is_empty_not_error() {
            assert_eq!(query("..|To Do[Nope,R2]", &table_root()).unwrap(), vec![]);
        }

        #[test]
        fn row_by_position() {
            let found = query("..|To Do[1]", &table_root()).unwrap();
            assert_eq!(found, vec![MdElem::TableRow(TableRow::new(["R1", "D1"]))]);
        }

        #[test]
        fn row_by_name() {
            let found = query("..|To Do[R2]", &table_root()).unwrap();
            assert_eq!(found, vec![MdElem::TableRow(TableRow::new(["R2", "D2"]))]);
        }

        #[test]
        fn row_cells_index_as_paragraphs() {
            let found = query("..|To Do[1][-1]", &table_root()).unwrap();
            assert_eq!(found, vec![para("D1")]);
        }

        #[test]
        fn star_on_table_yields_rows() {
            let found = query("..|To Do[*]", &table_root()).unwrap();
            assert_eq!(found.len(), 3);
            assert!(found.iter().all(|n| matches!(n, MdElem::TableRow(_))));
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn unrecognized_query_carries_original() {
            let root = root("# A\n");
            assert_eq!(
                query("A. nope", &root),
                Err(QueryError::UnrecognizedQuery("A. nope".to_string()))
            );
        }

        #[test]
        fn invalid_regex() {
            let root = root("# A\n");
            assert_eq!(
                query("/(bad/", &root),
                Err(QueryError::InvalidRegex("(bad".to_string()))
            );
        }

        #[test]
        fn empty_result_is_not_an_error() {
            let root = root("# A\n");
            assert_eq!(query("Z.Y.X[9]", &root).unwrap(), vec![]);
        }
    }

    mod stepping {
        use super::*;

        #[test]
        fn one_step_at_a_time() {
            let root = root("# A\n## B\ntext\n");
            let start = Query::new("A.B[*]", &root);
            assert_eq!(start.remainder(), "A.B[*]");

            let QueryState::Run(after_a) = start.next().unwrap() else {
                panic!("expected Run");
            };
            assert_eq!(after_a.remainder(), ".B[*]");
            assert_eq!(after_a.mds.len(), 1);

            let QueryState::Run(after_b) = after_a.next().unwrap() else {
                panic!("expected Run");
            };
            assert_eq!(after_b.remainder(), "");
            assert_eq!(after_b.mds, vec![para("text")]);

            let QueryState::Done(done) = after_b.next().unwrap() else {
                panic!("expected Done");
            };
            assert_eq!(done, vec![para("text")]);
        }

        #[test]
        fn empty_candidates_finish_early() {
            let root = root("# A\n");
            let QueryState::Run(after) = Query::new("Nope.ignored[*]", &root).next().unwrap() else {
                panic!("expected Run");
            };
            assert!(after.mds.is_empty());
            let QueryState::Done(done) = after.next().unwrap() else {
                panic!("expected Done");
            };
            assert_eq!(done, vec![]);
        }
    }
}
