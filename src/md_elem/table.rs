//! Table refinement and cell-level access.
//!
//! A paragraph whose second line is an alignment row (`:--|:-:|--:` and friends) refines into a
//! [`Table`]. Everything here is value-like: updates return a new table.

use crate::md_elem::elem::{ColumnAlignment, Table, TableRow};
use regex::Regex;
use std::sync::LazyLock;

/// One alignment-row cell. Order matters: the center arm must win before the left/right arms.
static ALIGN_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(:-+:|:-+|-+:|---+)\s*$").expect("static pattern"));

impl Table {
    /// Tries to reinterpret paragraph text as a table.
    ///
    /// Returns `None` unless the text has at least two lines and every cell of the second line is
    /// an alignment cell. Cell values are trimmed; the first line becomes the header row. A
    /// leading `|` on the alignment row means the whole table is in the `|leading` form, and one
    /// leading empty cell is dropped from every line.
    pub fn parse(text: &str) -> Option<Table> {
        let mut lines: Vec<Vec<String>> = text.lines().map(split_cells).collect();
        if lines.len() < 2 {
            return None;
        }
        if lines[1].first().is_some_and(|cell| cell.is_empty()) {
            for line in &mut lines {
                if line.first().is_some_and(|cell| cell.is_empty()) {
                    line.remove(0);
                }
            }
        }
        let mut alignments = Vec::with_capacity(lines[1].len());
        for cell in &lines[1] {
            alignments.push(parse_align_cell(cell)?);
        }
        if alignments.is_empty() {
            return None;
        }
        let rows = lines
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != 1)
            .map(|(_, cells)| TableRow::new(cells.iter().map(|c| c.trim())))
            .collect();
        Some(Table { alignments, rows })
    }

    /// Number of aligned columns. Rows may be shorter (missing cells read as empty) or longer
    /// (ragged overflow).
    pub fn col_size(&self) -> usize {
        self.alignments.len()
    }

    pub fn row_size(&self) -> usize {
        self.rows.len()
    }

    /// The head cell of the header row. This is the table's name as far as MarkdQL's `|` flag is
    /// concerned.
    pub fn title(&self) -> &str {
        self.rows.first().map(|row| row.head()).unwrap_or("")
    }

    /// The row at `i`, or an empty row out of range.
    pub fn row(&self, i: usize) -> TableRow {
        self.rows.get(i).cloned().unwrap_or_default()
    }

    /// The first row (header row included) whose head cell is `name`, or an empty row.
    pub fn row_named(&self, name: &str) -> TableRow {
        self.row_index_of(name).map(|i| self.rows[i].clone()).unwrap_or_default()
    }

    /// Index of the first row whose head cell is `name`.
    pub fn row_index_of(&self, name: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.head() == name)
    }

    /// Index of the header-row cell equal to `name`.
    pub fn col_index_of(&self, name: &str) -> Option<usize> {
        self.rows.first()?.cells.iter().position(|cell| cell == name)
    }

    /// The cell at `(col, row)`, or `""` on any miss. An empty cell and a missing cell are not
    /// distinguishable here.
    pub fn cell(&self, col: usize, row: usize) -> String {
        self.rows.get(row).map(|r| r.cell(col).to_string()).unwrap_or_default()
    }

    /// The cell at `col` within the row headed by `row_name`; `""` on any miss.
    pub fn cell_in(&self, col: usize, row_name: &str) -> String {
        self.row_index_of(row_name).map(|row| self.cell(col, row)).unwrap_or_default()
    }

    /// The cell addressed column-first by names: `col_name` against the header row, `row_name`
    /// against each row's head cell. `""` on any miss.
    pub fn cell_by_names(&self, col_name: &str, row_name: &str) -> String {
        match (self.col_index_of(col_name), self.row_index_of(row_name)) {
            (Some(col), Some(row)) => self.cell(col, row),
            _ => String::new(),
        }
    }

    /// A copy of this table with the cell at `(col, row)` set to `value`.
    ///
    /// Writing past the current grid grows it: blank rows are inserted up to `row`, the target
    /// row is padded out to `col`, and a header-row write extends the alignments (new columns are
    /// left-aligned). Trailing empty cells of the touched row are trimmed away afterwards.
    pub fn updated(&self, col: usize, row: usize, value: &str) -> Table {
        let mut table = self.clone();
        if row == 0 {
            while table.alignments.len() < col + 1 {
                table.alignments.push(ColumnAlignment::Left);
            }
        }
        while table.rows.len() <= row {
            table.rows.push(TableRow::default());
        }
        let cells = &mut table.rows[row].cells;
        while cells.len() < col + 1 {
            cells.push(String::new());
        }
        cells[col] = value.to_string();
        while cells.last().is_some_and(|cell| cell.is_empty()) {
            cells.pop();
        }
        table
    }

    /// Like [`Table::updated`], addressing by names.
    ///
    /// A missing column appends a new header cell (and with it a new column); a missing row
    /// appends a new row headed by `row_name`.
    pub fn updated_by_names(&self, col_name: &str, row_name: &str, value: &str) -> Table {
        let (mut table, col) = match self.col_index_of(col_name) {
            Some(col) => (self.clone(), col),
            None => {
                let col = self.rows.first().map_or(0, |header| header.cells.len());
                (self.updated(col, 0, col_name), col)
            }
        };
        let row = match table.row_index_of(row_name) {
            Some(row) => row,
            None => {
                let row = table.row_size();
                table = table.updated(0, row, row_name);
                row
            }
        };
        table.updated(col, row, value)
    }
}

/// Splits a table line into raw cells on unescaped `|`, dropping trailing all-whitespace cells.
/// Escaped pipes keep both characters, so round-tripping preserves them.
fn split_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in line.chars() {
        if ch == '|' && !escaped {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
        escaped = ch == '\\' && !escaped;
    }
    cells.push(current);
    while cells.last().is_some_and(|cell| cell.trim().is_empty()) {
        cells.pop();
    }
    cells
}

fn parse_align_cell(cell: &str) -> Option<ColumnAlignment> {
    let matched = ALIGN_CELL.captures(cell)?.get(1).expect("group 1 always set").as_str();
    let align = match (matched.starts_with(':'), matched.ends_with(':')) {
        (true, true) => ColumnAlignment::Center,
        (true, false) => ColumnAlignment::Left,
        (false, true) => ColumnAlignment::Right,
        (false, false) => ColumnAlignment::Left,
    };
    Some(align)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    mod parsing {
        use super::*;

        #[test]
        fn bare_form() {
            let table = Table::parse(indoc! {"
                Id|Name
                :--|--:
                1|One"})
            .unwrap();
            assert_eq!(table.alignments, vec![ColumnAlignment::Left, ColumnAlignment::Right]);
            assert_eq!(table.rows, vec![TableRow::new(["Id", "Name"]), TableRow::new(["1", "One"])]);
        }

        #[test]
        fn leading_pipe_form() {
            let table = Table::parse(indoc! {"
                | Id | Name |
                |----|------|
                | 1  | One  |"})
            .unwrap();
            assert_eq!(table.alignments, vec![ColumnAlignment::Left, ColumnAlignment::Left]);
            assert_eq!(table.rows, vec![TableRow::new(["Id", "Name"]), TableRow::new(["1", "One"])]);
        }

        #[test]
        fn alignment_variants() {
            let table = Table::parse("a|b|c|d\n:--|:-:|-:|---").unwrap();
            assert_eq!(
                table.alignments,
                vec![
                    ColumnAlignment::Left,
                    ColumnAlignment::Center,
                    ColumnAlignment::Right,
                    ColumnAlignment::Left,
                ]
            );
        }

        #[test]
        fn middle_empty_cells_survive() {
            let table = Table::parse("a||c\n---|---|---\n1||3").unwrap();
            assert_eq!(table.rows[1], TableRow::new(["1", "", "3"]));
        }

        #[test]
        fn escaped_pipe_stays_in_cell() {
            let table = Table::parse("a\\|b|c\n---|---").unwrap();
            assert_eq!(table.rows[0], TableRow::new(["a\\|b", "c"]));
        }

        #[test]
        fn ragged_rows() {
            let table = Table::parse("a|b\n---|---\n1|2|3|4\n5").unwrap();
            assert_eq!(table.col_size(), 2);
            assert_eq!(table.rows[1], TableRow::new(["1", "2", "3", "4"]));
            assert_eq!(table.rows[2], TableRow::new(["5"]));
        }

        #[test]
        fn not_tables() {
            assert_eq!(Table::parse("just text"), None);
            assert_eq!(Table::parse("a|b"), None);
            assert_eq!(Table::parse("a|b\n---|nope"), None);
            // a non-alignment cell anywhere in line two disqualifies the whole thing
            assert_eq!(Table::parse("a|b\n---|---|x"), None);
            // plain cells need three dashes; the marker forms get by with less
            assert_eq!(Table::parse("a|b\n--|--"), None);
        }
    }

    mod cells {
        use super::*;

        fn sample() -> Table {
            Table::parse(indoc! {"
                | To Do | Description |
                |-------|-------------|
                | R1    | D1          |
                | R2    | D2          |"})
            .unwrap()
        }

        #[test]
        fn by_index() {
            assert_eq!(sample().cell(1, 2), "D2");
            assert_eq!(sample().cell(9, 2), "");
            assert_eq!(sample().cell(1, 9), "");
        }

        #[test]
        fn by_names() {
            assert_eq!(sample().cell_by_names("Description", "R2"), "D2");
            assert_eq!(sample().cell_by_names("Description", "nope"), "");
            assert_eq!(sample().cell_by_names("nope", "R2"), "");
        }

        #[test]
        fn mixed() {
            assert_eq!(sample().cell_in(1, "R1"), "D1");
        }

        #[test]
        fn rows() {
            assert_eq!(sample().row(0), TableRow::new(["To Do", "Description"]));
            assert_eq!(sample().row(9), TableRow::default());
            assert_eq!(sample().row_named("R2"), TableRow::new(["R2", "D2"]));
            assert_eq!(sample().row_named("To Do"), TableRow::new(["To Do", "Description"]));
            assert_eq!(sample().row_named("nope"), TableRow::default());
        }

        #[test]
        fn title_is_head_cell() {
            assert_eq!(sample().title(), "To Do");
        }
    }

    mod updates {
        use super::*;

        fn sample() -> Table {
            Table::parse("a|b\n---|---\n1|2").unwrap()
        }

        #[test]
        fn in_place() {
            let updated = sample().updated(1, 1, "two");
            assert_eq!(updated.cell(1, 1), "two");
            assert_eq!(updated.cell(0, 1), "1");
        }

        #[test]
        fn header_write_extends_alignments() {
            let updated = sample().updated(3, 0, "d");
            assert_eq!(updated.col_size(), 4);
            assert_eq!(updated.alignments[2], ColumnAlignment::Left);
            assert_eq!(updated.rows[0], TableRow::new(["a", "b", "", "d"]));
        }

        #[test]
        fn data_write_past_rows_inserts_blanks() {
            let updated = sample().updated(0, 4, "x");
            assert_eq!(updated.row_size(), 5);
            assert_eq!(updated.rows[3], TableRow::default());
            assert_eq!(updated.cell(0, 4), "x");
            // alignments untouched by a data-row write
            assert_eq!(updated.col_size(), 2);
        }

        #[test]
        fn trailing_empties_trimmed() {
            let updated = sample().updated(3, 1, "");
            assert_eq!(updated.rows[1], TableRow::new(["1", "2"]));
        }

        #[test]
        fn by_names_existing() {
            let updated = sample().updated_by_names("b", "1", "two");
            assert_eq!(updated.cell_by_names("b", "1"), "two");
        }

        #[test]
        fn by_names_new_column_and_row() {
            let updated = sample().updated_by_names("c", "9", "val");
            assert_eq!(updated.col_size(), 3);
            assert_eq!(updated.rows[0], TableRow::new(["a", "b", "c"]));
            assert_eq!(updated.cell_by_names("c", "9"), "val");
            assert_eq!(updated.row_named("9"), TableRow::new(["9", "", "val"]));
        }

        #[test]
        fn update_round_trips_through_cell() {
            let updated = sample().updated(1, 1, "value");
            assert_eq!(updated.cell(1, 1), "value");
        }
    }
}
