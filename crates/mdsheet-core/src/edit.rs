//! Structural edits on tables, sheets and workbooks
//!
//! Every operation either succeeds completely or returns an error without
//! touching the target. Rows always keep exactly one cell per header.

use crate::error::{Error, Result};
use crate::table::{normalize_row, Alignment, Sheet, SheetKind, Table, Workbook};
use serde::{Deserialize, Serialize};

impl Table {
    /// Replace one cell's value
    pub fn update_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> Result<()> {
        self.check_row(row)?;
        self.check_column(col)?;
        self.rows[row][col] = value.into();
        Ok(())
    }

    /// Insert an empty row at `index`, appending when `index` is past the end.
    ///
    /// Returns the index the row landed at.
    pub fn insert_row(&mut self, index: usize) -> usize {
        let index = index.min(self.rows.len());
        self.rows.insert(index, vec![String::new(); self.headers.len()]);
        index
    }

    /// Remove and return a row
    pub fn delete_row(&mut self, index: usize) -> Result<Vec<String>> {
        self.check_row(index)?;
        Ok(self.rows.remove(index))
    }

    /// Move a row from one position to another
    pub fn move_row(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_row(from)?;
        self.check_row(to)?;
        let row = self.rows.remove(from);
        self.rows.insert(to, row);
        Ok(())
    }

    /// Insert an unnamed, empty column at `index`, appending when `index` is past the end.
    ///
    /// Returns the index the column landed at.
    pub fn insert_column(&mut self, index: usize) -> usize {
        let index = index.min(self.headers.len());
        self.headers.insert(index, String::new());
        for row in &mut self.rows {
            row.insert(index, String::new());
        }
        if let Some(alignments) = &mut self.alignments {
            alignments.insert(index, Alignment::None);
        }
        index
    }

    /// Remove a column from the headers and every row.
    ///
    /// Removing the last column leaves a table with no headers and no rows.
    pub fn delete_column(&mut self, index: usize) -> Result<()> {
        self.check_column(index)?;
        self.headers.remove(index);
        if self.headers.is_empty() {
            self.rows.clear();
            self.alignments = None;
            return Ok(());
        }

        for row in &mut self.rows {
            row.remove(index);
        }
        if let Some(alignments) = &mut self.alignments {
            alignments.remove(index);
            if alignments.iter().all(|a| *a == Alignment::None) {
                self.alignments = None;
            }
        }
        Ok(())
    }

    /// Blank every cell in a column, keeping the column
    pub fn clear_column_data(&mut self, index: usize) -> Result<()> {
        self.check_column(index)?;
        for row in &mut self.rows {
            row[index].clear();
        }
        Ok(())
    }

    /// Rename a column
    pub fn set_header(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        self.check_column(index)?;
        self.headers[index] = name.into();
        Ok(())
    }

    fn check_row(&self, index: usize) -> Result<()> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(Error::RowOutOfRange {
                index,
                len: self.rows.len(),
            })
        }
    }

    fn check_column(&self, index: usize) -> Result<()> {
        if index < self.headers.len() {
            Ok(())
        } else {
            Err(Error::ColumnOutOfRange {
                index,
                len: self.headers.len(),
            })
        }
    }
}

impl Sheet {
    /// Append a table, returning its index.
    ///
    /// Rows are padded or truncated to the header width. Document sheets
    /// hold free-form text and cannot take tables.
    pub fn add_table(&mut self, mut table: Table) -> Result<usize> {
        if self.kind == SheetKind::Doc {
            return Err(Error::DocumentSheet(self.name.clone()));
        }
        let width = table.headers.len();
        table.rows = table
            .rows
            .into_iter()
            .map(|row| normalize_row(row, width))
            .collect();
        if let Some(alignments) = &mut table.alignments {
            alignments.resize(width, Alignment::None);
        }
        self.tables.push(table);
        Ok(self.tables.len() - 1)
    }

    /// Remove and return the table at `index`
    pub fn delete_table(&mut self, index: usize) -> Result<Table> {
        self.check_table(index)?;
        Ok(self.tables.remove(index))
    }

    /// Table by position
    pub fn table_mut(&mut self, index: usize) -> Result<&mut Table> {
        self.check_table(index)?;
        Ok(&mut self.tables[index])
    }

    fn check_table(&self, index: usize) -> Result<()> {
        if self.kind == SheetKind::Doc {
            return Err(Error::DocumentSheet(self.name.clone()));
        }
        if index < self.tables.len() {
            Ok(())
        } else {
            Err(Error::TableIndexOutOfRange {
                sheet: self.name.clone(),
                index,
                len: self.tables.len(),
            })
        }
    }
}

/// Addresses a sheet by position or by name (first match)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetRef {
    Index(usize),
    Name(String),
}

impl From<usize> for SheetRef {
    fn from(index: usize) -> Self {
        SheetRef::Index(index)
    }
}

impl From<&str> for SheetRef {
    fn from(name: &str) -> Self {
        SheetRef::Name(name.to_string())
    }
}

impl From<String> for SheetRef {
    fn from(name: String) -> Self {
        SheetRef::Name(name)
    }
}

impl Workbook {
    /// Append an empty table sheet. Duplicate names are allowed.
    pub fn add_sheet(&mut self, name: impl Into<String>) -> &mut Sheet {
        self.sheets.push(Sheet::new(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    /// Remove and return a sheet
    pub fn delete_sheet(&mut self, sheet: impl Into<SheetRef>) -> Result<Sheet> {
        let index = self.sheet_index(&sheet.into())?;
        Ok(self.sheets.remove(index))
    }

    /// Give a sheet a new name
    pub fn rename_sheet(&mut self, sheet: impl Into<SheetRef>, name: impl Into<String>) -> Result<()> {
        let index = self.sheet_index(&sheet.into())?;
        self.sheets[index].name = name.into();
        Ok(())
    }

    /// Move a sheet to position `to`, shifting the sheets in between
    pub fn move_sheet(&mut self, sheet: impl Into<SheetRef>, to: usize) -> Result<()> {
        let from = self.sheet_index(&sheet.into())?;
        if to >= self.sheets.len() {
            return Err(Error::SheetIndexOutOfRange {
                index: to,
                len: self.sheets.len(),
            });
        }
        let sheet = self.sheets.remove(from);
        self.sheets.insert(to, sheet);
        Ok(())
    }

    /// Resolve a sheet reference to its position
    pub fn sheet_index(&self, sheet: &SheetRef) -> Result<usize> {
        match sheet {
            SheetRef::Index(index) if *index < self.sheets.len() => Ok(*index),
            SheetRef::Index(index) => Err(Error::SheetIndexOutOfRange {
                index: *index,
                len: self.sheets.len(),
            }),
            SheetRef::Name(name) => self
                .sheets
                .iter()
                .position(|s| s.name == *name)
                .ok_or_else(|| Error::SheetNotFound(name.clone())),
        }
    }

    /// Mutable access to a sheet by reference
    pub fn sheet_mut(&mut self, sheet: &SheetRef) -> Result<&mut Sheet> {
        let index = self.sheet_index(sheet)?;
        Ok(&mut self.sheets[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample() -> Table {
        Table::new(
            strings(&["A", "B"]),
            vec![strings(&["1", "2"]), strings(&["3", "4"])],
        )
    }

    fn assert_shape(table: &Table) {
        for row in &table.rows {
            assert_eq!(row.len(), table.headers.len());
        }
    }

    #[test]
    fn test_update_cell() {
        let mut table = sample();
        table.update_cell(1, 0, "x").unwrap();
        assert_eq!(table.rows[1], strings(&["x", "4"]));
    }

    #[test]
    fn test_update_cell_out_of_range() {
        let mut table = sample();
        assert!(matches!(
            table.update_cell(2, 0, "x"),
            Err(Error::RowOutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            table.update_cell(0, 5, "x"),
            Err(Error::ColumnOutOfRange { index: 5, len: 2 })
        ));
        assert_eq!(table, sample());
    }

    #[test]
    fn test_insert_row() {
        let mut table = sample();
        assert_eq!(table.insert_row(1), 1);
        assert_eq!(table.rows[1], strings(&["", ""]));
        assert_eq!(table.insert_row(99), 3);
        assert_eq!(table.row_count(), 4);
        assert_shape(&table);
    }

    #[test]
    fn test_delete_row() {
        let mut table = sample();
        assert_eq!(table.delete_row(0).unwrap(), strings(&["1", "2"]));
        assert_eq!(table.rows, vec![strings(&["3", "4"])]);
        assert!(table.delete_row(1).is_err());
    }

    #[test]
    fn test_move_row() {
        let mut table = sample();
        table.insert_row(2);
        table.update_cell(2, 0, "5").unwrap();
        table.move_row(2, 0).unwrap();
        assert_eq!(table.cell(0, 0), Some("5"));
        assert_eq!(table.cell(1, 0), Some("1"));
        assert!(table.move_row(0, 3).is_err());
    }

    #[test]
    fn test_insert_column() {
        let mut table = sample().with_alignments(vec![Alignment::Right, Alignment::None]);
        assert_eq!(table.insert_column(1), 1);
        assert_eq!(table.headers, strings(&["A", "", "B"]));
        assert_eq!(table.rows[0], strings(&["1", "", "2"]));
        assert_eq!(
            table.alignments,
            Some(vec![Alignment::Right, Alignment::None, Alignment::None])
        );

        assert_eq!(table.insert_column(10), 3);
        assert_shape(&table);
    }

    #[test]
    fn test_delete_column() {
        let mut table = sample().with_alignments(vec![Alignment::Center, Alignment::None]);
        table.delete_column(0).unwrap();
        assert_eq!(table.headers, strings(&["B"]));
        assert_eq!(table.rows, vec![strings(&["2"]), strings(&["4"])]);
        assert_eq!(table.alignments, None);
        assert!(table.delete_column(1).is_err());
    }

    #[test]
    fn test_delete_last_column_empties_table() {
        let mut table = sample();
        table.delete_column(1).unwrap();
        table.delete_column(0).unwrap();
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_clear_column_data() {
        let mut table = sample();
        table.clear_column_data(1).unwrap();
        assert_eq!(table.headers, strings(&["A", "B"]));
        assert_eq!(table.rows, vec![strings(&["1", ""]), strings(&["3", ""])]);
        assert!(table.clear_column_data(2).is_err());
    }

    #[test]
    fn test_set_header() {
        let mut table = sample();
        table.insert_column(2);
        table.set_header(2, "C").unwrap();
        assert_eq!(table.headers, strings(&["A", "B", "C"]));
    }

    #[test]
    fn test_sheet_tables() {
        let mut sheet = Sheet::new("S");
        assert_eq!(sheet.add_table(sample()).unwrap(), 0);
        let mut ragged = Table::default();
        ragged.headers = strings(&["X", "Y"]);
        ragged.rows = vec![strings(&["1"])];
        assert_eq!(sheet.add_table(ragged).unwrap(), 1);
        assert_eq!(sheet.tables[1].rows, vec![strings(&["1", ""])]);
        assert_eq!(sheet.delete_table(0).unwrap(), sample());
        assert!(matches!(
            sheet.delete_table(1),
            Err(Error::TableIndexOutOfRange { index: 1, len: 1, .. })
        ));
    }

    #[test]
    fn test_doc_sheet_has_no_tables() {
        let mut sheet = Sheet::doc("Notes", "text");
        assert!(matches!(
            sheet.add_table(sample()),
            Err(Error::DocumentSheet(_))
        ));
        assert!(sheet.table_mut(0).is_err());
    }

    #[test]
    fn test_add_and_delete_sheets() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("S1");
        workbook.add_sheet("S2");
        workbook.add_sheet("S1");
        assert_eq!(workbook.sheet_count(), 3);

        let removed = workbook.delete_sheet("S1").unwrap();
        assert_eq!(removed.name, "S1");
        assert_eq!(workbook.sheets[0].name, "S2");

        workbook.delete_sheet(1).unwrap();
        assert_eq!(workbook.sheet_count(), 1);

        assert!(matches!(
            workbook.delete_sheet("Missing"),
            Err(Error::SheetNotFound(_))
        ));
        assert!(matches!(
            workbook.delete_sheet(4),
            Err(Error::SheetIndexOutOfRange { index: 4, len: 1 })
        ));
    }

    #[test]
    fn test_rename_and_move_sheet() {
        let mut workbook = Workbook::new();
        for name in ["A", "B", "C"] {
            workbook.add_sheet(name);
        }
        workbook.rename_sheet("B", "Beta").unwrap();
        workbook.move_sheet("C", 0).unwrap();

        let names: Vec<&str> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "Beta"]);
        assert!(workbook.move_sheet(0, 3).is_err());
    }

    #[test]
    fn test_sheet_ref_serde() {
        let refs: Vec<SheetRef> = serde_json::from_str(r#"[0, "Data"]"#).unwrap();
        assert_eq!(refs, vec![SheetRef::Index(0), SheetRef::Name("Data".to_string())]);
    }
}
