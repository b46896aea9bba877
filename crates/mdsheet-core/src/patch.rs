//! Batch edit documents
//!
//! A patch is a JSON list of structural edits applied to a workbook in
//! order. Application is all-or-nothing: edits run against a copy, and the
//! workbook is replaced only when every edit succeeded.
//!
//! ```json
//! {
//!   "edits": [
//!     {"op": "update_cell", "sheet": "Data", "row": 0, "column": "Age", "value": "31"},
//!     {"op": "add_sheet", "name": "Archive"}
//!   ]
//! }
//! ```

use crate::edit::SheetRef;
use crate::error::{Error, Result};
use crate::table::{Table, Workbook};
use serde::{Deserialize, Serialize};

/// Addresses a column by position or by header (first match)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl ColumnRef {
    fn resolve(&self, table: &Table) -> Result<usize> {
        match self {
            ColumnRef::Index(index) => Ok(*index),
            ColumnRef::Name(name) => table
                .find_column(name)
                .ok_or_else(|| Error::ColumnNotFound(name.clone())),
        }
    }
}

impl From<usize> for ColumnRef {
    fn from(index: usize) -> Self {
        ColumnRef::Index(index)
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

/// A single edit. Table edits address a sheet and a table index within it (default 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    UpdateCell {
        sheet: SheetRef,
        #[serde(default)]
        table: usize,
        row: usize,
        column: ColumnRef,
        value: String,
    },
    InsertRow {
        sheet: SheetRef,
        #[serde(default)]
        table: usize,
        index: usize,
    },
    DeleteRow {
        sheet: SheetRef,
        #[serde(default)]
        table: usize,
        index: usize,
    },
    MoveRow {
        sheet: SheetRef,
        #[serde(default)]
        table: usize,
        from: usize,
        to: usize,
    },
    InsertColumn {
        sheet: SheetRef,
        #[serde(default)]
        table: usize,
        index: usize,
        /// Header for the new column; empty when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        header: Option<String>,
    },
    DeleteColumn {
        sheet: SheetRef,
        #[serde(default)]
        table: usize,
        column: ColumnRef,
    },
    ClearColumn {
        sheet: SheetRef,
        #[serde(default)]
        table: usize,
        column: ColumnRef,
    },
    SetHeader {
        sheet: SheetRef,
        #[serde(default)]
        table: usize,
        column: ColumnRef,
        name: String,
    },
    AddTable {
        sheet: SheetRef,
        table: Table,
    },
    DeleteTable {
        sheet: SheetRef,
        table: usize,
    },
    AddSheet {
        name: String,
    },
    DeleteSheet {
        sheet: SheetRef,
    },
    RenameSheet {
        sheet: SheetRef,
        name: String,
    },
    MoveSheet {
        sheet: SheetRef,
        to: usize,
    },
}

impl Edit {
    /// Set one cell of the first table in a sheet
    pub fn update_cell(
        sheet: impl Into<SheetRef>,
        row: usize,
        column: impl Into<ColumnRef>,
        value: impl Into<String>,
    ) -> Self {
        Edit::UpdateCell {
            sheet: sheet.into(),
            table: 0,
            row,
            column: column.into(),
            value: value.into(),
        }
    }

    /// Apply to a workbook, returning the name of the sheet it touched
    fn apply(&self, workbook: &mut Workbook) -> Result<String> {
        match self {
            Edit::UpdateCell {
                sheet,
                table,
                row,
                column,
                value,
            } => with_table(workbook, sheet, *table, |t| {
                let col = column.resolve(t)?;
                t.update_cell(*row, col, value.as_str())
            }),
            Edit::InsertRow {
                sheet,
                table,
                index,
            } => with_table(workbook, sheet, *table, |t| {
                t.insert_row(*index);
                Ok(())
            }),
            Edit::DeleteRow {
                sheet,
                table,
                index,
            } => with_table(workbook, sheet, *table, |t| t.delete_row(*index).map(drop)),
            Edit::MoveRow {
                sheet,
                table,
                from,
                to,
            } => with_table(workbook, sheet, *table, |t| t.move_row(*from, *to)),
            Edit::InsertColumn {
                sheet,
                table,
                index,
                header,
            } => with_table(workbook, sheet, *table, |t| {
                let col = t.insert_column(*index);
                match header {
                    Some(name) => t.set_header(col, name.as_str()),
                    None => Ok(()),
                }
            }),
            Edit::DeleteColumn {
                sheet,
                table,
                column,
            } => with_table(workbook, sheet, *table, |t| {
                let col = column.resolve(t)?;
                t.delete_column(col)
            }),
            Edit::ClearColumn {
                sheet,
                table,
                column,
            } => with_table(workbook, sheet, *table, |t| {
                let col = column.resolve(t)?;
                t.clear_column_data(col)
            }),
            Edit::SetHeader {
                sheet,
                table,
                column,
                name,
            } => with_table(workbook, sheet, *table, |t| {
                let col = column.resolve(t)?;
                t.set_header(col, name.as_str())
            }),
            Edit::AddTable { sheet, table } => {
                let sheet = workbook.sheet_mut(sheet)?;
                sheet.add_table(table.clone())?;
                Ok(sheet.name.clone())
            }
            Edit::DeleteTable { sheet, table } => {
                let sheet = workbook.sheet_mut(sheet)?;
                sheet.delete_table(*table)?;
                Ok(sheet.name.clone())
            }
            Edit::AddSheet { name } => Ok(workbook.add_sheet(name.as_str()).name.clone()),
            Edit::DeleteSheet { sheet } => Ok(workbook.delete_sheet(sheet.clone())?.name),
            Edit::RenameSheet { sheet, name } => {
                workbook.rename_sheet(sheet.clone(), name.as_str())?;
                Ok(name.clone())
            }
            Edit::MoveSheet { sheet, to } => {
                let index = workbook.sheet_index(sheet)?;
                workbook.move_sheet(index, *to)?;
                Ok(workbook.sheets[*to].name.clone())
            }
        }
    }
}

fn with_table<F>(workbook: &mut Workbook, sheet: &SheetRef, table: usize, edit: F) -> Result<String>
where
    F: FnOnce(&mut Table) -> Result<()>,
{
    let sheet = workbook.sheet_mut(sheet)?;
    edit(sheet.table_mut(table)?)?;
    Ok(sheet.name.clone())
}

/// A patch document: edits applied in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchFile {
    /// Free-form note about what the patch does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub edits: Vec<Edit>,
}

impl PatchFile {
    /// Create a new empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edit to the patch
    pub fn add_edit(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Parse a patch document
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(Error::Json)
    }

    /// Render the patch as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Outcome of a successful patch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchResult {
    /// Number of edits applied
    pub edits_applied: usize,
    /// Names of the sheets touched, in first-touched order
    pub modified_sheets: Vec<String>,
}

/// Apply every edit in order, or none of them.
///
/// On failure the workbook is unchanged and the error carries the index of
/// the failing edit.
pub fn apply_patch(workbook: &mut Workbook, patch: &PatchFile) -> Result<PatchResult> {
    let mut working = workbook.clone();
    let mut result = PatchResult::default();

    for (index, edit) in patch.edits.iter().enumerate() {
        let sheet = edit.apply(&mut working).map_err(|e| Error::Patch {
            index,
            source: Box::new(e),
        })?;

        if !result.modified_sheets.contains(&sheet) {
            result.modified_sheets.push(sheet);
        }
        result.edits_applied += 1;
    }

    tracing::debug!(
        edits = result.edits_applied,
        sheets = result.modified_sheets.len(),
        "patch applied"
    );
    *workbook = working;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Sheet;
    use pretty_assertions::assert_eq;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn workbook() -> Workbook {
        let people = Table::new(
            strings(&["Name", "Age"]),
            vec![strings(&["Alice", "30"]), strings(&["Bob", "25"])],
        );
        Workbook {
            name: Some("Tables".to_string()),
            sheets: vec![Sheet::with_tables("Data", vec![people])],
            ..Workbook::default()
        }
    }

    #[test]
    fn test_edit_creation() {
        let edit = Edit::update_cell("Data", 1, "Age", "26");
        assert_eq!(
            edit,
            Edit::UpdateCell {
                sheet: SheetRef::Name("Data".to_string()),
                table: 0,
                row: 1,
                column: ColumnRef::Name("Age".to_string()),
                value: "26".to_string(),
            }
        );
    }

    #[test]
    fn test_patch_file_serialization() {
        let mut patch = PatchFile::new();
        patch.add_edit(Edit::update_cell("Data", 0, 1, "31"));
        patch.add_edit(Edit::AddSheet {
            name: "Archive".to_string(),
        });

        let json = patch.to_json().unwrap();
        assert!(json.contains(r#""op": "update_cell""#));

        let loaded = PatchFile::from_json(&json).unwrap();
        assert_eq!(loaded, patch);
    }

    #[test]
    fn test_table_defaults_to_first() {
        let patch = PatchFile::from_json(
            r#"{"edits": [{"op": "delete_row", "sheet": 0, "index": 0}]}"#,
        )
        .unwrap();
        assert_eq!(
            patch.edits[0],
            Edit::DeleteRow {
                sheet: SheetRef::Index(0),
                table: 0,
                index: 0,
            }
        );
    }

    #[test]
    fn test_apply_patch() {
        let mut workbook = workbook();
        let patch = PatchFile::from_json(
            r#"{
                "edits": [
                    {"op": "update_cell", "sheet": "Data", "row": 0, "column": "Age", "value": "31"},
                    {"op": "insert_column", "sheet": "Data", "index": 2, "header": "City"},
                    {"op": "update_cell", "sheet": "Data", "row": 1, "column": 2, "value": "Paris"},
                    {"op": "add_sheet", "name": "Archive"},
                    {"op": "rename_sheet", "sheet": "Data", "name": "People"}
                ]
            }"#,
        )
        .unwrap();

        let result = apply_patch(&mut workbook, &patch).unwrap();
        assert_eq!(result.edits_applied, 5);
        assert_eq!(
            result.modified_sheets,
            strings(&["Data", "Archive", "People"])
        );

        let table = &workbook.get_sheet("People").unwrap().tables[0];
        assert_eq!(table.headers, strings(&["Name", "Age", "City"]));
        assert_eq!(table.rows[0], strings(&["Alice", "31", ""]));
        assert_eq!(table.rows[1], strings(&["Bob", "25", "Paris"]));
        assert_eq!(workbook.sheet_count(), 2);
    }

    #[test]
    fn test_failed_patch_leaves_workbook_untouched() {
        let mut workbook = workbook();
        let mut patch = PatchFile::new();
        patch.add_edit(Edit::update_cell("Data", 0, "Age", "99"));
        patch.add_edit(Edit::DeleteSheet {
            sheet: SheetRef::Name("Missing".to_string()),
        });

        let err = apply_patch(&mut workbook, &patch).unwrap_err();
        match err {
            Error::Patch { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, Error::SheetNotFound(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(workbook, self::workbook());
    }

    #[test]
    fn test_unknown_column_name() {
        let mut workbook = workbook();
        let mut patch = PatchFile::new();
        patch.add_edit(Edit::ClearColumn {
            sheet: SheetRef::Index(0),
            table: 0,
            column: ColumnRef::Name("Email".to_string()),
        });

        let err = apply_patch(&mut workbook, &patch).unwrap_err();
        assert_eq!(err.to_string(), "edit #0 failed: column 'Email' not found");
    }

    #[test]
    fn test_table_edits() {
        let mut workbook = workbook();
        let patch = PatchFile::from_json(
            r#"{"edits": [
                {"op": "add_table", "sheet": "Data", "table": {"headers": ["X"], "rows": [["1"]]}},
                {"op": "delete_table", "sheet": "Data", "table": 0},
                {"op": "set_header", "sheet": "Data", "column": 0, "name": "Y"}
            ]}"#,
        )
        .unwrap();

        apply_patch(&mut workbook, &patch).unwrap();
        let tables = &workbook.sheets[0].tables;
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, strings(&["Y"]));
        assert_eq!(tables[0].rows, vec![strings(&["1"])]);
    }
}
