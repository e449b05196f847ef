//! In-memory rectangular table of string cells.
//!
//! [`Table`] mirrors what is read from and written to disk: ordered column
//! headers plus rows. Every column of the input survives classification; only
//! the "Genre" column is added or replaced.

use crate::{BookRecord, DatasetError};

/// Header of the column holding the book identifier.
pub const ITEM_ID_COLUMN: &str = "Item ID";

/// Header of the column holding the book title.
pub const TITLE_COLUMN: &str = "Title";

/// Header of the column holding the book author.
pub const AUTHOR_COLUMN: &str = "Author";

/// Header of the column the classifier writes.
pub const GENRE_COLUMN: &str = "Genre";

/// Ordered headers plus rows of string cells.
///
/// Rows are padded with empty cells (or truncated) to the header width on
/// insertion so every row always has exactly `headers().len()` cells. Rows
/// only enter through [`Table::push_row`], which is what lets the accessors
/// index cells directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with the given column headers.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row, normalising it to the header width.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Returns the column headers in order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Returns all rows in order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows (headers excluded).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Returns the cell at (`row`, column named `column`).
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }

    /// Returns every value of the column named `column`, in row order.
    pub fn column(&self, column: &str) -> Option<Vec<&str>> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().map(|r| r[index].as_str()).collect())
    }

    /// Replaces the values of column `name`, appending it as the last column if
    /// it does not exist yet.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` differs from the row count.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        assert_eq!(
            values.len(),
            self.rows.len(),
            "column '{name}' must have one value per row"
        );

        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Checks that the "Item ID", "Title" and "Author" columns are present.
    pub fn require_book_columns(&self) -> Result<(), DatasetError> {
        for column in [ITEM_ID_COLUMN, TITLE_COLUMN, AUTHOR_COLUMN] {
            if self.column_index(column).is_none() {
                return Err(DatasetError::MissingColumn {
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Extracts one [`BookRecord`] per row, in row order.
    pub fn book_records(&self) -> Result<Vec<BookRecord>, DatasetError> {
        self.require_book_columns()?;

        let find = |name: &str| {
            self.column_index(name).ok_or_else(|| DatasetError::MissingColumn {
                column: name.to_string(),
            })
        };
        let id = find(ITEM_ID_COLUMN)?;
        let title = find(TITLE_COLUMN)?;
        let author = find(AUTHOR_COLUMN)?;

        Ok(self
            .rows
            .iter()
            .map(|row| BookRecord::new(row[id].as_str(), row[title].as_str(), row[author].as_str()))
            .collect())
    }
}
