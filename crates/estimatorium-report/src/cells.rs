//! A1-style cell references.
//!
//! Rows and columns are zero-based, as in `rust_xlsxwriter`.

use std::fmt;

use rust_xlsxwriter::utility::column_number_to_name;
use rust_xlsxwriter::{ColNum, RowNum};

/// Column letters: 0 -> `A`, 25 -> `Z`, 26 -> `AA`.
pub fn column_name(col: ColNum) -> String {
    column_number_to_name(col)
}

/// A single cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: RowNum,
    pub col: ColNum,
}

impl Cell {
    pub fn new(row: RowNum, col: ColNum) -> Self {
        Self { row, col }
    }

    /// `$B$7` form, stable when a formula is copied.
    pub fn absolute(&self) -> String {
        format!("${}${}", column_name(self.col), self.row + 1)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row + 1)
    }
}

/// A rectangular range between two cells, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first: Cell,
    pub last: Cell,
}

impl CellRange {
    pub fn new(first: Cell, last: Cell) -> Self {
        Self { first, last }
    }

    /// Rows `first_row..=last_row` of one column.
    pub fn column(col: ColNum, first_row: RowNum, last_row: RowNum) -> Self {
        Self::new(Cell::new(first_row, col), Cell::new(last_row, col))
    }

    pub fn sum(&self) -> String {
        format!("SUM({self})")
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(51), "AZ");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_cell_names() {
        let cell = Cell::new(6, 1);
        assert_eq!(cell.to_string(), "B7");
        assert_eq!(cell.absolute(), "$B$7");
    }

    #[test]
    fn test_single_row_range_is_complete() {
        let range = CellRange::column(3, 1, 1);
        assert_eq!(range.to_string(), "D2:D2");
        assert_eq!(range.sum(), "SUM(D2:D2)");
    }
}
