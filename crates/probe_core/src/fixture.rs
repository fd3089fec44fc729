//! Fixture model and wire-format serialization.
//!
//! A fixture is the synthetic input fed to a program under test: either an ordered list of
//! `(name, number)` records or a rectangular bit grid.
//!
//! ## Notes
//! - No validation happens here. Oversized or blank fields are deliberate test inputs, so they are
//!   serialized verbatim.
//! - Fixtures are immutable once built; all fields are private and only exposed through accessors.

use rand::Rng;

/// One `(name, number)` pair of the records protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    name: String,
    number: String,
}

impl Record {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> &str {
        &self.number
    }
}

impl<N: Into<String>, P: Into<String>> From<(N, P)> for Record {
    fn from((name, number): (N, P)) -> Self {
        Record::new(name, number)
    }
}

/// A `rows × cols` grid of bits, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// Build a grid from row-major cells.
    ///
    /// ## Returns
    /// - `None` when `cells.len() != rows * cols`.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<bool>) -> Option<Self> {
        if rows.checked_mul(cols)? != cells.len() {
            return None;
        }
        Some(Self { rows, cols, cells })
    }

    /// Generate a grid where every cell is an independent fair coin flip.
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let cells = (0..rows * cols).map(|_| rng.gen_bool(0.5)).collect();
        Self { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Return the bit at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col).copied()
    }
}

/// Synthetic input dataset for a program under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fixture {
    Records(Vec<Record>),
    Grid(Grid),
}

impl Fixture {
    /// Build a records fixture from anything convertible into [`Record`]s.
    pub fn records<I, R>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Record>,
    {
        Fixture::Records(records.into_iter().map(Into::into).collect())
    }

    /// Return the records of a records fixture (empty for grids).
    pub fn as_records(&self) -> &[Record] {
        match self {
            Fixture::Records(records) => records,
            Fixture::Grid(_) => &[],
        }
    }

    /// Serialize into the text the program under test reads.
    ///
    /// ## Notes
    /// - Records: `name\nnumber\n` per record, in fixture order.
    /// - Grid: header `rows cols`, then one line per row of space-separated `0`/`1` tokens.
    pub fn serialize(&self) -> String {
        match self {
            Fixture::Records(records) => {
                let mut out = String::new();
                for record in records {
                    out.push_str(&record.name);
                    out.push('\n');
                    out.push_str(&record.number);
                    out.push('\n');
                }
                out
            }
            Fixture::Grid(grid) => {
                let mut out = String::with_capacity(grid.rows * grid.cols * 2 + 16);
                out.push_str(&format!("{} {}\n", grid.rows, grid.cols));
                for r in 0..grid.rows {
                    let row = &grid.cells[r * grid.cols..(r + 1) * grid.cols];
                    let line: Vec<&str> = row.iter().map(|&bit| if bit { "1" } else { "0" }).collect();
                    out.push_str(&line.join(" "));
                    out.push('\n');
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_records_serialize_alternating_lines() {
        let fixture = Fixture::records([("Petr Dvorak", "603123456"), ("Jana Novotna", "777987654")]);
        assert_eq!(fixture.serialize(), "Petr Dvorak\n603123456\nJana Novotna\n777987654\n");
    }

    #[test]
    fn test_records_serialize_keeps_blank_and_long_fields() {
        let long = "X".repeat(101);
        let fixture = Fixture::records([("", "1"), (long.as_str(), "")]);
        assert_eq!(fixture.serialize(), format!("\n1\n{long}\n\n"));
    }

    #[test]
    fn test_empty_records_serialize_to_empty_text() {
        assert_eq!(Fixture::Records(Vec::new()).serialize(), "");
    }

    #[test]
    fn test_grid_serialize_header_and_rows() {
        let grid = Grid::from_cells(2, 3, vec![true, false, true, false, false, true]).unwrap();
        assert_eq!(Fixture::Grid(grid).serialize(), "2 3\n1 0 1\n0 0 1\n");
    }

    #[test]
    fn test_grid_from_cells_rejects_wrong_length() {
        assert!(Grid::from_cells(2, 2, vec![true; 3]).is_none());
    }

    #[test]
    fn test_grid_get_bounds() {
        let grid = Grid::from_cells(1, 2, vec![false, true]).unwrap();
        assert_eq!(grid.get(0, 1), Some(true));
        assert_eq!(grid.get(1, 0), None);
        assert_eq!(grid.get(0, 2), None);
    }

    #[test]
    fn test_random_grid_has_requested_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let grid = Grid::random(4, 5, &mut rng);
        let text = Fixture::Grid(grid).serialize();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("4 5"));
        let rows: Vec<&str> = lines.collect();
        assert_eq!(rows.len(), 4);
        for row in rows {
            let tokens: Vec<&str> = row.split(' ').collect();
            assert_eq!(tokens.len(), 5);
            assert!(tokens.iter().all(|t| *t == "0" || *t == "1"));
        }
    }

    #[test]
    fn test_as_records_on_grid_is_empty() {
        let grid = Grid::from_cells(0, 0, Vec::new()).unwrap();
        assert!(Fixture::Grid(grid).as_records().is_empty());
    }
}
