//! The uniform tabular result every parser converges to
//!
//! Parsers push rows of `(path, cell)` pairs into a [`FrameBuilder`]. Column
//! keys are paths so hierarchical sources (nested JSON objects, nested XML
//! elements) keep their structure until [`FrameBuilder::finish`] collapses
//! each path to a single underscore-joined name. A finished
//! [`TabularFrame`] never exposes a hierarchical key, and every column has
//! exactly `row_count` cells.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::constants::preview;

/// One cell of a preview table
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Arrays and objects the source kept nested
    Nested(Value),
}

impl Cell {
    /// Scalar JSON values map to their cell; arrays and objects stay nested
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map(Cell::Int)
                .unwrap_or_else(|| Cell::Float(n.as_f64().unwrap_or(f64::NAN))),
            Value::String(s) => Cell::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Cell::Nested(value.clone()),
        }
    }

    /// Text cell, or empty for blank input
    pub fn text(raw: &str) -> Self {
        if raw.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => f.write_str(s),
            Cell::Nested(v) => write!(f, "{}", v),
        }
    }
}

/// Hierarchical column key; single-component for flat sources
pub type ColumnPath = Vec<String>;

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

/// Ordered named columns of equal length
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabularFrame {
    columns: Vec<Column>,
    row_count: usize,
}

impl TabularFrame {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when there is nothing to preview
    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.columns.is_empty()
    }

    /// Cells of row `index` in column order
    pub fn row(&self, index: usize) -> Option<Vec<&Cell>> {
        (index < self.row_count).then(|| self.columns.iter().map(|c| &c.cells[index]).collect())
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Vec<Vec<&Cell>> {
        (0..self.row_count.min(n))
            .filter_map(|index| self.row(index))
            .collect()
    }

    /// Replaces every cell of `name` with its display string
    fn stringify_column(&mut self, name: &str) {
        for column in self.columns.iter_mut().filter(|c| c.name == name) {
            for cell in column.cells.iter_mut() {
                *cell = Cell::Text(cell.to_string());
            }
        }
    }
}

/// Row-oriented builder keyed by column path
#[derive(Debug, Default)]
pub struct FrameBuilder {
    paths: Vec<ColumnPath>,
    positions: HashMap<ColumnPath, usize>,
    cells: Vec<Vec<Cell>>,
    row_count: usize,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a column up front so it keeps its position even if no row
    /// ever fills it
    pub fn declare(&mut self, path: ColumnPath) -> usize {
        if let Some(&position) = self.positions.get(&path) {
            return position;
        }
        let position = self.paths.len();
        self.positions.insert(path.clone(), position);
        self.paths.push(path);
        self.cells.push(vec![Cell::Empty; self.row_count]);
        position
    }

    /// Appends a row; columns it doesn't mention get an empty cell, and a
    /// repeated path keeps its first value
    pub fn push_row<I>(&mut self, row: I)
    where
        I: IntoIterator<Item = (ColumnPath, Cell)>,
    {
        for column in self.cells.iter_mut() {
            column.push(Cell::Empty);
        }
        self.row_count += 1;

        let mut filled = vec![false; self.paths.len()];
        for (path, cell) in row {
            let position = self.declare(path);
            if position >= filled.len() {
                filled.resize(position + 1, false);
            }
            if !filled[position] {
                filled[position] = true;
                self.cells[position][self.row_count - 1] = cell;
            }
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Collapses paths to names and applies display post-processing
    pub fn finish(self) -> TabularFrame {
        let mut taken: HashMap<String, usize> = HashMap::new();
        let columns = self
            .paths
            .into_iter()
            .zip(self.cells)
            .map(|(path, cells)| Column {
                name: unique_name(flatten_path(&path), &mut taken),
                cells,
            })
            .collect();

        let mut frame = TabularFrame {
            columns,
            row_count: self.row_count,
        };
        frame.stringify_column(preview::SELECTED_LANGUAGES_COLUMN);
        frame
    }
}

/// Joins path components with the path separator
pub fn flatten_path(path: &[String]) -> String {
    path.join(preview::PATH_SEPARATOR)
}

/// Names for a header row: blanks become `Unnamed: N` (N is the position)
/// and repeats get `.1`, `.2`, ... suffixes so every column keeps its data
pub fn header_names<I, T>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut taken: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(position, name)| {
            let name = name.as_ref().trim();
            let name = if name.is_empty() {
                unnamed(position)
            } else {
                name.to_string()
            };
            unique_name(name, &mut taken)
        })
        .collect()
}

/// Placeholder for a column without a header
pub fn unnamed(position: usize) -> String {
    format!("Unnamed: {}", position)
}

/// Disambiguates repeated names as `name`, `name.1`, `name.2`, ...
fn unique_name(name: String, taken: &mut HashMap<String, usize>) -> String {
    let Some(&last_suffix) = taken.get(&name) else {
        taken.insert(name.clone(), 0);
        return name;
    };

    let mut suffix = last_suffix;
    let candidate = loop {
        suffix += 1;
        let candidate = format!("{}.{}", name, suffix);
        if !taken.contains_key(&candidate) {
            break candidate;
        }
    };
    taken.insert(name, suffix);
    taken.insert(candidate.clone(), 0);
    candidate
}
