use serde::{Deserialize, Serialize};

use crate::dynamics::Time;
use crate::Value;

/// Observations of a view as a table: one row per observation time, one
/// column per observable.  The first column is the time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matrix {
    columns: Vec<String>,
    rows: Vec<Vec<Option<Value>>>,
}

impl Default for Matrix {
    fn default() -> Self {
        Self {
            columns: vec![String::from("time")],
            rows: Vec::new(),
        }
    }
}

impl Matrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<Value>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Index of the column, created if missing.  Existing rows get no
    /// value in a new column.
    pub fn add_column(&mut self, name: &str) -> usize {
        match self.column(name) {
            Some(index) => index,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(None);
                }
                self.columns.len() - 1
            }
        }
    }

    /// Index of the row of `time`, appended if `time` is not the time of
    /// the last row.
    pub fn row_at(&mut self, time: Time) -> usize {
        let last = self
            .rows
            .last()
            .and_then(|row| row.first().cloned().flatten())
            .and_then(|value| value.as_f64());
        if last != Some(time) {
            let mut row = vec![None; self.columns.len()];
            row[0] = serde_json::Number::from_f64(time).map(Value::Number);
            self.rows.push(row);
        }
        self.rows.len() - 1
    }

    pub fn set(&mut self, row: usize, column: usize, value: Option<Value>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|row| row.get_mut(column)) {
            *cell = value;
        }
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let column = self.column(column)?;
        self.rows.get(row)?.get(column)?.as_ref()
    }

    /// Every cell of a column, from the first row.
    pub fn column_values(&self, name: &str) -> Vec<Option<&Value>> {
        match self.column(name) {
            Some(column) => self
                .rows
                .iter()
                .map(|row| row.get(column).and_then(Option::as_ref))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn times(&self) -> Vec<Time> {
        self.rows
            .iter()
            .filter_map(|row| row.first().cloned().flatten())
            .filter_map(|value| value.as_f64())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_are_grouped_by_time() {
        let mut matrix = Matrix::new();
        let a = matrix.add_column("top:a.out");
        let row = matrix.row_at(0.0);
        matrix.set(row, a, Some(json!(1)));
        assert_eq!(row, matrix.row_at(0.0));
        let row = matrix.row_at(1.0);
        let b = matrix.add_column("top:b.out");
        matrix.set(row, b, Some(json!("x")));
        assert_eq!(vec![0.0, 1.0], matrix.times());
        assert_eq!(vec![Some(&json!(1)), None], matrix.column_values("top:a.out"));
        assert_eq!(Some(&json!("x")), matrix.get(1, "top:b.out"));
        assert_eq!(None, matrix.get(0, "top:b.out"));
    }
}
