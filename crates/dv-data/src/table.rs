use std::io::Write;

use dv_core::{ColumnId, Error, Result};

/// Storage for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Real-valued column.
    Float(Vec<f64>),
    /// Binarized column (stochastically converted treatment or outcome).
    Bool(Vec<bool>),
}

impl ColumnData {
    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
        }
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the column holds boolean-domain values.
    pub fn is_bool(&self) -> bool {
        matches!(self, ColumnData::Bool(_))
    }

    /// Values as `f64` (`true` → 1.0, `false` → 0.0).
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            ColumnData::Float(v) => v.clone(),
            ColumnData::Bool(v) => v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect(),
        }
    }

    fn cell(&self, row: usize) -> String {
        match self {
            ColumnData::Float(v) => format!("{}", v[row]),
            ColumnData::Bool(v) => if v[row] { "True" } else { "False" }.to_string(),
        }
    }
}

/// Columnar table with a fixed column order.
#[derive(Debug, Clone, Default)]
pub struct Table {
    n_rows: usize,
    columns: Vec<(ColumnId, ColumnData)>,
}

impl Table {
    /// Empty table expecting `n_rows` rows per column.
    pub fn new(n_rows: usize) -> Self {
        Self { n_rows, columns: Vec::new() }
    }

    /// Append a column. Lengths must match and ids must be unique.
    pub fn push_column(&mut self, id: ColumnId, data: ColumnData) -> Result<()> {
        if data.len() != self.n_rows {
            return Err(Error::Validation(format!(
                "column {} has {} rows, table expects {}",
                id,
                data.len(),
                self.n_rows
            )));
        }
        if self.columns.iter().any(|(c, _)| *c == id) {
            return Err(Error::Validation(format!("duplicate column {id}")));
        }
        self.columns.push((id, data));
        Ok(())
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column ids in table order.
    pub fn column_ids(&self) -> Vec<ColumnId> {
        self.columns.iter().map(|(id, _)| *id).collect()
    }

    /// Display names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(id, _)| id.name()).collect()
    }

    /// Whether the table contains `id`.
    pub fn contains(&self, id: ColumnId) -> bool {
        self.columns.iter().any(|(c, _)| *c == id)
    }

    /// Borrow a column.
    pub fn column(&self, id: ColumnId) -> Option<&ColumnData> {
        self.columns.iter().find(|(c, _)| *c == id).map(|(_, d)| d)
    }

    /// Column values as `f64`, or a validation error if absent.
    pub fn column_f64(&self, id: ColumnId) -> Result<Vec<f64>> {
        self.column(id)
            .map(ColumnData::to_f64)
            .ok_or_else(|| Error::Validation(format!("column {id} not in table")))
    }

    /// Write the table as delimited text with a header row.
    pub fn write_delimited<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().delimiter(delimiter).from_writer(writer);
        wtr.write_record(self.column_names()).map_err(csv_err)?;
        let mut record = Vec::with_capacity(self.columns.len());
        for row in 0..self.n_rows {
            record.clear();
            record.extend(self.columns.iter().map(|(_, d)| d.cell(row)));
            wtr.write_record(&record).map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn csv_err(e: csv::Error) -> Error {
    Error::Io(std::io::Error::other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_core::VariableRole;

    #[test]
    fn test_push_and_lookup() {
        let mut t = Table::new(2);
        let w0 = ColumnId::new(VariableRole::CommonCause, 0);
        t.push_column(w0, ColumnData::Float(vec![1.0, 2.0])).unwrap();
        t.push_column(ColumnId::outcome(), ColumnData::Bool(vec![true, false])).unwrap();
        assert_eq!(t.n_cols(), 2);
        assert_eq!(t.column_names(), vec!["W0", "y"]);
        assert_eq!(t.column_f64(ColumnId::outcome()).unwrap(), vec![1.0, 0.0]);
        assert!(t.column_f64(ColumnId::new(VariableRole::Instrument, 0)).is_err());
    }

    #[test]
    fn test_rejects_bad_columns() {
        let mut t = Table::new(2);
        assert!(t.push_column(ColumnId::outcome(), ColumnData::Float(vec![1.0])).is_err());
        t.push_column(ColumnId::outcome(), ColumnData::Float(vec![1.0, 2.0])).unwrap();
        assert!(t.push_column(ColumnId::outcome(), ColumnData::Float(vec![1.0, 2.0])).is_err());
    }

    #[test]
    fn test_write_tsv() {
        let mut t = Table::new(2);
        t.push_column(ColumnId::new(VariableRole::Treatment, 0), ColumnData::Bool(vec![true, false]))
            .unwrap();
        t.push_column(ColumnId::outcome(), ColumnData::Float(vec![1.5, -2.0])).unwrap();
        let mut buf = Vec::new();
        t.write_delimited(&mut buf, b'\t').unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "v0\ty\nTrue\t1.5\nFalse\t-2\n");
    }
}
