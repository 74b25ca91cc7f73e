//! Results file: one row per estimate, tab separated.
//!
//! ```text
//! \tvalue\tmethod\taffected
//! 0\t10.02\tbackdoor.linear_regression\toutcome
//! ```
//!
//! The leading unnamed column is a row index that restarts at 0 whenever the
//! `affected` label changes, so each scenario block is numbered on its own.
//! Files without the index column are read as well.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use dv_core::{Error, Result};
use dv_inference::ResultRow;

fn csv_err(e: csv::Error) -> Error {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        other => Error::Parse(format!("{other:?}")),
    }
}

/// Write rows with the per-scenario index column.
pub fn write_results<W: Write>(writer: W, rows: &[ResultRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    wtr.write_record(["", "value", "method", "affected"]).map_err(csv_err)?;
    let mut index = 0usize;
    let mut prev: Option<&str> = None;
    for row in rows {
        if prev.is_some_and(|p| p != row.affected) {
            index = 0;
        }
        wtr.write_record([
            index.to_string(),
            row.value.to_string(),
            row.method.clone(),
            row.affected.clone(),
        ])
        .map_err(csv_err)?;
        index += 1;
        prev = Some(row.affected.as_str());
    }
    wtr.flush()?;
    Ok(())
}

/// Write rows to `path`.
pub fn write_results_path(path: &Path, rows: &[ResultRow]) -> Result<()> {
    let file = File::create(path)?;
    write_results(BufWriter::new(file), rows)
}

/// Read rows; columns are located by header name, the index column is optional.
pub fn read_results<R: Read>(reader: R) -> Result<Vec<ResultRow>> {
    let mut rdr = csv::ReaderBuilder::new().delimiter(b'\t').has_headers(true).from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| Error::Parse(format!("results file has no '{name}' column")))
    };
    let (i_value, i_method, i_affected) = (find("value")?, find("method")?, find("affected")?);

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let field = |i: usize| {
            record.get(i).ok_or_else(|| {
                Error::Parse(format!("row {}: expected {} fields, got {}", line + 1, headers.len(), record.len()))
            })
        };
        let raw = field(i_value)?;
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| Error::Parse(format!("row {}: invalid value '{raw}'", line + 1)))?;
        rows.push(ResultRow {
            value,
            method: field(i_method)?.to_string(),
            affected: field(i_affected)?.to_string(),
        });
    }
    Ok(rows)
}

/// Read rows from `path`.
pub fn read_results_path(path: &Path) -> Result<Vec<ResultRow>> {
    read_results(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: f64, method: &str, affected: &str) -> ResultRow {
        ResultRow { value, method: method.into(), affected: affected.into() }
    }

    #[test]
    fn test_write_layout() {
        let rows = vec![
            row(10.5, "backdoor.linear_regression", "outcome"),
            row(9.25, "backdoor.linear_regression", "outcome"),
            row(-1.0, "backdoor.linear_regression", "outcome_and_treatment"),
        ];
        let mut buf = Vec::new();
        write_results(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "\tvalue\tmethod\taffected\n\
             0\t10.5\tbackdoor.linear_regression\toutcome\n\
             1\t9.25\tbackdoor.linear_regression\toutcome\n\
             0\t-1\tbackdoor.linear_regression\toutcome_and_treatment\n"
        );
    }

    #[test]
    fn test_read_back() {
        let rows = vec![
            row(10.5, "iv.instrumental_variable", "outcome"),
            row(3.0e-7, "iv.instrumental_variable", "treatment_and_instrument"),
        ];
        let mut buf = Vec::new();
        write_results(&mut buf, &rows).unwrap();
        assert_eq!(read_results(buf.as_slice()).unwrap(), rows);
    }

    #[test]
    fn test_read_without_index() {
        let text = "value\tmethod\taffected\n10.0\tbackdoor.propensity_score_matching\toutcome\n";
        let rows = read_results(text.as_bytes()).unwrap();
        assert_eq!(rows, vec![row(10.0, "backdoor.propensity_score_matching", "outcome")]);
    }

    #[test]
    fn test_read_errors() {
        assert!(matches!(read_results("value\tmethod\n1\tx\n".as_bytes()), Err(Error::Parse(_))));
        let bad = "\tvalue\tmethod\taffected\n0\tabc\tm\toutcome\n";
        assert!(matches!(read_results(bad.as_bytes()), Err(Error::Parse(_))));
    }
}
