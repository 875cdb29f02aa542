use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrajectoryWriteError {
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row} has {found} columns but the header declares {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Writes `header` followed by one CSV record per row.
///
/// Every row must have exactly as many values as the header has columns.
pub fn write_rows<'a, W, I>(
    writer: W,
    header: &[&str],
    rows: I,
) -> Result<(), TrajectoryWriteError>
where
    W: Write,
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header)?;
    for (index, row) in rows.into_iter().enumerate() {
        if row.len() != header.len() {
            return Err(TrajectoryWriteError::RowWidth {
                row: index,
                expected: header.len(),
                found: row.len(),
            });
        }
        csv_writer.write_record(row.iter().map(|value| value.to_string()))?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Creates (or truncates) the file at `path` and writes the rows into it.
pub fn write_rows_to_path<'a, P, I>(
    path: P,
    header: &[&str],
    rows: I,
) -> Result<(), TrajectoryWriteError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a [f64]>,
{
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| TrajectoryWriteError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    write_rows(BufWriter::new(file), header, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_rows_emits_header_then_records() {
        let rows: Vec<Vec<f64>> = vec![vec![1.0, 2.5, -3.0], vec![0.0, 1e-9, 4.0]];
        let mut buffer = Vec::new();
        write_rows(&mut buffer, &["x", "y", "z"], rows.iter().map(Vec::as_slice)).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["x,y,z", "1,2.5,-3", "0,0.000000001,4"]);
    }

    #[test]
    fn write_rows_rejects_row_of_wrong_width() {
        let rows: Vec<Vec<f64>> = vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0]];
        let mut buffer = Vec::new();
        let err = write_rows(&mut buffer, &["x", "y", "z"], rows.iter().map(Vec::as_slice))
            .unwrap_err();
        assert!(matches!(
            err,
            TrajectoryWriteError::RowWidth {
                row: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn write_rows_to_path_creates_readable_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trajectory.csv");
        let rows: Vec<Vec<f64>> = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        write_rows_to_path(&path, &["x", "trap_kx"], rows.iter().map(Vec::as_slice)).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(header, vec!["x", "trap_kx"]);
        let values: Vec<f64> = reader
            .records()
            .flat_map(|record| {
                record
                    .unwrap()
                    .iter()
                    .map(|field| field.parse::<f64>().unwrap())
                    .collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn write_rows_to_path_reports_unwritable_location() {
        let err = write_rows_to_path(
            "/nonexistent-dir/out.csv",
            &["x"],
            std::iter::empty::<&[f64]>(),
        )
        .unwrap_err();
        assert!(matches!(err, TrajectoryWriteError::Io { .. }));
    }
}
