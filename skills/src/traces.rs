use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;

/// Column names of the point-mass observation layout.
pub const TRACE_HEADER: [&str; 6] = ["X", "-X", "Y", "-Y", "X_speed", "Y_speed"];

pub const TRACE_DELIMITER: &str = " ";

/// Writes one row per observation, space delimited, below a header row.
pub fn write_trace(path: &Path, observations: &[Vec<f64>]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", TRACE_HEADER.iter().join(TRACE_DELIMITER))?;
    for observation in observations {
        writeln!(writer, "{}", observation.iter().join(TRACE_DELIMITER))?;
    }

    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_write_trace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("path00.csv");

        write_trace(
            &path,
            &[
                vec![0.5, 0.0, 0.0, 0.25, 1.0, -1.5],
                vec![0.75, 0.0, 0.0, 0.5, 1.0, -1.5],
            ],
        )
        .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines = contents.lines().collect::<Vec<_>>();

        assert_eq!(
            lines,
            vec![
                "X -X Y -Y X_speed Y_speed",
                "0.5 0 0 0.25 1 -1.5",
                "0.75 0 0 0.5 1 -1.5"
            ]
        );
    }

    #[test]
    fn test_empty_trace_has_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("path00.csv");

        write_trace(&path, &[]).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "X -X Y -Y X_speed Y_speed\n"
        );
    }
}
