//! Sample-file loading: one numeric literal per line, malformed lines
//! skipped with a warning (spec.md §6/§7). Not part of the core — the
//! samples could equally arrive over a channel from another process.

use crate::error::ConfigError;
use std::fmt::Debug;
use std::path::Path;
use std::str::FromStr;

pub fn load_samples<T>(path: &Path) -> Result<Vec<T>, ConfigError>
where
    T: FromStr,
    T::Err: Debug,
{
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::MissingSampleFile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut samples = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<T>() {
            Ok(v) => samples.push(v),
            Err(e) => tracing::warn!(
                file = %path.display(),
                line = lineno + 1,
                error = ?e,
                "skipping malformed sample line"
            ),
        }
    }

    if samples.is_empty() {
        return Err(ConfigError::EmptyDistribution {
            path: path.to_path_buf(),
        });
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_floats_and_skips_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1.5").unwrap();
        writeln!(file, "not-a-number").unwrap();
        writeln!(file, "2.5").unwrap();
        let samples: Vec<f64> = load_samples(file.path()).unwrap();
        assert_eq!(samples, vec![1.5, 2.5]);
    }

    #[test]
    fn empty_file_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result: Result<Vec<i64>, _> = load_samples(file.path());
        assert!(matches!(result, Err(ConfigError::EmptyDistribution { .. })));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result: Result<Vec<i64>, _> = load_samples(Path::new("/no/such/file.txt"));
        assert!(matches!(result, Err(ConfigError::MissingSampleFile { .. })));
    }
}
