//! CSV loading into typed rows, plus the small group-by helpers the
//! analyzers share.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Reads a headered CSV file and deserializes every record into `T`.
///
/// Columns are matched by header name; columns `T` does not declare are
/// ignored. Whitespace around every field is trimmed.
pub fn load_rows<T: DeserializeOwned>(path: impl AsRef<Path>, delimiter: u8) -> Result<Vec<T>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rows = read_rows(file, delimiter).with_context(|| format!("reading {}", path.display()))?;

    debug!(path = %path.display(), rows = rows.len(), "Loaded table");
    Ok(rows)
}

/// Same as [`load_rows`] but over any reader.
pub fn read_rows<T: DeserializeOwned, R: std::io::Read>(reader: R, delimiter: u8) -> Result<Vec<T>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result?;
        rows.push(record);
    }
    Ok(rows)
}

/// Number of occurrences of each distinct value.
///
/// Ordered by count descending; ties keep first-appearance order.
pub fn value_counts<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for value in values {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }

    // stable sort keeps first appearance on ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .map(|(k, n)| (k.to_string(), n))
        .collect()
}

/// Key with the highest count, the first one on ties.
pub fn idxmax(counts: &[(String, usize)]) -> Option<&str> {
    let mut best: Option<&(String, usize)> = None;
    for entry in counts {
        if best.is_none_or(|b| entry.1 > b.1) {
            best = Some(entry);
        }
    }
    best.map(|(k, _)| k.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Row {
        name: String,
        #[serde(rename = "hours-per-week")]
        hours: u32,
    }

    #[test]
    fn test_read_rows_by_header_ignores_extra_columns() {
        let data = "name, extra ,hours-per-week\n alice ,x, 40\nbob,y,20\n";
        let rows: Vec<Row> = read_rows(data.as_bytes(), b',').unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "alice");
        assert_eq!(rows[0].hours, 40);
        assert_eq!(rows[1].hours, 20);
    }

    #[test]
    fn test_read_rows_custom_delimiter() {
        let data = "name;hours-per-week\ncarol;13\n";
        let rows: Vec<Row> = read_rows(data.as_bytes(), b';').unwrap();
        assert_eq!(rows[0].name, "carol");
    }

    #[test]
    fn test_read_rows_missing_column_fails() {
        let data = "name\nalice\n";
        let result: Result<Vec<Row>> = read_rows(data.as_bytes(), b',');
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rows_missing_file() {
        let result: Result<Vec<Row>> = load_rows("/definitely/not/here.csv", b',');
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("not/here.csv"));
    }

    #[test]
    fn test_value_counts_order() {
        let counts = value_counts(["b", "a", "a", "c", "b", "d", "a"]);
        assert_eq!(
            counts,
            vec![
                ("a".to_string(), 3),
                ("b".to_string(), 2),
                ("c".to_string(), 1),
                ("d".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_idxmax() {
        let counts = vec![("x".to_string(), 2), ("y".to_string(), 5), ("z".to_string(), 5)];
        assert_eq!(idxmax(&counts), Some("y"));
        assert_eq!(idxmax(&[]), None);
    }
}
