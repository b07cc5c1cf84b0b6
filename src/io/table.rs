//! Shared CSV plumbing for every export the tool reads.
//!
//! Spreadsheet exports are messy: BOM-prefixed headers, mixed case,
//! thousands separators, stray whitespace. The helpers here normalize those
//! once so the individual loaders only deal with column semantics.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::error::{AppError, Result};

/// Open a CSV file with the reader settings every loader uses.
pub fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| AppError::io(path, e))?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

/// Normalized header name -> column index.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn new(headers: &StringRecord) -> Self {
        let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self { names, index }
    }

    /// Normalized names in file order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// First column matching any of `aliases`.
    pub fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.index.get(&normalize_header_name(a)).copied())
    }

    /// Like [`HeaderMap::find`] but a missing column is a schema error.
    pub fn require(&self, path: &Path, aliases: &[&str]) -> Result<usize> {
        self.find(aliases).ok_or_else(|| {
            AppError::schema(path, format!("missing required column `{}`", aliases[0]))
        })
    }
}

pub fn normalize_header_name(name: &str) -> String {
    // UTF-8 exports from Excel put a BOM in front of the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_lowercase()
}

/// Trimmed, non-empty cell.
pub fn cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a numeric cell, tolerating thousands separators.
pub fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
    let v = cleaned.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_bom_and_case_insensitive() {
        let headers = StringRecord::from(vec!["\u{feff}DS", " Y ", "매출:A"]);
        let map = HeaderMap::new(&headers);
        assert_eq!(map.find(&["ds"]), Some(0));
        assert_eq!(map.find(&["y"]), Some(1));
        assert_eq!(map.find(&["revenue:a", "매출:a"]), Some(2));
        assert!(map.require(Path::new("x.csv"), &["team"]).is_err());
    }

    #[test]
    fn numbers_accept_thousands_separators() {
        assert_eq!(parse_number("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("inf"), None);
    }
}
