use std::fmt::Display;

use getset::Getters;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One sequenced library with its aligned read counts on both genomes.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct LibraryRecord {
    #[getset(get = "pub")]
    library: String,
    #[getset(get = "pub")]
    experimental_count: u64,
    #[getset(get = "pub")]
    spike_in_count: u64,
}

impl LibraryRecord {
    pub fn new(library: &str, experimental_count: u64, spike_in_count: u64) -> Self {
        LibraryRecord {
            library: library.to_string(),
            experimental_count,
            spike_in_count,
        }
    }
}

/// Libraries in the order they appear in the count logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryTable {
    records: Vec<LibraryRecord>,
}

impl LibraryTable {
    pub fn new() -> Self {
        LibraryTable {
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: LibraryRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[LibraryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LibraryRecord> {
        self.records.iter()
    }
}

impl FromIterator<LibraryRecord> for LibraryTable {
    fn from_iter<I: IntoIterator<Item = LibraryRecord>>(iter: I) -> Self {
        LibraryTable {
            records: iter.into_iter().collect(),
        }
    }
}

/// Matches a library identifier, either by substring or by regular expression.
#[derive(Debug, Clone)]
pub enum IdMatcher {
    Contains(String),
    Pattern(Regex),
}

impl IdMatcher {
    pub fn is_match(&self, library: &str) -> bool {
        match self {
            IdMatcher::Contains(tag) => library.contains(tag.as_str()),
            IdMatcher::Pattern(re) => re.is_match(library),
        }
    }
}

impl Display for IdMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdMatcher::Contains(tag) => write!(f, "contains '{}'", tag),
            IdMatcher::Pattern(re) => write!(f, "matches /{}/", re.as_str()),
        }
    }
}

/// Selects the members of a group: an optional half-open row block and an
/// optional identifier matcher. A record must satisfy both when both are set.
#[derive(Debug, Clone)]
pub struct MemberSelector {
    pub rows: Option<(usize, usize)>,
    pub id: Option<IdMatcher>,
}

impl MemberSelector {
    pub fn is_member(&self, row: usize, library: &str) -> bool {
        let in_rows = self
            .rows
            .map_or(true, |(start, end)| row >= start && row < end);
        let id_ok = self.id.as_ref().map_or(true, |m| m.is_match(library));
        in_rows && id_ok
    }
}

impl Display for MemberSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.rows, &self.id) {
            (Some((start, end)), Some(id)) => write!(f, "rows {}..{} and {}", start, end, id),
            (Some((start, end)), None) => write!(f, "rows {}..{}", start, end),
            (None, Some(id)) => write!(f, "{}", id),
            (None, None) => write!(f, "all rows"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_matcher() {
        let contains = IdMatcher::Contains("93_D".to_string());
        assert!(contains.is_match("rep4_93_D_input"));
        assert!(!contains.is_match("rep4_93_I_input"));

        let pattern = IdMatcher::Pattern(Regex::new(r"^rep\d_95_[DI]_IP$").unwrap());
        assert!(pattern.is_match("rep4_95_I_IP"));
        assert!(!pattern.is_match("rep4_95_I_input"));
    }

    #[test]
    fn test_member_selector_requires_both() {
        let selector = MemberSelector {
            rows: Some((4, 8)),
            id: Some(IdMatcher::Contains("93_I".to_string())),
        };
        assert!(selector.is_member(4, "rep4_93_I_IP"));
        assert!(!selector.is_member(3, "rep4_93_I_IP"));
        assert!(!selector.is_member(8, "rep4_93_I_IP"));
        assert!(!selector.is_member(5, "rep4_93_D_IP"));
        assert_eq!(selector.to_string(), "rows 4..8 and contains '93_I'");
    }

    #[test]
    fn test_library_table_keeps_order() {
        let table: LibraryTable = vec![
            LibraryRecord::new("b", 1, 2),
            LibraryRecord::new("a", 3, 4),
        ]
        .into_iter()
        .collect();
        let names: Vec<&str> = table.iter().map(|r| r.library().as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(table.len(), 2);
    }
}
