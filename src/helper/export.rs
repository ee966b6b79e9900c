use std::error::Error;
use std::path::Path;

use csv::WriterBuilder;

use crate::helper::normalization::NormalizedTable;

pub const FULL_TABLE_FILE: &str = "normalization_full.csv";

/// Writes the two-column normalization table: library, fixed-point alpha.
/// No header row, one row per library in input order.
pub fn write_normalization_table(
    table: &NormalizedTable,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;

    for record in table.records() {
        wtr.write_record([record.library().as_str(), record.alpha_formatted().as_str()])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes every derived column with a header row.
pub fn write_full_table(table: &NormalizedTable, path: &Path) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;

    for record in table.records() {
        wtr.serialize(record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::library::{IdMatcher, LibraryRecord, LibraryTable, MemberSelector};
    use crate::helper::normalization::{GroupSpec, normalize};

    fn normalized() -> NormalizedTable {
        let table: LibraryTable = vec![
            LibraryRecord::new("D_IP", 4000, 50),
            LibraryRecord::new("D_input", 1000, 100),
            LibraryRecord::new("I_input", 500, 100),
            LibraryRecord::new("I_IP", 900, 25),
        ]
        .into_iter()
        .collect();
        let groups = vec![
            GroupSpec {
                name: "D".to_string(),
                members: MemberSelector {
                    rows: Some((0, 2)),
                    id: None,
                },
                reference: IdMatcher::Contains("input".to_string()),
            },
            GroupSpec {
                name: "I".to_string(),
                members: MemberSelector {
                    rows: Some((2, 4)),
                    id: None,
                },
                reference: IdMatcher::Contains("input".to_string()),
            },
        ];
        normalize(&table, &groups, 16).unwrap()
    }

    #[test]
    fn test_write_normalization_table() {
        let path = std::env::temp_dir().join("chip_norm_export_table.csv");
        write_normalization_table(&normalized(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "D_IP,0.0020000000000000",
                "D_input,0.0010000000000000",
                "I_input,0.0020000000000000",
                "I_IP,0.0080000000000000",
            ]
        );
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_full_table() {
        let path = std::env::temp_dir().join("chip_norm_export_full.csv");
        write_full_table(&normalized(), &path).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(&headers[0], "library");
        assert!(headers.iter().any(|h| h == "proportion_spike"));
        assert_eq!(rdr.records().count(), 4);
        std::fs::remove_file(&path).unwrap();
    }
}
