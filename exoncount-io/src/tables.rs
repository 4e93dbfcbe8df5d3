//! Two-column, tab-separated lookup tables.
//!
//! Blank lines and lines starting with `#` are ignored. Extra columns are ignored.
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use exoncount_core::models::RenameTable;

use crate::error::{IoError, Result};

const MAX_GROUP_LABELS: usize = 2;

fn read_pairs(path: &Path) -> Result<Vec<(usize, String, String)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut pairs = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split('\t');
        match (parts.next(), parts.next()) {
            (Some(key), Some(value)) if !key.is_empty() && !value.is_empty() => {
                pairs.push((idx + 1, key.to_string(), value.to_string()));
            }
            _ => {
                return Err(IoError::Table {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    message: "expected two tab-separated columns".to_string(),
                });
            }
        }
    }

    Ok(pairs)
}

/// Read an `old<TAB>new` sequence-name rename table.
pub fn read_rename_table(path: &Path) -> Result<RenameTable> {
    let pairs = read_pairs(path)?;
    Ok(RenameTable::from_pairs(
        pairs.into_iter().map(|(_, old, new)| (old, new)),
    )?)
}

/// Read a `sample<TAB>group` table. Groups are a binary treatment label, so a
/// third distinct label is an error, as is a sample listed twice with different
/// groups.
pub fn read_group_table(path: &Path) -> Result<BTreeMap<String, String>> {
    let mut groups: BTreeMap<String, String> = BTreeMap::new();
    let mut labels: BTreeSet<String> = BTreeSet::new();
    for (line, sample, group) in read_pairs(path)? {
        if !labels.contains(&group) {
            if labels.len() == MAX_GROUP_LABELS {
                return Err(IoError::Table {
                    path: path.to_path_buf(),
                    line,
                    message: format!(
                        "group {} would be a third label after {}",
                        group,
                        labels.iter().cloned().collect::<Vec<_>>().join(" and ")
                    ),
                });
            }
            labels.insert(group.clone());
        }
        match groups.get(&sample) {
            Some(existing) if existing != &group => {
                return Err(IoError::Table {
                    path: path.to_path_buf(),
                    line,
                    message: format!(
                        "sample {} assigned to both {} and {}",
                        sample, existing, group
                    ),
                });
            }
            _ => {
                groups.insert(sample, group);
            }
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exoncount_core::GeneModelError;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    fn test_rename_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rename.tsv");
        std::fs::write(&path, "# old\tnew\n1\tChr1\n2\tChr2\n\nMt\tChrM\textra\n").unwrap();

        let table = read_rename_table(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.apply("1"), "Chr1");
        assert_eq!(table.apply("Mt"), "ChrM");
        assert_eq!(table.apply("3"), "3");
    }

    #[rstest]
    fn test_rename_table_conflict() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rename.tsv");
        std::fs::write(&path, "1\tChr1\n1\tchr1\n").unwrap();
        assert!(matches!(
            read_rename_table(&path),
            Err(IoError::GeneModel(GeneModelError::DuplicateRename(_)))
        ));
    }

    #[rstest]
    fn test_single_column_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.tsv");
        std::fs::write(&path, "ctrl1\tcontrol\ntrt1\n").unwrap();
        assert!(matches!(
            read_group_table(&path),
            Err(IoError::Table { line: 2, .. })
        ));
    }

    #[rstest]
    fn test_group_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.tsv");
        std::fs::write(&path, "ctrl1\tcontrol\ntrt1\ttreated\nctrl1\tcontrol\n").unwrap();
        let groups = read_group_table(&path).unwrap();
        assert_eq!(groups.get("trt1").map(String::as_str), Some("treated"));
        assert_eq!(groups.len(), 2);

        std::fs::write(&path, "ctrl1\tcontrol\nctrl1\ttreated\n").unwrap();
        assert!(read_group_table(&path).is_err());
    }

    #[rstest]
    fn test_third_group_label_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.tsv");
        std::fs::write(
            &path,
            "ctrl1\tcontrol\ntrt1\ttreated\nctrl2\tcontrol\nmock1\tmock\n",
        )
        .unwrap();
        match read_group_table(&path) {
            Err(IoError::Table { line, message, .. }) => {
                assert_eq!(line, 4);
                assert!(message.contains("mock"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
