use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::errors::GeneModelError;

///
/// Mapping of old sequence names onto new ones, e.g. `{"1": "Chr1"}`.
///
/// Names absent from the table pass through unchanged.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenameTable {
    map: BTreeMap<String, String>,
}

impl RenameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(old, new)` pairs. Listing the same old name twice with
    /// different targets is rejected.
    pub fn from_pairs<I, A, B>(pairs: I) -> Result<Self, GeneModelError>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for (old, new) in pairs {
            let old = old.into();
            let new = new.into();
            match map.get(&old) {
                Some(existing) if *existing != new => {
                    return Err(GeneModelError::DuplicateRename(old));
                }
                Some(_) => {}
                None => {
                    map.insert(old, new);
                }
            }
        }
        Ok(RenameTable { map })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, old: &str) -> Option<&str> {
        self.map.get(old).map(String::as_str)
    }

    /// The new name for `name`, or `name` itself when the table has no entry.
    pub fn apply<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).unwrap_or(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    ///
    /// The reverse mapping (new → old).
    ///
    /// Fails when two old names share a target, since such a table cannot be undone.
    ///
    pub fn inverse(&self) -> Result<RenameTable, GeneModelError> {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for (old, new) in &self.map {
            if let Some(previous) = map.get(new) {
                let mut sources = vec![previous.clone(), old.clone()];
                sources.sort();
                return Err(GeneModelError::RenameCollision {
                    target: new.clone(),
                    sources,
                });
            }
            map.insert(new.clone(), old.clone());
        }
        Ok(RenameTable { map })
    }

    ///
    /// Check that renaming keeps `names` distinct.
    ///
    /// Both explicit entries and pass-through names count: with `{"1": "Chr1"}`,
    /// the names `1` and `Chr1` would collapse onto the same sequence.
    ///
    pub fn check_injective<'a, I>(&self, names: I) -> Result<(), GeneModelError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut sources_by_target: HashMap<&str, BTreeSet<&str>> = HashMap::new();
        for name in names {
            sources_by_target
                .entry(self.apply(name))
                .or_default()
                .insert(name);
        }

        let mut collisions: Vec<(&str, BTreeSet<&str>)> = sources_by_target
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .collect();
        collisions.sort();

        match collisions.into_iter().next() {
            Some((target, sources)) => Err(GeneModelError::RenameCollision {
                target: target.to_string(),
                sources: sources.into_iter().map(str::to_string).collect(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn ensembl_to_ucsc() -> RenameTable {
        RenameTable::from_pairs([("1", "Chr1"), ("2", "Chr2"), ("MT", "ChrM")]).unwrap()
    }

    #[rstest]
    fn test_apply_passes_unknown_names_through(ensembl_to_ucsc: RenameTable) {
        assert_eq!(ensembl_to_ucsc.apply("1"), "Chr1");
        assert_eq!(ensembl_to_ucsc.apply("scaffold_7"), "scaffold_7");
    }

    #[rstest]
    fn test_inverse_round_trip(ensembl_to_ucsc: RenameTable) {
        let inverse = ensembl_to_ucsc.inverse().unwrap();
        assert_eq!(inverse.apply("ChrM"), "MT");
        assert_eq!(inverse.inverse().unwrap(), ensembl_to_ucsc);
    }

    #[rstest]
    fn test_inverse_rejects_collisions() {
        let table = RenameTable::from_pairs([("1", "Chr1"), ("chr1", "Chr1")]).unwrap();
        let err = table.inverse().unwrap_err();
        match err {
            GeneModelError::RenameCollision { target, sources } => {
                assert_eq!(target, "Chr1");
                assert_eq!(sources, vec!["1".to_string(), "chr1".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    fn test_duplicate_old_name_rejected() {
        let res = RenameTable::from_pairs([("1", "Chr1"), ("1", "chr1")]);
        assert!(matches!(res, Err(GeneModelError::DuplicateRename(name)) if name == "1"));
    }

    #[rstest]
    fn test_check_injective_catches_pass_through_clash(ensembl_to_ucsc: RenameTable) {
        assert!(ensembl_to_ucsc.check_injective(["1", "2"]).is_ok());
        assert!(ensembl_to_ucsc.check_injective(["1", "Chr1"]).is_err());
    }
}
