use std::collections::{BTreeMap, HashMap, HashSet};

/// Canton code to the set of ZIP codes that belong to it.
///
/// Every ZIP code lives in exactly one canton set. Feeding a ZIP code twice moves it to
/// the canton seen last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CantonIndex {
    by_canton: BTreeMap<String, HashSet<String>>,
    by_zip: HashMap<String, String>,
}

impl CantonIndex {
    /// Builds the index from a flat ZIP code to canton code mapping.
    pub fn from_zip_map<I, Z, C>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (Z, C)>,
        Z: Into<String>,
        C: Into<String>,
    {
        let mut index = Self::default();
        for (zip, canton) in mapping {
            index.insert(zip.into(), canton.into());
        }
        index
    }

    fn insert(&mut self, zip: String, canton: String) {
        if let Some(previous) = self.by_zip.insert(zip.clone(), canton.clone()) {
            if previous != canton {
                if let Some(zips) = self.by_canton.get_mut(&previous) {
                    zips.remove(&zip);
                    if zips.is_empty() {
                        self.by_canton.remove(&previous);
                    }
                }
            }
        }

        self.by_canton.entry(canton).or_default().insert(zip);
    }

    /// True when `zip` belongs to `canton`. Unknown cantons contain nothing.
    pub fn contains(&self, canton: &str, zip: &str) -> bool {
        self.by_canton
            .get(canton)
            .is_some_and(|zips| zips.contains(zip))
    }

    pub fn zip_codes(&self, canton: &str) -> Option<&HashSet<String>> {
        self.by_canton.get(canton)
    }

    pub fn canton_of(&self, zip: &str) -> Option<&str> {
        self.by_zip.get(zip).map(String::as_str)
    }

    /// Canton codes in ascending order.
    pub fn canton_codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_canton.keys().map(String::as_str)
    }

    /// Canton codes with the number of ZIP codes assigned to each, ascending by code.
    pub fn summary(&self) -> Vec<(String, usize)> {
        self.by_canton
            .iter()
            .map(|(canton, zips)| (canton.clone(), zips.len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_canton.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_canton.is_empty()
    }
}

impl FromIterator<(String, String)> for CantonIndex {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::from_zip_map(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_zip_codes_by_canton() {
        let index = CantonIndex::from_zip_map([
            ("8000", "ZH"),
            ("8001", "ZH"),
            ("3000", "BE"),
        ]);

        assert_eq!(index.len(), 2);
        assert!(index.contains("ZH", "8001"));
        assert!(!index.contains("BE", "8001"));
        assert!(!index.contains("GE", "1200"));
        assert_eq!(index.zip_codes("ZH").map(HashSet::len), Some(2));
        assert_eq!(index.canton_codes().collect::<Vec<_>>(), ["BE", "ZH"]);
    }

    #[test]
    fn remapped_zip_moves_to_latest_canton() {
        let index = CantonIndex::from_zip_map([("4000", "BL"), ("4000", "BS")]);

        assert!(index.contains("BS", "4000"));
        assert!(!index.contains("BL", "4000"));
        assert_eq!(index.canton_of("4000"), Some("BS"));
        assert_eq!(index.summary(), vec![("BS".to_string(), 1)]);
    }
}
