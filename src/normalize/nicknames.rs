//! Bidirectional nickname variant table (§4.1, §9 "nickname table hybrid source").
//!
//! Seeded from a static list of nickname groups; optionally augmented
//! from a persisted `name_first_variant` table. Group membership is
//! total: if A↔B and A↔C are both known, all three become mutual
//! variants of one another.

use std::collections::{HashMap, HashSet};

/// Static seed groups. Each inner slice is one mutual-variant group;
/// the code-seed alone must be sufficient for the common cases.
const SEED_GROUPS: &[&[&str]] = &[
    &["james", "jim", "jimmy", "jamie"],
    &["william", "bill", "billy", "will", "willie"],
    &["robert", "bob", "bobby", "rob"],
    &["richard", "rick", "ricky", "dick"],
    &["charles", "charlie", "chuck"],
    &["joseph", "joe", "joey"],
    &["thomas", "tom", "tommy"],
    &["christopher", "chris"],
    &["daniel", "dan", "danny"],
    &["matthew", "matt"],
    &["anthony", "tony"],
    &["donald", "don", "donnie"],
    &["steven", "steve", "stephen"],
    &["edward", "ed", "eddie", "eddy", "ted", "teddy"],
    &["ronald", "ron", "ronnie"],
    &["kenneth", "ken", "kenny"],
    &["michael", "mike", "mikey"],
    &["david", "dave", "davy"],
    &["john", "jack", "johnny"],
    &["margaret", "maggie", "meg", "peggy"],
    &["elizabeth", "beth", "liz", "lizzie", "betty", "eliza"],
    &["katherine", "kathy", "kate", "katie", "kay"],
    &["patricia", "pat", "patty", "patsy", "trish"],
    &["susan", "sue", "susie", "suzy"],
    &["deborah", "debbie", "deb"],
    &["barbara", "barb", "babs"],
    &["dorothy", "dot", "dottie"],
    &["linda", "lynn"],
    &["rebecca", "becky"],
    &["jennifer", "jen", "jenny"],
    &["cynthia", "cindy"],
    &["frances", "fran", "frannie"],
    &["theodore", "ted", "theo"],
    &["alexander", "alex", "al"],
    &["nicholas", "nick", "nicky"],
    &["benjamin", "ben", "benny"],
    &["samuel", "sam", "sammy"],
    &["gregory", "greg"],
    &["timothy", "tim", "timmy"],
    &["lawrence", "larry"],
    &["raymond", "ray"],
    &["harold", "harry", "hal"],
];

/// A nickname table: a set of mutual-variant groups, indexed by
/// normalized name for O(1) lookup.
#[derive(Debug, Clone, Default)]
pub struct NicknameTable {
    groups: Vec<HashSet<String>>,
    index: HashMap<String, usize>,
}

impl NicknameTable {
    /// Build the table from the static code seed.
    pub fn seeded() -> Self {
        let mut table = NicknameTable::default();
        for group in SEED_GROUPS {
            let names: Vec<String> = group.iter().map(|s| s.to_string()).collect();
            table.add_group(&names);
        }
        table
    }

    fn add_group(&mut self, names: &[String]) {
        // Merge with any existing groups any of these names already belong to.
        let mut existing: HashSet<usize> = HashSet::new();
        for name in names {
            if let Some(&idx) = self.index.get(name) {
                existing.insert(idx);
            }
        }

        if existing.is_empty() {
            let set: HashSet<String> = names.iter().cloned().collect();
            let idx = self.groups.len();
            for name in &set {
                self.index.insert(name.clone(), idx);
            }
            self.groups.push(set);
            return;
        }

        // Merge all touched groups plus the new names into the first one.
        let mut existing: Vec<usize> = existing.into_iter().collect();
        existing.sort_unstable();
        let primary = existing[0];

        let mut merged: HashSet<String> = names.iter().cloned().collect();
        for &idx in &existing {
            merged.extend(self.groups[idx].iter().cloned());
        }

        for &idx in &existing[1..] {
            self.groups[idx] = HashSet::new();
        }
        self.groups[primary] = merged.clone();
        for name in &merged {
            self.index.insert(name.clone(), primary);
        }
    }

    /// Add a pair of mutually-variant names, merging their groups.
    pub fn add_pair(&mut self, a: &str, b: &str) {
        self.add_group(&[a.to_lowercase(), b.to_lowercase()]);
    }

    /// Variants of `name`: the input plus all group siblings. Always
    /// contains at least `name` itself.
    pub fn variants(&self, name: &str) -> HashSet<String> {
        let lower = name.to_lowercase();
        match self.index.get(&lower) {
            Some(&idx) => self.groups[idx].clone(),
            None => {
                let mut set = HashSet::new();
                set.insert(lower);
                set
            }
        }
    }

    /// True if `a` and `b` are known variants of one another (and not
    /// identical — callers typically check exact-match separately).
    pub fn are_variants(&self, a: &str, b: &str) -> bool {
        let (a, b) = (a.to_lowercase(), b.to_lowercase());
        if a == b {
            return false;
        }
        match (self.index.get(&a), self.index.get(&b)) {
            (Some(&ia), Some(&ib)) => ia == ib,
            _ => false,
        }
    }
}

/// Convenience wrapper over a process-wide seeded table for one-off lookups.
pub fn nickname_variants(name: &str) -> HashSet<String> {
    seeded_table().variants(name)
}

fn seeded_table() -> &'static NicknameTable {
    use once_cell::sync::Lazy;
    static TABLE: Lazy<NicknameTable> = Lazy::new(NicknameTable::seeded);
    &TABLE
}

/// Augment a table from persisted `(name_a, name_b)` pairs (the
/// `name_first_variant` table, §6).
pub fn augment_nickname_table(table: &mut NicknameTable, pairs: &[(String, String)]) {
    for (a, b) in pairs {
        table.add_pair(a, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_group_membership_is_total() {
        let table = NicknameTable::seeded();
        let variants = table.variants("jim");
        assert!(variants.contains("james"));
        assert!(variants.contains("jimmy"));
        assert!(variants.contains("jamie"));
        assert!(variants.contains("jim"));
    }

    #[test]
    fn are_variants_is_symmetric_and_excludes_self() {
        let table = NicknameTable::seeded();
        assert!(table.are_variants("jim", "james"));
        assert!(table.are_variants("james", "jim"));
        assert!(!table.are_variants("jim", "jim"));
        assert!(!table.are_variants("jim", "robert"));
    }

    #[test]
    fn unknown_name_is_its_own_sole_variant() {
        let table = NicknameTable::seeded();
        let variants = table.variants("zoltan");
        assert_eq!(variants.len(), 1);
        assert!(variants.contains("zoltan"));
    }

    #[test]
    fn augmentation_merges_into_existing_groups() {
        let mut table = NicknameTable::seeded();
        augment_nickname_table(&mut table, &[("jim".to_string(), "jas".to_string())]);
        assert!(table.are_variants("jas", "james"));
        assert!(table.are_variants("jas", "jimmy"));
    }

    #[test]
    fn augmentation_can_form_a_brand_new_group() {
        let mut table = NicknameTable::seeded();
        augment_nickname_table(&mut table, &[("zeke".to_string(), "ezekiel".to_string())]);
        assert!(table.are_variants("zeke", "ezekiel"));
        assert!(!table.are_variants("zeke", "james"));
    }
}
