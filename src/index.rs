use std::collections::BTreeMap;

use crate::settings::Catalog;

/// Every record loaded by this tool is an algorithm problem.
pub const PROBLEM_KIND: &str = "algorithm";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemRecord {
    pub name: String,
    pub kind: String,
    pub subtype: String,
    pub link: String,
    pub content: String,
    pub result: String,
}

impl ProblemRecord {
    pub fn new(name: &str, subtype: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: PROBLEM_KIND.to_string(),
            subtype: subtype.to_string(),
            ..Default::default()
        }
    }
}

/// Problem name → record. Sorted so inserts land in a stable order.
pub type RecordIndex = BTreeMap<String, ProblemRecord>;

/// Seed the index from the catalog. A name listed under two categories
/// keeps the one that appears later in the file.
pub fn build_index(catalog: &Catalog) -> RecordIndex {
    let mut index = RecordIndex::new();
    for (category, names) in catalog.iter() {
        for name in names {
            index.insert(name.clone(), ProblemRecord::new(name, category));
        }
    }
    index
}
