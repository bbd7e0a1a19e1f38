//! Duplicate detection over seller and brand snapshots.
//!
//! One pass in input order. Records are keyed by their normalized identity
//! fields; a repeated key is an exact duplicate. Independently, every record
//! name is compared with the names of previously seen unique keys, and a
//! similarity in `[threshold, 1.0)` is reported as a near duplicate. A record
//! may show up in several candidates.

pub mod similarity;

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::brand::Brand;
use crate::domain::seller::Seller;

pub use self::similarity::sequence_ratio;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKind {
    Exact,
    Similar,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    #[serde(rename = "type")]
    pub kind: DuplicateKind,
    pub original_index: usize,
    pub duplicate_index: usize,
    /// 1.0 for exact matches.
    pub similarity: f64,
}

/// Identity fields a record contributes to duplicate detection.
pub trait DuplicateIdentity {
    /// Raw identity fields, name first.
    fn identity_fields(&self) -> Vec<Option<&str>>;
}

impl DuplicateIdentity for Seller {
    fn identity_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.name.as_str()), self.email.as_deref(), self.store_url.as_deref()]
    }
}

impl DuplicateIdentity for Brand {
    fn identity_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.name.as_str()), self.domain.as_deref()]
    }
}

fn normalize(value: Option<&str>) -> String {
    value.map(|value| value.trim().to_lowercase()).unwrap_or_default()
}

#[derive(Clone, Copy, Debug)]
pub struct DuplicateDetector {
    threshold: f64,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self { threshold: DEFAULT_SIMILARITY_THRESHOLD }
    }
}

impl DuplicateDetector {
    pub fn detect<T: DuplicateIdentity>(&self, records: &[T]) -> Vec<DuplicateCandidate> {
        let mut candidates = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        // (name, index) of each unique key in first-seen order
        let mut seen_names: Vec<(String, usize)> = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let fields = record.identity_fields().into_iter().map(normalize).collect::<Vec<_>>();
            let name = fields.first().cloned().unwrap_or_default();
            let key = fields.join("|");

            match seen.get(&key) {
                Some(&original_index) => candidates.push(DuplicateCandidate {
                    kind: DuplicateKind::Exact,
                    original_index,
                    duplicate_index: index,
                    similarity: 1.0,
                }),
                None => {
                    seen.insert(key, index);
                    seen_names.push((name.clone(), index));
                }
            }

            if name.is_empty() {
                continue;
            }

            for (existing_name, existing_index) in &seen_names {
                if *existing_index == index {
                    continue;
                }
                let similarity = sequence_ratio(&name, existing_name);
                if similarity >= self.threshold && similarity < 1.0 {
                    candidates.push(DuplicateCandidate {
                        kind: DuplicateKind::Similar,
                        original_index: *existing_index,
                        duplicate_index: index,
                        similarity,
                    });
                }
            }
        }

        candidates
    }
}

/// Distinct indices that appear as the duplicate side of any candidate.
pub fn duplicate_indices(candidates: &[DuplicateCandidate]) -> BTreeSet<usize> {
    candidates.iter().map(|candidate| candidate.duplicate_index).collect()
}
