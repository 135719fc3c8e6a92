use std::collections::HashMap;

use crate::fingerprint::Fingerprint;

/// Captures sharing one fingerprint, i.e. one rendered version of the page.
#[derive(Debug, Clone)]
pub struct VariantGroup {
    pub fingerprint: Fingerprint,
    /// Original capture indices, in capture order.
    pub indices: Vec<usize>,
}

/// Group capture indices by exact fingerprint equality.
///
/// Groups come back in discovery order (first occurrence claims the slot)
/// and partition the input: every index lands in exactly one group.
/// Near-miss fingerprints stay separate on purpose; pre-bucket with
/// [`Fingerprint::distance`] before calling this if fuzzy grouping is
/// wanted.
pub fn cluster_variants(fingerprints: &[(usize, Fingerprint)]) -> Vec<VariantGroup> {
    let mut slot_of: HashMap<Fingerprint, usize> = HashMap::new();
    let mut groups: Vec<VariantGroup> = Vec::new();

    for &(index, fingerprint) in fingerprints {
        match slot_of.get(&fingerprint) {
            Some(&slot) => groups[slot].indices.push(index),
            None => {
                slot_of.insert(fingerprint, groups.len());
                groups.push(VariantGroup {
                    fingerprint,
                    indices: vec![index],
                });
            }
        }
    }

    groups
}
