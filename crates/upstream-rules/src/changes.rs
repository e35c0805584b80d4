//! Detecting whether an edited rule list differs from its persisted baseline.

use crate::canonical::Canonicalize;

/// Whether `edited` would save to something different from `baseline`.
///
/// Rows that canonicalize to nothing are ignored. The remaining rows are
/// compared with the baseline pairwise, in list order. Comparison happens on
/// canonical values, so an untouched `append` loaded as an insert with an
/// empty index compares equal to its baseline.
pub fn has_changes<R: Canonicalize>(baseline: &[R::Canonical], edited: &[R]) -> bool {
    let mut effective = edited.iter().filter_map(R::canonicalize);
    let mut expected = baseline.iter();

    loop {
        match (expected.next(), effective.next()) {
            (None, None) => return false,
            (Some(before), Some(after)) if *before == after => continue,
            _ => return true,
        }
    }
}
