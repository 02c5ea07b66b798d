//! Group-by reducers shared by the board and dashboard.

use std::collections::BTreeMap;

use crate::utils::coerce_amount;

/// Number of records per key.
pub fn count_by<T, K, F>(records: &[T], key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(key(record)).or_insert(0) += 1;
    }
    counts
}

/// Sum of `amount` per key. Missing amounts add 0.
pub fn sum_by<T, K, F, A>(records: &[T], key: F, amount: A) -> BTreeMap<K, f64>
where
    K: Ord,
    F: Fn(&T) -> K,
    A: Fn(&T) -> Option<f64>,
{
    let mut sums = BTreeMap::new();
    for record in records {
        *sums.entry(key(record)).or_insert(0.0) += coerce_amount(amount(record));
    }
    sums
}

/// Sum of `amount` over every record.
pub fn total<T, A>(records: &[T], amount: A) -> f64
where
    A: Fn(&T) -> Option<f64>,
{
    records.iter().map(|r| coerce_amount(amount(r))).sum()
}

/// `numerator / denominator`, or 0 when the denominator is 0.
#[inline]
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
