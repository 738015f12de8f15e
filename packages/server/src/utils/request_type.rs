/// Derive a shooting request's type from the category types of its
/// products by majority vote. Ties resolve to the lowest type id so
/// the result is stable regardless of input order.
pub fn majority_type(category_types: &[i32]) -> Option<i32> {
    let mut counts: std::collections::BTreeMap<i32, usize> = std::collections::BTreeMap::new();
    for &t in category_types {
        *counts.entry(t).or_insert(0) += 1;
    }

    // BTreeMap iterates in ascending key order, so on equal counts the
    // lowest type id wins.
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(t, _)| t)
}
