use crate::extract::Row;

/// Count the values that are not the empty string
pub fn populated_count(row: &Row) -> usize {
    row.values().filter(|value| !value.is_empty()).count()
}

/// Drop rows with fewer than `min_populated` non-empty values
///
/// Returns how many rows were removed. Relative order is kept.
pub fn retain_populated(rows: &mut Vec<Row>, min_populated: usize) -> usize {
    let before = rows.len();
    rows.retain(|row| populated_count(row) >= min_populated);
    before - rows.len()
}
