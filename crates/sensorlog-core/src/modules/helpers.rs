use std::cmp::Ordering;

/// Row order sorted by `compare`, ties broken by original position.
pub fn deterministic_argsort_by<T, F>(values: &[T], mut compare: F) -> Vec<usize>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_unstable_by(|lhs, rhs| {
        compare(&values[*lhs], &values[*rhs]).then_with(|| lhs.cmp(rhs))
    });
    indices
}

/// Evenly spaced positions over `0..len`, truncated toward zero like an
/// integer `linspace`. The count is clipped to `len`.
pub fn linear_positions(len: usize, count: usize) -> Vec<usize> {
    let count = count.min(len);
    match count {
        0 => Vec::new(),
        1 => vec![0],
        _ => (0..count)
            .map(|step| step * (len - 1) / (count - 1))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{deterministic_argsort_by, linear_positions};

    #[test]
    fn argsort_orders_by_value_then_index() {
        let values = [2, 1, 3, 1, 0];
        let order = deterministic_argsort_by(&values, |a, b| a.cmp(b));
        assert_eq!(order, vec![4, 1, 3, 0, 2]);
    }

    #[test]
    fn linear_positions_include_both_ends() {
        assert_eq!(linear_positions(11, 3), vec![0, 5, 10]);
        assert_eq!(linear_positions(100, 60).len(), 60);
        assert_eq!(linear_positions(100, 60).last(), Some(&99));
    }

    #[test]
    fn linear_positions_clip_to_available_rows() {
        assert_eq!(linear_positions(4, 60), vec![0, 1, 2, 3]);
        assert_eq!(linear_positions(1, 60), vec![0]);
        assert!(linear_positions(0, 60).is_empty());
    }
}
