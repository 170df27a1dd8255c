//! Slice helpers. All of them preserve the input order.

use std::collections::HashSet;
use std::hash::Hash;

/// Remove duplicates, keeping the first occurrence.
#[must_use]
pub fn unique<T>(items: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

/// Split into consecutive chunks of `size`. A zero size yields no chunks.
#[must_use]
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return Vec::new();
    }
    items.chunks(size).map(<[T]>::to_vec).collect()
}

/// Drop empty and whitespace-only strings.
#[must_use]
pub fn compact<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Items of `left` also present in `right`.
#[must_use]
pub fn intersection<T>(left: &[T], right: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let right: HashSet<&T> = right.iter().collect();
    unique(left)
        .into_iter()
        .filter(|item| right.contains(item))
        .collect()
}

/// Items of `left` absent from `right`.
#[must_use]
pub fn difference<T>(left: &[T], right: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let right: HashSet<&T> = right.iter().collect();
    left.iter()
        .filter(|item| !right.contains(item))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_keeps_first_occurrence() {
        assert_eq!(unique(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn test_chunk() {
        assert_eq!(chunk(&[1, 2, 3, 4, 5], 2), vec![vec![1, 2], vec![3, 4], vec![5]]);
        assert!(chunk(&[1, 2], 0).is_empty());
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact(&["a", " ", "", " b "]), vec!["a", "b"]);
    }

    #[test]
    fn test_intersection_and_difference() {
        assert_eq!(intersection(&[1, 2, 2, 3], &[2, 3, 4]), vec![2, 3]);
        assert_eq!(difference(&[1, 2, 3], &[2]), vec![1, 3]);
    }
}
