//! Unordered pair enumeration.

/// All unique unordered index pairs `(i, j)` with `i < j < len`.
///
/// Yields `len * (len - 1) / 2` pairs in row-major order.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::pairs::index_pairs;
///
/// let pairs: Vec<_> = index_pairs(3).collect();
/// assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
/// assert_eq!(index_pairs(1).count(), 0);
/// ```
pub fn index_pairs(len: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..len).flat_map(move |i| ((i + 1)..len).map(move |j| (i, j)))
}

/// Canonical `(min, max)` ordering of two values.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::pairs::canonical;
///
/// assert_eq!(canonical("z.clj", "a.clj"), ("a.clj", "z.clj"));
/// ```
pub fn canonical<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
