//! Flat ↔ multi-index conversion.
//!
//! Bins in a `dims`-dimensional grid are identified either by a flat index
//! or by a per-dimension multi-index. Dimension 0 varies fastest
//! (little-endian mixed radix). Decomposition uses a uniform radix; after
//! dynamic refinement the per-dimension sizes diverge, so composition takes
//! the radix of every dimension.

/// Decompose `flat` into a `dims`-length multi-index with uniform radix
/// `dim_size` per dimension.
pub fn to_multi_index(flat: usize, dims: usize, dim_size: usize) -> Vec<usize> {
    let mut rest = flat;
    let mut multi = Vec::with_capacity(dims);
    for _ in 0..dims {
        multi.push(rest % dim_size);
        rest /= dim_size;
    }
    multi
}

/// Compose a multi-index back into a flat index using per-dimension radices.
///
/// Inverse of [`to_multi_index`] when all radices are equal:
/// `from_multi_index(&to_multi_index(i, d, n), &[n; d]) == i`.
pub fn from_multi_index(multi: &[usize], dim_sizes: &[usize]) -> usize {
    debug_assert_eq!(multi.len(), dim_sizes.len());
    let mut flat = 0;
    let mut stride = 1;
    for (&idx, &size) in multi.iter().zip(dim_sizes.iter()) {
        debug_assert!(idx < size);
        flat += idx * stride;
        stride *= size;
    }
    flat
}
