//! Index sort: order a permutation of `0..n` by the keys it points at.
//!
//! Quicksort with median-of-three pivots and an insertion sort cutoff
//! (Sedgewick & Wayne, *Algorithms*, 4th ed.). Keys are only read, never
//! moved. Equal keys come out in an unspecified but deterministic order:
//! the same input always yields the same permutation.

extern crate alloc;
use alloc::vec::Vec;

use crate::error::QuantizeError;

/// Subranges at or below this length are finished by insertion sort.
const INSERTION_SORT_CUTOFF: usize = 8;

/// Return the permutation that visits `keys` in non-decreasing order.
///
/// ```
/// let perm = wuquant::argsort::argsort(&[1.0, 25.0, 3.0, 5.0, 4.0]);
/// assert_eq!(perm, [0, 2, 4, 3, 1]);
/// ```
pub fn argsort(keys: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..keys.len()).collect();
    quicksort(keys, &mut indices);
    indices
}

/// Like [`argsort`], but visits `keys` in non-increasing order.
pub fn argsort_descending(keys: &[f64]) -> Vec<usize> {
    let mut indices = argsort(keys);
    indices.reverse();
    indices
}

/// Fill `indices` with the ascending permutation of `keys`, reusing the buffer.
///
/// Fails with [`QuantizeError::LengthMismatch`] if the buffer length differs
/// from the number of keys.
pub fn argsort_into(keys: &[f64], indices: &mut [usize]) -> Result<(), QuantizeError> {
    if keys.len() != indices.len() {
        return Err(QuantizeError::LengthMismatch {
            keys: keys.len(),
            indices: indices.len(),
        });
    }
    for (i, slot) in indices.iter_mut().enumerate() {
        *slot = i;
    }
    quicksort(keys, indices);
    Ok(())
}

fn quicksort(keys: &[f64], mut ind: &mut [usize]) {
    // Recurse into the smaller side, loop on the larger, so stack depth stays logarithmic.
    loop {
        let n = ind.len();
        if n <= 1 {
            return;
        }
        if n <= INSERTION_SORT_CUTOFF {
            insertion_sort(keys, ind);
            return;
        }

        let j = partition(keys, ind);
        let (left, right) = ind.split_at_mut(j);
        let right = &mut right[1..];
        if left.len() < right.len() {
            quicksort(keys, left);
            ind = right;
        } else {
            quicksort(keys, right);
            ind = left;
        }
    }
}

/// Insertion sort with a sentinel and half exchanges.
///
/// The first pass bubbles the minimum to the front; afterwards the inner
/// loop needs no lower-bound check. Elements are shifted, not swapped.
fn insertion_sort(keys: &[f64], ind: &mut [usize]) {
    let n = ind.len();
    if n <= 1 {
        return;
    }

    let mut exchanges = 0usize;
    for i in (1..n).rev() {
        if keys[ind[i]] < keys[ind[i - 1]] {
            ind.swap(i, i - 1);
            exchanges += 1;
        }
    }
    if exchanges == 0 {
        return;
    }

    for i in 1..n {
        let k = ind[i];
        let mut j = i;
        while keys[k] < keys[ind[j - 1]] {
            ind[j] = ind[j - 1];
            j -= 1;
        }
        ind[j] = k;
    }
}

/// Partition around a median-of-three pivot; returns the pivot's final position.
///
/// Afterwards `keys[ind[..j]] <= keys[ind[j]] <= keys[ind[j + 1..]]`.
fn partition(keys: &[f64], ind: &mut [usize]) -> usize {
    let hi = ind.len() - 1;
    let m = median3(keys, ind, 0, ind.len() / 2, hi);
    ind.swap(m, 0);

    let pivot = keys[ind[0]];
    let mut i = 1;
    let mut j = hi;

    // pivot is the unique maximum
    while keys[ind[i]] < pivot {
        if i == hi {
            ind.swap(0, hi);
            return hi;
        }
        i += 1;
    }

    // pivot is the unique minimum
    while pivot < keys[ind[j]] {
        if j == 1 {
            return 0;
        }
        j -= 1;
    }

    while i < j {
        ind.swap(i, j);
        i += 1;
        while keys[ind[i]] < pivot {
            i += 1;
        }
        j -= 1;
        while pivot < keys[ind[j]] {
            j -= 1;
        }
    }

    ind.swap(0, j);
    j
}

/// Position (one of `i`, `j`, `k`) holding the median key of the three.
fn median3(keys: &[f64], ind: &[usize], i: usize, j: usize, k: usize) -> usize {
    let (a, b, c) = (keys[ind[i]], keys[ind[j]], keys[ind[k]]);
    if a < b {
        if b < c {
            return j;
        }
        if a < c {
            return k;
        }
        return i;
    }
    if c < b {
        return j;
    }
    if c < a {
        return k;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Deterministic pseudo-random samples with plenty of duplicate keys.
    fn samples() -> Vec<Vec<f64>> {
        (0..100u32)
            .map(|s| {
                let size = (s.wrapping_mul(2654435761) >> 24) as usize;
                (0..size as u32)
                    .map(|i| {
                        let h = (i ^ s.rotate_left(7)).wrapping_mul(2246822519);
                        (h as usize % size.max(1)) as f64
                    })
                    .collect()
            })
            .collect()
    }

    fn is_sorted_by_keys(keys: &[f64], perm: &[usize]) -> bool {
        perm.windows(2).all(|w| keys[w[0]] <= keys[w[1]])
    }

    fn is_permutation(perm: &[usize]) -> bool {
        let mut seen = vec![false; perm.len()];
        for &p in perm {
            if p >= perm.len() || seen[p] {
                return false;
            }
            seen[p] = true;
        }
        true
    }

    #[test]
    fn known_order() {
        assert_eq!(argsort(&[1.0, 25.0, 3.0, 5.0, 4.0]), vec![0, 2, 4, 3, 1]);
    }

    #[test]
    fn descending_reverses() {
        assert_eq!(
            argsort_descending(&[1.0, 25.0, 3.0, 5.0, 4.0]),
            vec![1, 3, 4, 2, 0]
        );
    }

    #[test]
    fn empty_and_single() {
        assert!(argsort(&[]).is_empty());
        assert_eq!(argsort(&[42.0]), vec![0]);
    }

    #[test]
    fn sorts_random_samples_without_touching_keys() {
        for sample in samples() {
            let before = sample.clone();
            let perm = argsort(&sample);
            assert_eq!(sample, before, "keys must not be mutated");
            assert!(is_permutation(&perm));
            assert!(is_sorted_by_keys(&sample, &perm), "unsorted: {perm:?}");
        }
    }

    #[test]
    fn insertion_sort_alone() {
        for sample in samples() {
            let mut ind: Vec<usize> = (0..sample.len()).collect();
            insertion_sort(&sample, &mut ind);
            assert!(is_sorted_by_keys(&sample, &ind));
        }
    }

    #[test]
    fn structured_inputs() {
        let ascending: Vec<f64> = (0..500).map(|i| i as f64).collect();
        let descending: Vec<f64> = ascending.iter().rev().copied().collect();
        let constant = vec![7.0; 300];
        let sawtooth: Vec<f64> = (0..400).map(|i| (i % 9) as f64).collect();

        for keys in [&ascending, &descending, &constant, &sawtooth] {
            let perm = argsort(keys);
            assert!(is_permutation(&perm));
            assert!(is_sorted_by_keys(keys, &perm));
        }
        assert_eq!(argsort(&ascending), (0..500).collect::<Vec<_>>());
    }

    #[test]
    fn matches_library_sort_on_distinct_keys() {
        let keys: Vec<f64> = (0..257u32)
            .map(|i| (i.wrapping_mul(2654435761) % 100_003) as f64 + i as f64 * 1e-6)
            .collect();
        let mut expected: Vec<usize> = (0..keys.len()).collect();
        expected.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));
        assert_eq!(argsort(&keys), expected);
    }

    #[test]
    fn repeated_calls_agree() {
        let keys: Vec<f64> = (0..64).map(|i| (i % 4) as f64).collect();
        assert_eq!(argsort(&keys), argsort(&keys));
    }

    #[test]
    fn into_reuses_buffer() {
        let keys = [3.0, 1.0, 2.0];
        let mut buf = [9, 9, 9];
        argsort_into(&keys, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 0]);
    }

    #[test]
    fn into_rejects_wrong_length() {
        let mut buf = [0usize; 2];
        assert_eq!(
            argsort_into(&[1.0, 2.0, 3.0], &mut buf),
            Err(QuantizeError::LengthMismatch {
                keys: 3,
                indices: 2
            })
        );
    }
}
