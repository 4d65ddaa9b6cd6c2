// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Host kernels shared by the COO algorithms.
//!
//! Values travel as flat byte arrays with a fixed element size, so every kernel
//! takes the value array together with its `byte_size`. A `byte_size` of zero means
//! the data is structural and value arrays stay empty.

use crate::types::FunctionBinary;

/// Value bytes of entry `k`.
#[inline]
pub(crate) fn value(vals: &[u8], byte_size: usize, k: usize) -> &[u8] {
    &vals[k * byte_size..(k + 1) * byte_size]
}

/// Matrix coordinate packed into one sortable key.
#[inline]
pub(crate) fn pack(row: u32, col: u32) -> u64 {
    ((row as u64) << 32) | col as u64
}

#[inline]
pub(crate) fn unpack(key: u64) -> (u32, u32) {
    ((key >> 32) as u32, key as u32)
}

/// Start offset of every row in a row-sorted index array, plus the total.
///
/// The entries of row `i` are `offsets[i]..offsets[i + 1]`.
pub(crate) fn row_offsets(rows: &[u32], nrows: usize) -> Vec<usize> {
    let mut offsets = vec![0usize; nrows + 1];
    for &row in rows {
        offsets[row as usize + 1] += 1;
    }
    for i in 0..nrows {
        offsets[i + 1] += offsets[i];
    }
    offsets
}

/// Exclusive prefix sum of `counts` and the grand total.
pub(crate) fn exclusive_scan(counts: &[usize]) -> (Vec<usize>, usize) {
    let mut offsets = Vec::with_capacity(counts.len());
    let mut total = 0;
    for &count in counts {
        offsets.push(total);
        total += count;
    }
    (offsets, total)
}

/// Every (left entry, right entry) pair whose inner indices meet.
///
/// `inner[k]` is the row of the right operand that left entry `k` multiplies.
/// Pairs come out grouped by `k`, and within a group in right-operand order.
pub(crate) fn expand_products(inner: &[u32], right_offsets: &[usize]) -> Vec<(usize, usize)> {
    let right_rows = right_offsets.len().saturating_sub(1);
    let segment = |i: u32| {
        let i = i as usize;
        if i < right_rows {
            right_offsets[i]..right_offsets[i + 1]
        } else {
            0..0
        }
    };

    let counts: Vec<usize> = inner.iter().map(|&i| segment(i).len()).collect();
    let (offsets, total) = exclusive_scan(&counts);

    let mut pairs = vec![(0usize, 0usize); total];
    for (k, &i) in inner.iter().enumerate() {
        for (slot, j) in segment(i).enumerate() {
            pairs[offsets[k] + slot] = (k, j);
        }
    }
    pairs
}

/// Stable sort of keys together with their values.
pub(crate) fn sort_by_key<K: Ord + Copy>(keys: &[K], vals: &[u8], byte_size: usize) -> (Vec<K>, Vec<u8>) {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by_key(|&k| keys[k]);

    let sorted_keys = order.iter().map(|&k| keys[k]).collect();
    let mut sorted_vals = Vec::with_capacity(vals.len());
    if byte_size > 0 {
        for &k in &order {
            sorted_vals.extend_from_slice(value(vals, byte_size, k));
        }
    }
    (sorted_keys, sorted_vals)
}

/// Fold runs of equal adjacent keys into one entry with `op`.
pub(crate) fn reduce_by_key<K: Eq + Copy>(
    keys: &[K],
    vals: &[u8],
    byte_size: usize,
    op: &FunctionBinary,
) -> (Vec<K>, Vec<u8>) {
    let mut out_keys: Vec<K> = Vec::with_capacity(keys.len());
    let mut out_vals: Vec<u8> = Vec::with_capacity(vals.len());
    let mut scratch = vec![0u8; byte_size];

    for (k, &key) in keys.iter().enumerate() {
        let current = value(vals, byte_size, k);
        if out_keys.last() == Some(&key) {
            if byte_size > 0 {
                let start = out_vals.len() - byte_size;
                op.apply(&out_vals[start..], current, &mut scratch);
                out_vals[start..].copy_from_slice(&scratch);
            }
        } else {
            out_keys.push(key);
            out_vals.extend_from_slice(current);
        }
    }
    (out_keys, out_vals)
}

/// Drop adjacent duplicates, keeping the last value of each run.
pub(crate) fn dedup_last<K: Eq + Copy>(keys: &[K], vals: &[u8], byte_size: usize) -> (Vec<K>, Vec<u8>) {
    let mut out_keys: Vec<K> = Vec::with_capacity(keys.len());
    let mut out_vals: Vec<u8> = Vec::with_capacity(vals.len());

    for (k, &key) in keys.iter().enumerate() {
        let current = value(vals, byte_size, k);
        if out_keys.last() == Some(&key) {
            let start = out_vals.len() - byte_size;
            out_vals[start..].copy_from_slice(current);
        } else {
            out_keys.push(key);
            out_vals.extend_from_slice(current);
        }
    }
    (out_keys, out_vals)
}

/// Keep entries whose key is in `mask` (or not in it, when `complement`).
///
/// Both `keys` and `mask` are sorted.
pub(crate) fn apply_mask<K: Ord + Copy>(
    keys: &[K],
    vals: &[u8],
    byte_size: usize,
    mask: &[K],
    complement: bool,
) -> (Vec<K>, Vec<u8>) {
    let mut out_keys = Vec::with_capacity(keys.len());
    let mut out_vals = Vec::with_capacity(vals.len());
    let mut m = 0;

    for (k, &key) in keys.iter().enumerate() {
        while m < mask.len() && mask[m] < key {
            m += 1;
        }
        let in_mask = m < mask.len() && mask[m] == key;
        if in_mask != complement {
            out_keys.push(key);
            out_vals.extend_from_slice(value(vals, byte_size, k));
        }
    }
    (out_keys, out_vals)
}

/// Sorted union of two sorted entry lists; keys present in both are combined with
/// `op` as `op(left, right)`.
pub(crate) fn merge_union<K: Ord + Copy>(
    left: (&[K], &[u8]),
    right: (&[K], &[u8]),
    byte_size: usize,
    op: &FunctionBinary,
) -> (Vec<K>, Vec<u8>) {
    let (lk, lv) = left;
    let (rk, rv) = right;
    let mut out_keys = Vec::with_capacity(lk.len() + rk.len());
    let mut out_vals = Vec::with_capacity(lv.len() + rv.len());
    let mut scratch = vec![0u8; byte_size];
    let (mut i, mut j) = (0, 0);

    while i < lk.len() || j < rk.len() {
        let take_left = j >= rk.len() || (i < lk.len() && lk[i] < rk[j]);
        let take_right = i >= lk.len() || (j < rk.len() && rk[j] < lk[i]);

        if take_left {
            out_keys.push(lk[i]);
            out_vals.extend_from_slice(value(lv, byte_size, i));
            i += 1;
        } else if take_right {
            out_keys.push(rk[j]);
            out_vals.extend_from_slice(value(rv, byte_size, j));
            j += 1;
        } else {
            out_keys.push(lk[i]);
            if byte_size > 0 {
                op.apply(value(lv, byte_size, i), value(rv, byte_size, j), &mut scratch);
                out_vals.extend_from_slice(&scratch);
            }
            i += 1;
            j += 1;
        }
    }
    (out_keys, out_vals)
}
