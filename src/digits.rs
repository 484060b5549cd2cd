// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::{vec, vec::Vec};

/// An iterator over the base-`n` digit vectors of every ring index.
///
/// Digits are least significant first, so digit `j` of an index selects the column of row `j` in the protocol matrices.
pub struct DigitIterator {
    n: u32, // base
    m: u32, // number of digits
    // state information
    i: u32,
    digits: Vec<u32>,
}

impl DigitIterator {
    /// Generate a new digit iterator.
    ///
    /// You must provide a base `n > 1` and number of digits `m > 0` such that `n**m` does not overflow `u32`.
    /// If any of these conditions is not met, returns `None`.
    pub fn new(n: u32, m: u32) -> Option<Self> {
        // Check inputs
        if n <= 1 || m == 0 {
            return None;
        }
        n.checked_pow(m)?;

        Some(Self {
            n,
            m,
            i: 0,
            digits: vec![0; m as usize],
        })
    }

    /// Get a specific base-`n` decomposition with `m` digits, least significant first.
    ///
    /// You must provide a valid value `v < n**m` based on the supplied parameters `n` and `m`.
    /// If anything goes wrong, returns `None`.
    pub fn decompose(n: u32, m: u32, mut v: u32) -> Option<Vec<u32>> {
        if n <= 1 || m == 0 || v >= n.checked_pow(m)? {
            return None;
        }

        let mut digits = Vec::with_capacity(m as usize);
        for _ in 0..m {
            digits.push(v % n);
            v /= n;
        }

        Some(digits)
    }
}

impl Iterator for DigitIterator {
    type Item = Vec<u32>;

    /// Return the digit vector of the next index, starting from zero.
    fn next(&mut self) -> Option<Self::Item> {
        // We have iterated over all indexes
        if self.i == self.n.checked_pow(self.m)? {
            return None;
        }

        let current = self.digits.clone();

        // Increment with carry
        for digit in &mut self.digits {
            *digit += 1;
            if *digit < self.n {
                break;
            }
            *digit = 0;
        }
        self.i += 1;

        Some(current)
    }
}
