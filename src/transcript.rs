// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::vec::Vec;

use sha2::{Digest, Sha256};

use crate::{point::Point, ring::Ring, scalar::Scalar, signature::SignatureError};

/// A Triptych signature transcript.
///
/// The Fiat-Shamir challenge is `SHA-256(A || B || C || D || X || Y || ring || message)` reduced modulo the group
/// order, with every point in compressed form and no other framing.
pub(crate) struct SignatureTranscript<'a> {
    ring: &'a Ring,
    message: &'a [u8],
}

impl<'a> SignatureTranscript<'a> {
    /// Initialize a transcript for a ring and message.
    pub(crate) fn new(ring: &'a Ring, message: &'a [u8]) -> Self {
        Self { ring, message }
    }

    /// Run the Fiat-Shamir commitment phase and produce challenge powers `x**0, ..., x**m`.
    #[allow(non_snake_case)]
    pub(crate) fn commit(
        &self,
        A: &Point,
        B: &Point,
        C: &Point,
        D: &Point,
        X: &[Point],
        Y: &[Point],
    ) -> Result<Vec<Scalar>, SignatureError> {
        let m = X.len();

        let mut hasher = Sha256::new();
        hasher.update(A.compress());
        hasher.update(B.compress());
        hasher.update(C.compress());
        hasher.update(D.compress());
        for X_item in X {
            hasher.update(X_item.compress());
        }
        for Y_item in Y {
            hasher.update(Y_item.compress());
        }
        for key in self.ring.get_keys() {
            hasher.update(key.compress());
        }
        hasher.update(self.message);

        let mut x_bytes = [0u8; 32];
        x_bytes.copy_from_slice(&hasher.finalize());
        let x = Scalar::from_bytes_mod_order(&x_bytes);

        // Get powers of the challenge and confirm they are nonzero
        let mut x_powers = Vec::with_capacity(m + 1);
        let mut x_power = Scalar::ONE;
        for _ in 0..=m {
            if x_power.is_zero() {
                return Err(SignatureError::InvalidChallenge);
            }

            x_powers.push(x_power);
            x_power = x_power * x;
        }

        Ok(x_powers)
    }
}
