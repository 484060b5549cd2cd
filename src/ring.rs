// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::{collections::BTreeSet, string::String, sync::Arc, vec::Vec};

use rand_core::CryptoRngCore;
use snafu::prelude::*;

use crate::{
    keys::KeyPair,
    parameters::TriptychParameters,
    point::{Point, PointError, COMPRESSED_POINT_BYTES},
};

/// A ring of public keys.
///
/// A ring is an ordered list of distinct public keys, none of which is the identity.
/// Order matters: a signature only verifies against the ring in the exact order used when signing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ring {
    keys: Arc<Vec<Point>>,
}

/// Errors that can arise relating to [`Ring`].
#[derive(Debug, Snafu)]
pub enum RingError {
    /// An invalid parameter was provided.
    #[snafu(display("An invalid parameter was provided: {reason}"))]
    InvalidParameter {
        /// The reason for the parameter error.
        reason: &'static str,
    },
    /// A public key encoding was malformed.
    #[snafu(display("A public key encoding was invalid: {reason}"))]
    InvalidEncoding {
        /// The reason for the encoding error.
        reason: &'static str,
    },
    /// A public key was not on the curve.
    #[snafu(display("A public key was not on the curve"))]
    PointNotOnCurve,
}

impl From<PointError> for RingError {
    fn from(error: PointError) -> Self {
        match error {
            PointError::InvalidEncoding { reason } => Self::InvalidEncoding { reason },
            PointError::PointNotOnCurve => Self::PointNotOnCurve,
        }
    }
}

impl Ring {
    /// Generate a new [`Ring`] from a slice of public keys.
    ///
    /// The slice must be nonempty, must not contain the identity, and must not contain any key more than once.
    /// If any of these conditions is not met, returns a [`RingError`].
    pub fn new(keys: &[Point]) -> Result<Self, RingError> {
        if keys.is_empty() {
            return Err(RingError::InvalidParameter {
                reason: "ring was empty",
            });
        }
        if keys.iter().any(|key| key.is_identity()) {
            return Err(RingError::InvalidParameter {
                reason: "ring contained the identity",
            });
        }

        // Keys are distinct exactly when their encodings are
        let encodings = keys
            .iter()
            .map(|key| key.compress())
            .collect::<BTreeSet<[u8; COMPRESSED_POINT_BYTES]>>();
        if encodings.len() != keys.len() {
            return Err(RingError::InvalidParameter {
                reason: "ring contained a duplicate key",
            });
        }

        Ok(Self {
            keys: Arc::new(keys.to_vec()),
        })
    }

    /// Generate a new [`Ring`] from hex-encoded compressed public keys, one per item.
    ///
    /// Surrounding whitespace is ignored, as are empty items.
    pub fn from_hex<I, S>(encoded: I) -> Result<Self, RingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = encoded
            .into_iter()
            .filter(|item| !item.as_ref().trim().is_empty())
            .map(|item| Point::from_hex(item.as_ref()))
            .collect::<Result<Vec<Point>, PointError>>()?;

        Self::new(&keys)
    }

    /// Generate a new [`Ring`] of size `N` for the [`TriptychParameters`] `params` that contains `public_key` at a
    /// random position.
    ///
    /// All other keys are public keys of freshly generated random key pairs.
    pub fn random_with_signer<R: CryptoRngCore>(
        params: &TriptychParameters,
        public_key: &Point,
        rng: &mut R,
    ) -> Result<Self, RingError> {
        let mut keys = (1..params.get_N())
            .map(|_| *KeyPair::random(rng).get_public_key())
            .collect::<Vec<Point>>();
        keys.push(*public_key);

        Ok(Self::new(&keys)?.shuffle(rng))
    }

    /// Get the public keys of this [`Ring`].
    pub fn get_keys(&self) -> &[Point] {
        &self.keys
    }

    /// Get the number of public keys in this [`Ring`].
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if this [`Ring`] is empty, which is never the case for a constructed ring.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Find the position of `key` in this [`Ring`], comparing compressed encodings.
    pub fn position(&self, key: &Point) -> Option<usize> {
        let encoding = key.compress();

        self.keys.iter().position(|item| item.compress() == encoding)
    }

    /// Get the hex encodings of the public keys in this [`Ring`], in order.
    pub fn to_hex(&self) -> Vec<String> {
        self.keys.iter().map(|key| key.to_hex()).collect()
    }

    /// Produce a uniformly permuted copy of this [`Ring`] using a Fisher-Yates shuffle.
    pub(crate) fn shuffle<R: CryptoRngCore>(&self, rng: &mut R) -> Self {
        let mut keys = self.keys.to_vec();
        for i in (1..keys.len()).rev() {
            let j = uniform_index(rng, i + 1);
            keys.swap(i, j);
        }

        Self { keys: Arc::new(keys) }
    }
}

// Sample an index uniformly from `0..bound` by rejecting draws past the largest multiple of `bound`
#[allow(clippy::cast_possible_truncation)]
fn uniform_index<R: CryptoRngCore>(rng: &mut R, bound: usize) -> usize {
    let bound = bound as u64;
    let zone = u64::MAX - u64::MAX % bound;
    loop {
        let value = rng.as_rngcore().next_u64();
        if value < zone {
            // This can't truncate since the result is less than `bound`
            return (value % bound) as usize;
        }
    }
}
