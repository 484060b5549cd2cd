// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use core::{
    fmt,
    iter::{Product, Sum},
    ops::{Add, Mul, Neg, Sub},
};

use crypto_bigint::{impl_modulus, modular::constant_mod::Residue, Encoding, U256};
use rand_core::CryptoRngCore;

impl_modulus!(
    OrderModulus,
    U256,
    "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"
);

type Inner = Residue<OrderModulus, { U256::LIMBS }>;

/// The number of bytes in an encoded [`Scalar`].
pub const SCALAR_BYTES: usize = 32;

/// An integer modulo the order of the secp256k1 group.
///
/// Scalars are encoded as 32 big-endian bytes. Arithmetic is not constant time.
#[derive(Clone, Copy)]
pub struct Scalar(Inner);

impl Scalar {
    /// The scalar `1`.
    pub const ONE: Self = Self(Inner::ONE);
    /// The scalar `0`.
    pub const ZERO: Self = Self(Inner::ZERO);

    /// Build a scalar from a small integer.
    pub fn from_u32(value: u32) -> Self {
        Self(Inner::new(&U256::from_u32(value)))
    }

    /// Interpret big-endian bytes as an integer and reduce it modulo the group order.
    pub fn from_bytes_mod_order(bytes: &[u8; SCALAR_BYTES]) -> Self {
        Self(Inner::new(&U256::from_be_slice(bytes)))
    }

    /// Get the canonical big-endian encoding of this [`Scalar`].
    pub fn to_bytes(&self) -> [u8; SCALAR_BYTES] {
        self.0.retrieve().to_be_bytes()
    }

    /// Check if this [`Scalar`] is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Generate a uniformly random nonzero [`Scalar`].
    ///
    /// This draws 32 bytes from the [`CryptoRngCore`] `rng`, reduces them, and retries if the result is zero.
    pub fn random<R: CryptoRngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SCALAR_BYTES];
        loop {
            rng.as_rngcore().fill_bytes(&mut bytes);
            let scalar = Self::from_bytes_mod_order(&bytes);
            if !scalar.is_zero() {
                return scalar;
            }
        }
    }

    /// Raise this [`Scalar`] to a small integer power.
    pub fn pow(&self, exponent: u32) -> Self {
        Self(self.0.pow(&U256::from_u32(exponent)))
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.0.retrieve() == other.0.retrieve()
    }
}

impl Eq for Scalar {}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scalar({})", hex::encode(self.to_bytes()))
    }
}

impl Add for Scalar {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Scalar {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul for Scalar {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl Neg for Scalar {
    type Output = Self;

    fn neg(self) -> Self {
        Self(Inner::ZERO - self.0)
    }
}

impl Sum for Scalar {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |sum, item| sum + item)
    }
}

impl<'a> Sum<&'a Scalar> for Scalar {
    fn sum<I: Iterator<Item = &'a Scalar>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |sum, item| sum + *item)
    }
}

impl Product for Scalar {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ONE, |product, item| product * item)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Scalar {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::util::serialize_bytes(&self.to_bytes(), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Scalar {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = crate::util::deserialize_bytes::<SCALAR_BYTES, D>(deserializer)?;

        Ok(Self::from_bytes_mod_order(&bytes))
    }
}
