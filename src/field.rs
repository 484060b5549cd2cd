// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use core::{
    fmt,
    ops::{Add, Mul, Neg, Sub},
};

use crypto_bigint::{impl_modulus, modular::constant_mod::Residue, Encoding, U256};

impl_modulus!(
    FieldModulus,
    U256,
    "fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f"
);

type Inner = Residue<FieldModulus, { U256::LIMBS }>;

/// An element of the secp256k1 base field.
///
/// Arithmetic is performed in Montgomery form and is not constant time.
#[derive(Clone, Copy)]
pub(crate) struct FieldElement(Inner);

impl FieldElement {
    pub(crate) const ONE: Self = Self(Inner::ONE);
    // `p - 2`, the inversion exponent
    const P_MINUS_TWO: U256 = U256::from_be_hex("fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2d");
    // `(p + 1) / 4`, the square root exponent; valid since `p = 3 mod 4`
    const SQRT_EXPONENT: U256 = U256::from_be_hex("3fffffffffffffffffffffffffffffffffffffffffffffffffffffffbfffff0c");
    pub(crate) const ZERO: Self = Self(Inner::ZERO);

    /// Build a field element from a small integer.
    pub(crate) fn from_u64(value: u64) -> Self {
        Self(Inner::new(&U256::from_u64(value)))
    }

    /// Build a field element from a big-endian hex constant.
    pub(crate) fn from_be_hex(hex: &str) -> Self {
        Self(Inner::new(&U256::from_be_hex(hex)))
    }

    /// Interpret big-endian bytes as an integer and reduce it modulo `p`.
    pub(crate) fn from_bytes_mod_order(bytes: &[u8; 32]) -> Self {
        Self(Inner::new(&U256::from_be_slice(bytes)))
    }

    /// Interpret big-endian bytes as a field element, returning `None` if the integer is not below `p`.
    pub(crate) fn from_canonical_bytes(bytes: &[u8; 32]) -> Option<Self> {
        let value = U256::from_be_slice(bytes);
        let element = Self(Inner::new(&value));

        (element.0.retrieve() == value).then_some(element)
    }

    /// Get the canonical big-endian encoding.
    pub(crate) fn to_bytes(self) -> [u8; 32] {
        self.0.retrieve().to_be_bytes()
    }

    pub(crate) fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// The parity of the canonical integer representation.
    pub(crate) fn is_odd(self) -> bool {
        self.to_bytes()[31] & 1 == 1
    }

    pub(crate) fn square(self) -> Self {
        self * self
    }

    pub(crate) fn double(self) -> Self {
        self + self
    }

    /// Compute the multiplicative inverse using Fermat's little theorem.
    ///
    /// Returns `None` for zero.
    pub(crate) fn invert(self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }

        Some(Self(self.0.pow(&Self::P_MINUS_TWO)))
    }

    /// Compute a square root, if one exists.
    ///
    /// The candidate `self**((p + 1)/4)` is checked by squaring, so this returns `None` for quadratic non-residues.
    /// Which of the two roots is returned is unspecified; callers select by parity.
    pub(crate) fn sqrt(self) -> Option<Self> {
        let root = Self(self.0.pow(&Self::SQRT_EXPONENT));

        (root.square() == self).then_some(root)
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &Self) -> bool {
        self.0.retrieve() == other.0.retrieve()
    }
}

impl Eq for FieldElement {}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", hex::encode(self.to_bytes()))
    }
}

impl Add for FieldElement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for FieldElement {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul for FieldElement {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl Neg for FieldElement {
    type Output = Self;

    fn neg(self) -> Self {
        Self(Inner::ZERO - self.0)
    }
}

#[cfg(test)]
mod test {
    use super::FieldElement;

    // The field modulus as big-endian bytes
    const P_BYTES: [u8; 32] = [
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe, 0xff, 0xff, 0xfc, 0x2f,
    ];

    #[test]
    fn test_reduction() {
        // `p` reduces to zero but is not canonical
        assert!(FieldElement::from_bytes_mod_order(&P_BYTES).is_zero());
        assert!(FieldElement::from_canonical_bytes(&P_BYTES).is_none());

        // `p + 1` reduces to one
        let mut bytes = P_BYTES;
        bytes[31] = 0x30;
        assert_eq!(FieldElement::from_bytes_mod_order(&bytes), FieldElement::ONE);

        // `p - 1` is canonical and even
        let mut bytes = P_BYTES;
        bytes[31] = 0x2e;
        let element = FieldElement::from_canonical_bytes(&bytes).unwrap();
        assert_eq!(element, -FieldElement::ONE);
        assert!(!element.is_odd());
        assert_eq!(element.to_bytes(), bytes);
    }

    #[test]
    fn test_inversion() {
        assert!(FieldElement::ZERO.invert().is_none());

        for value in [1u64, 2, 7, 0xdead_beef] {
            let element = FieldElement::from_u64(value);
            assert_eq!(element * element.invert().unwrap(), FieldElement::ONE);
        }
    }

    #[test]
    fn test_sqrt() {
        // Square roots of squares exist and square back
        for value in [0u64, 1, 2, 3, 4, 9, 12345] {
            let square = FieldElement::from_u64(value).square();
            let root = square.sqrt().unwrap();
            assert_eq!(root.square(), square);
            assert!(root == FieldElement::from_u64(value) || root == -FieldElement::from_u64(value));
        }

        // `-1` is a non-residue since `p = 3 mod 4`
        assert!((-FieldElement::ONE).sqrt().is_none());
    }
}
