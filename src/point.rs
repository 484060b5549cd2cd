// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::string::String;
use core::{
    borrow::Borrow,
    fmt,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub},
};

use snafu::prelude::*;

use crate::{field::FieldElement, scalar::Scalar};

/// The number of bytes in a compressed [`Point`].
pub const COMPRESSED_POINT_BYTES: usize = 33;

// Compression prefixes for even and odd `y`
const PREFIX_EVEN: u8 = 0x02;
const PREFIX_ODD: u8 = 0x03;

/// A point on the secp256k1 curve `y**2 = x**3 + 7`.
///
/// A point is either an affine coordinate pair or the identity (the point at infinity).
/// Points are compressed to 33 bytes: a parity prefix followed by the big-endian `x` coordinate.
/// The identity is compressed to 33 zero bytes.
///
/// None of the operations here are constant time.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Point {
    affine: Option<(FieldElement, FieldElement)>,
}

/// Errors that can arise relating to [`Point`].
#[derive(Debug, Snafu)]
pub enum PointError {
    /// A point encoding was malformed.
    #[snafu(display("A point encoding was invalid: {reason}"))]
    InvalidEncoding {
        /// The reason for the encoding error.
        reason: &'static str,
    },
    /// Decoded coordinates did not satisfy the curve equation.
    #[snafu(display("A point was not on the curve"))]
    PointNotOnCurve,
}

// The curve constant `b`
fn curve_b() -> FieldElement {
    FieldElement::from_u64(7)
}

impl Point {
    /// The identity point.
    pub fn identity() -> Self {
        Self { affine: None }
    }

    /// The standard secp256k1 generator `G`.
    pub fn generator() -> Self {
        Self {
            affine: Some((
                FieldElement::from_be_hex("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"),
                FieldElement::from_be_hex("483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"),
            )),
        }
    }

    /// Check if this [`Point`] is the identity.
    pub fn is_identity(&self) -> bool {
        self.affine.is_none()
    }

    /// Check if this [`Point`] satisfies the curve equation.
    ///
    /// The identity is considered to be on the curve.
    pub fn is_on_curve(&self) -> bool {
        match self.affine {
            None => true,
            Some((x, y)) => y.square() == x.square() * x + curve_b(),
        }
    }

    /// Recover the point with abscissa `x` whose ordinate has the requested parity.
    ///
    /// Returns `None` if `x**3 + 7` is not a quadratic residue.
    pub(crate) fn lift_x(x: FieldElement, odd: bool) -> Option<Self> {
        let y = (x.square() * x + curve_b()).sqrt()?;
        let y = if y.is_odd() == odd { y } else { -y };

        Some(Self { affine: Some((x, y)) })
    }

    /// Double this [`Point`] using the tangent formula.
    pub fn double(&self) -> Self {
        let Some((x, y)) = self.affine else {
            return Self::identity();
        };

        // The tangent is vertical
        let Some(denominator) = y.double().invert() else {
            return Self::identity();
        };

        let lambda = FieldElement::from_u64(3) * x.square() * denominator;
        let x3 = lambda.square() - x.double();
        let y3 = lambda * (x - x3) - y;

        Self { affine: Some((x3, y3)) }
    }

    /// Compress this [`Point`] to its 33-byte encoding.
    pub fn compress(&self) -> [u8; COMPRESSED_POINT_BYTES] {
        let mut bytes = [0u8; COMPRESSED_POINT_BYTES];
        if let Some((x, y)) = self.affine {
            bytes[0] = if y.is_odd() { PREFIX_ODD } else { PREFIX_EVEN };
            bytes[1..].copy_from_slice(&x.to_bytes());
        }

        bytes
    }

    /// Decompress a [`Point`] from its 33-byte encoding.
    ///
    /// The input must be exactly 33 bytes. An all-zero input is the identity. Otherwise the prefix must be `0x02` or
    /// `0x03`, and the `x` coordinate must be canonical and correspond to a curve point.
    /// If any of these conditions is not met, returns a [`PointError`].
    pub fn decompress(bytes: &[u8]) -> Result<Self, PointError> {
        let bytes: &[u8; COMPRESSED_POINT_BYTES] = bytes.try_into().map_err(|_| PointError::InvalidEncoding {
            reason: "compressed points must be 33 bytes",
        })?;

        if bytes.iter().all(|byte| *byte == 0) {
            return Ok(Self::identity());
        }

        let odd = match bytes[0] {
            PREFIX_EVEN => false,
            PREFIX_ODD => true,
            _ => {
                return Err(PointError::InvalidEncoding {
                    reason: "invalid compression prefix",
                })
            },
        };

        let mut x_bytes = [0u8; 32];
        x_bytes.copy_from_slice(&bytes[1..]);
        let x = FieldElement::from_canonical_bytes(&x_bytes).ok_or(PointError::InvalidEncoding {
            reason: "`x` coordinate was not canonical",
        })?;

        let point = Self::lift_x(x, odd).ok_or(PointError::PointNotOnCurve)?;
        if !point.is_on_curve() {
            return Err(PointError::PointNotOnCurve);
        }

        Ok(point)
    }

    /// Encode the compressed form of this [`Point`] as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.compress())
    }

    /// Decode a [`Point`] from the hex encoding of its compressed form.
    pub fn from_hex(encoded: &str) -> Result<Self, PointError> {
        let bytes = hex::decode(encoded.trim()).map_err(|_| PointError::InvalidEncoding {
            reason: "malformed hex",
        })?;

        Self::decompress(&bytes)
    }

    /// Compute a linear combination of points.
    ///
    /// Zero scalars are skipped, which does not change the result.
    /// Iteration stops when either input is exhausted.
    pub fn vartime_multiscalar_mul<I, J>(scalars: I, points: J) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<Scalar>,
        J: IntoIterator,
        J::Item: Borrow<Point>,
    {
        scalars
            .into_iter()
            .zip(points)
            .fold(JacobianPoint::IDENTITY, |sum, (scalar, point)| {
                let scalar: &Scalar = scalar.borrow();
                if scalar.is_zero() {
                    return sum;
                }

                sum.add(&JacobianPoint::from_affine(point.borrow()).mul(scalar))
            })
            .to_affine()
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({})", self.to_hex())
    }
}

impl Add for Point {
    type Output = Self;

    /// Add two points using the chord formula.
    fn add(self, other: Self) -> Self {
        let Some((x1, y1)) = self.affine else {
            return other;
        };
        let Some((x2, y2)) = other.affine else {
            return self;
        };

        if x1 == x2 {
            // Either `other == -self` or `other == self`
            if (y1 + y2).is_zero() {
                return Self::identity();
            }
            return self.double();
        }

        let Some(denominator) = (x2 - x1).invert() else {
            return Self::identity();
        };

        let lambda = (y2 - y1) * denominator;
        let x3 = lambda.square() - x1 - x2;
        let y3 = lambda * (x1 - x3) - y1;

        Self { affine: Some((x3, y3)) }
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            affine: self.affine.map(|(x, y)| (x, -y)),
        }
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self + (-other)
    }
}

impl Mul<&Point> for &Scalar {
    type Output = Point;

    /// Scalar multiplication using double-and-add from the most significant bit.
    fn mul(self, point: &Point) -> Point {
        JacobianPoint::from_affine(point).mul(self).to_affine()
    }
}

impl Mul<Point> for Scalar {
    type Output = Point;

    fn mul(self, point: Point) -> Point {
        &self * &point
    }
}

impl Sum for Point {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(JacobianPoint::IDENTITY, |sum, point| {
            sum.add(&JacobianPoint::from_affine(&point))
        })
        .to_affine()
    }
}

impl<'a> Sum<&'a Point> for Point {
    fn sum<I: Iterator<Item = &'a Point>>(iter: I) -> Self {
        iter.fold(JacobianPoint::IDENTITY, |sum, point| sum.add(&JacobianPoint::from_affine(point)))
            .to_affine()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Point {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::util::serialize_bytes(&self.compress(), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Point {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = crate::util::deserialize_bytes::<COMPRESSED_POINT_BYTES, D>(deserializer)?;

        Self::decompress(&bytes).map_err(serde::de::Error::custom)
    }
}

/// A point in Jacobian coordinates `(X, Y, Z)`, representing the affine point `(X/Z**2, Y/Z**3)`.
///
/// This avoids a field inversion per group operation; the identity has `Z == 0`.
#[derive(Clone, Copy, Debug)]
struct JacobianPoint {
    x: FieldElement,
    y: FieldElement,
    z: FieldElement,
}

impl JacobianPoint {
    const IDENTITY: Self = Self {
        x: FieldElement::ONE,
        y: FieldElement::ONE,
        z: FieldElement::ZERO,
    };

    fn from_affine(point: &Point) -> Self {
        match point.affine {
            None => Self::IDENTITY,
            Some((x, y)) => Self {
                x,
                y,
                z: FieldElement::ONE,
            },
        }
    }

    fn is_identity(&self) -> bool {
        self.z.is_zero()
    }

    fn to_affine(&self) -> Point {
        let Some(z_inverse) = self.z.invert() else {
            return Point::identity();
        };
        let z_inverse_squared = z_inverse.square();

        Point {
            affine: Some((self.x * z_inverse_squared, self.y * z_inverse_squared * z_inverse)),
        }
    }

    // Doubling formula `dbl-2009-l` for `a == 0`
    fn double(&self) -> Self {
        if self.is_identity() || self.y.is_zero() {
            return Self::IDENTITY;
        }

        let a = self.x.square();
        let b = self.y.square();
        let c = b.square();
        let d = ((self.x + b).square() - a - c).double();
        let e = a.double() + a;
        let f = e.square();

        let x = f - d.double();
        let y = e * (d - x) - c.double().double().double();
        let z = (self.y * self.z).double();

        Self { x, y, z }
    }

    // Addition formula `add-2007-bl`
    fn add(&self, other: &Self) -> Self {
        if self.is_identity() {
            return *other;
        }
        if other.is_identity() {
            return *self;
        }

        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        let u1 = self.x * z2z2;
        let u2 = other.x * z1z1;
        let s1 = self.y * other.z * z2z2;
        let s2 = other.y * self.z * z1z1;
        let h = u2 - u1;
        let r = (s2 - s1).double();

        if h.is_zero() {
            // Same abscissa: either the points are equal or they are inverses
            if r.is_zero() {
                return self.double();
            }
            return Self::IDENTITY;
        }

        let i = h.double().square();
        let j = h * i;
        let v = u1 * i;

        let x = r.square() - j - v.double();
        let y = r * (v - x) - (s1 * j).double();
        let z = ((self.z + other.z).square() - z1z1 - z2z2) * h;

        Self { x, y, z }
    }

    // Double-and-add over the canonical scalar encoding, most significant bit first
    fn mul(&self, scalar: &Scalar) -> Self {
        let mut result = Self::IDENTITY;
        for byte in scalar.to_bytes() {
            for bit in (0..8).rev() {
                result = result.double();
                if (byte >> bit) & 1 == 1 {
                    result = result.add(self);
                }
            }
        }

        result
    }
}
