// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::{vec, vec::Vec};

use crate::scalar::Scalar;

/// Multiply a polynomial by the linear polynomial `a*t + b`.
///
/// Coefficients are in ascending order of degree, so the result is one element longer than the input.
pub(crate) fn multiply_linear(coefficients: &[Scalar], a: Scalar, b: Scalar) -> Vec<Scalar> {
    let mut result = vec![Scalar::ZERO; coefficients.len() + 1];
    for (i, coefficient) in coefficients.iter().enumerate() {
        result[i] = result[i] + b * *coefficient;
        result[i + 1] = result[i + 1] + a * *coefficient;
    }

    result
}

/// Serialize fixed-length bytes: as hex when the format is human-readable, and as raw bytes otherwise.
#[cfg(feature = "serde")]
pub(crate) fn serialize_bytes<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    if serializer.is_human_readable() {
        serializer.serialize_str(&hex::encode(bytes))
    } else {
        serializer.serialize_bytes(bytes)
    }
}

/// Deserialize fixed-length bytes written by [`serialize_bytes`].
#[cfg(feature = "serde")]
pub(crate) fn deserialize_bytes<'de, const N: usize, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<[u8; N], D::Error> {
    use alloc::string::String;

    use serde::{de::Error, Deserialize};

    let bytes = if deserializer.is_human_readable() {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(encoded).map_err(Error::custom)?
    } else {
        Vec::<u8>::deserialize(deserializer)?
    };

    let length = bytes.len();
    bytes
        .try_into()
        .map_err(|_| Error::invalid_length(length, &"a fixed number of bytes"))
}
