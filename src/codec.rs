// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::vec::Vec;

use crate::{
    keys::KeyImage,
    parameters::TriptychParameters,
    point::{Point, COMPRESSED_POINT_BYTES},
    scalar::{Scalar, SCALAR_BYTES},
    signature::{SignatureError, TriptychSignature},
};

// Reads fixed-size fields from an encoding, in order
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, length: usize) -> Result<&'a [u8], SignatureError> {
        let end = self.offset.checked_add(length).ok_or(SignatureError::InvalidEncoding {
            reason: "field offset overflowed",
        })?;
        let field = self.bytes.get(self.offset..end).ok_or(SignatureError::InvalidEncoding {
            reason: "encoding was truncated",
        })?;
        self.offset = end;

        Ok(field)
    }

    fn read_point(&mut self) -> Result<Point, SignatureError> {
        Ok(Point::decompress(self.take(COMPRESSED_POINT_BYTES)?)?)
    }

    fn read_points(&mut self, count: usize) -> Result<Vec<Point>, SignatureError> {
        (0..count).map(|_| self.read_point()).collect()
    }

    fn read_scalar(&mut self) -> Result<Scalar, SignatureError> {
        let mut bytes = [0u8; SCALAR_BYTES];
        bytes.copy_from_slice(self.take(SCALAR_BYTES)?);

        Ok(Scalar::from_bytes_mod_order(&bytes))
    }
}

impl TriptychSignature {
    /// Get the length in bytes of the raw encoding of a [`TriptychSignature`] for [`TriptychParameters`] `params`.
    ///
    /// This is `4*33 + 2*m*33 + m*(n - 1)*32 + 3*32`; the key image is not included.
    pub fn serialized_len(params: &TriptychParameters) -> usize {
        let n = params.get_n() as usize;
        let m = params.get_m() as usize;

        // This can't overflow since `n*m` is bounded by the parameters
        (4 + 2 * m) * COMPRESSED_POINT_BYTES + (m * (n - 1) + 3) * SCALAR_BYTES
    }

    /// Serialize this [`TriptychSignature`] to its raw encoding and its [`KeyImage`].
    ///
    /// The raw encoding is `A || B || C || D || X || Y || f || z_A || z_C || z`, with points compressed to 33 bytes and
    /// scalars encoded as 32 big-endian bytes. The rows of `f` are written in order.
    /// The key image is transmitted separately.
    pub fn to_bytes(&self) -> (Vec<u8>, KeyImage) {
        let f_count = self.f.iter().map(|f_row| f_row.len()).sum::<usize>();
        let mut raw = Vec::with_capacity(
            (4 + self.X.len() + self.Y.len()) * COMPRESSED_POINT_BYTES + (f_count + 3) * SCALAR_BYTES,
        );

        for point in [&self.A, &self.B, &self.C, &self.D]
            .into_iter()
            .chain(self.X.iter())
            .chain(self.Y.iter())
        {
            raw.extend_from_slice(&point.compress());
        }
        for scalar in self
            .f
            .iter()
            .flatten()
            .chain([&self.z_A, &self.z_C, &self.z])
        {
            raw.extend_from_slice(&scalar.to_bytes());
        }

        (raw, KeyImage::from_point(self.U))
    }

    /// Deserialize a [`TriptychSignature`] from its raw encoding and key image encoding.
    ///
    /// The raw encoding must have exactly the length required by the [`TriptychParameters`] `params`, every point must
    /// be a valid compressed point, and the key image must be a 33-byte compressed point other than the identity.
    /// If any of these conditions is not met, returns a [`SignatureError`]. Scalars are reduced modulo the group order.
    #[allow(non_snake_case)]
    pub fn from_bytes(params: &TriptychParameters, raw: &[u8], key_image: &[u8]) -> Result<Self, SignatureError> {
        let n = params.get_n() as usize;
        let m = params.get_m() as usize;

        let expected = Self::serialized_len(params);
        if raw.len() != expected {
            return Err(SignatureError::InvalidSerializedLength {
                expected,
                actual: raw.len(),
            });
        }
        if key_image.len() != COMPRESSED_POINT_BYTES {
            return Err(SignatureError::InvalidEncoding {
                reason: "key image must be 33 bytes",
            });
        }

        let U = Point::decompress(key_image)?;
        if U.is_identity() {
            return Err(SignatureError::InvalidEncoding {
                reason: "key image was the identity",
            });
        }

        let mut reader = Reader::new(raw);
        let A = reader.read_point()?;
        let B = reader.read_point()?;
        let C = reader.read_point()?;
        let D = reader.read_point()?;
        let X = reader.read_points(m)?;
        let Y = reader.read_points(m)?;
        let f = (0..m)
            .map(|_| (1..n).map(|_| reader.read_scalar()).collect::<Result<Vec<Scalar>, _>>())
            .collect::<Result<Vec<Vec<Scalar>>, _>>()?;
        let z_A = reader.read_scalar()?;
        let z_C = reader.read_scalar()?;
        let z = reader.read_scalar()?;

        Ok(Self {
            A,
            B,
            C,
            D,
            X,
            Y,
            f,
            z_A,
            z_C,
            z,
            U,
        })
    }

    /// Serialize this [`TriptychSignature`] to a single blob `key_image || raw`.
    pub fn to_blob(&self) -> Vec<u8> {
        let (raw, key_image) = self.to_bytes();

        let mut blob = Vec::with_capacity(COMPRESSED_POINT_BYTES + raw.len());
        blob.extend_from_slice(&key_image.to_bytes());
        blob.extend_from_slice(&raw);

        blob
    }

    /// Deserialize a [`TriptychSignature`] from a blob `key_image || raw`.
    ///
    /// See [`TriptychSignature::from_bytes`] for the requirements on each part.
    pub fn from_blob(params: &TriptychParameters, blob: &[u8]) -> Result<Self, SignatureError> {
        if blob.len() < COMPRESSED_POINT_BYTES {
            return Err(SignatureError::InvalidSerializedLength {
                expected: COMPRESSED_POINT_BYTES + Self::serialized_len(params),
                actual: blob.len(),
            });
        }
        let (key_image, raw) = blob.split_at(COMPRESSED_POINT_BYTES);

        Self::from_bytes(params, raw, key_image)
    }
}
