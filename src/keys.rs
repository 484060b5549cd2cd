// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::string::String;
use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use rand_core::CryptoRngCore;
use snafu::prelude::*;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{
    parameters::TriptychParameters,
    point::{Point, COMPRESSED_POINT_BYTES},
    scalar::{Scalar, SCALAR_BYTES},
};

/// A secret signing key.
///
/// The key is held as 32 big-endian bytes, interpreted as a scalar reduced modulo the group order.
/// The reduced scalar is always nonzero. Key bytes are zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; SCALAR_BYTES],
}

/// Errors that can arise relating to keys.
#[derive(Debug, Snafu)]
pub enum KeyError {
    /// A key encoding was malformed.
    #[snafu(display("A key encoding was invalid: {reason}"))]
    InvalidEncoding {
        /// The reason for the encoding error.
        reason: &'static str,
    },
}

impl SecretKey {
    /// Build a [`SecretKey`] from its 32-byte encoding.
    ///
    /// The input must be exactly 32 bytes, and must not reduce to zero modulo the group order.
    /// If either of these conditions is not met, returns a [`KeyError`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; SCALAR_BYTES] = bytes.try_into().map_err(|_| KeyError::InvalidEncoding {
            reason: "secret keys must be 32 bytes",
        })?;
        let key = Self { bytes };

        if key.to_scalar().is_zero() {
            return Err(KeyError::InvalidEncoding {
                reason: "secret key was zero",
            });
        }

        Ok(key)
    }

    /// Build a [`SecretKey`] from the hex encoding of its 32 bytes.
    pub fn from_hex(encoded: &str) -> Result<Self, KeyError> {
        let mut bytes = Zeroizing::new([0u8; SCALAR_BYTES]);
        hex::decode_to_slice(encoded.trim(), &mut bytes[..]).map_err(|_| KeyError::InvalidEncoding {
            reason: "malformed hex",
        })?;

        Self::from_bytes(&bytes[..])
    }

    /// Generate a random [`SecretKey`] using the [`CryptoRngCore`] `rng`.
    pub fn random<R: CryptoRngCore>(rng: &mut R) -> Self {
        Self {
            bytes: Scalar::random(rng).to_bytes(),
        }
    }

    /// Get the encoded bytes of this [`SecretKey`].
    pub fn as_bytes(&self) -> &[u8; SCALAR_BYTES] {
        &self.bytes
    }

    /// Get the hex encoding of this [`SecretKey`].
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.bytes))
    }

    /// Get the scalar value of this [`SecretKey`].
    pub(crate) fn to_scalar(&self) -> Scalar {
        Scalar::from_bytes_mod_order(&self.bytes)
    }

    /// Compute the public key `sk*G` for this [`SecretKey`].
    pub fn public_key(&self) -> Point {
        self.to_scalar() * Point::generator()
    }

    /// Compute the key image `sk*J` for this [`SecretKey`].
    ///
    /// The key image depends only on the secret key, so two signatures sharing a key image were produced with the same
    /// key.
    pub fn compute_key_image(&self, params: &TriptychParameters) -> KeyImage {
        KeyImage::from_point(self.to_scalar() * *params.get_J())
    }
}

/// A secret key together with its public key.
#[derive(Clone)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: Point,
}

impl KeyPair {
    /// Build a [`KeyPair`] from an existing [`SecretKey`].
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = secret_key.public_key();

        Self { secret_key, public_key }
    }

    /// Generate a random [`KeyPair`] using the [`CryptoRngCore`] `rng`.
    pub fn random<R: CryptoRngCore>(rng: &mut R) -> Self {
        Self::from_secret_key(SecretKey::random(rng))
    }

    /// Generate a random [`KeyPair`] using the operating system's random number generator.
    #[cfg(feature = "rand")]
    pub fn generate() -> Self {
        use rand_core::OsRng;

        Self::random(&mut OsRng)
    }

    /// Get the [`SecretKey`] from this [`KeyPair`].
    pub fn get_secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Get the public key from this [`KeyPair`].
    pub fn get_public_key(&self) -> &Point {
        &self.public_key
    }
}

/// A key image: the compressed point `sk*J` revealed by a signature.
///
/// Verifiers record key images to detect when the same secret key has signed twice.
/// Key images compare, order, and hash by their compressed encoding.
#[derive(Clone, Copy)]
pub struct KeyImage(Point);

impl KeyImage {
    pub(crate) fn from_point(point: Point) -> Self {
        Self(point)
    }

    /// Decode a [`KeyImage`] from its 33-byte compressed encoding.
    ///
    /// The encoding must be a valid compressed point other than the identity; otherwise returns a [`KeyError`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let point = Point::decompress(bytes).map_err(|_| KeyError::InvalidEncoding {
            reason: "key image was not a valid point",
        })?;
        if point.is_identity() {
            return Err(KeyError::InvalidEncoding {
                reason: "key image was the identity",
            });
        }

        Ok(Self(point))
    }

    /// Decode a [`KeyImage`] from the hex encoding of its compressed form.
    pub fn from_hex(encoded: &str) -> Result<Self, KeyError> {
        let mut bytes = [0u8; COMPRESSED_POINT_BYTES];
        hex::decode_to_slice(encoded.trim(), &mut bytes).map_err(|_| KeyError::InvalidEncoding {
            reason: "malformed hex",
        })?;

        Self::from_bytes(&bytes)
    }

    /// Get the 33-byte compressed encoding of this [`KeyImage`].
    pub fn to_bytes(&self) -> [u8; COMPRESSED_POINT_BYTES] {
        self.0.compress()
    }

    /// Get the hex encoding of this [`KeyImage`].
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// Get the underlying point of this [`KeyImage`].
    pub fn to_point(&self) -> Point {
        self.0
    }
}

impl PartialEq for KeyImage {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for KeyImage {}

impl PartialOrd for KeyImage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyImage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl Hash for KeyImage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl fmt::Debug for KeyImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyImage({})", self.to_hex())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for KeyImage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::util::serialize_bytes(&self.to_bytes(), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for KeyImage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = crate::util::deserialize_bytes::<COMPRESSED_POINT_BYTES, D>(deserializer)?;

        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use alloc::collections::BTreeSet;

    use rand_chacha::ChaCha12Rng;
    use rand_core::SeedableRng;

    use super::*;

    #[test]
    fn test_key_pair() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);

        for _ in 0..4 {
            let key_pair = KeyPair::random(&mut rng);
            let public_key = *key_pair.get_public_key();

            assert_eq!(public_key, key_pair.get_secret_key().to_scalar() * Point::generator());
            assert_eq!(Point::decompress(&public_key.compress()).unwrap(), public_key);
            assert!(!public_key.is_identity());
        }
    }

    #[test]
    fn test_secret_key_encoding() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let secret_key = SecretKey::random(&mut rng);

        // Round trips
        let decoded = SecretKey::from_bytes(secret_key.as_bytes()).unwrap();
        assert_eq!(decoded.public_key(), secret_key.public_key());
        let decoded = SecretKey::from_hex(&secret_key.to_hex()).unwrap();
        assert_eq!(decoded.as_bytes(), secret_key.as_bytes());

        // Bad lengths
        assert!(SecretKey::from_bytes(&[1u8; 31]).is_err());
        assert!(SecretKey::from_bytes(&[1u8; 33]).is_err());
        assert!(SecretKey::from_hex("0102").is_err());
        assert!(SecretKey::from_hex("not hex").is_err());

        // Keys that reduce to zero
        assert!(SecretKey::from_bytes(&[0u8; 32]).is_err());
        assert!(
            SecretKey::from_hex("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141").is_err()
        );

        // Keys at or above the group order are reduced
        let one = SecretKey::from_hex("0000000000000000000000000000000000000000000000000000000000000001").unwrap();
        let wrapped =
            SecretKey::from_hex("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364142").unwrap();
        assert_eq!(one.public_key(), Point::generator());
        assert_eq!(wrapped.public_key(), Point::generator());
    }

    #[test]
    fn test_key_image() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let params = TriptychParameters::new(2, 2).unwrap();
        let other_params = TriptychParameters::new(3, 2).unwrap();

        let secret_key = SecretKey::random(&mut rng);
        let key_image = secret_key.compute_key_image(&params);

        // Key images depend only on the secret key
        assert_eq!(key_image, secret_key.compute_key_image(&other_params));
        assert_ne!(key_image, SecretKey::random(&mut rng).compute_key_image(&params));

        // Distinct secret keys produce distinct key images
        let key_images = (0..16)
            .map(|_| SecretKey::random(&mut rng).compute_key_image(&params))
            .collect::<BTreeSet<KeyImage>>();
        assert_eq!(key_images.len(), 16);

        // Encodings
        assert_eq!(KeyImage::from_bytes(&key_image.to_bytes()).unwrap(), key_image);
        assert_eq!(KeyImage::from_hex(&key_image.to_hex()).unwrap(), key_image);
        assert_eq!(key_image.to_point(), secret_key.to_scalar() * *params.get_J());

        // Invalid encodings
        assert!(KeyImage::from_bytes(&[0u8; COMPRESSED_POINT_BYTES]).is_err());
        assert!(KeyImage::from_bytes(&key_image.to_bytes()[..32]).is_err());
        assert!(KeyImage::from_hex("zz").is_err());
    }
}
