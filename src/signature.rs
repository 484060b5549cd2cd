// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::{vec, vec::Vec};
use core::iter::once;

use itertools::izip;
use rand_core::CryptoRngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use tracing::{debug, trace};

use crate::{
    digits::DigitIterator,
    keys::{KeyImage, SecretKey},
    parameters::{ParameterError, TriptychParameters},
    point::{Point, PointError},
    ring::Ring,
    scalar::Scalar,
    transcript::SignatureTranscript,
    util::multiply_linear,
};

/// A Triptych linkable ring signature.
///
/// A signature proves that its signer knew the secret key for one public key in a [`Ring`], without revealing which,
/// and binds a message. It carries the signer's [`KeyImage`]; any two valid signatures with the same key image were
/// produced with the same secret key.
#[allow(non_snake_case)]
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct TriptychSignature {
    pub(crate) A: Point,
    pub(crate) B: Point,
    pub(crate) C: Point,
    pub(crate) D: Point,
    pub(crate) X: Vec<Point>,
    pub(crate) Y: Vec<Point>,
    pub(crate) f: Vec<Vec<Scalar>>,
    pub(crate) z_A: Scalar,
    pub(crate) z_C: Scalar,
    pub(crate) z: Scalar,
    pub(crate) U: Point,
}

/// Errors that can arise relating to [`TriptychSignature`].
#[derive(Debug, Snafu)]
pub enum SignatureError {
    /// An invalid parameter was provided.
    #[snafu(display("An invalid parameter was provided: {reason}"))]
    InvalidParameter {
        /// The reason for the parameter error.
        reason: &'static str,
    },
    /// The ring size did not match the parameters.
    #[snafu(display("The ring size was {actual}, but the parameters require {expected}"))]
    RingSizeMismatch {
        /// The ring size required by the parameters.
        expected: usize,
        /// The ring size provided.
        actual: usize,
    },
    /// The signer's public key was not in the ring.
    #[snafu(display("The signer's public key was not in the ring"))]
    SignerNotInRing,
    /// A signature encoding was malformed.
    #[snafu(display("A signature encoding was invalid: {reason}"))]
    InvalidEncoding {
        /// The reason for the encoding error.
        reason: &'static str,
    },
    /// A point in a signature encoding was not on the curve.
    #[snafu(display("A signature point was not on the curve"))]
    PointNotOnCurve,
    /// A signature encoding had the wrong length.
    #[snafu(display("The serialized signature was {actual} bytes, but {expected} bytes were expected"))]
    InvalidSerializedLength {
        /// The length required by the parameters.
        expected: usize,
        /// The length provided.
        actual: usize,
    },
    /// A transcript challenge was invalid.
    #[snafu(display("A transcript challenge was invalid"))]
    InvalidChallenge,
}

impl From<PointError> for SignatureError {
    fn from(error: PointError) -> Self {
        match error {
            PointError::InvalidEncoding { reason } => Self::InvalidEncoding { reason },
            PointError::PointNotOnCurve => Self::PointNotOnCurve,
        }
    }
}

impl From<ParameterError> for SignatureError {
    fn from(error: ParameterError) -> Self {
        match error {
            ParameterError::InvalidParameter { reason } => Self::InvalidParameter { reason },
        }
    }
}

impl TriptychSignature {
    /// Generate a Triptych [`TriptychSignature`] on `message` using the operating system's random number generator.
    ///
    /// See [`TriptychSignature::sign_with_rng`] for details.
    #[cfg(feature = "rand")]
    pub fn sign(
        params: &TriptychParameters,
        secret_key: &SecretKey,
        message: &[u8],
        ring: &Ring,
    ) -> Result<(Self, Ring), SignatureError> {
        use rand_core::OsRng;

        Self::sign_with_rng(params, secret_key, message, ring, &mut OsRng)
    }

    /// Generate a Triptych [`TriptychSignature`] on `message` using a supplied [`CryptoRngCore`] `rng`.
    ///
    /// The [`Ring`] must have the size `N` required by the [`TriptychParameters`] `params`, and must contain the public
    /// key of `secret_key`. If either of these conditions is not met, returns a [`SignatureError`].
    ///
    /// The ring is randomly permuted before signing. The permuted ring is returned alongside the signature, and
    /// verification requires exactly this ring.
    #[allow(clippy::too_many_lines, non_snake_case)]
    pub fn sign_with_rng<R: CryptoRngCore>(
        params: &TriptychParameters,
        secret_key: &SecretKey,
        message: &[u8],
        ring: &Ring,
        rng: &mut R,
    ) -> Result<(Self, Ring), SignatureError> {
        let n = params.get_n();
        let m = params.get_m();
        let N = params.get_N() as usize;

        // Check the ring size and signer membership
        if ring.len() != N {
            return Err(SignatureError::RingSizeMismatch {
                expected: N,
                actual: ring.len(),
            });
        }
        let public_key = secret_key.public_key();
        if ring.position(&public_key).is_none() {
            return Err(SignatureError::SignerNotInRing);
        }

        // Hide the signer's position
        let ring = ring.shuffle(rng);
        let l = ring.position(&public_key).ok_or(SignatureError::SignerNotInRing)?;
        let l_decomposed = u32::try_from(l)
            .ok()
            .and_then(|l| DigitIterator::decompose(n, m, l))
            .ok_or(SignatureError::InvalidParameter {
                reason: "signer index could not be decomposed",
            })?;

        trace!(n, m, ring_size = N, "signing");

        // Commit to a random matrix whose rows sum to zero
        let mut a = (0..m)
            .map(|_| (0..n).map(|_| Scalar::random(rng)).collect::<Vec<Scalar>>())
            .collect::<Vec<Vec<Scalar>>>();
        for row in &mut a {
            row[0] = -row.iter().skip(1).sum::<Scalar>();
        }
        let r_A = Scalar::random(rng);
        let A = params.commit_matrix(&a, &r_A)?;

        // Commit to the signer index digits
        let sigma = l_decomposed
            .iter()
            .map(|l_j| {
                (0..n)
                    .map(|i| if i == *l_j { Scalar::ONE } else { Scalar::ZERO })
                    .collect::<Vec<Scalar>>()
            })
            .collect::<Vec<Vec<Scalar>>>();
        let r_B = Scalar::random(rng);
        let B = params.commit_matrix(&sigma, &r_B)?;

        let a_sigma = izip!(a.iter(), sigma.iter())
            .map(|(a_row, sigma_row)| {
                izip!(a_row.iter(), sigma_row.iter())
                    .map(|(a, sigma)| *a * (Scalar::ONE - *sigma - *sigma))
                    .collect::<Vec<Scalar>>()
            })
            .collect::<Vec<Vec<Scalar>>>();
        let r_C = Scalar::random(rng);
        let C = params.commit_matrix(&a_sigma, &r_C)?;

        let a_square = a
            .iter()
            .map(|row| row.iter().map(|a| -(*a * *a)).collect::<Vec<Scalar>>())
            .collect::<Vec<Vec<Scalar>>>();
        let r_D = Scalar::random(rng);
        let D = params.commit_matrix(&a_square, &r_D)?;

        // Compute the polynomial coefficients for every ring index, in ascending order of degree
        let mut p = Vec::with_capacity(N);
        for k_decomposed in DigitIterator::new(n, m).ok_or(SignatureError::InvalidParameter {
            reason: "ring indexes could not be decomposed",
        })? {
            let mut coefficients = vec![Scalar::ONE];
            for (j, k_j) in k_decomposed.iter().enumerate() {
                coefficients = multiply_linear(&coefficients, sigma[j][*k_j as usize], a[j][*k_j as usize]);
            }
            p.push(coefficients);
        }

        // Mask the ring and key image commitments
        let rho = (0..m).map(|_| Scalar::random(rng)).collect::<Vec<Scalar>>();
        let X = rho
            .iter()
            .enumerate()
            .map(|(j, rho)| {
                Point::vartime_multiscalar_mul(
                    p.iter().map(|p_k| p_k[j]).chain(once(*rho)),
                    ring.get_keys().iter().chain(once(params.get_G())),
                )
            })
            .collect::<Vec<Point>>();
        let Y = rho.iter().map(|rho| rho * params.get_J()).collect::<Vec<Point>>();

        // Run the Fiat-Shamir commitment phase to get the challenge powers
        let x_powers = SignatureTranscript::new(&ring, message).commit(&A, &B, &C, &D, &X, &Y)?;
        let x = x_powers[1];

        // Compute the responses, dropping the first column of `f` since the verifier can recover it
        let f = izip!(sigma.iter(), a.iter())
            .map(|(sigma_row, a_row)| {
                izip!(sigma_row.iter(), a_row.iter())
                    .skip(1)
                    .map(|(sigma, a)| *sigma * x + *a)
                    .collect::<Vec<Scalar>>()
            })
            .collect::<Vec<Vec<Scalar>>>();
        let z_A = r_A + x * r_B;
        let z_C = x * r_C + r_D;

        let r = secret_key.to_scalar();
        let z = r * x_powers[m as usize] -
            izip!(rho.iter(), x_powers.iter())
                .map(|(rho, x_power)| *rho * *x_power)
                .sum::<Scalar>();

        let U = r * *params.get_J();

        Ok((
            Self {
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
            },
            ring,
        ))
    }

    /// Verify this [`TriptychSignature`] on `message` against a [`Ring`].
    ///
    /// The ring must be the permuted ring returned when signing.
    /// If the signature is valid, returns its [`KeyImage`], which the caller can record to detect repeated signing with
    /// the same secret key. Otherwise returns `None`; an invalid signature is not an error.
    #[allow(non_snake_case)]
    pub fn verify(&self, params: &TriptychParameters, message: &[u8], ring: &Ring) -> Option<KeyImage> {
        let n = params.get_n();
        let m = params.get_m();
        let N = params.get_N() as usize;

        // Check that the ring and signature are shaped for the parameters
        if ring.len() != N {
            debug!(expected = N, actual = ring.len(), "ring size did not match parameters");
            return None;
        }
        if self.X.len() != m as usize ||
            self.Y.len() != m as usize ||
            self.f.len() != m as usize ||
            self.f.iter().any(|f_row| f_row.len() != (n - 1) as usize)
        {
            debug!(n, m, "signature shape did not match parameters");
            return None;
        }
        if self.U.is_identity() {
            debug!("key image was the identity");
            return None;
        }

        // Run the Fiat-Shamir commitment phase to get the challenge powers
        let transcript = SignatureTranscript::new(ring, message);
        let x_powers = match transcript.commit(&self.A, &self.B, &self.C, &self.D, &self.X, &self.Y) {
            Ok(x_powers) => x_powers,
            Err(_) => {
                debug!("challenge was invalid");
                return None;
            },
        };
        let x = x_powers[1];

        // Reconstruct the first column of `f`, since each row sums to `x`
        let f = self
            .f
            .iter()
            .map(|f_row| {
                let mut full_row = Vec::with_capacity(n as usize);
                full_row.push(x - f_row.iter().sum::<Scalar>());
                full_row.extend_from_slice(f_row);
                full_row
            })
            .collect::<Vec<Vec<Scalar>>>();

        // Check the `A` and `B` commitments
        let f_commitment = params.commit_matrix(&f, &self.z_A).ok()?;
        if self.A + x * self.B != f_commitment {
            debug!("`A` and `B` commitment check failed");
            return None;
        }

        // Check the `C` and `D` commitments
        let f_product = f
            .iter()
            .map(|f_row| f_row.iter().map(|f| *f * (x - *f)).collect::<Vec<Scalar>>())
            .collect::<Vec<Vec<Scalar>>>();
        let f_product_commitment = params.commit_matrix(&f_product, &self.z_C).ok()?;
        if x * self.C + self.D != f_product_commitment {
            debug!("`C` and `D` commitment check failed");
            return None;
        }

        // Compute the `f` products for every ring index
        let f_products = DigitIterator::new(n, m)?
            .map(|k_decomposed| {
                izip!(f.iter(), k_decomposed.iter())
                    .map(|(f_row, k_j)| f_row[*k_j as usize])
                    .product::<Scalar>()
            })
            .collect::<Vec<Scalar>>();

        // Check the ring commitments
        let ring_sum = Point::vartime_multiscalar_mul(&f_products, ring.get_keys());
        let X_sum = Point::vartime_multiscalar_mul(
            x_powers.iter().take(m as usize).chain(once(&self.z)),
            self.X.iter().chain(once(params.get_G())),
        );
        if ring_sum != X_sum {
            debug!("ring commitment check failed");
            return None;
        }

        // Check the key image commitments
        let U_sum = f_products.iter().sum::<Scalar>() * self.U;
        let Y_sum = Point::vartime_multiscalar_mul(
            x_powers.iter().take(m as usize).chain(once(&self.z)),
            self.Y.iter().chain(once(params.get_J())),
        );
        if U_sum != Y_sum {
            debug!("key image commitment check failed");
            return None;
        }

        Some(KeyImage::from_point(self.U))
    }

    /// Get the [`KeyImage`] carried by this [`TriptychSignature`].
    ///
    /// This is only meaningful once the signature has been verified.
    pub fn get_key_image(&self) -> KeyImage {
        KeyImage::from_point(self.U)
    }
}

#[cfg(test)]
mod test {
    use alloc::{collections::BTreeSet, vec, vec::Vec};

    use rand_chacha::ChaCha12Rng;
    use rand_core::SeedableRng;

    use super::*;
    use crate::keys::KeyPair;

    // Generate parameters, key pairs, and a ring of their public keys
    fn generate_data(n: u32, m: u32, rng: &mut ChaCha12Rng) -> (TriptychParameters, Vec<KeyPair>, Ring) {
        let params = TriptychParameters::new(n, m).unwrap();
        let key_pairs = (0..params.get_N())
            .map(|_| KeyPair::random(rng))
            .collect::<Vec<KeyPair>>();
        let ring = Ring::new(
            &key_pairs
                .iter()
                .map(|key_pair| *key_pair.get_public_key())
                .collect::<Vec<Point>>(),
        )
        .unwrap();

        (params, key_pairs, ring)
    }

    // Flip the lowest bit of a scalar's encoding
    fn flip_bit(scalar: &Scalar) -> Scalar {
        let mut bytes = scalar.to_bytes();
        bytes[31] ^= 1;
        Scalar::from_bytes_mod_order(&bytes)
    }

    #[test]
    fn test_sign_verify() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let (params, key_pairs, ring) = generate_data(2, 3, &mut rng);
        let secret_key = key_pairs[3].get_secret_key();
        let message = b"ballot for candidate 7";

        let (signature, ring_used) =
            TriptychSignature::sign_with_rng(&params, secret_key, message, &ring, &mut rng).unwrap();

        // The signature verifies against the ring used for signing, and produces the key image
        assert_eq!(
            signature.verify(&params, message, &ring_used),
            Some(secret_key.compute_key_image(&params))
        );
        assert_eq!(signature.get_key_image(), secret_key.compute_key_image(&params));

        // The ring used is a permutation of the original ring
        assert_eq!(ring_used.len(), ring.len());
        for key in ring.get_keys() {
            assert!(ring_used.position(key).is_some());
        }

        // Flipping a bit in a response fails verification
        let mut evil = signature.clone();
        evil.f[0][0] = flip_bit(&evil.f[0][0]);
        assert!(evil.verify(&params, message, &ring_used).is_none());
    }

    #[test]
    fn test_sign_verify_shapes() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);

        // The smallest ring, a ternary ring, and a wider single-digit ring
        for (n, m) in [(2, 1), (3, 2), (4, 1)] {
            let (params, key_pairs, ring) = generate_data(n, m, &mut rng);
            let secret_key = key_pairs.last().unwrap().get_secret_key();

            let (signature, ring_used) =
                TriptychSignature::sign_with_rng(&params, secret_key, b"message", &ring, &mut rng).unwrap();
            assert_eq!(signature.X.len(), m as usize);
            assert_eq!(signature.f[0].len(), (n - 1) as usize);
            assert!(signature.verify(&params, b"message", &ring_used).is_some());
        }
    }

    #[test]
    #[allow(non_snake_case)]
    fn test_evil_signature() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let (params, key_pairs, ring) = generate_data(2, 2, &mut rng);
        let message = b"message";

        let (signature, ring_used) =
            TriptychSignature::sign_with_rng(&params, key_pairs[0].get_secret_key(), message, &ring, &mut rng)
                .unwrap();
        assert!(signature.verify(&params, message, &ring_used).is_some());

        let G = *params.get_G();
        let mut evil_signatures = Vec::new();

        let mut evil = signature.clone();
        evil.A = evil.A + G;
        evil_signatures.push(evil);
        let mut evil = signature.clone();
        evil.B = evil.B + G;
        evil_signatures.push(evil);
        let mut evil = signature.clone();
        evil.C = evil.C + G;
        evil_signatures.push(evil);
        let mut evil = signature.clone();
        evil.D = evil.D + G;
        evil_signatures.push(evil);
        let mut evil = signature.clone();
        evil.X[1] = evil.X[1] + G;
        evil_signatures.push(evil);
        let mut evil = signature.clone();
        evil.Y[0] = evil.Y[0] + G;
        evil_signatures.push(evil);
        let mut evil = signature.clone();
        evil.f[1][0] = flip_bit(&evil.f[1][0]);
        evil_signatures.push(evil);
        let mut evil = signature.clone();
        evil.z_A = flip_bit(&evil.z_A);
        evil_signatures.push(evil);
        let mut evil = signature.clone();
        evil.z_C = flip_bit(&evil.z_C);
        evil_signatures.push(evil);
        let mut evil = signature.clone();
        evil.z = flip_bit(&evil.z);
        evil_signatures.push(evil);
        let mut evil = signature.clone();
        evil.U = evil.U + G;
        evil_signatures.push(evil);
        let mut evil = signature.clone();
        evil.U = Point::identity();
        evil_signatures.push(evil);

        for evil in evil_signatures {
            assert!(evil.verify(&params, message, &ring_used).is_none());
        }

        // A different message fails
        assert!(signature.verify(&params, b"massage", &ring_used).is_none());

        // A reordered ring fails
        let mut keys = ring_used.get_keys().to_vec();
        keys.swap(0, 1);
        assert!(signature.verify(&params, message, &Ring::new(&keys).unwrap()).is_none());

        // A ring with a substituted key fails
        let mut keys = ring_used.get_keys().to_vec();
        keys[2] = *KeyPair::random(&mut rng).get_public_key();
        assert!(signature.verify(&params, message, &Ring::new(&keys).unwrap()).is_none());
    }

    #[test]
    fn test_shape_mismatch() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let (params, key_pairs, ring) = generate_data(2, 2, &mut rng);
        let (signature, ring_used) =
            TriptychSignature::sign_with_rng(&params, key_pairs[1].get_secret_key(), b"message", &ring, &mut rng)
                .unwrap();

        // A ring of the wrong size
        let (other_params, _, other_ring) = generate_data(2, 3, &mut rng);
        assert!(signature.verify(&params, b"message", &other_ring).is_none());

        // Parameters of the wrong size
        assert!(signature.verify(&other_params, b"message", &other_ring).is_none());

        // Truncated vectors
        let mut evil = signature.clone();
        evil.X.pop();
        assert!(evil.verify(&params, b"message", &ring_used).is_none());
        let mut evil = signature.clone();
        evil.f[0].push(Scalar::ONE);
        assert!(evil.verify(&params, b"message", &ring_used).is_none());
    }

    #[test]
    fn test_key_image_linking() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let (params, key_pairs, ring) = generate_data(2, 2, &mut rng);
        let secret_key = key_pairs[2].get_secret_key();

        // The same key signing different messages against different rings produces the same key image
        let (first, first_ring) =
            TriptychSignature::sign_with_rng(&params, secret_key, b"first", &ring, &mut rng).unwrap();
        let mut keys = vec![secret_key.public_key()];
        keys.extend((0..3).map(|_| *KeyPair::random(&mut rng).get_public_key()));
        let other_ring = Ring::new(&keys).unwrap();
        let (second, second_ring) =
            TriptychSignature::sign_with_rng(&params, secret_key, b"second", &other_ring, &mut rng).unwrap();

        let first_key_image = first.verify(&params, b"first", &first_ring).unwrap();
        let second_key_image = second.verify(&params, b"second", &second_ring).unwrap();
        assert_eq!(first_key_image, second_key_image);

        // Different keys produce different key images
        let (third, third_ring) =
            TriptychSignature::sign_with_rng(&params, key_pairs[0].get_secret_key(), b"first", &ring, &mut rng)
                .unwrap();
        assert_ne!(third.verify(&params, b"first", &third_ring).unwrap(), first_key_image);

        // Every member of a ring produces a different key image
        let (params, key_pairs, ring) = generate_data(2, 4, &mut rng);
        let key_images = key_pairs
            .iter()
            .map(|key_pair| {
                let (signature, ring_used) =
                    TriptychSignature::sign_with_rng(&params, key_pair.get_secret_key(), b"message", &ring, &mut rng)
                        .unwrap();
                signature.verify(&params, b"message", &ring_used).unwrap()
            })
            .collect::<BTreeSet<KeyImage>>();
        assert_eq!(key_images.len(), 16);
    }

    #[test]
    fn test_sign_errors() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let (params, key_pairs, ring) = generate_data(2, 2, &mut rng);

        // The ring must match the parameters
        let (other_params, _, _) = generate_data(2, 3, &mut rng);
        assert!(matches!(
            TriptychSignature::sign_with_rng(&other_params, key_pairs[0].get_secret_key(), b"message", &ring, &mut rng),
            Err(SignatureError::RingSizeMismatch { expected: 8, actual: 4 })
        ));

        // The signer must be in the ring
        let outsider = KeyPair::random(&mut rng);
        assert!(matches!(
            TriptychSignature::sign_with_rng(&params, outsider.get_secret_key(), b"message", &ring, &mut rng),
            Err(SignatureError::SignerNotInRing)
        ));
    }

    #[test]
    #[cfg(feature = "rand")]
    fn test_sign_with_os_rng() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let (params, key_pairs, ring) = generate_data(2, 1, &mut rng);

        let (signature, ring_used) =
            TriptychSignature::sign(&params, key_pairs[1].get_secret_key(), b"message", &ring).unwrap();
        assert!(signature.verify(&params, b"message", &ring_used).is_some());
    }
}
