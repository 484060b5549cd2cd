// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::{sync::Arc, vec::Vec};
use core::iter::once;

use sha2::{Digest, Sha256};
use snafu::prelude::*;

use crate::{
    domains::{LINKING_GENERATOR_INDEX, NUMS_SEED},
    field::FieldElement,
    point::Point,
    scalar::Scalar,
};

/// Public parameters used for generating and verifying Triptych signatures.
///
/// Parameters require a base `n` and exponent `m` that define the ring size `N == n**m`, as well as the group generators
/// required by the protocol:
/// - The generator `G` is the standard secp256k1 generator, and is used to define public keys.
/// - The generator `J` is used to define key images.
/// - The `m x n` matrix generators are used for Pedersen matrix commitments.
///
/// All generators other than `G` are nothing-up-my-sleeve points derived deterministically from their index, so any
/// two parties using the same `n` and `m` agree on them. Parameters are immutable once constructed and cheap to clone.
#[allow(non_snake_case)]
#[derive(Clone, Eq, PartialEq)]
pub struct TriptychParameters {
    n: u32,
    m: u32,
    G: Point,
    J: Point,
    CommitmentG: Arc<Vec<Point>>,
}

/// Errors that can arise relating to [`TriptychParameters`].
#[derive(Debug, Snafu)]
pub enum ParameterError {
    /// An invalid parameter was provided.
    #[snafu(display("An invalid parameter was provided: {reason}"))]
    InvalidParameter {
        /// The reason for the parameter error.
        reason: &'static str,
    },
}

/// Derive the nothing-up-my-sleeve generator with a given index.
///
/// The seed `NUMS || index` (with the index as big-endian `u32`) is hashed with SHA-256 and reduced to a field element
/// `x`. If `x` is not the abscissa of a curve point, it is incremented until it is. The point with even ordinate is
/// returned.
pub(crate) fn nums(index: u32) -> Point {
    let mut hasher = Sha256::new();
    hasher.update(NUMS_SEED);
    hasher.update(index.to_be_bytes());
    let mut x_bytes = [0u8; 32];
    x_bytes.copy_from_slice(&hasher.finalize());

    let mut x = FieldElement::from_bytes_mod_order(&x_bytes);
    loop {
        if let Some(point) = Point::lift_x(x, false) {
            return point;
        }
        x = x + FieldElement::ONE;
    }
}

impl TriptychParameters {
    /// Generate new [`TriptychParameters`] for Triptych signatures.
    ///
    /// The base `n > 1` and exponent `m > 0` define the ring size, so it must be the case that `n**m` does not overflow
    /// [`prim@u32`]. The number of matrix generators `n * m` may not exceed 254, since generator indexes must not
    /// collide with the index used for `J`. If any of these conditions is not met, returns a [`ParameterError`].
    #[allow(non_snake_case)]
    pub fn new(n: u32, m: u32) -> Result<Self, ParameterError> {
        // These bounds are required by the protocol
        if n < 2 {
            return Err(ParameterError::InvalidParameter {
                reason: "`n` must be at least 2",
            });
        }
        if m < 1 {
            return Err(ParameterError::InvalidParameter {
                reason: "`m` must be at least 1",
            });
        }

        // Check that the parameters don't overflow `u32`
        if n.checked_pow(m).is_none() {
            return Err(ParameterError::InvalidParameter {
                reason: "`n**m` overflowed `u32`",
            });
        }

        // Matrix generators must stay below the index of `J`
        let generator_count = n
            .checked_mul(m)
            .filter(|count| *count <= LINKING_GENERATOR_INDEX)
            .ok_or(ParameterError::InvalidParameter {
                reason: "`n * m` must not exceed 254",
            })?;

        let CommitmentG = (0..generator_count).map(nums).collect::<Vec<Point>>();

        Ok(Self {
            n,
            m,
            G: Point::generator(),
            J: nums(LINKING_GENERATOR_INDEX),
            CommitmentG: Arc::new(CommitmentG),
        })
    }

    /// Commit to a matrix.
    ///
    /// This requires that `matrix` be an `m x n` scalar matrix; entry `matrix[j][i]` is bound to the generator with index
    /// `j*n + i`, and `mask` is bound to `G`. Zero entries are skipped.
    pub(crate) fn commit_matrix(&self, matrix: &[Vec<Scalar>], mask: &Scalar) -> Result<Point, ParameterError> {
        // Check that the matrix dimensions are valid
        if matrix.len() != (self.m as usize) || matrix.iter().any(|row| row.len() != (self.n as usize)) {
            return Err(ParameterError::InvalidParameter {
                reason: "matrix dimensions did not match the parameters",
            });
        }

        // Flatten before evaluating the commitment
        let scalars = matrix.iter().flatten().chain(once(mask));
        let points = self.get_CommitmentG().iter().chain(once(self.get_G()));

        Ok(Point::vartime_multiscalar_mul(scalars, points))
    }

    /// Get the group generator `G` from these [`TriptychParameters`].
    ///
    /// This is the generator used for defining public keys.
    #[allow(non_snake_case)]
    pub fn get_G(&self) -> &Point {
        &self.G
    }

    /// Get the group generator `J` from these [`TriptychParameters`].
    ///
    /// This is the generator used for defining key images.
    #[allow(non_snake_case)]
    pub fn get_J(&self) -> &Point {
        &self.J
    }

    /// Get the value `n` from these [`TriptychParameters`].
    ///
    /// This is the base used for defining the ring size.
    pub fn get_n(&self) -> u32 {
        self.n
    }

    /// Get the value `m` from these [`TriptychParameters`].
    ///
    /// This is the exponent used for defining the ring size.
    pub fn get_m(&self) -> u32 {
        self.m
    }

    /// Get the value `N == n**m` from these [`TriptychParameters`].
    ///
    /// This is the ring size.
    #[allow(non_snake_case)]
    pub fn get_N(&self) -> u32 {
        // This is guaranteed not to overflow
        self.n.pow(self.m)
    }

    /// Get the matrix commitment generators from these [`TriptychParameters`], in row-major order.
    #[allow(non_snake_case)]
    pub(crate) fn get_CommitmentG(&self) -> &Vec<Point> {
        &self.CommitmentG
    }
}

#[cfg(test)]
mod test {
    use alloc::vec::Vec;

    use rand_chacha::ChaCha12Rng;
    use rand_core::SeedableRng;

    use super::*;

    #[test]
    #[allow(non_snake_case)]
    fn test_nums() {
        let params = TriptychParameters::new(2, 3).unwrap();

        // Generators are deterministic
        assert_eq!(nums(0), nums(0));
        assert_eq!(params.get_CommitmentG()[..], (0..6).map(nums).collect::<Vec<Point>>()[..]);
        assert_eq!(*params.get_J(), nums(254));

        // Generators match known values, which other implementations must reproduce
        assert_eq!(
            nums(0).to_hex(),
            "02be0e6ba4d48a26aba3b58de5f4b2510c01f1247d121b67539483dee31dc31ab4"
        );
        assert_eq!(
            nums(5).to_hex(),
            "02855e2156f924bda87be88201753b1fc031a5a8b672b9d6913aad04a70910eb74"
        );
        assert_eq!(
            params.get_J().to_hex(),
            "0266f63cadc5a6ec2c1c396664a7cba9d572aa7b4e9a10936c11585ac6b7449dff"
        );

        // Generators are on the curve and have even `y`
        let J = *params.get_J();
        for generator in params.get_CommitmentG().iter().chain(once(&J)) {
            assert!(generator.is_on_curve());
            assert!(!generator.is_identity());
            assert_eq!(generator.compress()[0], 0x02);
        }

        // Generators are distinct from each other, from `J`, and from `G`
        for (i, generator) in params.get_CommitmentG().iter().enumerate() {
            assert_ne!(*generator, J);
            assert_ne!(generator, params.get_G());
            for other in &params.get_CommitmentG()[i + 1..] {
                assert_ne!(generator, other);
            }
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(TriptychParameters::new(0, 2).is_err());
        assert!(TriptychParameters::new(1, 2).is_err());
        assert!(TriptychParameters::new(2, 0).is_err());
        assert!(TriptychParameters::new(2, 32).is_err()); // `2**32` overflows
        assert!(TriptychParameters::new(255, 1).is_err()); // too many matrix generators
        assert!(TriptychParameters::new(2, 128).is_err());

        // The smallest and largest valid configurations
        let params = TriptychParameters::new(2, 1).unwrap();
        assert_eq!(params.get_N(), 2);
        let params = TriptychParameters::new(254, 1).unwrap();
        assert_eq!(params.get_N(), 254);
        let params = TriptychParameters::new(4, 4).unwrap();
        assert_eq!(params.get_N(), 256);
    }

    #[test]
    fn test_commit_matrix() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let params = TriptychParameters::new(3, 2).unwrap();

        let random_matrix = |rng: &mut ChaCha12Rng| {
            (0..2)
                .map(|_| (0..3).map(|_| Scalar::random(rng)).collect::<Vec<Scalar>>())
                .collect::<Vec<Vec<Scalar>>>()
        };

        // Homomorphism: `commit(A, rA) + x*commit(B, rB) == commit(A + x*B, rA + x*rB)`
        let a = random_matrix(&mut rng);
        let b = random_matrix(&mut rng);
        let r_a = Scalar::random(&mut rng);
        let r_b = Scalar::random(&mut rng);
        let x = Scalar::random(&mut rng);
        let combined = a
            .iter()
            .zip(b.iter())
            .map(|(a_row, b_row)| {
                a_row
                    .iter()
                    .zip(b_row.iter())
                    .map(|(a, b)| *a + x * *b)
                    .collect::<Vec<Scalar>>()
            })
            .collect::<Vec<Vec<Scalar>>>();
        assert_eq!(
            params.commit_matrix(&a, &r_a).unwrap() + x * params.commit_matrix(&b, &r_b).unwrap(),
            params.commit_matrix(&combined, &(r_a + x * r_b)).unwrap()
        );

        // Zero entries agree with a naive sum
        let mut sparse = random_matrix(&mut rng);
        sparse[0][1] = Scalar::ZERO;
        sparse[1][0] = Scalar::ZERO;
        let mask = Scalar::random(&mut rng);
        let mut naive = mask * *params.get_G();
        for (j, row) in sparse.iter().enumerate() {
            for (i, entry) in row.iter().enumerate() {
                naive = naive + *entry * params.get_CommitmentG()[j * 3 + i];
            }
        }
        assert_eq!(params.commit_matrix(&sparse, &mask).unwrap(), naive);

        // Dimensions must match
        assert!(params.commit_matrix(&a[..1], &mask).is_err());
        let mut wide = a.clone();
        wide[1].push(Scalar::ONE);
        assert!(params.commit_matrix(&wide, &mask).is_err());
        assert!(params.commit_matrix(&[], &mask).is_err());
    }
}
