// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! An experimental Rust implementation of Triptych linkable ring signatures over secp256k1.
//!
//! # Overview
//!
//! [Triptych](https://eprint.iacr.org/2020/018) is a zero-knowledge proving system designed to function as a linkable ring signature.
//! This is a construction that allows a signer to sign a message against a ring of arbitrary public keys.
//! Successful verification of a signature means that the signer knew the secret key corresponding to one of the
//! public keys, but does not reveal which. It also produces a key image; if any two verified signatures have the same
//! key image, they were produced using the same secret key. This makes the construction suitable for anonymous voting,
//! where a verifier records key images to reject a second ballot from the same voter.
//!
//! More formally, let `G` be the secp256k1 generator and `J` a fixed independent generator.
//! Let `N = n**m`, where `n > 1` and `m > 0` are fixed parameters.
//! A signature proves knowledge of an index `l` and secret key `r` such that `M[l] = r*G` for the ring `M`, and reveals
//! the key image `U = r*J`. The Fiat-Shamir transformation binds an arbitrary message and the ring into the challenge.
//!
//! # Implementation notes
//!
//! This implementation makes several opinionated choices:
//! - It uses the [secp256k1](https://www.secg.org/sec2-v2.pdf) curve, with compressed 33-byte point encodings. The
//!   identity is encoded as 33 zero bytes.
//! - It uses SHA-256 for the Fiat-Shamir challenge and for deriving nothing-up-my-sleeve generators.
//! - Signing randomly permutes the ring; the permuted ring is returned and is required for verification.
//! - Signatures have a fixed raw encoding that depends on `n` and `m`, with the key image carried separately.
//!
//! None of the arithmetic is constant time. Signing leaks timing information about secret data.
//!
//! The implementation keeps dependencies to a minimum, and is `no_std` friendly.
//! Diagnostics are emitted through [`tracing`](https://crates.io/crates/tracing); install a subscriber to see them.
//!
//! There are several features available.
//!
//! | Feature | Default? | Description |
//! | :--- | :---: | :--- |
//! | `rand` | ✓ | Adds additional signing functionality that supplies a cryptographically-secure random number generator |
//! | `serde` | | Adds serialization and deserialization via [`serde`](https://crates.io/crates/serde) |
//! | `std` | ✓ | Adds corresponding dependency features |
//!
//! You can examine performance using the benchmarks: `cargo bench`.
//!
//! The raw signature encoding has an associated fuzzer that can be run using a nightly compiler: `cargo +nightly fuzz
//! run signatures`.
//!
//! # Warning
//!
//! This implementation is **experimental** and not suitable for production use.
//!
//! # Example
//!
//! Here's a complete example of how to generate and verify a Triptych signature; see the documentation for additional
//! functionality.
//!
//! ```
//! # #[cfg(feature = "rand")]
//! # {
//! use rand_core::OsRng;
//! use triptych_secp256k1::*;
//!
//! let mut rng = OsRng;
//!
//! // Generate parameters for a ring of size `2**3`
//! let params = TriptychParameters::new(2, 3).unwrap();
//!
//! // Generate a key pair, and hide its public key in a ring of random public keys
//! let key_pair = KeyPair::random(&mut rng);
//! let ring = Ring::random_with_signer(&params, key_pair.get_public_key(), &mut rng).unwrap();
//!
//! // Sign a message; signing permutes the ring
//! let message = b"Test message";
//! let (signature, ring_used) =
//!     TriptychSignature::sign_with_rng(&params, key_pair.get_secret_key(), message, &ring, &mut rng).unwrap();
//!
//! // The signature verifies against the permuted ring and reveals the key image
//! let key_image = signature.verify(&params, message, &ring_used).unwrap();
//! assert_eq!(key_image, key_pair.get_secret_key().compute_key_image(&params));
//!
//! // The signature survives a round trip through its raw encoding
//! let (raw, key_image) = signature.to_bytes();
//! let decoded = TriptychSignature::from_bytes(&params, &raw, &key_image.to_bytes()).unwrap();
//! assert_eq!(decoded, signature);
//! # }
//! ```

#![no_std]

extern crate alloc;

/// Raw signature encodings.
mod codec;
/// Base-`n` digit decomposition of ring indexes.
pub(crate) mod digits;
/// Arithmetic in the secp256k1 base field.
pub(crate) mod field;
/// Secret keys, key pairs, and key images.
pub mod keys;
pub use keys::{KeyError, KeyImage, KeyPair, SecretKey};
/// Public parameters used for generating and verifying Triptych signatures.
pub mod parameters;
pub use parameters::{ParameterError, TriptychParameters};
/// Points on the secp256k1 curve.
pub mod point;
pub use point::{Point, PointError};
/// Rings of public keys.
pub mod ring;
pub use ring::{Ring, RingError};
/// Scalars modulo the secp256k1 group order.
pub mod scalar;
pub use scalar::Scalar;
/// Triptych signatures.
pub mod signature;
pub use signature::{SignatureError, TriptychSignature};
/// Triptych signature transcripts.
pub(crate) mod transcript;
/// Various utility functionality.
pub(crate) mod util;

/// Domain separators used for hashing operations
pub(crate) mod domains {
    // Seed prefix for nothing-up-my-sleeve generators
    pub(crate) const NUMS_SEED: &[u8] = b"NUMS";

    // Generator index for the key image generator `J`
    pub(crate) const LINKING_GENERATOR_INDEX: u32 = 254;
}
