// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! In an anonymous voting design, each registered voter has a key pair, and the election publishes the ring of all
//! registered public keys. A voter casts a ballot by signing it against the ring:
//! - verification shows that some registered voter cast the ballot, but not which one
//! - the signature's key image depends only on the voter's secret key, so a second ballot from the same voter is
//!   detected
//!
//! This example shows how to use Triptych signatures to run such an election.
