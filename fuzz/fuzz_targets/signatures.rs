// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

#![no_main]

use libfuzzer_sys::fuzz_target;
use triptych_secp256k1::{TriptychParameters, TriptychSignature};

// Test basic deserialization and serialization
fuzz_target!(|data: &[u8]| {
	// Use small fixed parameters so that inputs of the right length are reachable
	let Ok(params) = TriptychParameters::new(2, 1) else {
		return;
	};

	// If deserialization succeeds, serialization and deserialization should agree
	// Scalars are reduced on deserialization, so the encoding itself need not be canonical
	if let Ok(signature) = TriptychSignature::from_blob(&params, data) {
		let blob = signature.to_blob();
		assert_eq!(blob.len(), data.len());
		assert_eq!(TriptychSignature::from_blob(&params, &blob).unwrap(), signature);
	}
});
