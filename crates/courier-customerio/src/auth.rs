// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use courier_common_secret::SecretString;
use sha2::{Digest, Sha256};

/// The `Authorization` header value for the track API, built once from the
/// site id and API key.
#[derive(Clone)]
pub struct AuthorizationContext {
	header: SecretString,
}

impl AuthorizationContext {
	pub fn new(site_id: &str, token: &SecretString) -> Self {
		let encoded = STANDARD.encode(format!("{site_id}:{}", token.expose()));
		Self {
			header: SecretString::new(format!("Basic {encoded}")),
		}
	}

	pub fn header_value(&self) -> &str {
		self.header.expose()
	}

	/// Hex SHA-256 of the header. Safe to persist and log in place of the
	/// credentials themselves.
	pub fn fingerprint(&self) -> String {
		hex::encode(Sha256::digest(self.header.expose().as_bytes()))
	}
}

impl fmt::Debug for AuthorizationContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AuthorizationContext")
			.field("header", &self.header)
			.finish()
	}
}
