// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
	#[error("unknown value for sendEventsFromAnonymousUsers: '{0}'")]
	UnknownEventsPolicy(String),
}
