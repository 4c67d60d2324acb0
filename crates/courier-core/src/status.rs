// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-customer status flags.
//!
//! A customer's status only ever grows. It is persisted as a JSON list of
//! flag names in canonical order (`seen`, `identified`, `with_email`).

use std::fmt;

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomerFlag {
	Seen,
	Identified,
	WithEmail,
}

impl CustomerFlag {
	/// All flags in persisted order.
	pub const ALL: [CustomerFlag; 3] = [
		CustomerFlag::Seen,
		CustomerFlag::Identified,
		CustomerFlag::WithEmail,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			CustomerFlag::Seen => "seen",
			CustomerFlag::Identified => "identified",
			CustomerFlag::WithEmail => "with_email",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|f| f.as_str() == name)
	}

	fn bit(self) -> u8 {
		match self {
			CustomerFlag::Seen => 1,
			CustomerFlag::Identified => 1 << 1,
			CustomerFlag::WithEmail => 1 << 2,
		}
	}
}

impl fmt::Display for CustomerFlag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CustomerStatus(u8);

impl CustomerStatus {
	pub fn empty() -> Self {
		Self(0)
	}

	pub fn has(&self, flag: CustomerFlag) -> bool {
		self.0 & flag.bit() != 0
	}

	/// Adds `flag`, returning true if it was not already set.
	pub fn insert(&mut self, flag: CustomerFlag) -> bool {
		let added = !self.has(flag);
		self.0 |= flag.bit();
		added
	}

	pub fn is_empty(&self) -> bool {
		self.0 == 0
	}

	/// True when every flag of `other` is also set here.
	pub fn contains(&self, other: CustomerStatus) -> bool {
		self.0 & other.0 == other.0
	}

	pub fn flags(&self) -> impl Iterator<Item = CustomerFlag> + '_ {
		CustomerFlag::ALL.into_iter().filter(|f| self.has(*f))
	}

	pub fn names(&self) -> Vec<&'static str> {
		self.flags().map(|f| f.as_str()).collect()
	}

	/// Builds a status from stored names, skipping names it does not know.
	pub fn from_names<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut status = Self::empty();
		for flag in names
			.into_iter()
			.filter_map(|n| CustomerFlag::from_name(n.as_ref()))
		{
			status.insert(flag);
		}
		status
	}
}

impl FromIterator<CustomerFlag> for CustomerStatus {
	fn from_iter<I: IntoIterator<Item = CustomerFlag>>(iter: I) -> Self {
		let mut status = Self::empty();
		for flag in iter {
			status.insert(flag);
		}
		status
	}
}

impl Serialize for CustomerStatus {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let names = self.names();
		let mut seq = serializer.serialize_seq(Some(names.len()))?;
		for name in names {
			seq.serialize_element(name)?;
		}
		seq.end()
	}
}

impl<'de> Deserialize<'de> for CustomerStatus {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let names = Vec::<String>::deserialize(deserializer)?;
		Ok(Self::from_names(names))
	}
}
