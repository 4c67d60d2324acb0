// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Customer.io export plugin.
//!
//! [`CustomerIoPlugin::setup`] validates configuration and credentials.
//! Each exported event then passes the allow list and alias filter, updates
//! the stored customer status, passes the anonymous-user policy, and is
//! delivered as a profile upsert followed by an event track.

pub mod dispatch;
pub mod error;
pub mod keys;
pub mod plugin;
pub mod policy;
pub mod sync;

pub use error::{ExportError, PluginError};
pub use plugin::{CustomerIoPlugin, EventOutcome, ExportSummary};
pub use policy::ExportPolicy;
pub use sync::{sync_status, SyncOutcome};
