// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reading events and host plugin fields from files or stdin.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use courier_core::Event;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

/// Events parsed from one input, plus the number of lines that were skipped
/// because they did not hold a valid event.
#[derive(Debug, Default)]
pub struct EventBatch {
	pub events: Vec<Event>,
	pub malformed: usize,
}

/// Reads newline-delimited JSON events. Blank lines are ignored. A line that
/// is not a valid event is logged with its number and skipped; only a read
/// failure ends the batch.
pub async fn read_events<R>(reader: R) -> Result<EventBatch>
where
	R: AsyncBufRead + Unpin,
{
	let mut lines = reader.lines();
	let mut batch = EventBatch::default();
	let mut line_no = 0usize;

	while let Some(line) = lines.next_line().await.context("failed to read events")? {
		line_no += 1;
		let line = line.trim();
		if line.is_empty() {
			continue;
		}
		match serde_json::from_str::<Event>(line) {
			Ok(event) => batch.events.push(event),
			Err(e) => {
				warn!(line = line_no, error = %e, "skipping malformed event");
				batch.malformed += 1;
			}
		}
	}

	debug!(
		count = batch.events.len(),
		malformed = batch.malformed,
		lines = line_no,
		"events read"
	);
	Ok(batch)
}

/// Reads events from `path`, or stdin when it is `-`.
pub async fn read_events_from(path: &Path) -> Result<EventBatch> {
	if path == Path::new("-") {
		return read_events(BufReader::new(tokio::io::stdin())).await;
	}
	let file = tokio::fs::File::open(path)
		.await
		.with_context(|| format!("failed to open {}", path.display()))?;
	read_events(BufReader::new(file)).await
}

/// Reads a JSON object of camelCase plugin fields, e.g.
/// `{"customerioSiteId": "...", "identifyByEmail": "Yes"}`.
pub fn read_host_fields(path: &Path) -> Result<HashMap<String, String>> {
	let content = std::fs::read_to_string(path)
		.with_context(|| format!("failed to read {}", path.display()))?;
	serde_json::from_str(&content)
		.with_context(|| format!("{} is not a JSON object of string fields", path.display()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[tokio::test]
	async fn reads_ndjson_and_skips_blank_lines() {
		let input = b"{\"event\":\"signup\",\"distinct_id\":\"u1\"}\n\n  \n{\"event\":\"$pageview\",\"distinct_id\":\"u2\",\"properties\":{\"path\":\"/\"}}\n";
		let batch = read_events(&input[..]).await.unwrap();
		let events = batch.events;

		assert_eq!(batch.malformed, 0);
		assert_eq!(events.len(), 2);
		assert_eq!(events[0].event, "signup");
		assert_eq!(events[1].distinct_id, "u2");
		assert_eq!(events[1].track_data()["path"], "/");
	}

	#[tokio::test]
	async fn malformed_lines_are_skipped_and_counted() {
		let input = b"{\"event\":\"signup\",\"distinct_id\":\"u1\"}\nnot json\n{\"event\":\"signup\"}\n{\"event\":\"purchase\",\"distinct_id\":\"u2\"}\n";
		let batch = read_events(&input[..]).await.unwrap();

		assert_eq!(batch.malformed, 2);
		let ids: Vec<&str> = batch.events.iter().map(|e| e.distinct_id.as_str()).collect();
		assert_eq!(ids, vec!["u1", "u2"]);
	}

	#[tokio::test]
	async fn missing_file_is_an_error() {
		assert!(read_events_from(Path::new("/nonexistent/courier/events.ndjson"))
			.await
			.is_err());
	}

	#[test]
	fn host_fields_are_read_from_json() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"{{"customerioSiteId": "site", "eventsToSend": "signup,purchase"}}"#
		)
		.unwrap();

		let fields = read_host_fields(file.path()).unwrap();
		assert_eq!(fields["customerioSiteId"], "site");
		assert_eq!(fields["eventsToSend"], "signup,purchase");
	}

	#[test]
	fn host_fields_must_be_strings() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, r#"{{"identifyByEmail": true}}"#).unwrap();
		assert!(read_host_fields(file.path()).is_err());
	}
}
