// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Customer.io track API client.

use std::time::Duration;

use courier_common_http::{retry, RetryConfig};
use courier_core::TrackPayload;
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use tracing::{debug, error, instrument, trace};

use crate::auth::AuthorizationContext;
use crate::error::CustomerIoError;

pub const DEFAULT_TRACK_HOST: &str = "track.customer.io";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY: usize = 512;

/// Client for the Customer.io track and app APIs.
#[derive(Debug, Clone)]
pub struct CustomerIoClient {
	http_client: Client,
	auth: AuthorizationContext,
	track_url: String,
	api_url: String,
	retry_config: RetryConfig,
}

#[derive(Debug)]
pub struct CustomerIoClientBuilder {
	auth: AuthorizationContext,
	track_url: Option<String>,
	api_url: Option<String>,
	timeout: Duration,
	retry_config: RetryConfig,
}

impl CustomerIoClientBuilder {
	/// Track host, with or without scheme. Defaults to `track.customer.io`.
	pub fn track_url(mut self, host: impl AsRef<str>) -> Self {
		self.track_url = Some(normalize_base_url(host.as_ref()));
		self
	}

	/// API host used for the credential check. Derived from the track host
	/// when unset.
	pub fn api_url(mut self, host: impl AsRef<str>) -> Self {
		self.api_url = Some(normalize_base_url(host.as_ref()));
		self
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn retry_config(mut self, config: RetryConfig) -> Self {
		self.retry_config = config;
		self
	}

	pub fn build(self) -> Result<CustomerIoClient, CustomerIoError> {
		let http_client = courier_common_http::new_client_with_timeout(self.timeout)?;
		let track_url = self
			.track_url
			.unwrap_or_else(|| normalize_base_url(DEFAULT_TRACK_HOST));
		let api_url = self
			.api_url
			.unwrap_or_else(|| derive_api_url(&track_url));
		check_base_url(&track_url)?;
		check_base_url(&api_url)?;

		Ok(CustomerIoClient {
			http_client,
			auth: self.auth,
			track_url,
			api_url,
			retry_config: self.retry_config,
		})
	}
}

impl CustomerIoClient {
	pub fn builder(auth: AuthorizationContext) -> CustomerIoClientBuilder {
		CustomerIoClientBuilder {
			auth,
			track_url: None,
			api_url: None,
			timeout: DEFAULT_TIMEOUT,
			retry_config: RetryConfig::default(),
		}
	}

	pub fn track_url(&self) -> &str {
		&self.track_url
	}

	pub fn api_url(&self) -> &str {
		&self.api_url
	}

	pub fn auth(&self) -> &AuthorizationContext {
		&self.auth
	}

	/// Checks the credentials against the app API.
	#[instrument(skip(self), fields(api_url = %self.api_url))]
	pub async fn verify_credentials(&self) -> Result<(), CustomerIoError> {
		let url = format!("{}/v1/api/info/ip_addresses", self.api_url);
		self.send(Method::GET, &url, None).await
	}

	/// Creates or updates a customer profile.
	#[instrument(skip(self, attributes), fields(attribute_count = attributes.len()))]
	pub async fn upsert_customer(
		&self,
		identifier: &str,
		attributes: &Map<String, Value>,
	) -> Result<(), CustomerIoError> {
		let url = self.customer_url(identifier);
		let body = Value::Object(attributes.clone());
		self.send(Method::PUT, &url, Some(&body)).await
	}

	/// Records an event against a customer.
	#[instrument(skip(self, payload), fields(event = %payload.name))]
	pub async fn track_event(
		&self,
		identifier: &str,
		payload: &TrackPayload,
	) -> Result<(), CustomerIoError> {
		let url = format!("{}/events", self.customer_url(identifier));
		let body = serde_json::to_value(payload)
			.map_err(|e| CustomerIoError::InvalidResponse(format!("unserializable payload: {e}")))?;
		self.send(Method::POST, &url, Some(&body)).await
	}

	fn customer_url(&self, identifier: &str) -> String {
		format!(
			"{}/api/v1/customers/{}",
			self.track_url,
			urlencoding::encode(identifier)
		)
	}

	async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<(), CustomerIoError> {
		retry(&self.retry_config, || self.send_once(method.clone(), url, body)).await
	}

	async fn send_once(
		&self,
		method: Method,
		url: &str,
		body: Option<&Value>,
	) -> Result<(), CustomerIoError> {
		debug!(method = %method, url = %url, "Sending request to Customer.io");

		let mut request = self
			.http_client
			.request(method, url)
			.header(reqwest::header::AUTHORIZATION, self.auth.header_value());
		if let Some(body) = body {
			trace!(body = %body, "Request body");
			request = request.json(body);
		}

		let response = request.send().await.map_err(|e| {
			if e.is_timeout() {
				error!("Request timed out");
				return CustomerIoError::Timeout;
			}
			error!(error = %e, "Network error during Customer.io request");
			CustomerIoError::Transport(e)
		})?;

		let status = response.status();
		debug!(status = %status, "Received response from Customer.io");

		if status.is_success() {
			return Ok(());
		}

		let status_code = status.as_u16();
		let mut message = response.text().await.unwrap_or_default();
		truncate_at_char_boundary(&mut message, MAX_ERROR_BODY);

		if status_code == 401 || status_code == 403 {
			error!(status = status_code, "Customer.io rejected credentials");
			return Err(CustomerIoError::Unauthorized {
				status: status_code,
			});
		}

		error!(status = status_code, body = %message, "Customer.io API error");
		Err(CustomerIoError::Api {
			status: status_code,
			message,
		})
	}
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
	if s.len() <= max {
		return;
	}
	let mut end = max;
	while !s.is_char_boundary(end) {
		end -= 1;
	}
	s.truncate(end);
}

fn check_base_url(url: &str) -> Result<(), CustomerIoError> {
	let invalid = |message: String| CustomerIoError::InvalidUrl {
		url: url.to_string(),
		message,
	};
	let parsed = reqwest::Url::parse(url).map_err(|e| invalid(e.to_string()))?;
	match parsed.scheme() {
		"http" | "https" if parsed.host_str().is_some() => Ok(()),
		_ => Err(invalid("expected an http(s) host".to_string())),
	}
}

/// Adds `https://` when no scheme is given and drops trailing slashes.
pub fn normalize_base_url(host: &str) -> String {
	let host = host.trim().trim_end_matches('/');
	if host.contains("://") {
		host.to_string()
	} else {
		format!("https://{host}")
	}
}

/// App API base for a track base URL: a leading `track` label becomes `api`
/// (`track-eu.customer.io` maps to `api-eu.customer.io`). Other hosts are
/// used as they are.
pub fn derive_api_url(track_url: &str) -> String {
	let (scheme, rest) = track_url
		.split_once("://")
		.unwrap_or(("https", track_url));
	let first_label = rest.split(&['.', ':', '/'][..]).next().unwrap_or_default();

	if first_label == "track" || first_label.starts_with("track-") {
		format!("{scheme}://api{}", &rest["track".len()..])
	} else {
		format!("{scheme}://{rest}")
	}
}
