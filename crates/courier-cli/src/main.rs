// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Courier CLI - exports analytics events to Customer.io
//!
//! `courier check` validates configuration and credentials.
//! `courier export` reads newline-delimited JSON events and delivers them,
//! printing a JSON summary on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use courier_config::{CourierConfig, LogFormat, LoggingConfig};
use courier_plugin::{CustomerIoPlugin, ExportSummary, PluginError};
use courier_store::StoreError;

mod input;
mod store;

use input::EventBatch;

/// Setup failed in a way only a configuration change can fix.
const EXIT_FATAL: u8 = 2;
/// EX_TEMPFAIL: try again later.
const EXIT_RETRY: u8 = 75;

/// Courier - Customer.io event export
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Args {
	/// Path to a TOML configuration file
	#[arg(short, long, env = "COURIER_CONFIG")]
	config: Option<PathBuf>,

	/// JSON object of host plugin fields (customerioSiteId, eventsToSend, ...)
	#[arg(long, value_name = "FILE")]
	plugin_config: Option<PathBuf>,

	/// Log filter directive (overrides config)
	#[arg(short, long)]
	log_level: Option<String>,

	/// Log format: pretty, compact or json (overrides config)
	#[arg(long)]
	log_format: Option<LogFormat>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Validate configuration and Customer.io credentials
	Check,
	/// Export newline-delimited JSON events
	Export {
		/// Events file, or `-` for stdin
		#[arg(long, short, default_value = "-")]
		events: PathBuf,
	},
}

fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

fn load_config(args: &Args) -> Result<CourierConfig> {
	let host_fields = args
		.plugin_config
		.as_deref()
		.map(input::read_host_fields)
		.transpose()?;

	let mut config = courier_config::load_config(args.config.clone(), host_fields)
		.context("failed to load configuration")?;
	if let Some(level) = &args.log_level {
		config.logging.level = level.clone();
	}
	if let Some(format) = args.log_format {
		config.logging.format = format;
	}
	Ok(config)
}

async fn setup(config: &CourierConfig) -> Result<CustomerIoPlugin> {
	let store = store::open_store(&config.store)
		.await
		.context("failed to open plugin store")?;
	let plugin = CustomerIoPlugin::setup(&config.customerio, &config.delivery, store)
		.await
		.context("Customer.io setup failed")?;
	Ok(plugin)
}

/// Batch counters plus the input lines that never became events.
#[derive(Debug, Serialize)]
struct ExportReport {
	#[serde(flatten)]
	summary: ExportSummary,
	malformed: usize,
}

async fn export(plugin: &CustomerIoPlugin, batch: EventBatch) -> ExportReport {
	let summary = plugin.export_events(batch.events).await;
	ExportReport {
		summary,
		malformed: batch.malformed,
	}
}

async fn run(command: Command, config: CourierConfig) -> Result<()> {
	match command {
		Command::Check => {
			setup(&config).await?;
			println!("{}", serde_json::json!({ "ok": true }));
			Ok(())
		}
		Command::Export { events } => {
			let batch = input::read_events_from(&events).await?;
			let plugin = setup(&config).await?;
			let report = export(&plugin, batch).await;
			println!("{}", serde_json::to_string(&report)?);
			Ok(())
		}
	}
}

/// Retryable setup and store failures map to EX_TEMPFAIL, everything else
/// is fatal.
fn exit_code_for(err: &anyhow::Error) -> u8 {
	if let Some(e) = err.downcast_ref::<PluginError>() {
		return if e.is_fatal() { EXIT_FATAL } else { EXIT_RETRY };
	}
	if let Some(e) = err.downcast_ref::<StoreError>() {
		return if e.is_fatal() { EXIT_FATAL } else { EXIT_RETRY };
	}
	EXIT_FATAL
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Args::parse();

	let config = match load_config(&args) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("error: {e:#}");
			return ExitCode::from(EXIT_FATAL);
		}
	};

	init_tracing(&config.logging);
	info!(version = env!("CARGO_PKG_VERSION"), "starting courier");

	match run(args.command, config).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!(error = %format_args!("{e:#}"), "courier failed");
			ExitCode::from(exit_code_for(&e))
		}
	}
}
