// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Command-line and environment configuration for the server.

use crate::{DEFAULT_BIND_ADDRESS, DEFAULT_LOG_LEVEL};
use anyhow::{Context, Result};
use clap::Parser;
use pii_redaction::{EntityTypeSet, NoopObserver, RedactionConfig, RedactionObserver, TracingObserver};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug, Clone)]
#[command(name = "pii-redacting-server", version, about = "MCP tool server with PII redaction")]
pub struct Args {
    /// Address the HTTP listener binds to
    #[arg(long, env = "PII_SERVER_BIND", default_value = DEFAULT_BIND_ADDRESS)]
    pub bind: String,

    /// TOML file with the redaction configuration
    #[arg(long, env = "PII_REDACTION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter directive, e.g. `info` or `pii_redaction=debug`
    #[arg(long, env = "PII_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Comma-separated entity types, replacing the configured set
    #[arg(long, value_delimiter = ',')]
    pub entity_types: Vec<String>,

    /// Maximum payload nesting depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Disable per-call lifecycle logging
    #[arg(long)]
    pub quiet: bool,
}

impl Args {
    /// Parses arguments; exits with usage on error like any clap binary.
    #[must_use]
    pub fn from_cli<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Args::parse_from(args)
    }

    /// The redaction config file (or defaults) with command-line overrides
    /// applied and validated.
    pub fn redaction_config(&self) -> Result<RedactionConfig> {
        let mut config = match &self.config {
            Some(path) => RedactionConfig::load(path)
                .with_context(|| format!("Failed to load redaction config '{}'", path.display()))?,
            None => RedactionConfig::default(),
        };

        if !self.entity_types.is_empty() {
            config.entity_types = EntityTypeSet::new(self.entity_types.iter().map(String::as_str));
        }
        if let Some(depth) = self.max_depth {
            config.max_recursion_depth = depth;
        }

        config.validate().context("Invalid redaction settings")?;
        Ok(config)
    }

    pub fn observer(&self) -> Arc<dyn RedactionObserver> {
        if self.quiet {
            Arc::new(NoopObserver)
        } else {
            Arc::new(TracingObserver)
        }
    }
}
