// Copyright 2023 Greptime Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging initialization.

use std::env;
use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_TARGETS: &str = "info";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Filter directives, e.g. `info` or `normalizer=debug`. `None` defers
    /// to the `RUST_LOG` environment variable.
    pub level: Option<String>,
    /// Whether to emit ANSI colors.
    pub enable_ansi: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: None,
            enable_ansi: true,
        }
    }
}

/// Initializes the global tracing subscriber. Must be called at most once
/// per process; returns without effect if a subscriber is already set.
pub fn init_global_logging(app_name: &str, opts: &LoggingOptions) {
    let filter = opts
        .level
        .clone()
        .or_else(|| env::var(EnvFilter::DEFAULT_ENV).ok())
        .unwrap_or_else(|| DEFAULT_LOG_TARGETS.to_string());

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(opts.enable_ansi),
        )
        .try_init();

    crate::info!("logging initialized for {}", app_name);
}

/// Initializes logging for unit tests. Safe to call from every test; only
/// the first call has an effect.
pub fn init_default_ut_logging() {
    static START: Once = Once::new();

    START.call_once(|| {
        let level = env::var("UNITTEST_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());
        let opts = LoggingOptions {
            level: Some(level),
            enable_ansi: false,
        };
        init_global_logging("unittest", &opts);
    });
}
