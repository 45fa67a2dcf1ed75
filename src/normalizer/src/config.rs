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

//! Configurations.
//!
//! Every option has a numeric default; absent options fall back to the
//! default, never to a failure. Call [`NormalizerConfig::validate`] before
//! handing the config to the driver.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::error::{InvalidConfigSnafu, Result};

/// Length of the hot data interval, in months.
pub const DEFAULT_HOT_EXPIRATION_MONTHS: u32 = 8;
/// Length of the warm data interval, in months.
pub const DEFAULT_WARM_EXPIRATION_MONTHS: u32 = 18;
/// Length of the cold data interval, in months.
pub const DEFAULT_COLD_EXPIRATION_MONTHS: u32 = 36;

const DEFAULT_MAX_SIZE_MB: u64 = 10 * 1000;
const DEFAULT_HOT_MAX_SIZE_MB: u64 = 5 * 1000;
const DEFAULT_WARM_MAX_SIZE_MB: u64 = 10 * 1000;
const DEFAULT_COLD_MAX_SIZE_MB: u64 = 20 * 1000;

const DEFAULT_SPLIT_FACTOR: f64 = 2.0;
const DEFAULT_MIN_COUNT: usize = 3;
const DEFAULT_MAX_COUNT: usize = 100;

const DEFAULT_ITERATIONS: u32 = 1;
const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Age-tier boundaries and per-tier skip switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageOptions {
    pub hot_months: u32,
    pub warm_months: u32,
    pub cold_months: u32,
    pub skip_hot: bool,
    pub skip_warm: bool,
    pub skip_cold: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            hot_months: DEFAULT_HOT_EXPIRATION_MONTHS,
            warm_months: DEFAULT_WARM_EXPIRATION_MONTHS,
            cold_months: DEFAULT_COLD_EXPIRATION_MONTHS,
            skip_hot: false,
            skip_warm: false,
            skip_cold: false,
        }
    }
}

/// Absolute per-region size ceilings, global and per tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxSizeOptions {
    pub enabled: bool,
    pub max_size_mb: u64,
    pub hot_max_size_mb: u64,
    pub warm_max_size_mb: u64,
    pub cold_max_size_mb: u64,
}

impl Default for MaxSizeOptions {
    fn default() -> Self {
        Self {
            // The size ceiling is the one metric enabled out of the box.
            enabled: true,
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            hot_max_size_mb: DEFAULT_HOT_MAX_SIZE_MB,
            warm_max_size_mb: DEFAULT_WARM_MAX_SIZE_MB,
            cold_max_size_mb: DEFAULT_COLD_MAX_SIZE_MB,
        }
    }
}

/// Split/merge relative to the average region size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AverageSizeOptions {
    pub enabled: bool,
    /// A region larger than `split_factor` times the average is split.
    pub split_factor: f64,
}

impl Default for AverageSizeOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            split_factor: DEFAULT_SPLIT_FACTOR,
        }
    }
}

/// Lower bound on the region count, global and per tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinCountOptions {
    pub enabled: bool,
    pub min_count: usize,
    pub hot_min_count: usize,
    pub warm_min_count: usize,
    pub cold_min_count: usize,
}

impl Default for MinCountOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            min_count: DEFAULT_MIN_COUNT,
            hot_min_count: DEFAULT_MIN_COUNT,
            warm_min_count: DEFAULT_MIN_COUNT,
            cold_min_count: DEFAULT_MIN_COUNT,
        }
    }
}

/// Upper bound on the region count, global and per tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxCountOptions {
    pub enabled: bool,
    pub max_count: usize,
    pub hot_max_count: usize,
    pub warm_max_count: usize,
    pub cold_max_count: usize,
    /// Merge only pairs where both regions are below the average size.
    /// Disabled, pairs are merged unconditionally until the excess is
    /// absorbed.
    pub pair_below_average: bool,
}

impl Default for MaxCountOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            max_count: DEFAULT_MAX_COUNT,
            hot_max_count: DEFAULT_MAX_COUNT,
            warm_max_count: DEFAULT_MAX_COUNT,
            cold_max_count: DEFAULT_MAX_COUNT,
            pair_below_average: true,
        }
    }
}

/// The mixed per-tier balancer: grows a tier below its minimum count,
/// otherwise splits on an absolute ceiling or on the average factor and
/// merges undersized neighbor pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierBalanceOptions {
    pub enabled: bool,
    pub split_factor: f64,
    pub min_count: usize,
}

impl Default for TierBalanceOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            split_factor: DEFAULT_SPLIT_FACTOR,
            min_count: DEFAULT_MIN_COUNT,
        }
    }
}

/// Driver-level knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Run the policies per age tier instead of over the whole table.
    pub staged: bool,
    /// Compute and log plans without executing them.
    pub plan_only: bool,
    /// Number of normalization cycles to run.
    pub iterations: u32,
    /// Sleep between cycles.
    #[serde(with = "humantime_serde")]
    pub cycle_interval: Duration,
    /// Sleep between reassignment polls while waiting for quiescence.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            staged: true,
            plan_only: false,
            iterations: DEFAULT_ITERATIONS,
            cycle_interval: DEFAULT_CYCLE_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Configuration of the normalization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NormalizerConfig {
    pub stage: StageOptions,
    pub max_size: MaxSizeOptions,
    pub average_size: AverageSizeOptions,
    pub min_count: MinCountOptions,
    pub max_count: MaxCountOptions,
    pub tier_balance: TierBalanceOptions,
    pub run: RunOptions,
}

impl NormalizerConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.stage.hot_months > 0,
            InvalidConfigSnafu {
                reason: "stage.hot_months must be positive",
            }
        );
        ensure!(
            self.average_size.split_factor > 0.0,
            InvalidConfigSnafu {
                reason: format!(
                    "average_size.split_factor must be positive, got {}",
                    self.average_size.split_factor
                ),
            }
        );
        ensure!(
            self.tier_balance.split_factor > 0.0,
            InvalidConfigSnafu {
                reason: format!(
                    "tier_balance.split_factor must be positive, got {}",
                    self.tier_balance.split_factor
                ),
            }
        );
        ensure!(
            self.run.iterations > 0,
            InvalidConfigSnafu {
                reason: "run.iterations must be positive",
            }
        );
        ensure!(
            !self.run.poll_interval.is_zero(),
            InvalidConfigSnafu {
                reason: "run.poll_interval must be positive",
            }
        );
        Ok(())
    }
}
