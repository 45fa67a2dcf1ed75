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

//! The normalization policy family.
//!
//! A policy is a pure function from (region list, size snapshot,
//! thresholds) to an ordered list of split/merge actions. Two axes compose
//! independently: the *metric* ([`SizingMetric`]) decides which conditions
//! the shared scan tests, and the *granularity* ([`TablePolicy`] vs.
//! [`StagedPolicy`]) decides whether the scan runs over the whole table or
//! once per age tier with tier-specific thresholds.

use std::fmt;

use chrono::NaiveDate;
use common_telemetry::{debug, info};
use store_api::region::RegionInfo;
use store_api::table::TableName;

use crate::config::{NormalizerConfig, StageOptions};
use crate::error::Result;
use crate::load::RegionSizeSnapshot;
use crate::plan::{NormalizationAction, NormalizationPlan};
use crate::scan::{scan_regions, MergeTrigger, ScanParams, SplitTrigger};
use crate::stage::{classify, Tier};

/// Read-only inputs of one policy evaluation, built per cycle and passed in
/// explicitly so policies stay free of mutable state.
#[derive(Debug, Clone, Copy)]
pub struct PlanningContext<'a> {
    pub regions: &'a [RegionInfo],
    pub sizes: &'a RegionSizeSnapshot,
    pub now: NaiveDate,
}

/// A normalization policy. Implementations must not mutate shared state;
/// everything they need arrives through the [`PlanningContext`].
pub trait NormalizationPolicy: fmt::Display + Send + Sync {
    fn compute_plan(
        &self,
        table: &TableName,
        ctx: &PlanningContext<'_>,
    ) -> Result<NormalizationPlan>;
}

/// Threshold test applied during the scan.
#[derive(Debug, Clone, PartialEq)]
pub enum SizingMetric {
    /// Split every region above an absolute ceiling.
    MaxSize { max_size_mb: u64 },
    /// Split regions above `split_factor` times the average, merge neighbor
    /// pairs whose combined size stays below the average.
    AverageSize { split_factor: f64 },
    /// Grow the region count up to `min_count` by splitting regions above
    /// the average.
    MinCount { min_count: usize },
    /// Shrink the region count down to `max_count` by merging neighbor
    /// pairs, either only when both halves are below the average or
    /// unconditionally.
    MaxCount {
        max_count: usize,
        pair_below_average: bool,
    },
    /// The mixed balancer: below `min_count` it behaves like [`Self::MinCount`];
    /// otherwise it splits on the absolute ceiling or the average factor
    /// (one action even when both fire) and merges undersized pairs.
    TierBalance {
        max_size_mb: u64,
        split_factor: f64,
        min_count: usize,
    },
}

impl SizingMetric {
    fn actions(
        &self,
        regions: &[RegionInfo],
        sizes: &RegionSizeSnapshot,
    ) -> Result<Vec<NormalizationAction>> {
        if regions.is_empty() {
            return Ok(Vec::new());
        }

        let params = match *self {
            SizingMetric::MaxSize { max_size_mb } => ScanParams {
                split: SplitTrigger::SizeExceeds { max_size_mb },
                merge: MergeTrigger::Disabled,
                quota: None,
            },
            SizingMetric::AverageSize { split_factor } => {
                let average = sizes.average_mb(regions)?;
                debug!("{} regions, average size {:.1} MB", regions.len(), average);
                ScanParams {
                    split: SplitTrigger::FactorOfAverage {
                        factor: split_factor,
                        average,
                    },
                    merge: MergeTrigger::PairSumBelowAverage { average },
                    quota: None,
                }
            }
            SizingMetric::MinCount { min_count } => {
                if regions.len() >= min_count {
                    return Ok(Vec::new());
                }
                let average = sizes.average_mb(regions)?;
                debug!(
                    "{} regions under min {}, splitting candidates over avg {:.1} MB",
                    regions.len(),
                    min_count,
                    average
                );
                let split = if regions.len() == 1 {
                    SplitTrigger::Unconditional
                } else {
                    SplitTrigger::ExceedsAverage { average }
                };
                ScanParams {
                    split,
                    merge: MergeTrigger::Disabled,
                    quota: Some(min_count - regions.len()),
                }
            }
            SizingMetric::MaxCount {
                max_count,
                pair_below_average,
            } => {
                if regions.len() <= max_count {
                    return Ok(Vec::new());
                }
                let merge = if pair_below_average {
                    let average = sizes.average_mb(regions)?;
                    MergeTrigger::BothBelowAverage { average }
                } else {
                    MergeTrigger::Unconditional
                };
                debug!(
                    "{} regions over max {}, merging the excess",
                    regions.len(),
                    max_count
                );
                ScanParams {
                    split: SplitTrigger::Disabled,
                    merge,
                    quota: Some(regions.len() - max_count),
                }
            }
            SizingMetric::TierBalance {
                max_size_mb,
                split_factor,
                min_count,
            } => {
                let average = sizes.average_mb(regions)?;
                if regions.len() < min_count {
                    debug!(
                        "{} regions under min {}, splitting candidates over avg {:.1} MB",
                        regions.len(),
                        min_count,
                        average
                    );
                    ScanParams {
                        split: SplitTrigger::ExceedsAverage { average },
                        merge: MergeTrigger::Disabled,
                        quota: Some(min_count - regions.len()),
                    }
                } else {
                    ScanParams {
                        split: SplitTrigger::SizeOrFactorOfAverage {
                            max_size_mb,
                            factor: split_factor,
                            average,
                        },
                        merge: MergeTrigger::PairSumBelowAverage { average },
                        quota: None,
                    }
                }
            }
        };

        Ok(scan_regions(regions, sizes, &params))
    }
}

impl fmt::Display for SizingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingMetric::MaxSize { max_size_mb } => write!(f, "max-size(max={max_size_mb} MB)"),
            SizingMetric::AverageSize { split_factor } => {
                write!(f, "average-size(split_factor={split_factor})")
            }
            SizingMetric::MinCount { min_count } => write!(f, "min-count(min={min_count})"),
            SizingMetric::MaxCount {
                max_count,
                pair_below_average,
            } => write!(f, "max-count(max={max_count}, pair_below_average={pair_below_average})"),
            SizingMetric::TierBalance {
                max_size_mb,
                split_factor,
                min_count,
            } => write!(
                f,
                "tier-balance(max={max_size_mb} MB, split_factor={split_factor}, min={min_count})"
            ),
        }
    }
}

/// True when the table must not be normalized at all.
fn rejected(table: &TableName) -> bool {
    if table.is_system() {
        debug!("normalization of system table {} isn't allowed", table);
        return true;
    }
    false
}

/// Whole-table granularity: one scan over the full ordered list.
#[derive(Debug)]
pub struct TablePolicy {
    metric: SizingMetric,
}

impl TablePolicy {
    pub fn new(metric: SizingMetric) -> Self {
        Self { metric }
    }
}

impl fmt::Display for TablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table-policy[{}]", self.metric)
    }
}

impl NormalizationPolicy for TablePolicy {
    fn compute_plan(
        &self,
        table: &TableName,
        ctx: &PlanningContext<'_>,
    ) -> Result<NormalizationPlan> {
        if rejected(table) {
            return Ok(NormalizationPlan::empty());
        }
        info!("normalizing table {} with {}", table, self);
        let actions = self.metric.actions(ctx.regions, ctx.sizes)?;
        Ok(NormalizationPlan::new(actions))
    }
}

/// Staged granularity: classify into hot/warm/cold, then run the same scan
/// per tier with tier-specific thresholds, concatenating the results.
#[derive(Debug)]
pub struct StagedPolicy {
    stage: StageOptions,
    hot: SizingMetric,
    warm: SizingMetric,
    cold: SizingMetric,
}

impl StagedPolicy {
    pub fn new(stage: StageOptions, hot: SizingMetric, warm: SizingMetric, cold: SizingMetric) -> Self {
        Self {
            stage,
            hot,
            warm,
            cold,
        }
    }

    /// The same metric in every tier.
    pub fn uniform(stage: StageOptions, metric: SizingMetric) -> Self {
        Self::new(stage, metric.clone(), metric.clone(), metric)
    }

    fn tiers(&self) -> [(Tier, &SizingMetric, bool); 3] {
        [
            (Tier::Hot, &self.hot, self.stage.skip_hot),
            (Tier::Warm, &self.warm, self.stage.skip_warm),
            (Tier::Cold, &self.cold, self.stage.skip_cold),
        ]
    }
}

impl fmt::Display for StagedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "staged-policy[hot={}, warm={}, cold={}]",
            self.hot, self.warm, self.cold
        )
    }
}

impl NormalizationPolicy for StagedPolicy {
    fn compute_plan(
        &self,
        table: &TableName,
        ctx: &PlanningContext<'_>,
    ) -> Result<NormalizationPlan> {
        if rejected(table) {
            return Ok(NormalizationPlan::empty());
        }

        let stages = classify(ctx.regions, &self.stage, ctx.now)?;

        let mut plan = NormalizationPlan::empty();
        for (tier, metric, skip) in self.tiers() {
            if skip {
                debug!("skipping {} regions of table {}", tier, table);
                continue;
            }
            let regions = stages.tier(tier);
            if regions.is_empty() {
                continue;
            }
            info!(
                "normalizing {} regions of table {} with {}: {} regions",
                tier,
                table,
                metric,
                regions.len()
            );
            plan.extend(metric.actions(regions, ctx.sizes)?);
        }
        Ok(plan)
    }
}

/// Builds the policy list the driver runs, from the recognized options.
/// Mirrors the selection order of the admin tool: max-size, min-count,
/// max-count, average-size, tier-balance.
pub fn policies_from_config(config: &NormalizerConfig) -> Vec<Box<dyn NormalizationPolicy>> {
    let mut policies: Vec<Box<dyn NormalizationPolicy>> = Vec::new();
    let staged = config.run.staged;

    if config.max_size.enabled {
        let opts = &config.max_size;
        if staged {
            policies.push(Box::new(StagedPolicy::new(
                config.stage.clone(),
                SizingMetric::MaxSize {
                    max_size_mb: opts.hot_max_size_mb,
                },
                SizingMetric::MaxSize {
                    max_size_mb: opts.warm_max_size_mb,
                },
                SizingMetric::MaxSize {
                    max_size_mb: opts.cold_max_size_mb,
                },
            )));
        } else {
            policies.push(Box::new(TablePolicy::new(SizingMetric::MaxSize {
                max_size_mb: opts.max_size_mb,
            })));
        }
    }

    if config.min_count.enabled {
        let opts = &config.min_count;
        if staged {
            policies.push(Box::new(StagedPolicy::new(
                config.stage.clone(),
                SizingMetric::MinCount {
                    min_count: opts.hot_min_count,
                },
                SizingMetric::MinCount {
                    min_count: opts.warm_min_count,
                },
                SizingMetric::MinCount {
                    min_count: opts.cold_min_count,
                },
            )));
        } else {
            policies.push(Box::new(TablePolicy::new(SizingMetric::MinCount {
                min_count: opts.min_count,
            })));
        }
    }

    if config.max_count.enabled {
        let opts = &config.max_count;
        if staged {
            policies.push(Box::new(StagedPolicy::new(
                config.stage.clone(),
                SizingMetric::MaxCount {
                    max_count: opts.hot_max_count,
                    pair_below_average: opts.pair_below_average,
                },
                SizingMetric::MaxCount {
                    max_count: opts.warm_max_count,
                    pair_below_average: opts.pair_below_average,
                },
                SizingMetric::MaxCount {
                    max_count: opts.cold_max_count,
                    pair_below_average: opts.pair_below_average,
                },
            )));
        } else {
            policies.push(Box::new(TablePolicy::new(SizingMetric::MaxCount {
                max_count: opts.max_count,
                pair_below_average: opts.pair_below_average,
            })));
        }
    }

    if config.average_size.enabled {
        let metric = SizingMetric::AverageSize {
            split_factor: config.average_size.split_factor,
        };
        if staged {
            policies.push(Box::new(StagedPolicy::uniform(config.stage.clone(), metric)));
        } else {
            policies.push(Box::new(TablePolicy::new(metric)));
        }
    }

    if config.tier_balance.enabled {
        // The mixed balancer is inherently per-tier; the ceilings come from
        // the per-tier max sizes.
        let opts = &config.tier_balance;
        let metric = |max_size_mb| SizingMetric::TierBalance {
            max_size_mb,
            split_factor: opts.split_factor,
            min_count: opts.min_count,
        };
        policies.push(Box::new(StagedPolicy::new(
            config.stage.clone(),
            metric(config.max_size.hot_max_size_mb),
            metric(config.max_size.warm_max_size_mb),
            metric(config.max_size.cold_max_size_mb),
        )));
    }

    policies
}
