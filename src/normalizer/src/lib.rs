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

//! Region normalization for date-partitioned tables.
//!
//! The engine keeps the region layout of a table within policy bounds:
//! regions over a size ceiling split, undersized neighbors merge, and the
//! age tiers derived from the `YYYYMM` key prefix (hot/warm/cold) get their
//! own thresholds. Plans are computed from per-cycle snapshots, ordered so
//! splits run before merges, and executed one action at a time with a
//! quiescence wait in between.

pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod guard;
pub mod load;
pub mod monthly;
pub mod plan;
pub mod policy;
pub(crate) mod scan;
pub mod stage;
#[cfg(test)]
pub(crate) mod test_util;

pub use config::NormalizerConfig;
pub use driver::NormalizationDriver;
pub use error::{Error, Result};
pub use executor::{ExecutionReport, PlanExecutor};
pub use guard::{QuiescenceState, TransitionGuard};
pub use load::RegionSizeSnapshot;
pub use monthly::MonthlySplitter;
pub use plan::{NormalizationAction, NormalizationPlan};
pub use policy::{
    policies_from_config, NormalizationPolicy, PlanningContext, SizingMetric, StagedPolicy,
    TablePolicy,
};
pub use stage::{classify, StageBoundaries, Stages, Tier};
