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

//! Drives normalization cycles: policies run one after another, each plan
//! fully computed, ordered and executed before the next policy starts, so
//! no two policies restructure the same table concurrently.

use chrono::{NaiveDate, Utc};
use common_telemetry::{debug, error, info};
use snafu::ResultExt;
use store_api::admin::ClusterAdminRef;
use store_api::table::TableName;

use crate::config::NormalizerConfig;
use crate::error::{AdminSnafu, Result};
use crate::executor::PlanExecutor;
use crate::load::RegionSizeSnapshot;
use crate::policy::{policies_from_config, NormalizationPolicy, PlanningContext};

pub struct NormalizationDriver {
    admin: ClusterAdminRef,
    config: NormalizerConfig,
    policies: Vec<Box<dyn NormalizationPolicy>>,
    executor: PlanExecutor,
}

impl NormalizationDriver {
    /// Builds a driver running the policies the config enables.
    pub fn try_new(admin: ClusterAdminRef, config: NormalizerConfig) -> Result<Self> {
        let policies = policies_from_config(&config);
        Self::with_policies(admin, config, policies)
    }

    /// Builds a driver running the given policies.
    pub fn with_policies(
        admin: ClusterAdminRef,
        config: NormalizerConfig,
        policies: Vec<Box<dyn NormalizationPolicy>>,
    ) -> Result<Self> {
        config.validate()?;
        let executor = PlanExecutor::new(admin.clone(), config.run.poll_interval);
        Ok(Self {
            admin,
            config,
            policies,
            executor,
        })
    }

    /// Runs the configured number of cycles against `table`, sleeping the
    /// configured interval in between.
    pub async fn run(&self, table: &TableName) -> Result<()> {
        let iterations = self.config.run.iterations;
        for iteration in 1..=iterations {
            if iteration > 1 {
                tokio::time::sleep(self.config.run.cycle_interval).await;
            }
            info!(
                "starting iteration {}/{} for table {}",
                iteration, iterations, table
            );
            self.run_cycle(table, Utc::now().date_naive()).await?;
            info!("end iteration {}/{}", iteration, iterations);
        }
        Ok(())
    }

    /// One cycle at a fixed `now`. Policy errors (bad date prefixes, bad
    /// thresholds) skip that policy and continue; connectivity errors
    /// propagate.
    pub async fn run_cycle(&self, table: &TableName, now: NaiveDate) -> Result<()> {
        for policy in &self.policies {
            info!("starting policy {}", policy);

            // Fresh snapshots per policy: an earlier policy's actions have
            // already changed the region layout.
            let regions = self.admin.table_regions(table).await.context(AdminSnafu)?;
            if regions.is_empty() {
                info!("table {} has no regions to normalize", table);
                continue;
            }
            let sizes = RegionSizeSnapshot::collect(self.admin.as_ref(), table, &regions).await?;
            let ctx = PlanningContext {
                regions: &regions,
                sizes: &sizes,
                now,
            };

            let mut plan = match policy.compute_plan(table, &ctx) {
                Ok(plan) => plan,
                Err(e) => {
                    error!(
                        "policy {} failed for table {}, skipping this cycle: {}",
                        policy, table, e
                    );
                    continue;
                }
            };
            if plan.is_empty() {
                info!("no normalization needed, regions look good for table {}", table);
                continue;
            }
            plan.order();

            if self.config.run.plan_only {
                for action in plan.actions() {
                    info!("planned (not executed): {}", action);
                }
                if let Ok(json) = serde_json::to_string(&plan) {
                    debug!("computed plan: {}", json);
                }
                continue;
            }

            let report = self.executor.execute(&plan).await?;
            info!(
                "policy {}: {} actions applied, {} failed",
                policy, report.applied, report.failed
            );
        }
        Ok(())
    }
}
