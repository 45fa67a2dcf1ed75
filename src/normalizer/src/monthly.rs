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

//! Pre-splits the upcoming month.
//!
//! Date-prefixed tables grow at the key space's end: a new month lands in
//! the last region until something splits it. This module clones the split
//! pattern of the previous month onto a new `YYYYMM` prefix, so the new
//! month starts out with the region layout the old one converged to.

use common_telemetry::{debug, info};
use snafu::{ensure, ResultExt};
use store_api::admin::ClusterAdminRef;
use store_api::table::TableName;

use crate::error::{AdminSnafu, InvalidDatePrefixSnafu, Result};
use crate::executor::{ExecutionReport, PlanExecutor};
use crate::plan::{NormalizationAction, NormalizationPlan};
use crate::stage::{self, MONTH_PREFIX_LEN};

pub struct MonthlySplitter {
    admin: ClusterAdminRef,
}

impl MonthlySplitter {
    pub fn new(admin: ClusterAdminRef) -> Self {
        Self { admin }
    }

    /// Computes the keys at which to split, by taking every region at or
    /// after the one owning the previous month's key and rewriting its
    /// start key's date prefix to `new_prefix`.
    pub async fn split_points(&self, table: &TableName, new_prefix: &str) -> Result<Vec<Vec<u8>>> {
        ensure!(
            new_prefix.len() == MONTH_PREFIX_LEN,
            InvalidDatePrefixSnafu { prefix: new_prefix }
        );
        stage::parse_month_prefix(new_prefix.as_bytes())?;
        let template_month = stage::previous_month(new_prefix)?;

        let regions = self.admin.table_regions(table).await.context(AdminSnafu)?;
        let template = stage::regions_at_or_after(&regions, template_month.as_bytes());
        debug!(
            "cloning the split pattern of {} regions from month {} onto {}",
            template.len(),
            template_month,
            new_prefix
        );

        let mut points = Vec::with_capacity(template.len());
        for region in template {
            if region.start_key.is_empty() {
                // The unbounded minimum carries no date prefix to rewrite.
                continue;
            }
            stage::parse_month_prefix(&region.start_key)?;
            let mut key = new_prefix.as_bytes().to_vec();
            key.extend_from_slice(&region.start_key[MONTH_PREFIX_LEN..]);
            points.push(key);
        }
        Ok(points)
    }

    /// Splits `table` at every cloned point. The owner of each key is
    /// re-resolved (cache bypassed) right before its split, because earlier
    /// splits keep changing region identities; execution waits for
    /// quiescence between steps. Points the table is already split at are
    /// skipped.
    pub async fn run(
        &self,
        table: &TableName,
        new_prefix: &str,
        executor: &PlanExecutor,
    ) -> Result<ExecutionReport> {
        let points = self.split_points(table, new_prefix).await?;

        let mut report = ExecutionReport::default();
        for key in points {
            let target = self
                .admin
                .locate_region(table, &key, true)
                .await
                .context(AdminSnafu)?;
            if target.start_key == key {
                debug!(
                    "table {} is already split at {:?}",
                    table,
                    String::from_utf8_lossy(&key)
                );
                continue;
            }

            let plan = NormalizationPlan::new(vec![NormalizationAction::Split {
                region: target,
                split_key: Some(key),
            }]);
            let partial = executor.execute(&plan).await?;
            report.applied += partial.applied;
            report.failed += partial.failed;
        }
        info!(
            "monthly pre-split of table {} onto {}: {} applied, {} failed",
            table, new_prefix, report.applied, report.failed
        );
        Ok(report)
    }
}
