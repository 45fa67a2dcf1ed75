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

use std::time::Duration;

use common_telemetry::{debug, error, info};
use store_api::admin::ClusterAdminRef;

use crate::error::Result;
use crate::guard::TransitionGuard;
use crate::plan::{NormalizationAction, NormalizationPlan};

/// Outcome of one plan execution. Partial execution is an accepted outcome:
/// failed actions are counted, not fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub applied: usize,
    pub failed: usize,
}

/// Applies an ordered plan through the admin interface, strictly
/// sequentially, waiting for the cluster to quiesce after every
/// state-changing call.
pub struct PlanExecutor {
    admin: ClusterAdminRef,
    guard: TransitionGuard,
}

impl PlanExecutor {
    pub fn new(admin: ClusterAdminRef, poll_interval: Duration) -> Self {
        let guard = TransitionGuard::new(admin.clone(), poll_interval);
        Self { admin, guard }
    }

    pub fn guard(&self) -> &TransitionGuard {
        &self.guard
    }

    /// Executes `plan` action by action. A failed action (e.g. the region is
    /// already gone) is logged and skipped; a failure while waiting for
    /// quiescence is a connectivity problem and propagates.
    pub async fn execute(&self, plan: &NormalizationPlan) -> Result<ExecutionReport> {
        let mut report = ExecutionReport::default();
        if plan.is_empty() {
            return Ok(report);
        }

        info!("starting region normalization, {} actions", plan.len());
        for action in plan.actions() {
            debug!("executing {}", action);
            let result = match action {
                NormalizationAction::Split { region, split_key } => {
                    self.admin
                        .split_region(&region.name, split_key.as_deref())
                        .await
                }
                NormalizationAction::Merge { left, right, force } => {
                    self.admin
                        .merge_regions(&left.name, &right.name, *force)
                        .await
                }
            };

            match result {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    error!("failed to execute {}, continuing: {}", action, e);
                    report.failed += 1;
                    // Nothing was changed, no reassignment to wait for.
                    continue;
                }
            }

            self.guard.await_quiescence().await?;
        }
        info!(
            "end of region normalization, {} applied, {} failed",
            report.applied, report.failed
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use store_api::region::RegionInfo;

    use super::*;
    use crate::test_util::{mock_table, region, AdminOp, MockCluster};

    fn split(region: &RegionInfo, key: &str) -> NormalizationAction {
        NormalizationAction::Split {
            region: region.clone(),
            split_key: Some(key.as_bytes().to_vec()),
        }
    }

    fn merge(left: &RegionInfo, right: &RegionInfo, force: bool) -> NormalizationAction {
        NormalizationAction::Merge {
            left: left.clone(),
            right: right.clone(),
            force,
        }
    }

    #[tokio::test]
    async fn test_execute_sequential_with_quiescence_between() {
        let table = mock_table();
        let r0 = region("r0", "", "201806");
        let r1 = region("r1", "201806", "201809");
        let r2 = region("r2", "201809", "");
        let cluster = Arc::new(MockCluster::new(table).with_entries(vec![
            (r0.clone(), 1, 10),
            (r1.clone(), 1, 1),
            (r2.clone(), 1, 1),
        ]));

        let executor = PlanExecutor::new(cluster.clone(), Duration::from_millis(1));
        let plan = NormalizationPlan::new(vec![split(&r0, "201803"), merge(&r1, &r2, true)]);
        let report = executor.execute(&plan).await.unwrap();

        assert_eq!(2, report.applied);
        assert_eq!(0, report.failed);
        let ops = cluster.recorded_ops();
        assert_eq!(
            vec![
                AdminOp::Split {
                    region: r0.name.clone(),
                    split_key: Some(b"201803".to_vec()),
                },
                AdminOp::Merge {
                    left: r1.name.clone(),
                    right: r2.name.clone(),
                    force: true,
                },
            ],
            ops
        );
        // One quiescence check per state-changing call.
        assert_eq!(2, cluster.transition_queries());
    }

    #[tokio::test]
    async fn test_failed_action_is_skipped_not_fatal() {
        let table = mock_table();
        let r0 = region("r0", "", "201806");
        let r1 = region("r1", "201806", "201809");
        let r2 = region("r2", "201809", "");
        let cluster = Arc::new(MockCluster::new(table).with_entries(vec![
            (r0.clone(), 1, 10),
            (r1.clone(), 1, 1),
            (r2.clone(), 1, 1),
        ]));
        // The first split targets a region the cluster no longer knows.
        let gone = region("gone", "201710", "201712");

        let executor = PlanExecutor::new(cluster.clone(), Duration::from_millis(1));
        let plan = NormalizationPlan::new(vec![
            split(&gone, "201711"),
            merge(&r1, &r2, false),
        ]);
        let report = executor.execute(&plan).await.unwrap();

        assert_eq!(1, report.applied);
        assert_eq!(1, report.failed);
        // No quiescence wait for the action that changed nothing.
        assert_eq!(1, cluster.transition_queries());
    }

    #[tokio::test]
    async fn test_empty_plan_is_a_no_op() {
        let cluster = Arc::new(MockCluster::new(mock_table()));
        let executor = PlanExecutor::new(cluster.clone(), Duration::from_millis(1));
        let report = executor.execute(&NormalizationPlan::empty()).await.unwrap();
        assert_eq!(ExecutionReport::default(), report);
        assert!(cluster.recorded_ops().is_empty());
        assert_eq!(0, cluster.transition_queries());
    }
}
