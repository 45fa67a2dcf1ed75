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

use common_telemetry::info;
use snafu::ResultExt;
use store_api::admin::ClusterAdminRef;

use crate::error::{AdminSnafu, Result};

/// Observed reassignment state of the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuiescenceState {
    /// Some regions are still mid-reassignment.
    Polling { in_transition: usize },
    /// No region is mid-reassignment.
    Quiescent,
}

/// Blocks until the cluster has no region mid-reassignment.
///
/// Must be consulted after every split or merge before issuing the next
/// dependent command: identity lookups are only valid once reassignment
/// settles. The wait is deliberately unbounded (cluster convergence time is
/// externally determined); the returned future is cancellable, so callers
/// needing a deadline wrap it in `tokio::time::timeout`.
pub struct TransitionGuard {
    admin: ClusterAdminRef,
    poll_interval: Duration,
}

impl TransitionGuard {
    pub fn new(admin: ClusterAdminRef, poll_interval: Duration) -> Self {
        Self {
            admin,
            poll_interval,
        }
    }

    /// One status query.
    pub async fn poll_once(&self) -> Result<QuiescenceState> {
        let in_transition = self
            .admin
            .regions_in_transition()
            .await
            .context(AdminSnafu)?;
        if in_transition.is_empty() {
            Ok(QuiescenceState::Quiescent)
        } else {
            Ok(QuiescenceState::Polling {
                in_transition: in_transition.len(),
            })
        }
    }

    /// Polls until quiescent. A cluster that reports a non-empty transition
    /// set N times costs exactly N+1 status queries.
    pub async fn await_quiescence(&self) -> Result<()> {
        loop {
            match self.poll_once().await? {
                QuiescenceState::Quiescent => return Ok(()),
                QuiescenceState::Polling { in_transition } => {
                    info!(
                        "{} regions in transition, sleeping {:?} until quiescent",
                        in_transition, self.poll_interval
                    );
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}
