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

//! Per-cycle snapshot of region sizes.

use std::collections::{HashMap, HashSet};

use common_telemetry::{debug, warn};
use itertools::Itertools;
use snafu::{ensure, ResultExt};
use store_api::admin::ClusterAdmin;
use store_api::region::{RegionInfo, RegionName};
use store_api::table::TableName;

use crate::error::{AdminSnafu, EmptyRegionListSnafu, Result};

/// Region sizes in megabytes, as reported by the nodes currently serving
/// the table. Built once per planning cycle and read-only afterwards;
/// staleness is bounded by one polling cycle.
#[derive(Debug, Clone, Default)]
pub struct RegionSizeSnapshot {
    sizes: HashMap<RegionName, u64>,
}

impl RegionSizeSnapshot {
    /// Collects the load report of every node hosting a region of `table`
    /// and indexes the sizes by region name. Offline regions are ignored; a
    /// region the live report does not cover is an anomaly (stale catalog
    /// vs. live load), logged and treated as size 0.
    pub async fn collect(
        admin: &dyn ClusterAdmin,
        table: &TableName,
        regions: &[RegionInfo],
    ) -> Result<Self> {
        let locations = admin.region_locations(table).await.context(AdminSnafu)?;
        let peers = locations
            .iter()
            .map(|(_, peer)| peer.clone())
            .unique_by(|peer| peer.id)
            .collect::<Vec<_>>();

        let wanted = regions
            .iter()
            .filter(|region| {
                if region.offline {
                    debug!("ignoring offline region {}", region.name);
                }
                !region.offline
            })
            .map(|region| region.name.clone())
            .collect::<HashSet<_>>();

        let mut sizes = HashMap::with_capacity(wanted.len());
        for peer in peers {
            let loads = admin.node_load(&peer).await.context(AdminSnafu)?;
            for stat in loads {
                if wanted.contains(&stat.region) {
                    sizes.insert(stat.region, stat.store_file_size_mb);
                }
            }
        }

        for name in &wanted {
            if !sizes.contains_key(name) {
                warn!(
                    "no load reported for region {} of table {}, assuming size 0",
                    name, table
                );
            }
        }
        debug!("collected {} region loads for table {}", sizes.len(), table);

        Ok(Self { sizes })
    }

    /// Builds a snapshot from known sizes, for callers that already hold a
    /// load report.
    pub fn from_sizes(sizes: impl IntoIterator<Item = (RegionName, u64)>) -> Self {
        Self {
            sizes: sizes.into_iter().collect(),
        }
    }

    /// Reported size of `region` in MB; 0 when the live report misses it.
    pub fn size_mb(&self, region: &RegionInfo) -> u64 {
        self.sizes.get(&region.name).copied().unwrap_or(0)
    }

    /// Arithmetic mean over `regions`. The caller decides whether that list
    /// is the whole table or one tier, and must check it is non-empty.
    pub fn average_mb(&self, regions: &[RegionInfo]) -> Result<f64> {
        ensure!(!regions.is_empty(), EmptyRegionListSnafu);
        let total: u64 = regions.iter().map(|region| self.size_mb(region)).sum();
        Ok(total as f64 / regions.len() as f64)
    }
}
