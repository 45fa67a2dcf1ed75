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

use std::sync::Arc;

use crate::error::Result;
use crate::load::{Peer, RegionLoadStat};
use crate::region::{RegionInfo, RegionName};
use crate::table::TableName;

/// Administrative interface of the cluster, as consumed by the
/// normalization engine. Splits and merges only submit the intent; the
/// cluster reconciles asynchronously and the resulting reassignments are
/// observable through [`ClusterAdmin::regions_in_transition`].
#[async_trait::async_trait]
pub trait ClusterAdmin: Send + Sync {
    /// Returns the regions of `table`, ordered by start key.
    async fn table_regions(&self, table: &TableName) -> Result<Vec<RegionInfo>>;

    /// Resolves the region owning `key`. `refresh` bypasses any routing
    /// cache, required after a split or merge changed region identities.
    async fn locate_region(
        &self,
        table: &TableName,
        key: &[u8],
        refresh: bool,
    ) -> Result<RegionInfo>;

    /// Returns each region of `table` together with the peer serving it.
    async fn region_locations(&self, table: &TableName) -> Result<Vec<(RegionInfo, Peer)>>;

    /// Returns the per-region load stats reported by one node.
    async fn node_load(&self, peer: &Peer) -> Result<Vec<RegionLoadStat>>;

    /// Returns the regions currently mid-reassignment, across all tables.
    async fn regions_in_transition(&self) -> Result<Vec<RegionName>>;

    /// Splits `region` at `split_key`, or at a store-chosen midpoint when
    /// no key is given.
    async fn split_region(&self, region: &RegionName, split_key: Option<&[u8]>) -> Result<()>;

    /// Merges two adjacent regions. `force` permits merging regions whose
    /// sizes intentionally differ, e.g. across a tier boundary.
    async fn merge_regions(&self, left: &RegionName, right: &RegionName, force: bool)
        -> Result<()>;
}

pub type ClusterAdminRef = Arc<dyn ClusterAdmin>;
