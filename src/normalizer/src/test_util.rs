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

//! In-memory cluster for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use store_api::admin::ClusterAdmin;
use store_api::error::{NoSuchRegionSnafu, RegionNotFoundSnafu, Result};
use store_api::load::{Peer, RegionLoadStat};
use store_api::region::{RegionInfo, RegionName};
use store_api::table::TableName;

pub(crate) fn mock_table() -> TableName {
    TableName::parse("default:events")
}

pub(crate) fn region(name: &str, start: &str, end: &str) -> RegionInfo {
    RegionInfo::new(name, mock_table(), start, end)
}

/// A recorded admin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AdminOp {
    Split {
        region: RegionName,
        split_key: Option<Vec<u8>>,
    },
    Merge {
        left: RegionName,
        right: RegionName,
        force: bool,
    },
}

#[derive(Debug, Clone)]
struct Entry {
    region: RegionInfo,
    peer: u64,
    size_mb: u64,
}

/// Simulated cluster: an ordered region list with per-peer sizes, a
/// scriptable reassignment status, and a log of the admin commands issued
/// against it. Splits and merges mutate the region list the way the store
/// would, so re-resolving a key after an action observes fresh identities.
pub(crate) struct MockCluster {
    table: TableName,
    entries: Mutex<Vec<Entry>>,
    transition_rounds: Mutex<usize>,
    transition_queries: AtomicUsize,
    ops: Mutex<Vec<AdminOp>>,
}

impl MockCluster {
    pub(crate) fn new(table: TableName) -> Self {
        Self {
            table,
            entries: Mutex::new(Vec::new()),
            transition_rounds: Mutex::new(0),
            transition_queries: AtomicUsize::new(0),
            ops: Mutex::new(Vec::new()),
        }
    }

    /// Seeds `(region, hosting peer id, size MB)` entries, kept in start-key
    /// order.
    pub(crate) fn with_entries(self, entries: Vec<(RegionInfo, u64, u64)>) -> Self {
        {
            let mut guard = self.entries.lock().unwrap();
            *guard = entries
                .into_iter()
                .map(|(region, peer, size_mb)| Entry {
                    region,
                    peer,
                    size_mb,
                })
                .collect();
            guard.sort_by(|a, b| a.region.cmp(&b.region));
        }
        self
    }

    /// Makes the next `rounds` status queries report a non-empty
    /// in-transition set.
    pub(crate) fn script_transition_rounds(&self, rounds: usize) {
        *self.transition_rounds.lock().unwrap() = rounds;
    }

    pub(crate) fn transition_queries(&self) -> usize {
        self.transition_queries.load(Ordering::Relaxed)
    }

    pub(crate) fn recorded_ops(&self) -> Vec<AdminOp> {
        self.ops.lock().unwrap().clone()
    }

    pub(crate) fn region_names(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|entry| entry.region.name.as_str().to_string())
            .collect()
    }

    fn position(entries: &[Entry], name: &RegionName) -> Result<usize> {
        entries
            .iter()
            .position(|entry| &entry.region.name == name)
            .ok_or_else(|| {
                NoSuchRegionSnafu {
                    region: name.clone(),
                }
                .build()
            })
    }
}

#[async_trait::async_trait]
impl ClusterAdmin for MockCluster {
    async fn table_regions(&self, table: &TableName) -> Result<Vec<RegionInfo>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| &entry.region.table == table)
            .map(|entry| entry.region.clone())
            .collect())
    }

    async fn locate_region(
        &self,
        table: &TableName,
        key: &[u8],
        _refresh: bool,
    ) -> Result<RegionInfo> {
        let entries = self.entries.lock().unwrap();
        let regions = entries
            .iter()
            .filter(|entry| &entry.region.table == table)
            .map(|entry| &entry.region)
            .collect::<Vec<_>>();
        regions
            .iter()
            .find(|region| region.contains_key(key))
            .or_else(|| regions.last())
            .map(|region| (*region).clone())
            .ok_or_else(|| {
                RegionNotFoundSnafu {
                    table: table.clone(),
                    key: String::from_utf8_lossy(key).into_owned(),
                }
                .build()
            })
    }

    async fn region_locations(&self, table: &TableName) -> Result<Vec<(RegionInfo, Peer)>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| &entry.region.table == table)
            .map(|entry| {
                (
                    entry.region.clone(),
                    Peer::new(entry.peer, format!("node-{}:4001", entry.peer)),
                )
            })
            .collect())
    }

    async fn node_load(&self, peer: &Peer) -> Result<Vec<RegionLoadStat>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.peer == peer.id)
            .map(|entry| RegionLoadStat {
                region: entry.region.name.clone(),
                store_file_size_mb: entry.size_mb,
            })
            .collect())
    }

    async fn regions_in_transition(&self) -> Result<Vec<RegionName>> {
        self.transition_queries.fetch_add(1, Ordering::Relaxed);
        let mut rounds = self.transition_rounds.lock().unwrap();
        if *rounds > 0 {
            *rounds -= 1;
            Ok(vec![RegionName::new("region-in-transition")])
        } else {
            Ok(Vec::new())
        }
    }

    async fn split_region(&self, region: &RegionName, split_key: Option<&[u8]>) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        let idx = Self::position(&entries, region)?;
        self.ops.lock().unwrap().push(AdminOp::Split {
            region: region.clone(),
            split_key: split_key.map(<[u8]>::to_vec),
        });

        if let Some(key) = split_key {
            let old = entries.remove(idx);
            let mut lower = RegionInfo::new(
                format!("{}/a", old.region.name),
                old.region.table.clone(),
                old.region.start_key.clone(),
                key.to_vec(),
            );
            lower.offline = old.region.offline;
            let upper = RegionInfo::new(
                format!("{}/b", old.region.name),
                old.region.table.clone(),
                key.to_vec(),
                old.region.end_key.clone(),
            );
            entries.insert(
                idx,
                Entry {
                    region: lower,
                    peer: old.peer,
                    size_mb: old.size_mb / 2,
                },
            );
            entries.insert(
                idx + 1,
                Entry {
                    region: upper,
                    peer: old.peer,
                    size_mb: old.size_mb / 2,
                },
            );
        }
        Ok(())
    }

    async fn merge_regions(
        &self,
        left: &RegionName,
        right: &RegionName,
        force: bool,
    ) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        let left_idx = Self::position(&entries, left)?;
        let right_idx = Self::position(&entries, right)?;
        self.ops.lock().unwrap().push(AdminOp::Merge {
            left: left.clone(),
            right: right.clone(),
            force,
        });

        let (left_idx, right_idx) = (left_idx.min(right_idx), left_idx.max(right_idx));
        let right_entry = entries.remove(right_idx);
        let left_entry = entries.remove(left_idx);
        let merged = RegionInfo::new(
            format!("{}+{}", left_entry.region.name, right_entry.region.name),
            left_entry.region.table.clone(),
            left_entry.region.start_key.clone(),
            right_entry.region.end_key.clone(),
        );
        entries.insert(
            left_idx,
            Entry {
                region: merged,
                peer: left_entry.peer,
                size_mb: left_entry.size_mb + right_entry.size_mb,
            },
        );
        Ok(())
    }
}
