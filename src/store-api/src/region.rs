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

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::table::TableName;

/// Stable identity of a region (the store's encoded region name). Identities
/// change when a region is split or merged; a name never refers to two
/// different key ranges over time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionName(String);

impl RegionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Descriptor of one region: a contiguous `[start_key, end_key)` range of a
/// table. An empty start key is the minimum key, an empty end key is
/// unbounded. The regions of one table are totally ordered by start key;
/// the store guarantees they are contiguous and non-overlapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub name: RegionName,
    pub table: TableName,
    pub start_key: Vec<u8>,
    pub end_key: Vec<u8>,
    pub offline: bool,
}

impl RegionInfo {
    pub fn new(
        name: impl Into<String>,
        table: TableName,
        start_key: impl Into<Vec<u8>>,
        end_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: RegionName::new(name),
            table,
            start_key: start_key.into(),
            end_key: end_key.into(),
            offline: false,
        }
    }

    /// Whether `key` falls inside this region's range.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.start_key.as_slice() <= key && (self.end_key.is_empty() || key < self.end_key.as_slice())
    }

    /// True when the end key is unbounded, i.e. this is the last region.
    pub fn is_last(&self) -> bool {
        self.end_key.is_empty()
    }
}

impl PartialOrd for RegionInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RegionInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        // The empty start key sorts first, which is exactly the first region.
        self.start_key
            .cmp(&other.start_key)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for RegionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}..{}]",
            self.name,
            String::from_utf8_lossy(&self.start_key),
            String::from_utf8_lossy(&self.end_key),
        )
    }
}
