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

use std::fmt;

use serde::Serialize;
use store_api::region::RegionInfo;

/// One split or merge intent. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NormalizationAction {
    /// Split a region, at `split_key` or at a store-chosen midpoint.
    Split {
        region: RegionInfo,
        split_key: Option<Vec<u8>>,
    },
    /// Merge two adjacent regions. `force` permits merging regions whose
    /// sizes intentionally differ, e.g. across a tier boundary.
    Merge {
        left: RegionInfo,
        right: RegionInfo,
        force: bool,
    },
}

impl NormalizationAction {
    pub fn is_split(&self) -> bool {
        matches!(self, NormalizationAction::Split { .. })
    }
}

impl fmt::Display for NormalizationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationAction::Split { region, split_key } => match split_key {
                Some(key) => write!(
                    f,
                    "split {} at {:?}",
                    region.name,
                    String::from_utf8_lossy(key)
                ),
                None => write!(f, "split {}", region.name),
            },
            NormalizationAction::Merge { left, right, force } => {
                write!(
                    f,
                    "merge {} + {}{}",
                    left.name,
                    right.name,
                    if *force { " (forced)" } else { "" }
                )
            }
        }
    }
}

/// The ordered action list produced by one policy invocation. Discarded
/// after execution, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationPlan {
    actions: Vec<NormalizationAction>,
}

impl NormalizationPlan {
    pub fn new(actions: Vec<NormalizationAction>) -> Self {
        Self { actions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn actions(&self) -> &[NormalizationAction] {
        &self.actions
    }

    pub fn push(&mut self, action: NormalizationAction) {
        self.actions.push(action);
    }

    pub fn extend(&mut self, actions: Vec<NormalizationAction>) {
        self.actions.extend(actions);
    }

    /// Places all splits before all merges, preserving the relative order
    /// within each group. Splitting first keeps a merge from touching a
    /// region that a neighboring split is about to invalidate, and gives
    /// size-overflow remediation priority over count reduction.
    pub fn order(&mut self) {
        self.actions.sort_by_key(|action| !action.is_split());
    }
}
