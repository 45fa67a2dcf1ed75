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

//! Cluster-facing API of the range-partitioned store: table and region
//! descriptors, per-region load stats and the admin interface the
//! normalization engine drives. Contains no policy.

pub mod admin;
pub mod error;
pub mod load;
pub mod region;
pub mod table;

pub use admin::{ClusterAdmin, ClusterAdminRef};
pub use load::{Peer, RegionLoadStat};
pub use region::{RegionInfo, RegionName};
pub use table::TableName;
