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

use snafu::{Location, Snafu};

use crate::region::RegionName;
use crate::table::TableName;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("No region of table {} covers key {:?}", table, key))]
    RegionNotFound {
        table: TableName,
        key: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Region {} does not exist", region))]
    NoSuchRegion {
        region: RegionName,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Regions {} and {} are not adjacent", left, right))]
    NotAdjacent {
        left: RegionName,
        right: RegionName,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Node {} did not report a load snapshot", peer_id))]
    NodeLoadUnavailable {
        peer_id: u64,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Cluster unavailable: {}", reason))]
    Unavailable {
        reason: String,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
