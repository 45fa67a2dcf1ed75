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

use serde::{Deserialize, Serialize};

/// Namespace reserved for the store's internal bookkeeping tables.
pub const SYSTEM_NAMESPACE: &str = "system";

/// Namespace assumed when a table name carries no namespace qualifier.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Fully qualified table name, `namespace:table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableName {
    pub namespace: String,
    pub table: String,
}

impl TableName {
    pub fn new(namespace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            table: table.into(),
        }
    }

    /// Parses `namespace:table`; a bare name falls into the default namespace.
    pub fn parse(full_name: &str) -> Self {
        match full_name.split_once(':') {
            Some((namespace, table)) => Self::new(namespace, table),
            None => Self::new(DEFAULT_NAMESPACE, full_name),
        }
    }

    /// System tables are managed by the store itself and must never be
    /// restructured from the outside.
    pub fn is_system(&self) -> bool {
        self.namespace == SYSTEM_NAMESPACE
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.table)
    }
}
