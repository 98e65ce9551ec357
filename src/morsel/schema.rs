// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::sync::atomic::{AtomicU64, Ordering};

use arrow::datatypes::DataType;

/// A stable column identity, independent of display name. Operators
/// reference columns by identity so renames (projection aliases) don't
/// break downstream lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(u64);

impl ColumnId {
    /// Mints a fresh, process-unique identity.
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ColumnId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// For use by code that has already allocated a raw id (e.g. test fixtures).
    pub fn from_raw(raw: u64) -> Self {
        ColumnId(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Default for ColumnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "col#{}", self.0)
    }
}

/// A morsel's column descriptor: stable identity, human-facing name, and
/// declared type. Position within the owning `Morsel`'s column list matches
/// position within the underlying `RecordBatch`.
#[derive(Debug, Clone)]
pub struct SchemaColumn {
    pub identity: ColumnId,
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl SchemaColumn {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        SchemaColumn {
            identity: ColumnId::new(),
            name: name.into(),
            data_type,
            nullable,
        }
    }

    /// A renamed copy that keeps the same identity -- the rename a
    /// projection performs is purely cosmetic.
    pub fn renamed(&self, new_name: impl Into<String>) -> Self {
        SchemaColumn {
            identity: self.identity,
            name: new_name.into(),
            data_type: self.data_type.clone(),
            nullable: self.nullable,
        }
    }

    pub fn widened(&self) -> Self {
        SchemaColumn {
            identity: self.identity,
            name: self.name.clone(),
            data_type: self.data_type.clone(),
            nullable: true,
        }
    }
}
