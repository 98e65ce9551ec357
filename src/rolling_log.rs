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

//! Append-only log of executed statements, gated on `PROFILE_LOCATION`
//! (spec §6). Built once by whoever owns the cursor's connection, not a
//! process-wide global.

use std::fs::OpenOptions;
use std::io::Write;

use parking_lot::Mutex;

pub struct RollingLog {
    file: Mutex<std::fs::File>,
}

impl RollingLog {
    /// Opens (creating if needed) the log file at `path` in append mode.
    pub fn open(path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(RollingLog { file: Mutex::new(file) })
    }

    /// Appends one line. Write failures are logged, not propagated --
    /// losing an audit line must never fail the query it is recording.
    pub fn append(&self, line: &str) {
        let mut file = self.file.lock();
        if let Err(err) = writeln!(file, "{line}") {
            log::warn!("rolling log write failed: {err}");
        }
    }
}
