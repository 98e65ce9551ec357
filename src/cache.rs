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

//! The remote cache boundary (spec §6). `KeyValueStore` is the trait a
//! concrete backend (Valkey, Redis, ...) would implement; no such backend
//! ships here. `DegradingCache` is the one piece of cache *behavior* that
//! is part of this crate's contract: the consecutive-failure degradation
//! policy described in spec §5-§7.

/// A key-value backend. Errors are out-of-band (not `Result`) because the
/// degradation policy treats every failure identically regardless of cause.
pub trait KeyValueStore {
    fn get(&mut self, key: &[u8]) -> CacheOutcome<Option<Vec<u8>>>;
    fn set(&mut self, key: &[u8], value: &[u8]) -> CacheOutcome<()>;
}

pub enum CacheOutcome<T> {
    Ok(T),
    Err,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub skips: u64,
    pub errors: u64,
}

const FAILURE_THRESHOLD: u32 = 10;

/// Wraps any `KeyValueStore`, disabling it after `FAILURE_THRESHOLD`
/// consecutive errors for the remainder of the process lifetime. A single
/// successful `get` resets the counter; a `set` failure jumps straight to
/// the threshold rather than incrementing by one (spec §6, "Cache failure
/// policy").
pub struct DegradingCache<B: KeyValueStore> {
    backend: B,
    consecutive_failures: u32,
    pub counters: CacheCounters,
}

impl<B: KeyValueStore> DegradingCache<B> {
    pub fn new(backend: B) -> Self {
        DegradingCache {
            backend,
            consecutive_failures: 0,
            counters: CacheCounters::default(),
        }
    }

    fn disabled(&self) -> bool {
        self.consecutive_failures >= FAILURE_THRESHOLD
    }

    pub fn get(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        if self.disabled() {
            self.counters.skips += 1;
            return None;
        }
        match self.backend.get(key) {
            CacheOutcome::Ok(value) => {
                self.consecutive_failures = 0;
                match &value {
                    Some(_) => self.counters.hits += 1,
                    None => self.counters.misses += 1,
                }
                value
            }
            CacheOutcome::Err => {
                self.consecutive_failures += 1;
                self.counters.errors += 1;
                if self.disabled() {
                    log::warn!("cache disabled after {FAILURE_THRESHOLD} consecutive errors");
                }
                None
            }
        }
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) {
        if self.disabled() {
            self.counters.skips += 1;
            return;
        }
        match self.backend.set(key, value) {
            CacheOutcome::Ok(()) => {
                self.consecutive_failures = 0;
                self.counters.sets += 1;
            }
            CacheOutcome::Err => {
                self.consecutive_failures = FAILURE_THRESHOLD;
                self.counters.errors += 1;
                log::warn!("cache disabled after a set failure");
            }
        }
    }
}
