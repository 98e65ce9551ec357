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

//! Environment-sourced configuration (spec §6, "Environment"). An owned,
//! explicit struct rather than module-level globals.

use std::env;

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Rolling execution log path, if statement auditing is enabled.
    pub profile_location: Option<String>,
    /// Remote cache connection string, used when no explicit backend is
    /// passed to the cache constructor.
    pub redis_connection: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            profile_location: env::var("PROFILE_LOCATION").ok(),
            redis_connection: env::var("REDIS_CONNECTION").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_vars_yield_none() {
        env::remove_var("PROFILE_LOCATION");
        env::remove_var("REDIS_CONNECTION");
        let config = Config::from_env();
        assert!(config.profile_location.is_none());
        assert!(config.redis_connection.is_none());
    }

    #[test]
    fn present_env_vars_are_captured() {
        env::set_var("PROFILE_LOCATION", "/tmp/query.log");
        let config = Config::from_env();
        assert_eq!(config.profile_location.as_deref(), Some("/tmp/query.log"));
        env::remove_var("PROFILE_LOCATION");
    }
}
