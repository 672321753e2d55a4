// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::SalesFetch;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_PROGRESS_EVERY: usize = 100;
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Process settings read from `BONUSCLIP_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    pub batch_size: usize,
    pub sales_fetch: SalesFetch,
    pub progress_every: usize,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            batch_size: DEFAULT_BATCH_SIZE,
            sales_fetch: SalesFetch::Batch,
            progress_every: DEFAULT_PROGRESS_EVERY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset, empty or unparsable values
    /// keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();
        Self {
            db_path: get("BONUSCLIP_DB").map(PathBuf::from),
            batch_size: parse_or(get("BONUSCLIP_BATCH_SIZE"), defaults.batch_size).max(1),
            sales_fetch: parse_or(get("BONUSCLIP_SALES_FETCH"), defaults.sales_fetch),
            progress_every: parse_or(get("BONUSCLIP_PROGRESS_EVERY"), defaults.progress_every)
                .max(1),
            log_filter: get("BONUSCLIP_LOG").unwrap_or(defaults.log_filter),
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn values_are_trimmed_and_parsed() {
        let cfg = Config::from_lookup(lookup(&[
            ("BONUSCLIP_DB", " /tmp/b.sqlite "),
            ("BONUSCLIP_BATCH_SIZE", "25"),
            ("BONUSCLIP_SALES_FETCH", "single"),
            ("BONUSCLIP_PROGRESS_EVERY", "10"),
            ("BONUSCLIP_LOG", "bonusclip=debug"),
        ]));
        assert_eq!(cfg.db_path, Some(PathBuf::from("/tmp/b.sqlite")));
        assert_eq!(cfg.batch_size, 25);
        assert_eq!(cfg.sales_fetch, SalesFetch::PerPartner);
        assert_eq!(cfg.progress_every, 10);
        assert_eq!(cfg.log_filter, "bonusclip=debug");
    }

    #[test]
    fn bad_values_keep_defaults() {
        let cfg = Config::from_lookup(lookup(&[
            ("BONUSCLIP_BATCH_SIZE", "lots"),
            ("BONUSCLIP_SALES_FETCH", "sometimes"),
            ("BONUSCLIP_PROGRESS_EVERY", "0"),
        ]));
        assert_eq!(cfg.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(cfg.sales_fetch, SalesFetch::Batch);
        assert_eq!(cfg.progress_every, 1);
    }
}
