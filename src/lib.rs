// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod models;
pub mod policy;
pub mod runner;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
