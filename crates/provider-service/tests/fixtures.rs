// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for configuration and service tests

#![allow(dead_code)]

use std::{fs, path::Path};

use serde_json::Value;
use tempfile::TempDir;

/// Write `contents` as `name` inside a fresh temporary directory
pub fn config_dir(files: &[(&str, Value)]) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (name, contents) in files {
        write_json(dir.path(), name, contents);
    }
    dir
}

/// Serialize `contents` into `dir/name`
pub fn write_json(dir: &Path, name: &str, contents: &Value) {
    let rendered = serde_json::to_string_pretty(contents).expect("serialize config");
    fs::write(dir.join(name), rendered).expect("write config file");
}
