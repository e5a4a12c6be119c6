// Copyright (c) 2026 The Weft Authors. All rights reserved.

use std::io::Write;

use serial_test::serial;
use weft_fabric::config::FabricConfig;

fn write_toml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
#[serial]
fn file_overrides_defaults() {
    let file = write_toml("tile_cols = 3\nbuffer_depth = 8\n");
    let config = FabricConfig::load(file.path().to_str()).unwrap();
    assert_eq!(config.tile_cols, 3);
    assert_eq!(config.tile_rows, 2);
    assert_eq!(config.buffer_depth, 8);
}

#[test]
#[serial]
fn env_overrides_file() {
    let file = write_toml("tile_cols = 3\n");
    unsafe {
        std::env::set_var("WEFT_TILE_COLS", "4");
    }
    let config = FabricConfig::load(file.path().to_str());
    unsafe {
        std::env::remove_var("WEFT_TILE_COLS");
    }
    assert_eq!(config.unwrap().tile_cols, 4);
}

#[test]
#[serial]
fn invalid_file_value_is_rejected() {
    let file = write_toml("tile_cols = 9\n");
    let err = FabricConfig::load(file.path().to_str()).unwrap_err();
    assert!(format!("{err}").contains("tile_cols"));
}

#[test]
#[serial]
fn missing_file_keeps_defaults() {
    let config = FabricConfig::load(Some("does_not_exist.toml")).unwrap();
    assert_eq!(config.tile_cols, FabricConfig::default().tile_cols);
}
