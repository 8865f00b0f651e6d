//! Unit tests for configuration module
//!
//! Tests parsing, validation and the derived buffer geometry.

use super::*;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_configuration_is_valid() {
    let config = LogoConfig::default();

    assert_eq!(config.display.endpoint, "wayland-1");
    assert_eq!(config.window.width, 288);
    assert_eq!(config.window.height, 288);
    assert_eq!(config.window.title, "Wayland Logo");
    assert!(config.validate().is_ok());
}

#[test]
fn test_buffer_geometry() {
    let window = WindowConfig {
        width: 288,
        height: 100,
        title: String::new(),
    };

    assert_eq!(window.stride(), 1152);
    assert_eq!(window.buffer_len(), 4 * 288 * 100);
    assert_eq!(window.pixel_count(), 28_800);
}

#[test]
fn test_configuration_from_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("waylogo.toml");

    let test_config = r#"
[display]
endpoint = "wayland-0"

[window]
width = 64
height = 32
title = "Test Logo"

[image]
pixel_source = "/tmp/pixels.dat"
"#;
    fs::write(&file_path, test_config)?;

    let config = LogoConfig::load(&file_path)?;
    assert_eq!(config.display.endpoint, "wayland-0");
    assert_eq!(config.window.width, 64);
    assert_eq!(config.window.height, 32);
    assert_eq!(config.window.title, "Test Logo");
    assert_eq!(config.image.pixel_source, PathBuf::from("/tmp/pixels.dat"));

    Ok(())
}

#[test]
fn test_partial_file_keeps_defaults() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("partial.toml");
    fs::write(&file_path, "[window]\nwidth = 100\n")?;

    let config = LogoConfig::load(&file_path)?;
    assert_eq!(config.window.width, 100);
    assert_eq!(config.window.height, 288);
    assert_eq!(config.display, DisplayConfig::default());
    assert_eq!(config.image, ImageConfig::default());

    Ok(())
}

#[test]
fn test_zero_dimension_is_rejected() {
    let mut config = LogoConfig::default();
    config.window.height = 0;

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("must be positive"));
}

#[test]
fn test_oversized_buffer_is_rejected() {
    let mut config = LogoConfig::default();
    config.window.width = 65_536;
    config.window.height = 65_536;

    assert!(config.validate().is_err());
}

#[test]
fn test_empty_endpoint_is_rejected() {
    let mut config = LogoConfig::default();
    config.display.endpoint = "  ".to_string();

    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_file_fails_validation() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("bad.toml");
    fs::write(&file_path, "[window]\nwidth = 0\n")?;

    let err = LogoConfig::load(&file_path).unwrap_err();
    assert!(!is_missing_file(&err));
    Ok(())
}

#[test]
fn test_unparsable_file_is_not_missing() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("broken.toml");
    fs::write(&file_path, "[window\nwidth = \"wide\"\n")?;

    let err = LogoConfig::load(&file_path).unwrap_err();
    assert!(!is_missing_file(&err));
    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    let result = LogoConfig::load("/nonexistent/waylogo.toml");
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
    assert!(is_missing_file(&err));
}

#[test]
fn test_tilde_expansion() -> Result<()> {
    let home = std::env::var("HOME")?;
    let expanded = expand_home(Path::new("~/.config/waylogo/waylogo.toml"))?;
    assert_eq!(expanded, Path::new(&home).join(".config/waylogo/waylogo.toml"));

    let untouched = expand_home(Path::new("/etc/waylogo.toml"))?;
    assert_eq!(untouched, PathBuf::from("/etc/waylogo.toml"));
    Ok(())
}
