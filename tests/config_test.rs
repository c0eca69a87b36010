//! Configuration loading, saving and validation tests

use face_capture_pipeline::{
    alignment::CaptureAngle,
    config::{Config, EXAMPLE_CONFIG},
    Error,
};
use std::{fs, path::PathBuf, process};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("face-capture-{}-{name}", process::id()))
}

#[test]
fn test_file_round_trip() {
    let path = temp_path("round-trip.yaml");
    let mut config = Config::default();
    config.capture.angles = vec![CaptureAngle::Left, CaptureAngle::Right];
    config.stabilizer.tick_period_ms = 50;
    config.capture.mirrored = false;

    config.to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_example_config_file() {
    let path = temp_path("example.yaml");
    fs::write(&path, EXAMPLE_CONFIG).unwrap();
    let loaded = Config::from_file(&path).unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_missing_file() {
    let result = Config::from_file(temp_path("does-not-exist.yaml"));
    assert!(matches!(result, Err(Error::IoError(_))));
}

#[test]
fn test_malformed_yaml() {
    assert!(matches!(Config::from_yaml("stabilizer: [1, 2"), Err(Error::ConfigError(_))));
    assert!(matches!(
        Config::from_yaml("capture:\n  angles: [up]\n"),
        Err(Error::ConfigError(_))
    ));
}

#[test]
fn test_empty_yaml_is_default() {
    assert_eq!(Config::from_yaml("{}").unwrap(), Config::default());
}

#[test]
fn test_validation_messages() {
    let mut config = Config::default();
    config.capture.jpeg_quality = 0;
    match config.validate() {
        Err(Error::ConfigError(msg)) => assert!(msg.contains("JPEG")),
        other => panic!("expected a config error, got {other:?}"),
    }

    let mut config = Config::default();
    config.stabilizer.tick_period_ms = 0;
    match config.validate() {
        Err(Error::ConfigError(msg)) => assert!(msg.contains("Tick period")),
        other => panic!("expected a config error, got {other:?}"),
    }

    let mut config = Config::default();
    config.capture.angles.clear();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.capture.center_tolerance = 0.5;
    assert!(config.validate().is_err());
}
