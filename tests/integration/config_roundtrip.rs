//! Config persistence through TOML files.

use durgas::config::DesktopConfig;
use durgas::settings::Theme;

#[test]
fn config_file_roundtrip() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("nested").join("config.toml");

    let mut config = DesktopConfig::default();
    config.appearance.theme = Theme::Light;
    config.assistant.wake_phrase = "okay computer".into();
    config.realtime.frame_samples = 2048;
    config.save_to_file(&path).expect("save config");

    let restored = DesktopConfig::from_file(&path).expect("load config");
    assert_eq!(restored.appearance.theme, Theme::Light);
    assert_eq!(restored.assistant.wake_phrase, "okay computer");
    assert_eq!(restored.realtime.frame_samples, 2048);
    assert_eq!(restored.filesystem.root_label, "C:");
}

#[test]
fn partial_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[windows]\ndefault_width = 640.0\n").expect("write config");

    let config = DesktopConfig::from_file(&path).expect("load config");
    assert_eq!(config.windows.default_width, 640.0);
    assert_eq!(config.windows.default_height, 600.0);
    assert!(config.assistant.wake_word_enabled);
}

#[test]
fn malformed_file_is_a_config_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "windows = 12").expect("write config");

    let err = DesktopConfig::from_file(&path).unwrap_err();
    assert_eq!(err.code(), "CONFIG_INVALID");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let err = DesktopConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert_eq!(err.code(), "IO_ERROR");
}
