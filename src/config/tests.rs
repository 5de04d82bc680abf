use super::*;
use figment::Jail;

#[test]
fn test_config_loads_defaults() {
    Jail::expect_with(|_jail| {
        let config = CapflowConfig::load().map_err(|e| e.to_string())?;

        // Values from default-config.toml
        assert_eq!(config.get_u64("process.poll_interval_ms").unwrap(), 100);
        assert_eq!(config.get_string("capture.auxiliary_extension").unwrap(), "gfxr");
        assert!(config.get_bool("output.color").unwrap());

        let primary = config.get_vec("capture.primary_extensions").unwrap();
        assert_eq!(primary, vec!["rd".to_string(), "dive".to_string()]);
        Ok(())
    });
}

#[test]
fn test_embedded_defaults_match_struct_defaults() {
    Jail::expect_with(|_jail| {
        let settings = CapflowConfig::load()
            .and_then(|c| c.settings())
            .map_err(|e| e.to_string())?;
        assert_eq!(settings, AppConfig::default());
        Ok(())
    });
}

#[test]
fn test_repository_file_overrides_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "capflow.toml",
            r#"
            [capture]
            trigger_marker = "_trigger"

            [stats]
            cancel_poll_stride = 8
            "#,
        )?;

        let settings = CapflowConfig::load()
            .and_then(|c| c.settings())
            .map_err(|e| e.to_string())?;
        assert_eq!(settings.capture.trigger_marker, "_trigger");
        assert_eq!(settings.stats.cancel_poll_stride, 8);
        // Untouched keys keep their defaults
        assert_eq!(settings.capture.asset_marker, "_asset_file");
        Ok(())
    });
}

#[test]
fn test_environment_has_highest_priority() {
    Jail::expect_with(|jail| {
        jail.create_file("capflow.toml", "[process]\npoll_interval_ms = 50\n")?;
        jail.set_env("CAPFLOW_PROCESS__POLL_INTERVAL_MS", "25");

        let settings = CapflowConfig::load()
            .and_then(|c| c.settings())
            .map_err(|e| e.to_string())?;
        assert_eq!(settings.process.poll_interval_ms, 25);
        Ok(())
    });
}

#[test]
fn test_custom_config_by_extension() {
    Jail::expect_with(|jail| {
        jail.create_file("custom.yaml", "capture:\n  asset_extension: bin\n")?;

        let settings = CapflowConfig::load_with_custom_config(Some("custom.yaml"))
            .and_then(|c| c.settings())
            .map_err(|e| e.to_string())?;
        assert_eq!(settings.capture.asset_extension, "bin");
        Ok(())
    });
}

#[test]
fn test_custom_config_missing_file_falls_back() {
    let config = CapflowConfig::load_with_custom_config(Some("non_existent.toml"));
    assert!(config.is_ok(), "Should handle missing custom config gracefully");
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = AppConfig::default();
    assert!(config.validate().is_ok());

    config.process.poll_interval_ms = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.capture.asset_extension = ".gfxa".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.capture.primary_extensions.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_poll_interval_duration() {
    let config = ProcessConfig { poll_interval_ms: 250 };
    assert_eq!(config.poll_interval(), std::time::Duration::from_millis(250));
}
