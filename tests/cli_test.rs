//! Integration tests for the offline CLI commands

// The config directory is redirected through XDG_CONFIG_HOME, which `dirs` honours on Linux only.
#[cfg(target_os = "linux")]
mod cli_tests {
    use serde_json::Value;
    use std::path::{Path, PathBuf};
    use std::process::{Command, Output};

    fn dataset_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sample-dataset.json")
    }

    fn run_cli(config_home: &Path, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_sensor-telemetry"))
            .args(args)
            .env("XDG_CONFIG_HOME", config_home)
            .env_remove("SENSOR_TELEMETRY_HOST")
            .env_remove("SENSOR_TELEMETRY_PORT")
            .output()
            .expect("Failed to run CLI")
    }

    fn write_config(config_home: &Path, content: &str) {
        let dir = config_home.join("sensor-telemetry");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.json"), content).unwrap();
    }

    #[test]
    fn test_data_command_prints_samples() {
        let config_home = tempfile::tempdir().unwrap();
        let dataset = dataset_path();

        let output = run_cli(config_home.path(), &["data", dataset.to_str().unwrap(), "1"]);
        assert!(output.status.success());

        let samples: Value = serde_json::from_slice(&output.stdout).unwrap();
        let gradients: Vec<f64> = samples
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["gradient"].as_f64().unwrap())
            .collect();
        assert_eq!(gradients, vec![0.0, 0.00033, -0.00093]);
    }

    #[test]
    fn test_malformed_config_fails_offline_commands() {
        let config_home = tempfile::tempdir().unwrap();
        write_config(config_home.path(), "{ not json");
        let dataset = dataset_path();

        for command in ["data", "anomalies"] {
            let output = run_cli(config_home.path(), &[command, dataset.to_str().unwrap(), "1"]);
            assert!(!output.status.success(), "{command} ignored a broken config");
            assert!(output.stdout.is_empty());

            let stderr = String::from_utf8_lossy(&output.stderr);
            assert!(stderr.contains("loading configuration"), "{stderr}");
        }
    }

    #[test]
    fn test_zero_default_limit_in_config_is_rejected() {
        let config_home = tempfile::tempdir().unwrap();
        write_config(config_home.path(), r#"{"default_limit": 0}"#);
        let dataset = dataset_path();

        let output = run_cli(config_home.path(), &["data", dataset.to_str().unwrap(), "1"]);
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("default_limit"), "{stderr}");
    }
}
