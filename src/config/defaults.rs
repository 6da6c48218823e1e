use super::*;

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/classic-monitor.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("/var/lib/midnite-modbusd/status/data.txt"),
            registry_file: None,
            timezone: "UTC".to_string(),
            watch_interval_ms: 0,
            evaluation_timeout_ms: 2000,
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
