use super::Config;
use crate::error::ConfigError;
use directories::UserDirs;
use std::fs;
use std::path::Path;

impl Config {
    pub fn load_or_init() -> Result<Self, ConfigError> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .ok_or_else(|| ConfigError::Load("could not find home directory".into()))?;
        Self::load_or_init_in(&home.join(".chromatica"))
    }

    /// Load `config.toml` from `chromatica_dir`, writing defaults on first run.
    pub fn load_or_init_in(chromatica_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = chromatica_dir.join("config.toml");

        if !chromatica_dir.exists() {
            fs::create_dir_all(chromatica_dir)?;
            fs::create_dir_all(chromatica_dir.join("data"))?;
        }

        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&contents).map_err(|e| {
                ConfigError::Load(format!(
                    "Failed to parse config file {}: {e}",
                    config_path.display()
                ))
            })?;
            config.config_path.clone_from(&config_path);
            config.data_dir = chromatica_dir.join("data");
            config
        } else {
            let config = Self {
                config_path: config_path.clone(),
                data_dir: chromatica_dir.join("data"),
                ..Self::default()
            };
            config.save()?;
            config
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let toml_str =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Save(e.to_string()))?;
        fs::write(&self.config_path, toml_str)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::core::test_env::ENV_LOCK;

    #[test]
    fn first_run_writes_default_file() {
        let _lock = ENV_LOCK.lock().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".chromatica");

        let config = Config::load_or_init_in(&dir).unwrap();

        assert!(dir.join("config.toml").exists());
        assert!(dir.join("data").is_dir());
        assert_eq!(config.config_path, dir.join("config.toml"));
    }

    #[test]
    fn existing_file_is_loaded() {
        let _lock = ENV_LOCK.lock().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".chromatica");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.toml"),
            "[evolution]\nhistory_capacity = 7\n",
        )
        .unwrap();

        let config = Config::load_or_init_in(&dir).unwrap();
        assert_eq!(config.evolution.history_capacity, 7);
        assert_eq!(config.data_dir, dir.join("data"));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let _lock = ENV_LOCK.lock().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".chromatica");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "[evolution\n").unwrap();

        let err = Config::load_or_init_in(&dir).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn invalid_values_report_validation_error() {
        let _lock = ENV_LOCK.lock().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".chromatica");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "[evolution]\nhistory_capacity = 0\n").unwrap();

        let err = Config::load_or_init_in(&dir).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation(ref msg) if msg.contains("history_capacity")
        ));
    }

    #[test]
    fn save_into_missing_directory_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            config_path: tmp.path().join("absent").join("config.toml"),
            ..Config::default()
        };
        assert!(matches!(config.save(), Err(ConfigError::Io(_))));
    }
}
