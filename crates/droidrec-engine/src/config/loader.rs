use super::schema::DroidrecConfig;
use droidrec_common::error::ConfigError;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./droidrec.yaml
    /// 2. ~/.droidrec/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<DroidrecConfig, ConfigError> {
        let local_config = PathBuf::from("./droidrec.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".droidrec").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(DroidrecConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<DroidrecConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<DroidrecConfig, ConfigError> {
        let config: DroidrecConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
