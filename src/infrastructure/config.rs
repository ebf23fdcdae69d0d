use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CloudConfig {
    pub cloud: CloudSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CloudSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_scan_interval_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl CloudSettings {
    /// The cloud accepts either an API key or a username/password login.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.is_none() && (self.username.is_none() || self.password.is_none()) {
            anyhow::bail!("cloud config requires api_key or username and password");
        }
        Ok(())
    }
}

pub fn load_cloud_config() -> anyhow::Result<CloudConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/cloud"))
        .build()?;

    let cfg: CloudConfig = settings.try_deserialize()?;
    cfg.cloud.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> CloudConfig {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let cfg = from_toml(
            r#"
            [cloud]
            api_url = "https://cloud.example.com/api"
            api_key = "k"
            "#,
        );

        assert_eq!(cfg.cloud.scan_interval_secs, 60);
        assert_eq!(cfg.cloud.request_timeout_secs, 10);
        assert!(cfg.cloud.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_some_credentials() {
        let cfg = from_toml(
            r#"
            [cloud]
            api_url = "https://cloud.example.com/api"
            username = "pit"
            "#,
        );

        assert!(cfg.cloud.validate().is_err());
    }

    #[test]
    fn test_username_password_scheme_accepted() {
        let cfg = from_toml(
            r#"
            [cloud]
            api_url = "https://cloud.example.com/api"
            username = "pit"
            password = "secret"
            scan_interval_secs = 30
            "#,
        );

        assert!(cfg.cloud.validate().is_ok());
        assert_eq!(cfg.cloud.scan_interval_secs, 30);
    }
}
