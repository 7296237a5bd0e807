use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub channel_username: String,
    pub webhook_url: Option<String>,
    pub webhook_path: String,
    pub webhook_secret: Option<String>,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub telegram_api_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let bot_token = required("BOT_TOKEN")?;
        let channel_username = required("CHANNEL_USERNAME")?;
        let webhook_url = var("WEBHOOK_URL").map(|url| url.trim_end_matches('/').to_string());
        let webhook_path =
            normalize_path(&var("WEBHOOK_PATH").unwrap_or_else(|| "/webhook".into()));
        let webhook_secret = var("WEBHOOK_SECRET");
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = var("PORT")
            .unwrap_or_else(|| "8000".into())
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?;
        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| "sqlite://guides.db?mode=rwc".into());
        let telegram_api_url = var("TELEGRAM_API_URL")
            .unwrap_or_else(|| "https://api.telegram.org".into())
            .trim_end_matches('/')
            .to_string();

        if let Some(url) = &webhook_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ConfigError::Invalid {
                    var: "WEBHOOK_URL",
                    reason: "must start with http:// or https://".into(),
                });
            }
        }

        Ok(Self {
            bot_token,
            channel_username,
            webhook_url,
            webhook_path,
            webhook_secret,
            host,
            port,
            database_url,
            telegram_api_url,
        })
    }

    pub fn webhook_endpoint(&self) -> Option<String> {
        self.webhook_url
            .as_ref()
            .map(|base| format!("{}{}", base, self.webhook_path))
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
