use anyhow::Context;
use std::{io::Read, time::Duration};

const DEFAULT_CONFIG_PATH: &str = "./app-config.toml";

#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bind_address: String,
    pub bind_port: u16,
    pub jwt_secret: String,
    #[serde(with = "humantime_serde", default = "default_token_lifetime")]
    pub token_lifetime: Duration,
    #[serde(default)]
    pub cors_origin: Option<String>,
    pub database: qc_db::Config,
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(serde::Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct TracingConfig {
    pub console: bool,
}

/// First administrator account, created at startup while no administrator exists.
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

fn default_token_lifetime() -> Duration {
    Duration::from_secs(15 * 60)
}

pub fn load() -> anyhow::Result<Config> {
    let path = std::env::var("QC_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
    let mut configuration = String::with_capacity(4096);
    std::fs::File::open(&path)
        .with_context(|| format!("unable to open configuration file {path}"))?
        .read_to_string(&mut configuration)
        .with_context(|| format!("unable to read configuration file {path}"))?;
    let mut config = parse(&configuration)
        .with_context(|| format!("unable to parse configuration file {path}"))?;
    if let Ok(jwt_secret) = std::env::var("QC_JWT_SECRET") {
        config.jwt_secret = jwt_secret;
    }
    if let Ok(db_url) = std::env::var("DATABASE_URL") {
        config.database.set_db_url(db_url);
    }
    anyhow::ensure!(!config.jwt_secret.is_empty(), "jwt-secret must not be empty");
    Ok(config)
}

pub fn parse(configuration: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(configuration)
}

#[cfg(test)]
pub(crate) const SAMPLE: &str = r#"
bind-address = "127.0.0.1"
bind-port = 5000
jwt-secret = "c2VjcmV0LWZvci10ZXN0cw"

[database]
db-url = "postgres://qc:qc@localhost:1/qc"
max-open = 2
max-idle = 1
timeout-for-get = "5s"
"#;
