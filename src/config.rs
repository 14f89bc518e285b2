use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub store: StoreConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON file per transcript
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    /// State file backing the provisional-id day counter
    pub state_path: String,
    pub user_label: String,
    pub agent_label: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
