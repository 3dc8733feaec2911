use anyhow::{anyhow, Result};
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct EdinetConfig {
    pub api_key: String,
    pub output_dir: PathBuf,
    pub user_agent: String,
}

impl EdinetConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("EDINET_API_KEY")
            .map_err(|_| anyhow!("EDINET_API_KEY environment variable not set (put it in .env)"))?;

        let output_dir = output_dir_from_env();

        let user_agent = std::env::var("USER_AGENT")
            .unwrap_or_else(|_| "edinet-tools (software@example.com)".to_string());

        Ok(Self {
            api_key,
            output_dir,
            user_agent,
        })
    }
}

/// Output directory alone, for commands that only read local archives and
/// need no API key.
pub fn output_dir_from_env() -> PathBuf {
    PathBuf::from(std::env::var("EDINET_OUTPUT_DIR").unwrap_or_else(|_| "outputs".to_string()))
}
