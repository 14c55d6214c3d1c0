use clap::Parser;
use std::{
    path::PathBuf,
    time::Duration,
};
use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:5000/ws";
pub const DEFAULT_FPS: u32 = 60;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(version, about = "Terminal client for the crash multiplier game", long_about = None)]
pub struct Args {
    /// WebSocket endpoint of the game server
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    pub url: String,

    /// Directory for the rolling log file
    #[arg(long = "log-dir", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Trail animation refresh rate
    #[arg(long, default_value_t = DEFAULT_FPS)]
    pub fps: u32,

    /// Log filter used when RUST_LOG is unset
    #[arg(long = "log-filter", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("server url must start with ws:// or wss://, got {0}")]
    UnsupportedScheme(String),
    #[error("fps must be between 1 and 240, got {0}")]
    FrameRate(u32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub server_url: String,
    pub log_dir: PathBuf,
    pub log_filter: String,
    pub frame_interval: Duration,
}

impl TryFrom<Args> for AppConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if !(args.url.starts_with("ws://") || args.url.starts_with("wss://")) {
            return Err(ConfigError::UnsupportedScheme(args.url));
        }
        if !(1..=240).contains(&args.fps) {
            return Err(ConfigError::FrameRate(args.fps));
        }
        Ok(Self {
            server_url: args.url,
            log_dir: args.log_dir,
            log_filter: args.log_filter,
            frame_interval: Duration::from_secs(1) / args.fps,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    fn parse(argv: &[&str]) -> Result<AppConfig, ConfigError> {
        let args = Args::try_parse_from(std::iter::once("crash-client").chain(argv.iter().copied()))
            .unwrap();
        AppConfig::try_from(args)
    }

    #[test]
    fn try_from__uses_defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.frame_interval, Duration::from_secs(1) / 60);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn try_from__rejects_http_urls() {
        let err = parse(&["--url", "http://localhost:5000"]).unwrap_err();
        assert_eq!(err, ConfigError::UnsupportedScheme("http://localhost:5000".into()));
    }

    #[test]
    fn try_from__rejects_zero_fps() {
        assert_eq!(parse(&["--fps", "0"]).unwrap_err(), ConfigError::FrameRate(0));
    }
}
