// src/config.rs

pub mod external;

use self::external::{load_or_create_external_config, resolve_server_url};
use crate::{
    cli::Cli,
    constants,
    error::{AppError, AppResult},
    models::{ContainerFormat, DownloadOptions, Quality},
};
use log::info;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub server_url: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    /// 单次状态查询的超时；挂起的查询不会拖住轮询
    pub status_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub poll_interval_ms: Option<u64>,
    /// 不设置表示无限轮询，直到服务器给出终止状态
    pub poll_max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DownloadDefaults {
    pub quality: Option<String>,
    pub format: Option<ContainerFormat>,
    pub subtitles: Option<bool>,
    pub audio_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub download: DownloadDefaults,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        // 为 NetworkConfig 提供一组稳健的默认值
        let network = NetworkConfig {
            server_url: Some(constants::DEFAULT_SERVER_URL.into()),
            connect_timeout_secs: Some(10),
            // 播放列表下载是阻塞请求，需要较长的超时
            timeout_secs: Some(3600),
            status_timeout_secs: Some(constants::DEFAULT_STATUS_TIMEOUT_SECS),
            max_retries: Some(3),
            poll_interval_ms: Some(constants::DEFAULT_POLL_INTERVAL_MS),
            poll_max_attempts: None,
        };
        let download = DownloadDefaults {
            quality: Some(constants::DEFAULT_VIDEO_QUALITY.into()),
            format: Some(ContainerFormat::Mp4),
            subtitles: Some(false),
            audio_only: Some(false),
        };
        Self { network, download }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_url: Url,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub status_timeout: Duration,
    pub max_retries: u32,
    pub poll_interval: Duration,
    pub poll_max_attempts: Option<u32>,
    pub download_defaults: DownloadOptions,
    pub output_dir: PathBuf,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;

        let (server, source) = resolve_server_url(
            args.server.as_deref(),
            external_config.network.server_url.as_deref(),
        );
        info!("服务器地址 {} 来自 {}", server, source);
        let server_url = parse_server_url(&server)?;

        let quality = match &args.quality {
            Some(q) => q.parse::<Quality>()?,
            None => external_config
                .download
                .quality
                .as_deref()
                .map(str::parse::<Quality>)
                .transpose()?
                .unwrap_or_default(),
        };
        let download_defaults = DownloadOptions {
            quality,
            format: args
                .format
                .or(external_config.download.format)
                .unwrap_or_default(),
            subtitles: args.subtitles || external_config.download.subtitles.unwrap_or(false),
            audio_only: args.audio_only || external_config.download.audio_only.unwrap_or(false),
        };

        let poll_interval_ms = args
            .poll_interval
            .or(external_config.network.poll_interval_ms)
            .unwrap_or(constants::DEFAULT_POLL_INTERVAL_MS);

        Ok(Self {
            server_url,
            user_agent: constants::USER_AGENT.into(),
            connect_timeout: Duration::from_secs(
                external_config.network.connect_timeout_secs.unwrap_or(10),
            ),
            timeout: Duration::from_secs(external_config.network.timeout_secs.unwrap_or(3600)),
            status_timeout: Duration::from_secs(
                external_config
                    .network
                    .status_timeout_secs
                    .unwrap_or(constants::DEFAULT_STATUS_TIMEOUT_SECS)
                    .max(1),
            ),
            max_retries: external_config.network.max_retries.unwrap_or(3),
            poll_interval: Duration::from_millis(poll_interval_ms.max(1)),
            poll_max_attempts: external_config.network.poll_max_attempts.filter(|n| *n > 0),
            download_defaults,
            output_dir: args.output.clone(),
        })
    }
}

/// 服务器地址必须是 http(s) 基础地址；末尾的 '/' 会被去掉以便拼接接口路径
pub fn parse_server_url(raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw.trim_end_matches('/'))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::UserInputError(format!(
            "server URL '{}' must start with http:// or https://",
            raw
        )));
    }
    Ok(url)
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: Url::parse(constants::DEFAULT_SERVER_URL).unwrap(),
            user_agent: "test-agent/1.0".to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            status_timeout: Duration::from_secs(5),
            max_retries: 0,
            poll_interval: Duration::from_millis(10),
            poll_max_attempts: None,
            download_defaults: DownloadOptions::default(),
            output_dir: PathBuf::from(constants::DEFAULT_SAVE_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_url() {
        assert_eq!(
            parse_server_url("http://127.0.0.1:5000/").unwrap().as_str(),
            "http://127.0.0.1:5000/"
        );
        assert!(parse_server_url("ftp://host").is_err());
        assert!(parse_server_url("not a url").is_err());
    }

    #[test]
    fn test_external_config_tolerates_missing_sections() {
        let config: ExternalConfig = serde_json::from_str("{}").unwrap();
        assert!(config.network.server_url.is_none());
        let config: ExternalConfig =
            serde_json::from_str(r#"{"download": {"format": "mkv"}}"#).unwrap();
        assert_eq!(config.download.format, Some(ContainerFormat::Mkv));
    }
}
