// src/config/external.rs

use crate::{
    config::ExternalConfig, // 只需要从父模块导入结构体定义
    constants,
    error::{AppError, AppResult},
};
use anyhow::{Context, anyhow};
use log::{debug, info};
use std::{fs, path::PathBuf};

pub(super) fn get_config_path() -> AppResult<PathBuf> {
    let path = dirs::home_dir()
        .ok_or_else(|| AppError::Other(anyhow!("could not determine the home directory")))?
        .join(constants::CONFIG_DIR_NAME)
        .join(constants::CONFIG_FILE_NAME);
    Ok(path)
}

pub(crate) fn load_or_create_external_config() -> AppResult<ExternalConfig> {
    let config_path = get_config_path()?;
    if config_path.is_file() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file '{}'", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file '{}'", config_path.display()))
            .map_err(AppError::from)
    } else {
        info!("配置文件 {:?} 不存在，将创建默认配置。", config_path);
        let config = ExternalConfig::default();

        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)?;
        }

        let json_content = serde_json::to_string_pretty(&config)?;
        fs::write(&config_path, json_content)?;

        Ok(config)
    }
}

/// 按优先级解析服务器地址: 命令行参数或环境变量 (由 clap 合并) > 配置文件 > 内置默认值
pub fn resolve_server_url(cli_server: Option<&str>, file_server: Option<&str>) -> (String, String) {
    if let Some(server) = cli_server
        && !server.trim().is_empty()
    {
        debug!("使用来自命令行参数或环境变量 {} 的服务器地址", constants::SERVER_ENV_VAR);
        return (server.trim().to_string(), "命令行参数/环境变量".to_string());
    }
    if let Some(server) = file_server
        && !server.trim().is_empty()
    {
        debug!("使用来自本地配置文件的服务器地址");
        return (server.trim().to_string(), "本地配置文件".to_string());
    }
    debug!("未配置服务器地址，使用默认值");
    (constants::DEFAULT_SERVER_URL.to_string(), "默认值".to_string())
}
