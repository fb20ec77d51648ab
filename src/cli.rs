// src/cli.rs

use crate::{constants, models::ContainerFormat};
use clap::{Parser, ValueEnum, crate_version};
use std::path::PathBuf;

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_help_flag = true,
    disable_version_flag = true,
)]
#[command(group(
    clap::ArgGroup::new("mode")
        .required(true)
        .args(&["interactive", "url", "info", "playlist"]),
))]
pub struct Cli {
    // --- 运行模式 (Mode) ---
    /// Start an interactive session (info, options, download, save)
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub interactive: bool,
    /// Fetch info for a video, run the download job and save the file
    #[arg(long, help_heading = "Mode")]
    pub url: Option<String>,
    /// Only show the metadata of a video
    #[arg(long, value_name = "URL", help_heading = "Mode")]
    pub info: Option<String>,
    /// Download a whole playlist on the server
    #[arg(long, value_name = "URL", help_heading = "Mode")]
    pub playlist: Option<String>,

    // --- 下载选项 (Options) ---
    /// Base URL of the download server
    #[arg(short, long, value_name = "URL", env = constants::SERVER_ENV_VAR, help_heading = "Options")]
    pub server: Option<String>,
    /// Video quality: 'best', 'worst', or a height such as '720p'
    #[arg(short, long, help_heading = "Options")]
    pub quality: Option<String>,
    /// Output container format
    #[arg(short, long, value_enum, help_heading = "Options")]
    pub format: Option<ContainerFormat>,
    /// Embed subtitles
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub subtitles: bool,
    /// Extract audio only (mp3)
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub audio_only: bool,
    /// Directory where retrieved files are saved
    #[arg(short, long, value_name = "DIR", default_value_os_t = PathBuf::from(constants::DEFAULT_SAVE_DIR), help_heading = "Options")]
    pub output: PathBuf,
    /// Status polling interval in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..), help_heading = "Options")]
    pub poll_interval: Option<u64>,
    /// Leave the finished file on the server instead of saving it locally
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub no_save: bool,
    /// Answer yes to confirmation prompts
    #[arg(short = 'y', long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub yes: bool,

    // --- 通用选项 (General) ---
    /// Print help
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// Print version
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}
