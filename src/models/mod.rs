// src/models/mod.rs

pub mod api;

use crate::error::AppError;
use clap::ValueEnum;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::{fmt, str::FromStr, sync::LazyLock};

static QUALITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(\d{2,4})p?$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub number: u32,
    pub title: String,
    pub start_time: f64,
    pub end_time: f64,
}

/// 视频元数据，仅在信息面板显示期间有效
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub title: String,
    pub uploader: String,
    pub view_count: u64,
    pub duration_secs: u64,
    pub thumbnail: Option<String>,
    pub chapter_count: usize,
    pub chapters: Vec<Chapter>,
    pub description: Option<String>,
}

/// 清晰度: 'best', 'worst' 或具体高度 (如 '720p')
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Best,
    Worst,
    MaxHeight(u32),
}

impl FromStr for Quality {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "best" => return Ok(Quality::Best),
            "worst" => return Ok(Quality::Worst),
            _ => {}
        }
        QUALITY_PATTERN
            .captures(s)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .filter(|h| *h > 0)
            .map(Quality::MaxHeight)
            .ok_or_else(|| {
                AppError::UserInputError(format!(
                    "invalid quality '{}': use best, worst, or a height such as 720p",
                    s
                ))
            })
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Best => f.write_str("best"),
            Quality::Worst => f.write_str("worst"),
            Quality::MaxHeight(h) => write!(f, "{}p", h),
        }
    }
}

impl Serialize for Quality {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    #[default]
    Mp4,
    Webm,
    Mkv,
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Webm => "webm",
            ContainerFormat::Mkv => "mkv",
        })
    }
}

/// 表单中的下载选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadOptions {
    pub quality: Quality,
    pub format: ContainerFormat,
    pub subtitles: bool,
    pub audio_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: Quality,
    pub format: ContainerFormat,
    pub subtitles: bool,
    #[serde(rename = "audioOnly")]
    pub audio_only: bool,
}

impl DownloadRequest {
    pub fn new(url: &str, options: &DownloadOptions) -> Self {
        Self {
            url: url.to_string(),
            quality: options.quality,
            format: options.format,
            subtitles: options.subtitles,
            audio_only: options.audio_only,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJobHandle {
    pub download_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Completed { filename: String },
    Failed { error: String },
    Pending { status: Option<String>, progress: Option<f64> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSummary {
    pub video_count: u64,
    pub playlist_title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    InfoShown,
    Downloading,
    Complete,
}
