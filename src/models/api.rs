// src/models/api.rs

use super::{Chapter, DownloadJobHandle, JobStatus, PlaylistSummary, VideoInfo};
use crate::error::{AppError, AppResult};
use serde::Deserialize;

// 服务器返回 success:false 却未附带 error 字段时使用
const UNKNOWN_SERVER_ERROR: &str = "Unknown server error";

fn application_error(error: Option<String>) -> AppError {
    AppError::Application(error.unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string()))
}

// --- 视频信息 (/api/video-info) ---

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ChapterPayload {
    pub number: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct VideoInfoResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    // yt-dlp 可能给出浮点秒数
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub chapter_count: Option<usize>,
    #[serde(default)]
    pub chapters: Vec<ChapterPayload>,
    pub description: Option<String>,
}

impl VideoInfoResponse {
    pub fn into_video_info(self) -> AppResult<VideoInfo> {
        if !self.success {
            return Err(application_error(self.error));
        }
        let chapters: Vec<Chapter> = self
            .chapters
            .into_iter()
            .enumerate()
            .map(|(i, ch)| Chapter {
                number: ch.number.unwrap_or(i as u32 + 1),
                title: ch.title.unwrap_or_else(|| format!("Chapter {}", i + 1)),
                start_time: ch.start_time.unwrap_or_default(),
                end_time: ch.end_time.unwrap_or_default(),
            })
            .collect();
        Ok(VideoInfo {
            title: self.title.unwrap_or_default(),
            uploader: self.uploader.unwrap_or_default(),
            view_count: self.view_count.unwrap_or_default(),
            duration_secs: self.duration.map(|d| d.max(0.0).floor() as u64).unwrap_or_default(),
            thumbnail: self.thumbnail,
            chapter_count: self.chapter_count.unwrap_or(chapters.len()),
            chapters,
            description: self.description.filter(|d| !d.is_empty()),
        })
    }
}

// --- 创建下载任务 (/api/download) ---

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StartDownloadResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
    pub download_id: Option<String>,
    pub message: Option<String>,
}

impl StartDownloadResponse {
    pub fn into_handle(self) -> AppResult<DownloadJobHandle> {
        match (self.success, self.download_id) {
            (true, Some(download_id)) if !download_id.is_empty() => Ok(DownloadJobHandle { download_id }),
            (true, _) => Err(AppError::Application(
                "Server accepted the download but returned no download_id".to_string(),
            )),
            (false, _) => Err(application_error(self.error)),
        }
    }
}

// --- 任务状态 (/api/download-status/{id}) ---

#[derive(Deserialize, Debug, Clone, Default)]
pub struct StatusResponse {
    pub success: Option<bool>,
    pub filename: Option<String>,
    pub error: Option<String>,
    pub status: Option<String>,
    pub progress: Option<f64>,
}

impl StatusResponse {
    /// 将原始状态负载归类：success:true 为完成，带 error 为失败，其余均视为仍在进行
    pub fn classify(self) -> JobStatus {
        if self.success == Some(true) {
            return JobStatus::Completed {
                filename: self.filename.unwrap_or_default(),
            };
        }
        if let Some(error) = self.error {
            return JobStatus::Failed { error };
        }
        JobStatus::Pending {
            status: self.status,
            progress: self.progress,
        }
    }
}

// --- 播放列表 (/api/playlist-download) ---

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PlaylistResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
    pub video_count: Option<u64>,
    pub playlist_title: Option<String>,
}

impl PlaylistResponse {
    pub fn into_summary(self) -> AppResult<PlaylistSummary> {
        if !self.success {
            return Err(application_error(self.error));
        }
        Ok(PlaylistSummary {
            video_count: self.video_count.unwrap_or_default(),
            playlist_title: self.playlist_title.unwrap_or_default(),
        })
    }
}
