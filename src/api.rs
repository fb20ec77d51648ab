// src/api.rs

use crate::{
    client::RobustClient,
    constants::api as endpoints,
    error::*,
    models::{
        DownloadJobHandle, DownloadRequest, JobStatus, PlaylistSummary, VideoInfo,
        api::{PlaylistResponse, StartDownloadResponse, StatusResponse, VideoInfoResponse},
    },
};
use async_trait::async_trait;
use log::{debug, info};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Response;
use serde_json::json;
use std::sync::Arc;

/// 下载任务服务器的接口契约
#[async_trait]
pub trait JobApi: Send + Sync {
    async fn video_info(&self, url: &str) -> AppResult<VideoInfo>;
    async fn start_download(&self, request: &DownloadRequest) -> AppResult<DownloadJobHandle>;
    async fn download_status(&self, job: &DownloadJobHandle) -> AppResult<JobStatus>;
    /// 返回文件流响应；非 2xx 状态转换为错误
    async fn download_file(&self, filename: &str) -> AppResult<Response>;
    async fn playlist_download(&self, url: &str) -> AppResult<PlaylistSummary>;
}

pub struct HttpJobApi {
    client: Arc<RobustClient>,
}

impl HttpJobApi {
    pub fn new(client: Arc<RobustClient>) -> Self {
        Self { client }
    }
}

// RFC 3986 非保留字符之外全部编码
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// 路径参数中的文件名可能含空格、'#' 或 '/'，需要整体编码为一个路径段
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn video_info(&self, url: &str) -> AppResult<VideoInfo> {
        let res: VideoInfoResponse = self
            .client
            .post_json(endpoints::VIDEO_INFO, &json!({ "url": url }))
            .await?;
        res.into_video_info()
    }

    async fn start_download(&self, request: &DownloadRequest) -> AppResult<DownloadJobHandle> {
        let res: StartDownloadResponse = self.client.post_json(endpoints::DOWNLOAD, request).await?;
        if let Some(message) = &res.message {
            debug!("服务器消息: {}", message);
        }
        let handle = res.into_handle()?;
        info!("下载任务已创建: {}", handle.download_id);
        Ok(handle)
    }

    async fn download_status(&self, job: &DownloadJobHandle) -> AppResult<JobStatus> {
        let path = format!(
            "{}{}",
            endpoints::DOWNLOAD_STATUS,
            encode_path_segment(&job.download_id)
        );
        let res: StatusResponse = self.client.get_json(&path).await?;
        Ok(res.classify())
    }

    async fn download_file(&self, filename: &str) -> AppResult<Response> {
        let url = self.client.endpoint(&format!(
            "{}{}",
            endpoints::DOWNLOAD_FILE,
            encode_path_segment(filename)
        ));
        let res = self.client.get(&url).await?;
        if !res.status().is_success() {
            let status = res.status();
            // 服务器对缺失文件返回 JSON 错误体
            let message = res
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("server returned {}", status));
            return Err(AppError::Application(message));
        }
        Ok(res)
    }

    async fn playlist_download(&self, url: &str) -> AppResult<PlaylistSummary> {
        let res: PlaylistResponse = self
            .client
            .post_json(endpoints::PLAYLIST_DOWNLOAD, &json!({ "url": url }))
            .await?;
        res.into_summary()
    }
}
