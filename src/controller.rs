// src/controller.rs

use crate::{
    api::JobApi,
    constants::{labels, messages},
    error::{AppError, AppResult},
    frontend::Frontend,
    models::{DownloadJobHandle, DownloadOptions, DownloadRequest, DownloadResult},
    poller::{PollEvent, PollOptions, PollOutcome, PollingTask},
    retrieval,
    session::Session,
};
use log::{debug, error, info, warn};
use std::{path::PathBuf, sync::Arc};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub poll: PollOptions,
    pub output_dir: PathBuf,
    pub download_defaults: DownloadOptions,
}

/// 把用户操作翻译成任务服务器请求，并维护面板状态
pub struct Controller<F: Frontend> {
    api: Arc<dyn JobApi>,
    frontend: F,
    session: Session,
    poll_options: PollOptions,
    output_dir: PathBuf,
    cancellation_token: CancellationToken,
}

/// 应用层错误原样展示；请求层错误附带发生时的操作
fn describe(action: &str, e: &AppError) -> String {
    match e {
        AppError::Application(message) => format!("Error: {}", message),
        other => format!("Error {}: {}", action, other),
    }
}

fn progress_text(progress: Option<f64>) -> String {
    match progress {
        Some(p) if p > 0.0 => format!("{} ({:.0}%)", messages::PROGRESS_PENDING, p.min(100.0)),
        _ => messages::PROGRESS_PENDING.to_string(),
    }
}

impl<F: Frontend> Controller<F> {
    pub fn new(
        api: Arc<dyn JobApi>,
        frontend: F,
        options: ControllerOptions,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            api,
            frontend,
            session: Session::new(options.download_defaults),
            poll_options: options.poll,
            output_dir: options.output_dir,
            cancellation_token,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn frontend_mut(&mut self) -> &mut F {
        &mut self.frontend
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// 用户按下 Ctrl+C 后为 true
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// 查询视频信息。成功时显示信息与选项面板并返回 true。
    pub async fn fetch_video_info(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() {
            self.frontend.alert(messages::EMPTY_VIDEO_URL);
            return false;
        }
        self.session.url_input = url.to_string();

        let busy = self.session.info_button.acquire(
            labels::LOADING,
            labels::GET_INFO,
            self.frontend.spinner(labels::LOADING),
        );
        info!("查询视频信息: {}", url);
        let result = self.api.video_info(url).await;
        drop(busy);

        match result {
            Ok(video) => {
                debug!("视频 '{}' 共 {} 个章节", video.title, video.chapter_count);
                self.frontend.show_video_info(&video);
                self.session.video_info = Some(video);
                self.session.panels.show_info();
                self.frontend.panels_changed(&self.session.panels);
                true
            }
            Err(e) => {
                error!("查询视频信息失败: {}", e);
                self.frontend.alert(&describe("fetching video info", &e));
                false
            }
        }
    }

    /// 按当前表单创建下载任务，并轮询直到任务结束。任务完成时返回 true。
    pub async fn start_download(&mut self) -> bool {
        let url = self.session.url_input.trim().to_string();
        if url.is_empty() {
            self.frontend.alert(messages::EMPTY_VIDEO_URL);
            return false;
        }
        let request = DownloadRequest::new(&url, &self.session.options);

        let busy = self.session.download_button.acquire(
            labels::STARTING_DOWNLOAD,
            labels::DOWNLOAD_VIDEO,
            self.frontend.spinner(labels::STARTING_DOWNLOAD),
        );
        info!("创建下载任务: {:?}", request);
        match self.api.start_download(&request).await {
            Ok(job) => {
                busy.retain();
                self.session.panels.begin_download();
                self.frontend.panels_changed(&self.session.panels);
                self.session.progress_text = messages::PROGRESS_PENDING.to_string();
                self.frontend.show_progress(messages::PROGRESS_PENDING);
                self.poll_download_status(job).await
            }
            Err(e) => {
                drop(busy);
                error!("创建下载任务失败: {}", e);
                self.frontend.alert(&describe("starting download", &e));
                false
            }
        }
    }

    /// 轮询任务状态直到完成、失败或被取消
    pub async fn poll_download_status(&mut self, job: DownloadJobHandle) -> bool {
        let mut task = PollingTask::start(
            self.api.clone(),
            job,
            self.poll_options.clone(),
            &self.cancellation_token,
        );

        while let Some(event) = task.next_event().await {
            match event {
                PollEvent::Pending { progress, .. } => {
                    let text = progress_text(progress);
                    self.frontend.show_progress(&text);
                    self.session.progress_text = text;
                }
                PollEvent::RequestFailed { attempt, error } => {
                    debug!("第 {} 次状态查询失败，继续轮询: {}", attempt, error);
                }
            }
        }

        match task.join().await {
            Ok(PollOutcome::Completed { filename, requests }) => {
                debug!("共 {} 次状态查询", requests);
                self.show_download_complete(&filename);
                true
            }
            Ok(PollOutcome::Failed { error, .. }) => {
                self.frontend.alert(&format!("Download failed: {}", error));
                self.reset_interface();
                false
            }
            Ok(PollOutcome::Cancelled { requests }) => {
                warn!("状态轮询在 {} 次查询后被取消", requests);
                self.reset_interface();
                false
            }
            Ok(PollOutcome::LimitReached { requests }) => {
                self.frontend
                    .alert(&describe("polling status", &AppError::PollLimitReached(requests)));
                self.reset_interface();
                false
            }
            Err(e) => {
                self.frontend.alert(&describe("polling status", &e));
                self.reset_interface();
                false
            }
        }
    }

    pub fn show_download_complete(&mut self, filename: &str) {
        self.session.record_download(DownloadResult {
            filename: filename.to_string(),
        });
        self.session.panels.finish_download();
        self.frontend.panels_changed(&self.session.panels);
        self.frontend.show_complete(&format!("File: {}", filename));
    }

    /// 取回已完成任务的文件，保存到输出目录
    pub async fn trigger_file_download(&mut self) -> AppResult<PathBuf> {
        let filename = self.session.current_download_filename()?.to_string();
        info!("取回文件: {}", filename);
        let res = self.api.download_file(&filename).await?;
        let pbar = self.frontend.file_progress(res.content_length());
        retrieval::save_response(res, &self.output_dir, &filename, pbar, &self.cancellation_token)
            .await
    }

    pub fn reset_interface(&mut self) {
        self.session.reset();
        self.frontend.panels_changed(&self.session.panels);
    }

    /// 在服务器上下载整个播放列表。请求是阻塞的，没有轮询。
    pub async fn download_playlist(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() {
            self.frontend.alert(messages::EMPTY_PLAYLIST_URL);
            return false;
        }
        self.session.playlist_input = url.to_string();
        if !self.frontend.confirm(messages::CONFIRM_PLAYLIST) {
            debug!("用户取消了播放列表下载");
            return false;
        }

        let busy = self.session.playlist_button.acquire(
            labels::DOWNLOADING,
            labels::DOWNLOAD_PLAYLIST,
            self.frontend.spinner(labels::DOWNLOADING),
        );
        info!("下载播放列表: {}", url);
        let result = tokio::select! {
            _ = self.cancellation_token.cancelled() => Err(AppError::UserInterrupt),
            result = self.api.playlist_download(url) => result,
        };
        drop(busy);

        match result {
            Ok(summary) => {
                self.frontend.notify(&format!(
                    "Successfully downloaded {} videos from playlist: {}",
                    summary.video_count, summary.playlist_title
                ));
                true
            }
            Err(AppError::UserInterrupt) => false,
            Err(e) => {
                error!("下载播放列表失败: {}", e);
                self.frontend.alert(&describe("downloading playlist", &e));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_errors() {
        assert_eq!(
            describe("starting download", &AppError::Application("URL is required".into())),
            "Error: URL is required"
        );
        assert_eq!(
            describe("polling status", &AppError::PollLimitReached(5)),
            format!("Error polling status: {}", AppError::PollLimitReached(5))
        );
    }

    #[test]
    fn test_progress_text() {
        assert_eq!(progress_text(None), "Downloading and processing video...");
        assert_eq!(progress_text(Some(0.0)), "Downloading and processing video...");
        assert_eq!(progress_text(Some(42.4)), "Downloading and processing video... (42%)");
    }
}
