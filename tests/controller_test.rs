// tests/controller_test.rs

use async_trait::async_trait;
use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use ytdl_remote::{
    api::JobApi,
    constants::labels,
    controller::{Controller, ControllerOptions},
    error::{AppError, AppResult},
    frontend::RecordingFrontend,
    models::{
        Chapter, DownloadJobHandle, DownloadOptions, DownloadRequest, JobStatus, PanelState,
        PlaylistSummary, Quality, VideoInfo,
    },
    poller::PollOptions,
    session::Panels,
};

// --- 可编排响应的假任务服务器 ---

#[derive(Default)]
struct FakeJobServer {
    info: Mutex<VecDeque<AppResult<VideoInfo>>>,
    starts: Mutex<VecDeque<AppResult<DownloadJobHandle>>>,
    statuses: Mutex<VecDeque<AppResult<JobStatus>>>,
    playlists: Mutex<VecDeque<AppResult<PlaylistSummary>>>,
    calls: Mutex<Vec<String>>,
    requests: Mutex<Vec<DownloadRequest>>,
}

impl FakeJobServer {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, endpoint: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == endpoint).count()
    }

    fn record(&self, endpoint: &str) {
        self.calls.lock().unwrap().push(endpoint.to_string());
    }
}

#[async_trait]
impl JobApi for FakeJobServer {
    async fn video_info(&self, _url: &str) -> AppResult<VideoInfo> {
        self.record("video-info");
        self.info.lock().unwrap().pop_front().expect("unexpected video-info call")
    }

    async fn start_download(&self, request: &DownloadRequest) -> AppResult<DownloadJobHandle> {
        self.record("download");
        self.requests.lock().unwrap().push(request.clone());
        self.starts.lock().unwrap().pop_front().expect("unexpected download call")
    }

    async fn download_status(&self, _job: &DownloadJobHandle) -> AppResult<JobStatus> {
        self.record("download-status");
        self.statuses.lock().unwrap().pop_front().unwrap_or(Ok(JobStatus::Pending {
            status: Some("downloading".into()),
            progress: Some(0.0),
        }))
    }

    async fn download_file(&self, _filename: &str) -> AppResult<reqwest::Response> {
        self.record("download-file");
        Err(AppError::Application("File not found".into()))
    }

    async fn playlist_download(&self, _url: &str) -> AppResult<PlaylistSummary> {
        self.record("playlist-download");
        self.playlists.lock().unwrap().pop_front().expect("unexpected playlist call")
    }
}

// --- 辅助函数 ---

fn sample_info(chapter_count: usize) -> VideoInfo {
    VideoInfo {
        title: "Async Rust Deep Dive".into(),
        uploader: "Ferris".into(),
        view_count: 1000,
        duration_secs: 3661,
        thumbnail: Some("https://i.example/thumb.jpg".into()),
        chapter_count,
        chapters: (1..=chapter_count)
            .map(|i| Chapter {
                number: i as u32,
                title: format!("Chapter {}", i),
                start_time: 0.0,
                end_time: 0.0,
            })
            .collect(),
        description: None,
    }
}

fn pending() -> AppResult<JobStatus> {
    Ok(JobStatus::Pending { status: Some("downloading".into()), progress: Some(0.0) })
}

fn controller_with(
    server: Arc<FakeJobServer>,
    frontend: RecordingFrontend,
) -> Controller<RecordingFrontend> {
    controller_with_token(server, frontend, CancellationToken::new())
}

fn controller_with_token(
    server: Arc<FakeJobServer>,
    frontend: RecordingFrontend,
    token: CancellationToken,
) -> Controller<RecordingFrontend> {
    let options = ControllerOptions {
        poll: PollOptions { interval: Duration::from_millis(2000), max_attempts: None },
        output_dir: PathBuf::from("downloads"),
        download_defaults: DownloadOptions::default(),
    };
    Controller::new(server, frontend, options, token)
}

async fn controller_with_info_shown(server: &Arc<FakeJobServer>) -> Controller<RecordingFrontend> {
    server.info.lock().unwrap().push_back(Ok(sample_info(2)));
    let mut controller = controller_with(server.clone(), RecordingFrontend::default());
    assert!(controller.fetch_video_info("https://youtu.be/abc").await);
    controller
}

// --- 视频信息 ---

#[tokio::test]
async fn test_fetch_info_shows_info_and_options_panels() {
    let server = Arc::new(FakeJobServer::default());
    let controller = controller_with_info_shown(&server).await;

    let session = controller.session();
    assert!(session.panels.video_info && session.panels.download_options);
    assert_eq!(session.panels.state(), PanelState::InfoShown);
    assert_eq!(session.url_input, "https://youtu.be/abc");
    // 忙碌状态已释放
    assert!(!session.info_button.is_disabled());
    assert_eq!(session.info_button.label(), labels::GET_INFO);
    assert_eq!(controller.frontend().rendered_info.len(), 1);
    assert!(controller.frontend().alerts.is_empty());
}

#[tokio::test]
async fn test_fetch_info_failure_alerts_and_releases_control() {
    let server = Arc::new(FakeJobServer::default());
    server
        .info
        .lock()
        .unwrap()
        .push_back(Err(AppError::Application("Unsupported URL".into())));
    let mut controller = controller_with(server.clone(), RecordingFrontend::default());

    assert!(!controller.fetch_video_info("  https://example.com/nope ").await);

    assert_eq!(controller.frontend().alerts, vec!["Error: Unsupported URL".to_string()]);
    assert_eq!(controller.session().panels, Panels::default());
    assert!(!controller.session().info_button.is_disabled());
    assert_eq!(controller.session().info_button.label(), labels::GET_INFO);
}

#[tokio::test]
async fn test_empty_urls_never_issue_requests() {
    let server = Arc::new(FakeJobServer::default());
    let mut controller = controller_with(server.clone(), RecordingFrontend::answering(true));

    assert!(!controller.fetch_video_info("   ").await);
    assert!(!controller.download_playlist("").await);
    assert!(!controller.start_download().await);

    assert!(server.calls().is_empty());
    assert_eq!(
        controller.frontend().alerts,
        vec![
            "Please enter a video URL".to_string(),
            "Please enter a playlist URL".to_string(),
            "Please enter a video URL".to_string(),
        ]
    );
    // 空链接不会弹出确认框
    assert!(controller.frontend().confirms.is_empty());
}

// --- 下载与轮询 ---

#[tokio::test(start_paused = true)]
async fn test_poll_until_success_reaches_complete_state() {
    let server = Arc::new(FakeJobServer::default());
    let mut controller = controller_with_info_shown(&server).await;
    controller.session_mut().options.quality = Quality::MaxHeight(720);
    server
        .starts
        .lock()
        .unwrap()
        .push_back(Ok(DownloadJobHandle { download_id: "1712.5".into() }));
    {
        let mut statuses = server.statuses.lock().unwrap();
        statuses.push_back(pending());
        statuses.push_back(pending());
        statuses.push_back(Ok(JobStatus::Completed { filename: "x.mp4".into() }));
    }

    assert!(controller.start_download().await);

    assert_eq!(server.count("download-status"), 3);
    assert_eq!(controller.frontend().completed, vec!["File: x.mp4".to_string()]);
    let session = controller.session();
    assert_eq!(session.panels.state(), PanelState::Complete);
    assert!(!session.panels.progress && !session.panels.download_options);
    assert_eq!(session.current_download_filename().unwrap(), "x.mp4");
    // 任务开始后下载按钮保持禁用，直到重置
    assert!(session.download_button.is_disabled());

    let sent = server.requests.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url, "https://youtu.be/abc");
    assert_eq!(sent[0].quality, Quality::MaxHeight(720));
    assert!(
        controller
            .frontend()
            .progress_texts
            .iter()
            .all(|t| t == "Downloading and processing video...")
    );
}

#[tokio::test(start_paused = true)]
async fn test_poll_error_alerts_and_resets_to_idle() {
    let server = Arc::new(FakeJobServer::default());
    let mut controller = controller_with_info_shown(&server).await;
    server
        .starts
        .lock()
        .unwrap()
        .push_back(Ok(DownloadJobHandle { download_id: "1712.5".into() }));
    {
        let mut statuses = server.statuses.lock().unwrap();
        statuses.push_back(pending());
        statuses.push_back(Ok(JobStatus::Failed { error: "failed".into() }));
    }

    assert!(!controller.start_download().await);

    assert_eq!(server.count("download-status"), 2);
    assert_eq!(controller.frontend().alerts, vec!["Download failed: failed".to_string()]);
    let session = controller.session();
    assert_eq!(session.panels, Panels::default());
    assert!(session.url_input.is_empty());
    assert!(!session.download_button.is_disabled());
    assert_eq!(session.download_button.label(), labels::DOWNLOAD_VIDEO_DEFAULT);
    assert!(controller.frontend().completed.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_during_polling_resets_without_alert() {
    let server = Arc::new(FakeJobServer::default());
    server.info.lock().unwrap().push_back(Ok(sample_info(0)));
    server
        .starts
        .lock()
        .unwrap()
        .push_back(Ok(DownloadJobHandle { download_id: "1712.5".into() }));
    let token = CancellationToken::new();
    let mut controller =
        controller_with_token(server.clone(), RecordingFrontend::default(), token.clone());
    assert!(controller.fetch_video_info("https://youtu.be/abc").await);

    // 模拟 Ctrl+C：第二次状态查询之后取消
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(4500)).await;
        token.cancel();
    });
    assert!(!controller.start_download().await);

    assert!(controller.is_cancelled());
    assert_eq!(server.count("download-status"), 2);
    assert!(controller.frontend().alerts.is_empty());
    assert_eq!(controller.session().panels.state(), PanelState::Idle);
    assert!(!controller.session().download_button.is_disabled());
}

#[tokio::test]
async fn test_start_download_failure_restores_control_without_panel_change() {
    let server = Arc::new(FakeJobServer::default());
    let mut controller = controller_with_info_shown(&server).await;
    server
        .starts
        .lock()
        .unwrap()
        .push_back(Err(AppError::Application("URL is required".into())));
    let panels_before = controller.session().panels;

    assert!(!controller.start_download().await);

    assert_eq!(controller.session().panels, panels_before);
    assert!(!controller.session().download_button.is_disabled());
    assert_eq!(controller.session().download_button.label(), labels::DOWNLOAD_VIDEO);
    assert_eq!(controller.frontend().alerts, vec!["Error: URL is required".to_string()]);
    assert_eq!(server.count("download-status"), 0);
}

// --- 取回文件与重置 ---

#[tokio::test]
async fn test_file_retrieval_is_refused_outside_complete_state() {
    let server = Arc::new(FakeJobServer::default());
    let mut controller = controller_with_info_shown(&server).await;

    let result = controller.trigger_file_download().await;

    assert!(matches!(result, Err(AppError::NoCompletedDownload)));
    assert_eq!(server.count("download-file"), 0);
}

#[tokio::test]
async fn test_reset_is_idempotent_and_keeps_last_filename() {
    let server = Arc::new(FakeJobServer::default());
    let mut controller = controller_with_info_shown(&server).await;
    controller.session_mut().panels.begin_download();
    controller.show_download_complete("talk.mp4");

    controller.reset_interface();
    let once = (
        controller.session().panels,
        controller.session().download_button.snapshot(),
        controller.session().url_input.clone(),
    );
    controller.reset_interface();
    let twice = (
        controller.session().panels,
        controller.session().download_button.snapshot(),
        controller.session().url_input.clone(),
    );

    assert_eq!(once, twice);
    assert_eq!(once.0.state(), PanelState::Idle);

    // 文件名被保留，但只能在完成面板可见时读取
    assert!(controller.session().current_download_filename().is_err());
    controller.session_mut().panels.finish_download();
    assert_eq!(controller.session().current_download_filename().unwrap(), "talk.mp4");
}

// --- 播放列表 ---

#[tokio::test]
async fn test_playlist_requires_confirmation() {
    let server = Arc::new(FakeJobServer::default());
    let mut controller = controller_with(server.clone(), RecordingFrontend::answering(false));

    assert!(!controller.download_playlist("https://youtube.com/playlist?list=PL1").await);

    assert_eq!(
        controller.frontend().confirms,
        vec!["This will download all videos in the playlist. Continue?".to_string()]
    );
    assert!(server.calls().is_empty());
}

#[tokio::test]
async fn test_playlist_success_and_failure() {
    let server = Arc::new(FakeJobServer::default());
    {
        let mut playlists = server.playlists.lock().unwrap();
        playlists.push_back(Ok(PlaylistSummary {
            video_count: 12,
            playlist_title: "RustConf".into(),
        }));
        playlists.push_back(Err(AppError::Application("Playlist is private".into())));
    }
    let mut controller = controller_with(server.clone(), RecordingFrontend::answering(true));

    assert!(controller.download_playlist("https://youtube.com/playlist?list=PL1").await);
    assert!(!controller.session().playlist_button.is_disabled());
    assert!(!controller.download_playlist("https://youtube.com/playlist?list=PL2").await);
    assert!(!controller.session().playlist_button.is_disabled());
    assert_eq!(controller.session().playlist_button.label(), labels::DOWNLOAD_PLAYLIST);

    assert_eq!(
        controller.frontend().alerts,
        vec![
            "Successfully downloaded 12 videos from playlist: RustConf".to_string(),
            "Error: Playlist is private".to_string(),
        ]
    );
    assert_eq!(server.count("playlist-download"), 2);
}
