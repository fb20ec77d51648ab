// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const TITLE_TRUNCATE_LENGTH: usize = 70;
pub const MAX_FILENAME_BYTES: usize = 200;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const SERVER_ENV_VAR: &str = "YTDL_REMOTE_SERVER";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_SAVE_DIR: &str = "downloads";
pub const DEFAULT_VIDEO_QUALITY: &str = "best";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_STATUS_TIMEOUT_SECS: u64 = 15;
pub const USER_AGENT: &str = concat!(clap::crate_name!(), "/", clap::crate_version!());

/// 视频信息中最多列出的章节数
pub const MAX_LISTED_CHAPTERS: usize = 5;

pub mod api {
    pub const VIDEO_INFO: &str = "/api/video-info";
    pub const DOWNLOAD: &str = "/api/download";
    pub const DOWNLOAD_STATUS: &str = "/api/download-status/";
    pub const DOWNLOAD_FILE: &str = "/api/download-file/";
    pub const PLAYLIST_DOWNLOAD: &str = "/api/playlist-download";
}

pub mod labels {
    pub const GET_INFO: &str = "Get Info";
    pub const LOADING: &str = "Loading...";
    pub const DOWNLOAD_VIDEO: &str = "Download Video";
    pub const DOWNLOAD_VIDEO_DEFAULT: &str = "Download Video (All Chapters Merged)";
    pub const STARTING_DOWNLOAD: &str = "Starting Download...";
    pub const DOWNLOAD_PLAYLIST: &str = "Download Playlist";
    pub const DOWNLOADING: &str = "Downloading...";
}

pub mod messages {
    pub const EMPTY_VIDEO_URL: &str = "Please enter a video URL";
    pub const EMPTY_PLAYLIST_URL: &str = "Please enter a playlist URL";
    pub const CONFIRM_PLAYLIST: &str = "This will download all videos in the playlist. Continue?";
    pub const PROGRESS_PENDING: &str = "Downloading and processing video...";
    pub const NO_CHAPTERS: &str = "No chapters in this video";
    pub const CHAPTERS_MERGED: &str = "All chapters will be merged into one video file";
}
