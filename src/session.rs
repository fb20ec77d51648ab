// src/session.rs

use crate::{
    constants::labels,
    error::{AppError, AppResult},
    models::{DownloadOptions, DownloadResult, PanelState, VideoInfo},
};
use indicatif::ProgressBar;
use std::sync::{Arc, Mutex};

/// 四个面板的可见性，彼此独立切换
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Panels {
    pub video_info: bool,
    pub download_options: bool,
    pub progress: bool,
    pub complete: bool,
}

impl Panels {
    pub fn show_info(&mut self) {
        self.video_info = true;
        self.download_options = true;
    }

    pub fn begin_download(&mut self) {
        self.download_options = false;
        self.progress = true;
    }

    pub fn finish_download(&mut self) {
        self.progress = false;
        self.complete = true;
    }

    pub fn hide_all(&mut self) {
        *self = Panels::default();
    }

    pub fn state(&self) -> PanelState {
        if self.complete {
            PanelState::Complete
        } else if self.progress {
            PanelState::Downloading
        } else if self.video_info || self.download_options {
            PanelState::InfoShown
        } else {
            PanelState::Idle
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub disabled: bool,
    pub label: String,
}

/// 可被多处持有的按钮状态句柄
#[derive(Debug, Clone)]
pub struct Control {
    state: Arc<Mutex<ControlState>>,
}

impl Control {
    pub fn new(label: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControlState {
                disabled: false,
                label: label.to_string(),
            })),
        }
    }

    pub fn snapshot(&self) -> ControlState {
        self.state.lock().unwrap().clone()
    }

    pub fn is_disabled(&self) -> bool {
        self.state.lock().unwrap().disabled
    }

    pub fn label(&self) -> String {
        self.state.lock().unwrap().label.clone()
    }

    pub fn set(&self, disabled: bool, label: &str) {
        let mut state = self.state.lock().unwrap();
        state.disabled = disabled;
        state.label = label.to_string();
    }

    /// 进入忙碌状态；返回的守卫在离开作用域时恢复为可用并还原标签
    pub fn acquire(&self, busy_label: &str, idle_label: &str, spinner: ProgressBar) -> BusyGuard {
        self.set(true, busy_label);
        spinner.set_message(busy_label.to_string());
        BusyGuard {
            control: self.clone(),
            idle_label: idle_label.to_string(),
            spinner,
            armed: true,
        }
    }
}

pub struct BusyGuard {
    control: Control,
    idle_label: String,
    spinner: ProgressBar,
    armed: bool,
}

impl BusyGuard {
    /// 保持控件禁用，留待之后的重置来恢复
    pub fn retain(mut self) {
        self.armed = false;
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
        if self.armed {
            self.control.set(false, &self.idle_label);
        }
    }
}

/// 一次交互会话的全部可变状态
#[derive(Debug)]
pub struct Session {
    pub url_input: String,
    pub playlist_input: String,
    pub options: DownloadOptions,
    pub panels: Panels,
    pub info_button: Control,
    pub download_button: Control,
    pub playlist_button: Control,
    pub video_info: Option<VideoInfo>,
    pub progress_text: String,
    current_download: Option<DownloadResult>,
}

impl Session {
    pub fn new(options: DownloadOptions) -> Self {
        Self {
            url_input: String::new(),
            playlist_input: String::new(),
            options,
            panels: Panels::default(),
            info_button: Control::new(labels::GET_INFO),
            download_button: Control::new(labels::DOWNLOAD_VIDEO_DEFAULT),
            playlist_button: Control::new(labels::DOWNLOAD_PLAYLIST),
            video_info: None,
            progress_text: String::new(),
            current_download: None,
        }
    }

    pub fn record_download(&mut self, result: DownloadResult) {
        self.current_download = Some(result);
    }

    /// 只有完成面板可见时文件名才有意义
    pub fn current_download_filename(&self) -> AppResult<&str> {
        if self.panels.state() != PanelState::Complete {
            return Err(AppError::NoCompletedDownload);
        }
        self.current_download
            .as_ref()
            .map(|r| r.filename.as_str())
            .filter(|name| !name.is_empty())
            .ok_or(AppError::NoCompletedDownload)
    }

    /// 回到空闲状态；保留上一次的下载结果
    pub fn reset(&mut self) {
        self.panels.hide_all();
        self.download_button
            .set(false, labels::DOWNLOAD_VIDEO_DEFAULT);
        self.url_input.clear();
        self.video_info = None;
        self.progress_text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_state_transitions() {
        let mut panels = Panels::default();
        assert_eq!(panels.state(), PanelState::Idle);
        panels.show_info();
        assert_eq!(panels.state(), PanelState::InfoShown);
        panels.begin_download();
        assert!(panels.video_info && !panels.download_options);
        assert_eq!(panels.state(), PanelState::Downloading);
        panels.finish_download();
        assert_eq!(panels.state(), PanelState::Complete);
        panels.hide_all();
        assert_eq!(panels, Panels::default());
    }

    #[test]
    fn test_busy_guard_releases_on_drop() {
        let control = Control::new("Get Info");
        {
            let _guard = control.acquire("Loading...", "Get Info", ProgressBar::hidden());
            assert!(control.is_disabled());
            assert_eq!(control.label(), "Loading...");
        }
        assert_eq!(
            control.snapshot(),
            ControlState { disabled: false, label: "Get Info".into() }
        );
    }

    #[test]
    fn test_retained_guard_keeps_control_disabled() {
        let control = Control::new("Download");
        control
            .acquire("Starting Download...", "Download", ProgressBar::hidden())
            .retain();
        assert!(control.is_disabled());
        assert_eq!(control.label(), "Starting Download...");
    }

    #[test]
    fn test_filename_is_guarded_outside_complete_state() {
        let mut session = Session::new(DownloadOptions::default());
        assert!(matches!(
            session.current_download_filename(),
            Err(AppError::NoCompletedDownload)
        ));

        session.record_download(DownloadResult { filename: "x.mp4".into() });
        session.panels.show_info();
        session.panels.begin_download();
        assert!(session.current_download_filename().is_err());

        session.panels.finish_download();
        assert_eq!(session.current_download_filename().unwrap(), "x.mp4");

        session.reset();
        assert!(session.current_download_filename().is_err());
    }
}
