// src/frontend.rs

use crate::{
    constants,
    models::VideoInfo,
    session::Panels,
    symbols, ui,
    utils::{self, ChapterListing},
};
use colored::*;
use indicatif::ProgressBar;

/// 控制器看到的展示层
pub trait Frontend: Send {
    /// 阻塞式错误提示
    fn alert(&mut self, message: &str);
    /// 阻塞式结果通知；默认与 alert 相同
    fn notify(&mut self, message: &str) {
        self.alert(message);
    }
    fn confirm(&mut self, question: &str) -> bool;
    /// 忙碌控件附带的加载指示
    fn spinner(&self, label: &str) -> ProgressBar;
    fn show_video_info(&mut self, info: &VideoInfo);
    fn show_progress(&mut self, text: &str);
    fn show_complete(&mut self, file_label: &str);
    fn file_progress(&self, total: Option<u64>) -> ProgressBar;
    fn panels_changed(&mut self, _panels: &Panels) {}
}

/// 视频信息面板的文本行
pub fn video_info_lines(info: &VideoInfo) -> Vec<String> {
    let mut lines = vec![
        format!("Uploader : {}", info.uploader),
        format!("Views    : {}", utils::format_number(info.view_count)),
        format!("Duration : {}", utils::format_duration(info.duration_secs)),
    ];
    if let Some(thumbnail) = &info.thumbnail {
        lines.push(format!("Thumbnail: {}", thumbnail));
    }
    lines.push(String::new());
    lines.extend(ChapterListing::from_info(info).lines());
    lines
}

pub struct TerminalFrontend {
    assume_yes: bool,
    progress: Option<ProgressBar>,
}

impl TerminalFrontend {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            progress: None,
        }
    }

    fn clear_progress(&mut self) {
        if let Some(pbar) = self.progress.take() {
            pbar.finish_and_clear();
        }
    }
}

impl Frontend for TerminalFrontend {
    fn alert(&mut self, message: &str) {
        self.clear_progress();
        eprintln!("\n{} {}", *symbols::ERROR, message.red());
    }

    fn notify(&mut self, message: &str) {
        self.clear_progress();
        println!("\n{} {}", *symbols::OK, message.green());
    }

    fn confirm(&mut self, question: &str) -> bool {
        if self.assume_yes {
            ui::info(&format!("{} (yes)", question));
            return true;
        }
        ui::confirm(question, false)
    }

    fn spinner(&self, label: &str) -> ProgressBar {
        ui::new_spinner(label)
    }

    fn show_video_info(&mut self, info: &VideoInfo) {
        let title = utils::truncate_text(&info.title, constants::TITLE_TRUNCATE_LENGTH);
        let lines = video_info_lines(info);
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        ui::box_message(&title, &lines, |s| s.cyan());
        if let Some(description) = &info.description {
            ui::plain(&utils::truncate_text(description, constants::UI_WIDTH * 2).dimmed().to_string());
        }
    }

    fn show_progress(&mut self, text: &str) {
        match &self.progress {
            Some(pbar) => pbar.set_message(text.to_string()),
            None => self.progress = Some(ui::new_spinner(text)),
        }
    }

    fn show_complete(&mut self, file_label: &str) {
        self.clear_progress();
        ui::box_message("Download Complete", &[file_label], |s| s.green());
    }

    fn file_progress(&self, total: Option<u64>) -> ProgressBar {
        ui::new_bytes_progress_bar(total, "Saving")
    }

    fn panels_changed(&mut self, panels: &Panels) {
        if !panels.progress {
            self.clear_progress();
        }
    }
}

/// 记录所有展示调用的前端，供测试断言
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct RecordingFrontend {
    pub confirm_answer: bool,
    pub alerts: Vec<String>,
    pub confirms: Vec<String>,
    pub rendered_info: Vec<VideoInfo>,
    pub progress_texts: Vec<String>,
    pub completed: Vec<String>,
    pub panel_history: Vec<Panels>,
}

#[cfg(any(test, feature = "testing"))]
impl RecordingFrontend {
    pub fn answering(confirm_answer: bool) -> Self {
        Self {
            confirm_answer,
            ..Default::default()
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl Frontend for RecordingFrontend {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.confirms.push(question.to_string());
        self.confirm_answer
    }

    fn spinner(&self, _label: &str) -> ProgressBar {
        ProgressBar::hidden()
    }

    fn show_video_info(&mut self, info: &VideoInfo) {
        self.rendered_info.push(info.clone());
    }

    fn show_progress(&mut self, text: &str) {
        self.progress_texts.push(text.to_string());
    }

    fn show_complete(&mut self, file_label: &str) {
        self.completed.push(file_label.to_string());
    }

    fn file_progress(&self, _total: Option<u64>) -> ProgressBar {
        ProgressBar::hidden()
    }

    fn panels_changed(&mut self, panels: &Panels) {
        self.panel_history.push(*panels);
    }
}
