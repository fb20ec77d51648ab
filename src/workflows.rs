// src/workflows.rs

use crate::{
    controller::Controller,
    error::{AppError, AppResult},
    frontend::Frontend,
    models::{ContainerFormat, DownloadOptions, Quality},
    symbols, ui,
};
use clap::ValueEnum;
use colored::*;
use log::{error, info, warn};

const PLAYLIST_COMMAND: &str = "playlist ";

/// 操作失败时区分用户中断与已提示过的失败
fn failed<F: Frontend>(controller: &Controller<F>, what: &'static str) -> AppError {
    if controller.is_cancelled() {
        AppError::UserInterrupt
    } else {
        AppError::ActionFailed(what)
    }
}

/// 保存已完成任务的文件并报告结果
async fn save_completed_file<F: Frontend>(controller: &mut Controller<F>) -> AppResult<()> {
    match controller.trigger_file_download().await {
        Ok(path) => {
            ui::success(&format!("Saved to {}", path.display()));
            Ok(())
        }
        Err(AppError::UserInterrupt) => Err(AppError::UserInterrupt),
        Err(e) => {
            error!("取回文件失败: {}", e);
            controller
                .frontend_mut()
                .alert(&format!("Error retrieving file: {}", e));
            Err(AppError::ActionFailed("file retrieval failed"))
        }
    }
}

/// 运行 --info 模式
pub(crate) async fn run_info<F: Frontend>(controller: &mut Controller<F>, url: &str) -> AppResult<()> {
    if controller.fetch_video_info(url).await {
        Ok(())
    } else {
        Err(failed(controller, "could not fetch video info"))
    }
}

/// 运行单任务模式（处理 --url）：信息 → 下载 → 轮询 → 保存
pub(crate) async fn run_single<F: Frontend>(
    controller: &mut Controller<F>,
    url: &str,
    save_file: bool,
) -> AppResult<()> {
    if !controller.fetch_video_info(url).await {
        return Err(failed(controller, "could not fetch video info"));
    }
    print_options_summary(&controller.session().options);
    if !controller.start_download().await {
        return Err(failed(controller, "download did not complete"));
    }
    if save_file {
        save_completed_file(controller).await?;
    } else {
        ui::info("File left on the server (--no-save).");
    }
    controller.reset_interface();
    Ok(())
}

/// 运行 --playlist 模式
pub(crate) async fn run_playlist<F: Frontend>(controller: &mut Controller<F>, url: &str) -> AppResult<()> {
    if controller.download_playlist(url).await {
        Ok(())
    } else {
        Err(failed(controller, "playlist download did not complete"))
    }
}

/// 运行交互模式
pub(crate) async fn run_interactive<F: Frontend>(controller: &mut Controller<F>) -> AppResult<()> {
    ui::print_header("Interactive Mode");
    ui::plain(&format!(
        "Enter a video URL, or '{}<URL>' to download a playlist. Press {} or submit an empty line to quit.",
        PLAYLIST_COMMAND,
        *symbols::CTRL_C
    ));

    loop {
        let input = match ui::prompt("Video URL", None) {
            Ok(input) if !input.is_empty() => input,
            Ok(_) => break, // 用户输入空行，退出循环
            Err(_) => return Err(AppError::UserInterrupt),
        };

        if let Some(playlist_url) = input.strip_prefix(PLAYLIST_COMMAND) {
            controller.download_playlist(playlist_url).await;
            continue;
        }

        if !controller.fetch_video_info(&input).await {
            continue;
        }

        let options = prompt_download_options(&controller.session().options);
        print_options_summary(&options);
        controller.session_mut().options = options;
        if !ui::confirm("Start the download?", true) {
            controller.reset_interface();
            continue;
        }

        if controller.start_download().await {
            let dir = controller.output_dir().display().to_string();
            if ui::confirm(&format!("Save the file to '{}'?", dir), true)
                && let Err(AppError::UserInterrupt) = save_completed_file(controller).await
            {
                return Err(AppError::UserInterrupt);
            }
        }
        controller.reset_interface();
        if controller.is_cancelled() {
            return Err(AppError::UserInterrupt);
        }
    }

    ui::plain("");
    ui::info("Leaving interactive mode.");
    Ok(())
}

fn prompt_download_options(current: &DownloadOptions) -> DownloadOptions {
    ui::print_sub_header("Download Options");

    let quality = loop {
        let input = ui::prompt("Quality (best, worst, 1080p, 720p, 480p, 360p)", Some(&current.quality.to_string()))
            .unwrap_or_default();
        if input.is_empty() {
            break current.quality;
        }
        match input.parse::<Quality>() {
            Ok(q) => break q,
            Err(e) => ui::warn(&e.to_string()),
        }
    };

    let formats: Vec<String> = ContainerFormat::value_variants()
        .iter()
        .map(|f| f.to_string())
        .collect();
    let default_index = ContainerFormat::value_variants()
        .iter()
        .position(|f| *f == current.format)
        .unwrap_or(0);
    let format = match ui::choose_one(&formats, "Output format", default_index) {
        Some(choice) => ContainerFormat::from_str(choice, true).unwrap_or(current.format),
        None => {
            warn!("无效的格式选择，沿用 {}", current.format);
            current.format
        }
    };

    let subtitles = ui::confirm("Embed subtitles?", current.subtitles);
    let audio_only = ui::confirm("Audio only (mp3)?", current.audio_only);

    let options = DownloadOptions { quality, format, subtitles, audio_only };
    info!("下载选项: {:?}", options);
    options
}

fn print_options_summary(options: &DownloadOptions) {
    let summary = if options.audio_only {
        "audio only (mp3)".to_string()
    } else {
        format!("{} / {}", options.quality, options.format)
    };
    let subtitles = if options.subtitles { ", subtitles" } else { "" };
    ui::info(&format!("Options: {}{}", summary.cyan(), subtitles));
}
