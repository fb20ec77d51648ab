// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use log::warn;
use std::{env, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use ytdl_remote::{
    cli::{Cli, LogLevel},
    constants,
    error::AppError,
    run_from_cli, symbols,
};

const INTERRUPT_GRACE: Duration = Duration::from_secs(3);

fn setup_logging(level: LogLevel) {
    if level == LogLevel::Off {
        return;
    }

    // 使用 clap::crate_name!() 宏获取程序名，避免硬编码
    let app_name = clap::crate_name!();

    // 优先使用用户主目录下的配置目录
    let log_file_path = match dirs::home_dir() {
        Some(home) => home
            .join(constants::CONFIG_DIR_NAME)
            .join(constants::LOG_FILE_NAME),
        None => {
            eprintln!("warning: home directory not found, logging to the temp directory.");
            env::temp_dir().join(app_name).join(constants::LOG_FILE_NAME)
        }
    };

    if let Some(dir) = log_file_path.parent()
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("warning: could not create log directory {:?}: {}", dir, e);
    }

    let file_appender = match fern::log_file(&log_file_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!(
                "warning: could not open log file {:?}: {}. Trying a fallback file.",
                log_file_path, e
            );
            let fallback_path = env::temp_dir().join(format!(
                "{}-{}",
                app_name,
                constants::LOG_FALLBACK_FILE_NAME
            ));
            match fern::log_file(&fallback_path) {
                Ok(fb_file) => {
                    warn!("日志将写入备用文件: {:?}", fallback_path);
                    fb_file
                }
                Err(e_fb) => {
                    eprintln!(
                        "error: could not open fallback log file {:?}: {}. File logging disabled.",
                        fallback_path, e_fb
                    );
                    return;
                }
            }
        }
    };

    let result = fern::Dispatch::new()
        .level(log::LevelFilter::from(level))
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{:<5}] [{}:{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                message
            ))
        })
        .chain(file_appender)
        .apply();

    if let Err(e) = result {
        eprintln!("warning: logger initialisation failed: {}", e);
    }
}

#[tokio::main]
async fn main() {
    // 为 Windows 终端启用 ANSI 颜色支持。
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }

    let cancellation_token = CancellationToken::new();
    let ctrl_c_token = cancellation_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
            println!("\n{} Interrupted by user.", *symbols::WARN);
            // 轮询与文件保存会响应取消并清理临时文件；阻塞在输入上时超时后强制退出
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = tokio::time::sleep(INTERRUPT_GRACE) => {}
            }
            std::process::exit(130);
        }
    });

    let bin_name = env::var("CARGO_BIN_NAME").unwrap_or_else(|_| clap::crate_name!().to_string());

    let after_help = format!(
        "Examples:\n  # Interactive session (recommended)\n  {bin} -i\n\n  # Download one video and save it locally\n  {bin} --url \"https://www.youtube.com/watch?v=...\" -q 720p\n\n  # Download a playlist on the server without prompting\n  {bin} --playlist \"https://www.youtube.com/playlist?list=...\" -y\n\n  # Talk to a remote server\n  {bin} --server http://media-box:5000 --info \"https://...\"",
        bin = bin_name
    );

    let cmd = Cli::command().after_help(after_help);
    let args = match Cli::from_arg_matches(&cmd.get_matches()) {
        Ok(args) => Arc::new(args),
        Err(e) => e.exit(),
    };

    setup_logging(args.log_level);

    match run_from_cli(args, cancellation_token).await {
        Ok(()) => {}
        // 已由前端提示过，不再重复打印
        Err(AppError::ActionFailed(_)) => std::process::exit(1),
        Err(AppError::UserInterrupt) => std::process::exit(130),
        Err(e) => {
            eprintln!("\n{} {}", *symbols::ERROR, format!("Error: {}", e).red());
            std::process::exit(1);
        }
    }
}
