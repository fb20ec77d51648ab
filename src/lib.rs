// src/lib.rs

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod frontend;
pub mod models;
pub mod poller;
pub mod retrieval;
pub mod session;
pub mod symbols;
pub mod ui;
pub mod utils;
mod workflows;

use crate::{
    api::{HttpJobApi, JobApi},
    cli::Cli,
    client::RobustClient,
    config::AppConfig,
    controller::{Controller, ControllerOptions},
    error::AppResult,
    frontend::TerminalFrontend,
    poller::PollOptions,
};
use log::{debug, info};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 根据配置组装控制器
pub fn build_controller(
    config: &AppConfig,
    api: Arc<dyn JobApi>,
    assume_yes: bool,
    cancellation_token: CancellationToken,
) -> Controller<TerminalFrontend> {
    let options = ControllerOptions {
        poll: PollOptions {
            interval: config.poll_interval,
            max_attempts: config.poll_max_attempts,
        },
        output_dir: config.output_dir.clone(),
        download_defaults: config.download_defaults.clone(),
    };
    Controller::new(
        api,
        TerminalFrontend::new(assume_yes),
        options,
        cancellation_token,
    )
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>, cancellation_token: CancellationToken) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);

    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);
    ui::info(&format!("Server: {}", config.server_url));

    let http_client = Arc::new(RobustClient::new(config.clone())?);
    let api: Arc<dyn JobApi> = Arc::new(HttpJobApi::new(http_client));
    let mut controller = build_controller(&config, api, args.yes, cancellation_token);

    if args.interactive {
        info!("进入交互模式");
        workflows::run_interactive(&mut controller).await
    } else if let Some(url) = &args.url {
        workflows::run_single(&mut controller, url, !args.no_save).await
    } else if let Some(url) = &args.info {
        workflows::run_info(&mut controller, url).await
    } else if let Some(url) = &args.playlist {
        workflows::run_playlist(&mut controller, url).await
    } else {
        Ok(())
    }
}
