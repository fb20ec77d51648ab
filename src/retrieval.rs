// src/retrieval.rs

use crate::{error::*, utils};
use futures::StreamExt;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use reqwest::Response;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tokio_util::sync::CancellationToken;

/// 将文件流写入输出目录。先写入同目录的临时文件，完整接收后再改名，避免留下半截文件。
/// 取消时临时文件随 drop 删除。
pub async fn save_response(
    res: Response,
    output_dir: &Path,
    filename: &str,
    pbar: ProgressBar,
    cancel: &CancellationToken,
) -> AppResult<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let local_name = utils::sanitize_filename(filename);
    let target = utils::secure_join_path(output_dir, Path::new(&local_name))?;
    debug!("文件 '{}' 将保存到 {}", filename, target.display());

    let mut temp = tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(output_dir)?;
    let mut stream = res.bytes_stream();
    let mut written = 0u64;
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                pbar.abandon();
                warn!("保存 '{}' 时被中断，已写入 {} 字节", filename, written);
                return Err(AppError::UserInterrupt);
            }
            next = stream.next() => next,
        };
        let Some(chunk_result) = next else { break };
        let chunk = chunk_result?;
        temp.write_all(&chunk)?;
        written += chunk.len() as u64;
        pbar.inc(chunk.len() as u64);
    }
    temp.flush()?;
    pbar.finish_and_clear();

    temp.persist(&target)?;
    info!("已保存 {} 字节到 {}", written, target.display());
    Ok(target)
}
