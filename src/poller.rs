// src/poller.rs

use crate::{
    api::JobApi,
    error::{AppError, AppResult},
    models::{DownloadJobHandle, JobStatus},
};
use anyhow::anyhow;
use log::{debug, error, info, warn};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    /// None 表示一直轮询到终止状态
    pub max_attempts: Option<u32>,
}

/// 非终止的轮询结果，发送给控制器用于更新进度文本
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Pending {
        attempt: u32,
        status: Option<String>,
        progress: Option<f64>,
    },
    RequestFailed {
        attempt: u32,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed { filename: String, requests: u32 },
    Failed { error: String, requests: u32 },
    Cancelled { requests: u32 },
    LimitReached { requests: u32 },
}

/// 后台轮询任务。每次请求都等待返回后才进入下一个周期，因此不会有重叠的状态请求。
pub struct PollingTask {
    cancel: CancellationToken,
    handle: JoinHandle<PollOutcome>,
    events: mpsc::UnboundedReceiver<PollEvent>,
}

impl PollingTask {
    /// 第一次请求发生在启动后的一个周期之后
    pub fn start(
        api: Arc<dyn JobApi>,
        job: DownloadJobHandle,
        options: PollOptions,
        parent: &CancellationToken,
    ) -> Self {
        let cancel = parent.child_token();
        let (tx, events) = mpsc::unbounded_channel();
        info!(
            "开始轮询任务 {} (间隔 {:?}, 上限 {:?})",
            job.download_id, options.interval, options.max_attempts
        );
        let handle = tokio::spawn(poll_loop(api, job, options, cancel.clone(), tx));
        Self {
            cancel,
            handle,
            events,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 任务结束后返回 None
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    pub async fn join(self) -> AppResult<PollOutcome> {
        self.handle
            .await
            .map_err(|e| AppError::Other(anyhow!("status polling task aborted: {}", e)))
    }
}

async fn poll_loop(
    api: Arc<dyn JobApi>,
    job: DownloadJobHandle,
    options: PollOptions,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<PollEvent>,
) -> PollOutcome {
    let mut ticker = time::interval_at(Instant::now() + options.interval, options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut requests = 0u32;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled { requests },
            _ = ticker.tick() => {}
        }
        if let Some(max) = options.max_attempts
            && requests >= max
        {
            warn!("任务 {} 轮询达到上限 {} 次，停止轮询", job.download_id, max);
            return PollOutcome::LimitReached { requests };
        }

        requests += 1;
        let result = tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled { requests },
            result = api.download_status(&job) => result,
        };

        match result {
            Ok(JobStatus::Completed { filename }) => {
                info!("任务 {} 完成，文件: {}", job.download_id, filename);
                return PollOutcome::Completed { filename, requests };
            }
            Ok(JobStatus::Failed { error }) => {
                warn!("任务 {} 失败: {}", job.download_id, error);
                return PollOutcome::Failed { error, requests };
            }
            Ok(JobStatus::Pending { status, progress }) => {
                debug!("任务 {} 第 {} 次查询: {:?} {:?}", job.download_id, requests, status, progress);
                let _ = events.send(PollEvent::Pending {
                    attempt: requests,
                    status,
                    progress,
                });
            }
            Err(e) => {
                // 传输失败不终止轮询
                if e.is_request_error() {
                    warn!("轮询任务 {} 状态请求失败: {}", job.download_id, e);
                } else {
                    error!("轮询任务 {} 状态出错: {}", job.download_id, e);
                }
                let _ = events.send(PollEvent::RequestFailed {
                    attempt: requests,
                    error: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DownloadRequest, PlaylistSummary, VideoInfo};
    use async_trait::async_trait;
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicU32, Ordering},
        },
    };

    struct ScriptedStatus {
        script: Mutex<VecDeque<AppResult<JobStatus>>>,
        calls: AtomicU32,
    }

    impl ScriptedStatus {
        fn new(script: Vec<AppResult<JobStatus>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl JobApi for ScriptedStatus {
        async fn video_info(&self, _url: &str) -> AppResult<VideoInfo> {
            unreachable!()
        }
        async fn start_download(&self, _request: &DownloadRequest) -> AppResult<DownloadJobHandle> {
            unreachable!()
        }
        async fn download_status(&self, _job: &DownloadJobHandle) -> AppResult<JobStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(JobStatus::Pending { status: None, progress: None }))
        }
        async fn download_file(&self, _filename: &str) -> AppResult<reqwest::Response> {
            unreachable!()
        }
        async fn playlist_download(&self, _url: &str) -> AppResult<PlaylistSummary> {
            unreachable!()
        }
    }

    fn pending() -> AppResult<JobStatus> {
        Ok(JobStatus::Pending { status: Some("downloading".into()), progress: Some(0.0) })
    }

    fn job() -> DownloadJobHandle {
        DownloadJobHandle { download_id: "1712345678.9".into() }
    }

    fn options(max_attempts: Option<u32>) -> PollOptions {
        PollOptions { interval: Duration::from_millis(2000), max_attempts }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_do_not_stop_polling() {
        let api = ScriptedStatus::new(vec![
            Err(AppError::ApiParseFailed {
                url: "/api/download-status/1712345678.9".into(),
                source: serde_json::from_str::<serde_json::Value>("<html>").unwrap_err(),
            }),
            pending(),
            Ok(JobStatus::Completed { filename: "x.mp4".into() }),
        ]);
        let mut task = PollingTask::start(api.clone(), job(), options(None), &CancellationToken::new());

        let mut events = Vec::new();
        while let Some(event) = task.next_event().await {
            events.push(event);
        }
        let outcome = task.join().await.unwrap();

        assert_eq!(outcome, PollOutcome::Completed { filename: "x.mp4".into(), requests: 3 });
        assert!(matches!(events[0], PollEvent::RequestFailed { attempt: 1, .. }));
        assert!(matches!(events[1], PollEvent::Pending { attempt: 2, .. }));
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_request_waits_one_interval() {
        let api = ScriptedStatus::new(vec![Ok(JobStatus::Failed { error: "failed".into() })]);
        let started = Instant::now();
        let task = PollingTask::start(api.clone(), job(), options(None), &CancellationToken::new());
        let outcome = task.join().await.unwrap();
        assert_eq!(outcome, PollOutcome::Failed { error: "failed".into(), requests: 1 });
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_the_loop() {
        let api = ScriptedStatus::new(vec![]);
        let task = PollingTask::start(api.clone(), job(), options(None), &CancellationToken::new());
        time::sleep(Duration::from_millis(4500)).await;
        task.cancel();
        assert!(task.is_cancelled());
        let outcome = task.join().await.unwrap();
        assert_eq!(outcome, PollOutcome::Cancelled { requests: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_propagates() {
        let root = CancellationToken::new();
        let api = ScriptedStatus::new(vec![]);
        let task = PollingTask::start(api, job(), options(None), &root);
        root.cancel();
        assert_eq!(task.join().await.unwrap(), PollOutcome::Cancelled { requests: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_limit() {
        let api = ScriptedStatus::new(vec![]);
        let task = PollingTask::start(api.clone(), job(), options(Some(3)), &CancellationToken::new());
        assert_eq!(task.join().await.unwrap(), PollOutcome::LimitReached { requests: 3 });
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    }
}
