// src/client.rs

use crate::{config::AppConfig, error::*};
use anyhow::anyhow;
use log::debug;
use reqwest::{IntoUrl, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    Retryable, RetryableStrategy, RetryTransientMiddleware, default_on_request_failure,
    policies::ExponentialBackoff,
};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

/// GET 请求只重试连接层失败与限流；服务器用 5xx 报告应用错误，不重试。
struct ConnectionFailuresOnly;

impl RetryableStrategy for ConnectionFailuresOnly {
    fn handle(
        &self,
        res: &Result<Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                Some(Retryable::Transient)
            }
            Ok(_) => None,
            Err(error) => default_on_request_failure(error),
        }
    }
}

#[derive(Clone)]
pub struct RobustClient {
    /// 带重试中间件，只用于 GET
    pub client: ClientWithMiddleware,
    /// 不重试：创建任务、下载播放列表都不是幂等操作，失败后由用户重新触发
    single_shot: reqwest::Client,
    config: Arc<AppConfig>,
}

impl RobustClient {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let inner = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Other(anyhow!("failed to build the HTTP client: {}", e)))?;
        let client = ClientBuilder::new(inner.clone())
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                ConnectionFailuresOnly,
            ))
            .build();

        Ok(Self {
            client,
            single_shot: inner,
            config,
        })
    }

    /// 拼接服务器基础地址与接口路径
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.config.server_url.as_str().trim_end_matches('/'),
            path
        )
    }

    /// 服务器用 4xx/5xx 携带 JSON 错误体，因此这里不调用 error_for_status
    pub async fn get<T: IntoUrl>(&self, url: T) -> AppResult<Response> {
        Ok(self.client.get(url).send().await?)
    }

    /// 短查询接口；使用独立的 status_timeout，而不是为播放列表准备的长超时
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> AppResult<R> {
        let url = self.endpoint(path);
        debug!("GET {} (超时 {:?})", url, self.config.status_timeout);
        let res = self
            .client
            .get(&url)
            .timeout(self.config.status_timeout)
            .send()
            .await?;
        Self::parse_json(url, res).await
    }

    pub async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<R> {
        let url = self.endpoint(path);
        debug!("POST {}", url);
        let res = self.single_shot.post(&url).json(body).send().await?;
        Self::parse_json(url, res).await
    }

    async fn parse_json<R: DeserializeOwned>(url: String, res: Response) -> AppResult<R> {
        let status = res.status();
        let text = res.text().await?;
        serde_json::from_str(&text).map_err(|source| {
            debug!("来自 '{}' 的响应 (HTTP {}) 无法解析: {}", url, status, text);
            AppError::ApiParseFailed { url, source }
        })
    }
}
