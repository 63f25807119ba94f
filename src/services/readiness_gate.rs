//! 就绪等待 - 业务能力层
//!
//! 部分投票页在 load 事件之后才在背景产生签章 token，
//! 过早点击可能被忽略或被判定为机器人。这里轮询 token 直到有值或超时

use crate::error::{AppResult, ReadinessError};
use crate::infrastructure::PageDriver;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// 就绪结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// 页面没有 token 接口，无需等待
    NotApplicable,
    /// token 已有值
    TokenPresent,
}

/// 两种结局的摘要，便于记录
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessState {
    pub token_present: bool,
    pub deadline_exceeded: bool,
}

impl ReadinessState {
    pub fn from_outcome(outcome: &AppResult<Readiness>) -> Self {
        match outcome {
            Ok(Readiness::TokenPresent) => Self {
                token_present: true,
                deadline_exceeded: false,
            },
            Ok(Readiness::NotApplicable) => Self::default(),
            Err(_) => Self {
                token_present: false,
                deadline_exceeded: true,
            },
        }
    }
}

pub struct ReadinessGate {
    poll: Duration,
    timeout: Duration,
}

impl ReadinessGate {
    pub fn new(poll: Duration, timeout: Duration) -> Self {
        Self { poll, timeout }
    }

    /// 等待 token 就绪
    ///
    /// `has_capability` 为 false 时立即返回 [`Readiness::NotApplicable`]；
    /// 否则每隔 `poll` 调用一次 `poll_token`，去除空白后非空即完成，
    /// 超过 `timeout` 返回 [`ReadinessError::Timeout`]
    pub async fn await_ready<F, Fut>(
        &self,
        has_capability: bool,
        mut poll_token: F,
    ) -> AppResult<Readiness>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<String>>,
    {
        if !has_capability {
            debug!("页面没有 token 接口，跳过等待");
            return Ok(Readiness::NotApplicable);
        }

        let start = Instant::now();
        loop {
            sleep(self.poll).await;

            // 每次都重新读取，token 由页面在背景写入
            if let Some(token) = poll_token().await {
                if !token.trim().is_empty() {
                    info!("token 已就绪 ({}ms)", start.elapsed().as_millis());
                    return Ok(Readiness::TokenPresent);
                }
            }

            if start.elapsed() >= self.timeout {
                let waited_ms = start.elapsed().as_millis() as u64;
                warn!("等待 token 超时 ({}ms)", waited_ms);
                return Err(ReadinessError::Timeout { waited_ms }.into());
            }
        }
    }

    /// 直接在页面上检查接口并轮询 token
    pub async fn await_page(&self, driver: &dyn PageDriver) -> AppResult<Readiness> {
        let has_capability = match driver.has_token_api().await {
            Ok(flag) => flag,
            Err(e) => {
                warn!("检查 token 接口失败，视为没有接口: {}", e);
                false
            }
        };

        self.await_ready(has_capability, move || async move {
            match driver.read_token().await {
                Ok(token) => token,
                Err(e) => {
                    debug!("读取 token 失败: {}", e);
                    None
                }
            }
        })
        .await
    }
}
