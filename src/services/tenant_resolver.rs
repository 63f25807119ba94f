//! 帐号解析 - 业务能力层
//!
//! 在页面内带 cookie 请求辅助页面，从 HTML 中用正则取出帐号。
//! 任何失败都只会得到"没有帐号"，不会向上抛错

use crate::error::{AppResult, ProfileError};
use crate::infrastructure::PageDriver;
use crate::models::site_profile::TenantRules;
use crate::models::TenantId;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

pub struct TenantResolver {
    source_path: String,
    pattern: Regex,
}

impl TenantResolver {
    pub fn new(rules: &TenantRules, source_path: impl Into<String>) -> AppResult<Self> {
        let pattern = Regex::new(&rules.pattern).map_err(|source| ProfileError::InvalidPattern {
            pattern: rules.pattern.clone(),
            source,
        })?;
        Ok(Self {
            source_path: source_path.into(),
            pattern,
        })
    }

    /// 从 HTML 中解析帐号
    pub fn parse(&self, html: &str) -> Option<TenantId> {
        match self.pattern.captures(html).and_then(|c| c.get(1)) {
            Some(m) => {
                info!("[帐号] 从 HTML 解析到帐号: {}", m.as_str());
                TenantId::new(m.as_str())
            }
            None => {
                info!("[帐号] 无法从 HTML 解析帐号");
                None
            }
        }
    }

    /// 请求辅助页面并解析帐号
    pub async fn fetch_tenant_id(&self, driver: &dyn PageDriver) -> Option<TenantId> {
        info!("[帐号] 开始抓取帐号: {}", self.source_path);
        match driver.fetch_text(&self.source_path).await {
            Ok(response) if response.ok => self.parse(&response.body),
            Ok(response) => {
                warn!("[帐号] 请求失败，HTTP {}", response.status);
                None
            }
            Err(e) => {
                error!("[帐号] 请求发生错误: {}", e);
                None
            }
        }
    }
}

/// 一次页面载入期间的帐号
///
/// 帐号在背景抓取，需要的地方再等待
#[derive(Clone)]
pub struct TenantSlot {
    rx: watch::Receiver<Option<TenantId>>,
}

impl TenantSlot {
    /// 在背景抓取帐号
    pub fn spawn(resolver: Arc<TenantResolver>, driver: Arc<dyn PageDriver>) -> Self {
        let (tx, rx) = watch::channel(None);
        tokio::spawn(async move {
            let tenant = resolver.fetch_tenant_id(driver.as_ref()).await;
            let _ = tx.send(tenant);
        });
        Self { rx }
    }

    /// 已知结果（投票页不抓取时为 None）
    pub fn ready(tenant: Option<TenantId>) -> Self {
        let (_tx, rx) = watch::channel(tenant);
        Self { rx }
    }

    pub fn current(&self) -> Option<TenantId> {
        self.rx.borrow().clone()
    }

    /// 等待直到帐号有值，最多尝试 `max_retries` 次，每次间隔 `delay`
    pub async fn wait_until_available(
        &self,
        max_retries: u32,
        delay: Duration,
    ) -> Option<TenantId> {
        for attempt in 1..=max_retries {
            if let Some(tenant) = self.current() {
                info!("[帐号] 已取得帐号：{}（第 {} 次）", tenant, attempt);
                return Some(tenant);
            }
            info!("[帐号] 第 {} 次等待帐号...", attempt);
            sleep(delay).await;
        }

        warn!("[帐号] 超过最大次数，帐号仍为空");
        self.current()
    }
}
