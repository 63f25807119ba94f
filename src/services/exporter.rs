//! 结果截图导出 - 业务能力层
//!
//! 截图本身要在离开页面前完成，调用方等待截图结束；写档在背景进行，
//! 调用方不等待写档结果就视为已保存（至少一次）

use crate::infrastructure::PageDriver;
use crate::models::{ItemCode, Locator, TenantId};
use crate::services::element_locator::locate;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[async_trait]
pub trait Exporter: Send + Sync {
    /// 截取 `root` 区域并在背景写成 `filename_hint`
    ///
    /// 返回时截图已完成；找不到区域或截图失败时返回 None
    async fn export(
        &self,
        root: &Locator,
        child_limit: Option<usize>,
        filename_hint: &str,
    ) -> Option<JoinHandle<()>>;
}

/// 导出文件名：`<帐号>_<代号>.jpg`，缺失时使用后备文字
pub fn export_filename(
    tenant: Option<&TenantId>,
    item: Option<&ItemCode>,
    tenant_fallback: &str,
    item_fallback: &str,
) -> String {
    format!(
        "{}_{}.jpg",
        tenant.map(TenantId::as_str).unwrap_or(tenant_fallback),
        item.map(ItemCode::as_str).unwrap_or(item_fallback)
    )
}

/// 截图并写入导出目录
pub struct ScreenshotExporter {
    driver: Arc<dyn PageDriver>,
    out_dir: PathBuf,
}

impl ScreenshotExporter {
    pub fn new(driver: Arc<dyn PageDriver>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            driver,
            out_dir: out_dir.into(),
        }
    }

    async fn capture(&self, root: &Locator, child_limit: Option<usize>) -> Result<Option<Vec<u8>>> {
        let Some(element) = locate(self.driver.as_ref(), root, None).await? else {
            return Ok(None);
        };
        let bytes = self.driver.capture_jpeg(element, child_limit).await?;
        Ok(Some(bytes))
    }
}

#[async_trait]
impl Exporter for ScreenshotExporter {
    async fn export(
        &self,
        root: &Locator,
        child_limit: Option<usize>,
        filename_hint: &str,
    ) -> Option<JoinHandle<()>> {
        let target = self.out_dir.join(filename_hint);

        let bytes = match self.capture(root, child_limit).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                warn!("[导出] 找不到导出区域: {}", root);
                return None;
            }
            Err(e) => {
                error!("[导出] 截图失败 {}: {:#}", target.display(), e);
                return None;
            }
        };

        Some(tokio::spawn(async move {
            match write_file(&target, &bytes).await {
                Ok(()) => info!("[导出] 已保存截图: {}", target.display()),
                Err(e) => error!("[导出] 写档失败 {}: {:#}", target.display(), e),
            }
        }))
    }
}

async fn write_file(target: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("无法创建导出目录: {}", parent.display()))?;
    }
    tokio::fs::write(target, bytes)
        .await
        .with_context(|| format!("无法写入截图: {}", target.display()))?;
    Ok(())
}
