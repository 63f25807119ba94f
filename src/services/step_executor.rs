//! 步骤执行 - 业务能力层
//!
//! 定位 → 校验文字 → 点击 → 等待页面反应。
//! 任何失败都只记录日志并体现在 [`StepResult`] 中，不会中断整个页面流程

use crate::infrastructure::{ElementRef, PageDriver};
use crate::models::{Locator, Step, StepResult};
use crate::services::element_locator;
use anyhow::Result;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// 点击后默认等待时间
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

/// 步骤目标：尚未定位的定位器，或已经拿到的元素
#[derive(Debug, Clone, Copy)]
pub enum StepTarget<'a> {
    Locator(&'a Locator),
    Element(ElementRef),
}

impl fmt::Display for StepTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepTarget::Locator(locator) => write!(f, "{}", locator),
            StepTarget::Element(element) => write!(f, "{}", element),
        }
    }
}

/// 文字比较前的规范化：去除首尾空白
pub fn normalize_label(text: &str) -> &str {
    text.trim()
}

/// 步骤执行器
pub struct StepExecutor {
    settle: Duration,
}

impl StepExecutor {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// 执行一个配置好的步骤
    pub async fn run_step(&self, driver: &dyn PageDriver, step: &Step) -> StepResult {
        self.execute(
            driver,
            StepTarget::Locator(&step.locator),
            step.label.as_deref(),
            step.tag.as_deref(),
        )
        .await
    }

    /// 点击指定元素并等待执行完成
    pub async fn execute(
        &self,
        driver: &dyn PageDriver,
        target: StepTarget<'_>,
        expected_label: Option<&str>,
        tag: Option<&str>,
    ) -> StepResult {
        let mut result = StepResult::default();
        if let Err(e) = self
            .try_execute(driver, target, expected_label, tag, &mut result)
            .await
        {
            error!("[错误] 点击失败: {} | {}", target, e);
        }
        result
    }

    async fn try_execute(
        &self,
        driver: &dyn PageDriver,
        target: StepTarget<'_>,
        expected_label: Option<&str>,
        tag: Option<&str>,
        result: &mut StepResult,
    ) -> Result<()> {
        let element = match target {
            StepTarget::Element(element) => Some(element),
            StepTarget::Locator(locator) => element_locator::locate(driver, locator, None).await?,
        };

        let Some(element) = element else {
            warn!("[未找到] {}", target);
            return Ok(());
        };
        result.found = true;

        if let Some(expected) = expected_label {
            let raw = driver.inner_text(element).await?;
            let actual = normalize_label(&raw);
            if actual != expected {
                warn!("[文字不匹配] 预期: '{}'，但实际为: '{}'", expected, actual);
                return Ok(());
            }
        }
        result.label_matched = true;

        match tag {
            Some(tag) => info!("[点击] {} | {}", target, tag),
            None => info!("[点击] {}", target),
        }
        driver.click(element).await?;
        result.clicked = true;

        sleep(self.settle).await;
        Ok(())
    }
}

impl Default for StepExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE)
    }
}
