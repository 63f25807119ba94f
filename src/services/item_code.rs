//! 从结果页标题取出股票代号

use crate::error::{AppResult, ProfileError};
use crate::infrastructure::PageDriver;
use crate::models::{ItemCode, Locator};
use crate::services::element_locator;
use regex::Regex;
use tracing::{debug, warn};

pub struct ItemCodePattern {
    pattern: Regex,
}

impl ItemCodePattern {
    pub fn new(pattern: &str) -> AppResult<Self> {
        let pattern = Regex::new(pattern).map_err(|source| ProfileError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern })
    }

    /// 例如 "貴股東對2330台積電..." 取出 "2330台積電..." 中第一个非空白片段
    pub fn parse(&self, heading: &str) -> Option<ItemCode> {
        self.pattern
            .captures(heading.trim())
            .and_then(|c| c.get(1))
            .and_then(|m| ItemCode::new(m.as_str()))
    }

    /// 读取页面标题并解析；找不到标题或不匹配都返回 None
    pub async fn extract(&self, driver: &dyn PageDriver, heading: &Locator) -> Option<ItemCode> {
        match element_locator::locate_text(driver, heading, None).await {
            Ok(Some(text)) => {
                let code = self.parse(&text);
                debug!("标题 '{}' 解析出代号 {:?}", text, code);
                code
            }
            Ok(None) => {
                warn!("[未找到] 标题 {}", heading);
                None
            }
            Err(e) => {
                warn!("读取标题失败: {}", e);
                None
            }
        }
    }
}
