//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use crate::error::AppError;
use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识投票流程、帐号或股票
pub struct JsExecutor {
    page: Page,
}

/// 页面脚本统一返回 `{ v: ... }`，避免顶层 null 无法反序列化
#[derive(Deserialize)]
struct Wrapped<T> {
    v: T,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（截图、重新载入等非脚本操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(AppError::from)?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 执行返回 `{ v: ... }` 的脚本，取出 `v`
    pub async fn eval_wrapped<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let wrapped: Wrapped<T> = self
            .eval_as(js_code)
            .await
            .context("页面脚本返回值格式不正确")?;
        Ok(wrapped.v)
    }
}
