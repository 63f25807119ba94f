//! 定位器与步骤
//!
//! 定位器与步骤都属于配置数据，构造之后不再修改

use serde::{Deserialize, Serialize};
use std::fmt;

/// 元素定位器
///
/// 根据字符串首字符区分两种查询方式：
/// - `/` 或 `(` 开头：XPath（层级路径查询）
/// - 其他：CSS 选择器（结构选择器）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Locator {
    /// CSS 选择器
    Structural(String),
    /// XPath 查询，取第一个按文档顺序匹配的节点
    PathQuery(String),
}

impl Locator {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.starts_with('/') || raw.starts_with('(') {
            Locator::PathQuery(raw)
        } else {
            Locator::Structural(raw)
        }
    }

    /// 原始字符串
    pub fn raw(&self) -> &str {
        match self {
            Locator::Structural(s) | Locator::PathQuery(s) => s,
        }
    }
}

impl From<String> for Locator {
    fn from(raw: String) -> Self {
        Locator::parse(raw)
    }
}

impl From<&str> for Locator {
    fn from(raw: &str) -> Self {
        Locator::parse(raw)
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        match locator {
            Locator::Structural(s) | Locator::PathQuery(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}

/// 单个点击步骤
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub locator: Locator,
    /// 预期的按钮文字（去除首尾空白后比较）
    #[serde(default)]
    pub label: Option<String>,
    /// 日志标签
    #[serde(default)]
    pub tag: Option<String>,
}

impl Step {
    pub fn new(locator: impl Into<Locator>) -> Self {
        Self {
            locator: locator.into(),
            label: None,
            tag: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// 流程中的一步：步骤本身 + 编排信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStep {
    #[serde(flatten)]
    pub step: Step,
    /// 执行前额外等待
    #[serde(default)]
    pub delay_before_ms: u64,
    /// 后续步骤依赖本步成功时设为 true，失败则中止流程
    #[serde(default)]
    pub halt_on_failure: bool,
}

/// 步骤执行结果
///
/// 三个标志分别对应"未找到"、"文字不匹配"、"已点击"三条日志路径
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepResult {
    pub found: bool,
    pub label_matched: bool,
    pub clicked: bool,
}

impl StepResult {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn mismatched() -> Self {
        Self {
            found: true,
            ..Self::default()
        }
    }

    pub fn clicked() -> Self {
        Self {
            found: true,
            label_matched: true,
            clicked: true,
        }
    }

    pub fn is_success(&self) -> bool {
        self.found && self.label_matched && self.clicked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_kind_by_leading_char() {
        assert!(matches!(
            Locator::parse("//*[@id=\"stockInfo\"]/tbody/tr[1]/td[4]/a[1]"),
            Locator::PathQuery(_)
        ));
        assert!(matches!(Locator::parse("(//a)[2]"), Locator::PathQuery(_)));
        assert!(matches!(Locator::parse("#go"), Locator::Structural(_)));
        assert!(matches!(
            Locator::parse("body > div.c-main > form"),
            Locator::Structural(_)
        ));
    }

    #[test]
    fn test_recipe_step_from_toml() {
        let step: RecipeStep = toml::from_str(
            r##"
            locator = "#go"
            label = "確認"
            delay_before_ms = 500
            "##,
        )
        .unwrap();
        assert_eq!(step.step.locator, Locator::Structural("#go".into()));
        assert_eq!(step.step.label.as_deref(), Some("確認"));
        assert_eq!(step.step.tag, None);
        assert_eq!(step.delay_before_ms, 500);
        assert!(!step.halt_on_failure);
    }

    #[test]
    fn test_step_result_success_needs_all_flags() {
        assert!(StepResult::clicked().is_success());
        assert!(!StepResult::mismatched().is_success());
        assert!(!StepResult::not_found().is_success());
    }
}
