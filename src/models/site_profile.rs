//! 站点配置
//!
//! 路径、选择器、按钮文字和各页面的点击流程都是配置数据，
//! 引擎本身不写死任何站点细节

use crate::models::step::{Locator, RecipeStep, Step};
use serde::{Deserialize, Serialize};

/// 内置的集保 e 手投票配置
pub const BUILTIN_PROFILE: &str = include_str!("../../config/tdcc.toml");

/// 站点配置根
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    pub name: String,
    pub paths: PathRules,
    pub tenant: TenantRules,
    pub readiness: ReadinessRules,
    pub final_confirm: Recipe,
    pub voting: Recipe,
    pub hub: HubLayout,
    pub print: PrintLayout,
    pub order_entry: OrderEntryLayout,
}

/// 页面状态判定所用的路径
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRules {
    /// 投票子页面前缀（包含匹配）
    pub voting_prefix: String,
    /// 最终确认页（包含匹配）
    pub final_confirm: String,
    /// 股票列表首页（完全相等）
    pub hub: String,
    /// 列印结果页（完全相等）
    pub print_ready: String,
    /// 抓取帐号所用的辅助页面
    pub tenant_source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRules {
    /// 第一个捕获组即为帐号
    pub pattern: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub fallback_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessRules {
    pub poll_ms: u64,
    pub timeout_ms: u64,
}

/// 一个页面状态下按顺序执行的步骤
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub steps: Vec<RecipeStep>,
}

/// 股票列表页的表格结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubLayout {
    pub rows: Locator,
    /// 行内：股票代号所在单元格
    pub code_cell: Locator,
    /// 行内：标记追加到的单元格
    pub target_cell: Locator,
    /// 行内："查询"入口
    pub enter_link: Locator,
    pub enter_label: String,
    pub marker_text: String,
    pub marker_class: String,
    /// 自动进入第一笔尚未投票的股票
    pub auto_enter: Step,
}

impl HubLayout {
    /// 在目标单元格内查找已渲染标记的定位器
    pub fn marker_locator(&self) -> Locator {
        Locator::Structural(format!(".{}", self.marker_class))
    }
}

/// 投票结果列印页
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintLayout {
    pub ready_marker: Locator,
    pub ready_text: String,
    pub heading: Locator,
    /// 第一个捕获组即为股票代号
    pub item_pattern: String,
    pub item_fallback_label: String,
    pub export_root: Locator,
    /// 只截取导出区域的前几个子元素，缺省为整个区域
    #[serde(default)]
    pub export_children: Option<usize>,
    pub export_delay_ms: u64,
    pub return_step: Step,
}

/// 零股批次下单页
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEntryLayout {
    pub input: Locator,
    pub submit: Locator,
    pub suggestion_menu: Locator,
    pub suggestion_item: Locator,
    pub share_kind: Locator,
    pub share_kind_value: String,
    pub price_button: Locator,
    pub key_delay_ms: u64,
    pub suggestion_wait_ms: u64,
    pub settle_ms: u64,
    pub tick_ms: u64,
}

impl SiteProfile {
    /// 解析内置配置
    pub fn builtin() -> anyhow::Result<Self> {
        crate::models::loaders::parse_site_profile(BUILTIN_PROFILE, "<builtin>")
    }
}
