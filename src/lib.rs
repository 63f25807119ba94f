//! # TDCC Vote Helper
//!
//! 集保 e 手投票网站的自动化助手：连接已登录的浏览器，
//! 在每次页面载入后依当前页面自动完成投票、截图保存投票结果
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page、记录文件），只暴露能力
//! - `PageDriver` - 页面操作能力的抽象，`CdpPageDriver` 为浏览器实现
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `JsonFileStore` - 以 JSON 文件保存的键值存储
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个能力只处理一件事
//! - `StepExecutor` - 定位 → 核对文字 → 点击
//! - `ReadinessGate` - 等待防机器人 token
//! - `CompletionLedger` - 每个帐号已保存的股票
//! - `TenantResolver` - 抓取当前帐号
//! - `ScreenshotExporter` - 截图导出
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次页面载入"的完整处理流程
//! - `PageContext` - 上下文封装（路径 + 帐号 + 已保存记录）
//! - `router` - 按页面状态分派
//! - `OrderEntryFlow` - 零股批次下单
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 监听页面载入事件，管理资源与运行模式
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod testing;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::{Config, Mode};
pub use error::{AppError, AppResult};
pub use infrastructure::{CdpPageDriver, JsExecutor, JsonFileStore, PageDriver};
pub use models::{Locator, SiteProfile, Step, StepResult};
pub use orchestrator::App;
pub use workflow::{run_page, PageContext, PageDeps, PageState};
