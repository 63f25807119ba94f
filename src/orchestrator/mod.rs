//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 管理应用生命周期，把浏览器事件转成一次次的页面流程。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (监听载入事件 / 运行模式)
//!     ↓
//! workflow::router (处理单次页面载入)
//!     ↓
//! services (能力层：定位 / 点击 / 就绪 / 记录 / 帐号 / 导出)
//!     ↓
//! infrastructure (基础设施：PageDriver / JsExecutor / JsonFileStore)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有 Browser
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度，不做页面判断

pub mod app;

pub use app::{confirm_reset, reset_ledger, watch_loads, App};
