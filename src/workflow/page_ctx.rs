//! 页面处理上下文
//!
//! 每次页面载入构建一次，载入结束即丢弃；没有任何跨页面的全局状态

use crate::error::AppResult;
use crate::infrastructure::{JsonFileStore, PageDriver};
use crate::models::SiteProfile;
use crate::services::{
    CompletionLedger, Exporter, ItemCodePattern, StepExecutor, TenantResolver, TenantSlot,
};
use crate::workflow::page_state::PageState;
use anyhow::Result;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// 跨页面共享、只读的依赖
#[derive(Clone)]
pub struct PageDeps {
    pub driver: Arc<dyn PageDriver>,
    pub profile: Arc<SiteProfile>,
    pub ledger_file: PathBuf,
    pub exporter: Arc<dyn Exporter>,
    pub tenant_resolver: Arc<TenantResolver>,
    pub item_pattern: Arc<ItemCodePattern>,
    pub step_settle: Duration,
}

impl PageDeps {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        profile: Arc<SiteProfile>,
        ledger_file: impl Into<PathBuf>,
        exporter: Arc<dyn Exporter>,
        step_settle: Duration,
    ) -> AppResult<Self> {
        let tenant_resolver = Arc::new(TenantResolver::new(
            &profile.tenant,
            profile.paths.tenant_source.clone(),
        )?);
        let item_pattern = Arc::new(ItemCodePattern::new(&profile.print.item_pattern)?);
        Ok(Self {
            driver,
            profile,
            ledger_file: ledger_file.into(),
            exporter,
            tenant_resolver,
            item_pattern,
            step_settle,
        })
    }

    pub fn open_ledger(&self) -> AppResult<CompletionLedger> {
        CompletionLedger::load(JsonFileStore::new(&self.ledger_file))
    }
}

/// 一次页面载入的上下文
pub struct PageContext {
    pub path: String,
    pub state: PageState,
    pub deps: PageDeps,
    pub ledger: CompletionLedger,
    pub tenant: TenantSlot,
    pub executor: StepExecutor,
}

impl PageContext {
    /// 读取当前路径、载入已保存记录，并在需要时开始抓取帐号
    pub async fn open(deps: &PageDeps) -> Result<Self> {
        let path = deps.driver.current_path().await?;
        let state = PageState::classify(&path, &deps.profile.paths);

        // 投票页不请求，避免多余且缓慢的请求
        let tenant = if PageState::needs_tenant(&path, &deps.profile.paths) {
            TenantSlot::spawn(deps.tenant_resolver.clone(), deps.driver.clone())
        } else {
            TenantSlot::ready(None)
        };

        let ledger = deps.open_ledger()?;

        Ok(Self {
            path,
            state,
            deps: deps.clone(),
            ledger,
            tenant,
            executor: StepExecutor::new(deps.step_settle),
        })
    }

    pub fn driver(&self) -> &dyn PageDriver {
        self.deps.driver.as_ref()
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.deps.profile
    }
}

impl Display for PageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {}]", self.state, self.path)
    }
}
