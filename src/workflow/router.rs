//! 页面流程 - 流程层
//!
//! 核心职责：根据当前路径决定本页要做的事
//!
//! | 页面 | 动作 |
//! |---|---|
//! | 最终确认 | 按下"確認" |
//! | 投票中 | 等待 token → 全部棄權 → 下一步 … → 確認投票結果 |
//! | 列表首页 | 标注已保存股票 → 自动进入投票；没有可投票的则进入第一笔未保存的查询 |
//! | 列印结果 | 截图 → 记录已保存 → 返回（写档在背景进行） |
//!
//! 步骤失败只记录日志，其余步骤照常执行，除非步骤配置了 `halt_on_failure`

use crate::models::Recipe;
use crate::services::element_locator::locate_text;
use crate::services::hub_table::render_completion_markers;
use crate::services::{
    export_filename, find_first_unmarked, ReadinessGate, ReadinessState, StepTarget,
};
use crate::workflow::page_ctx::{PageContext, PageDeps};
use crate::workflow::page_state::PageState;
use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// 一组步骤的执行统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecipeReport {
    pub succeeded: usize,
    pub failed: usize,
    pub halted: bool,
}

/// 载入上下文并执行本页流程
pub async fn run_page(deps: &PageDeps) -> Result<PageState> {
    let mut ctx = PageContext::open(deps).await?;
    route(&mut ctx).await?;
    Ok(ctx.state)
}

/// 按页面状态分派
pub async fn route(ctx: &mut PageContext) -> Result<()> {
    info!("[当前网址] {}", ctx.path);

    match ctx.state {
        PageState::FinalConfirm => {
            info!("进行电子投票 - 最后的确认");
            let recipe = ctx.profile().final_confirm.clone();
            run_recipe(ctx, &recipe).await;
        }
        PageState::Voting => handle_voting(ctx).await,
        PageState::Hub => handle_hub(ctx).await,
        PageState::PrintReady => handle_print(ctx).await,
        PageState::Unknown => {
            warn!("当前网址不在预期范围内");
            return Ok(());
        }
    }

    info!("✅ 完成 {}", ctx);
    Ok(())
}

/// 依序执行步骤
pub async fn run_recipe(ctx: &PageContext, recipe: &Recipe) -> RecipeReport {
    let mut report = RecipeReport::default();

    for recipe_step in &recipe.steps {
        if recipe_step.delay_before_ms > 0 {
            sleep(Duration::from_millis(recipe_step.delay_before_ms)).await;
        }

        let result = ctx.executor.run_step(ctx.driver(), &recipe_step.step).await;
        if result.is_success() {
            report.succeeded += 1;
            continue;
        }

        report.failed += 1;
        if recipe_step.halt_on_failure {
            warn!("步骤 {} 失败，后续步骤依赖此步，中止本页流程", recipe_step.step.locator);
            report.halted = true;
            break;
        }
    }

    info!(
        "步骤统计: 成功 {}, 失败 {}, 共 {}",
        report.succeeded,
        report.failed,
        recipe.steps.len()
    );
    report
}

async fn handle_voting(ctx: &mut PageContext) {
    info!("进行电子投票 - 投票中");

    // 避免机器人判定
    let rules = &ctx.profile().readiness;
    let gate = ReadinessGate::new(
        Duration::from_millis(rules.poll_ms),
        Duration::from_millis(rules.timeout_ms),
    );
    let outcome = gate.await_page(ctx.driver()).await;
    let state = ReadinessState::from_outcome(&outcome);
    if let Err(e) = outcome {
        warn!("{}，仍继续执行后续步骤", e);
    }
    info!(
        "就绪状态: token={}, 超时={}",
        state.token_present, state.deadline_exceeded
    );

    let recipe = ctx.profile().voting.clone();
    run_recipe(ctx, &recipe).await;
}

async fn handle_hub(ctx: &mut PageContext) {
    info!("位于投票列表首页");

    let tenant_rules = &ctx.profile().tenant;
    let tenant = ctx
        .tenant
        .wait_until_available(
            tenant_rules.max_retries,
            Duration::from_millis(tenant_rules.retry_delay_ms),
        )
        .await;

    // 标注已保存的股票
    let saved = tenant
        .as_ref()
        .map(|t| ctx.ledger.items(t).to_vec())
        .unwrap_or_default();
    let hub = ctx.profile().hub.clone();
    if let Err(e) = render_completion_markers(ctx.driver(), &hub, &saved).await {
        error!("标记已保存股票时发生错误：{}", e);
    }

    // 自动进入尚未投票的股票
    let entered = ctx.executor.run_step(ctx.driver(), &hub.auto_enter).await;
    if entered.is_success() {
        return;
    }

    // 没有可投票的，进入尚未保存结果的股票
    match find_first_unmarked(ctx.driver(), &hub).await {
        Ok(Some(candidate)) => {
            let code = candidate
                .item
                .as_ref()
                .map(|item| item.as_str().to_string())
                .unwrap_or_default();
            let tag = format!("查詢 {} 的投票結果", code);
            ctx.executor
                .execute(
                    ctx.driver(),
                    StepTarget::Element(candidate.enter),
                    Some(hub.enter_label.as_str()),
                    Some(tag.as_str()),
                )
                .await;
        }
        Ok(None) => {}
        Err(e) => error!("寻找未保存股票时发生错误：{}", e),
    }
}

async fn handle_print(ctx: &mut PageContext) {
    info!("准备列印投票结果");

    let tenant_rules = ctx.profile().tenant.clone();
    let tenant = ctx
        .tenant
        .wait_until_available(
            tenant_rules.max_retries,
            Duration::from_millis(tenant_rules.retry_delay_ms),
        )
        .await;

    let print = ctx.profile().print.clone();
    let marker = match locate_text(ctx.driver(), &print.ready_marker, None).await {
        Ok(text) => text,
        Err(e) => {
            error!("读取列印标记失败: {}", e);
            None
        }
    };
    if marker.as_deref() != Some(print.ready_text.as_str()) {
        info!("页面尚未可列印 ({:?})，不做处理", marker);
        return;
    }

    // 保存并返回
    let item = ctx.deps.item_pattern.extract(ctx.driver(), &print.heading).await;
    let filename = export_filename(
        tenant.as_ref(),
        item.as_ref(),
        &tenant_rules.fallback_label,
        &print.item_fallback_label,
    );
    // 截图必须在离开页面前完成；截图完成即视为已保存，不等待写档
    let _ = ctx
        .deps
        .exporter
        .export(&print.export_root, print.export_children, &filename)
        .await;
    if let Err(e) = ctx.ledger.add(tenant.as_ref(), item.as_ref()) {
        error!("记录已保存股票失败: {}", e);
    }

    sleep(Duration::from_millis(print.export_delay_ms)).await;
    ctx.executor.run_step(ctx.driver(), &print.return_step).await;
}
