//! 零股批次下单 - 流程层
//!
//! 定时检查一次页面，每次只处理清单中的一笔股票：
//! 输入代号 → 选择下拉建议 → 选择股别 → 按下价格 → 送出

use crate::infrastructure::{ElementRef, PageDriver};
use crate::models::OrderEntryLayout;
use crate::services::element_locator::locate;
use crate::workflow::guard::RunGuard;
use anyhow::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{error, info, warn};

/// 单次检查的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    /// 已送出
    Submitted(String),
    /// 清单已空
    Empty,
    /// 上一笔仍在处理
    Busy,
    /// 页面缺少必要元素，本次不处理
    MissingElements,
    /// 已输入代号但中途停止
    Aborted { code: String, reason: String },
}

/// 下单页上必须存在的元素
struct OrderForm {
    input: ElementRef,
    submit: ElementRef,
    share_kind: ElementRef,
    price_button: ElementRef,
}

pub struct OrderEntryFlow {
    layout: OrderEntryLayout,
    queue: Mutex<VecDeque<String>>,
    guard: RunGuard,
    submitted: AtomicUsize,
}

impl OrderEntryFlow {
    pub fn new(layout: OrderEntryLayout, codes: Vec<String>) -> Self {
        Self {
            layout,
            queue: Mutex::new(codes.into()),
            guard: RunGuard::new(),
            submitted: AtomicUsize::new(0),
        }
    }

    pub async fn remaining(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }

    /// 定时检查，直到清单处理完
    pub async fn run(self: Arc<Self>, driver: Arc<dyn PageDriver>) -> usize {
        let mut ticker = interval(Duration::from_millis(self.layout.tick_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("开始批次下单，共 {} 笔", self.remaining().await);
        loop {
            ticker.tick().await;

            if self.guard.is_busy() {
                continue;
            }
            if self.remaining().await == 0 {
                break;
            }

            let flow = self.clone();
            let driver = driver.clone();
            tokio::spawn(async move {
                match flow.process_next(driver.as_ref()).await {
                    Ok(OrderOutcome::Submitted(code)) => info!("[下单] {} 已送出", code),
                    Ok(OrderOutcome::Aborted { code, reason }) => {
                        warn!("[下单] {} 中止: {}", code, reason)
                    }
                    Ok(_) => {}
                    Err(e) => error!("[下单] 发生错误: {:#}", e),
                }
            });
        }

        let submitted = self.submitted();
        info!("批次下单结束，送出 {} 笔", submitted);
        submitted
    }

    /// 处理清单中的下一笔
    pub async fn process_next(&self, driver: &dyn PageDriver) -> Result<OrderOutcome> {
        let Some(_permit) = self.guard.try_acquire() else {
            return Ok(OrderOutcome::Busy);
        };

        if self.remaining().await == 0 {
            return Ok(OrderOutcome::Empty);
        }

        let Some(form) = self.resolve_form(driver).await? else {
            warn!("[下单] 页面缺少必要元素，等待下次检查");
            return Ok(OrderOutcome::MissingElements);
        };

        let Some(code) = self.queue.lock().await.pop_front() else {
            return Ok(OrderOutcome::Empty);
        };
        info!("[下单] 输入 {}", code);

        let layout = &self.layout;
        let settle = Duration::from_millis(layout.settle_ms);

        driver
            .type_text(form.input, &code, Duration::from_millis(layout.key_delay_ms))
            .await?;
        sleep(Duration::from_millis(layout.suggestion_wait_ms)).await;

        // 只接受以"代号 + 空格"开头的建议，避免点到相近代号
        let Some(suggestion) = locate(driver, &layout.suggestion_item, None).await? else {
            return Ok(aborted(code, "没有下拉建议"));
        };
        let text = driver.inner_text(suggestion).await?;
        if !text.starts_with(&format!("{} ", code)) {
            return Ok(aborted(code, format!("下拉建议不符: {}", text.trim())));
        }
        driver.click(suggestion).await?;
        sleep(settle).await;

        if !driver
            .select_option(form.share_kind, &layout.share_kind_value)
            .await?
        {
            return Ok(aborted(
                code,
                format!("股别选项 {} 不可用", layout.share_kind_value),
            ));
        }
        sleep(settle).await;

        driver.click(form.price_button).await?;
        sleep(settle).await;

        driver.click(form.submit).await?;
        sleep(settle).await;

        self.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(OrderOutcome::Submitted(code))
    }

    async fn resolve_form(&self, driver: &dyn PageDriver) -> Result<Option<OrderForm>> {
        // 同一页面会反复检查，先丢掉上一轮登记的元素
        driver.release_elements().await?;

        let layout = &self.layout;
        let input = locate(driver, &layout.input, None).await?;
        let submit = locate(driver, &layout.submit, None).await?;
        let menu = locate(driver, &layout.suggestion_menu, None).await?;
        let share_kind = locate(driver, &layout.share_kind, None).await?;
        let price_button = locate(driver, &layout.price_button, None).await?;

        Ok(match (input, submit, menu, share_kind, price_button) {
            (Some(input), Some(submit), Some(_), Some(share_kind), Some(price_button)) => {
                Some(OrderForm {
                    input,
                    submit,
                    share_kind,
                    price_button,
                })
            }
            _ => None,
        })
    }
}

fn aborted(code: String, reason: impl Into<String>) -> OrderOutcome {
    OrderOutcome::Aborted {
        code,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SiteProfile;
    use crate::testing::FakePage;

    struct Form {
        input: ElementRef,
        submit: ElementRef,
        suggestion: ElementRef,
        share_kind: ElementRef,
        price: ElementRef,
    }

    fn layout() -> OrderEntryLayout {
        SiteProfile::builtin().unwrap().order_entry
    }

    fn build_form(page: &FakePage, layout: &OrderEntryLayout, suggestion: &str) -> Form {
        let input = page.add(None, layout.input.raw(), "");
        let submit = page.add(None, layout.submit.raw(), "送出");
        page.add(None, layout.suggestion_menu.raw(), "");
        let suggestion = page.add(None, layout.suggestion_item.raw(), suggestion);
        let share_kind = page.add(None, layout.share_kind.raw(), "");
        page.add_options(share_kind, &[("A", true), ("C", true)]);
        let price = page.add(None, layout.price_button.raw(), "漲停");
        Form {
            input,
            submit,
            suggestion,
            share_kind,
            price,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_submits_in_order() {
        let page = FakePage::new("/order");
        let layout = layout();
        let form = build_form(&page, &layout, "2330 台積電");
        let flow = OrderEntryFlow::new(layout, vec!["2330".to_string()]);

        let outcome = flow.process_next(&page).await.unwrap();

        assert_eq!(outcome, OrderOutcome::Submitted("2330".to_string()));
        assert_eq!(page.typed(), vec![(form.input, "2330".to_string())]);
        assert_eq!(page.selected(form.share_kind).as_deref(), Some("C"));
        assert_eq!(page.clicks(), vec![form.suggestion, form.price, form.submit]);
        assert_eq!(flow.process_next(&page).await.unwrap(), OrderOutcome::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_similar_suggestion_is_not_clicked() {
        let page = FakePage::new("/order");
        let layout = layout();
        build_form(&page, &layout, "23301 某某");
        let flow = OrderEntryFlow::new(layout, vec!["2330".to_string()]);

        let outcome = flow.process_next(&page).await.unwrap();

        assert!(matches!(outcome, OrderOutcome::Aborted { ref code, .. } if code == "2330"));
        assert!(page.clicks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_share_kind_stops() {
        let page = FakePage::new("/order");
        let layout = layout();
        let form = build_form(&page, &layout, "0050 元大台灣50");
        page.add_options(form.share_kind, &[("C", false)]);
        let flow = OrderEntryFlow::new(layout, vec!["0050".to_string()]);

        let outcome = flow.process_next(&page).await.unwrap();

        assert!(matches!(outcome, OrderOutcome::Aborted { .. }));
        assert_eq!(page.clicks(), vec![form.suggestion]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_elements_keeps_queue() {
        let page = FakePage::new("/order");
        let flow = OrderEntryFlow::new(layout(), vec!["2330".to_string()]);

        let outcome = flow.process_next(&page).await.unwrap();

        assert_eq!(outcome, OrderOutcome::MissingElements);
        assert_eq!(flow.remaining().await, 1);
        assert!(page.typed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_while_previous_item_runs() {
        let page = Arc::new(FakePage::new("/order"));
        let layout = layout();
        build_form(&page, &layout, "2330 台積電");
        let flow = Arc::new(OrderEntryFlow::new(
            layout,
            vec!["2330".to_string(), "2330".to_string()],
        ));

        let first = {
            let flow = flow.clone();
            let page = page.clone();
            tokio::spawn(async move { flow.process_next(page.as_ref()).await })
        };
        // 让第一笔进入输入阶段
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(
            flow.process_next(page.as_ref()).await.unwrap(),
            OrderOutcome::Busy
        );
        assert!(matches!(
            first.await.unwrap().unwrap(),
            OrderOutcome::Submitted(_)
        ));
        assert_eq!(flow.remaining().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_drains_the_list() {
        let page = Arc::new(FakePage::new("/order"));
        let layout = layout();
        build_form(&page, &layout, "2330 台積電");
        let flow = Arc::new(OrderEntryFlow::new(
            layout,
            vec!["2330".to_string(), "2330".to_string()],
        ));

        let submitted =
            tokio::time::timeout(Duration::from_secs(60), flow.clone().run(page.clone()))
                .await
                .unwrap();

        assert_eq!(submitted, 2);
        assert_eq!(page.typed().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_check_releases_previous_elements() {
        let page = FakePage::new("/order");
        let flow = OrderEntryFlow::new(layout(), vec!["2330".to_string()]);

        for _ in 0..3 {
            assert_eq!(
                flow.process_next(&page).await.unwrap(),
                OrderOutcome::MissingElements
            );
        }

        assert_eq!(page.releases(), 3);
    }
}
