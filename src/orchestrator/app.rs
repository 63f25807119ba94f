//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：连接浏览器、建立页面驱动、载入站点配置
//! 2. **页面监听**：每次页面载入完成后执行一次页面流程
//! 3. **导航中止**：新的载入事件到来时，中止上一次尚未结束的流程
//! 4. **其他模式**：清除已保存记录、批次下单
//!
//! 不做任何页面上的业务判断，全部委托给 `workflow`

use crate::browser;
use crate::config::{Config, Mode};
use crate::infrastructure::{CdpPageDriver, JsExecutor, PageDriver};
use crate::models::{load_order_list, load_site_profile_or_builtin};
use crate::services::ScreenshotExporter;
use crate::utils::logging::log_shutdown;
use crate::workflow::{run_page, OrderEntryFlow, PageDeps};
use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::page::EventLoadEventFired;
use chromiumoxide::{Browser, Page};
use futures::{stream, Stream, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    page: Page,
    deps: PageDeps,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let profile = load_site_profile_or_builtin(config.site_profile.as_deref()).await?;
        info!("✓ 站点配置: {}", profile.name);

        // 连接浏览器
        let (browser, page) =
            browser::connect_to_browser_and_page(config.browser_debug_port, &config.target_url)
                .await?;

        let driver: Arc<dyn PageDriver> =
            Arc::new(CdpPageDriver::new(JsExecutor::new(page.clone())));
        let exporter = Arc::new(ScreenshotExporter::new(driver.clone(), &config.export_dir));

        let deps = PageDeps::new(
            driver,
            Arc::new(profile),
            &config.ledger_file,
            exporter,
            Duration::from_millis(config.step_settle_ms),
        )?;

        Ok(Self {
            config,
            _browser: browser,
            page,
            deps,
        })
    }

    /// 按模式运行
    pub async fn run(&self, mode: Mode) -> Result<()> {
        match mode {
            Mode::Watch => self.run_watch().await,
            Mode::Reset => {
                let mut stdin = BufReader::new(tokio::io::stdin());
                let mut stdout = tokio::io::stdout();
                if confirm_reset(&mut stdin, &mut stdout).await? {
                    reset_ledger(&self.deps).await?;
                } else {
                    info!("已取消");
                }
                Ok(())
            }
            Mode::Order => {
                let codes = load_order_list(Path::new(&self.config.order_file)).await?;
                if codes.is_empty() {
                    warn!("⚠️ 下单清单为空，程序结束");
                    return Ok(());
                }
                let flow = Arc::new(OrderEntryFlow::new(
                    self.deps.profile.order_entry.clone(),
                    codes,
                ));
                flow.run(self.deps.driver.clone()).await;
                Ok(())
            }
        }
    }

    /// 监听页面载入，直到浏览器断开或收到 Ctrl+C
    async fn run_watch(&self) -> Result<()> {
        let loads = self.page.event_listener::<EventLoadEventFired>().await?;
        // 启动时先处理当前页面
        let loads = stream::once(async {}).chain(loads.map(|_| ()));
        let settle = Duration::from_millis(self.config.load_settle_ms);

        info!("👀 开始监听页面载入");
        tokio::select! {
            pages = watch_loads(self.deps.clone(), loads, settle) => {
                info!("浏览器事件流已结束");
                log_shutdown(pages, &self.config.output_log_file);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("收到中断信号，程序结束");
            }
        }
        Ok(())
    }
}

/// 每次载入事件启动一次页面流程；上一次若尚未结束则先中止
///
/// 返回启动过的流程次数
pub async fn watch_loads<S>(deps: PageDeps, loads: S, settle: Duration) -> usize
where
    S: Stream<Item = ()>,
{
    futures::pin_mut!(loads);
    let mut current: Option<JoinHandle<()>> = None;
    let mut started = 0;

    while loads.next().await.is_some() {
        if let Some(previous) = current.take() {
            if !previous.is_finished() {
                warn!("页面已重新载入，中止上一次流程");
                previous.abort();
            }
        }

        started += 1;
        let deps = deps.clone();
        current = Some(tokio::spawn(async move {
            sleep(settle).await;
            if let Err(e) = run_page(&deps).await {
                error!("❌ 页面流程发生错误: {:#}", e);
            }
        }));
    }

    if let Some(last) = current {
        let _ = last.await;
    }
    started
}

/// 询问是否清除已保存记录，只有输入 y 才确认
pub async fn confirm_reset<R, W>(input: &mut R, output: &mut W) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output
        .write_all("确定要清除所有已保存记录吗？(y/N) ".as_bytes())
        .await?;
    output.flush().await?;

    let mut answer = String::new();
    input.read_line(&mut answer).await?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// 清除已保存记录并重新载入页面
pub async fn reset_ledger(deps: &PageDeps) -> Result<()> {
    deps.open_ledger()?.reset()?;
    deps.driver.reload().await?;
    info!("✅ 已清除已保存记录并重新载入页面");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::JsonFileStore;
    use crate::models::{Locator, SiteProfile};
    use crate::services::{Exporter, LEDGER_KEY};
    use crate::testing::FakePage;
    use async_trait::async_trait;
    use serde_json::json;

    struct NoopExporter;

    #[async_trait]
    impl Exporter for NoopExporter {
        async fn export(
            &self,
            _root: &Locator,
            _child_limit: Option<usize>,
            _filename_hint: &str,
        ) -> Option<JoinHandle<()>> {
            None
        }
    }

    fn deps(page: Arc<FakePage>, dir: &tempfile::TempDir) -> PageDeps {
        PageDeps::new(
            page,
            Arc::new(SiteProfile::builtin().unwrap()),
            dir.path().join("ledger.json"),
            Arc::new(NoopExporter),
            Duration::from_millis(100),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_confirm_reset_accepts_only_y() {
        let mut out = Vec::new();
        assert!(confirm_reset(&mut &b"y\n"[..], &mut out).await.unwrap());
        assert!(confirm_reset(&mut &b" Y \n"[..], &mut out).await.unwrap());
        assert!(!confirm_reset(&mut &b"\n"[..], &mut out).await.unwrap());
        assert!(!confirm_reset(&mut &b"yes\n"[..], &mut out).await.unwrap());
        assert!(!confirm_reset(&mut &b""[..], &mut out).await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_clears_ledger_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let page = Arc::new(FakePage::new("/evote/shareholder/000/tc_estock_welshas.html"));
        let deps = deps(page.clone(), &dir);
        let store = JsonFileStore::new(dir.path().join("ledger.json"));
        store
            .set(LEDGER_KEY, json!({"A123456789": ["2330", "0050"]}))
            .unwrap();

        reset_ledger(&deps).await.unwrap();

        assert_eq!(store.get(LEDGER_KEY).unwrap(), Some(json!({})));
        assert_eq!(page.reloads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_load_aborts_unfinished_run() {
        let dir = tempfile::tempdir().unwrap();
        let page = Arc::new(FakePage::new("/evote/shareholder/001/6_01.html"));
        let go = page.add(None, "#go", "確認");

        // 两次载入紧接着到来，第一次仍在等待中就被中止
        let loads = stream::iter(vec![(), ()]);
        let started =
            watch_loads(deps(page.clone(), &dir), loads, Duration::from_millis(500)).await;

        assert_eq!(started, 2);
        assert_eq!(page.clicks(), vec![go]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_runs_are_not_disturbed() {
        let dir = tempfile::tempdir().unwrap();
        let page = Arc::new(FakePage::new("/evote/shareholder/001/6_01.html"));
        let go = page.add(None, "#go", "確認");

        let loads = stream::iter(vec![(), ()]).then(|_| async {
            sleep(Duration::from_secs(5)).await;
        });
        let started =
            watch_loads(deps(page.clone(), &dir), loads, Duration::from_millis(500)).await;

        assert_eq!(started, 2);
        assert_eq!(page.clicks(), vec![go, go]);
    }
}
