/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 目标URL，连接时优先使用以此开头的分页
    pub target_url: String,
    /// 已保存记录文件
    pub ledger_file: String,
    /// 截图导出目录
    pub export_dir: String,
    /// 站点配置文件，未设置时使用内置配置
    pub site_profile: Option<String>,
    /// 页面载入后等待多久再开始处理（毫秒）
    pub load_settle_ms: u64,
    /// 每次点击后的等待（毫秒）
    pub step_settle_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 批次下单的股票清单
    pub order_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            target_url: "https://stockservices.tdcc.com.tw/evote/".to_string(),
            ledger_file: "saved_stocks.json".to_string(),
            export_dir: "downloads".to_string(),
            site_profile: None,
            load_settle_ms: 500,
            step_settle_ms: 100,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            order_file: "order_list.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            target_url: std::env::var("TARGET_URL").unwrap_or(default.target_url),
            ledger_file: std::env::var("LEDGER_FILE").unwrap_or(default.ledger_file),
            export_dir: std::env::var("EXPORT_DIR").unwrap_or(default.export_dir),
            site_profile: std::env::var("SITE_PROFILE").ok().filter(|v| !v.trim().is_empty()),
            load_settle_ms: std::env::var("LOAD_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.load_settle_ms),
            step_settle_ms: std::env::var("STEP_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.step_settle_ms),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            order_file: std::env::var("ORDER_FILE").unwrap_or(default.order_file),
        }
    }
}

/// 运行模式，取自第一个命令行参数
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// 监听页面载入并自动处理
    #[default]
    Watch,
    /// 清除已保存记录后重新载入页面
    Reset,
    /// 零股批次下单
    Order,
}

impl Mode {
    pub fn from_arg(arg: Option<&str>) -> anyhow::Result<Self> {
        match arg.map(str::trim) {
            None | Some("") | Some("watch") => Ok(Mode::Watch),
            Some("reset") => Ok(Mode::Reset),
            Some("order") => Ok(Mode::Order),
            Some(other) => anyhow::bail!("未知的运行模式: {} (可用: watch, reset, order)", other),
        }
    }
}
