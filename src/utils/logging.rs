use crate::config::{Config, Mode};
use anyhow::Result;
/// 日志工具模块
///
/// 初始化 tracing，并提供启动与结束时的日志输出
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化 tracing
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 决定 debug 或 info。
/// `log_file` 有值时同时追加写入该文件（不带颜色）
pub fn init(verbose: bool, log_file: Option<&str>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},chromiumoxide=warn", default_level)));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()?;
    Ok(())
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n电子投票日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, mode: Mode) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {:?} 模式", mode);
    info!("🌐 浏览器端口: {}", config.browser_debug_port);
    info!("💾 已保存记录: {}", config.ledger_file);
    info!("📁 截图目录: {}", config.export_dir);
    info!("{}", "=".repeat(60));
}

/// 记录程序结束信息
///
/// # 参数
/// - `pages`: 处理过的页面载入次数
/// - `log_file_path`: 日志文件路径
pub fn log_shutdown(pages: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!(
        "结束时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📊 共处理 {} 次页面载入", pages);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        init_log_file(path.to_str().unwrap()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("电子投票日志"));
    }
}
