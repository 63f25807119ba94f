use anyhow::Result;
use tdcc_vote_helper::utils::logging;
use tdcc_vote_helper::{App, Config, Mode};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();
    let mode = Mode::from_arg(std::env::args().nth(1).as_deref())?;

    // 初始化日志
    logging::init_log_file(&config.output_log_file)?;
    logging::init(config.verbose_logging, Some(&config.output_log_file))?;
    logging::log_startup(&config, mode);

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    app.run(mode).await?;

    Ok(())
}
