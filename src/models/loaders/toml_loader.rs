use crate::models::site_profile::SiteProfile;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 解析站点配置文本
///
/// `origin` 只用于错误信息
pub fn parse_site_profile(content: &str, origin: &str) -> Result<SiteProfile> {
    let profile: SiteProfile =
        toml::from_str(content).with_context(|| format!("无法解析站点配置: {}", origin))?;

    // 正则在这里先编译一次，避免运行到页面上才发现写错
    regex::Regex::new(&profile.tenant.pattern)
        .with_context(|| format!("帐号匹配规则无效: {}", profile.tenant.pattern))?;
    regex::Regex::new(&profile.print.item_pattern)
        .with_context(|| format!("股票代号匹配规则无效: {}", profile.print.item_pattern))?;

    Ok(profile)
}

/// 从 TOML 文件加载站点配置
pub async fn load_site_profile(path: &Path) -> Result<SiteProfile> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取站点配置: {}", path.display()))?;

    let profile = parse_site_profile(&content, &path.display().to_string())?;
    tracing::info!("已加载站点配置: {} ({})", profile.name, path.display());
    Ok(profile)
}

/// 有路径时从文件加载，否则使用内置配置
pub async fn load_site_profile_or_builtin(path: Option<&str>) -> Result<SiteProfile> {
    match path {
        Some(p) if !p.trim().is_empty() => load_site_profile(Path::new(p)).await,
        _ => {
            let profile = SiteProfile::builtin()?;
            tracing::info!("使用内置站点配置: {}", profile.name);
            Ok(profile)
        }
    }
}

/// 读取下单清单：每行一个股票代号，忽略空行
pub async fn load_order_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取下单清单: {}", path.display()))?;

    Ok(parse_order_list(&content))
}

pub fn parse_order_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
