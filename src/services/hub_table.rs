//! 股票列表表格 - 业务能力层
//!
//! 逐行读取代号，并把已保存的股票标注在表格上

use crate::infrastructure::{ElementRef, PageDriver};
use crate::models::{HubLayout, ItemCode};
use crate::services::element_locator::{locate, locate_all};
use anyhow::Result;
use tracing::{debug, info};

/// 表格中的一行
#[derive(Debug, Clone)]
pub struct HubRow {
    pub row: ElementRef,
    pub code: String,
    pub code_cell: ElementRef,
    pub target_cell: ElementRef,
}

impl HubRow {
    pub fn item(&self) -> Option<ItemCode> {
        ItemCode::new(self.code.as_str())
    }
}

/// 由上到下读取表格；缺少代号或目标单元格的行会被跳过
pub async fn scan_rows(driver: &dyn PageDriver, hub: &HubLayout) -> Result<Vec<HubRow>> {
    let mut rows = Vec::new();
    for row in locate_all(driver, &hub.rows, None).await? {
        let code_cell = locate(driver, &hub.code_cell, Some(row)).await?;
        let target_cell = locate(driver, &hub.target_cell, Some(row)).await?;
        let (Some(code_cell), Some(target_cell)) = (code_cell, target_cell) else {
            debug!("跳过缺少单元格的行 {}", row);
            continue;
        };
        let code = driver.inner_text(code_cell).await?.trim().to_string();
        rows.push(HubRow {
            row,
            code,
            code_cell,
            target_cell,
        });
    }
    Ok(rows)
}

/// 该行是否已经有保存标记
pub async fn is_marked(driver: &dyn PageDriver, hub: &HubLayout, row: &HubRow) -> Result<bool> {
    Ok(locate(driver, &hub.marker_locator(), Some(row.target_cell))
        .await?
        .is_some())
}

/// 为已保存的股票加上标记，返回本次新加的数量
pub async fn render_completion_markers(
    driver: &dyn PageDriver,
    hub: &HubLayout,
    saved: &[ItemCode],
) -> Result<usize> {
    let codes: Vec<&str> = saved.iter().map(ItemCode::as_str).collect();
    info!(
        "[标记] 已保存股票：{} ( 共 {} 个 )",
        codes.join(", "),
        codes.len()
    );

    let mut added = 0;
    for row in scan_rows(driver, hub).await? {
        if !codes.contains(&row.code.as_str()) {
            continue;
        }
        if is_marked(driver, hub, &row).await? {
            continue;
        }
        driver
            .append_marker(row.target_cell, &hub.marker_text, &hub.marker_class)
            .await?;
        added += 1;
    }
    Ok(added)
}
