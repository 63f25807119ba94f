//! 寻找尚未保存的股票 - 业务能力层
//!
//! 只看表格上已渲染的标记，不读写已保存记录

use crate::infrastructure::{ElementRef, PageDriver};
use crate::models::{HubLayout, ItemCode};
use crate::services::element_locator::locate;
use crate::services::hub_table::{is_marked, scan_rows};
use anyhow::Result;
use tracing::{info, warn};

/// 第一笔未标记的股票
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmarkedItem {
    pub item: Option<ItemCode>,
    pub row: ElementRef,
    /// "查询"入口
    pub enter: ElementRef,
}

/// 由上到下找出第一笔没有保存标记、且有查询入口的股票
pub async fn find_first_unmarked(
    driver: &dyn PageDriver,
    hub: &HubLayout,
) -> Result<Option<UnmarkedItem>> {
    for row in scan_rows(driver, hub).await? {
        if is_marked(driver, hub, &row).await? {
            info!("[寻找未保存] 股票 {} 已保存，跳过", row.code);
            continue;
        }

        if let Some(enter) = locate(driver, &hub.enter_link, Some(row.row)).await? {
            info!("[寻找未保存] 进入股票 {}", row.code);
            return Ok(Some(UnmarkedItem {
                item: row.item(),
                row: row.row,
                enter,
            }));
        }
    }

    warn!("[寻找未保存] 找不到尚未保存的股票");
    Ok(None)
}
