//! 元素定位 - 业务能力层
//!
//! 两种定位器唯一的分派点。找不到元素是正常结果，返回 None

use crate::infrastructure::{ElementRef, PageDriver};
use crate::models::Locator;
use anyhow::Result;

/// 在 `scope`（None 为整个文档）内查找第一个匹配的元素
pub async fn locate(
    driver: &dyn PageDriver,
    locator: &Locator,
    scope: Option<ElementRef>,
) -> Result<Option<ElementRef>> {
    match locator {
        Locator::Structural(selector) => driver.query_selector(selector, scope).await,
        Locator::PathQuery(path) => driver.evaluate_path(path, scope).await,
    }
}

/// 在 `scope` 内查找全部匹配的元素，按文档顺序
pub async fn locate_all(
    driver: &dyn PageDriver,
    locator: &Locator,
    scope: Option<ElementRef>,
) -> Result<Vec<ElementRef>> {
    match locator {
        Locator::Structural(selector) => driver.query_selector_all(selector, scope).await,
        Locator::PathQuery(path) => driver.evaluate_path_all(path, scope).await,
    }
}

/// 读取元素文字并去除首尾空白；元素不存在时返回 None
pub async fn locate_text(
    driver: &dyn PageDriver,
    locator: &Locator,
    scope: Option<ElementRef>,
) -> Result<Option<String>> {
    match locate(driver, locator, scope).await? {
        Some(element) => Ok(Some(driver.inner_text(element).await?.trim().to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePage;

    #[tokio::test]
    async fn test_locate_dispatches_by_kind_and_scope() {
        let page = FakePage::new("/");
        let row = page.add(None, "#stockInfo tbody tr", "");
        let cell = page.add(Some(row), "div.u-width--40", " 2330 ");
        let link = page.add(None, "//*[@id=\"stockInfo\"]/tbody/tr[1]/td[4]/a[1]", "投票");

        let found = locate(&page, &Locator::parse("div.u-width--40"), Some(row))
            .await
            .unwrap();
        assert_eq!(found, Some(cell));

        // 不在 row 下查找时不应命中
        let missing = locate(&page, &Locator::parse("div.u-width--40"), None)
            .await
            .unwrap();
        assert_eq!(missing, None);

        let by_path = locate(
            &page,
            &Locator::parse("//*[@id=\"stockInfo\"]/tbody/tr[1]/td[4]/a[1]"),
            None,
        )
        .await
        .unwrap();
        assert_eq!(by_path, Some(link));

        let text = locate_text(&page, &Locator::parse("div.u-width--40"), Some(row))
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("2330"));
    }

    #[tokio::test]
    async fn test_locate_all_keeps_order() {
        let page = FakePage::new("/");
        let a = page.add(None, "tr", "a");
        let b = page.add(None, "tr", "b");
        let all = locate_all(&page, &Locator::parse("tr"), None).await.unwrap();
        assert_eq!(all, vec![a, b]);
    }
}
