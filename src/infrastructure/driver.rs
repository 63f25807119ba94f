//! 页面驱动接口
//!
//! 引擎对 DOM 的所有操作都经过 [`PageDriver`]，生产环境由
//! `CdpPageDriver` 通过 DevTools 协议实现，测试使用内存假页面

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// 页面元素引用
///
/// 只在产生它的那次页面载入中有效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(pub u32);

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<element#{}>", self.0)
    }
}

/// 页面内 fetch 的结果
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct FetchResponse {
    pub ok: bool,
    pub status: u16,
    #[serde(default)]
    pub body: String,
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 当前页面的 `location.pathname`
    async fn current_path(&self) -> Result<String>;

    /// CSS 查询，返回第一个匹配；`scope` 为空时在整个文档中查找
    async fn query_selector(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
    ) -> Result<Option<ElementRef>>;

    async fn query_selector_all(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
    ) -> Result<Vec<ElementRef>>;

    /// XPath 查询，以 `scope` 为上下文节点，返回第一个按文档顺序的匹配
    async fn evaluate_path(&self, path: &str, scope: Option<ElementRef>)
        -> Result<Option<ElementRef>>;

    async fn evaluate_path_all(&self, path: &str, scope: Option<ElementRef>)
        -> Result<Vec<ElementRef>>;

    /// 元素的 `innerText`（未去除空白）
    async fn inner_text(&self, element: ElementRef) -> Result<String>;

    async fn click(&self, element: ElementRef) -> Result<()>;

    /// 在 `parent` 末尾追加一个带 class 的文字标记
    async fn append_marker(&self, parent: ElementRef, text: &str, class_name: &str) -> Result<()>;

    /// 页面是否提供签章 token 接口（`voteObj.getSignature`）
    async fn has_token_api(&self) -> Result<bool>;

    /// 读取表单里当前的 token 值
    async fn read_token(&self) -> Result<Option<String>>;

    /// 带 cookie 的页面内请求
    async fn fetch_text(&self, path: &str) -> Result<FetchResponse>;

    /// 将元素区域截成 2 倍比例的 JPEG
    ///
    /// `child_limit` 为 `Some(n)` 时只截取前 n 个子元素合并后的范围
    async fn capture_jpeg(&self, element: ElementRef, child_limit: Option<usize>)
        -> Result<Vec<u8>>;

    /// 逐字模拟键入：keydown、写入 value、input、keyup
    async fn type_text(&self, element: ElementRef, text: &str, key_delay: Duration) -> Result<()>;

    /// 选择 value 相符且可见的选项，触发 change；没有这样的选项时返回 false
    async fn select_option(&self, element: ElementRef, value: &str) -> Result<bool>;

    async fn reload(&self) -> Result<()>;

    /// 清空页面内的元素登记表，之前取得的 [`ElementRef`] 全部失效
    async fn release_elements(&self) -> Result<()>;
}
