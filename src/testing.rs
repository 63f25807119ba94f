//! 测试用内存页面
//!
//! 元素按"父元素 + 选择器原文"登记，查询时原样匹配，
//! CSS 与 XPath 共用同一张表

use crate::infrastructure::{ElementRef, FetchResponse, PageDriver};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Default)]
struct FakeNode {
    text: String,
    children: HashMap<String, Vec<u32>>,
    options: Vec<(String, bool)>,
    selected: Option<String>,
}

struct FakeState {
    path: String,
    nodes: Vec<FakeNode>,
    token_api: bool,
    token: Option<(String, Instant)>,
    fetch: FetchResponse,
    clicks: Vec<ElementRef>,
    typed: Vec<(ElementRef, String)>,
    broken: HashSet<u32>,
    reloads: u32,
    capture_delay: Duration,
    captures: Vec<Capture>,
    releases: u32,
}

/// 一次截图：截取的元素、子元素上限、完成时已发生的点击数
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub element: ElementRef,
    pub child_limit: Option<usize>,
    pub clicks_before: usize,
}

pub struct FakePage {
    state: Mutex<FakeState>,
}

const DOCUMENT: u32 = 0;

impl FakePage {
    pub fn new(path: &str) -> Self {
        Self {
            state: Mutex::new(FakeState {
                path: path.to_string(),
                nodes: vec![FakeNode::default()],
                token_api: false,
                token: None,
                fetch: FetchResponse {
                    ok: false,
                    status: 404,
                    body: String::new(),
                },
                clicks: Vec::new(),
                typed: Vec::new(),
                broken: HashSet::new(),
                reloads: 0,
                capture_delay: Duration::ZERO,
                captures: Vec::new(),
                releases: 0,
            }),
        }
    }

    /// 在 `parent`（None 为整个文档）下登记一个可被 `selector` 查到的元素
    pub fn add(&self, parent: Option<ElementRef>, selector: &str, text: &str) -> ElementRef {
        let mut state = self.state.lock().unwrap();
        let id = state.nodes.len() as u32;
        state.nodes.push(FakeNode {
            text: text.to_string(),
            ..FakeNode::default()
        });
        let parent = parent.map(|r| r.0).unwrap_or(DOCUMENT);
        state.nodes[parent as usize]
            .children
            .entry(selector.to_string())
            .or_default()
            .push(id);
        ElementRef(id)
    }

    pub fn add_options(&self, select: ElementRef, options: &[(&str, bool)]) {
        let mut state = self.state.lock().unwrap();
        state.nodes[select.0 as usize].options = options
            .iter()
            .map(|(v, visible)| (v.to_string(), *visible))
            .collect();
    }

    /// 之后对该元素的任何操作都会报错
    pub fn break_element(&self, element: ElementRef) {
        self.state.lock().unwrap().broken.insert(element.0);
    }

    pub fn set_token_api(&self, present: bool) {
        self.state.lock().unwrap().token_api = present;
    }

    /// token 在 `after` 之后才出现
    pub fn set_token_after(&self, value: &str, after: Duration) {
        self.state.lock().unwrap().token = Some((value.to_string(), Instant::now() + after));
    }

    pub fn set_fetch(&self, response: FetchResponse) {
        self.state.lock().unwrap().fetch = response;
    }

    pub fn clicks(&self) -> Vec<ElementRef> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn typed(&self) -> Vec<(ElementRef, String)> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn selected(&self, element: ElementRef) -> Option<String> {
        self.state.lock().unwrap().nodes[element.0 as usize].selected.clone()
    }

    pub fn reloads(&self) -> u32 {
        self.state.lock().unwrap().reloads
    }

    /// 每次截图耗时
    pub fn set_capture_delay(&self, delay: Duration) {
        self.state.lock().unwrap().capture_delay = delay;
    }

    pub fn captures(&self) -> Vec<Capture> {
        self.state.lock().unwrap().captures.clone()
    }

    pub fn releases(&self) -> u32 {
        self.state.lock().unwrap().releases
    }

    /// `parent` 下某选择器登记的元素数
    pub fn count(&self, parent: ElementRef, selector: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.nodes[parent.0 as usize]
            .children
            .get(selector)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn lookup(&self, selector: &str, scope: Option<ElementRef>) -> Result<Vec<ElementRef>> {
        let state = self.state.lock().unwrap();
        let scope = scope.map(|r| r.0).unwrap_or(DOCUMENT);
        if state.broken.contains(&scope) {
            return Err(anyhow!("element #{} is broken", scope));
        }
        let node = state
            .nodes
            .get(scope as usize)
            .ok_or_else(|| anyhow!("stale element ref #{}", scope))?;
        Ok(node
            .children
            .get(selector)
            .map(|ids| ids.iter().copied().map(ElementRef).collect())
            .unwrap_or_default())
    }

    fn check(&self, element: ElementRef) -> Result<()> {
        let state = self.state.lock().unwrap();
        if state.broken.contains(&element.0) {
            return Err(anyhow!("element #{} is broken", element.0));
        }
        if element.0 as usize >= state.nodes.len() {
            return Err(anyhow!("stale element ref #{}", element.0));
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn current_path(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().path.clone())
    }

    async fn query_selector(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
    ) -> Result<Option<ElementRef>> {
        Ok(self.lookup(selector, scope)?.into_iter().next())
    }

    async fn query_selector_all(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
    ) -> Result<Vec<ElementRef>> {
        self.lookup(selector, scope)
    }

    async fn evaluate_path(
        &self,
        path: &str,
        scope: Option<ElementRef>,
    ) -> Result<Option<ElementRef>> {
        Ok(self.lookup(path, scope)?.into_iter().next())
    }

    async fn evaluate_path_all(
        &self,
        path: &str,
        scope: Option<ElementRef>,
    ) -> Result<Vec<ElementRef>> {
        self.lookup(path, scope)
    }

    async fn inner_text(&self, element: ElementRef) -> Result<String> {
        self.check(element)?;
        Ok(self.state.lock().unwrap().nodes[element.0 as usize].text.clone())
    }

    async fn click(&self, element: ElementRef) -> Result<()> {
        self.check(element)?;
        self.state.lock().unwrap().clicks.push(element);
        Ok(())
    }

    async fn append_marker(&self, parent: ElementRef, text: &str, class_name: &str) -> Result<()> {
        self.check(parent)?;
        self.add(Some(parent), &format!(".{}", class_name), text);
        self.state.lock().unwrap().nodes[parent.0 as usize]
            .text
            .push_str(text);
        Ok(())
    }

    async fn has_token_api(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().token_api)
    }

    async fn read_token(&self) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(match &state.token {
            Some((value, ready_at)) if Instant::now() >= *ready_at => Some(value.clone()),
            Some(_) => Some(String::new()),
            None => None,
        })
    }

    async fn fetch_text(&self, _path: &str) -> Result<FetchResponse> {
        Ok(self.state.lock().unwrap().fetch.clone())
    }

    async fn capture_jpeg(
        &self,
        element: ElementRef,
        child_limit: Option<usize>,
    ) -> Result<Vec<u8>> {
        self.check(element)?;
        let delay = self.state.lock().unwrap().capture_delay;
        tokio::time::sleep(delay).await;

        let mut state = self.state.lock().unwrap();
        let clicks_before = state.clicks.len();
        state.captures.push(Capture {
            element,
            child_limit,
            clicks_before,
        });
        Ok(b"\xFF\xD8fake-jpeg\xFF\xD9".to_vec())
    }

    async fn type_text(&self, element: ElementRef, text: &str, key_delay: Duration) -> Result<()> {
        self.check(element)?;
        for _ in text.chars() {
            tokio::time::sleep(key_delay).await;
        }
        self.state
            .lock()
            .unwrap()
            .typed
            .push((element, text.to_string()));
        Ok(())
    }

    async fn select_option(&self, element: ElementRef, value: &str) -> Result<bool> {
        self.check(element)?;
        let mut state = self.state.lock().unwrap();
        let node = &mut state.nodes[element.0 as usize];
        let visible = node.options.iter().any(|(v, shown)| v == value && *shown);
        if visible {
            node.selected = Some(value.to_string());
        }
        Ok(visible)
    }

    async fn reload(&self) -> Result<()> {
        self.state.lock().unwrap().reloads += 1;
        Ok(())
    }

    async fn release_elements(&self) -> Result<()> {
        self.state.lock().unwrap().releases += 1;
        Ok(())
    }
}
