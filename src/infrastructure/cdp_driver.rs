//! DevTools 协议页面驱动
//!
//! 所有 DOM 操作都翻译成页面脚本，经 [`JsExecutor`] 执行。
//! 查询到的元素存入页面内的 `window.__tdccRefs`，返回其下标作为 [`ElementRef`]，
//! 页面重新载入后旧下标自然失效

use crate::infrastructure::driver::{ElementRef, FetchResponse, PageDriver};
use crate::error::AppError;
use crate::infrastructure::JsExecutor;
use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport};
use chromiumoxide::page::ScreenshotParams;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// 每段脚本共用的元素登记表
const PRELUDE: &str = r#"
    const refs = (window.__tdccRefs = window.__tdccRefs || []);
    const keep = (el) => { refs.push(el); return refs.length - 1; };
    const scopeOf = (id) => {
        if (id === null) return document;
        const el = refs[id];
        if (!el) throw new Error('stale element ref #' + id);
        return el;
    };
"#;

fn script(body: &str) -> String {
    format!("(() => {{ {PRELUDE} {body} }})()")
}

fn async_script(body: &str) -> String {
    format!("(async () => {{ {PRELUDE} {body} }})()")
}

fn js_str(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn js_scope(scope: Option<ElementRef>) -> String {
    match scope {
        Some(r) => r.0.to_string(),
        None => "null".to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// 基于 chromiumoxide 的页面驱动
pub struct CdpPageDriver {
    executor: JsExecutor,
}

impl CdpPageDriver {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    async fn element_ref(&self, body: String) -> Result<Option<ElementRef>> {
        let index: Option<u32> = self.executor.eval_wrapped(script(&body)).await?;
        Ok(index.map(ElementRef))
    }

    async fn element_refs(&self, body: String) -> Result<Vec<ElementRef>> {
        let indices: Vec<u32> = self.executor.eval_wrapped(script(&body)).await?;
        Ok(indices.into_iter().map(ElementRef).collect())
    }
}

#[async_trait]
impl PageDriver for CdpPageDriver {
    async fn current_path(&self) -> Result<String> {
        self.executor
            .eval_wrapped(script("return { v: window.location.pathname };"))
            .await
    }

    async fn query_selector(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
    ) -> Result<Option<ElementRef>> {
        let body = format!(
            "const el = scopeOf({}).querySelector({}); return {{ v: el ? keep(el) : null }};",
            js_scope(scope),
            js_str(selector)?
        );
        self.element_ref(body).await
    }

    async fn query_selector_all(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
    ) -> Result<Vec<ElementRef>> {
        let body = format!(
            "return {{ v: Array.from(scopeOf({}).querySelectorAll({})).map(keep) }};",
            js_scope(scope),
            js_str(selector)?
        );
        self.element_refs(body).await
    }

    async fn evaluate_path(
        &self,
        path: &str,
        scope: Option<ElementRef>,
    ) -> Result<Option<ElementRef>> {
        let body = format!(
            r#"const el = document.evaluate({}, scopeOf({}), null,
                   XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
               return {{ v: el ? keep(el) : null }};"#,
            js_str(path)?,
            js_scope(scope)
        );
        self.element_ref(body).await
    }

    async fn evaluate_path_all(
        &self,
        path: &str,
        scope: Option<ElementRef>,
    ) -> Result<Vec<ElementRef>> {
        let body = format!(
            r#"const snap = document.evaluate({}, scopeOf({}), null,
                   XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
               const out = [];
               for (let i = 0; i < snap.snapshotLength; i++) out.push(keep(snap.snapshotItem(i)));
               return {{ v: out }};"#,
            js_str(path)?,
            js_scope(scope)
        );
        self.element_refs(body).await
    }

    async fn inner_text(&self, element: ElementRef) -> Result<String> {
        let body = format!(
            "const el = scopeOf({}); return {{ v: el.innerText ?? el.textContent ?? '' }};",
            element.0
        );
        self.executor.eval_wrapped(script(&body)).await
    }

    async fn click(&self, element: ElementRef) -> Result<()> {
        let body = format!("scopeOf({}).click(); return {{ v: true }};", element.0);
        let _: bool = self.executor.eval_wrapped(script(&body)).await?;
        Ok(())
    }

    async fn append_marker(&self, parent: ElementRef, text: &str, class_name: &str) -> Result<()> {
        let body = format!(
            r#"const tag = document.createElement('span');
               tag.textContent = {};
               tag.className = {};
               tag.style.color = 'green';
               tag.style.marginLeft = '5px';
               tag.style.fontSize = '7px';
               scopeOf({}).appendChild(tag);
               return {{ v: true }};"#,
            js_str(text)?,
            js_str(class_name)?,
            parent.0
        );
        let _: bool = self.executor.eval_wrapped(script(&body)).await?;
        Ok(())
    }

    async fn has_token_api(&self) -> Result<bool> {
        self.executor
            .eval_wrapped(script(
                r#"const obj = (typeof voteObj !== 'undefined') ? voteObj : null;
                   return { v: !!obj
                       && Object.prototype.hasOwnProperty.call(obj, 'getSignature')
                       && typeof obj.getSignature === 'function' };"#,
            ))
            .await
    }

    async fn read_token(&self) -> Result<Option<String>> {
        self.executor
            .eval_wrapped(script(
                "return { v: document?.voteform?.token?.value ?? null };",
            ))
            .await
    }

    async fn fetch_text(&self, path: &str) -> Result<FetchResponse> {
        let body = format!(
            r#"try {{
                   const res = await fetch({}, {{ credentials: 'include' }});
                   const text = res.ok ? await res.text() : '';
                   return {{ v: {{ ok: res.ok, status: res.status, body: text }} }};
               }} catch (error) {{
                   return {{ v: {{ ok: false, status: 0, body: String(error) }} }};
               }}"#,
            js_str(path)?
        );
        self.executor.eval_wrapped(async_script(&body)).await
    }

    async fn capture_jpeg(
        &self,
        element: ElementRef,
        child_limit: Option<usize>,
    ) -> Result<Vec<u8>> {
        let limit = child_limit.map_or_else(|| "null".to_string(), |n| n.to_string());
        let body = format!(
            r#"const root = scopeOf({});
               const limit = {};
               let parts = limit === null ? [root] : Array.from(root.children).slice(0, limit);
               if (parts.length === 0) parts = [root];
               const boxes = parts.map((el) => el.getBoundingClientRect());
               const left = Math.min(...boxes.map((b) => b.left));
               const top = Math.min(...boxes.map((b) => b.top));
               const right = Math.max(...boxes.map((b) => b.right));
               const bottom = Math.max(...boxes.map((b) => b.bottom));
               return {{ v: {{ x: left + window.scrollX, y: top + window.scrollY,
                              width: right - left, height: bottom - top }} }};"#,
            element.0, limit
        );
        let rect: Rect = self.executor.eval_wrapped(script(&body)).await?;
        debug!("截图区域: {:?}", rect);

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Jpeg)
            .quality(100)
            .clip(Viewport {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                scale: 2.0,
            })
            .capture_beyond_viewport(true)
            .build();

        let bytes = self
            .executor
            .page()
            .screenshot(params)
            .await
            .map_err(|e| AppError::capture_failed(element.to_string(), e))?;
        Ok(bytes)
    }

    async fn type_text(&self, element: ElementRef, text: &str, key_delay: Duration) -> Result<()> {
        let focus = format!(
            "const el = scopeOf({}); el.focus(); el.value = ''; return {{ v: true }};",
            element.0
        );
        let _: bool = self.executor.eval_wrapped(script(&focus)).await?;

        for ch in text.chars() {
            let key = js_str(&ch.to_string())?;
            let body = format!(
                r#"const el = scopeOf({id});
                   el.dispatchEvent(new KeyboardEvent('keydown', {{ key: {key}, bubbles: true }}));
                   el.value += {key};
                   el.dispatchEvent(new InputEvent('input', {{ bubbles: true }}));
                   el.dispatchEvent(new KeyboardEvent('keyup', {{ key: {key}, bubbles: true }}));
                   return {{ v: true }};"#,
                id = element.0,
                key = key
            );
            let _: bool = self.executor.eval_wrapped(script(&body)).await?;
            sleep(key_delay).await;
        }
        Ok(())
    }

    async fn select_option(&self, element: ElementRef, value: &str) -> Result<bool> {
        let body = format!(
            r#"const sel = scopeOf({});
               const want = {};
               const option = Array.from(sel.options || [])
                   .find(opt => opt.value === want && opt.style.display !== 'none');
               if (!option) return {{ v: false }};
               sel.value = want;
               sel.dispatchEvent(new Event('change', {{ bubbles: true }}));
               return {{ v: true }};"#,
            element.0,
            js_str(value)?
        );
        self.executor.eval_wrapped(script(&body)).await
    }

    async fn reload(&self) -> Result<()> {
        self.executor.page().reload().await?;
        Ok(())
    }

    async fn release_elements(&self) -> Result<()> {
        let _: bool = self
            .executor
            .eval_wrapped(script("refs.length = 0; return { v: true };"))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_escapes_selector() {
        let sel = js_str(r#"//*[@id="stockInfo"]"#).unwrap();
        assert_eq!(sel, r#""//*[@id=\"stockInfo\"]""#);
        assert_eq!(js_scope(None), "null");
        assert_eq!(js_scope(Some(ElementRef(7))), "7");
    }

    #[test]
    fn test_script_wraps_prelude() {
        let code = script("return { v: 1 };");
        assert!(code.starts_with("(() => {"));
        assert!(code.contains("window.__tdccRefs"));
        assert!(async_script("return { v: 1 };").starts_with("(async () => {"));
    }
}
