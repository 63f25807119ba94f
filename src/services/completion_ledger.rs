//! 已保存记录 - 业务能力层
//!
//! 每个帐号一份已保存（已截图）的股票代号清单，跨页面载入持久保存。
//! 同一 (帐号, 代号) 只会记录一次

use crate::error::AppResult;
use crate::infrastructure::JsonFileStore;
use crate::models::{ItemCode, TenantId};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// 存储中的固定键
pub const LEDGER_KEY: &str = "savedStocks2";

/// `add` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// 帐号或代号缺失，未记录
    Skipped,
    /// 已经记录过
    AlreadyPresent,
    /// 新记录并已落盘
    Added,
}

pub struct CompletionLedger {
    store: JsonFileStore,
    entries: BTreeMap<TenantId, Vec<ItemCode>>,
}

impl CompletionLedger {
    /// 从存储载入
    ///
    /// 值不是数组的帐号（旧版单帐号格式）会被删除；数组内非字符串、空白或重复的项目
    /// 逐项剔除。有任何清理都立即写回存储
    pub fn load(store: JsonFileStore) -> AppResult<Self> {
        let raw = store.get(LEDGER_KEY)?;
        let parsed = parse_entries(raw);

        let ledger = Self {
            store,
            entries: parsed.entries,
        };
        if parsed.dropped > 0 || parsed.cleaned > 0 {
            warn!(
                "[ledger] 移除 {} 笔旧格式记录，剔除 {} 个无效代号",
                parsed.dropped, parsed.cleaned
            );
            ledger.persist()?;
        }

        ledger.log_summary();
        Ok(ledger)
    }

    /// 记录一笔已保存的股票
    ///
    /// 写入存储失败时内存中的记录保持不变
    pub fn add(
        &mut self,
        tenant: Option<&TenantId>,
        item: Option<&ItemCode>,
    ) -> AppResult<AddOutcome> {
        let (Some(tenant), Some(item)) = (tenant, item) else {
            warn!(
                "[ledger] 无法保存：帐号={:?}, 代号={:?}",
                tenant.map(TenantId::as_str),
                item.map(ItemCode::as_str)
            );
            return Ok(AddOutcome::Skipped);
        };

        if self.is_complete(tenant, item) {
            info!("[ledger] {} 已存在于帐号 {}", item, tenant);
            return Ok(AddOutcome::AlreadyPresent);
        }

        let known_tenant = self.entries.contains_key(tenant);
        self.entries
            .entry(tenant.clone())
            .or_default()
            .push(item.clone());

        if let Err(e) = self.persist() {
            if known_tenant {
                if let Some(items) = self.entries.get_mut(tenant) {
                    items.pop();
                }
            } else {
                self.entries.remove(tenant);
            }
            return Err(e);
        }

        info!("[ledger] 已储存 {} 至帐号 {}", item, tenant);
        Ok(AddOutcome::Added)
    }

    /// 清除所有帐号的记录
    pub fn reset(&mut self) -> AppResult<()> {
        self.entries.clear();
        self.persist()?;
        info!("[ledger] 已清除所有已保存记录");
        Ok(())
    }

    pub fn is_complete(&self, tenant: &TenantId, item: &ItemCode) -> bool {
        self.entries
            .get(tenant)
            .map(|items| items.contains(item))
            .unwrap_or(false)
    }

    /// 某帐号的全部已保存代号
    pub fn items(&self, tenant: &TenantId) -> &[ItemCode] {
        self.entries.get(tenant).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tenants(&self) -> impl Iterator<Item = &TenantId> {
        self.entries.keys()
    }

    fn persist(&self) -> AppResult<()> {
        let map: Map<String, JsonValue> = self
            .entries
            .iter()
            .map(|(tenant, items)| {
                let list = items
                    .iter()
                    .map(|item| JsonValue::String(item.as_str().to_string()))
                    .collect();
                (tenant.as_str().to_string(), JsonValue::Array(list))
            })
            .collect();
        self.store.set(LEDGER_KEY, JsonValue::Object(map))
    }

    fn log_summary(&self) {
        info!("[所有帐号的已保存股票]");
        for (tenant, items) in &self.entries {
            let codes: Vec<&str> = items.iter().map(ItemCode::as_str).collect();
            info!("帐号 {}：{}", tenant, codes.join(", "));
        }
    }
}

/// 载入时的解析结果
#[derive(Default)]
struct ParsedEntries {
    entries: BTreeMap<TenantId, Vec<ItemCode>>,
    /// 整笔删除的帐号数
    dropped: usize,
    /// 从数组中剔除的项目数
    cleaned: usize,
}

/// 解析存储内容
fn parse_entries(raw: Option<JsonValue>) -> ParsedEntries {
    let mut parsed = ParsedEntries::default();
    let object = match raw {
        None => return parsed,
        Some(JsonValue::Object(object)) => object,
        // 整个值都不是对象，视为一笔坏记录
        Some(_) => {
            parsed.dropped = 1;
            return parsed;
        }
    };

    for (key, value) in object {
        let (Some(tenant), Some(array)) = (TenantId::new(key.as_str()), value.as_array()) else {
            warn!("[ledger] 帐号 {} 的记录格式不正确，已移除: {}", key, value);
            parsed.dropped += 1;
            continue;
        };

        let (items, cleaned) = as_item_list(array);
        if cleaned > 0 {
            warn!("[ledger] 帐号 {} 剔除 {} 个无效或重复的代号", tenant, cleaned);
        }
        parsed.cleaned += cleaned;
        parsed.entries.insert(tenant, items);
    }
    parsed
}

/// 只保留非空白字符串，重复项只保留一次；返回 (代号, 剔除数)
fn as_item_list(array: &[JsonValue]) -> (Vec<ItemCode>, usize) {
    let mut items: Vec<ItemCode> = Vec::with_capacity(array.len());
    let mut cleaned = 0;
    for element in array {
        match element.as_str().and_then(|s| ItemCode::new(s)) {
            Some(item) if !items.contains(&item) => items.push(item),
            _ => cleaned += 1,
        }
    }
    (items, cleaned)
}
