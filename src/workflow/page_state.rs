//! 页面状态判定
//!
//! 只看 `location.pathname`，判定顺序固定：最终确认页要先于投票子页面判断

use crate::models::site_profile::PathRules;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// 最终确认页
    FinalConfirm,
    /// 投票子页面
    Voting,
    /// 股票列表首页
    Hub,
    /// 列印结果页
    PrintReady,
    /// 不在预期范围内
    Unknown,
}

impl PageState {
    pub fn classify(path: &str, rules: &PathRules) -> Self {
        if path.contains(&rules.final_confirm) {
            PageState::FinalConfirm
        } else if path.contains(&rules.voting_prefix) {
            PageState::Voting
        } else if path == rules.hub {
            PageState::Hub
        } else if path == rules.print_ready {
            PageState::PrintReady
        } else {
            PageState::Unknown
        }
    }

    /// 投票子页面（含最终确认页）不需要抓取帐号
    pub fn needs_tenant(path: &str, rules: &PathRules) -> bool {
        !path.contains(&rules.voting_prefix)
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageState::FinalConfirm => "最终确认",
            PageState::Voting => "投票中",
            PageState::Hub => "投票列表首页",
            PageState::PrintReady => "列印结果",
            PageState::Unknown => "未知页面",
        };
        f.write_str(name)
    }
}
