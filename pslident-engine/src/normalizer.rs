//! 原始 PSL 快照规范化
//! 每行：截断到第一个空白字符 → 转小写 → 跳过空行与 `//` 注释行 → 去重（保留首次出现）

use rustc_hash::FxHashSet;

use crate::core::{RuleSet, SnapshotId};
use crate::error::CoreResult;

/// 规范化单行规则；空行或注释行返回 None
pub fn normalize_rule(line: &str) -> Option<String> {
    let end = line.find(char::is_whitespace).unwrap_or(line.len());
    let rule = line[..end].to_lowercase();
    if rule.is_empty() || rule.starts_with("//") {
        return None;
    }
    Some(rule)
}

/// 快照规范化器
#[derive(Debug, Default)]
pub struct RuleNormalizer;

impl RuleNormalizer {
    /// 解析快照标识并规范化快照文本
    /// 标识非法时返回 InvalidSnapshotIdentity，由调用方跳过该快照
    pub fn parse(&self, identity: &str, content: &str) -> CoreResult<RuleSet> {
        let id = SnapshotId::parse(identity)?;
        Ok(self.normalize(id, content))
    }

    /// 规范化快照文本；内容层面从不失败，重复条目只计数
    pub fn normalize(&self, id: SnapshotId, content: &str) -> RuleSet {
        let mut rules = Vec::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut duplicated: FxHashSet<String> = FxHashSet::default();

        for rule in content.lines().filter_map(normalize_rule) {
            if seen.contains(&rule) {
                // 同一条目多次重复只记一次
                duplicated.insert(rule);
            } else {
                seen.insert(rule.clone());
                rules.push(rule);
            }
        }

        if !duplicated.is_empty() {
            log::debug!(
                "Duplicate entries ignored | version: {} | distinct duplicates: {}",
                id.commit_hash,
                duplicated.len()
            );
        }

        RuleSet::new(id, rules, duplicated.len())
    }
}
