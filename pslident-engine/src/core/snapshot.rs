use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// 快照标识：提交时间戳（epoch 毫秒）+ 提交哈希
/// 外部存储中以 `<epochMillis>_<hash>` 作为文件名
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId {
    pub commit_timestamp: i64,
    pub commit_hash: String,
}

impl SnapshotId {
    pub fn new(commit_timestamp: i64, commit_hash: impl Into<String>) -> Self {
        Self {
            commit_timestamp,
            commit_hash: commit_hash.into(),
        }
    }

    /// 解析 `<epochMillis>_<hash>`，只允许一个 `_` 分隔符
    pub fn parse(identity: &str) -> CoreResult<Self> {
        let invalid = || CoreError::InvalidSnapshotIdentity(identity.to_string());

        let (timestamp, hash) = identity.split_once('_').ok_or_else(invalid)?;
        if hash.is_empty() || hash.contains('_') {
            return Err(invalid());
        }
        if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let commit_timestamp = timestamp.parse::<i64>().map_err(|_| invalid())?;

        Ok(Self::new(commit_timestamp, hash))
    }
}

impl FromStr for SnapshotId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.commit_timestamp, self.commit_hash)
    }
}

/// 原始规则集（一个历史版本）
/// rules 为规范化后按出现顺序去重的规则列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub id: SnapshotId,
    pub rules: Vec<String>,
    /// 去重前出现过不止一次的条目数（仅诊断用）
    pub duplicate_entries: usize,
}

impl RuleSet {
    pub fn new(id: SnapshotId, rules: Vec<String>, duplicate_entries: usize) -> Self {
        Self {
            id,
            rules,
            duplicate_entries,
        }
    }

    pub fn commit_timestamp(&self) -> i64 {
        self.id.commit_timestamp
    }

    pub fn commit_hash(&self) -> &str {
        &self.id.commit_hash
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identity() {
        let id = SnapshotId::parse("1546300800000_5f3a9c2").unwrap();
        assert_eq!(id.commit_timestamp, 1_546_300_800_000);
        assert_eq!(id.commit_hash, "5f3a9c2");
        assert_eq!(id.to_string(), "1546300800000_5f3a9c2");
    }

    #[test]
    fn test_parse_invalid_identity() {
        for raw in ["", "abc", "12x_hash", "_hash", "123_", "1_2_3", "-5_hash"] {
            assert_eq!(
                SnapshotId::parse(raw),
                Err(CoreError::InvalidSnapshotIdentity(raw.to_string())),
                "{raw} should be rejected"
            );
        }
    }
}
