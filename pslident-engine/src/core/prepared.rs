use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// 预处理版本中不可变的规则数据
/// 构建后只读，通过 Arc 在语料库与各会话副本间共享
#[derive(Debug, PartialEq)]
pub(crate) struct VersionRules {
    pub commit_timestamp: i64,
    pub commit_hash: String,
    /// 所有版本共有的条目（整个语料库共用一份）
    pub common_entries: Arc<FxHashSet<String>>,
    /// 去掉共有条目后的完整规则列表（保持原始顺序）
    pub entries_without_common: Vec<String>,
    /// entries_without_common 的查找索引
    pub entry_index: FxHashSet<String>,
    pub equal_versions: Vec<String>,
    pub equal_versions_without_tld: Vec<String>,
    pub tld_entries: FxHashSet<String>,
    pub exception_to_wildcard: FxHashMap<String, String>,
    pub wildcards: Vec<String>,
}

/// 预处理后的 PSL 版本
/// 仅 added_entries / removed_entries 会在识别会话中按候选集重算，
/// 其余字段构建后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedVersion {
    rules: Arc<VersionRules>,
    added_entries: Vec<String>,
    removed_entries: Vec<String>,
}

impl PreparedVersion {
    pub(crate) fn new(
        rules: VersionRules,
        added_entries: Vec<String>,
        removed_entries: Vec<String>,
    ) -> Self {
        Self {
            rules: Arc::new(rules),
            added_entries,
            removed_entries,
        }
    }

    pub fn commit_timestamp(&self) -> i64 {
        self.rules.commit_timestamp
    }

    pub fn commit_hash(&self) -> &str {
        &self.rules.commit_hash
    }

    pub fn added_entries(&self) -> &[String] {
        &self.added_entries
    }

    pub fn removed_entries(&self) -> &[String] {
        &self.removed_entries
    }

    pub fn entries_common_to_all(&self) -> &FxHashSet<String> {
        &self.rules.common_entries
    }

    pub fn entries_without_common(&self) -> &[String] {
        &self.rules.entries_without_common
    }

    pub fn equal_versions(&self) -> &[String] {
        &self.rules.equal_versions
    }

    pub fn equal_versions_without_tld(&self) -> &[String] {
        &self.rules.equal_versions_without_tld
    }

    pub fn tld_entries(&self) -> &FxHashSet<String> {
        &self.rules.tld_entries
    }

    pub fn is_tld_entry(&self, entry: &str) -> bool {
        self.rules.tld_entries.contains(entry)
    }

    pub fn exception_to_wildcard(&self) -> &FxHashMap<String, String> {
        &self.rules.exception_to_wildcard
    }

    /// 例外条目对应的通配符
    pub fn wildcard_for_exception(&self, exception: &str) -> Option<&str> {
        self.rules
            .exception_to_wildcard
            .get(exception)
            .map(String::as_str)
    }

    pub fn wildcards(&self) -> &[String] {
        &self.rules.wildcards
    }

    /// 完整规则集（共有条目 + 其余条目）是否包含该条目
    pub fn contains_entry(&self, entry: &str) -> bool {
        self.rules.entry_index.contains(entry) || self.rules.common_entries.contains(entry)
    }

    /// 完整规则条目数
    pub fn total_entries(&self) -> usize {
        self.rules.entries_without_common.len() + self.rules.common_entries.len()
    }

    pub(crate) fn set_relative_changes(&mut self, added: Vec<String>, removed: Vec<String>) {
        self.added_entries = added;
        self.removed_entries = removed;
    }

    #[cfg(test)]
    pub(crate) fn shares_common_with(&self, common: &Arc<FxHashSet<String>>) -> bool {
        Arc::ptr_eq(&self.rules.common_entries, common)
    }

    pub(crate) fn common_handle(&self) -> &Arc<FxHashSet<String>> {
        &self.rules.common_entries
    }
}

/// 持久化用：单个预处理版本的记录（字段名即存储格式）
/// 集合类字段使用有序容器，保证序列化输出稳定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub commit_timestamp: i64,
    pub commit_hash: String,
    pub entries_that_all_versions_have_in_common: BTreeSet<String>,
    pub added_entries: Vec<String>,
    pub removed_entries: Vec<String>,
    pub entries_without_the_ones_all_versions_have_in_common: Vec<String>,
    pub equal_psls: Vec<String>,
    pub tlds: BTreeSet<String>,
    pub equal_without_tlds: Vec<String>,
    pub exception_to_wildcard_mapping: BTreeMap<String, String>,
    pub wildcards: Vec<String>,
}

impl From<&PreparedVersion> for VersionRecord {
    fn from(version: &PreparedVersion) -> Self {
        let rules = &version.rules;
        Self {
            commit_timestamp: rules.commit_timestamp,
            commit_hash: rules.commit_hash.clone(),
            entries_that_all_versions_have_in_common: rules.common_entries.iter().cloned().collect(),
            added_entries: version.added_entries.clone(),
            removed_entries: version.removed_entries.clone(),
            entries_without_the_ones_all_versions_have_in_common: rules.entries_without_common.clone(),
            equal_psls: rules.equal_versions.clone(),
            tlds: rules.tld_entries.iter().cloned().collect(),
            equal_without_tlds: rules.equal_versions_without_tld.clone(),
            exception_to_wildcard_mapping: rules
                .exception_to_wildcard
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            wildcards: rules.wildcards.clone(),
        }
    }
}

impl PreparedVersion {
    /// 从持久化记录还原
    /// shared_common 与记录中的共有条目相同时复用同一份集合
    pub(crate) fn from_record(
        record: VersionRecord,
        shared_common: Option<&Arc<FxHashSet<String>>>,
    ) -> Self {
        let common_entries = match shared_common {
            Some(shared)
                if shared.len() == record.entries_that_all_versions_have_in_common.len()
                    && record
                        .entries_that_all_versions_have_in_common
                        .iter()
                        .all(|e| shared.contains(e)) =>
            {
                Arc::clone(shared)
            }
            _ => Arc::new(
                record
                    .entries_that_all_versions_have_in_common
                    .into_iter()
                    .collect(),
            ),
        };

        let entry_index = record
            .entries_without_the_ones_all_versions_have_in_common
            .iter()
            .cloned()
            .collect();

        let rules = VersionRules {
            commit_timestamp: record.commit_timestamp,
            commit_hash: record.commit_hash,
            common_entries,
            entries_without_common: record.entries_without_the_ones_all_versions_have_in_common,
            entry_index,
            equal_versions: record.equal_psls,
            equal_versions_without_tld: record.equal_without_tlds,
            tld_entries: record.tlds.into_iter().collect(),
            exception_to_wildcard: record.exception_to_wildcard_mapping.into_iter().collect(),
            wildcards: record.wildcards,
        };

        Self::new(rules, record.added_entries, record.removed_entries)
    }
}
