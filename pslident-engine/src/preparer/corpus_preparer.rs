//! 负责整体预处理流程的串联
use std::sync::Arc;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};

use super::prepare_stats::PrepareStats;
use super::relative::{recompute_relative_changes, FirstVersion};
use crate::core::{
    is_exception_of, is_tld_entry, Corpus, PreparedVersion, RuleKind, RuleSet, SnapshotId,
    VersionRules,
};
use crate::error::{CoreError, CoreResult};
use crate::utils::log_format::preview_rules;

/// 完成例外关联后的中间版本
struct LinkedVersion {
    id: SnapshotId,
    rules: Vec<String>,
    index: FxHashSet<String>,
    exception_to_wildcard: FxHashMap<String, String>,
    wildcards: Vec<String>,
}

/// 语料库预处理器（纯函数，一次性处理全部快照）
#[derive(Debug, Default)]
pub struct CorpusPreparer;

impl CorpusPreparer {
    /// 预处理全部快照，产出按时间排序的语料库
    pub fn prepare(&self, raw_versions: Vec<RuleSet>) -> CoreResult<Corpus> {
        self.prepare_with_stats(raw_versions).map(|(corpus, _)| corpus)
    }

    /// 预处理并返回统计信息
    pub fn prepare_with_stats(
        &self,
        mut raw_versions: Vec<RuleSet>,
    ) -> CoreResult<(Corpus, PrepareStats)> {
        let start = Instant::now();
        if raw_versions.is_empty() {
            return Err(CoreError::EmptyCorpus);
        }

        // 1. 按提交时间升序排序，并校验版本内无重复条目
        raw_versions.sort_by_key(RuleSet::commit_timestamp);
        for rule_set in &raw_versions {
            ensure_unique(rule_set)?;
        }

        let mut stats = PrepareStats {
            versions: raw_versions.len(),
            ignored_duplicates: raw_versions.iter().map(|r| r.duplicate_entries).sum(),
            ..Default::default()
        };

        // 2. 建立例外→通配符映射，丢弃没有通配符的例外（必须先于其余派生字段）
        let linked: Vec<LinkedVersion> = raw_versions
            .into_iter()
            .map(|rule_set| link_exceptions(rule_set, &mut stats))
            .collect();

        // 3. 所有版本共有的条目
        let common = Arc::new(common_entries(&linked));
        stats.common_entries = common.len();

        // 4. 去掉共有条目 + 6. TLD 条目
        let without_common: Vec<Vec<String>> = linked
            .iter()
            .map(|v| {
                v.rules
                    .iter()
                    .filter(|e| !common.contains(*e))
                    .cloned()
                    .collect()
            })
            .collect();
        let tld_sets: Vec<FxHashSet<String>> = linked
            .iter()
            .map(|v| v.rules.iter().filter(|e| is_tld_entry(e)).cloned().collect())
            .collect();

        // 5. 完全相同的版本
        let full_sets: Vec<&FxHashSet<String>> = linked.iter().map(|v| &v.index).collect();
        let hashes: Vec<&str> = linked.iter().map(|v| v.id.commit_hash.as_str()).collect();
        let equal = equal_groups(&full_sets, &hashes);

        // 7. 忽略 TLD 条目后相同的版本
        let non_tld_sets: Vec<FxHashSet<String>> = without_common
            .iter()
            .zip(&tld_sets)
            .map(|(entries, tlds)| {
                entries
                    .iter()
                    .filter(|e| !tlds.contains(*e))
                    .cloned()
                    .collect()
            })
            .collect();
        let non_tld_refs: Vec<&FxHashSet<String>> = non_tld_sets.iter().collect();
        let equal_without_tld = equal_groups(&non_tld_refs, &hashes);

        stats.versions_with_equal = equal.iter().filter(|g| !g.is_empty()).count();
        stats.versions_with_equal_without_tld =
            equal_without_tld.iter().filter(|g| !g.is_empty()).count();

        let mut versions: Vec<PreparedVersion> = linked
            .into_iter()
            .zip(without_common)
            .zip(tld_sets)
            .zip(equal.into_iter().zip(equal_without_tld))
            .map(|(((linked, entries), tlds), (equal, equal_without_tld))| {
                let entry_index = entries.iter().cloned().collect();
                let rules = VersionRules {
                    commit_timestamp: linked.id.commit_timestamp,
                    commit_hash: linked.id.commit_hash,
                    common_entries: Arc::clone(&common),
                    entries_without_common: entries,
                    entry_index,
                    equal_versions: equal,
                    equal_versions_without_tld: equal_without_tld,
                    tld_entries: tlds,
                    exception_to_wildcard: linked.exception_to_wildcard,
                    wildcards: linked.wildcards,
                };
                PreparedVersion::new(rules, Vec::new(), Vec::new())
            })
            .collect();

        // 8. 按时间顺序计算相对差异
        recompute_relative_changes(&mut versions, FirstVersion::NonTldEntries);

        stats.print_stats(start.elapsed());
        Ok((Corpus::new(versions), stats))
    }
}

/// 版本内条目唯一性校验（规范化之后仍重复属于数据不变量被破坏）
fn ensure_unique(rule_set: &RuleSet) -> CoreResult<()> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for entry in &rule_set.rules {
        if !seen.insert(entry) {
            log::error!(
                "Duplicate entry after normalization | version: {} ({}) | entry: {}",
                rule_set.commit_hash(),
                rule_set.commit_timestamp(),
                entry
            );
            return Err(CoreError::DuplicateEntry {
                commit_hash: rule_set.commit_hash().to_string(),
                entry: entry.clone(),
            });
        }
    }
    Ok(())
}

/// 为每个例外找到所属通配符（取第一个匹配项）；找不到的例外从版本中移除
fn link_exceptions(rule_set: RuleSet, stats: &mut PrepareStats) -> LinkedVersion {
    let RuleSet { id, mut rules, .. } = rule_set;

    let wildcards: Vec<String> = rules
        .iter()
        .filter(|e| RuleKind::of(e) == RuleKind::Wildcard)
        .cloned()
        .collect();

    let mut exception_to_wildcard = FxHashMap::default();
    let mut dropped: FxHashSet<String> = FxHashSet::default();

    for exception in rules.iter().filter(|e| RuleKind::of(e) == RuleKind::Exception) {
        let mut matching = wildcards.iter().filter(|w| is_exception_of(exception, w));
        match matching.next() {
            Some(wildcard) => {
                if matching.next().is_some() {
                    stats.ambiguous_exceptions += 1;
                    log::debug!(
                        "Exception matches several wildcards, first one kept | version: {} | exception: {} | wildcard: {}",
                        id.commit_hash,
                        exception,
                        wildcard
                    );
                }
                exception_to_wildcard.insert(exception.clone(), wildcard.clone());
            }
            None => {
                dropped.insert(exception.clone());
            }
        }
    }

    if !dropped.is_empty() {
        let dropped_list: Vec<&String> = dropped.iter().collect();
        log::warn!(
            "Exceptions without wildcard removed | version: {} | count: {} | entries: {}",
            id.commit_hash,
            dropped.len(),
            preview_rules(&dropped_list)
        );
        rules.retain(|e| !dropped.contains(e));
    }

    stats.wildcards += wildcards.len();
    stats.mapped_exceptions += exception_to_wildcard.len();
    stats.dropped_exceptions += dropped.len();

    let index = rules.iter().cloned().collect();
    LinkedVersion {
        id,
        rules,
        index,
        exception_to_wildcard,
        wildcards,
    }
}

/// 所有版本都包含的条目（精确字符串相等）
fn common_entries(versions: &[LinkedVersion]) -> FxHashSet<String> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for version in versions {
        for entry in &version.rules {
            *counts.entry(entry.as_str()).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count == versions.len())
        .map(|(entry, _)| entry.to_string())
        .collect()
}

/// 两两比较条目集合，返回每个版本的等价版本哈希列表（先比大小，再逐项比较）
fn equal_groups(sets: &[&FxHashSet<String>], hashes: &[&str]) -> Vec<Vec<String>> {
    let mut groups: Vec<Vec<String>> = vec![Vec::new(); sets.len()];
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            let (a, b) = (sets[i], sets[j]);
            if a.len() == b.len() && a.iter().all(|e| b.contains(e)) {
                groups[i].push(hashes[j].to_string());
                groups[j].push(hashes[i].to_string());
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_set(ts: i64, hash: &str, rules: &[&str]) -> RuleSet {
        RuleSet::new(
            SnapshotId::new(ts, hash),
            rules.iter().map(|r| r.to_string()).collect(),
            0,
        )
    }

    fn abc_corpus() -> Corpus {
        // 故意乱序输入，验证按时间排序
        CorpusPreparer
            .prepare(vec![
                rule_set(3, "c", &["com", "bar.com"]),
                rule_set(1, "a", &["com", "foo.com"]),
                rule_set(2, "b", &["com", "foo.com", "bar.com"]),
            ])
            .unwrap()
    }

    #[test]
    fn test_worked_example() {
        let corpus = abc_corpus();
        let hashes: Vec<&str> = corpus.versions().iter().map(|v| v.commit_hash()).collect();
        assert_eq!(hashes, vec!["a", "b", "c"]);

        let [a, b, c] = [&corpus.versions()[0], &corpus.versions()[1], &corpus.versions()[2]];
        let expected_common: FxHashSet<String> = ["com".to_string()].into_iter().collect();
        assert_eq!(a.entries_common_to_all(), &expected_common);

        // com 既是共有条目也是 TLD，不会出现在差异中
        assert_eq!(a.added_entries(), ["foo.com"]);
        assert!(a.removed_entries().is_empty());
        assert_eq!(b.added_entries(), ["bar.com"]);
        assert!(b.removed_entries().is_empty());
        assert!(c.added_entries().is_empty());
        assert_eq!(c.removed_entries(), ["foo.com"]);

        for v in corpus.versions() {
            assert!(v.equal_versions().is_empty());
            assert!(v.equal_versions_without_tld().is_empty());
        }
    }

    #[test]
    fn test_common_and_partition_laws() {
        let corpus = abc_corpus();
        for v in corpus.versions() {
            for entry in v.entries_common_to_all() {
                assert!(v.contains_entry(entry));
                assert!(!v.entries_without_common().contains(entry));
            }
            assert_eq!(
                v.total_entries(),
                v.entries_without_common().len() + v.entries_common_to_all().len()
            );
        }
    }

    #[test]
    fn test_equal_groups_are_symmetric() {
        let corpus = CorpusPreparer
            .prepare(vec![
                rule_set(1, "a", &["com", "foo.com"]),
                rule_set(2, "b", &["com", "foo.com", "net"]),
                rule_set(3, "c", &["foo.com", "com"]),
                rule_set(4, "d", &["com", "bar.com"]),
            ])
            .unwrap();
        let v = |hash: &str| corpus.find(hash).unwrap();

        assert_eq!(v("a").equal_versions(), ["c"]);
        assert_eq!(v("c").equal_versions(), ["a"]);
        assert!(v("b").equal_versions().is_empty());
        assert!(v("d").equal_versions().is_empty());

        // 仅 TLD 条目 net 不同
        assert_eq!(v("a").equal_versions_without_tld(), ["b", "c"]);
        assert_eq!(v("b").equal_versions_without_tld(), ["a", "c"]);
        assert_eq!(v("c").equal_versions_without_tld(), ["a", "b"]);

        for a in corpus.versions() {
            for hash in a.equal_versions() {
                let b = corpus.find(hash).unwrap();
                assert!(b.equal_versions().iter().any(|h| h == a.commit_hash()));
            }
        }
    }

    #[test]
    fn test_exception_linkage_and_drop() {
        let corpus = CorpusPreparer
            .prepare(vec![
                rule_set(1, "a", &["ck", "*.ck", "!www.ck", "!orphan.jp"]),
                rule_set(2, "b", &["ck", "*.ck", "!www.ck"]),
            ])
            .unwrap();
        let a = corpus.find("a").unwrap();

        assert_eq!(a.wildcard_for_exception("!www.ck"), Some("*.ck"));
        assert_eq!(a.wildcards(), ["*.ck"]);
        // 没有通配符的例外在计算其他派生字段之前就被丢弃
        assert!(!a.contains_entry("!orphan.jp"));
        assert!(a.added_entries().is_empty());
        assert_eq!(a.equal_versions(), ["b"]);
    }

    #[test]
    fn test_first_matching_wildcard_wins() {
        let (corpus, stats) = CorpusPreparer
            .prepare_with_stats(vec![rule_set(
                1,
                "a",
                &["*.b.foo.bar", "*.*.foo.bar", "!a.b.foo.bar"],
            )])
            .unwrap();
        let a = corpus.find("a").unwrap();
        assert_eq!(a.wildcard_for_exception("!a.b.foo.bar"), Some("*.b.foo.bar"));
        assert_eq!(stats.ambiguous_exceptions, 1);
        assert_eq!(stats.mapped_exceptions, 1);
    }

    #[test]
    fn test_duplicate_entry_is_fatal() {
        let err = CorpusPreparer
            .prepare(vec![
                rule_set(1, "a", &["com"]),
                rule_set(2, "b", &["com", "foo.com", "com"]),
            ])
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::DuplicateEntry {
                commit_hash: "b".to_string(),
                entry: "com".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_corpus() {
        assert_eq!(CorpusPreparer.prepare(Vec::new()), Err(CoreError::EmptyCorpus));
    }
}
