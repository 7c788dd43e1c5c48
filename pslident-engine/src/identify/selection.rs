//! 查询选择策略
//! 1. 从候选列表中点向两侧交替查找仍有未查询差异的版本（pivot）
//! 2. 在 pivot 的新增 / 删除条目中挑选出现次数最少的条目
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::PreparedVersion;

/// 选中的待查询条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selection {
    pub rule: String,
    /// 上下文版本在候选列表中的下标
    pub context: usize,
}

pub(crate) fn select_query(
    candidates: &[PreparedVersion],
    used: &FxHashSet<String>,
) -> Option<Selection> {
    let pivot_index = find_pivot(candidates, used)?;
    let pivot = &candidates[pivot_index];

    let (added_counts, removed_counts) = occurrence_counts(candidates);
    let least_added = least_frequent(pivot.added_entries(), &added_counts, used);
    let least_removed = least_frequent(pivot.removed_entries(), &removed_counts, used);

    // 删除条目仅在严格更少时胜出；在前一个版本的上下文中查询
    let removed_wins = match (least_added, least_removed) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some((_, added_count)), Some((_, removed_count))) => removed_count < added_count,
    };

    if removed_wins {
        least_removed.map(|(rule, _)| Selection {
            rule: rule.to_string(),
            context: pivot_index.saturating_sub(1),
        })
    } else {
        least_added.map(|(rule, _)| Selection {
            rule: rule.to_string(),
            context: pivot_index,
        })
    }
}

/// 从中点开始，先向后再向前交替查找仍有未使用差异条目的版本
fn find_pivot(candidates: &[PreparedVersion], used: &FxHashSet<String>) -> Option<usize> {
    let has_unused = |version: &PreparedVersion| {
        version
            .added_entries()
            .iter()
            .chain(version.removed_entries())
            .any(|e| !used.contains(e))
    };

    let center = candidates.len() / 2;
    for offset in 0..candidates.len() {
        let forward = center + offset;
        if forward < candidates.len() && has_unused(&candidates[forward]) {
            return Some(forward);
        }
        if let Some(backward) = center.checked_sub(offset) {
            if has_unused(&candidates[backward]) {
                return Some(backward);
            }
        }
    }
    None
}

/// 统计每个条目在所有候选的新增 / 删除列表中出现的次数
fn occurrence_counts(
    candidates: &[PreparedVersion],
) -> (FxHashMap<&str, usize>, FxHashMap<&str, usize>) {
    let mut added: FxHashMap<&str, usize> = FxHashMap::default();
    let mut removed: FxHashMap<&str, usize> = FxHashMap::default();
    for candidate in candidates {
        for entry in candidate.added_entries() {
            *added.entry(entry.as_str()).or_insert(0) += 1;
        }
        for entry in candidate.removed_entries() {
            *removed.entry(entry.as_str()).or_insert(0) += 1;
        }
    }
    (added, removed)
}

/// 未使用条目中出现次数最少的一个（次数相同取列表中靠前者）
fn least_frequent<'a>(
    entries: &'a [String],
    counts: &FxHashMap<&str, usize>,
    used: &FxHashSet<String>,
) -> Option<(&'a str, usize)> {
    let mut best: Option<(&str, usize)> = None;
    for entry in entries.iter().filter(|e| !used.contains(*e)) {
        let count = counts.get(entry.as_str()).copied().unwrap_or(0);
        if best.map_or(true, |(_, best_count)| count < best_count) {
            best = Some((entry.as_str(), count));
        }
    }
    best
}
