use crate::core::PreparedVersion;

/// 首个版本的相对差异取值方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FirstVersion {
    /// 预处理阶段：首个版本的新增条目 = 其非 TLD 的非共有条目
    NonTldEntries,
    /// 识别阶段：首个幸存候选没有前驱，差异为空
    Empty,
}

/// 按时间顺序重算相对差异（不含共有条目与 TLD 条目）
/// versions 必须按时间升序排列
pub(crate) fn recompute_relative_changes(versions: &mut [PreparedVersion], first: FirstVersion) {
    let mut changes: Vec<(Vec<String>, Vec<String>)> = Vec::with_capacity(versions.len());

    for (i, latest) in versions.iter().enumerate() {
        if i == 0 {
            let added = match first {
                FirstVersion::NonTldEntries => latest
                    .entries_without_common()
                    .iter()
                    .filter(|e| !latest.is_tld_entry(e))
                    .cloned()
                    .collect(),
                FirstVersion::Empty => Vec::new(),
            };
            changes.push((added, Vec::new()));
            continue;
        }

        let previous = &versions[i - 1];
        // 前一个版本有、当前版本没有 → 删除
        let removed = previous
            .entries_without_common()
            .iter()
            .filter(|e| !previous.is_tld_entry(e) && !latest.contains_entry(e))
            .cloned()
            .collect();
        // 当前版本有、前一个版本没有 → 新增
        let added = latest
            .entries_without_common()
            .iter()
            .filter(|e| !latest.is_tld_entry(e) && !previous.contains_entry(e))
            .cloned()
            .collect();
        changes.push((added, removed));
    }

    for (version, (added, removed)) in versions.iter_mut().zip(changes) {
        version.set_relative_changes(added, removed);
    }
}
