use std::collections::VecDeque;

use super::query::{Query, QueryPurpose};
use crate::core::{PreparedVersion, RuleKind};

/// 结果版本的逐条校验队列
/// 顺序：非共有条目（原始顺序）→ 共有条目（字典序）；每个例外前先查询其通配符
pub(crate) fn verification_queue(version: &PreparedVersion) -> VecDeque<Query> {
    let mut common: Vec<&String> = version.entries_common_to_all().iter().collect();
    common.sort();

    let hash = version.commit_hash();
    let mut queue = VecDeque::with_capacity(version.total_entries());
    for entry in version.entries_without_common().iter().chain(common) {
        if RuleKind::of(entry) == RuleKind::Exception {
            let Some(wildcard) = version.wildcard_for_exception(entry) else {
                log::warn!(
                    "exception without wildcard skipped | version: {}, exception: {}",
                    hash,
                    entry
                );
                continue;
            };
            queue.push_back(Query::new(wildcard, hash, QueryPurpose::Verify));
        }
        queue.push_back(Query::new(entry.as_str(), hash, QueryPurpose::Verify));
    }
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RuleSet, SnapshotId};
    use crate::preparer::CorpusPreparer;

    #[test]
    fn test_wildcard_precedes_each_exception() {
        let corpus = CorpusPreparer
            .prepare(vec![
                RuleSet::new(
                    SnapshotId::new(1, "a"),
                    vec!["ck".into(), "*.ck".into(), "!www.ck".into()],
                    0,
                ),
                RuleSet::new(SnapshotId::new(2, "b"), vec!["ck".into(), "*.ck".into()], 0),
            ])
            .unwrap();
        let rules: Vec<String> = verification_queue(&corpus.versions()[0])
            .into_iter()
            .map(|q| q.rule)
            .collect();
        assert_eq!(rules, vec!["*.ck", "!www.ck", "*.ck", "ck"]);
    }
}
