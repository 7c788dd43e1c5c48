//! 快照目录读取
//! 每个文件一个版本，文件名为 `<epochMillis>_<commitHash>`，一行一条规则

use std::path::Path;

use log::{debug, info, warn};
use pslident_engine::{RuleNormalizer, RuleSet, SnapshotId};

use crate::error::PslResult;

/// 快照目录读取器
#[derive(Debug, Default)]
pub struct SnapshotReader {
    normalizer: RuleNormalizer,
}

impl SnapshotReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取目录下全部快照，按提交时间升序返回
    /// 文件名非法或无法读取的快照记录警告后跳过
    pub async fn read_dir(&self, dir: &Path) -> PslResult<Vec<RuleSet>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut rule_sets = Vec::new();
        let mut skipped = 0usize;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!("Snapshot skipped, file name is not UTF-8 | path: {}", path.display());
                skipped += 1;
                continue;
            };

            // 1. 解析快照标识
            let id = match SnapshotId::parse(name) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Snapshot skipped | file: {} | reason: {}", name, e);
                    skipped += 1;
                    continue;
                }
            };

            // 2. 读取并规范化
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Snapshot unreadable, skipped | file: {} | reason: {}", name, e);
                    skipped += 1;
                    continue;
                }
            };
            let rule_set = self.normalizer.normalize(id, &content);
            debug!(
                "Snapshot read | id: {} | rules: {} | duplicates: {}",
                rule_set.id,
                rule_set.len(),
                rule_set.duplicate_entries
            );
            rule_sets.push(rule_set);
        }

        rule_sets.sort_by_key(RuleSet::commit_timestamp);
        info!(
            "Snapshot directory loaded | dir: {} | versions: {} | skipped: {}",
            dir.display(),
            rule_sets.len(),
            skipped
        );
        Ok(rule_sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_sorted_and_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("2000_bbb"), "com\nbar.com\n")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("1000_aaa"), "// header\ncom\nFOO.com extra\ncom\n")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("README"), "not a snapshot").await.unwrap();
        tokio::fs::write(dir.path().join("12x_ccc"), "com").await.unwrap();
        tokio::fs::create_dir(dir.path().join("3000_ddd")).await.unwrap();

        let rule_sets = SnapshotReader::new().read_dir(dir.path()).await.unwrap();
        let ids: Vec<String> = rule_sets.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["1000_aaa", "2000_bbb"]);

        assert_eq!(rule_sets[0].rules, vec!["com", "foo.com"]);
        assert_eq!(rule_sets[0].duplicate_entries, 1);
    }

    #[tokio::test]
    async fn test_missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(SnapshotReader::new().read_dir(&missing).await.is_err());
    }
}
