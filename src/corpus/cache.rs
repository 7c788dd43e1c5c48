//! 语料库缓存管理
//! 仅处理预处理语料库的本地序列化（JSON / MessagePack）与反序列化

use std::path::Path;

use log::debug;
use pslident_engine::{Corpus, VersionRecord};
use rmp_serde::{from_slice, Serializer};
use serde::Serialize;

use crate::config::CorpusFormat;
use crate::error::{PslError, PslResult};

/// 语料库缓存管理器
pub struct CorpusCacheManager;

impl CorpusCacheManager {
    /// 序列化语料库（记录数组，集合字段按字典序写出）
    pub fn encode(corpus: &Corpus, format: CorpusFormat) -> PslResult<Vec<u8>> {
        let records = corpus.to_records();
        match format {
            CorpusFormat::Json => Ok(serde_json::to_vec_pretty(&records)?),
            CorpusFormat::MsgPack => {
                let mut data = Vec::new();
                // 以字段名写出，与 JSON 记录结构保持一致
                records
                    .serialize(&mut Serializer::new(&mut data).with_struct_map())
                    .map_err(|e| PslError::MsgPackError(format!("序列化失败：{}", e)))?;
                Ok(data)
            }
        }
    }

    /// 反序列化语料库，记录按时间戳重新排序
    pub fn decode(data: &[u8], format: CorpusFormat) -> PslResult<Corpus> {
        let records: Vec<VersionRecord> = match format {
            CorpusFormat::Json => serde_json::from_slice(data)?,
            CorpusFormat::MsgPack => from_slice(data)
                .map_err(|e| PslError::MsgPackError(format!("反序列化失败：{}", e)))?,
        };
        Ok(Corpus::from_records(records))
    }

    /// 从本地文件加载语料库
    pub async fn load(path: &Path, format: CorpusFormat) -> PslResult<Corpus> {
        let data = tokio::fs::read(path).await?;
        let corpus = Self::decode(&data, format)?;
        debug!(
            "Corpus loaded | path: {} | format: {:?} | versions: {}",
            path.display(),
            format,
            corpus.len()
        );
        Ok(corpus)
    }

    /// 将语料库写入本地文件
    pub async fn save(path: &Path, format: CorpusFormat, corpus: &Corpus) -> PslResult<()> {
        let data = Self::encode(corpus, format)?;
        debug!(
            "Corpus serialized | format: {:?} | bytes: {}",
            format,
            data.len()
        );
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, data).await?;
        Ok(())
    }

    /// 清除本地缓存
    pub async fn clear(path: &Path) -> PslResult<()> {
        if tokio::fs::try_exists(path).await? {
            tokio::fs::remove_file(path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pslident_engine::{CorpusPreparer, RuleSet, SnapshotId};

    fn sample_corpus() -> Corpus {
        let rule_set = |ts: i64, hash: &str, rules: &[&str]| {
            RuleSet::new(
                SnapshotId::new(ts, hash),
                rules.iter().map(|r| r.to_string()).collect(),
                0,
            )
        };
        CorpusPreparer
            .prepare(vec![
                rule_set(1, "a", &["com", "foo.com", "ck", "*.ck", "!www.ck"]),
                rule_set(2, "b", &["com", "foo.com", "bar.com"]),
                rule_set(3, "c", &["com", "bar.com", "net"]),
            ])
            .unwrap()
    }

    #[test]
    fn test_json_records_use_persisted_field_names() {
        let data = CorpusCacheManager::encode(&sample_corpus(), CorpusFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
        let first = &value[0];
        for field in [
            "commit_timestamp",
            "commit_hash",
            "entries_that_all_versions_have_in_common",
            "added_entries",
            "removed_entries",
            "entries_without_the_ones_all_versions_have_in_common",
            "equal_psls",
            "tlds",
            "equal_without_tlds",
            "exception_to_wildcard_mapping",
            "wildcards",
        ] {
            assert!(first.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(first["exception_to_wildcard_mapping"]["!www.ck"], "*.ck");
    }

    #[tokio::test]
    async fn test_save_and_load_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = sample_corpus();

        for (name, format) in [
            ("corpus.json", CorpusFormat::Json),
            ("nested/corpus.mp", CorpusFormat::MsgPack),
        ] {
            let path = dir.path().join(name);
            CorpusCacheManager::save(&path, format, &corpus).await.unwrap();
            let loaded = CorpusCacheManager::load(&path, format).await.unwrap();
            assert_eq!(loaded, corpus);

            CorpusCacheManager::clear(&path).await.unwrap();
            assert!(!path.exists());
        }
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            CorpusCacheManager::decode(b"not json", CorpusFormat::Json),
            Err(PslError::JsonError(_))
        ));
        assert!(matches!(
            CorpusCacheManager::decode(&[0xc1], CorpusFormat::MsgPack),
            Err(PslError::MsgPackError(_))
        ));
    }
}
