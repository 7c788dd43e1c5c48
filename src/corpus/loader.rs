//! 语料库加载管理器
//! 负责从预处理文件加载，或从快照目录预处理并写入缓存

use std::path::Path;

use log::{debug, info, warn};
use pslident_engine::{Corpus, CorpusPreparer};

use super::cache::CorpusCacheManager;
use super::snapshot_reader::SnapshotReader;
use crate::config::{CorpusConfig, CorpusOrigin};
use crate::error::{PslError, PslResult};

/// 语料库加载管理器
#[derive(Debug, Default)]
pub struct CorpusLoader {
    reader: SnapshotReader,
}

impl CorpusLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按配置加载语料库；结果为空时视为不可用
    pub async fn load(&self, config: &CorpusConfig) -> PslResult<Corpus> {
        let corpus = match &config.origin {
            CorpusOrigin::PreparedFile(path) => CorpusCacheManager::load(path, config.format)
                .await
                .map_err(|e| {
                    PslError::CorpusLoadError(format!(
                        "预处理语料库[{}]加载失败：{}",
                        path.display(),
                        e
                    ))
                })?,
            CorpusOrigin::SnapshotDir { dir, cache_path } => {
                self.load_snapshot_dir(dir, cache_path.as_deref(), config)
                    .await?
            }
        };

        if corpus.is_empty() {
            return Err(PslError::CorpusUnavailable("语料库不包含任何版本".into()));
        }
        Ok(corpus)
    }

    /// 优先读取缓存，缓存缺失或损坏时重新预处理并写回缓存
    async fn load_snapshot_dir(
        &self,
        dir: &Path,
        cache_path: Option<&Path>,
        config: &CorpusConfig,
    ) -> PslResult<Corpus> {
        // 1. 优先加载本地缓存
        if let Some(cache_path) = cache_path {
            match CorpusCacheManager::load(cache_path, config.format).await {
                Ok(corpus) if !corpus.is_empty() => {
                    debug!("Corpus cache hit | path: {}", cache_path.display());
                    return Ok(corpus);
                }
                Ok(_) => warn!("Corpus cache is empty, re-preparing | path: {}", cache_path.display()),
                Err(e) => warn!(
                    "Corpus cache missing or corrupt, re-preparing | path: {} | reason: {}",
                    cache_path.display(),
                    e
                ),
            }
        }

        // 2. 从快照目录预处理
        let corpus = self.prepare_dir(dir).await?;

        // 3. 缓存到本地
        if let Some(cache_path) = cache_path {
            if let Err(e) = CorpusCacheManager::save(cache_path, config.format, &corpus).await {
                warn!("Corpus cache write failed | path: {} | reason: {}", cache_path.display(), e);
            } else {
                debug!("Corpus cached | path: {}", cache_path.display());
            }
        }

        Ok(corpus)
    }

    /// 读取快照目录并完成预处理
    pub async fn prepare_dir(&self, dir: &Path) -> PslResult<Corpus> {
        let raw_versions = self.reader.read_dir(dir).await?;
        let (corpus, stats) = CorpusPreparer.prepare_with_stats(raw_versions)?;
        info!(
            "Corpus prepared | versions: {} | common entries: {} | dropped exceptions: {}",
            stats.versions, stats.common_entries, stats.dropped_exceptions
        );
        Ok(corpus)
    }
}
