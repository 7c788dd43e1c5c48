//! 语料库配置管理

use std::path::{Path, PathBuf};

use pslident_engine::MatchMode;

/// 默认的预处理语料库文件
pub const DEFAULT_CORPUS_FILE: &str = "prepared_psl.json";

/// 语料库持久化格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CorpusFormat {
    #[default]
    Json,
    MsgPack,
}

impl CorpusFormat {
    /// 按扩展名推断格式：`.mp` / `.msgpack` 为 MessagePack，其余为 JSON
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("mp") | Some("msgpack") => CorpusFormat::MsgPack,
            _ => CorpusFormat::Json,
        }
    }
}

/// 语料库来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusOrigin {
    /// 已预处理的语料库文件
    PreparedFile(PathBuf),
    /// 原始快照目录（每个文件一个版本），可选预处理结果缓存路径
    SnapshotDir {
        dir: PathBuf,
        cache_path: Option<PathBuf>,
    },
}

/// 完整语料库配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusConfig {
    pub origin: CorpusOrigin,
    pub format: CorpusFormat,
    pub match_mode: MatchMode,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            origin: CorpusOrigin::PreparedFile(PathBuf::from(DEFAULT_CORPUS_FILE)),
            format: CorpusFormat::Json,
            match_mode: MatchMode::default(),
        }
    }
}

impl CorpusConfig {
    /// 从预处理文件加载（格式按扩展名推断）
    pub fn prepared_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            format: CorpusFormat::from_path(&path),
            origin: CorpusOrigin::PreparedFile(path),
            match_mode: MatchMode::default(),
        }
    }

    /// 从原始快照目录预处理（不缓存）
    pub fn snapshot_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            origin: CorpusOrigin::SnapshotDir {
                dir: dir.into(),
                cache_path: None,
            },
            format: CorpusFormat::Json,
            match_mode: MatchMode::default(),
        }
    }

    /// 预处理结果缓存路径（仅快照目录来源有效）
    pub fn cache_path(&self) -> Option<&Path> {
        match &self.origin {
            CorpusOrigin::PreparedFile(_) => None,
            CorpusOrigin::SnapshotDir { cache_path, .. } => cache_path.as_deref(),
        }
    }
}

/// 自定义构建器（链式 API）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: CorpusConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn origin(mut self, origin: CorpusOrigin) -> Self {
        self.config.origin = origin;
        self
    }

    pub fn format(mut self, format: CorpusFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn match_mode(mut self, match_mode: MatchMode) -> Self {
        self.config.match_mode = match_mode;
        self
    }

    /// 为快照目录来源设置缓存路径；预处理文件来源忽略该设置
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        if let CorpusOrigin::SnapshotDir { cache_path, .. } = &mut self.config.origin {
            *cache_path = Some(path.into());
        }
        self
    }

    pub fn build(self) -> CorpusConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(CorpusFormat::from_path(Path::new("psl.mp")), CorpusFormat::MsgPack);
        assert_eq!(CorpusFormat::from_path(Path::new("psl.MSGPACK")), CorpusFormat::MsgPack);
        assert_eq!(CorpusFormat::from_path(Path::new("psl.json")), CorpusFormat::Json);
        assert_eq!(CorpusFormat::from_path(Path::new("psl")), CorpusFormat::Json);
    }

    #[test]
    fn test_defaults() {
        let config = CorpusConfig::default();
        assert_eq!(
            config.origin,
            CorpusOrigin::PreparedFile(PathBuf::from(DEFAULT_CORPUS_FILE))
        );
        assert_eq!(config.format, CorpusFormat::Json);
        assert_eq!(config.match_mode, MatchMode::Lenient);
    }

    #[test]
    fn test_builder_cache_path_applies_to_snapshot_dir_only() {
        let config = CustomConfigBuilder::new()
            .origin(CorpusOrigin::SnapshotDir {
                dir: "snapshots".into(),
                cache_path: None,
            })
            .cache_path("cache.mp")
            .format(CorpusFormat::MsgPack)
            .match_mode(MatchMode::Strict)
            .build();
        assert_eq!(config.cache_path(), Some(Path::new("cache.mp")));
        assert_eq!(config.match_mode, MatchMode::Strict);

        let prepared = CustomConfigBuilder::new().cache_path("ignored.json").build();
        assert_eq!(prepared.cache_path(), None);
    }
}
