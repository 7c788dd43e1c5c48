//! 全局会话工厂单例管理
//! 进程内语料库只加载一次，之后只读；会话各自持有副本

use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use pslident_engine::{Corpus, IdentificationEngine, MatchMode};

use super::factory::SessionFactory;
use crate::config::CorpusConfig;
use crate::corpus::CorpusLoader;
use crate::error::{PslError, PslResult};

static GLOBAL_SESSION_FACTORY: Lazy<Arc<OnceCell<SessionFactory>>> =
    Lazy::new(|| Arc::new(OnceCell::new()));

/// 按配置加载语料库并初始化全局会话工厂
/// 已初始化则直接返回 Ok(())
pub async fn init_global_corpus(config: CorpusConfig) -> PslResult<()> {
    if GLOBAL_SESSION_FACTORY.get().is_some() {
        log::debug!("Global corpus already initialized, skip reinitialization");
        return Ok(());
    }

    let corpus = CorpusLoader::new().load(&config).await.map_err(|e| match e {
        PslError::CorpusUnavailable(_) => e,
        other => PslError::CorpusUnavailable(format!("语料库加载失败：{}", other)),
    })?;
    install(corpus, config.match_mode)?;

    log::info!("Global corpus initialized");
    Ok(())
}

/// 手动注入已加载的语料库（同步接口）
pub fn init_global_corpus_with(corpus: Corpus, match_mode: MatchMode) -> PslResult<()> {
    if GLOBAL_SESSION_FACTORY.get().is_some() {
        log::debug!("Global corpus already initialized, skip reinitialization with custom corpus");
        return Ok(());
    }
    install(corpus, match_mode)?;

    log::info!("Global corpus initialized with custom corpus");
    Ok(())
}

fn install(corpus: Corpus, match_mode: MatchMode) -> PslResult<()> {
    let versions = corpus.len();
    let factory = SessionFactory::new(Arc::new(corpus))?.with_match_mode(match_mode);

    // 并发初始化时以先完成者为准
    if GLOBAL_SESSION_FACTORY.set(factory).is_err() {
        log::debug!("Global corpus initialized concurrently, keeping the first instance");
        return Ok(());
    }
    log::debug!("Global session factory installed | versions: {}", versions);
    Ok(())
}

/// 获取全局会话工厂（需先初始化）
pub fn global_session_factory() -> PslResult<&'static SessionFactory> {
    GLOBAL_SESSION_FACTORY.get().ok_or_else(|| {
        PslError::CorpusUnavailable(
            "全局语料库未初始化，请先调用 init_global_corpus".to_string(),
        )
    })
}

/// 基于全局语料库新建识别会话
pub fn new_global_session() -> PslResult<IdentificationEngine> {
    Ok(global_session_factory()?.new_session())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pslident_engine::{CorpusPreparer, RuleSet, SnapshotId};

    // 全局单例在进程内只能初始化一次，所有断言集中在一个测试里
    #[tokio::test]
    async fn test_global_lifecycle() {
        assert!(matches!(
            new_global_session(),
            Err(PslError::CorpusUnavailable(_))
        ));

        // 空语料库与缺失文件都不会留下空的全局实例
        assert!(init_global_corpus_with(Corpus::default(), MatchMode::Lenient).is_err());
        let dir = tempfile::tempdir().unwrap();
        let missing = CorpusConfig::prepared_file(dir.path().join("missing.json"));
        assert!(matches!(
            init_global_corpus(missing).await,
            Err(PslError::CorpusUnavailable(_))
        ));
        assert!(global_session_factory().is_err());

        let corpus = CorpusPreparer
            .prepare(vec![RuleSet::new(
                SnapshotId::new(1, "a"),
                vec!["com".into()],
                0,
            )])
            .unwrap();
        init_global_corpus_with(corpus, MatchMode::Strict).unwrap();
        // 幂等
        init_global_corpus_with(Corpus::default(), MatchMode::Lenient).unwrap();

        let factory = global_session_factory().unwrap();
        assert_eq!(factory.match_mode(), MatchMode::Strict);
        assert_eq!(new_global_session().unwrap().remaining(), 1);
    }
}
