use std::sync::Arc;

use pslident_engine::{Corpus, IdentificationEngine, MatchMode};

use crate::error::{PslError, PslResult};

/// 识别会话工厂
/// 持有只读语料库，每个会话拿到全部版本的独立副本
#[derive(Debug, Clone)]
pub struct SessionFactory {
    corpus: Arc<Corpus>,
    match_mode: MatchMode,
}

impl SessionFactory {
    /// 空语料库无法产生有意义的会话，直接拒绝
    pub fn new(corpus: Arc<Corpus>) -> PslResult<Self> {
        if corpus.is_empty() {
            return Err(PslError::CorpusUnavailable("语料库不包含任何版本".into()));
        }
        Ok(Self {
            corpus,
            match_mode: MatchMode::default(),
        })
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// 新建一个独立的识别会话
    pub fn new_session(&self) -> IdentificationEngine {
        IdentificationEngine::with_match_mode(self.corpus.session_copy(), self.match_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pslident_engine::{CorpusPreparer, RuleSet, SnapshotId, Step};

    fn factory() -> SessionFactory {
        let corpus = CorpusPreparer
            .prepare(vec![
                RuleSet::new(SnapshotId::new(1, "a"), vec!["com".into(), "foo.com".into()], 0),
                RuleSet::new(SnapshotId::new(2, "b"), vec!["com".into(), "bar.com".into()], 0),
            ])
            .unwrap();
        SessionFactory::new(Arc::new(corpus)).unwrap()
    }

    #[test]
    fn test_sessions_are_independent() {
        let factory = factory().with_match_mode(MatchMode::Strict);
        let mut first = factory.new_session();
        let second = factory.new_session();
        assert_eq!(first.match_mode(), MatchMode::Strict);

        let Step::Query(query) = first.next_query().unwrap() else {
            panic!("expected a query");
        };
        first.report_answer(&query.rule, true);
        assert_eq!(first.remaining(), 1);

        assert_eq!(second.remaining(), 2);
        assert!(second.answers().is_empty());
        assert_eq!(factory.corpus().len(), 2);
        // 会话内的差异重算不影响语料库
        assert_eq!(factory.corpus().versions()[1].removed_entries(), ["foo.com"]);
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        let err = SessionFactory::new(Arc::new(Corpus::default())).unwrap_err();
        assert!(matches!(err, PslError::CorpusUnavailable(_)));
    }
}
