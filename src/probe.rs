//! 探测域名簿
//! 将查询转换为具体的探测域名，并把 Cookie 往返结果还原为规则回答
//! 1. 普通 / 通配符规则：域名是公共后缀时 Cookie 无法设置，未往返 → 规则存在
//! 2. 例外规则：例外使域名不再是公共后缀，Cookie 往返 → 例外存在

use pslident_engine::core::{EXCEPTION_PREFIX, WILDCARD_LABEL};
use pslident_engine::{Query, RuleKind};
use rustc_hash::FxHashMap;

/// 通配符 `*` 替换为的随机标签长度
pub const RANDOM_LABEL_LEN: usize = 10;

/// 一次具体的探测
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    /// 被探测的规则
    pub rule: String,
    /// 实际探测的域名
    pub domain: String,
    pub kind: RuleKind,
}

/// 探测记录簿（每个识别会话一份）
#[derive(Debug)]
pub struct ProbeBook {
    probes: FxHashMap<String, ProbeTarget>,
    rng: fastrand::Rng,
}

impl Default for ProbeBook {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeBook {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    /// 固定随机源（用于可复现的探测域名）
    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            probes: FxHashMap::default(),
            rng,
        }
    }

    /// 为查询生成探测域名并记录
    pub fn register(&mut self, query: &Query) -> ProbeTarget {
        let domain = match query.kind {
            RuleKind::Plain => query.rule.clone(),
            RuleKind::Wildcard => self.concretize_wildcard(&query.rule),
            RuleKind::Exception => query.rule.trim_start_matches(EXCEPTION_PREFIX).to_string(),
        };
        let target = ProbeTarget {
            rule: query.rule.clone(),
            domain: domain.to_ascii_lowercase(),
            kind: query.kind,
        };
        log::debug!(
            "Probe registered | rule: {} | domain: {} | kind: {:?}",
            target.rule,
            target.domain,
            target.kind
        );
        self.probes.insert(target.domain.clone(), target.clone());
        target
    }

    /// 根据 Cookie 是否完成往返还原规则回答，并移除该探测记录
    /// 未登记的域名返回 None
    pub fn resolve(&mut self, domain: &str, cookie_round_tripped: bool) -> Option<(String, bool)> {
        let Some(target) = self.probes.remove(&domain.to_ascii_lowercase()) else {
            log::warn!("Unknown probe domain ignored | domain: {}", domain);
            return None;
        };
        let present = match target.kind {
            RuleKind::Plain | RuleKind::Wildcard => !cookie_round_tripped,
            RuleKind::Exception => cookie_round_tripped,
        };
        Some((target.rule, present))
    }

    /// 尚未回收的探测数
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    fn concretize_wildcard(&mut self, wildcard: &str) -> String {
        wildcard
            .split('.')
            .map(|label| {
                if label == WILDCARD_LABEL {
                    (0..RANDOM_LABEL_LEN)
                        .map(|_| self.rng.alphanumeric().to_ascii_lowercase())
                        .collect()
                } else {
                    label.to_string()
                }
            })
            .collect::<Vec<String>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pslident_engine::{CorpusPreparer, IdentificationEngine, RuleSet, SnapshotId, Step};

    fn query(rule: &str) -> Query {
        let corpus = CorpusPreparer
            .prepare(vec![
                RuleSet::new(SnapshotId::new(1, "a"), vec!["jp".into()], 0),
                RuleSet::new(SnapshotId::new(2, "b"), vec!["jp".into(), rule.into()], 0),
            ])
            .unwrap();
        let mut engine = IdentificationEngine::new(corpus.session_copy());
        match engine.next_query().unwrap() {
            Step::Query(query) => query,
            other => panic!("expected query, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_probe() {
        let mut book = ProbeBook::new();
        let target = book.register(&query("co.jp"));
        assert_eq!(target.domain, "co.jp");
        assert_eq!(book.resolve("CO.JP", false), Some(("co.jp".into(), true)));
        // 记录已被消费
        assert_eq!(book.resolve("co.jp", false), None);
        assert!(book.is_empty());
    }

    #[test]
    fn test_wildcard_probe_uses_random_label() {
        let mut book = ProbeBook::with_rng(fastrand::Rng::with_seed(7));
        let target = book.register(&query("*.kawasaki.jp"));
        let (label, rest) = target.domain.split_once('.').unwrap();
        assert_eq!(rest, "kawasaki.jp");
        assert_eq!(label.len(), RANDOM_LABEL_LEN);
        assert!(label.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(
            book.resolve(&target.domain, true),
            Some(("*.kawasaki.jp".into(), false))
        );
    }

    #[test]
    fn test_exception_probe_is_inverted() {
        let mut book = ProbeBook::new();
        let exception = Query {
            rule: "!city.kawasaki.jp".into(),
            kind: RuleKind::Exception,
            context: "b".into(),
            purpose: pslident_engine::QueryPurpose::Search,
        };
        let target = book.register(&exception);
        assert_eq!(target.domain, "city.kawasaki.jp");
        assert_eq!(
            book.resolve("city.kawasaki.jp", true),
            Some(("!city.kawasaki.jp".into(), true))
        );
    }
}
