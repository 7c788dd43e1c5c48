use crate::core::{wildcard_matches_domain, PreparedVersion};

/// 回答匹配模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// 候选是否包含该条目必须与回答一致
    Strict,
    /// 回答为"存在"时，逐标签覆盖该条目的通配符规则也视为包含（例外条目同样适用）
    /// 具体的探测域名无法区分"该规则本身"与"覆盖它的通配符"
    #[default]
    Lenient,
}

impl MatchMode {
    /// 候选在该回答下是否保留
    pub fn survives(self, candidate: &PreparedVersion, sample: &str, present: bool) -> bool {
        if candidate.contains_entry(sample) == present {
            return true;
        }
        match self {
            MatchMode::Strict => false,
            MatchMode::Lenient => present && covered_by_wildcard(candidate, sample),
        }
    }
}

fn covered_by_wildcard(candidate: &PreparedVersion, sample: &str) -> bool {
    candidate.contains_entry(&format!("*.{sample}"))
        || candidate
            .wildcards()
            .iter()
            .any(|wildcard| wildcard_matches_domain(wildcard, sample))
}
