use crate::core::RuleKind;

/// 查询用途
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPurpose {
    /// 搜索阶段的区分性查询
    Search,
    /// 例外条目的所属通配符，回答后才会查询该例外
    GoverningWildcard { exception: String },
    /// 收敛后的结果校验
    Verify,
}

/// 一次待回答的查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub rule: String,
    pub kind: RuleKind,
    /// 提供该查询上下文（例外映射）的版本哈希
    pub context: String,
    pub purpose: QueryPurpose,
}

impl Query {
    pub(crate) fn new(rule: impl Into<String>, context: impl Into<String>, purpose: QueryPurpose) -> Self {
        let rule = rule.into();
        Self {
            kind: RuleKind::of(&rule),
            rule,
            context: context.into(),
            purpose,
        }
    }
}

/// 收敛结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    /// true：剩余候选规则集完全相同；false：仅在 TLD 条目上存在无法观测的差异
    pub exact: bool,
    /// 剩余候选数
    pub candidates: usize,
}

/// next_query 的返回值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Query(Query),
    Converged(Convergence),
}
