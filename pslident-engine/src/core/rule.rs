//! 规则语法分类与按标签（label）匹配

use serde::{Deserialize, Serialize};

/// 例外规则前缀
pub const EXCEPTION_PREFIX: char = '!';
/// 通配符标签
pub const WILDCARD_LABEL: &str = "*";

/// 规则类型（由语法决定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    /// 普通规则，如 `foo.bar`
    Plain,
    /// 通配符规则，每个 `*` 匹配恰好一个标签
    Wildcard,
    /// 例外规则，以 `!` 开头
    Exception,
}

impl RuleKind {
    /// 根据规则字符串判断类型（例外优先于通配符）
    pub fn of(rule: &str) -> Self {
        if rule.starts_with(EXCEPTION_PREFIX) {
            RuleKind::Exception
        } else if rule.contains('*') {
            RuleKind::Wildcard
        } else {
            RuleKind::Plain
        }
    }
}

/// 是否为 TLD 条目：去掉最多一个前导 `.` 与一个结尾 `.` 后不再包含 `.`
pub fn is_tld_entry(rule: &str) -> bool {
    let stripped = rule.strip_prefix('.').unwrap_or(rule);
    let stripped = stripped.strip_suffix('.').unwrap_or(stripped);
    !stripped.contains('.')
}

/// 通配符规则是否按标签逐一覆盖给定域名（标签数必须相同，`*` 匹配任意单个标签）
pub fn wildcard_matches_domain(wildcard: &str, domain: &str) -> bool {
    if !wildcard.contains('*') {
        return false;
    }
    labels_match(wildcard, domain)
}

/// 例外规则是否隶属于该通配符规则
/// 比较前去掉例外的 `!` 前缀，其余规则与 [`wildcard_matches_domain`] 一致
pub fn is_exception_of(exception: &str, wildcard: &str) -> bool {
    match exception.strip_prefix(EXCEPTION_PREFIX) {
        Some(name) if !name.is_empty() => wildcard_matches_domain(wildcard, name),
        _ => false,
    }
}

fn labels_match(pattern: &str, domain: &str) -> bool {
    let mut pattern_labels = pattern.split('.');
    let mut domain_labels = domain.split('.');
    loop {
        match (pattern_labels.next(), domain_labels.next()) {
            (None, None) => return true,
            (Some(p), Some(d)) if p == d || p == WILDCARD_LABEL => continue,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_kind() {
        assert_eq!(RuleKind::of("foo.bar"), RuleKind::Plain);
        assert_eq!(RuleKind::of("*.ck"), RuleKind::Wildcard);
        assert_eq!(RuleKind::of("!www.ck"), RuleKind::Exception);
    }

    #[test]
    fn test_tld_entry() {
        assert!(is_tld_entry("com"));
        assert!(is_tld_entry(".com"));
        assert!(is_tld_entry("com."));
        assert!(is_tld_entry(".com."));
        assert!(!is_tld_entry("co.uk"));
        assert!(!is_tld_entry("..com"));
    }

    #[test]
    fn test_wildcard_matching() {
        assert!(wildcard_matches_domain("*.example.org", "sub.example.org"));
        assert!(wildcard_matches_domain("*.*.foo.bar", "a.b.foo.bar"));
        assert!(!wildcard_matches_domain("*.example.org", "example.org"));
        assert!(!wildcard_matches_domain("*.example.org", "a.b.example.org"));
        assert!(!wildcard_matches_domain("sub.example.org", "sub.example.org"));
    }

    #[test]
    fn test_exception_of_wildcard() {
        assert!(is_exception_of("!www.ck", "*.ck"));
        assert!(is_exception_of("!city.kawasaki.jp", "*.kawasaki.jp"));
        assert!(is_exception_of("!a.x.b", "a.*.b"));
        assert!(!is_exception_of("!www.ck", "*.jp"));
        assert!(!is_exception_of("www.ck", "*.ck"));
        assert!(!is_exception_of("!", "*"));
    }
}
