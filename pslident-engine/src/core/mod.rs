mod corpus;
mod prepared;
mod rule;
mod snapshot;

// 导出常用项
pub use corpus::Corpus;
pub(crate) use prepared::VersionRules;
pub use prepared::{PreparedVersion, VersionRecord};
pub use rule::{
    is_exception_of, is_tld_entry, wildcard_matches_domain, RuleKind, EXCEPTION_PREFIX,
    WILDCARD_LABEL,
};
pub use snapshot::{RuleSet, SnapshotId};
