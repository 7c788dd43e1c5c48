// 核心公共结构体（规则 / 快照 / 预处理版本 / 语料库）
pub mod core;
// 内核错误定义
pub mod error;
// 原始快照规范化
pub mod normalizer;
// 语料库预处理（公共条目 / 相对差异 / 等价分组 / 例外映射）
pub mod preparer;
// 自适应识别引擎
pub mod identify;
// 日志格式化等内部工具
pub mod utils;

// 顶层导出常用类型
pub use crate::core::{Corpus, PreparedVersion, RuleKind, RuleSet, SnapshotId, VersionRecord};
pub use error::{CoreError, CoreResult};
pub use identify::{
    Convergence, IdentificationEngine, MatchMode, Query, QueryPurpose, Step,
};
pub use normalizer::{normalize_rule, RuleNormalizer};
pub use preparer::{CorpusPreparer, PrepareStats};
