//! 语料库预处理子模块
mod corpus_preparer;
mod prepare_stats;
pub(crate) mod relative;

pub use corpus_preparer::CorpusPreparer;
pub use prepare_stats::PrepareStats;
