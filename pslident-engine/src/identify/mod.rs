//! 识别阶段：根据逐条"存在 / 不存在"回答收敛到候选版本
mod engine;
mod matching;
mod query;
mod selection;
mod verification;

pub use engine::IdentificationEngine;
pub use matching::MatchMode;
pub use query::{Convergence, Query, QueryPurpose, Step};
