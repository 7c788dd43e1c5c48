//! pslident-engine 内核错误定义
//! 封装内核层所有核心错误，与外层 I/O 错误解耦，基于thiserror实现类型安全处理
use thiserror::Error;

/// 内核核心错误枚举
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    // ===================== 快照相关错误 =====================
    /// 快照标识不符合 `<timestamp>_<hash>` 格式（调用方跳过该快照）
    #[error("Invalid snapshot identity: {0}")]
    InvalidSnapshotIdentity(String),

    // ===================== 预处理相关错误 =====================
    /// 规范化后同一快照内仍存在重复条目（数据不变量被破坏，整体预处理中止）
    #[error("Entry {entry} appears more than once in version {commit_hash}")]
    DuplicateEntry { commit_hash: String, entry: String },

    /// 没有任何可用快照
    #[error("Cannot prepare an empty corpus")]
    EmptyCorpus,

    // ===================== 识别相关错误 =====================
    /// 预言机的回答与语料库中所有版本都不一致
    #[error("No candidate version is consistent with the observed answers")]
    NoCandidates,

    /// 尚未收敛时读取结果
    #[error("Identification has not converged yet")]
    NotConverged,

    /// 例外条目在上下文版本中没有对应的通配符
    #[error("No wildcard found for exception {exception} in version {commit_hash}")]
    MissingWildcard { exception: String, commit_hash: String },

    /// 非法的引擎状态转换
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

/// 内核层全局Result类型别名
pub type CoreResult<T> = Result<T, CoreError>;
