//! pslident - 通过 Cookie 往返探测识别客户端所用的 PSL（Public Suffix List）版本

// 导出全局错误类型
pub use self::error::{PslError, PslResult};

// 导出配置模块
pub use self::config::{CorpusConfig, CorpusFormat, CorpusOrigin, CustomConfigBuilder};

// 导出语料库获取接口
pub use self::corpus::{CorpusCacheManager, CorpusLoader, SnapshotReader};

// 导出会话管理接口
pub use self::session::{
    global_session_factory, init_global_corpus, init_global_corpus_with, new_global_session,
    SessionFactory,
};

// 导出探测工具
pub use self::probe::{ProbeBook, ProbeTarget};

// 导出内核常用类型，调用方无需直接依赖 pslident-engine
pub use pslident_engine::{
    Convergence, CoreError, Corpus, IdentificationEngine, MatchMode, PreparedVersion, Query,
    QueryPurpose, RuleKind, Step,
};

// 声明所有子模块
pub mod config;
pub mod corpus;
pub mod error;
pub mod probe;
pub mod session;
