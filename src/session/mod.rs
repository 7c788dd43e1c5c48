//! 识别会话管理：会话工厂与进程级单例

pub mod factory;
pub mod global;

pub use factory::SessionFactory;
pub use global::{
    global_session_factory, init_global_corpus, init_global_corpus_with, new_global_session,
};
