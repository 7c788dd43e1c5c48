//! 全局错误类型定义

use pslident_engine::CoreError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PslError {
    // 内核错误（预处理 / 识别）
    #[error("内核处理失败：{0}")]
    Core(#[from] CoreError),

    // 语料库相关错误
    #[error("语料库不可用：{0}")]
    CorpusUnavailable(String),
    #[error("语料库加载失败：{0}")]
    CorpusLoadError(String),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),
    #[error("MessagePack序列化/反序列化失败：{0}")]
    MsgPackError(String),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
}

// 全局Result类型
pub type PslResult<T> = Result<T, PslError>;
