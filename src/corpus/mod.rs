//! 语料库获取：快照目录读取、预处理结果缓存、加载流程

pub mod cache;
pub mod loader;
pub mod snapshot_reader;

pub use cache::CorpusCacheManager;
pub use loader::CorpusLoader;
pub use snapshot_reader::SnapshotReader;
