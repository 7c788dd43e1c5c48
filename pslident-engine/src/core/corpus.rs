use super::prepared::{PreparedVersion, VersionRecord};

/// 预处理完成的语料库：按提交时间升序排列的版本列表，构建后只读
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    versions: Vec<PreparedVersion>,
}

impl Corpus {
    /// versions 必须已按时间升序排列
    pub(crate) fn new(versions: Vec<PreparedVersion>) -> Self {
        Self { versions }
    }

    /// 从持久化记录构建语料库（按提交时间重新排序）
    pub fn from_records(mut records: Vec<VersionRecord>) -> Self {
        records.sort_by_key(|r| r.commit_timestamp);

        let mut versions: Vec<PreparedVersion> = Vec::with_capacity(records.len());
        for record in records {
            let shared = versions.last().map(PreparedVersion::common_handle);
            let version = PreparedVersion::from_record(record, shared);
            versions.push(version);
        }

        log::debug!("Corpus restored from records | versions: {}", versions.len());
        Self { versions }
    }

    /// 转换为持久化记录
    pub fn to_records(&self) -> Vec<VersionRecord> {
        self.versions.iter().map(VersionRecord::from).collect()
    }

    pub fn versions(&self) -> &[PreparedVersion] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// 按提交哈希查找版本
    pub fn find(&self, commit_hash: &str) -> Option<&PreparedVersion> {
        self.versions.iter().find(|v| v.commit_hash() == commit_hash)
    }

    /// 为一个识别会话复制全部版本（会话独占，可变部分互不影响）
    pub fn session_copy(&self) -> Vec<PreparedVersion> {
        self.versions.to_vec()
    }
}
