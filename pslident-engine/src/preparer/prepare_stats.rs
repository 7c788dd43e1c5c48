//! 负责预处理统计数据的定义、更新与格式化输出

/// 语料库预处理统计信息
/// 记录预处理过程中的各类指标：
/// 1. 版本数 / 去重计数
/// 2. 例外与通配符的关联情况
/// 3. 共有条目与等价分组规模
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrepareStats {
    // ========== 版本统计 ==========
    /// 参与预处理的版本数
    pub versions: usize,
    /// 所有版本规范化时忽略的重复条目总数
    pub ignored_duplicates: usize,

    // ========== 规则统计 ==========
    /// 所有版本共有的条目数
    pub common_entries: usize,
    /// 通配符规则总数（按版本累加）
    pub wildcards: usize,
    /// 成功关联通配符的例外条目数（按版本累加）
    pub mapped_exceptions: usize,
    /// 因缺少通配符被丢弃的例外条目数（按版本累加）
    pub dropped_exceptions: usize,
    /// 同时匹配多个通配符的例外条目数（取第一个）
    pub ambiguous_exceptions: usize,

    // ========== 分组统计 ==========
    /// 至少与一个其他版本完全相同的版本数
    pub versions_with_equal: usize,
    /// 忽略 TLD 后至少与一个其他版本相同的版本数
    pub versions_with_equal_without_tld: usize,
}

impl PrepareStats {
    /// 平均每个版本的重复条目数
    pub fn average_duplicates(&self) -> f64 {
        if self.versions == 0 {
            return 0.0;
        }
        self.ignored_duplicates as f64 / self.versions as f64
    }

    /// 格式化输出统计信息（结构化日志）
    pub fn print_stats(&self, total_time: std::time::Duration) {
        log::debug!(
            "Corpus preparation completed | Time: {:?} | Versions: {} | Common entries: {}",
            total_time,
            self.versions,
            self.common_entries
        );

        log::debug!(
            "Duplicate stats: total {} | avg per version {:.2}",
            self.ignored_duplicates,
            self.average_duplicates()
        );

        log::debug!(
            "Exception stats: wildcards {} | mapped {} | dropped {} | ambiguous {}",
            self.wildcards,
            self.mapped_exceptions,
            self.dropped_exceptions,
            self.ambiguous_exceptions
        );

        log::debug!(
            "Equality stats: with equal {} | with equal without tlds {}",
            self.versions_with_equal,
            self.versions_with_equal_without_tld
        );
    }
}
