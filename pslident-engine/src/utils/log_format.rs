use std::fmt::{self, Write};

// ======================== 核心：零堆分配字符串格式化 ========================
/// 截断预览 - 超过最大长度时以省略号结尾
#[inline(always)]
pub fn preview_compact<'a>(s: &'a str, max_len: usize) -> impl fmt::Display + 'a {
    struct CompactView<'a> {
        source: &'a str,
        max_length: usize,
    }

    impl<'a> fmt::Display for CompactView<'a> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            for (count, ch) in self.source.chars().enumerate() {
                if count >= self.max_length {
                    return f.write_str("…");
                }
                f.write_char(ch)?;
            }
            Ok(())
        }
    }

    CompactView {
        source: s,
        max_length: max_len,
    }
}

// ======================== 衍生：规则列表日志格式化 ========================
/// 规则列表日志格式化（基于preview_compact）
/// 格式：[rule1, rule2, ...] (total: N)
pub fn preview_rules<S: AsRef<str>>(rules: &[S]) -> String {
    if rules.is_empty() {
        return "[empty]".to_string();
    }

    const MAX_COUNT: usize = 10; // 最多显示10条规则
    const MAX_RULE_LEN: usize = 40; // 每条规则最多40字符

    let mut result = String::with_capacity(MAX_COUNT * (MAX_RULE_LEN + 2) + 20);
    result.push('[');

    for (idx, rule) in rules.iter().take(MAX_COUNT).enumerate() {
        if idx > 0 {
            result.push_str(", ");
        }
        // 写入 String 不会失败
        let _ = write!(result, "{}", preview_compact(rule.as_ref(), MAX_RULE_LEN));
    }

    if rules.len() > MAX_COUNT {
        let _ = write!(result, ", … (total: {})", rules.len());
    }
    result.push(']');

    result
}
