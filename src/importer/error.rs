// ==========================================
// 生产计划工作流 - XML 导入导出错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// XML 导入导出错误类型
#[derive(Error, Debug)]
pub enum XmlError {
    // ===== 解析错误 =====
    #[error("XML 解析失败 (位置 {position}): {message}")]
    Parse { position: u64, message: String },

    #[error("XML 结构错误: {0}")]
    Malformed(String),

    // ===== 生成错误 =====
    #[error("XML 生成失败: {0}")]
    Build(String),

    // ===== 文档结构错误 =====
    #[error("缺少元素: {0}")]
    MissingElement(String),

    #[error("未知字段: {0}")]
    UnknownField(String),

    #[error("元素 {name} 索引越界: {index}（共 {len} 个）")]
    IndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },

    // ===== 文件错误 =====
    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),
}

/// Result 类型别名
pub type XmlResult<T> = Result<T, XmlError>;
