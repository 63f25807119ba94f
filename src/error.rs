use thiserror::Error;

/// 应用程序错误类型
///
/// 只用于真正的异常；"未找到元素"、"文字不匹配"这类预期内的失败
/// 通过 `StepResult` 返回，不走错误通道
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 持久化存储错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 站点配置错误
    #[error("配置错误: {0}")]
    Profile(#[from] ProfileError),
    /// 等待页面就绪失败
    #[error("就绪等待失败: {0}")]
    Readiness(#[from] ReadinessError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 截图失败
    #[error("截图失败 ({locator}): {source}")]
    CaptureFailed {
        locator: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 持久化存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 存储内容不是合法的 JSON 对象
    #[error("存储内容无法解析 ({path}): {source}")]
    Corrupted {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 站点配置错误
#[derive(Debug, Error)]
pub enum ProfileError {
    /// 正则无效
    #[error("匹配规则无效 ({pattern}): {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// 就绪等待错误
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// 超时仍未取得 token
    #[error("等待 token 超时 ({waited_ms}ms)")]
    Timeout { waited_ms: u64 },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Storage(StorageError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Storage(StorageError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建截图错误
    pub fn capture_failed(
        locator: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::CaptureFailed {
            locator: locator.into(),
            source: Box::new(source),
        })
    }

    /// 是否为就绪超时
    pub fn is_readiness_timeout(&self) -> bool {
        matches!(self, AppError::Readiness(ReadinessError::Timeout { .. }))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_timeout_message() {
        let err: AppError = ReadinessError::Timeout { waited_ms: 300 }.into();
        assert!(err.is_readiness_timeout());
        assert_eq!(err.to_string(), "就绪等待失败: 等待 token 超时 (300ms)");
    }
}
