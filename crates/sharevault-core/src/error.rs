//! 传输错误分类
//!
//! 每一种错误都对应一条不同的、可直接展示给用户的提示信息。
//! 所有错误只终止当前这一次尝试，不会自动重试，表单在任何失败后都保持可用。

use std::fmt;
use thiserror::Error;

/// 表单类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Upload,
    Download,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::Download => "download",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 本地校验缺少的输入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredInput {
    /// 上传前未选择文件
    File,
    /// 下载前未填写文件 ID 或密码
    FileIdAndPassword,
}

impl fmt::Display for RequiredInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredInput::File => write!(f, "Please select a file first"),
            RequiredInput::FileIdAndPassword => {
                write!(f, "Please enter both File ID and Password")
            }
        }
    }
}

/// 传输错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// 本地校验失败，请求不会发出
    #[error("{0}")]
    MissingInput(RequiredInput),

    /// HTTP 401
    #[error("Invalid File ID or Password")]
    InvalidCredentials,

    /// HTTP 404
    #[error("File not found or has expired")]
    NotFound,

    /// 其它非 2xx 状态码
    #[error("Server error (HTTP {0}), please try again later")]
    ServerError(u16),

    /// 未收到任何 HTTP 响应
    #[error("Network error: could not reach the server ({0})")]
    NetworkError(String),

    /// 响应格式不符合预期等
    #[error("{}", unknown_message(.0))]
    Unknown(String),

    /// 同一表单已有请求在进行中
    #[error("Another {0} is already in progress")]
    Busy(Operation),
}

fn unknown_message(message: &str) -> String {
    if message.trim().is_empty() {
        "Unknown error".to_string()
    } else {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_distinct() {
        let errors = [
            TransferError::MissingInput(RequiredInput::File),
            TransferError::MissingInput(RequiredInput::FileIdAndPassword),
            TransferError::InvalidCredentials,
            TransferError::NotFound,
            TransferError::ServerError(500),
            TransferError::NetworkError("connection refused".to_string()),
            TransferError::Unknown("missing field `fileId`".to_string()),
            TransferError::Busy(Operation::Download),
        ];

        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_unknown_falls_back_to_generic() {
        assert_eq!(TransferError::Unknown(String::new()).to_string(), "Unknown error");
        assert_eq!(
            TransferError::Unknown("boom".to_string()).to_string(),
            "boom"
        );
    }
}
