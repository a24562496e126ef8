//! 响应解释器
//!
//! 给定一个 HTTP 响应（或失败），决定传输控制器下一步该做什么：
//! 保存文件 ID、触发文件保存，或展示一条具体的错误信息。
//!
//! # 失败分类
//!
//! | 输入 | 下载 | 上传 |
//! |---|---|---|
//! | HTTP 401 | `InvalidCredentials` | `ServerError` |
//! | HTTP 404 | `NotFound` | `ServerError` |
//! | 其它状态码 | `ServerError` | `ServerError` |
//! | 无响应 | `NetworkError` | `NetworkError` |
//!
//! 401/404 只在下载接口上有"凭据错误"和"文件不存在"的含义。

use crate::error::TransferError;
use crate::transfer::{DEFAULT_MIME_TYPE, DownloadResult, UploadResponse};
use log::debug;
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*(?:"([^"]*)"|([^;]*))"#).unwrap()
});

static FILENAME_EXT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*filename\*\s*=\s*([\w!#$&+.^`|~-]+)'[^']*'([^;]*)").unwrap()
});

/// 请求失败的原始形态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// 收到了非 2xx 的 HTTP 响应
    Status(StatusCode),
    /// 连接层失败，没有任何 HTTP 状态
    NoResponse(String),
}

impl From<&reqwest::Error> for Failure {
    fn from(e: &reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Failure::Status(status),
            None => Failure::NoResponse(e.to_string()),
        }
    }
}

/// 把下载失败映射为错误分类
pub fn classify_failure(failure: Failure) -> TransferError {
    match failure {
        Failure::Status(status) => match status.as_u16() {
            401 => TransferError::InvalidCredentials,
            404 => TransferError::NotFound,
            code => TransferError::ServerError(code),
        },
        Failure::NoResponse(reason) => TransferError::NetworkError(reason),
    }
}

/// 把上传失败映射为错误分类，任何状态码都是 `ServerError`
pub fn classify_upload_failure(failure: Failure) -> TransferError {
    match failure {
        Failure::Status(status) => TransferError::ServerError(status.as_u16()),
        Failure::NoResponse(reason) => TransferError::NetworkError(reason),
    }
}

/// 解析上传响应，返回文件 ID
pub fn interpret_upload_response(body: &[u8]) -> Result<String, TransferError> {
    let response: UploadResponse =
        serde_json::from_slice(body).map_err(|e| TransferError::Unknown(e.to_string()))?;

    if response.file_id.is_empty() {
        return Err(TransferError::Unknown(
            "server returned an empty file ID".to_string(),
        ));
    }

    Ok(response.file_id)
}

/// 从下载响应重建文件
///
/// MIME 类型取自 `content-type`，缺失时为 `application/octet-stream`；
/// 文件名取自 `content-disposition`，缺失时为 `file-<毫秒时间戳>`。
pub fn interpret_download_response(content: Vec<u8>, headers: &HeaderMap) -> DownloadResult {
    let mime_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string();

    // 有些服务端直接发送 UTF-8 原始字节，`to_str` 会拒绝
    let suggested_file_name = headers
        .get(CONTENT_DISPOSITION)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .and_then(|v| extract_file_name(&v))
        .unwrap_or_else(placeholder_file_name);

    debug!(
        "Download response: {} bytes, type={}, name={}",
        content.len(),
        mime_type,
        suggested_file_name
    );

    DownloadResult {
        content,
        mime_type,
        suggested_file_name,
    }
}

/// 从 `content-disposition` 中提取文件名
///
/// 优先使用 `filename*=UTF-8''...`，其次 `filename="..."` 或 `filename=...`。
/// 路径部分会被去掉，空文件名视为不存在。
pub fn extract_file_name(header: &str) -> Option<String> {
    let extended = FILENAME_EXT_PATTERN.captures(header).and_then(|caps| {
        let charset = caps.get(1)?.as_str();
        let raw = caps.get(2)?.as_str().trim();
        let decoded = percent_decode_str(raw);
        if charset.eq_ignore_ascii_case("utf-8") {
            decoded.decode_utf8().ok().map(|s| s.into_owned())
        } else {
            Some(decoded.decode_utf8_lossy().into_owned())
        }
    });

    let plain = || {
        FILENAME_PATTERN.captures(header).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().trim().to_string())
        })
    };

    extended
        .and_then(|name| sanitize_file_name(&name))
        .or_else(|| plain().and_then(|name| sanitize_file_name(&name)))
}

/// 去掉目录部分，避免服务端给出的名字跳出下载目录
fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() || base == "." || base == ".." {
        None
    } else {
        Some(base.to_string())
    }
}

fn placeholder_file_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("file-{}", millis)
}
