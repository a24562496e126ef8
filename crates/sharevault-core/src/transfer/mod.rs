//! 文件传输模块
//!
//! 包含:
//! - 请求/响应数据模型
//! - 响应解释器 (上传 ID 解析、下载结果重建、失败分类)
//! - HTTP 客户端 (`POST /api/upload`, `POST /api/download`)
//! - 下载结果的本地保存

pub mod client;
pub mod interpreter;
pub mod saver;

pub use client::{HttpTransferClient, TransferApi};
pub use interpreter::{
    Failure, classify_failure, extract_file_name, interpret_download_response,
    interpret_upload_response,
};
pub use saver::{DirectorySaver, FileSaver};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// 无法识别类型时使用的 MIME
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// 用户选中的待上传文件
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl SelectedFile {
    /// 从内存数据创建，根据文件名猜测 MIME 类型
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = guess_mime_type(Path::new(&name));
        Self {
            name,
            mime_type,
            content,
        }
    }

    /// 读取磁盘上的文件
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            name,
            mime_type: guess_mime_type(path),
            content,
        })
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.content.len())
            .finish()
    }
}

fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

/// 上传请求，每次尝试重新构造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: SelectedFile,
    pub password: String,
}

/// 下载请求 (即 `POST /api/download` 的 JSON 请求体)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub file_id: String,
    pub password: String,
}

/// 上传成功后的响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_id: String,
}

/// 下载成功后重建的文件
#[derive(Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub content: Vec<u8>,
    pub mime_type: String,
    pub suggested_file_name: String,
}

impl std::fmt::Debug for DownloadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadResult")
            .field("mime_type", &self.mime_type)
            .field("suggested_file_name", &self.suggested_file_name)
            .field("size", &self.content.len())
            .finish()
    }
}
