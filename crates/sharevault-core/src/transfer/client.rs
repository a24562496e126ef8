//! HTTP 传输客户端
//!
//! 与后端的两个接口通信：
//!
//! - `POST /api/upload`: multipart 表单 (`file`, `password`)，返回 `{ "fileId": ... }`
//! - `POST /api/download`: JSON `{ "fileId", "password" }`，返回文件二进制内容
//!
//! 加密、存储和权限校验都在后端完成。客户端不做重试，每次失败都直接返回给调用者。

use log::{debug, info, warn};

use crate::config::ClientSettings;
use crate::error::TransferError;
use crate::transfer::interpreter::{
    Failure, classify_failure, classify_upload_failure, interpret_download_response,
    interpret_upload_response,
};
use crate::transfer::{DownloadRequest, DownloadResult, UploadRequest};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

/// 后端接口抽象
///
/// 生产环境使用 [`HttpTransferClient`]，测试中可以替换为桩实现。
#[async_trait]
pub trait TransferApi: Send + Sync {
    /// 上传文件，返回文件 ID
    async fn upload(&self, request: &UploadRequest) -> Result<String, TransferError>;

    /// 下载文件
    async fn download(&self, request: &DownloadRequest) -> Result<DownloadResult, TransferError>;
}

/// 基于 reqwest 的后端客户端
#[derive(Debug, Clone)]
pub struct HttpTransferClient {
    client: reqwest::Client,
    upload_url: String,
    download_url: String,
}

impl HttpTransferClient {
    pub fn new(settings: &ClientSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sharevault/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(settings, client))
    }

    /// 使用已有的 reqwest 客户端
    pub fn with_client(settings: &ClientSettings, client: reqwest::Client) -> Self {
        Self {
            client,
            upload_url: settings.endpoint("/api/upload"),
            download_url: settings.endpoint("/api/download"),
        }
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    /// 发送请求并用接口各自的分类把非 2xx 响应转换为错误
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        classify: fn(Failure) -> TransferError,
    ) -> Result<reqwest::Response, TransferError> {
        let response = builder.send().await.map_err(|e| {
            warn!("Request failed without response: {}", e);
            classify(Failure::from(&e))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Server responded with {}", status);
            return Err(classify(Failure::Status(status)));
        }

        Ok(response)
    }
}

#[async_trait]
impl TransferApi for HttpTransferClient {
    async fn upload(&self, request: &UploadRequest) -> Result<String, TransferError> {
        info!(
            "Uploading {} ({} bytes) to {}",
            request.file.name,
            request.file.size(),
            self.upload_url
        );

        let part = Part::bytes(request.file.content.clone())
            .file_name(request.file.name.clone())
            .mime_str(&request.file.mime_type)
            .map_err(|e| TransferError::Unknown(format!("Invalid MIME type: {}", e)))?;

        let form = Form::new()
            .part("file", part)
            .text("password", request.password.clone());

        let response = self
            .send(
                self.client.post(&self.upload_url).multipart(form),
                classify_upload_failure,
            )
            .await?;

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_upload_failure(Failure::from(&e)))?;

        let file_id = interpret_upload_response(&body)?;
        info!("Upload complete, file ID: {}", file_id);
        Ok(file_id)
    }

    async fn download(&self, request: &DownloadRequest) -> Result<DownloadResult, TransferError> {
        info!("Downloading {} from {}", request.file_id, self.download_url);

        let response = self
            .send(
                self.client.post(&self.download_url).json(request),
                classify_failure,
            )
            .await?;

        let headers = response.headers().clone();
        let content = response
            .bytes()
            .await
            .map_err(|e| classify_failure(Failure::from(&e)))?;

        debug!("Received {} bytes", content.len());
        Ok(interpret_download_response(content.to_vec(), &headers))
    }
}
