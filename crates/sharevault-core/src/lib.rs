//! ShareVault Core Library
//!
//! 密码保护文件中转客户端的核心实现库。加密、存储和访问控制全部由后端完成，
//! 客户端只负责收集文件和密码、发起两个 HTTP 请求并解释响应。
//!
//! # 模块
//!
//! - **transfer**: 数据模型、响应解释器、HTTP 客户端和文件保存
//! - **workflow**: 传输控制器 (表单状态 + 上传/下载流程)
//! - **config**: 客户端设置的加载与持久化
//!
//! # 使用示例
//!
//! ## 上传文件
//!
//! ```ignore
//! use sharevault_core::{ClientSettings, DirectorySaver, HttpTransferClient, SelectedFile, TransferController};
//!
//! let settings = ClientSettings::load();
//! let api = HttpTransferClient::new(&settings)?;
//! let saver = DirectorySaver::new(settings.download_dir.clone());
//! let mut controller = TransferController::new(api, saver);
//!
//! controller.select_file(SelectedFile::from_path("report.pdf").await?);
//! controller.set_upload_password("secret");
//! let file_id = controller.upload().await?;
//! ```
//!
//! ## 下载文件
//!
//! ```ignore
//! controller.set_file_identifier(file_id);
//! controller.set_download_password("secret");
//! let saved_to = controller.download().await?;
//! ```

pub mod config;
pub mod error;
pub mod transfer;
pub mod workflow;

pub use config::ClientSettings;
pub use error::{Operation, RequiredInput, TransferError};

// Transfer re-exports
pub use transfer::{
    DirectorySaver, DownloadRequest, DownloadResult, Failure, FileSaver, HttpTransferClient,
    SelectedFile, TransferApi, UploadRequest,
};

// Workflow re-exports
pub use workflow::{TransferController, TransferEvent, TransferState};
