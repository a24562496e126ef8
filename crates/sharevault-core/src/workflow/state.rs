//! 表单状态

use crate::error::{Operation, TransferError};
use crate::transfer::SelectedFile;

/// 上传/下载表单的全部状态
///
/// 由 [`TransferController`](super::TransferController) 独占并修改，
/// 界面只读取。不做任何持久化。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferState {
    /// 待上传的文件
    pub selected_file: Option<SelectedFile>,
    /// 上传时设置的密码（允许为空，由后端决定）
    pub upload_password: String,
    /// 下载时输入的密码
    pub download_password: String,
    /// 文件 ID：上传成功后写入，或由用户在下载前输入
    pub file_identifier: String,
    /// 最近一次失败
    pub last_error: Option<TransferError>,
    /// 上传请求进行中
    pub uploading: bool,
    /// 下载请求进行中
    pub downloading: bool,
}

impl TransferState {
    /// 展示给用户的错误信息
    pub fn error_message(&self) -> Option<String> {
        self.last_error.as_ref().map(ToString::to_string)
    }

    /// 任一表单有请求进行中
    pub fn is_busy(&self) -> bool {
        self.uploading || self.downloading
    }

    pub fn is_busy_for(&self, operation: Operation) -> bool {
        match operation {
            Operation::Upload => self.uploading,
            Operation::Download => self.downloading,
        }
    }

    pub(crate) fn set_busy(&mut self, operation: Operation, busy: bool) {
        match operation {
            Operation::Upload => self.uploading = busy,
            Operation::Download => self.downloading = busy,
        }
    }
}
