//! 传输控制器
//!
//! 持有表单状态并编排两个请求流程:
//! 1. 校验输入并构造请求 (`submit_*`)
//! 2. 通过 [`TransferApi`] 发出请求
//! 3. 根据结果更新状态 (`complete_*`)，下载成功时调用 [`FileSaver`] 保存
//!
//! 单次下载的状态机:
//!
//! ```text
//! Idle → Validating → MissingInput (终止)
//!                   → Dispatching → Success → Idle
//!                                 → InvalidCredentials | NotFound | ServerError | NetworkError → Idle
//! ```
//!
//! 不做自动重试。同一表单在请求未完成时再次提交会被拒绝。
//! 界面可以把第 2 步放到后台任务里执行，再把结果交回 `complete_*`。

use log::{debug, info, warn};

use crate::error::{Operation, RequiredInput, TransferError};
use crate::transfer::{
    DownloadRequest, DownloadResult, FileSaver, SelectedFile, TransferApi, UploadRequest,
};
use crate::workflow::TransferState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// 控制器事件，用于界面刷新和测试观察
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// 忙碌状态变化
    Busy { operation: Operation, busy: bool },
    /// 上传完成
    Uploaded { file_id: String },
    /// 下载文件已保存
    Saved { path: PathBuf },
    /// 本次尝试失败
    Failed {
        operation: Operation,
        error: TransferError,
    },
}

/// 传输控制器
pub struct TransferController<A: TransferApi, S: FileSaver> {
    api: Arc<A>,
    saver: S,
    state: TransferState,
    events: Option<mpsc::Sender<TransferEvent>>,
}

impl<A: TransferApi, S: FileSaver> TransferController<A, S> {
    pub fn new(api: A, saver: S) -> Self {
        Self::with_shared_api(Arc::new(api), saver)
    }

    pub fn with_shared_api(api: Arc<A>, saver: S) -> Self {
        Self {
            api,
            saver,
            state: TransferState::default(),
            events: None,
        }
    }

    /// 订阅控制器事件
    pub fn with_events(mut self, tx: mpsc::Sender<TransferEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn state(&self) -> &TransferState {
        &self.state
    }

    /// 后端客户端，供界面在后台任务中发请求
    pub fn api(&self) -> Arc<A> {
        Arc::clone(&self.api)
    }

    pub fn saver(&self) -> &S {
        &self.saver
    }

    // ------------------------------------------------------------------
    // 用户输入
    // ------------------------------------------------------------------

    /// 替换待上传文件
    pub fn select_file(&mut self, file: SelectedFile) {
        debug!("Selected {:?}", file);
        self.state.selected_file = Some(file);
    }

    pub fn clear_file(&mut self) {
        self.state.selected_file = None;
    }

    pub fn set_upload_password(&mut self, password: impl Into<String>) {
        self.state.upload_password = password.into();
    }

    pub fn set_download_password(&mut self, password: impl Into<String>) {
        self.state.download_password = password.into();
    }

    pub fn set_file_identifier(&mut self, file_id: impl Into<String>) {
        self.state.file_identifier = file_id.into();
    }

    // ------------------------------------------------------------------
    // 上传
    // ------------------------------------------------------------------

    /// 校验并构造上传请求，成功后进入忙碌状态
    pub fn submit_upload(&mut self) -> Result<UploadRequest, TransferError> {
        self.ensure_idle(Operation::Upload)?;

        let Some(file) = self.state.selected_file.clone() else {
            return Err(self.reject(Operation::Upload, RequiredInput::File));
        };

        let request = UploadRequest {
            file,
            password: self.state.upload_password.clone(),
        };

        self.state.last_error = None;
        self.set_busy(Operation::Upload, true);
        Ok(request)
    }

    /// 应用上传结果，无论成功失败都会退出忙碌状态
    pub fn complete_upload(
        &mut self,
        outcome: Result<String, TransferError>,
    ) -> Result<String, TransferError> {
        let result = match outcome {
            Ok(file_id) => {
                info!("File uploaded, share this ID: {}", file_id);
                self.state.file_identifier = file_id.clone();
                self.state.last_error = None;
                self.emit(TransferEvent::Uploaded {
                    file_id: file_id.clone(),
                });
                Ok(file_id)
            }
            Err(e) => Err(self.fail(Operation::Upload, e)),
        };

        self.set_busy(Operation::Upload, false);
        result
    }

    /// 完整的上传流程
    pub async fn upload(&mut self) -> Result<String, TransferError> {
        let request = self.submit_upload()?;
        let api = self.api();
        let outcome = api.upload(&request).await;
        self.complete_upload(outcome)
    }

    // ------------------------------------------------------------------
    // 下载
    // ------------------------------------------------------------------

    /// 校验并构造下载请求，成功后进入忙碌状态
    pub fn submit_download(&mut self) -> Result<DownloadRequest, TransferError> {
        self.ensure_idle(Operation::Download)?;

        let file_id = self.state.file_identifier.trim().to_string();
        if file_id.is_empty() || self.state.download_password.is_empty() {
            return Err(self.reject(Operation::Download, RequiredInput::FileIdAndPassword));
        }

        let request = DownloadRequest {
            file_id,
            password: self.state.download_password.clone(),
        };

        self.state.last_error = None;
        self.set_busy(Operation::Download, true);
        Ok(request)
    }

    /// 应用下载结果：成功时保存文件并清空输入框，无论结果如何都退出忙碌状态
    pub fn complete_download(
        &mut self,
        outcome: Result<DownloadResult, TransferError>,
    ) -> Result<PathBuf, TransferError> {
        let saved = outcome.and_then(|result| {
            self.saver.save(&result).map_err(|e| {
                TransferError::Unknown(format!(
                    "Failed to save {}: {}",
                    result.suggested_file_name, e
                ))
            })
        });

        let result = match saved {
            Ok(path) => {
                self.state.file_identifier.clear();
                self.state.download_password.clear();
                self.state.last_error = None;
                self.emit(TransferEvent::Saved { path: path.clone() });
                Ok(path)
            }
            Err(e) => Err(self.fail(Operation::Download, e)),
        };

        self.set_busy(Operation::Download, false);
        result
    }

    /// 完整的下载流程
    pub async fn download(&mut self) -> Result<PathBuf, TransferError> {
        let request = self.submit_download()?;
        let api = self.api();
        let outcome = api.download(&request).await;
        self.complete_download(outcome)
    }

    // ------------------------------------------------------------------
    // 内部
    // ------------------------------------------------------------------

    fn ensure_idle(&self, operation: Operation) -> Result<(), TransferError> {
        if self.state.is_busy_for(operation) {
            warn!("Rejected duplicate {} submission", operation);
            return Err(TransferError::Busy(operation));
        }
        Ok(())
    }

    fn reject(&mut self, operation: Operation, missing: RequiredInput) -> TransferError {
        self.fail(operation, TransferError::MissingInput(missing))
    }

    fn fail(&mut self, operation: Operation, error: TransferError) -> TransferError {
        warn!("{} failed: {}", operation, error);
        self.state.last_error = Some(error.clone());
        self.emit(TransferEvent::Failed {
            operation,
            error: error.clone(),
        });
        error
    }

    fn set_busy(&mut self, operation: Operation, busy: bool) {
        if self.state.is_busy_for(operation) == busy {
            return;
        }
        self.state.set_busy(operation, busy);
        self.emit(TransferEvent::Busy { operation, busy });
    }

    fn emit(&self, event: TransferEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 返回预设结果的后端桩
    #[derive(Default)]
    struct StubApi {
        upload_result: Mutex<Option<Result<String, TransferError>>>,
        download_result: Mutex<Option<Result<DownloadResult, TransferError>>>,
        calls: AtomicUsize,
        last_upload: Mutex<Option<UploadRequest>>,
        last_download: Mutex<Option<DownloadRequest>>,
    }

    impl StubApi {
        fn uploading(result: Result<String, TransferError>) -> Self {
            let api = Self::default();
            *api.upload_result.lock().unwrap() = Some(result);
            api
        }

        fn downloading(result: Result<DownloadResult, TransferError>) -> Self {
            let api = Self::default();
            *api.download_result.lock().unwrap() = Some(result);
            api
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransferApi for StubApi {
        async fn upload(&self, request: &UploadRequest) -> Result<String, TransferError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_upload.lock().unwrap() = Some(request.clone());
            self.upload_result
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(TransferError::Unknown("no stub".to_string())))
        }

        async fn download(
            &self,
            request: &DownloadRequest,
        ) -> Result<DownloadResult, TransferError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_download.lock().unwrap() = Some(request.clone());
            self.download_result
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(TransferError::Unknown("no stub".to_string())))
        }
    }

    /// 记录保存请求的保存器
    #[derive(Default)]
    struct RecordingSaver {
        saved: Mutex<Vec<DownloadResult>>,
        fail: bool,
    }

    impl FileSaver for RecordingSaver {
        fn save(&self, result: &DownloadResult) -> io::Result<PathBuf> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.saved.lock().unwrap().push(result.clone());
            Ok(PathBuf::from("/downloads").join(&result.suggested_file_name))
        }
    }

    fn sample_result() -> DownloadResult {
        DownloadResult {
            content: b"hello".to_vec(),
            mime_type: "text/plain".to_string(),
            suggested_file_name: "hello.txt".to_string(),
        }
    }

    fn busy_transitions(rx: &mut mpsc::Receiver<TransferEvent>) -> Vec<bool> {
        let mut transitions = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let TransferEvent::Busy { busy, .. } = event {
                transitions.push(busy);
            }
        }
        transitions
    }

    #[tokio::test]
    async fn test_upload_stores_file_id() {
        let mut controller = TransferController::new(
            StubApi::uploading(Ok("abc123".to_string())),
            RecordingSaver::default(),
        );
        controller.select_file(SelectedFile::new("a.txt", vec![7; 10]));
        controller.set_upload_password("secret");

        let file_id = controller.upload().await.unwrap();

        assert_eq!(file_id, "abc123");
        assert_eq!(controller.state().file_identifier, "abc123");
        assert_eq!(controller.state().error_message(), None);
        assert!(!controller.state().is_busy());

        let sent = controller.api().last_upload.lock().unwrap().clone().unwrap();
        assert_eq!(sent.password, "secret");
        assert_eq!(sent.file.size(), 10);
    }

    #[tokio::test]
    async fn test_upload_allows_empty_password() {
        let mut controller = TransferController::new(
            StubApi::uploading(Ok("id".to_string())),
            RecordingSaver::default(),
        );
        controller.select_file(SelectedFile::new("a.txt", vec![1]));

        assert!(controller.upload().await.is_ok());
    }

    #[tokio::test]
    async fn test_upload_without_file_does_not_dispatch() {
        let mut controller = TransferController::new(
            StubApi::uploading(Ok("abc123".to_string())),
            RecordingSaver::default(),
        );
        controller.set_upload_password("secret");

        let err = controller.upload().await.unwrap_err();

        assert_eq!(err, TransferError::MissingInput(RequiredInput::File));
        assert_eq!(controller.api().calls(), 0);
        assert_eq!(
            controller.state().error_message(),
            Some("Please select a file first".to_string())
        );
        assert!(!controller.state().is_busy());
    }

    #[tokio::test]
    async fn test_upload_failure_sets_message() {
        let mut controller = TransferController::new(
            StubApi::uploading(Err(TransferError::Unknown(
                "missing field `fileId`".to_string(),
            ))),
            RecordingSaver::default(),
        );
        controller.select_file(SelectedFile::new("a.txt", vec![1]));

        assert!(controller.upload().await.is_err());
        assert_eq!(
            controller.state().error_message(),
            Some("missing field `fileId`".to_string())
        );
        assert!(controller.state().file_identifier.is_empty());
        assert!(!controller.state().uploading);
    }

    #[tokio::test]
    async fn test_download_requires_id_and_password() {
        for (file_id, password) in [("", "pw"), ("abc", ""), ("  ", "pw"), ("", "")] {
            let mut controller = TransferController::new(
                StubApi::downloading(Ok(sample_result())),
                RecordingSaver::default(),
            );
            controller.set_file_identifier(file_id);
            controller.set_download_password(password);

            let err = controller.download().await.unwrap_err();
            assert_eq!(
                err,
                TransferError::MissingInput(RequiredInput::FileIdAndPassword)
            );
            assert_eq!(controller.api().calls(), 0);
            assert!(!controller.state().downloading);
        }
    }

    #[tokio::test]
    async fn test_download_saves_and_resets_fields() {
        let mut controller = TransferController::new(
            StubApi::downloading(Ok(sample_result())),
            RecordingSaver::default(),
        );
        controller.set_file_identifier(" abc123 ");
        controller.set_download_password("secret");

        let path = controller.download().await.unwrap();

        assert_eq!(path, PathBuf::from("/downloads/hello.txt"));
        assert_eq!(controller.saver().saved.lock().unwrap().len(), 1);
        assert!(controller.state().file_identifier.is_empty());
        assert!(controller.state().download_password.is_empty());
        assert_eq!(controller.state().last_error, None);

        let sent = controller.api().last_download.lock().unwrap().clone().unwrap();
        assert_eq!(sent.file_id, "abc123");
    }

    #[tokio::test]
    async fn test_download_failure_keeps_inputs() {
        let mut controller = TransferController::new(
            StubApi::downloading(Err(TransferError::NotFound)),
            RecordingSaver::default(),
        );
        controller.set_file_identifier("abc123");
        controller.set_download_password("secret");

        let err = controller.download().await.unwrap_err();

        assert_eq!(err, TransferError::NotFound);
        assert_eq!(controller.state().file_identifier, "abc123");
        assert_eq!(controller.state().download_password, "secret");
        assert!(controller.saver().saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let saver = RecordingSaver {
            fail: true,
            ..Default::default()
        };
        let mut controller =
            TransferController::new(StubApi::downloading(Ok(sample_result())), saver);
        controller.set_file_identifier("abc123");
        controller.set_download_password("secret");

        let err = controller.download().await.unwrap_err();

        assert!(matches!(err, TransferError::Unknown(ref m) if m.contains("hello.txt")));
        assert!(!controller.state().downloading);
        assert_eq!(controller.state().file_identifier, "abc123");
    }

    #[tokio::test]
    async fn test_busy_clears_exactly_once_on_every_path() {
        let outcomes = [
            Ok(sample_result()),
            Err(TransferError::InvalidCredentials),
            Err(TransferError::NotFound),
            Err(TransferError::ServerError(500)),
            Err(TransferError::NetworkError("refused".to_string())),
        ];

        for outcome in outcomes {
            let (tx, mut rx) = mpsc::channel(16);
            let mut controller = TransferController::new(
                StubApi::downloading(outcome.clone()),
                RecordingSaver::default(),
            )
            .with_events(tx);
            controller.set_file_identifier("abc123");
            controller.set_download_password("secret");

            let _ = controller.download().await;

            assert_eq!(busy_transitions(&mut rx), vec![true, false], "{:?}", outcome);
            assert!(!controller.state().is_busy());
        }
    }

    #[tokio::test]
    async fn test_upload_busy_clears_exactly_once_on_every_path() {
        let outcomes = [
            Ok("abc123".to_string()),
            Err(TransferError::ServerError(401)),
            Err(TransferError::ServerError(404)),
            Err(TransferError::ServerError(500)),
            Err(TransferError::NetworkError("refused".to_string())),
            Err(TransferError::Unknown("missing field `fileId`".to_string())),
        ];

        for outcome in outcomes {
            let (tx, mut rx) = mpsc::channel(16);
            let mut controller = TransferController::new(
                StubApi::uploading(outcome.clone()),
                RecordingSaver::default(),
            )
            .with_events(tx);
            controller.select_file(SelectedFile::new("a.txt", vec![1; 4]));
            controller.set_upload_password("secret");

            let result = controller.upload().await;

            assert_eq!(result, outcome);
            assert_eq!(busy_transitions(&mut rx), vec![true, false], "{:?}", outcome);
            assert!(!controller.state().is_busy());
        }
    }

    #[test]
    fn test_duplicate_submit_is_rejected() {
        let mut controller =
            TransferController::new(StubApi::default(), RecordingSaver::default());
        controller.set_file_identifier("abc123");
        controller.set_download_password("secret");

        let request = controller.submit_download().unwrap();
        assert!(controller.state().downloading);

        let err = controller.submit_download().unwrap_err();
        assert_eq!(err, TransferError::Busy(Operation::Download));
        // 拒绝不影响进行中的请求
        assert_eq!(controller.state().last_error, None);
        assert!(controller.state().downloading);

        // 另一个表单仍可用
        controller.select_file(SelectedFile::new("a.txt", vec![1]));
        assert!(controller.submit_upload().is_ok());

        controller
            .complete_download(Err(TransferError::InvalidCredentials))
            .unwrap_err();
        assert_eq!(request.file_id, "abc123");
        assert!(!controller.state().downloading);
        assert!(controller.state().uploading);

        // 完成后可以再次提交
        assert!(controller.submit_download().is_ok());
    }

    #[test]
    fn test_events_report_outcomes() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut controller =
            TransferController::new(StubApi::default(), RecordingSaver::default())
                .with_events(tx);

        controller.select_file(SelectedFile::new("a.txt", vec![1]));
        controller.submit_upload().unwrap();
        controller.complete_upload(Ok("xyz".to_string())).unwrap();

        let events: Vec<TransferEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            events,
            vec![
                TransferEvent::Busy {
                    operation: Operation::Upload,
                    busy: true
                },
                TransferEvent::Uploaded {
                    file_id: "xyz".to_string()
                },
                TransferEvent::Busy {
                    operation: Operation::Upload,
                    busy: false
                },
            ]
        );
    }
}
