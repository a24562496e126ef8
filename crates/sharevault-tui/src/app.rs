//! Application state
//!
//! 界面只在主循环里修改控制器；网络请求放到后台任务执行，
//! 结果通过 `event_tx` 送回主循环再交给控制器处理。

use crate::log_panel::LogPanel;
use sharevault_core::{
    ClientSettings, DirectorySaver, DownloadResult, FileSaver, HttpTransferClient, Operation,
    SelectedFile, TransferApi, TransferController, TransferError,
};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::Level;

/// 主循环事件
#[derive(Debug)]
pub enum AppEvent {
    /// 来自 tracing 的日志
    LogMessage { level: Level, message: String },
    /// 文件读取完成
    FileLoaded(Result<SelectedFile, String>),
    /// 上传请求完成
    UploadFinished(Result<String, TransferError>),
    /// 下载请求完成
    DownloadFinished(Result<DownloadResult, TransferError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Transfer,
    Log,
}

/// 可编辑的输入框
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FilePath,
    UploadPassword,
    FileId,
    DownloadPassword,
}

impl Field {
    const ALL: [Field; 4] = [
        Field::FilePath,
        Field::UploadPassword,
        Field::FileId,
        Field::DownloadPassword,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::FilePath => "文件路径",
            Field::UploadPassword => "加密密码",
            Field::FileId => "文件 ID",
            Field::DownloadPassword => "访问密码",
        }
    }

    pub fn is_secret(self) -> bool {
        matches!(self, Field::UploadPassword | Field::DownloadPassword)
    }

    pub fn operation(self) -> Operation {
        match self {
            Field::FilePath | Field::UploadPassword => Operation::Upload,
            Field::FileId | Field::DownloadPassword => Operation::Download,
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

pub struct App<A: TransferApi + 'static = HttpTransferClient, S: FileSaver = DirectorySaver> {
    pub controller: TransferController<A, S>,
    pub settings: ClientSettings,
    pub tab: Tab,
    pub focus: Field,
    pub file_path: String,
    pub logs: LogPanel,
    pub status_message: String,
    pub last_saved: Option<PathBuf>,
    pub event_tx: mpsc::Sender<AppEvent>,
    event_rx: mpsc::Receiver<AppEvent>,
}

impl App {
    pub fn new(settings: ClientSettings) -> anyhow::Result<Self> {
        let api = HttpTransferClient::new(&settings)?;
        let saver = DirectorySaver::new(settings.download_dir.clone());
        Ok(Self::with_controller(
            TransferController::new(api, saver),
            settings,
        ))
    }
}

impl<A: TransferApi + 'static, S: FileSaver> App<A, S> {
    pub fn with_controller(controller: TransferController<A, S>, settings: ClientSettings) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        let logs = LogPanel::new(settings.verbose);

        let mut app = Self {
            controller,
            settings,
            tab: Tab::Transfer,
            focus: Field::FilePath,
            file_path: String::new(),
            logs,
            status_message: "就绪".to_string(),
            last_saved: None,
            event_tx,
            event_rx,
        };
        app.logs.push(Level::INFO, "ShareVault TUI 启动");
        let api_base = format!("后端地址: {}", app.settings.api_base());
        app.logs.push(Level::INFO, api_base);
        app
    }

    // ------------------------------------------------------------------
    // 输入
    // ------------------------------------------------------------------

    pub fn field_value(&self, field: Field) -> &str {
        let state = self.controller.state();
        match field {
            Field::FilePath => &self.file_path,
            Field::UploadPassword => &state.upload_password,
            Field::FileId => &state.file_identifier,
            Field::DownloadPassword => &state.download_password,
        }
    }

    fn set_field(&mut self, field: Field, value: String) {
        match field {
            Field::FilePath => self.file_path = value,
            Field::UploadPassword => self.controller.set_upload_password(value),
            Field::FileId => self.controller.set_file_identifier(value),
            Field::DownloadPassword => self.controller.set_download_password(value),
        }
    }

    /// 请求进行中的表单只读，完成后的状态更新不会覆盖新输入
    fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) {
        if self.controller.state().is_busy_for(self.focus.operation()) {
            self.set_status("⏳ 请求进行中，暂不能修改".to_string());
            return;
        }
        let mut value = self.field_value(self.focus).to_string();
        edit(&mut value);
        self.set_field(self.focus, value);
    }

    pub fn input_char(&mut self, c: char) {
        self.edit_focused(|value| value.push(c));
    }

    pub fn backspace(&mut self) {
        self.edit_focused(|value| {
            value.pop();
        });
    }

    pub fn next_field(&mut self) {
        let idx = (self.focus.index() + 1) % Field::ALL.len();
        self.focus = Field::ALL[idx];
    }

    pub fn previous_field(&mut self) {
        let idx = self
            .focus
            .index()
            .checked_sub(1)
            .unwrap_or(Field::ALL.len() - 1);
        self.focus = Field::ALL[idx];
    }

    pub fn next_tab(&mut self) {
        self.tab = match self.tab {
            Tab::Transfer => Tab::Log,
            Tab::Log => Tab::Transfer,
        };
    }

    /// Enter: 在文件路径框读取文件，在其它框提交所在的表单
    pub fn submit(&mut self) {
        match self.focus {
            Field::FilePath => self.load_file(),
            Field::UploadPassword => self.start_upload(),
            Field::FileId | Field::DownloadPassword => self.start_download(),
        }
    }

    // ------------------------------------------------------------------
    // 请求
    // ------------------------------------------------------------------

    pub fn load_file(&mut self) {
        let path = PathBuf::from(self.file_path.trim());
        if path.as_os_str().is_empty() {
            self.set_status("请输入文件路径".to_string());
            return;
        }

        self.set_status(format!("读取 {}...", path.display()));
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = SelectedFile::from_path(&path)
                .await
                .map_err(|e| format!("无法读取 {}: {}", path.display(), e));
            let _ = tx.send(AppEvent::FileLoaded(result)).await;
        });
    }

    pub fn start_upload(&mut self) {
        let request = match self.controller.submit_upload() {
            Ok(request) => request,
            Err(e) => {
                self.report(&e);
                return;
            }
        };

        self.set_status(format!("📤 正在上传 {}...", request.file.name));
        let api = self.controller.api();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let outcome = api.upload(&request).await;
            let _ = tx.send(AppEvent::UploadFinished(outcome)).await;
        });
    }

    pub fn start_download(&mut self) {
        let request = match self.controller.submit_download() {
            Ok(request) => request,
            Err(e) => {
                self.report(&e);
                return;
            }
        };

        self.set_status(format!("📥 正在下载 {}...", request.file_id));
        let api = self.controller.api();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let outcome = api.download(&request).await;
            let _ = tx.send(AppEvent::DownloadFinished(outcome)).await;
        });
    }

    // ------------------------------------------------------------------
    // 事件
    // ------------------------------------------------------------------

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::LogMessage { level, message } => self.logs.push(level, message),
            AppEvent::FileLoaded(Ok(file)) => {
                self.set_status(format!("已选择 {} ({} bytes)", file.name, file.size()));
                self.controller.select_file(file);
                self.focus = Field::UploadPassword;
            }
            AppEvent::FileLoaded(Err(message)) => {
                self.controller.clear_file();
                self.logs.push(Level::ERROR, message.clone());
                self.set_status(format!("❌ {}", message));
            }
            AppEvent::UploadFinished(outcome) => match self.controller.complete_upload(outcome) {
                Ok(file_id) => {
                    self.set_status(format!("✅ 上传成功，分享此文件 ID: {}", file_id));
                }
                Err(e) => self.report(&e),
            },
            AppEvent::DownloadFinished(outcome) => {
                match self.controller.complete_download(outcome) {
                    Ok(path) => {
                        self.set_status(format!("✅ 已保存: {}", path.display()));
                        self.last_saved = Some(path);
                    }
                    Err(e) => self.report(&e),
                }
            }
        }
    }

    /// 处理所有待处理事件（非阻塞）
    pub fn tick(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }
    }

    // ------------------------------------------------------------------
    // 日志
    // ------------------------------------------------------------------

    pub fn toggle_log_level(&mut self) {
        let level = self.logs.toggle_verbose();
        self.set_status(format!("日志级别: {}", level));
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    fn set_status(&mut self, message: String) {
        self.status_message = message;
    }

    fn report(&mut self, error: &TransferError) {
        self.logs.push(Level::WARN, error.to_string());
        self.set_status(format!("❌ {}", error));
    }

    #[cfg(test)]
    async fn next_event(&mut self) -> Option<AppEvent> {
        self.event_rx.recv().await
    }
}
