//! ShareVault TUI - 交互式终端界面
//!
//! 上传表单和下载表单放在同一个页面，请求在后台执行，界面保持可操作。
//!
//! # 日志
//!
//! 日志默认显示在 TUI 的"日志"标签页中。
//! 如需输出到文件进行调试，设置 RUST_LOG 环境变量：
//!
//! ```bash
//! RUST_LOG=debug cargo run -p sharevault-tui 2>> /tmp/sharevault.log
//! ```

mod app;
mod log_panel;
mod tui_log;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Tab};
use sharevault_core::ClientSettings;
use tui_log::TuiLogLayer;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = ClientSettings::load();

    // 解析命令行参数（可选的待上传文件路径）
    let file_path = std::env::args().nth(1);

    let mut app = App::new(settings)?;
    if let Some(path) = file_path {
        app.file_path = path;
        app.load_file();
    }

    // 初始化日志系统，发送到 TUI 日志面板
    init_logging(app.event_tx.clone());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

/// 初始化日志系统
///
/// - 总是将日志发送到 TUI 日志面板
/// - 如果设置了 RUST_LOG，同时输出到 stderr（用于调试）
fn init_logging(log_tx: tokio::sync::mpsc::Sender<app::AppEvent>) {
    // 桥接 log crate（sharevault-core 使用）到 tracing
    let _ = tracing_log::LogTracer::init();

    let tui_layer = TuiLogLayer::new(log_tx);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sharevault_core=debug"));

    if std::env::var("RUST_LOG").is_ok() {
        use tracing_subscriber::fmt;

        let stderr_layer = fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tui_layer)
            .with(stderr_layer)
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tui_layer)
            .try_init();
    }
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        // 使用 poll 避免阻塞，让后台请求的结果能及时显示
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                if key.code == KeyCode::Esc
                    || (key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL))
                {
                    return Ok(());
                }

                match key.code {
                    KeyCode::Tab => app.next_tab(),
                    _ if app.tab == Tab::Log => match key.code {
                        KeyCode::Char('d') => app.toggle_log_level(),
                        KeyCode::Char('c') => app.clear_logs(),
                        _ => {}
                    },
                    KeyCode::Up | KeyCode::BackTab => app.previous_field(),
                    KeyCode::Down => app.next_field(),
                    KeyCode::Enter => app.submit(),
                    KeyCode::Backspace => app.backspace(),
                    KeyCode::Char(c) => app.input_char(c),
                    _ => {}
                }
            }
        }

        // 处理后台任务送回的结果
        app.tick();

        // 让出执行权给后台任务
        tokio::task::yield_now().await;
    }
}
