//! UI rendering module

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs, Wrap},
};

use crate::app::{App, Field, Tab};
use sharevault_core::{FileSaver, Operation, TransferApi};
use tracing::Level;

pub fn draw<A: TransferApi + 'static, S: FileSaver>(frame: &mut Frame, app: &App<A, S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Main content
            Constraint::Length(3), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    match app.tab {
        Tab::Transfer => draw_transfer_tab(frame, app, chunks[1]),
        Tab::Log => draw_log_tab(frame, app, chunks[1]),
    }
    draw_status_bar(frame, app, chunks[2]);
}

fn draw_header<A: TransferApi + 'static, S: FileSaver>(
    frame: &mut Frame,
    app: &App<A, S>,
    area: Rect,
) {
    let selected = match app.tab {
        Tab::Transfer => 0,
        Tab::Log => 1,
    };

    let tabs = Tabs::new(vec!["传输", "日志"])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" ShareVault → {} ", app.settings.api_base())),
        )
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Yellow).bold());

    frame.render_widget(tabs, area);
}

fn draw_transfer_tab<A: TransferApi + 'static, S: FileSaver>(
    frame: &mut Frame,
    app: &App<A, S>,
    area: Rect,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    draw_upload_form(frame, app, chunks[0]);
    draw_download_form(frame, app, chunks[1]);
}

fn draw_upload_form<A: TransferApi + 'static, S: FileSaver>(
    frame: &mut Frame,
    app: &App<A, S>,
    area: Rect,
) {
    let state = app.controller.state();
    let selected = match &state.selected_file {
        Some(file) => format!("{} ({} bytes, {})", file.name, file.size(), file.mime_type),
        None => "未选择".to_string(),
    };

    let mut lines = vec![
        field_line(app, Field::FilePath),
        Line::from(format!("  已选择: {}", selected)).fg(Color::Gray),
        field_line(app, Field::UploadPassword),
        Line::default(),
    ];

    if !state.file_identifier.is_empty() && !state.uploading {
        lines.push(Line::from(vec![
            Span::raw("  分享此文件 ID: "),
            Span::styled(state.file_identifier.clone(), Style::default().bold()),
        ]));
    }

    let form = Paragraph::new(lines)
        .block(form_block(" 📤 上传文件 ", app.controller.state().uploading))
        .wrap(Wrap { trim: false });

    frame.render_widget(form, area);
}

fn draw_download_form<A: TransferApi + 'static, S: FileSaver>(
    frame: &mut Frame,
    app: &App<A, S>,
    area: Rect,
) {
    let mut lines = vec![
        field_line(app, Field::FileId),
        field_line(app, Field::DownloadPassword),
        Line::default(),
    ];

    if let Some(path) = &app.last_saved {
        lines.push(Line::from(format!("  上次保存: {}", path.display())).fg(Color::Green));
    }
    lines.push(
        Line::from(format!("  下载目录: {}", app.settings.download_dir.display())).fg(Color::Gray),
    );

    let form = Paragraph::new(lines)
        .block(form_block(" 📥 下载文件 ", app.controller.state().downloading))
        .wrap(Wrap { trim: false });

    frame.render_widget(form, area);
}

fn form_block(title: &str, busy: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if busy {
        block
            .title_bottom(" ⏳ 请求进行中... ")
            .border_style(Style::default().fg(Color::Yellow))
    } else {
        block
    }
}

fn field_line<'a, A: TransferApi + 'static, S: FileSaver>(
    app: &'a App<A, S>,
    field: Field,
) -> Line<'a> {
    let value = app.field_value(field);
    let shown = if field.is_secret() {
        "•".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let focused = app.tab == Tab::Transfer && app.focus == field;
    let marker = if focused { "▶ " } else { "  " };
    let cursor = if focused { "█" } else { "" };
    let label_style = if focused {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::styled(format!("{}{}: ", marker, field.label()), label_style),
        Span::raw(shown),
        Span::raw(cursor),
    ])
}

fn draw_log_tab<A: TransferApi + 'static, S: FileSaver>(
    frame: &mut Frame,
    app: &App<A, S>,
    area: Rect,
) {
    let height = area.height.saturating_sub(2) as usize;
    let visible: Vec<_> = app.logs.visible().collect();
    let items: Vec<ListItem> = visible
        .iter()
        .skip(visible.len().saturating_sub(height))
        .map(|entry| {
            let (icon, color) = match entry.level {
                Level::ERROR => ("❌", Color::Red),
                Level::WARN => ("⚠️", Color::Yellow),
                Level::INFO => ("ℹ️", Color::White),
                _ => ("🔍", Color::DarkGray),
            };
            ListItem::new(format!("{} {}", icon, entry.message)).style(Style::default().fg(color))
        })
        .collect();

    let title = format!(
        " 📋 日志 {}/{} (≤ {}) [d]切换级别 [c]清空 ",
        visible.len(),
        app.logs.len(),
        app.logs.threshold()
    );
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(list, area);
}

fn draw_status_bar<A: TransferApi + 'static, S: FileSaver>(
    frame: &mut Frame,
    app: &App<A, S>,
    area: Rect,
) {
    let state = app.controller.state();
    let mode_text = if state.is_busy_for(Operation::Upload) {
        " 📤 上传中 "
    } else if state.is_busy_for(Operation::Download) {
        " 📥 下载中 "
    } else if state.last_error.is_some() {
        " ⚠️  出错 "
    } else {
        " ⏸️  空闲 "
    };

    let form_hint = match (app.focus, app.focus.operation()) {
        (Field::FilePath, _) => "[Enter]读取文件",
        (_, Operation::Upload) => "[Enter]上传",
        (_, Operation::Download) => "[Enter]下载",
    };

    let status = Paragraph::new(format!(
        "{}│ {} │ {} [↑/↓]切换输入 [Tab]切换标签 [Esc]退出",
        mode_text, app.status_message, form_hint
    ))
    .block(Block::default().borders(Borders::ALL));

    frame.render_widget(status, area);
}
