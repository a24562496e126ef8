//! 日志面板
//!
//! 保存最近的日志条目，按阈值过滤显示。`tracing::Level` 越详细越大，
//! 所以 `level <= threshold` 即为可见。

use std::collections::VecDeque;
use tracing::Level;

/// 面板最多保留的条目数
pub const MAX_LOGS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

#[derive(Debug)]
pub struct LogPanel {
    entries: VecDeque<LogEntry>,
    threshold: Level,
}

impl LogPanel {
    pub fn new(verbose: bool) -> Self {
        Self {
            entries: VecDeque::with_capacity(MAX_LOGS),
            threshold: if verbose { Level::DEBUG } else { Level::INFO },
        }
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        if self.entries.len() == MAX_LOGS {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            level,
            message: message.into(),
        });
    }

    pub fn visible(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| e.level <= self.threshold)
    }

    pub fn threshold(&self) -> Level {
        self.threshold
    }

    /// 在 INFO 和 DEBUG 之间切换
    pub fn toggle_verbose(&mut self) -> Level {
        self.threshold = if self.threshold >= Level::DEBUG {
            Level::INFO
        } else {
            Level::DEBUG
        };
        self.threshold
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_filters_verbose_entries() {
        let mut panel = LogPanel::new(false);
        panel.push(Level::DEBUG, "multipart body built");
        panel.push(Level::WARN, "upload failed");
        panel.push(Level::TRACE, "poll");

        let shown: Vec<_> = panel.visible().map(|e| e.message.as_str()).collect();
        assert_eq!(shown, vec!["upload failed"]);

        assert_eq!(panel.toggle_verbose(), Level::DEBUG);
        assert_eq!(panel.visible().count(), 2);
        assert_eq!(panel.toggle_verbose(), Level::INFO);
    }

    #[test]
    fn test_oldest_entries_are_dropped() {
        let mut panel = LogPanel::new(true);
        for i in 0..(MAX_LOGS + 3) {
            panel.push(Level::INFO, i.to_string());
        }
        assert_eq!(panel.len(), MAX_LOGS);
        assert_eq!(panel.visible().next().map(|e| e.message.as_str()), Some("3"));
    }
}
