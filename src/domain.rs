use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use std::io::Error;
use thiserror::Error;

use crate::report::ReportConfig;

pub const HELP_TEXT: &str = "
outlet-dash - Retail outlet sales dashboard

Navigation:
  ↑/k        Previous section
  ↓/j        Next section
  Enter      Show selected section
  PgUp/PgDn  Scroll section content
  Home/End   Jump to top / bottom of the section

Actions:
  y          Change the establishment year (best outlet section)
  c          Copy current section as text to clipboard

General:
  ?          Show this help
  Esc        Close popup / cancel input
  q          Quit
";

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    IoError(#[from] Error),

    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),

    #[error("Loading failed: {0}")]
    LoadingFailed(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] arboard::Error),
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub event_poll_time: u64,
    pub report: ReportConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            report: ReportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    Year,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    ScrollUp,
    ScrollDown,
    ScrollTop,
    ScrollBottom,
    Enter,
    Exit,
    Help,
    EditYear,
    CopySection,
    RawKey(KeyEvent),
}
