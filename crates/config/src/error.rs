//! Error types for configuration loading and validation.

use std::{
    cmp::{max, min},
    fmt::Write as _,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Coarse classification of a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The same mode name appears more than once.
    DuplicateMode,
    /// A dock item entry is empty.
    InvalidDockItem,
    /// The document could not be read, parsed, or has an unusable value.
    ParseFailure,
}

#[derive(Debug, Error, Clone)]
/// Errors produced while loading, parsing, or validating a configuration.
pub enum Error {
    #[error("{message}")]
    /// I/O or filesystem read error.
    Read {
        /// Optional path associated with the read error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// JSON parse error with a concrete line/column location and excerpt.
    Parse {
        /// Optional path associated with the parse error.
        path: Option<PathBuf>,
        /// 1-based line number.
        line: usize,
        /// 1-based column number.
        col: usize,
        /// Human-readable error message.
        message: String,
        /// Rendered excerpt including a caret at the error location.
        excerpt: String,
    },
    #[error("duplicate focus mode {mode:?}")]
    /// A mode name is defined more than once.
    DuplicateMode {
        /// Optional path of the offending document.
        path: Option<PathBuf>,
        /// The repeated mode name.
        mode: String,
    },
    #[error("mode {mode:?}: dock item #{index} is empty")]
    /// A `dockItems` entry is empty or whitespace.
    InvalidDockItem {
        /// Optional path of the offending document.
        path: Option<PathBuf>,
        /// Mode whose profile holds the bad entry.
        mode: String,
        /// 0-based index into `dockItems`.
        index: usize,
    },
    #[error("mode {mode:?}: wallpaper path {value:?} must be absolute or start with ~/")]
    /// A `wallpaperPath` that cannot be turned into an absolute path.
    InvalidWallpaperPath {
        /// Optional path of the offending document.
        path: Option<PathBuf>,
        /// Mode whose profile holds the bad entry.
        mode: String,
        /// The value as written.
        value: String,
    },
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateMode { .. } => ErrorKind::DuplicateMode,
            Self::InvalidDockItem { .. } => ErrorKind::InvalidDockItem,
            Self::Read { .. } | Self::Parse { .. } | Self::InvalidWallpaperPath { .. } => {
                ErrorKind::ParseFailure
            }
        }
    }

    /// Render a human-friendly error message including location and an excerpt when available.
    pub fn pretty(&self) -> String {
        match self {
            Self::Read { path, message } => match path {
                Some(p) => format!("Read error at {}: {}", p.display(), message),
                None => format!("Read error: {}", message),
            },
            Self::Parse {
                path,
                line,
                col,
                message,
                excerpt,
            } => match path {
                Some(p) => format!(
                    "Config parse error at {}:{}:{}\n{}\n{}",
                    p.display(),
                    line,
                    col,
                    message,
                    excerpt
                ),
                None => format!(
                    "Config parse error at line {}, column {}\n{}\n{}",
                    line, col, message, excerpt
                ),
            },
            Self::DuplicateMode { path, .. }
            | Self::InvalidDockItem { path, .. }
            | Self::InvalidWallpaperPath { path, .. } => match path {
                Some(p) => format!("Config validation error at {}\n{}", p.display(), self),
                None => format!("Config validation error\n{}", self),
            },
        }
    }

    /// Access the optional path attached to this error.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. }
            | Self::Parse { path, .. }
            | Self::DuplicateMode { path, .. }
            | Self::InvalidDockItem { path, .. }
            | Self::InvalidWallpaperPath { path, .. } => path.as_deref(),
        }
    }
}

/// Build a small 2–3 line excerpt with a caret at `(line_no, col_no)`.
pub(crate) fn excerpt_at(source: &str, line_no: usize, col_no: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let total = lines.len();
    let start = max(1usize, line_no.saturating_sub(2));
    let end = min(total, line_no + 1);

    let mut out = String::new();
    for n in start..=end {
        let text = lines.get(n - 1).copied().unwrap_or("");
        let _ignored = writeln!(out, " {:>4} | {}", n, text);
        if n == line_no {
            let prefix = format!(" {:>4} | ", n);
            let _ignored = writeln!(
                out,
                "{}{}^",
                " ".repeat(prefix.len()),
                " ".repeat(col_no.saturating_sub(1))
            );
        }
    }
    out
}
