use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration related error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File operation error
    #[error("File error: {0}")]
    File(#[from] FileError),

    /// Database operation error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Chart rendering error
    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Configuration file parse failed
    #[error("Failed to parse configuration file {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    /// Invalid log level
    #[error("Invalid log level '{level}', valid values: {}", valid_levels.join(", "))]
    InvalidLogLevel {
        level: String,
        valid_levels: Vec<String>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value {field} = '{value}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Missing required configuration: no data source configured
    #[error("At least one data source must be configured (source.postgres/source.sqlite)")]
    NoSource,
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// File already exists
    #[error("File already exists: {path} (use --force to replace)")]
    AlreadyExists { path: PathBuf },

    /// File write failed
    #[error("Failed to write file {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    /// Create directory failed
    #[error("Failed to create directory {path}: {reason}")]
    CreateDirectoryFailed { path: PathBuf, reason: String },
}

/// 数据库错误
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection could not be opened
    #[error("Failed to connect to {backend}: {reason}")]
    ConnectFailed { backend: String, reason: String },

    /// The backend rejected a statement or returned an undecodable row
    #[error("{backend} error: {reason}")]
    Backend { backend: String, reason: String },

    /// A segment query failed to execute or decode
    #[error("Query for {segment} failed: {reason}")]
    QueryFailed { segment: String, reason: String },

    /// An aggregate query produced no row
    #[error("Query for {segment} returned no rows")]
    EmptyResult { segment: String },
}

/// 图表渲染错误
#[derive(Debug, Error)]
pub enum ChartError {
    /// No usable TrueType font
    #[error("No usable font found ({reason})")]
    FontUnavailable { reason: String },

    /// Drawing or encoding the image failed
    #[error("Failed to draw chart {path}: {reason}")]
    DrawFailed { path: PathBuf, reason: String },

    /// The image viewer could not be launched
    #[error("Failed to open image viewer for {path}: {reason}")]
    ViewerFailed { path: PathBuf, reason: String },
}

/// 应用程序 Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;

// 辅助宏，用于快速创建错误
#[macro_export]
macro_rules! config_error {
    ($variant:ident { $($field:ident: $value:expr),+ $(,)? }) => {
        $crate::error::Error::Config($crate::error::ConfigError::$variant {
            $($field: $value),+
        })
    };
}

#[macro_export]
macro_rules! database_error {
    ($variant:ident { $($field:ident: $value:expr),+ $(,)? }) => {
        $crate::error::Error::Database($crate::error::DatabaseError::$variant {
            $($field: $value),+
        })
    };
}

#[macro_export]
macro_rules! chart_error {
    ($variant:ident { $($field:ident: $value:expr),+ $(,)? }) => {
        $crate::error::Error::Chart($crate::error::ChartError::$variant {
            $($field: $value),+
        })
    };
}
