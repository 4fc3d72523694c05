use crate::config::LoggingConfig;
use crate::constants::LOG_LEVELS;
use crate::error::{Error, FileError, Result};
use log::SetLoggerError;
use log::{Level, LevelFilter, Metadata, Record};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use chrono::{DateTime, Local, NaiveDate};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};

// 缓存日志级别映射表，避免每次查找时重新构建
static LOG_LEVEL_MAP: LazyLock<HashMap<&'static str, LevelFilter>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("trace", LevelFilter::Trace);
    map.insert("debug", LevelFilter::Debug);
    map.insert("info", LevelFilter::Info);
    map.insert("warn", LevelFilter::Warn);
    map.insert("error", LevelFilter::Error);
    map
});

/// 初始化简单控制台日志（init / completions 命令使用）
pub fn init_simple_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

// 写入文件与 stdout 的简单 Logger
struct SimpleLogger {
    level: LevelFilter,
    file: Arc<Mutex<std::fs::File>>,
}

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.level {
            LevelFilter::Off => false,
            LevelFilter::Error => metadata.level() == Level::Error,
            LevelFilter::Warn => metadata.level() <= Level::Warn,
            LevelFilter::Info => metadata.level() <= Level::Info,
            LevelFilter::Debug => metadata.level() <= Level::Debug,
            LevelFilter::Trace => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let msg = format!(
            "[{}] {} - {}\n",
            record.level(),
            record.target(),
            record.args()
        );

        let _ = std::io::stdout().write_all(msg.as_bytes());

        if let Ok(mut f) = self.file.lock() {
            let _ = f.write_all(msg.as_bytes());
        }
    }

    fn flush(&self) {
        if let Ok(mut f) = self.file.lock() {
            let _ = f.flush();
        }
    }
}

fn file_error(path: &Path, e: &std::io::Error) -> Error {
    Error::File(FileError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// 归档文件名：`<日志文件名>.<YYYY-MM-DD>`
fn archive_path(log_path: &Path, date: NaiveDate) -> Option<PathBuf> {
    let name = log_path.file_name()?.to_string_lossy();
    Some(log_path.with_file_name(format!("{name}.{}", date.format("%Y-%m-%d"))))
}

/// 日志文件最后修改日期早于 `today` 时，按修改日期归档
///
/// 返回归档后的路径；文件不存在、仍是当天的或同名归档已存在时返回 `None`。
pub fn rotate_stale_log(log_path: &Path, today: NaiveDate) -> Result<Option<PathBuf>> {
    let modified = match std::fs::metadata(log_path).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(file_error(log_path, &e)),
    };

    let written_on = DateTime::<Local>::from(modified).date_naive();
    if written_on >= today {
        return Ok(None);
    }

    let Some(archive) = archive_path(log_path, written_on) else {
        return Ok(None);
    };
    if archive.exists() {
        return Ok(None);
    }

    std::fs::rename(log_path, &archive).map_err(|e| file_error(log_path, &e))?;
    Ok(Some(archive))
}

/// 删除超过保留天数的归档日志，返回删除的文件数
pub fn prune_archived_logs(
    log_path: &Path,
    today: NaiveDate,
    retention_days: usize,
) -> Result<usize> {
    let Some(name) = log_path.file_name().map(|n| format!("{}.", n.to_string_lossy())) else {
        return Ok(0);
    };
    let dir = match log_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let retention = i64::try_from(retention_days).unwrap_or(i64::MAX);

    let mut removed = 0;
    for entry in std::fs::read_dir(dir).map_err(|e| file_error(dir, &e))? {
        let entry = entry.map_err(|e| file_error(dir, &e))?;
        let file_name = entry.file_name();
        let Some(date) = file_name
            .to_str()
            .and_then(|n| n.strip_prefix(&name))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };

        if (today - date).num_days() > retention {
            let path = entry.path();
            std::fs::remove_file(&path).map_err(|e| file_error(&path, &e))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// 初始化日志系统
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_log_level(&config.level)?;

    let log_path = Path::new(&config.file);
    let parent_dir = log_path.parent().ok_or_else(|| {
        Error::File(FileError::CreateDirectoryFailed {
            path: log_path.to_path_buf(),
            reason: "无法获取父目录".to_string(),
        })
    })?;

    // 创建日志目录（如果不存在）
    if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
        std::fs::create_dir_all(parent_dir).map_err(|e| {
            Error::File(FileError::CreateDirectoryFailed {
                path: parent_dir.to_path_buf(),
                reason: e.to_string(),
            })
        })?;
    }

    // 按天滚动：跨天后旧文件归档，过期归档删除
    let today = Local::now().date_naive();
    let rotated = rotate_stale_log(log_path, today);
    let pruned = prune_archived_logs(log_path, today, config.retention_days());

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| {
            Error::File(FileError::WriteFailed {
                path: log_path.to_path_buf(),
                reason: e.to_string(),
            })
        })?;

    let logger = SimpleLogger {
        level,
        file: Arc::new(Mutex::new(file)),
    };

    log::set_boxed_logger(Box::new(logger)).map_err(|e: SetLoggerError| {
        Error::File(FileError::WriteFailed {
            path: log_path.to_path_buf(),
            reason: format!("设置日志器失败: {e}"),
        })
    })?;
    log::set_max_level(level);

    log::info!(
        "Logging initialized - level: {:?}, file: {}, retention days: {}",
        level,
        config.file,
        config.retention_days()
    );

    match rotated {
        Ok(Some(archive)) => log::info!("Archived previous log to {}", archive.display()),
        Ok(None) => {}
        Err(e) => log::warn!("Log rotation skipped: {e}"),
    }
    match pruned {
        Ok(0) => {}
        Ok(n) => log::info!("Removed {n} expired log archive(s)"),
        Err(e) => log::warn!("Log cleanup skipped: {e}"),
    }

    Ok(())
}

/// 解析日志级别字符串
pub fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    let lower = level_str.to_lowercase();
    LOG_LEVEL_MAP.get(lower.as_str()).copied().ok_or_else(|| {
        Error::Config(crate::error::ConfigError::InvalidLogLevel {
            level: level_str.to_string(),
            valid_levels: LOG_LEVELS.iter().map(ToString::to_string).collect(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level_case_insensitive() {
        assert_eq!(parse_log_level("DEBUG").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_log_level("warn").unwrap(), LevelFilter::Warn);
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_prune_removes_only_expired_archives() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("segchart.log");
        for name in [
            "segchart.log",
            "segchart.log.2024-06-01",
            "segchart.log.2024-06-25",
            "segchart.log.notadate",
            "other.log.2024-01-01",
        ] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }

        let removed = prune_archived_logs(&log, day(2024, 6, 30), 7).unwrap();
        assert_eq!(removed, 1);
        assert!(!dir.path().join("segchart.log.2024-06-01").exists());
        assert!(dir.path().join("segchart.log.2024-06-25").exists());
        assert!(dir.path().join("segchart.log.notadate").exists());
        assert!(dir.path().join("other.log.2024-01-01").exists());
        assert!(log.exists());
    }

    #[test]
    fn test_rotate_keeps_todays_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("segchart.log");
        std::fs::write(&log, "today").unwrap();

        let today = Local::now().date_naive();
        assert!(rotate_stale_log(&log, today).unwrap().is_none());
        assert!(log.exists());
    }

    #[test]
    fn test_rotate_archives_log_from_earlier_day() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("segchart.log");
        std::fs::write(&log, "yesterday").unwrap();

        let written_on = Local::now().date_naive();
        let next_day = written_on.succ_opt().unwrap();
        let archive = rotate_stale_log(&log, next_day).unwrap().unwrap();

        assert!(!log.exists());
        assert_eq!(
            archive.file_name().unwrap().to_string_lossy(),
            format!("segchart.log.{}", written_on.format("%Y-%m-%d"))
        );
        assert_eq!(std::fs::read_to_string(&archive).unwrap(), "yesterday");
    }

    #[test]
    fn test_rotate_missing_log_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("absent.log");
        assert!(rotate_stale_log(&log, day(2024, 6, 30)).unwrap().is_none());
    }

    #[test]
    fn test_parse_log_level_rejects_unknown() {
        let err = parse_log_level("verbose").unwrap_err();
        assert!(err.to_string().contains("verbose"));
    }
}
