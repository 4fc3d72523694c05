/// Source 模块 - 负责打开只读数据库连接并执行分群聚合查询
///
/// 支持的数据源:
/// - PostgreSQL（生产库）
/// - SQLite（本地文件或内存夹具）
use crate::config::Config;
use crate::error::Result;
use log::info;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
pub use self::postgres::PostgresSource;
#[cfg(feature = "sqlite")]
pub use self::sqlite::SqliteSource;

/// SQL 方言：只影响滑动时间窗口的写法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

/// 数据源 trait - 所有数据库连接必须实现此接口
pub trait SegmentSource {
    /// 数据源名称 (用于日志记录)
    fn name(&self) -> &str;

    /// 查询所使用的 SQL 方言
    fn dialect(&self) -> Dialect;

    /// 执行查询，返回每一行第一列的整数值
    fn query_column(&mut self, sql: &str) -> Result<Vec<i64>>;
}

/// 按配置打开数据源
///
/// 优先级：PostgreSQL > SQLite
pub fn open_source(config: &Config) -> Result<Box<dyn SegmentSource>> {
    #[cfg(feature = "postgres")]
    if let Some(pg_config) = config.source.postgres() {
        info!("Using PostgreSQL source: {}", pg_config.redacted());
        return Ok(Box::new(PostgresSource::connect(pg_config)?));
    }

    #[cfg(feature = "sqlite")]
    if let Some(sqlite_config) = config.source.sqlite() {
        info!("Using SQLite source: {}", sqlite_config.path);
        return Ok(Box::new(SqliteSource::open(&sqlite_config.path)?));
    }

    let _ = config;
    Err(crate::error::Error::Config(
        crate::error::ConfigError::NoSource,
    ))
}
