use super::{Dialect, SegmentSource};
use crate::error::{DatabaseError, Error, Result};
use log::{debug, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// SQLite 数据源 - 只读打开，或包装已有连接（测试夹具）
#[derive(Debug)]
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    /// 只读打开数据库文件；文件不存在时报错而不是新建
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening SQLite database (read-only): {}", path.display());

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            Error::Database(DatabaseError::ConnectFailed {
                backend: "SQLite".to_string(),
                reason: format!("{}: {e}", path.display()),
            })
        })?;

        Ok(Self { conn })
    }

    /// 包装已打开的连接
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl SegmentSource for SqliteSource {
    fn name(&self) -> &str {
        "SQLite"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query_column(&mut self, sql: &str) -> Result<Vec<i64>> {
        let query_failed = |e: rusqlite::Error| {
            Error::Database(DatabaseError::Backend {
                backend: "SQLite".to_string(),
                reason: e.to_string(),
            })
        };

        let mut stmt = self.conn.prepare(sql).map_err(query_failed)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .map_err(query_failed)?;

        let values = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(query_failed)?;
        debug!("SQLite query returned {} row(s)", values.len());
        Ok(values)
    }
}
