use super::{Dialect, SegmentSource};
use crate::error::{DatabaseError, Error, Result};
use log::{debug, info};
use ::postgres::{Client, NoTls};

/// PostgreSQL 数据源 - 同步客户端，单连接
pub struct PostgresSource {
    client: Client,
}

impl std::fmt::Debug for PostgresSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSource")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

impl PostgresSource {
    /// 从配置建立连接
    pub fn connect(config: &crate::config::PostgresSource) -> Result<Self> {
        info!("Connecting to PostgreSQL at {}", config.redacted());

        let client = Client::connect(&config.connection_string(), NoTls).map_err(|e| {
            Error::Database(DatabaseError::ConnectFailed {
                backend: "PostgreSQL".to_string(),
                reason: e.to_string(),
            })
        })?;

        debug!("PostgreSQL connection established");
        Ok(Self { client })
    }
}

impl SegmentSource for PostgresSource {
    fn name(&self) -> &str {
        "PostgreSQL"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn query_column(&mut self, sql: &str) -> Result<Vec<i64>> {
        let rows = self.client.query(sql, &[]).map_err(|e| {
            Error::Database(DatabaseError::Backend {
                backend: "PostgreSQL".to_string(),
                reason: e.to_string(),
            })
        })?;

        rows.iter()
            .map(|row| {
                row.try_get::<_, i64>(0).map_err(|e| {
                    Error::Database(DatabaseError::Backend {
                        backend: "PostgreSQL".to_string(),
                        reason: e.to_string(),
                    })
                })
            })
            .collect()
    }
}

impl Drop for PostgresSource {
    fn drop(&mut self) {
        debug!("Closing PostgreSQL connection");
    }
}
