use crate::constants::{
    DEFAULT_CHART_FILE, DEFAULT_CHART_HEIGHT, DEFAULT_CHART_WIDTH, LOG_LEVELS,
};
use crate::error::{ConfigError, Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// PostgreSQL 默认主机
#[cfg(feature = "postgres")]
fn default_postgres_host() -> String {
    "localhost".to_string()
}

/// PostgreSQL 默认端口
#[cfg(feature = "postgres")]
fn default_postgres_port() -> u16 {
    5432
}

/// PostgreSQL 默认用户名
#[cfg(feature = "postgres")]
fn default_postgres_user() -> String {
    "postgres".to_string()
}

/// PostgreSQL 默认数据库
#[cfg(feature = "postgres")]
fn default_postgres_dbname() -> String {
    "bank_segmentation".to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| Error::Config(ConfigError::NotFound(path.to_path_buf())))?;
        Self::from_str(&content, path.to_path_buf())
    }

    /// 从字符串解析配置
    pub fn from_str(content: &str, path: PathBuf) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| {
            Error::Config(ConfigError::ParseFailed {
                path,
                reason: e.to_string(),
            })
        })?;

        Ok(config)
    }

    /// 用进程环境变量（PGHOST 等）覆盖配置
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// 用任意查找函数覆盖配置，便于测试时不触碰进程环境
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        #[cfg(feature = "postgres")]
        {
            let has_env = ["PGHOST", "PGPORT", "PGUSER", "PGPASSWORD", "PGDATABASE"]
                .iter()
                .any(|k| lookup(k).is_some());

            // 只给出环境变量也能连接 PostgreSQL
            if has_env && self.source.total_sources() == 0 {
                self.source.postgres = Some(PostgresSource::default());
            }

            if let Some(pg) = self.source.postgres.as_mut() {
                pg.apply_overrides_from(&lookup)?;
            }
        }
        #[cfg(not(feature = "postgres"))]
        let _ = lookup;

        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.source.validate()?;
        self.chart.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// 应用日志输出文件路径
    pub file: String,
    pub level: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: usize,
}

fn default_retention_days() -> usize {
    7
}

impl LoggingConfig {
    /// 获取日志输出文件路径
    pub fn file(&self) -> &str {
        &self.file
    }

    /// 获取日志级别
    pub fn level(&self) -> &str {
        &self.level
    }

    /// 获取日志保留天数
    pub fn retention_days(&self) -> usize {
        self.retention_days
    }

    /// 验证日志级别是否有效
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS
            .iter()
            .any(|&l| l.eq_ignore_ascii_case(self.level.as_str()))
        {
            return Err(Error::Config(ConfigError::InvalidLogLevel {
                level: self.level.clone(),
                valid_levels: LOG_LEVELS.iter().map(ToString::to_string).collect(),
            }));
        }

        // 验证保留天数（1-365天）
        if self.retention_days == 0 || self.retention_days > 365 {
            return Err(Error::Config(ConfigError::InvalidValue {
                field: "logging.retention_days".to_string(),
                value: self.retention_days.to_string(),
                reason: "Retention days must be between 1 and 365".to_string(),
            }));
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "logs/segchart.log".to_string(),
            level: "info".to_string(),
            retention_days: 7,
        }
    }
}

/// 报表参数
#[derive(Debug, Default, Deserialize, Clone)]
pub struct ReportConfig {
    /// 滑动窗口锚定日期；缺省时使用数据库当前日期
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    #[cfg(feature = "postgres")]
    pub postgres: Option<PostgresSource>,
    #[cfg(feature = "sqlite")]
    pub sqlite: Option<SqliteSource>,
}

impl SourceConfig {
    /// 获取 PostgreSQL 数据源配置
    #[cfg(feature = "postgres")]
    pub fn postgres(&self) -> Option<&PostgresSource> {
        self.postgres.as_ref()
    }

    /// 获取 SQLite 数据源配置
    #[cfg(feature = "sqlite")]
    pub fn sqlite(&self) -> Option<&SqliteSource> {
        self.sqlite.as_ref()
    }

    /// 统计配置的数据源总数
    pub fn total_sources(&self) -> usize {
        let mut count = 0;
        #[cfg(feature = "postgres")]
        {
            if self.postgres.is_some() {
                count += 1;
            }
        }
        #[cfg(feature = "sqlite")]
        {
            if self.sqlite.is_some() {
                count += 1;
            }
        }
        count
    }

    /// 验证数据源配置（只使用一个数据源）
    pub fn validate(&self) -> Result<()> {
        let total = self.total_sources();
        if total == 0 {
            return Err(Error::Config(ConfigError::NoSource));
        }
        if total > 1 {
            eprintln!("Warning: {total} data sources configured, but only one is used.");
            eprintln!("Will use the first source by priority: PostgreSQL > SQLite");
        }

        #[cfg(feature = "postgres")]
        if let Some(pg) = &self.postgres {
            pg.validate()?;
        }
        #[cfg(feature = "sqlite")]
        if let Some(sqlite) = &self.sqlite {
            sqlite.validate()?;
        }

        Ok(())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            #[cfg(feature = "postgres")]
            postgres: Some(PostgresSource::default()),
            #[cfg(feature = "sqlite")]
            sqlite: None,
        }
    }
}

#[cfg(feature = "postgres")]
#[derive(Debug, Deserialize, Clone)]
pub struct PostgresSource {
    /// PostgreSQL 主机地址
    #[serde(default = "default_postgres_host")]
    pub host: String,
    /// PostgreSQL 端口
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    /// 用户名
    #[serde(default = "default_postgres_user")]
    pub user: String,
    /// 密码（建议通过 PGPASSWORD 提供，不设默认值）
    #[serde(default)]
    pub password: Option<String>,
    /// 数据库名
    #[serde(default = "default_postgres_dbname")]
    pub dbname: String,
}

#[cfg(feature = "postgres")]
impl Default for PostgresSource {
    fn default() -> Self {
        Self {
            host: default_postgres_host(),
            port: default_postgres_port(),
            user: default_postgres_user(),
            password: None,
            dbname: default_postgres_dbname(),
        }
    }
}

#[cfg(feature = "postgres")]
impl PostgresSource {
    /// 获取连接字符串
    pub fn connection_string(&self) -> String {
        match self.password.as_deref() {
            Some(password) if !password.is_empty() => format!(
                "host={} port={} user={} password={} dbname={}",
                self.host,
                self.port,
                self.user,
                quote_conn_value(password),
                self.dbname
            ),
            _ => format!(
                "host={} port={} user={} dbname={}",
                self.host, self.port, self.user, self.dbname
            ),
        }
    }

    /// 不含密码的连接描述，用于日志
    pub fn redacted(&self) -> String {
        format!(
            "postgres://{}@{}:{}/{}",
            self.user, self.host, self.port, self.dbname
        )
    }

    fn apply_overrides_from<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("PGHOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PGPORT") {
            self.port = port.trim().parse().map_err(|_| {
                Error::Config(ConfigError::InvalidValue {
                    field: "PGPORT".to_string(),
                    value: port.clone(),
                    reason: "Port must be a number between 1 and 65535".to_string(),
                })
            })?;
        }
        if let Some(user) = lookup("PGUSER") {
            self.user = user;
        }
        if let Some(password) = lookup("PGPASSWORD") {
            self.password = Some(password);
        }
        if let Some(dbname) = lookup("PGDATABASE") {
            self.dbname = dbname;
        }
        Ok(())
    }

    /// 验证必填字段
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("source.postgres.host", &self.host),
            ("source.postgres.user", &self.user),
            ("source.postgres.dbname", &self.dbname),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.clone(),
                    reason: "Value cannot be empty".to_string(),
                }));
            }
        }
        if self.port == 0 {
            return Err(Error::Config(ConfigError::InvalidValue {
                field: "source.postgres.port".to_string(),
                value: "0".to_string(),
                reason: "Port must be between 1 and 65535".to_string(),
            }));
        }
        Ok(())
    }
}

/// libpq key/value 连接串中的值需要在含空格或引号时加引号
#[cfg(feature = "postgres")]
fn quote_conn_value(value: &str) -> String {
    if value.contains([' ', '\'', '\\']) {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    } else {
        value.to_string()
    }
}

#[cfg(feature = "sqlite")]
#[derive(Debug, Deserialize, Clone)]
pub struct SqliteSource {
    /// SQLite 数据库文件路径（只读打开）
    pub path: String,
}

#[cfg(feature = "sqlite")]
impl SqliteSource {
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(Error::Config(ConfigError::InvalidValue {
                field: "source.sqlite.path".to_string(),
                value: self.path.clone(),
                reason: "Database path cannot be empty".to_string(),
            }));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    /// 输出 PNG 路径
    #[serde(default = "default_chart_file")]
    pub file: String,
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
    /// 保存后是否用系统默认查看器打开
    #[serde(default = "default_true")]
    pub show: bool,
    /// TrueType 字体路径；缺省时搜索常见系统字体
    #[serde(default)]
    pub font: Option<String>,
}

fn default_chart_file() -> String {
    DEFAULT_CHART_FILE.to_string()
}

fn default_chart_width() -> u32 {
    DEFAULT_CHART_WIDTH
}

fn default_chart_height() -> u32 {
    DEFAULT_CHART_HEIGHT
}

fn default_true() -> bool {
    true
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            file: default_chart_file(),
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
            show: true,
            font: None,
        }
    }
}

impl ChartConfig {
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn validate(&self) -> Result<()> {
        if self.file.trim().is_empty() {
            return Err(Error::Config(ConfigError::InvalidValue {
                field: "chart.file".to_string(),
                value: self.file.clone(),
                reason: "Output file cannot be empty".to_string(),
            }));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(ConfigError::InvalidValue {
                field: "chart.width/chart.height".to_string(),
                value: format!("{}x{}", self.width, self.height),
                reason: "Chart dimensions must be non-zero".to_string(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.chart.file(), "segmentation_bar_chart.png");
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_connection_string_without_password() {
        let pg = PostgresSource::default();
        assert_eq!(
            pg.connection_string(),
            "host=localhost port=5432 user=postgres dbname=bank_segmentation"
        );
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_connection_string_quotes_password() {
        let pg = PostgresSource {
            password: Some("it's secret".to_string()),
            ..PostgresSource::default()
        };
        assert!(pg.connection_string().contains("password='it\\'s secret'"));
        assert!(!pg.redacted().contains("secret"));
    }
}
