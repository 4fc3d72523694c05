/// Configuration module tests
use bank_segchart::config::*;
use bank_segchart::error::{ConfigError, Error};
use std::collections::HashMap;
use std::path::PathBuf;

fn parse(content: &str) -> Config {
    Config::from_str(content, PathBuf::from("test.toml")).expect("config should parse")
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

// ==================== LoggingConfig Tests ====================

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert_eq!(config.file(), "logs/segchart.log");
    assert_eq!(config.level(), "info");
    assert_eq!(config.retention_days(), 7);
}

#[test]
fn test_logging_config_invalid_level() {
    let config = LoggingConfig {
        file: "x.log".to_string(),
        level: "loud".to_string(),
        retention_days: 7,
    };
    assert!(matches!(
        config.validate(),
        Err(Error::Config(ConfigError::InvalidLogLevel { .. }))
    ));
}

#[test]
fn test_logging_config_retention_bounds() {
    for days in [0, 366] {
        let config = LoggingConfig {
            file: "x.log".to_string(),
            level: "info".to_string(),
            retention_days: days,
        };
        assert!(config.validate().is_err(), "retention {days} should fail");
    }
}

// ==================== Parsing Tests ====================

#[test]
fn test_empty_file_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.chart.file(), "segmentation_bar_chart.png");
    assert_eq!((cfg.chart.width, cfg.chart.height), (1000, 600));
    assert!(cfg.chart.show);
    assert!(cfg.report.as_of.is_none());
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_parse_as_of_date() {
    let cfg = parse(
        r#"
        [report]
        as_of = "2024-06-30"
        "#,
    );
    assert_eq!(
        cfg.report.as_of,
        chrono::NaiveDate::from_ymd_opt(2024, 6, 30)
    );
}

#[test]
fn test_parse_invalid_as_of_fails() {
    let result = Config::from_str(
        "[report]\nas_of = \"30/06/2024\"\n",
        PathBuf::from("bad.toml"),
    );
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ParseFailed { .. }))
    ));
}

#[test]
fn test_missing_file_is_not_found() {
    let result = Config::from_file("definitely_missing_config.toml");
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::NotFound(_)))
    ));
}

#[test]
fn test_chart_zero_dimensions_rejected() {
    let cfg = parse("[chart]\nwidth = 0\n");
    assert!(cfg.validate().is_err());
}

#[cfg(feature = "sqlite")]
#[test]
fn test_sqlite_only_source() {
    let cfg = parse(
        r#"
        [source.sqlite]
        path = "bank.db"
        "#,
    );
    assert_eq!(cfg.source.total_sources(), 1);
    assert_eq!(cfg.source.sqlite().unwrap().path, "bank.db");
    assert!(cfg.validate().is_ok());
}

#[cfg(feature = "sqlite")]
#[test]
fn test_sqlite_empty_path_rejected() {
    let cfg = parse("[source.sqlite]\npath = \"  \"\n");
    assert!(cfg.validate().is_err());
}

#[test]
fn test_empty_source_section_rejected() {
    let cfg = parse("[source]\n");
    assert!(matches!(
        cfg.validate(),
        Err(Error::Config(ConfigError::NoSource))
    ));
}

// ==================== PostgreSQL Tests ====================

#[cfg(feature = "postgres")]
#[test]
fn test_postgres_defaults_have_no_password() {
    let cfg = parse("[source.postgres]\n");
    let pg = cfg.source.postgres().unwrap();
    assert_eq!(pg.host, "localhost");
    assert_eq!(pg.port, 5432);
    assert_eq!(pg.user, "postgres");
    assert_eq!(pg.dbname, "bank_segmentation");
    assert!(pg.password.is_none());
    assert!(!pg.connection_string().contains("password"));
}

#[cfg(feature = "postgres")]
#[test]
fn test_env_overrides_postgres_fields() {
    let mut cfg = parse("[source.postgres]\nhost = \"db.internal\"\n");
    cfg.apply_overrides_from(env(&[
        ("PGHOST", "10.0.0.5"),
        ("PGPORT", "6543"),
        ("PGUSER", "report"),
        ("PGPASSWORD", "s3cret"),
        ("PGDATABASE", "bank"),
    ]))
    .unwrap();

    let pg = cfg.source.postgres().unwrap();
    assert_eq!(
        pg.connection_string(),
        "host=10.0.0.5 port=6543 user=report password=s3cret dbname=bank"
    );
    assert_eq!(pg.redacted(), "postgres://report@10.0.0.5:6543/bank");
}

#[cfg(feature = "postgres")]
#[test]
fn test_env_invalid_port_rejected() {
    let mut cfg = Config::default();
    let result = cfg.apply_overrides_from(env(&[("PGPORT", "not-a-port")]));
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[cfg(all(feature = "postgres", feature = "sqlite"))]
#[test]
fn test_env_enables_postgres_when_no_source_configured() {
    let mut cfg = parse("[source]\n");
    assert_eq!(cfg.source.total_sources(), 0);
    cfg.apply_overrides_from(env(&[("PGPASSWORD", "pw")])).unwrap();
    assert!(cfg.source.postgres().is_some());
    assert!(cfg.validate().is_ok());
}

#[cfg(all(feature = "postgres", feature = "sqlite"))]
#[test]
fn test_env_does_not_override_sqlite_choice() {
    let mut cfg = parse("[source.sqlite]\npath = \"bank.db\"\n");
    cfg.apply_overrides_from(env(&[("PGHOST", "elsewhere")])).unwrap();
    assert!(cfg.source.postgres().is_none());
}

#[cfg(feature = "postgres")]
#[test]
fn test_postgres_empty_host_rejected() {
    let cfg = parse("[source.postgres]\nhost = \"\"\n");
    assert!(cfg.validate().is_err());
}
