use log::info;

use crate::config::Config;
use crate::error::Result;

/// 验证配置文件
pub fn handle_validate(cfg: &Config) -> Result<()> {
    info!("Configuration already validated in main");

    info!("Log level: {}", cfg.logging.level());
    info!("Log file: {}", cfg.logging.file());
    info!("Log retention: {} days", cfg.logging.retention_days());

    match cfg.report.as_of {
        Some(day) => info!("Report anchor: {day}"),
        None => info!("Report anchor: database current date"),
    }

    // 数据源（只使用一个）
    #[cfg(feature = "postgres")]
    if let Some(pg) = cfg.source.postgres() {
        info!(
            "PostgreSQL source: {} (password: {})",
            pg.redacted(),
            if pg.password.as_deref().is_some_and(|p| !p.is_empty()) {
                "set"
            } else {
                "not set"
            }
        );
    }
    #[cfg(feature = "sqlite")]
    if let Some(sqlite) = cfg.source.sqlite() {
        info!("SQLite source: {}", sqlite.path);
    }

    info!(
        "Chart output: {} ({}x{}, viewer: {})",
        cfg.chart.file(),
        cfg.chart.width,
        cfg.chart.height,
        if cfg.chart.show { "yes" } else { "no" }
    );
    match crate::chart::find_font(cfg.chart.font.as_deref()) {
        Some(font) => info!("Chart font: {}", font.display()),
        None => log::warn!("No chart font found; set chart.font before running"),
    }

    Ok(())
}
