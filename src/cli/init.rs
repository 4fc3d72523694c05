use log::{debug, error, info, warn};

use crate::error::Result;
use std::fs;
use std::path::Path;

/// 默认配置文件内容
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# 客户分群图表工具配置文件

[logging]
# 应用日志输出路径
file = "logs/segchart.log"
# 日志级别: trace, debug, info, warn, error
level = "info"
# 日志按天归档，归档保留天数 (1-365)
retention_days = 7

[report]
# 滑动窗口锚定日期 (YYYY-MM-DD)，不设置则使用数据库当前日期
# as_of = "2024-06-30"

# PostgreSQL 数据源
# 环境变量 PGHOST / PGPORT / PGUSER / PGPASSWORD / PGDATABASE 会覆盖这里的值
# 密码请通过 PGPASSWORD 提供，不要写入本文件
[source.postgres]
host = "localhost"
port = 5432
user = "postgres"
dbname = "bank_segmentation"

# SQLite 数据源（只读打开；与 PostgreSQL 同时配置时优先使用 PostgreSQL）
# [source.sqlite]
# path = "bank_segmentation.db"

[chart]
# 输出 PNG 文件（已存在时覆盖）
file = "segmentation_bar_chart.png"
# 画布尺寸（像素）
width = 1000
height = 600
# 保存后是否用系统默认查看器打开
show = true
# TrueType 字体路径，不设置则自动搜索常见系统字体
# font = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
"#;

/// 生成默认配置文件
pub fn handle_init(output_path: &str, force: bool) -> Result<()> {
    let path = Path::new(output_path);

    info!("Generating configuration file: {output_path}");

    // 检查文件是否已存在
    if path.exists() && !force {
        error!("Configuration file already exists: {output_path}");
        info!("Tip: use --force to overwrite");
        return Err(crate::error::Error::File(
            crate::error::FileError::AlreadyExists {
                path: path.to_path_buf(),
            },
        ));
    }

    let overwriting = path.exists();
    if overwriting {
        warn!("Overwriting existing configuration file");
    }

    // 创建目录（如果需要）
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        info!("Creating directory: {}", parent.display());
        fs::create_dir_all(parent).map_err(|e| {
            crate::error::Error::File(crate::error::FileError::CreateDirectoryFailed {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })
        })?;
    }

    debug!("Writing configuration file...");
    fs::write(path, DEFAULT_CONFIG_TEMPLATE).map_err(|e| {
        crate::error::Error::File(crate::error::FileError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    })?;

    if overwriting {
        info!("Configuration file overwritten: {output_path}");
    } else {
        info!("Configuration file generated: {output_path}");
    }

    info!("Next steps:");
    info!("  1. Edit the configuration file: {output_path}");
    info!("  2. Export PGPASSWORD for the database user");
    info!("  3. Validate: segchart validate -c {output_path}");
    info!("  4. Run the report: segchart run -c {output_path}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::path::PathBuf;

    #[cfg(feature = "postgres")]
    #[test]
    fn test_default_template_parses_and_validates() {
        let cfg = Config::from_str(DEFAULT_CONFIG_TEMPLATE, PathBuf::from("template.toml"))
            .expect("template must parse");
        assert!(cfg.validate().is_ok());
        assert!(cfg.chart.show);
        assert!(cfg.report.as_of.is_none());
    }

    #[test]
    fn test_default_template_has_no_password() {
        assert!(!DEFAULT_CONFIG_TEMPLATE.contains("password ="));
    }
}
