//! 公共常量
//! 提供：
//! - 合法日志级别常量 LOG_LEVELS
//! - 报表与图表的固定文案、尺寸、颜色

/// 合法的日志级别（统一来源）
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// 默认配置文件路径
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// 默认输出图片文件名
pub const DEFAULT_CHART_FILE: &str = "segmentation_bar_chart.png";

/// 图表中最多展示的分群数
pub const TOP_SEGMENTS: usize = 5;

/// 默认画布尺寸（10×6 英寸 @ 100 dpi）
pub const DEFAULT_CHART_WIDTH: u32 = 1000;
pub const DEFAULT_CHART_HEIGHT: u32 = 600;

pub const CHART_TITLE: &str = "Top 5 Customer Segments by Count";
pub const X_AXIS_LABEL: &str = "Customer Segments";
pub const Y_AXIS_LABEL: &str = "Number of Customers";

/// skyblue (#87CEEB)
pub const BAR_COLOR_RGB: (u8, u8, u8) = (135, 206, 235);

/// 高价值客户统计的客户上限
pub const HIGH_VALUE_LIMIT: u32 = 20;

/// 休眠客户窗口（月）
pub const DORMANT_WINDOW_MONTHS: u32 = 12;

/// 活跃客户窗口（月）
pub const ACTIVE_WINDOW_MONTHS: u32 = 3;

/// 数字化客户阈值（百分比，严格大于）
pub const DIGITAL_SHARE_THRESHOLD: u32 = 90;

/// 视为现金（非数字化）交易的描述
pub const CASH_DESCRIPTIONS: &[&str] = &["Cash withdrawal from ATM", "Cash deposit"];

/// 控制台固定输出
pub const MSG_DB_ERROR_PREFIX: &str = "Error connecting to database:";
pub const MSG_NO_DATA: &str = "Failed to retrieve segment data.";

/// 未设置 chart.font 时依次尝试的系统字体
pub const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];
