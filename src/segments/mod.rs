//! 客户分群统计
//!
//! 在同一连接、同一游标上依次执行五个聚合查询，合并为
//! [`SegmentCounts`]。任一查询失败都会让整批结果作废。

use crate::config::Config;
use crate::constants::MSG_DB_ERROR_PREFIX;
use crate::error::{DatabaseError, Error, Result};
use crate::source::{self, Dialect, SegmentSource};
use chrono::NaiveDate;
use log::{debug, error, info};
use std::collections::VecDeque;
use std::fmt;
use std::io::Write;

pub mod queries;

pub use queries::{
    active_count, digital_only_count, dormant_count, high_value_count, single_product_count,
};

/// 固定的五个客户分群
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    HighValue,
    Dormant,
    SingleProduct,
    DigitalOnly,
    Active,
}

impl Segment {
    /// 查询顺序
    pub const ALL: [Segment; 5] = [
        Segment::HighValue,
        Segment::Dormant,
        Segment::SingleProduct,
        Segment::DigitalOnly,
        Segment::Active,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Segment::HighValue => "High-Value Customers",
            Segment::Dormant => "Dormant Customers",
            Segment::SingleProduct => "Single-Product Customers",
            Segment::DigitalOnly => "Digital-Only Customers",
            Segment::Active => "Active Customers",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 滑动时间窗口的锚定日期
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportWindow {
    /// None 表示使用数据库的当前日期
    pub as_of: Option<NaiveDate>,
}

impl ReportWindow {
    pub fn new(as_of: Option<NaiveDate>) -> Self {
        Self { as_of }
    }
}

/// 按插入顺序保存的 分群名 -> 客户数 映射
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentCounts {
    entries: Vec<(String, i64)>,
}

impl SegmentCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或更新；已存在的键保持原位置
    pub fn insert(&mut self, label: impl Into<String>, count: i64) {
        let label = label.into();
        if let Some(entry) = self.entries.iter_mut().find(|(l, _)| *l == label) {
            entry.1 = count;
        } else {
            self.entries.push((label, count));
        }
    }

    pub fn get(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(l, _)| l.as_str()).collect()
    }

    /// 按客户数降序取前 n 项；稳定排序，计数相同的保持插入顺序
    pub fn top(&self, n: usize) -> Vec<(String, i64)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for SegmentCounts {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        let mut counts = SegmentCounts::new();
        for (label, count) in iter {
            counts.insert(label, count);
        }
        counts
    }
}

/// 单游标：每次 execute 都会丢弃上一条查询的剩余行
pub struct Cursor<'a> {
    source: &'a mut dyn SegmentSource,
    rows: VecDeque<i64>,
}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("source", &self.source.name())
            .field("pending_rows", &self.rows.len())
            .finish()
    }
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a mut dyn SegmentSource) -> Self {
        Self {
            source,
            rows: VecDeque::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.source.dialect()
    }

    /// 执行查询并缓存结果行
    pub fn execute(&mut self, segment: Segment, sql: &str) -> Result<()> {
        self.rows.clear();
        debug!("SQL for {segment}: {sql}");
        let rows = self.source.query_column(sql).map_err(|e| {
            Error::Database(DatabaseError::QueryFailed {
                segment: segment.label().to_string(),
                reason: e.to_string(),
            })
        })?;
        self.rows = rows.into();
        Ok(())
    }

    /// 取下一行第一列；没有更多行时返回 None
    pub fn fetch_one(&mut self) -> Option<i64> {
        self.rows.pop_front()
    }
}

/// 在已打开的数据源上依次执行五个查询
pub fn count_segments(
    source: &mut dyn SegmentSource,
    window: &ReportWindow,
) -> Result<SegmentCounts> {
    info!("Counting customer segments via {}", source.name());
    let mut cursor = Cursor::new(source);

    let high_value = high_value_count(&mut cursor)?;
    let dormant = dormant_count(&mut cursor, window)?;
    let single_product = single_product_count(&mut cursor)?;
    let digital_only = digital_only_count(&mut cursor)?;
    let active = active_count(&mut cursor, window)?;

    let mut counts = SegmentCounts::new();
    counts.insert(Segment::HighValue.label(), high_value);
    counts.insert(Segment::Dormant.label(), dormant);
    counts.insert(Segment::SingleProduct.label(), single_product);
    counts.insert(Segment::DigitalOnly.label(), digital_only);
    counts.insert(Segment::Active.label(), active);
    Ok(counts)
}

/// 统计入口：任何数据库错误都会被吸收为空映射，错误提示写到标准输出
pub fn collect_from<F>(open: F, window: &ReportWindow) -> SegmentCounts
where
    F: FnOnce() -> Result<Box<dyn SegmentSource>>,
{
    collect_into(&mut std::io::stdout(), open, window)
}

/// 同 [`collect_from`]，错误提示写到 `out`
pub fn collect_into<W, F>(out: &mut W, open: F, window: &ReportWindow) -> SegmentCounts
where
    W: Write,
    F: FnOnce() -> Result<Box<dyn SegmentSource>>,
{
    // source 在本块结束时释放，成功与失败路径都一样
    let result = open().and_then(|mut source| count_segments(source.as_mut(), window));

    match result {
        Ok(counts) => counts,
        Err(e) => {
            let _ = writeln!(out, "{MSG_DB_ERROR_PREFIX} {e}");
            error!("Segment counting failed: {e}");
            SegmentCounts::new()
        }
    }
}

/// 按配置打开数据源并统计
pub fn collect_segment_counts(config: &Config) -> SegmentCounts {
    let window = ReportWindow::new(config.report.as_of);
    collect_from(|| source::open_source(config), &window)
}
