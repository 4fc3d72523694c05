//! 五个分群查询
//!
//! 每个函数接收同一个 [`Cursor`]，按固定顺序在同一连接上执行。

use super::{Cursor, ReportWindow, Segment};
use crate::constants::{
    ACTIVE_WINDOW_MONTHS, CASH_DESCRIPTIONS, DIGITAL_SHARE_THRESHOLD, DORMANT_WINDOW_MONTHS,
    HIGH_VALUE_LIMIT,
};
use crate::database_error;
use crate::error::Result;
use crate::source::Dialect;
use chrono::NaiveDate;
use log::{debug, info};

/// 渲染 `anchor - N months` 的日期表达式
pub fn months_before(dialect: Dialect, as_of: Option<NaiveDate>, months: u32) -> String {
    match (dialect, as_of) {
        (Dialect::Postgres, None) => format!("(CURRENT_DATE - INTERVAL '{months} months')"),
        (Dialect::Postgres, Some(day)) => format!(
            "(DATE '{}' - INTERVAL '{months} months')",
            day.format("%Y-%m-%d")
        ),
        (Dialect::Sqlite, None) => format!("date('now', '-{months} months')"),
        (Dialect::Sqlite, Some(day)) => {
            format!("date('{}', '-{months} months')", day.format("%Y-%m-%d"))
        }
    }
}

fn cash_description_list() -> String {
    CASH_DESCRIPTIONS
        .iter()
        .map(|d| format!("'{}'", d.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn high_value_sql() -> String {
    format!(
        "SELECT COUNT(DISTINCT c.customer_id) AS count \
         FROM customers c \
         JOIN accounts a ON c.customer_id = a.customer_id \
         JOIN transactions t ON a.account_id = t.account_id \
         WHERE t.transaction_type = 'credit' \
         GROUP BY c.customer_id \
         ORDER BY SUM(t.amount) DESC \
         LIMIT {HIGH_VALUE_LIMIT}"
    )
}

pub fn dormant_sql(dialect: Dialect, window: &ReportWindow) -> String {
    format!(
        "SELECT COUNT(*) \
         FROM customers c \
         WHERE NOT EXISTS ( \
             SELECT 1 FROM accounts a \
             JOIN transactions t ON a.account_id = t.account_id \
             WHERE a.customer_id = c.customer_id \
             AND t.transaction_date > {} \
         )",
        months_before(dialect, window.as_of, DORMANT_WINDOW_MONTHS)
    )
}

pub fn single_product_sql() -> String {
    "SELECT COUNT(*) \
     FROM customers c \
     WHERE (SELECT COUNT(*) FROM accounts a WHERE a.customer_id = c.customer_id) = 1"
        .to_string()
}

pub fn digital_only_sql() -> String {
    let cash = cash_description_list();
    format!(
        "SELECT COUNT(*) FROM ( \
             SELECT c.customer_id, \
                    COUNT(t.transaction_id) AS total, \
                    COUNT(CASE WHEN t.description NOT IN ({cash}) THEN 1 END) AS digital \
             FROM customers c \
             JOIN accounts a ON c.customer_id = a.customer_id \
             JOIN transactions t ON a.account_id = t.account_id \
             GROUP BY c.customer_id \
             HAVING (COUNT(CASE WHEN t.description NOT IN ({cash}) THEN 1 END) * 100.0) \
                    / COUNT(t.transaction_id) > {DIGITAL_SHARE_THRESHOLD} \
         ) sub"
    )
}

pub fn active_sql(dialect: Dialect, window: &ReportWindow) -> String {
    format!(
        "SELECT COUNT(DISTINCT c.customer_id) \
         FROM customers c \
         JOIN accounts a ON c.customer_id = a.customer_id \
         JOIN transactions t ON a.account_id = t.account_id \
         WHERE t.transaction_date > {}",
        months_before(dialect, window.as_of, ACTIVE_WINDOW_MONTHS)
    )
}

/// 读取聚合查询的唯一结果行
fn fetch_aggregate(cursor: &mut Cursor<'_>, segment: Segment) -> Result<i64> {
    let count = cursor.fetch_one().ok_or_else(|| {
        database_error!(EmptyResult {
            segment: segment.label().to_string(),
        })
    })?;
    info!("{}: {count}", segment.label());
    Ok(count)
}

/// 高价值客户：按贷记金额排名前 20 的客户分组
///
/// 第一次 fetch 只用于判断是否有结果，真正取值的是第二次 fetch，
/// 因此返回的是第二行的值；不足两行时为 0。
pub fn high_value_count(cursor: &mut Cursor<'_>) -> Result<i64> {
    let segment = Segment::HighValue;
    debug!("Querying {}", segment.label());
    cursor.execute(segment, &high_value_sql())?;

    let count = match cursor.fetch_one() {
        Some(_) => cursor.fetch_one().unwrap_or(0),
        None => 0,
    };
    info!("{}: {count}", segment.label());
    Ok(count)
}

/// 休眠客户：最近 12 个月没有任何交易
pub fn dormant_count(cursor: &mut Cursor<'_>, window: &ReportWindow) -> Result<i64> {
    let segment = Segment::Dormant;
    debug!("Querying {}", segment.label());
    let sql = dormant_sql(cursor.dialect(), window);
    cursor.execute(segment, &sql)?;
    fetch_aggregate(cursor, segment)
}

/// 单产品客户：恰好持有一个账户
pub fn single_product_count(cursor: &mut Cursor<'_>) -> Result<i64> {
    let segment = Segment::SingleProduct;
    debug!("Querying {}", segment.label());
    cursor.execute(segment, &single_product_sql())?;
    fetch_aggregate(cursor, segment)
}

/// 数字化客户：非现金交易占比超过 90%
pub fn digital_only_count(cursor: &mut Cursor<'_>) -> Result<i64> {
    let segment = Segment::DigitalOnly;
    debug!("Querying {}", segment.label());
    cursor.execute(segment, &digital_only_sql())?;
    fetch_aggregate(cursor, segment)
}

/// 活跃客户：最近 3 个月内至少一笔交易
pub fn active_count(cursor: &mut Cursor<'_>, window: &ReportWindow) -> Result<i64> {
    let segment = Segment::Active;
    debug!("Querying {}", segment.label());
    let sql = active_sql(cursor.dialect(), window);
    cursor.execute(segment, &sql)?;
    fetch_aggregate(cursor, segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_months_before_postgres() {
        assert_eq!(
            months_before(Dialect::Postgres, None, 12),
            "(CURRENT_DATE - INTERVAL '12 months')"
        );
        let day = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(
            months_before(Dialect::Postgres, Some(day), 3),
            "(DATE '2024-06-30' - INTERVAL '3 months')"
        );
    }

    #[test]
    fn test_months_before_sqlite() {
        assert_eq!(
            months_before(Dialect::Sqlite, None, 3),
            "date('now', '-3 months')"
        );
        let day = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(
            months_before(Dialect::Sqlite, Some(day), 12),
            "date('2024-06-30', '-12 months')"
        );
    }

    #[test]
    fn test_digital_sql_lists_cash_descriptions() {
        let sql = digital_only_sql();
        assert!(sql.contains("'Cash withdrawal from ATM', 'Cash deposit'"));
        assert!(sql.contains("> 90"));
    }

    #[test]
    fn test_high_value_sql_limits_to_twenty() {
        let sql = high_value_sql();
        assert!(sql.contains("transaction_type = 'credit'"));
        assert!(sql.ends_with("LIMIT 20"));
    }
}
