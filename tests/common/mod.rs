//! 测试夹具：带已知数据的银行客户库
#![allow(dead_code)]

use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;

pub const SCHEMA: &str = "
    CREATE TABLE customers (
        customer_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );
    CREATE TABLE accounts (
        account_id INTEGER PRIMARY KEY,
        customer_id INTEGER NOT NULL REFERENCES customers(customer_id)
    );
    CREATE TABLE transactions (
        transaction_id INTEGER PRIMARY KEY,
        account_id INTEGER NOT NULL REFERENCES accounts(account_id),
        transaction_type TEXT NOT NULL,
        amount REAL NOT NULL,
        transaction_date TEXT NOT NULL,
        description TEXT
    );
";

/// 报表锚定日期：12 个月窗口下限 2023-06-30，3 个月窗口下限 2024-03-30
pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

/// 种子数据
///
/// | customer | accounts | transactions                                        |
/// |----------|----------|-----------------------------------------------------|
/// | 1        | 2        | credit 5000 2024-06-01 online, credit 1000 2024-05-15 cash |
/// | 2        | 1        | credit 3000 2024-01-10 online, debit 100 2023-12-01 card   |
/// | 3        | 1        | debit 50 2022-01-01 ATM                              |
/// | 4        | 1        | none                                                 |
/// | 5        | 2        | credit 200 2024-04-15 mobile                         |
/// | 6        | 0        | none                                                 |
///
/// 期望：high-value 1（第二行），dormant 3，single-product 3，
/// digital-only 2，active 2
pub const SEED: &str = "
    INSERT INTO customers (customer_id, name) VALUES
        (1, 'Alice'), (2, 'Bob'), (3, 'Carol'), (4, 'Dan'), (5, 'Eve'), (6, 'Frank');
    INSERT INTO accounts (account_id, customer_id) VALUES
        (1, 1), (2, 1), (3, 2), (4, 3), (5, 4), (6, 5), (7, 5);
    INSERT INTO transactions
        (transaction_id, account_id, transaction_type, amount, transaction_date, description)
    VALUES
        (1, 1, 'credit', 5000, '2024-06-01', 'Online transfer'),
        (2, 2, 'credit', 1000, '2024-05-15', 'Cash deposit'),
        (3, 3, 'credit', 3000, '2024-01-10', 'Online transfer'),
        (4, 3, 'debit', 100, '2023-12-01', 'Card payment'),
        (5, 4, 'debit', 50, '2022-01-01', 'Cash withdrawal from ATM'),
        (6, 6, 'credit', 200, '2024-04-15', 'Mobile payment');
";

pub fn seeded_memory_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn.execute_batch(SEED).unwrap();
    conn
}

pub fn seed_file_db(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn.execute_batch(SEED).unwrap();
}
