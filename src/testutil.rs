use crate::db::Db;
use crate::domain::{AccountType, MainCategoryType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn d(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap()
}

pub fn date(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Small ledger shared by the unit tests.
///
/// Values are stored signed, the way `add transaction` would store them.
pub struct Seeded {
    pub db: Db,
    pub checking: i64,
    pub savings: i64,
    pub euro: i64,
    pub living: i64,
    pub salary: i64,
    pub moves: i64,
    pub groceries: i64,
    pub fuel: i64,
    pub pay: i64,
    pub to_savings: i64,
}

pub fn seeded() -> Seeded {
    let db = Db::open_in_memory().unwrap();

    let checking = db
        .add_account("Checking", "daily", "Bank A", AccountType::Transactional, "USD")
        .unwrap();
    let savings = db
        .add_account("Savings", "", "Bank A", AccountType::Saving, "USD")
        .unwrap();
    let euro = db
        .add_account("Euro", "", "Bank B", AccountType::Transactional, "EUR")
        .unwrap();

    let living = db.add_main_category("Living", MainCategoryType::Cost).unwrap();
    let salary = db.add_main_category("Salary", MainCategoryType::Income).unwrap();
    let moves = db
        .add_main_category("Moves", MainCategoryType::Transfer)
        .unwrap();

    let groceries = db.add_category("Groceries", living).unwrap();
    let fuel = db.add_category("Fuel", living).unwrap();
    let pay = db.add_category("Pay", salary).unwrap();
    let to_savings = db.add_category("ToSavings", moves).unwrap();

    db.add_transaction(date(2024, 1, 10), checking, groceries, "weekly shop", d("-50.00"))
        .unwrap();
    db.add_transaction(date(2024, 1, 25), checking, pay, "january", d("1000.00"))
        .unwrap();
    db.add_transaction(date(2024, 2, 5), euro, fuel, "road trip", d("-20.00"))
        .unwrap();
    db.add_transaction(date(2024, 2, 10), checking, to_savings, "out", d("-100.00"))
        .unwrap();
    db.add_transaction(date(2024, 2, 10), savings, to_savings, "in", d("100.00"))
        .unwrap();

    Seeded {
        db,
        checking,
        savings,
        euro,
        living,
        salary,
        moves,
        groceries,
        fuel,
        pay,
        to_savings,
    }
}
