use crate::domain::{
    Account, AccountType, BudgetRow, Category, ExchangeRate, ItemStatus, MainCategory,
    MainCategoryType, TransactionRow, round_money,
};
use crate::error::{ReportError, ReportResult};
use crate::period::DateWindow;
use crate::store::{AccountFilter, BudgetFilter, LedgerStore, TransactionFilter};
use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Row, params, params_from_iter};
use rust_decimal::Decimal;
use std::fs;
use std::path::Path;

pub struct Db {
    conn: Connection,
}

impl Db {
    /// Opens an existing ledger file. A missing file is an error, never created here.
    pub fn open(path: &Path) -> ReportResult<Self> {
        if !path.exists() {
            return Err(ReportError::DataFileMissing(path.to_path_buf()));
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened ledger");
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Creates the ledger file (and parent dirs) or brings an existing one up to date.
    pub fn init(path: &Path) -> Result<Self> {
        ensure_parent_dir(path)?;
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open DB {}", path.display()))?;
        let db = Self { conn };
        db.migrate()
            .with_context(|| format!("Failed to initialize schema in {}", path.display()))?;
        tracing::info!(path = %path.display(), "initialized ledger");
        Ok(db)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS accounts (
                account_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                institution TEXT NOT NULL DEFAULT '',
                type INTEGER NOT NULL,
                currency TEXT NOT NULL,
                status INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS main_categories (
                main_category_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                type INTEGER NOT NULL,
                status INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS categories (
                category_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                main_category_id INTEGER NOT NULL REFERENCES main_categories(main_category_id),
                status INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS transactions (
                transaction_id INTEGER PRIMARY KEY AUTOINCREMENT,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                day INTEGER NOT NULL,
                account_id INTEGER NOT NULL REFERENCES accounts(account_id),
                category_id INTEGER NOT NULL REFERENCES categories(category_id),
                description TEXT NOT NULL DEFAULT '',
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(year, month, day);

            CREATE TABLE IF NOT EXISTS budgets (
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                category_id INTEGER NOT NULL REFERENCES categories(category_id),
                value TEXT NOT NULL,
                currency TEXT NOT NULL,
                PRIMARY KEY (year, month, category_id)
            );

            CREATE TABLE IF NOT EXISTS currencies (
                currency_from TEXT NOT NULL,
                currency_to TEXT NOT NULL,
                rate TEXT NOT NULL,
                PRIMARY KEY (currency_from, currency_to)
            );
            "#,
        )
    }

    pub fn add_account(
        &self,
        name: &str,
        description: &str,
        institution: &str,
        account_type: AccountType,
        currency: &str,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO accounts (name, description, institution, type, currency, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                name,
                description,
                institution,
                account_type.code(),
                currency,
                ItemStatus::Open.code(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn add_main_category(&self, name: &str, kind: MainCategoryType) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO main_categories (name, type, status) VALUES (?1, ?2, ?3)",
            params![name, kind.code(), ItemStatus::Open.code()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn add_category(&self, name: &str, main_category_id: i64) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO categories (name, main_category_id, status) VALUES (?1, ?2, ?3)",
            params![name, main_category_id, ItemStatus::Open.code()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Stores `value` as given. Callers apply the main-category sign first.
    pub fn add_transaction(
        &self,
        date: NaiveDate,
        account_id: i64,
        category_id: i64,
        description: &str,
        value: Decimal,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO transactions (year, month, day, account_id, category_id, description, value)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                date.year(),
                date.month(),
                date.day(),
                account_id,
                category_id,
                description,
                round_money(value).to_string(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn set_budget(
        &self,
        year: i32,
        month: u32,
        category_id: i64,
        value: Decimal,
        currency: &str,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO budgets (year, month, category_id, value, currency)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(year, month, category_id)
            DO UPDATE SET value = excluded.value, currency = excluded.currency
            "#,
            params![year, month, category_id, round_money(value).to_string(), currency],
        )?;
        Ok(())
    }

    pub fn set_rate(&self, from: &str, to: &str, rate: Decimal) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO currencies (currency_from, currency_to, rate)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(currency_from, currency_to) DO UPDATE SET rate = excluded.rate
            "#,
            params![from, to, rate.to_string()],
        )?;
        Ok(())
    }

    pub fn list_all_rates(&self) -> ReportResult<Vec<ExchangeRate>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT currency_from, currency_to, rate
            FROM currencies
            ORDER BY currency_from, currency_to
            "#,
        )?;
        let rows = stmt.query_map([], exchange_rate_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn close_account(&self, id: i64) -> Result<()> {
        self.close_row("accounts", "account_id", id)
    }

    pub fn close_category(&self, id: i64) -> Result<()> {
        self.close_row("categories", "category_id", id)
    }

    pub fn close_main_category(&self, id: i64) -> Result<()> {
        self.close_row("main_categories", "main_category_id", id)
    }

    fn close_row(&self, table: &'static str, id_column: &'static str, id: i64) -> Result<()> {
        let changed = self.conn.execute(
            &format!("UPDATE {table} SET status = ?1 WHERE {id_column} = ?2"),
            params![ItemStatus::Closed.code(), id],
        )?;
        if changed == 0 {
            return Err(anyhow!("No row {id} in {table}"));
        }
        Ok(())
    }

    pub fn category(&self, id: i64) -> Result<Category> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT} WHERE c.category_id = ?1"
        ))?;
        stmt.query_row([id], category_from_row)
            .with_context(|| format!("No category with id {id}"))
    }
}

impl LedgerStore for Db {
    fn list_accounts(&self, filter: &AccountFilter) -> ReportResult<Vec<Account>> {
        let mut f = SqlFilter::default();
        if !filter.include_closed {
            f.eq("status", ItemStatus::Open.code());
        }
        if let Some(t) = filter.account_type {
            f.eq("type", t.code());
        }
        if let Some(cur) = &filter.currency {
            f.eq("currency", cur.clone());
        }
        if let Some(inst) = &filter.institution {
            f.push("instr(institution, ?) > 0", [Value::from(inst.clone())]);
        }

        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts{} ORDER BY type, name, account_id",
            f.where_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(f.params.iter()), account_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_main_categories(&self, include_closed: bool) -> ReportResult<Vec<MainCategory>> {
        let mut f = SqlFilter::default();
        if !include_closed {
            f.eq("status", ItemStatus::Open.code());
        }
        let sql = format!(
            "SELECT main_category_id, name, type, status FROM main_categories{} ORDER BY type DESC, name, main_category_id",
            f.where_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(f.params.iter()), |row| {
            Ok(MainCategory {
                id: row.get(0)?,
                name: row.get(1)?,
                kind: main_type_col(row, 2)?,
                status: status_col(row, 3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_categories(&self, include_closed: bool) -> ReportResult<Vec<Category>> {
        let mut f = SqlFilter::default();
        if !include_closed {
            f.eq("c.status", ItemStatus::Open.code());
        }
        let sql = format!(
            "{CATEGORY_SELECT}{} ORDER BY m.type DESC, m.name, c.name, c.category_id",
            f.where_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(f.params.iter()), category_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_transactions(&self, filter: &TransactionFilter) -> ReportResult<Vec<TransactionRow>> {
        let mut f = SqlFilter::default();
        if let Some(w) = &filter.window {
            f.window(w, "t");
        }
        if let Some(id) = filter.account_id {
            f.eq("t.account_id", id);
        }
        if let Some(id) = filter.category_id {
            f.eq("t.category_id", id);
        }
        if let Some(id) = filter.main_category_id {
            f.eq("c.main_category_id", id);
        }
        if let Some(kind) = filter.main_category_type {
            f.eq("m.type", kind.code());
        }
        if let Some(cur) = &filter.currency {
            f.eq("a.currency", cur.clone());
        }
        if filter.open_accounts_only {
            f.eq("a.status", ItemStatus::Open.code());
        }

        let sql = format!(
            r#"
            SELECT t.transaction_id, t.year, t.month, t.day, t.description, t.value,
                   a.account_id, a.name, a.type, a.currency,
                   c.category_id, c.name, m.main_category_id, m.name, m.type
            FROM transactions t
            JOIN accounts a ON a.account_id = t.account_id
            JOIN categories c ON c.category_id = t.category_id
            JOIN main_categories m ON m.main_category_id = c.main_category_id
            {}
            ORDER BY t.year, t.month, t.day, t.transaction_id
            "#,
            f.where_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(f.params.iter()), |row| {
            Ok(TransactionRow {
                id: row.get(0)?,
                year: row.get(1)?,
                month: row.get(2)?,
                day: row.get(3)?,
                description: row.get(4)?,
                value: decimal_col(row, 5)?,
                account_id: row.get(6)?,
                account_name: row.get(7)?,
                account_type: account_type_col(row, 8)?,
                currency: row.get(9)?,
                category_id: row.get(10)?,
                category_name: row.get(11)?,
                main_category_id: row.get(12)?,
                main_category_name: row.get(13)?,
                main_category_kind: main_type_col(row, 14)?,
            })
        })?;
        let out = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        if let Some(w) = &filter.window {
            debug_assert!(out.iter().all(|r| w.contains(r.year, r.month, r.day)));
        }
        tracing::debug!(rows = out.len(), "listed transactions");
        Ok(out)
    }

    fn list_budgets(&self, filter: &BudgetFilter) -> ReportResult<Vec<BudgetRow>> {
        let mut f = SqlFilter::default();
        f.window(&filter.window, "b");
        if let Some(id) = filter.category_id {
            f.eq("b.category_id", id);
        }

        let sql = format!(
            r#"
            SELECT b.year, b.month, c.category_id, c.name, m.main_category_id, m.name, m.type,
                   b.value, b.currency
            FROM budgets b
            JOIN categories c ON c.category_id = b.category_id
            JOIN main_categories m ON m.main_category_id = c.main_category_id
            {}
            ORDER BY b.year, b.month, m.type DESC, m.name, c.name
            "#,
            f.where_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(f.params.iter()), |row| {
            Ok(BudgetRow {
                year: row.get(0)?,
                month: row.get(1)?,
                category_id: row.get(2)?,
                category_name: row.get(3)?,
                main_category_id: row.get(4)?,
                main_category_name: row.get(5)?,
                main_category_kind: main_type_col(row, 6)?,
                value: decimal_col(row, 7)?,
                currency: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_exchange_rates(&self, to: &str) -> ReportResult<Vec<ExchangeRate>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT currency_from, currency_to, rate
            FROM currencies
            WHERE currency_to = ?1
            ORDER BY currency_from
            "#,
        )?;
        let rows = stmt.query_map([to], exchange_rate_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

const ACCOUNT_COLUMNS: &str =
    "account_id, name, description, institution, type, currency, status";

const CATEGORY_SELECT: &str = r#"
    SELECT c.category_id, c.name, m.main_category_id, m.name, m.type, c.status
    FROM categories c
    JOIN main_categories m ON m.main_category_id = c.main_category_id"#;

/// Conjunction of parameterized predicates. Values are always bound, never spliced.
#[derive(Debug, Default)]
struct SqlFilter {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl SqlFilter {
    fn push<I>(&mut self, clause: impl Into<String>, params: I)
    where
        I: IntoIterator<Item = Value>,
    {
        self.clauses.push(clause.into());
        self.params.extend(params);
    }

    fn eq(&mut self, column: &str, value: impl Into<Value>) {
        self.push(format!("{column} = ?"), [value.into()]);
    }

    fn window(&mut self, window: &DateWindow, alias: &str) {
        let (clause, params) = window.sql_predicate(alias);
        self.push(clause, params.into_iter().map(Value::from));
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    raw.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn account_type_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<AccountType> {
    let code: i64 = row.get(idx)?;
    AccountType::from_code(code).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, code))
}

fn main_type_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<MainCategoryType> {
    let code: i64 = row.get(idx)?;
    MainCategoryType::from_code(code).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, code))
}

fn status_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<ItemStatus> {
    let code: i64 = row.get(idx)?;
    ItemStatus::from_code(code).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, code))
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        institution: row.get(3)?,
        account_type: account_type_col(row, 4)?,
        currency: row.get(5)?,
        status: status_col(row, 6)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        main_category_id: row.get(2)?,
        main_category_name: row.get(3)?,
        main_category_kind: main_type_col(row, 4)?,
        status: status_col(row, 5)?,
    })
}

fn exchange_rate_from_row(row: &Row<'_>) -> rusqlite::Result<ExchangeRate> {
    Ok(ExchangeRate {
        from: row.get(0)?,
        to: row.get(1)?,
        rate: decimal_col(row, 2)?,
    })
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{d, date, seeded};

    #[test]
    fn open_refuses_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.sqlite3");
        assert!(matches!(
            Db::open(&path),
            Err(ReportError::DataFileMissing(_))
        ));
    }

    #[test]
    fn init_creates_file_and_open_reuses_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.sqlite3");
        let db = Db::init(&path).unwrap();
        db.add_account("Cash", "", "", AccountType::Transactional, "USD")
            .unwrap();
        drop(db);

        let db = Db::open(&path).unwrap();
        assert_eq!(db.list_accounts(&AccountFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn closed_accounts_drop_out_of_listings_and_resolution() {
        let s = seeded();
        s.db.close_account(s.savings).unwrap();

        let open = s.db.list_accounts(&AccountFilter::default()).unwrap();
        assert!(open.iter().all(|a| a.id != s.savings));

        let all = s
            .db
            .list_accounts(&AccountFilter {
                include_closed: true,
                ..Default::default()
            })
            .unwrap();
        assert!(all.iter().any(|a| a.id == s.savings && a.status == ItemStatus::Closed));
        assert!(s.db.resolve_account_id("Savings").is_err());
    }

    #[test]
    fn transaction_filters_compose() {
        let s = seeded();
        let rows = s
            .db
            .list_transactions(&TransactionFilter {
                window: Some(DateWindow::Month(2024, 1)),
                category_id: Some(s.groceries),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, d("-50.00"));
        assert_eq!(rows[0].category_name, "Groceries");

        let eur = s
            .db
            .list_transactions(&TransactionFilter {
                currency: Some("EUR".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(eur.iter().all(|r| r.currency == "EUR"));
        assert!(!eur.is_empty());
    }

    #[test]
    fn main_category_filters_select_their_categories() {
        let s = seeded();
        let by_main = |id: i64| {
            s.db.list_transactions(&TransactionFilter {
                main_category_id: Some(id),
                ..Default::default()
            })
            .unwrap()
        };

        let living = by_main(s.living);
        assert_eq!(living.len(), 2);
        assert!(living.iter().all(|r| r.main_category_name == "Living"));

        let salary = by_main(s.salary);
        assert_eq!(salary.len(), 1);
        assert_eq!(salary[0].category_id, s.pay);
        assert_eq!(salary[0].main_category_kind, MainCategoryType::Income);

        // Both legs of the transfer, and they cancel out.
        let moves = by_main(s.moves);
        assert_eq!(moves.len(), 2);
        assert_eq!(moves.iter().map(|r| r.value).sum::<Decimal>(), Decimal::ZERO);

        let costs = s
            .db
            .list_transactions(&TransactionFilter {
                main_category_type: Some(MainCategoryType::Cost),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(costs, living);
    }

    #[test]
    fn transactions_come_back_in_date_order() {
        let s = seeded();
        s.db
            .add_transaction(date(2023, 12, 31), s.checking, s.groceries, "early", d("-1"))
            .unwrap();
        let rows = s.db.list_transactions(&TransactionFilter::default()).unwrap();
        let dates: Vec<_> = rows.iter().map(|r| (r.year, r.month, r.day)).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(rows[0].description, "early");
    }

    #[test]
    fn budgets_and_rates_upsert() {
        let s = seeded();
        s.db.set_budget(2024, 1, s.groceries, d("-120"), "USD").unwrap();
        s.db.set_rate("EUR", "USD", d("1.2")).unwrap();

        let budgets = s
            .db
            .list_budgets(&BudgetFilter {
                category_id: Some(s.groceries),
                window: DateWindow::Month(2024, 1),
            })
            .unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].value, d("-120"));

        let rates = s.db.list_exchange_rates("USD").unwrap();
        assert_eq!(rates.iter().filter(|r| r.from == "EUR").count(), 1);
        assert_eq!(
            rates.iter().find(|r| r.from == "EUR").map(|r| r.rate),
            Some(d("1.2"))
        );
    }
}
