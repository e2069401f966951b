use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

/// Kind of account. Declaration order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountType {
    Transactional,
    Saving,
    Property,
    Investment,
    Loan,
}

impl AccountType {
    pub fn code(self) -> i64 {
        match self {
            Self::Transactional => 1,
            Self::Saving => 2,
            Self::Property => 3,
            Self::Investment => 4,
            Self::Loan => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Transactional),
            2 => Some(Self::Saving),
            3 => Some(Self::Property),
            4 => Some(Self::Investment),
            5 => Some(Self::Loan),
            _ => None,
        }
    }

    /// Heading used in reports and listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Transactional => "Operations",
            Self::Saving => "Savings",
            Self::Property => "Property",
            Self::Investment => "Investment",
            Self::Loan => "Loan",
        }
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "t" | "transactional" | "operations" => Ok(Self::Transactional),
            "s" | "saving" | "savings" => Ok(Self::Saving),
            "p" | "property" => Ok(Self::Property),
            "i" | "investment" => Ok(Self::Investment),
            "l" | "loan" => Ok(Self::Loan),
            other => Err(format!(
                "unknown account type '{other}' (expected t/transactional, s/saving, p/property, i/investment, l/loan)"
            )),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Type of a main category. It decides the sign of every value booked under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MainCategoryType {
    Cost,
    Transfer,
    Income,
}

impl MainCategoryType {
    pub fn code(self) -> i64 {
        match self {
            Self::Cost => -1,
            Self::Transfer => 0,
            Self::Income => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Self::Cost),
            0 => Some(Self::Transfer),
            1 => Some(Self::Income),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cost => "Cost",
            Self::Transfer => "Transfer",
            Self::Income => "Income",
        }
    }
}

impl FromStr for MainCategoryType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "c" | "cost" => Ok(Self::Cost),
            "t" | "transfer" => Ok(Self::Transfer),
            "i" | "income" => Ok(Self::Income),
            other => Err(format!(
                "unknown main category type '{other}' (expected c/cost, t/transfer, i/income)"
            )),
        }
    }
}

impl fmt::Display for MainCategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Multiplier applied to user-entered values booked under a main category of `kind`.
///
/// Entry (transactions, budgets) and reporting both go through this function.
pub fn sign_factor(kind: MainCategoryType) -> Decimal {
    match kind {
        MainCategoryType::Cost => Decimal::NEGATIVE_ONE,
        MainCategoryType::Transfer | MainCategoryType::Income => Decimal::ONE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Closed,
    Open,
}

impl ItemStatus {
    pub fn code(self) -> i64 {
        match self {
            Self::Closed => 0,
            Self::Open => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Closed),
            1 => Some(Self::Open),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Closed => "Closed",
            Self::Open => "Open",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub institution: String,
    pub account_type: AccountType,
    pub currency: String,
    pub status: ItemStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MainCategory {
    pub id: i64,
    pub name: String,
    pub kind: MainCategoryType,
    pub status: ItemStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub main_category_id: i64,
    pub main_category_name: String,
    pub main_category_kind: MainCategoryType,
    pub status: ItemStatus,
}

/// A transaction joined with its account, category and main category.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub id: i64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub description: String,
    /// Signed value in the account currency.
    pub value: Decimal,
    pub account_id: i64,
    pub account_name: String,
    pub account_type: AccountType,
    pub currency: String,
    pub category_id: i64,
    pub category_name: String,
    pub main_category_id: i64,
    pub main_category_name: String,
    pub main_category_kind: MainCategoryType,
}

/// A monthly budget limit joined with its category and main category.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetRow {
    pub year: i32,
    pub month: u32,
    pub category_id: i64,
    pub category_name: String,
    pub main_category_id: i64,
    pub main_category_name: String,
    pub main_category_kind: MainCategoryType,
    /// Signed limit in `currency`.
    pub value: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRate {
    pub from: String,
    pub to: String,
    /// Units of `to` per one unit of `from`.
    pub rate: Decimal,
}

pub fn normalize_currency(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Rounds to cents, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
