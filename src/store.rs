use crate::domain::{
    Account, AccountType, BudgetRow, Category, ExchangeRate, MainCategory, MainCategoryType,
    TransactionRow,
};
use crate::error::{ReportError, ReportResult};
use crate::period::DateWindow;

#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub account_type: Option<AccountType>,
    pub currency: Option<String>,
    /// Substring of the institution name.
    pub institution: Option<String>,
    pub include_closed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub window: Option<DateWindow>,
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub main_category_id: Option<i64>,
    pub main_category_type: Option<MainCategoryType>,
    /// Account currency.
    pub currency: Option<String>,
    pub open_accounts_only: bool,
}

#[derive(Debug, Clone)]
pub struct BudgetFilter {
    pub category_id: Option<i64>,
    pub window: DateWindow,
}

/// Read access to a ledger. Reports only ever see this trait.
///
/// Transactions come back ordered by date then id; budgets by period, main
/// category name and category name.
pub trait LedgerStore {
    fn list_accounts(&self, filter: &AccountFilter) -> ReportResult<Vec<Account>>;
    fn list_main_categories(&self, include_closed: bool) -> ReportResult<Vec<MainCategory>>;
    fn list_categories(&self, include_closed: bool) -> ReportResult<Vec<Category>>;
    fn list_transactions(&self, filter: &TransactionFilter) -> ReportResult<Vec<TransactionRow>>;
    fn list_budgets(&self, filter: &BudgetFilter) -> ReportResult<Vec<BudgetRow>>;
    /// All stored rates whose target currency is `to`.
    fn list_exchange_rates(&self, to: &str) -> ReportResult<Vec<ExchangeRate>>;

    fn resolve_account_id(&self, pattern: &str) -> ReportResult<i64> {
        let accounts = self.list_accounts(&AccountFilter::default())?;
        unique_match(
            "account",
            pattern,
            accounts.iter().map(|a| (a.id, a.name.as_str())),
        )
    }

    fn resolve_category_id(&self, pattern: &str) -> ReportResult<i64> {
        let categories = self.list_categories(false)?;
        unique_match(
            "category",
            pattern,
            categories.iter().map(|c| (c.id, c.name.as_str())),
        )
    }

    fn resolve_main_category_id(&self, pattern: &str) -> ReportResult<i64> {
        let mains = self.list_main_categories(false)?;
        unique_match(
            "main category",
            pattern,
            mains.iter().map(|m| (m.id, m.name.as_str())),
        )
    }
}

/// Exactly one candidate name must contain `pattern` (case-sensitive).
pub fn unique_match<'a, I>(entity: &'static str, pattern: &str, candidates: I) -> ReportResult<i64>
where
    I: IntoIterator<Item = (i64, &'a str)>,
{
    let hits: Vec<i64> = candidates
        .into_iter()
        .filter(|(_, name)| name.contains(pattern))
        .map(|(id, _)| id)
        .collect();
    match hits.as_slice() {
        [id] => Ok(*id),
        _ => Err(ReportError::AmbiguousOrNotFound {
            entity,
            pattern: pattern.to_string(),
            matches: hits.len(),
        }),
    }
}
