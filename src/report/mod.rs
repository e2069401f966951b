//! Report computation: window, conversion, grouping and rendering.
//!
//! Every report returns its complete output as lines. Nothing is printed until
//! the whole report has been computed, so a failure never leaves partial output.

pub mod balances;
pub mod budget;
pub mod categories;
pub mod format;
pub mod net_value;
pub mod transactions;

use crate::currency::{self, ConversionTable};
use crate::domain::{MainCategoryType, normalize_currency};
use crate::error::{ReportError, ReportResult};
use crate::store::LedgerStore;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Accounts,
    Assets,
    Transactions,
    Categories,
    MainCategories,
    BudgetCategories,
    BudgetMainCategories,
    NetValue,
}

/// Inputs of a report run. `currency` already carries the configured default.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub currency: Option<String>,
    pub date: Option<String>,
    pub account: Option<String>,
    pub category: Option<String>,
    pub main_category: Option<String>,
    pub main_category_type: Option<MainCategoryType>,
    /// Restricts transactions to accounts held in this currency.
    pub account_currency: Option<String>,
}

impl ReportRequest {
    fn reporting_currency(&self) -> ReportResult<String> {
        self.currency
            .as_deref()
            .map(normalize_currency)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ReportError::MissingRequiredParameter {
                name: "currency",
                hint: "Pass --currency or set default_currency in the config file.".to_string(),
            })
    }
}

pub fn run(
    store: &dyn LedgerStore,
    kind: ReportKind,
    req: &ReportRequest,
    today: NaiveDate,
) -> ReportResult<Vec<String>> {
    tracing::debug!(?kind, ?req, %today, "running report");
    match kind {
        ReportKind::Accounts => balances::accounts(store, req, today),
        ReportKind::Assets => balances::assets(store, req, today),
        ReportKind::Transactions => transactions::report(store, req, today),
        ReportKind::Categories => categories::by_category(store, req, today),
        ReportKind::MainCategories => categories::by_main_category(store, req, today),
        ReportKind::BudgetCategories => budget::by_category(store, req, today),
        ReportKind::BudgetMainCategories => budget::by_main_category(store, req, today),
        ReportKind::NetValue => net_value::report(store, req),
    }
}

/// Resolver step shared by all converting reports.
fn conversion<'a, I>(
    store: &dyn LedgerStore,
    reporting: &str,
    used: I,
) -> ReportResult<ConversionTable>
where
    I: IntoIterator<Item = &'a str>,
{
    let rates = store.list_exchange_rates(reporting)?;
    currency::resolve(reporting, used, &rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{d, date, seeded};

    #[test]
    fn converting_reports_need_a_currency() {
        let s = seeded();
        for kind in [
            ReportKind::Assets,
            ReportKind::Transactions,
            ReportKind::Categories,
            ReportKind::MainCategories,
            ReportKind::BudgetCategories,
            ReportKind::BudgetMainCategories,
            ReportKind::NetValue,
        ] {
            let err = run(&s.db, kind, &ReportRequest::default(), date(2024, 3, 1)).unwrap_err();
            assert!(
                matches!(err, ReportError::MissingRequiredParameter { name: "currency", .. }),
                "{kind:?}"
            );
        }
    }

    #[test]
    fn accounts_report_runs_without_currency() {
        let s = seeded();
        let lines = run(
            &s.db,
            ReportKind::Accounts,
            &ReportRequest::default(),
            date(2024, 3, 1),
        )
        .unwrap();
        assert_eq!(lines[0], "Accounts balance on 2024-03-01");
    }

    #[test]
    fn same_snapshot_gives_same_output() {
        let s = seeded();
        s.db.set_rate("EUR", "USD", d("1.1")).unwrap();
        let req = ReportRequest {
            currency: Some("usd".to_string()),
            ..Default::default()
        };
        for kind in [
            ReportKind::Assets,
            ReportKind::Categories,
            ReportKind::NetValue,
            ReportKind::Transactions,
        ] {
            let first = run(&s.db, kind, &req, date(2024, 3, 1)).unwrap();
            let second = run(&s.db, kind, &req, date(2024, 3, 1)).unwrap();
            assert_eq!(first, second, "{kind:?}");
        }
    }
}
