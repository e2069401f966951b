use super::format::{GAP, GAPS, cur, cur_t, emphasized, mtype, name, name_t, value, value_t};
use super::{ReportRequest, conversion};
use crate::aggregate::{BudgetTally, Event, group};
use crate::domain::MainCategoryType;
use crate::error::ReportResult;
use crate::period::{Accepts, DateWindow, resolve_window};
use crate::store::{BudgetFilter, LedgerStore, TransactionFilter};
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::BTreeMap;

type BudgetKey = (Reverse<MainCategoryType>, String, i64, String, i64);

fn budget_window(req: &ReportRequest, today: NaiveDate) -> ReportResult<DateWindow> {
    resolve_window(
        req.date.as_deref(),
        Accepts::MonthOrYear,
        DateWindow::current_month(today),
    )
}

fn title(window: DateWindow) -> String {
    match window {
        DateWindow::Month(y, m) => format!("Budget report for {y}-{m:02}:"),
        DateWindow::Year(y) => format!("Budget report for {y}:"),
        DateWindow::UpTo(d) => format!("Budget report up to {}:", d.format("%Y-%m-%d")),
    }
}

/// Limit and actual per category for the window, both converted.
///
/// Categories appear when they have a budget or a transaction in the period.
/// Transfer main categories are left out entirely.
fn budget_totals(
    store: &dyn LedgerStore,
    reporting: &str,
    window: DateWindow,
) -> ReportResult<BTreeMap<BudgetKey, BudgetTally>> {
    let budgets: Vec<_> = store
        .list_budgets(&BudgetFilter {
            category_id: None,
            window,
        })?
        .into_iter()
        .filter(|b| b.main_category_kind != MainCategoryType::Transfer)
        .collect();
    let actuals: Vec<_> = store
        .list_transactions(&TransactionFilter {
            window: Some(window),
            ..Default::default()
        })?
        .into_iter()
        .filter(|t| t.main_category_kind != MainCategoryType::Transfer)
        .collect();

    let table = conversion(
        store,
        reporting,
        budgets
            .iter()
            .map(|b| b.currency.as_str())
            .chain(actuals.iter().map(|t| t.currency.as_str())),
    )?;

    let mut totals: BTreeMap<BudgetKey, BudgetTally> = BTreeMap::new();
    for b in budgets {
        let amount = table.convert(b.value, &b.currency)?;
        let key = (
            Reverse(b.main_category_kind),
            b.main_category_name,
            b.main_category_id,
            b.category_name,
            b.category_id,
        );
        totals.entry(key).or_default().budget += amount;
    }
    for t in actuals {
        let amount = table.convert(t.value, &t.currency)?;
        let key = (
            Reverse(t.main_category_kind),
            t.main_category_name,
            t.main_category_id,
            t.category_name,
            t.category_id,
        );
        totals.entry(key).or_default().actual += amount;
    }
    Ok(totals)
}

fn render(
    title: String,
    headers: &[&str],
    reporting: &str,
    rows: Vec<(MainCategoryType, Vec<String>, BudgetTally)>,
) -> Vec<String> {
    let c = cur(reporting);
    let amounts = |t: &BudgetTally| {
        format!(
            "{GAP}{}{GAPS}{c}{GAP}{}{GAPS}{c}{GAP}{}{GAPS}{c}",
            value(t.budget),
            value(t.actual),
            value(t.difference())
        )
    };
    let mut header = String::new();
    for h in headers {
        header.push_str(GAP);
        header.push_str(&name_t(h));
    }
    for h in ["LIMIT", "ACTUAL", "DIFFERENCE"] {
        header.push_str(&format!("{GAP}{}{GAPS}{}", value_t(h), cur_t("CUR")));
    }
    let label_pad = " ".repeat(headers.len().saturating_sub(1) * (GAP.len() + 10));

    let mut lines = vec![title];
    let events = group(rows.into_iter().map(|(kind, names, t)| (kind, (names, t), t)));
    for event in events {
        match event {
            Event::Open(kind) => {
                lines.push(String::new());
                lines.push(mtype(kind.label()));
                lines.push(header.clone());
            }
            Event::Line((names, t)) => {
                let mut line = String::new();
                for n in &names {
                    line.push_str(GAP);
                    line.push_str(&name(n));
                }
                line.push_str(&amounts(&t));
                lines.push(line);
            }
            Event::Close(kind, subtotal) => lines.push(emphasized(&format!(
                "{}    {label_pad}{}",
                mtype(kind.label()),
                amounts(&subtotal)
            ))),
            Event::Total(total) => {
                lines.push(String::new());
                lines.push(emphasized(&format!(
                    "{}    {label_pad}{}",
                    mtype("Total"),
                    amounts(&total)
                )));
            }
        }
    }
    lines
}

/// Budget against actual per category for a month or a year.
pub fn by_category(
    store: &dyn LedgerStore,
    req: &ReportRequest,
    today: NaiveDate,
) -> ReportResult<Vec<String>> {
    let reporting = req.reporting_currency()?;
    let window = budget_window(req, today)?;
    let totals = budget_totals(store, &reporting, window)?;

    let rows = totals
        .into_iter()
        .map(|((Reverse(kind), main, _, category, _), t)| (kind, vec![main, category], t))
        .collect();
    Ok(render(
        title(window),
        &["MAIN CAT.", "CATEGORY"],
        &reporting,
        rows,
    ))
}

/// Budget against actual per main category for a month or a year.
pub fn by_main_category(
    store: &dyn LedgerStore,
    req: &ReportRequest,
    today: NaiveDate,
) -> ReportResult<Vec<String>> {
    let reporting = req.reporting_currency()?;
    let window = budget_window(req, today)?;
    let totals = budget_totals(store, &reporting, window)?;

    let mut per_main: BTreeMap<(Reverse<MainCategoryType>, String, i64), BudgetTally> =
        BTreeMap::new();
    for ((kind, main, main_id, _, _), t) in totals {
        *per_main.entry((kind, main, main_id)).or_default() += t;
    }

    let rows = per_main
        .into_iter()
        .map(|((Reverse(kind), main, _), t)| (kind, vec![main], t))
        .collect();
    Ok(render(title(window), &["MAIN CAT."], &reporting, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::testutil::{d, date, seeded};

    fn req(day: Option<&str>) -> ReportRequest {
        ReportRequest {
            currency: Some("USD".to_string()),
            date: day.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn difference_is_actual_minus_budget() {
        let s = seeded();
        // 100 budgeted for a Cost category is stored as -100.
        s.db.set_budget(2024, 1, s.groceries, d("-100"), "USD").unwrap();
        s.db
            .add_transaction(date(2024, 1, 15), s.checking, s.groceries, "", d("-30"))
            .unwrap();

        let lines = by_category(&s.db, &req(Some("2024-01")), date(2024, 6, 1)).unwrap();
        assert_eq!(lines[0], "Budget report for 2024-01:");
        assert!(lines.contains(
            &"  Living      Groceries      -100.00 USD      -80.00 USD       20.00 USD".to_string()
        ));
        assert!(lines.contains(&emphasized(
            "Cost                         -100.00 USD      -80.00 USD       20.00 USD"
        )));
        assert!(lines.contains(
            &"  Salary      Pay               0.00 USD     1000.00 USD     1000.00 USD".to_string()
        ));
        assert_eq!(
            lines.last(),
            Some(&emphasized(
                "Total                        -100.00 USD      920.00 USD     1020.00 USD"
            ))
        );
    }

    #[test]
    fn main_category_rows_sum_their_categories() {
        let s = seeded();
        s.db.set_rate("EUR", "USD", d("1")).unwrap();
        s.db.set_budget(2024, 2, s.groceries, d("-40"), "USD").unwrap();
        s.db.set_budget(2024, 2, s.fuel, d("-30"), "USD").unwrap();

        let lines = by_main_category(&s.db, &req(Some("2024-02")), date(2024, 6, 1)).unwrap();
        assert!(lines.contains(
            &"  MAIN CAT.        LIMIT CUR      ACTUAL CUR  DIFFERENCE CUR".to_string()
        ));
        assert!(lines.contains(
            &"  Living          -70.00 USD      -20.00 USD       50.00 USD".to_string()
        ));
    }

    #[test]
    fn transfers_never_appear() {
        let s = seeded();
        s.db.set_budget(2024, 2, s.to_savings, d("50"), "USD").unwrap();
        s.db.set_rate("EUR", "USD", d("1")).unwrap();
        let lines = by_category(&s.db, &req(Some("2024")), date(2024, 6, 1)).unwrap();
        assert_eq!(lines[0], "Budget report for 2024:");
        assert!(lines.iter().all(|l| !l.contains("ToSavings") && !l.starts_with("Transfer")));
    }

    #[test]
    fn year_window_sums_monthly_budgets_and_converts_them() {
        let s = seeded();
        s.db.set_rate("EUR", "USD", d("2")).unwrap();
        s.db.set_budget(2024, 1, s.fuel, d("-10"), "EUR").unwrap();
        s.db.set_budget(2024, 2, s.fuel, d("-15"), "USD").unwrap();

        let lines = by_category(&s.db, &req(Some("2024")), date(2024, 6, 1)).unwrap();
        // Limit: -10 EUR * 2 + -15 USD. Actual: -20 EUR * 2.
        assert!(lines.contains(
            &"  Living      Fuel            -35.00 USD      -40.00 USD       -5.00 USD".to_string()
        ));
        assert!(lines.contains(&emphasized(
            "Cost                          -35.00 USD      -90.00 USD      -55.00 USD"
        )));
    }

    #[test]
    fn budget_currencies_need_rates_too() {
        let s = seeded();
        // January transactions are all USD; only the budget is in EUR.
        s.db.set_budget(2024, 1, s.groceries, d("-100"), "EUR").unwrap();
        let err = by_category(&s.db, &req(Some("2024-01")), date(2024, 6, 1)).unwrap_err();
        assert!(
            matches!(err, ReportError::MissingExchangeRate { ref pairs } if pairs == &vec!["EUR-USD".to_string()])
        );
    }

    #[test]
    fn full_dates_are_rejected_and_default_is_current_month() {
        let s = seeded();
        let err = by_category(&s.db, &req(Some("2024-01-15")), date(2024, 6, 1)).unwrap_err();
        assert!(matches!(err, ReportError::InvalidDate { .. }));

        let lines = by_category(&s.db, &req(None), date(2024, 1, 20)).unwrap();
        assert_eq!(lines[0], "Budget report for 2024-01:");
    }
}
