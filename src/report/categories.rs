use super::format::{GAP, GAPS, cur, cur_t, emphasized, mtype, name, name_t, value, value_t};
use super::{ReportRequest, conversion};
use crate::aggregate::{Event, group};
use crate::domain::MainCategoryType;
use crate::error::ReportResult;
use crate::period::{Accepts, DateWindow, resolve_window};
use crate::store::{LedgerStore, TransactionFilter};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Sort key: type descending (Income, Transfer, Cost), then names. Ids split same-named entities.
type RowKey = (Reverse<MainCategoryType>, String, i64, String, i64);

/// Converted totals per (main category, category) for transactions in the window.
fn category_totals(
    store: &dyn LedgerStore,
    reporting: &str,
    window: DateWindow,
) -> ReportResult<BTreeMap<RowKey, Decimal>> {
    let rows = store.list_transactions(&TransactionFilter {
        window: Some(window),
        ..Default::default()
    })?;
    let table = conversion(store, reporting, rows.iter().map(|r| r.currency.as_str()))?;

    let mut totals = BTreeMap::new();
    for r in rows {
        let amount = table.convert(r.value, &r.currency)?;
        let key = (
            Reverse(r.main_category_kind),
            r.main_category_name,
            r.main_category_id,
            r.category_name,
            r.category_id,
        );
        *totals.entry(key).or_insert(Decimal::ZERO) += amount;
    }
    Ok(totals)
}

fn window_for(req: &ReportRequest, today: NaiveDate) -> ReportResult<DateWindow> {
    resolve_window(req.date.as_deref(), Accepts::Any, DateWindow::UpTo(today))
}

/// Renders a type-grouped summary with one name column per entry of `headers`.
fn render(
    title: String,
    headers: &[&str],
    reporting: &str,
    rows: Vec<(MainCategoryType, Vec<String>, Decimal)>,
) -> Vec<String> {
    let c = cur(reporting);
    let mut names_header = String::new();
    for h in headers {
        names_header.push_str(GAP);
        names_header.push_str(&name_t(h));
    }
    // Subtotal lines are indented to line up with the value column.
    let label_pad = " ".repeat(headers.len().saturating_sub(1) * (GAP.len() + 10));

    let mut lines = vec![title];
    let events = group(rows.into_iter().map(|(kind, names, amount)| (kind, (names, amount), amount)));
    for event in events {
        match event {
            Event::Open(kind) => {
                lines.push(String::new());
                lines.push(mtype(kind.label()));
                lines.push(format!(
                    "{names_header}{GAP}{}{GAPS}{}",
                    value_t("VALUE"),
                    cur_t("CUR")
                ));
            }
            Event::Line((names, amount)) => {
                let mut line = String::new();
                for n in &names {
                    line.push_str(GAP);
                    line.push_str(&name(n));
                }
                lines.push(format!("{line}{GAP}{}{GAPS}{c}", value(amount)));
            }
            Event::Close(kind, subtotal) => lines.push(emphasized(&format!(
                "{}    {GAP}{label_pad}{}{GAPS}{c}",
                mtype(kind.label()),
                value(subtotal)
            ))),
            Event::Total(total) => {
                lines.push(String::new());
                lines.push(emphasized(&format!(
                    "{}    {GAP}{label_pad}{}{GAPS}{c}",
                    mtype("Total"),
                    value(total)
                )));
            }
        }
    }
    lines
}

/// Totals per category, grouped by main-category type.
pub fn by_category(
    store: &dyn LedgerStore,
    req: &ReportRequest,
    today: NaiveDate,
) -> ReportResult<Vec<String>> {
    let reporting = req.reporting_currency()?;
    let window = window_for(req, today)?;
    let totals = category_totals(store, &reporting, window)?;

    let rows = totals
        .into_iter()
        .map(|((Reverse(kind), main, _, category, _), amount)| (kind, vec![main, category], amount))
        .collect();
    Ok(render(
        format!("Category summary {}", window.phrase()),
        &["MAIN CAT.", "CATEGORY"],
        &reporting,
        rows,
    ))
}

/// Totals per main category, grouped by main-category type.
pub fn by_main_category(
    store: &dyn LedgerStore,
    req: &ReportRequest,
    today: NaiveDate,
) -> ReportResult<Vec<String>> {
    let reporting = req.reporting_currency()?;
    let window = window_for(req, today)?;
    let totals = category_totals(store, &reporting, window)?;

    let mut per_main: BTreeMap<(Reverse<MainCategoryType>, String, i64), Decimal> = BTreeMap::new();
    for ((kind, main, main_id, _, _), amount) in totals {
        *per_main.entry((kind, main, main_id)).or_insert(Decimal::ZERO) += amount;
    }

    let rows = per_main
        .into_iter()
        .map(|((Reverse(kind), main, _), amount)| (kind, vec![main], amount))
        .collect();
    Ok(render(
        format!("Main category summary {}", window.phrase()),
        &["MAIN CAT."],
        &reporting,
        rows,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::testutil::{d, date, seeded};

    fn req(day: &str) -> ReportRequest {
        ReportRequest {
            currency: Some("USD".to_string()),
            date: Some(day.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn categories_are_grouped_income_first() {
        let s = seeded();
        s.db.set_rate("EUR", "USD", d("1")).unwrap();
        let lines = by_category(&s.db, &req("2024"), date(2024, 6, 1)).unwrap();

        assert_eq!(lines[0], "Category summary during year 2024");
        let income = lines.iter().position(|l| l == "Income  ").unwrap();
        let transfer = lines.iter().position(|l| l == "Transfer").unwrap();
        let cost = lines.iter().position(|l| l == "Cost    ").unwrap();
        assert!(income < transfer && transfer < cost);

        assert!(lines.contains(&"  Living      Fuel            -20.00 USD".to_string()));
        assert!(lines.contains(&"  Living      Groceries       -50.00 USD".to_string()));
        assert!(lines.contains(&emphasized("Cost                          -70.00 USD")));
        // Transfers cancel out.
        assert!(lines.contains(&emphasized("Transfer                        0.00 USD")));
        assert_eq!(
            lines.last(),
            Some(&emphasized("Total                         930.00 USD"))
        );
    }

    #[test]
    fn main_categories_collapse_their_categories() {
        let s = seeded();
        s.db.set_rate("EUR", "USD", d("1")).unwrap();
        let lines = by_main_category(&s.db, &req("2024-02"), date(2024, 6, 1)).unwrap();

        assert_eq!(lines[0], "Main category summary during month 2024-02");
        assert!(lines.contains(&"  MAIN CAT.        VALUE CUR".to_string()));
        assert!(lines.contains(&"  Living          -20.00 USD".to_string()));
        assert!(lines.contains(&emphasized("Cost              -20.00 USD")));
    }

    #[test]
    fn missing_rate_fails_the_whole_report() {
        let s = seeded();
        let err = by_category(&s.db, &req("2024-02-29"), date(2024, 6, 1)).unwrap_err();
        assert!(matches!(err, ReportError::MissingExchangeRate { .. }));
    }

    #[test]
    fn empty_period_prints_only_zero_total() {
        let s = seeded();
        let lines = by_category(&s.db, &req("2020"), date(2024, 6, 1)).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[2],
            emphasized("Total                           0.00 USD")
        );
    }
}
