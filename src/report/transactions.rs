use super::format::{GAP, GAPS, cur, cur_t, date, desc, name, name_t, value, value_t};
use super::{ReportRequest, conversion};
use crate::aggregate::{Event, group};
use crate::domain::{TransactionRow, normalize_currency};
use crate::error::ReportResult;
use crate::period::{Accepts, DateWindow, resolve_window};
use crate::store::{LedgerStore, TransactionFilter};
use chrono::NaiveDate;

/// Resolves the entity filters of `req` against open entities.
fn filter_for(
    store: &dyn LedgerStore,
    req: &ReportRequest,
    window: DateWindow,
) -> ReportResult<TransactionFilter> {
    Ok(TransactionFilter {
        window: Some(window),
        account_id: req
            .account
            .as_deref()
            .map(|p| store.resolve_account_id(p))
            .transpose()?,
        category_id: req
            .category
            .as_deref()
            .map(|p| store.resolve_category_id(p))
            .transpose()?,
        main_category_id: req
            .main_category
            .as_deref()
            .map(|p| store.resolve_main_category_id(p))
            .transpose()?,
        main_category_type: req.main_category_type,
        currency: req.account_currency.as_deref().map(normalize_currency),
        open_accounts_only: false,
    })
}

/// Flat list of matching transactions, converted, with a total.
pub fn report(
    store: &dyn LedgerStore,
    req: &ReportRequest,
    today: NaiveDate,
) -> ReportResult<Vec<String>> {
    let reporting = req.reporting_currency()?;
    let window = resolve_window(req.date.as_deref(), Accepts::Any, DateWindow::UpTo(today))?;
    let filter = filter_for(store, req, window)?;
    let rows = store.list_transactions(&filter)?;
    let table = conversion(store, &reporting, rows.iter().map(|r| r.currency.as_str()))?;

    let converted = rows
        .into_iter()
        .map(|r| {
            let amount = table.convert(r.value, &r.currency)?;
            Ok(((), (r, amount), amount))
        })
        .collect::<ReportResult<Vec<_>>>()?;

    let c = cur(&reporting);
    let mut lines = vec![
        format!("Transactions {}", window.phrase()),
        String::new(),
        format!(
            "{:<10}{GAP}{}{GAP}{}{GAP}{}{GAP}{}{GAPS}{}{GAP}{:<30}",
            "DATE",
            name_t("MAIN CAT."),
            name_t("CATEGORY"),
            name_t("ACCOUNT"),
            value_t("VALUE"),
            cur_t("CUR"),
            "DESCRIPTION"
        ),
    ];
    for event in group(converted) {
        match event {
            Event::Line((row, amount)) => lines.push(render_row(&row, amount, &c)),
            Event::Total(total) => {
                lines.push(String::new());
                lines.push(format!("Total: {}{GAPS}{c}", value(total)));
            }
            Event::Open(()) | Event::Close((), _) => {}
        }
    }
    Ok(lines)
}

fn render_row(row: &TransactionRow, amount: rust_decimal::Decimal, c: &str) -> String {
    format!(
        "{}{GAP}{}{GAP}{}{GAP}{}{GAP}{}{GAPS}{c}{GAP}{}",
        date(row.year, row.month, row.day),
        name(&row.main_category_name),
        name(&row.category_name),
        name(&row.account_name),
        value(amount),
        desc(&row.description)
    )
}
