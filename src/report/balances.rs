use super::format::{GAP, GAPS, atype, cur, emphasized, name, value};
use super::{ReportRequest, conversion};
use crate::aggregate::{Event, group};
use crate::domain::AccountType;
use crate::error::ReportResult;
use crate::period::{Accepts, DateWindow, resolve_window};
use crate::store::{LedgerStore, TransactionFilter};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
struct AccountBalance {
    account_type: AccountType,
    name: String,
    currency: String,
    total: Decimal,
}

/// Native-currency balance of every open account with transactions up to `on`,
/// ordered by account type then name.
fn account_balances(store: &dyn LedgerStore, on: NaiveDate) -> ReportResult<Vec<AccountBalance>> {
    let rows = store.list_transactions(&TransactionFilter {
        window: Some(DateWindow::UpTo(on)),
        open_accounts_only: true,
        ..Default::default()
    })?;

    let mut sums: BTreeMap<(AccountType, String, i64), (String, Decimal)> = BTreeMap::new();
    for row in rows {
        let entry = sums
            .entry((row.account_type, row.account_name, row.account_id))
            .or_insert((row.currency, Decimal::ZERO));
        entry.1 += row.value;
    }

    Ok(sums
        .into_iter()
        .map(|((account_type, name, _), (currency, total))| AccountBalance {
            account_type,
            name,
            currency,
            total,
        })
        .collect())
}

fn balance_date(req: &ReportRequest, today: NaiveDate) -> ReportResult<NaiveDate> {
    match resolve_window(req.date.as_deref(), Accepts::FullOnly, DateWindow::UpTo(today))? {
        DateWindow::UpTo(on) => Ok(on),
        // FullOnly never yields another window.
        DateWindow::Month(..) | DateWindow::Year(_) => Ok(today),
    }
}

/// Balance per open account in its own currency. Groups mix currencies, so no subtotals.
pub fn accounts(
    store: &dyn LedgerStore,
    req: &ReportRequest,
    today: NaiveDate,
) -> ReportResult<Vec<String>> {
    let on = balance_date(req, today)?;
    let balances = account_balances(store, on)?;

    let mut lines = vec![format!("Accounts balance on {}", on.format("%Y-%m-%d"))];
    let events = group(balances.into_iter().map(|b| (b.account_type, b.clone(), b.total)));
    for event in events {
        match event {
            Event::Open(t) => {
                lines.push(String::new());
                lines.push(atype(t.label()));
            }
            Event::Line(b) => lines.push(format!(
                "{GAP}{}{GAP}{}{GAPS}{}",
                name(&b.name),
                value(b.total),
                cur(&b.currency)
            )),
            Event::Close(..) | Event::Total(_) => {}
        }
    }
    Ok(lines)
}

/// Balances converted into the reporting currency, with per-type subtotals and a total.
pub fn assets(
    store: &dyn LedgerStore,
    req: &ReportRequest,
    today: NaiveDate,
) -> ReportResult<Vec<String>> {
    let reporting = req.reporting_currency()?;
    let on = balance_date(req, today)?;
    let balances = account_balances(store, on)?;
    let table = conversion(
        store,
        &reporting,
        balances.iter().map(|b| b.currency.as_str()),
    )?;

    let converted = balances
        .into_iter()
        .map(|b| {
            let amount = table.convert(b.total, &b.currency)?;
            Ok((b.account_type, b.name, amount))
        })
        .collect::<ReportResult<Vec<_>>>()?;

    let c = cur(&reporting);
    let mut lines = vec![format!("Assets summary on {}:", on.format("%Y-%m-%d"))];
    let events = group(
        converted
            .into_iter()
            .map(|(t, n, amount)| (t, (n, amount), amount)),
    );
    for event in events {
        match event {
            Event::Open(t) => {
                lines.push(String::new());
                lines.push(atype(t.label()));
            }
            Event::Line((n, amount)) => {
                lines.push(format!("{GAP}{}{GAP}{}{GAPS}{c}", name(&n), value(amount)));
            }
            Event::Close(t, subtotal) => lines.push(emphasized(&format!(
                "{}{GAP}{GAP}{}{GAPS}{c}",
                atype(t.label()),
                value(subtotal)
            ))),
            Event::Total(total) => {
                lines.push(String::new());
                lines.push(emphasized(&format!(
                    "{}{GAP}{GAP}{}{GAPS}{c}",
                    name("Total:"),
                    value(total)
                )));
            }
        }
    }
    Ok(lines)
}
