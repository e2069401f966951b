use super::format::{GAP, GAPS, cur, cur_t, month, value, value_t};
use super::{ReportRequest, conversion};
use crate::error::ReportResult;
use crate::store::{LedgerStore, TransactionFilter};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Running net value at the end of every month that has transactions.
///
/// All accounts count, closed ones included. The report has no date window.
pub fn report(store: &dyn LedgerStore, req: &ReportRequest) -> ReportResult<Vec<String>> {
    let reporting = req.reporting_currency()?;
    if let Some(raw) = &req.date {
        tracing::warn!(date = %raw, "net-value covers the whole ledger; --date is ignored");
    }

    let rows = store.list_transactions(&TransactionFilter::default())?;
    let table = conversion(store, &reporting, rows.iter().map(|r| r.currency.as_str()))?;

    let mut per_month: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for r in &rows {
        let amount = table.convert(r.value, &r.currency)?;
        *per_month.entry((r.year, r.month)).or_insert(Decimal::ZERO) += amount;
    }

    let c = cur(&reporting);
    let mut lines = vec![format!(
        "{:<7}{GAP}{}{GAPS}{}",
        "PERIOD",
        value_t("NET VALUE"),
        cur_t("CUR")
    )];
    let mut running = Decimal::ZERO;
    for ((y, m), amount) in per_month {
        running += amount;
        lines.push(format!("{}{GAP}{}{GAPS}{c}", month(y, m), value(running)));
    }
    Ok(lines)
}
