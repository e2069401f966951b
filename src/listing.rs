//! Fixed-width listings of ledger entities, as printed by `moneta list`.

use crate::domain::{Account, BudgetRow, Category, ExchangeRate, ItemStatus, MainCategory};
use crate::report::format::{
    GAP, GAPS, atype, cur, cur_t, desc, fit, month, mtype, name, name_t, rate, value, value_t,
};

fn with_status(line: String, status: ItemStatus) -> String {
    match status {
        ItemStatus::Open => line,
        ItemStatus::Closed => format!("{line}{GAP}({})", status.label()),
    }
}

pub fn accounts(accounts: &[Account]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:>5}{GAP}{}{GAP}{}{GAP}{}{GAP}{:<20}{GAP}{}",
        "ID",
        name_t("NAME"),
        atype("TYPE"),
        cur_t("CUR"),
        "INSTITUTION",
        "DESCRIPTION"
    )];
    for a in accounts {
        let line = format!(
            "{:>5}{GAP}{}{GAP}{}{GAP}{}{GAP}{}{GAP}{}",
            a.id,
            name(&a.name),
            atype(a.account_type.label()),
            cur(&a.currency),
            fit(&a.institution, 20),
            desc(&a.description)
        );
        lines.push(with_status(line, a.status));
    }
    lines
}

pub fn main_categories(mains: &[MainCategory]) -> Vec<String> {
    let mut lines = vec![format!("{:>5}{GAP}{}{GAP}{}", "ID", mtype("TYPE"), name_t("NAME"))];
    for m in mains {
        let line = format!(
            "{:>5}{GAP}{}{GAP}{}",
            m.id,
            mtype(m.kind.label()),
            name(&m.name)
        );
        lines.push(with_status(line, m.status));
    }
    lines
}

pub fn categories(categories: &[Category]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:>5}{GAP}{:<11}{GAP}{}{GAP}{}",
        "ID",
        "TYPE",
        name_t("MAIN"),
        name_t("CATEGORY")
    )];
    for c in categories {
        let line = format!(
            "{:>5}{GAP}{}{GAP}{}{GAP}{}",
            c.id,
            fit(c.main_category_kind.label(), 11),
            name(&c.main_category_name),
            name(&c.name)
        );
        lines.push(with_status(line, c.status));
    }
    lines
}

pub fn rates(rates: &[ExchangeRate]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<13}{GAP}{:<13}{GAP}{:<13}",
        "CURRENCY FROM", "CURRENCY TO", "EXCHANGE RATE"
    )];
    for r in rates {
        lines.push(format!(
            "{}{GAP}{}{GAP}{}",
            fit(&r.from, 13),
            fit(&r.to, 13),
            rate(r.rate)
        ));
    }
    lines
}

pub fn budgets(budgets: &[BudgetRow]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<7}{GAP}{}{GAP}{}{GAP}{}{GAP}{}{GAPS}{}",
        "PERIOD",
        mtype("TYPE"),
        name_t("MAIN CAT."),
        name_t("CATEGORY"),
        value_t("VALUE"),
        cur_t("CUR")
    )];
    for b in budgets {
        lines.push(format!(
            "{}{GAP}{}{GAP}{}{GAP}{}{GAP}{}{GAPS}{}",
            month(b.year, b.month),
            mtype(b.main_category_kind.label()),
            name(&b.main_category_name),
            name(&b.category_name),
            value(b.value),
            cur(&b.currency)
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::DateWindow;
    use crate::store::{AccountFilter, BudgetFilter, LedgerStore};
    use crate::testutil::{d, seeded};

    #[test]
    fn accounts_are_listed_in_fixed_columns() {
        let s = seeded();
        let listed = s.db.list_accounts(&AccountFilter::default()).unwrap();
        let lines = accounts(&listed);
        assert_eq!(
            lines[0],
            "   ID  NAME        TYPE        CUR  INSTITUTION           DESCRIPTION"
        );
        assert!(lines[1].starts_with(&format!(
            "{:>5}  Checking    Operations  USD  Bank A                daily",
            s.checking
        )));
    }

    #[test]
    fn closed_entities_are_marked() {
        let s = seeded();
        s.db.close_account(s.euro).unwrap();
        let listed = s
            .db
            .list_accounts(&AccountFilter {
                include_closed: true,
                ..Default::default()
            })
            .unwrap();
        let lines = accounts(&listed);
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().any(|l| l.contains("Euro") && l.ends_with("(Closed)")));
        assert!(!lines.iter().any(|l| l.contains("Checking") && l.ends_with("(Closed)")));
    }

    #[test]
    fn categories_show_their_main_category() {
        let s = seeded();
        let lines = categories(&s.db.list_categories(false).unwrap());
        assert_eq!(lines[0], "   ID  TYPE         MAIN        CATEGORY  ");
        assert!(lines.iter().any(|l| l.ends_with("Cost         Living      Groceries ")));

        let lines = main_categories(&s.db.list_main_categories(false).unwrap());
        assert_eq!(lines[0], "   ID  TYPE      NAME      ");
        assert!(lines[1].ends_with("Income    Salary    "));
    }

    #[test]
    fn rates_use_four_decimals() {
        let lines = rates(&[ExchangeRate {
            from: "EUR".to_string(),
            to: "USD".to_string(),
            rate: d("1.08125"),
        }]);
        assert_eq!(lines[0], "CURRENCY FROM  CURRENCY TO    EXCHANGE RATE");
        assert_eq!(lines[1], "EUR            USD                   1.0813");
    }

    #[test]
    fn budgets_show_signed_values() {
        let s = seeded();
        s.db.set_budget(2024, 1, s.groceries, d("-100"), "USD").unwrap();
        let rows = s
            .db
            .list_budgets(&BudgetFilter {
                category_id: None,
                window: DateWindow::Month(2024, 1),
            })
            .unwrap();
        let lines = budgets(&rows);
        assert_eq!(
            lines[0],
            "PERIOD   TYPE      MAIN CAT.   CATEGORY         VALUE CUR"
        );
        assert_eq!(
            lines[1],
            "2024-01  Cost      Living      Groceries      -100.00 USD"
        );
    }
}
