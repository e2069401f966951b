//! Fixed-width column helpers shared by reports and listings.

use crate::domain::round_money;
use rust_decimal::{Decimal, RoundingStrategy};

pub const GAP: &str = "  ";
pub const GAPS: &str = " ";
pub const EMP_ON: &str = "\x1b[1m";
pub const EMP_OFF: &str = "\x1b[0m";

/// Left-aligned, padded and truncated to `width` characters.
pub fn fit(s: &str, width: usize) -> String {
    let cut: String = s.chars().take(width).collect();
    format!("{cut:<width$}")
}

pub fn name(s: &str) -> String {
    fit(s, 10)
}

/// Column title: padded, never truncated.
pub fn name_t(s: &str) -> String {
    format!("{s:<10}")
}

pub fn cur(s: &str) -> String {
    fit(s, 3)
}

pub fn cur_t(s: &str) -> String {
    format!("{s:<3}")
}

pub fn desc(s: &str) -> String {
    fit(s, 30)
}

pub fn mtype(s: &str) -> String {
    fit(s, 8)
}

pub fn atype(s: &str) -> String {
    fit(s, 10)
}

/// Money: width 10, two decimals, halves away from zero. Zero never prints as `-0.00`.
pub fn value(v: Decimal) -> String {
    let mut r = round_money(v);
    r.rescale(2);
    if r.is_zero() {
        r.set_sign_positive(true);
    }
    format!("{:>10}", r.to_string())
}

pub fn value_t(s: &str) -> String {
    format!("{s:>10}")
}

/// Exchange rate: width 13, four decimals.
pub fn rate(v: Decimal) -> String {
    let mut r = v.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    r.rescale(4);
    format!("{:>13}", r.to_string())
}

pub fn date(year: i32, month: u32, day: u32) -> String {
    format!("{year:4}-{month:02}-{day:02}")
}

pub fn month(year: i32, month: u32) -> String {
    format!("{year:4}-{month:02}")
}

pub fn emphasized(line: &str) -> String {
    format!("{EMP_ON}{line}{EMP_OFF}")
}
