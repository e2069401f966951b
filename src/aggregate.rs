use rust_decimal::Decimal;
use std::ops::AddAssign;

/// An amount that can be accumulated into subtotals and totals.
pub trait Tally: Copy + Default + AddAssign {}

impl Tally for Decimal {}

/// Budget limit and actual value accumulated side by side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetTally {
    pub budget: Decimal,
    pub actual: Decimal,
}

impl BudgetTally {
    pub fn difference(&self) -> Decimal {
        self.actual - self.budget
    }
}

impl AddAssign for BudgetTally {
    fn add_assign(&mut self, rhs: Self) {
        self.budget += rhs.budget;
        self.actual += rhs.actual;
    }
}

impl Tally for BudgetTally {}

#[derive(Debug, Clone, PartialEq)]
pub enum Event<K, L, T> {
    Open(K),
    Line(L),
    Close(K, T),
    Total(T),
}

#[derive(Debug)]
enum State<K, T> {
    NoGroupYet,
    InGroup { key: K, subtotal: T },
}

/// Splits a pre-sorted stream into groups on key change.
///
/// Rows are never reordered: two runs of the same key separated by another key
/// form two groups.
#[derive(Debug)]
pub struct Grouper<K, T> {
    state: State<K, T>,
    total: T,
}

impl<K: PartialEq + Clone, T: Tally> Default for Grouper<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq + Clone, T: Tally> Grouper<K, T> {
    pub fn new() -> Self {
        Self {
            state: State::NoGroupYet,
            total: T::default(),
        }
    }

    pub fn push<L>(&mut self, key: K, line: L, amount: T, out: &mut Vec<Event<K, L, T>>) {
        match &mut self.state {
            State::InGroup {
                key: current,
                subtotal,
            } if *current == key => {
                *subtotal += amount;
            }
            _ => {
                if let State::InGroup { key: prev, subtotal } =
                    std::mem::replace(&mut self.state, State::NoGroupYet)
                {
                    self.total += subtotal;
                    out.push(Event::Close(prev, subtotal));
                }
                out.push(Event::Open(key.clone()));
                self.state = State::InGroup {
                    key,
                    subtotal: amount,
                };
            }
        }
        out.push(Event::Line(line));
    }

    /// Closes the open group, if any, and emits the grand total.
    pub fn flush<L>(mut self, out: &mut Vec<Event<K, L, T>>) {
        if let State::InGroup { key, subtotal } = self.state {
            self.total += subtotal;
            out.push(Event::Close(key, subtotal));
        }
        out.push(Event::Total(self.total));
    }
}

/// Runs a whole stream of `(key, line, amount)` through a [`Grouper`].
pub fn group<K, L, T, I>(rows: I) -> Vec<Event<K, L, T>>
where
    K: PartialEq + Clone,
    T: Tally,
    I: IntoIterator<Item = (K, L, T)>,
{
    let mut grouper = Grouper::new();
    let mut out = Vec::new();
    for (key, line, amount) in rows {
        grouper.push(key, line, amount, &mut out);
    }
    grouper.flush(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn empty_input_yields_only_zero_total() {
        let events = group::<&str, &str, Decimal, _>(Vec::new());
        assert_eq!(events, vec![Event::Total(Decimal::ZERO)]);
    }

    #[test]
    fn single_group_subtotal_equals_total() {
        let events = group(vec![("a", 1, d(2)), ("a", 2, d(3))]);
        assert_eq!(
            events,
            vec![
                Event::Open("a"),
                Event::Line(1),
                Event::Line(2),
                Event::Close("a", d(5)),
                Event::Total(d(5)),
            ]
        );
    }

    #[test]
    fn total_is_sum_of_subtotals_and_order_is_kept() {
        let events = group(vec![
            ("b", 'x', d(1)),
            ("a", 'y', d(10)),
            ("a", 'z', d(-4)),
            ("b", 'w', d(100)),
        ]);
        let closes: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Close(k, t) => Some((*k, *t)),
                _ => None,
            })
            .collect();
        assert_eq!(closes, vec![("b", d(1)), ("a", d(6)), ("b", d(100))]);
        assert_eq!(events.last(), Some(&Event::Total(d(107))));
    }

    #[test]
    fn budget_tally_accumulates_and_derives_difference() {
        let events = group(vec![
            (
                "Cost",
                "Food",
                BudgetTally {
                    budget: d(-100),
                    actual: d(-80),
                },
            ),
            (
                "Cost",
                "Fuel",
                BudgetTally {
                    budget: d(-50),
                    actual: d(-60),
                },
            ),
        ]);
        let Some(Event::Close(_, sub)) = events.iter().find(|e| matches!(e, Event::Close(..)))
        else {
            panic!("no subtotal emitted");
        };
        assert_eq!(sub.budget, d(-150));
        assert_eq!(sub.actual, d(-140));
        assert_eq!(sub.difference(), d(10));
    }
}
