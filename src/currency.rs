use crate::domain::ExchangeRate;
use crate::error::{ReportError, ReportResult};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// Per-unit factors converting every currency in use into the reporting currency.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionTable {
    reporting: String,
    factors: BTreeMap<String, Decimal>,
}

impl ConversionTable {
    pub fn factor(&self, currency: &str) -> Option<Decimal> {
        if currency == self.reporting {
            return Some(Decimal::ONE);
        }
        self.factors.get(currency).copied()
    }

    /// Converts `value` held in `currency`. Only currencies passed to [`resolve`] are known.
    pub fn convert(&self, value: Decimal, currency: &str) -> ReportResult<Decimal> {
        match self.factor(currency) {
            Some(f) => Ok(value * f),
            None => Err(ReportError::MissingExchangeRate {
                pairs: vec![format!("{currency}-{}", self.reporting)],
            }),
        }
    }
}

/// Builds the conversion table for `reporting` from the direct rates into it.
///
/// `rates` are the stored rates whose target is `reporting`; rows with another
/// target are ignored. Every currency in `used` without a direct rate is reported
/// at once, sorted and listed once.
pub fn resolve<'a, I>(
    reporting: &str,
    used: I,
    rates: &[ExchangeRate],
) -> ReportResult<ConversionTable>
where
    I: IntoIterator<Item = &'a str>,
{
    let direct: BTreeMap<&str, Decimal> = rates
        .iter()
        .filter(|r| r.to == reporting)
        .map(|r| (r.from.as_str(), r.rate))
        .collect();

    let mut factors = BTreeMap::new();
    let mut missing = BTreeSet::new();
    for currency in used {
        if currency == reporting {
            continue;
        }
        match direct.get(currency) {
            Some(rate) => {
                factors.insert(currency.to_string(), *rate);
            }
            None => {
                missing.insert(currency);
            }
        }
    }

    if !missing.is_empty() {
        let pairs = missing
            .into_iter()
            .map(|c| format!("{c}-{reporting}"))
            .collect::<Vec<_>>();
        tracing::debug!(reporting, ?pairs, "exchange rates missing");
        return Err(ReportError::MissingExchangeRate { pairs });
    }

    Ok(ConversionTable {
        reporting: reporting.to_string(),
        factors,
    })
}
