use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::Invoice;

/// Month-over-month change, in percent, beyond which the trend is not stable.
const TREND_THRESHOLD_PERCENT: f64 = 5.0;
const PROJECTION_MONTHS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuePoint {
    /// `YYYY-MM`
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationReport {
    pub current_value: f64,
    pub historical_values: Vec<ValuePoint>,
    pub projected_value: Option<f64>,
    pub trend: Trend,
}

pub fn build(current_value: f64, invoices: &[Invoice]) -> ValuationReport {
    let mut monthly: BTreeMap<String, f64> = BTreeMap::new();
    for invoice in invoices {
        if let Some(date) = invoice.movement_date() {
            *monthly.entry(date.format("%Y-%m").to_string()).or_insert(0.0) += invoice.total;
        }
    }
    let historical_values: Vec<ValuePoint> = monthly
        .into_iter()
        .map(|(date, value)| ValuePoint { date, value })
        .collect();

    ValuationReport {
        current_value,
        trend: trend(&historical_values),
        projected_value: projection(&historical_values),
        historical_values,
    }
}

/// Compares the last two months. A zero previous month is stable.
pub fn trend(values: &[ValuePoint]) -> Trend {
    let [.., previous, last] = values else {
        return Trend::Stable;
    };
    if previous.value == 0.0 {
        return Trend::Stable;
    }

    let change = (last.value - previous.value) / previous.value * 100.0;
    if change > TREND_THRESHOLD_PERCENT {
        Trend::Up
    } else if change < -TREND_THRESHOLD_PERCENT {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Mean of the last three months, when there are at least three.
pub fn projection(values: &[ValuePoint]) -> Option<f64> {
    if values.len() < PROJECTION_MONTHS {
        return None;
    }
    let recent = &values[values.len() - PROJECTION_MONTHS..];
    Some(recent.iter().map(|v| v.value).sum::<f64>() / PROJECTION_MONTHS as f64)
}
