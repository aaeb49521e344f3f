//! Reference calculators for the built-in task kinds.
//!
//! These run inside a worker. They are pure functions of their input and
//! keep no state between jobs.

use crate::task::{
    AnalyticsInput, AnalyticsOperation, ChartInput, ChartPoint, CurrencyInput, PricingInput,
};

/// Pivot currency for conversions.
pub const PIVOT_CURRENCY: &str = "EUR";

/// Add-on prices used by [`pricing`].
pub const OPTION_PRICES: &[(&str, f64)] = &[
    ("seo-optimization", 49.0),
    ("analytics", 29.0),
    ("chat-widget", 39.0),
    ("newsletter", 19.0),
    ("blog", 59.0),
    ("multilingual", 79.0),
];

/// Price of a single add-on, zero for unknown codes.
pub fn option_price(code: &str) -> f64 {
    OPTION_PRICES
        .iter()
        .find(|(name, _)| *name == code)
        .map_or(0.0, |(_, price)| *price)
}

/// Volume discount rate for a quantity.
pub fn volume_discount(quantity: u32) -> f64 {
    match quantity {
        q if q >= 6 => 0.10,
        q if q >= 2 => 0.05,
        _ => 0.0,
    }
}

/// Total price: volume-discounted subtotal, plus add-ons, plus tax, rounded
/// to cents.
pub fn pricing(input: &PricingInput) -> f64 {
    let mut total = input.base_price;

    if let Some(quantity) = input.quantity
        && quantity > 1
    {
        total = total * f64::from(quantity) * (1.0 - volume_discount(quantity));
    }

    total += input.options.iter().map(|code| option_price(code)).sum::<f64>();

    if let Some(rate) = input.tax_rate
        && rate != 0.0
    {
        total *= 1.0 + rate / 100.0;
    }

    round_cents(total)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aggregate over a series. An empty series yields zero for every operation.
pub fn analytics(input: &AnalyticsInput) -> f64 {
    let data = &input.data;
    if data.is_empty() {
        return 0.0;
    }

    match input.operation {
        AnalyticsOperation::Sum => data.iter().sum(),
        AnalyticsOperation::Average => mean(data),
        AnalyticsOperation::Median => {
            let mut sorted = data.clone();
            sorted.sort_by(f64::total_cmp);
            let mid = sorted.len() / 2;
            if sorted.len() % 2 != 0 {
                sorted[mid]
            } else {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            }
        }
        AnalyticsOperation::Stddev => {
            let mean = mean(data);
            let variance =
                data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / data.len() as f64;
            variance.sqrt()
        }
    }
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

/// Convert through the EUR pivot. Missing or zero rates count as 1.
pub fn currency(input: &CurrencyInput) -> f64 {
    let rate = |code: &str| {
        input
            .rates
            .get(code)
            .copied()
            .filter(|r| *r != 0.0)
            .unwrap_or(1.0)
    };

    let base = if input.from == PIVOT_CURRENCY {
        input.amount
    } else {
        input.amount / rate(&input.from)
    };

    if input.to == PIVOT_CURRENCY {
        base
    } else {
        base * rate(&input.to)
    }
}

/// Centered moving average of the `y` values. `x` values are untouched.
pub fn chart(input: &ChartInput) -> Vec<ChartPoint> {
    let data = &input.data;
    let smoothing = match input.smoothing {
        Some(s) if s > 0.0 => s,
        _ => return data.clone(),
    };

    let window = (smoothing.floor() as usize).max(2);
    let before = window / 2;
    let after = window.div_ceil(2);

    data.iter()
        .enumerate()
        .map(|(index, point)| {
            let start = index.saturating_sub(before);
            let end = (index + after).min(data.len());
            let slice = &data[start..end];
            let avg = slice.iter().map(|p| p.y).sum::<f64>() / slice.len() as f64;
            ChartPoint::new(point.x, avg)
        })
        .collect()
}
