//! Shared numeric policy
//!
//! - Rounding is half-away-from-zero to 2 decimal places. Rates are exact
//!   rationals and are rounded in integer arithmetic; averages of measured
//!   values go through `f64` and are rounded on their binary value.
//! - A ratio with a zero denominator is `0.0`, never an error.
//! - The mean of no values is `None`; callers decide how it contributes.

/// Round to 2 decimal places, half away from zero
///
/// Operates on the binary value, so a decimal tie that `f64` stores just
/// below the half rounds down. Use [`percentage`] for count ratios.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole`, rounded to 2 decimals; `0.0` when `whole == 0`
pub fn ratio(part: usize, whole: usize) -> f64 {
    rounded_quotient(part as u128, whole as u128)
}

/// `100 * part / whole`, rounded to 2 decimals; `0.0` when `whole == 0`
pub fn percentage(part: usize, whole: usize) -> f64 {
    rounded_quotient(100 * part as u128, whole as u128)
}

/// Exact `numerator / denominator` rounded half up to hundredths:
/// `floor((200 * n + d) / (2 * d)) / 100`
fn rounded_quotient(numerator: u128, denominator: u128) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let hundredths = (200 * numerator + denominator) / (2 * denominator);
    hundredths as f64 / 100.0
}

/// Arithmetic mean, `None` for an empty input
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Running accumulator for an optional-valued mean
///
/// Absent samples are skipped, so the mean covers present values only.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    /// Add a sample if present
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    /// Number of present samples
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of present samples, `None` if there were none
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}
