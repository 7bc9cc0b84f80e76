use crate::core::AmortizationSchedule;

pub const SCHEDULE_CSV_HEADER: [&str; 5] = ["Month", "Payment", "Principal", "Interest", "Balance"];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer flush failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv output was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Writes the schedule as CSV with money rounded to cents.
pub fn schedule_to_csv(schedule: &AmortizationSchedule) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::with_capacity(schedule.len() * 48));
    wtr.write_record(SCHEDULE_CSV_HEADER)?;
    for row in schedule.rows() {
        wtr.write_record([
            row.month.to_string(),
            format_cents(row.payment),
            format_cents(row.principal),
            format_cents(row.interest),
            format_cents(row.balance),
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

pub fn format_cents(value: f64) -> String {
    format!("{value:.2}")
}

/// `$1,234.56` style display, negatives as `-$1,234.56`. Non-finite values
/// render as `n/a`.
pub fn format_money(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let cents = format_cents(value.abs());
    let (whole, frac) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{frac}")
}
