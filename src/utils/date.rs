use chrono::{Datelike, Duration, NaiveDate, Utc};

/// Parse a compact vendor date string (YYYYMMDD) into a NaiveDate
pub fn parse_compact_date(date_str: &str) -> anyhow::Result<NaiveDate> {
    let date = NaiveDate::parse_from_str(date_str, "%Y%m%d")?;
    Ok(date)
}

/// Format a NaiveDate as a compact vendor date string (YYYYMMDD)
pub fn format_compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Render a compact date string with dashes (YYYY-MM-DD) for display
pub fn display_date(compact: &str) -> String {
    match parse_compact_date(compact) {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => compact.to_string(),
    }
}

/// Today's date as a compact string
pub fn today_compact() -> String {
    format_compact_date(Utc::now().date_naive())
}

/// The date `days` calendar days ago as a compact string
pub fn days_ago_compact(days: i64) -> String {
    format_compact_date(Utc::now().date_naive() - Duration::days(days))
}

/// Check if a date is a weekend (Saturday or Sunday)
pub fn is_weekend(date: NaiveDate) -> bool {
    let weekday = date.weekday();
    weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun
}

/// Latest day the market could have traded on, stepping back over weekends
pub fn latest_trading_day_from(today: NaiveDate) -> NaiveDate {
    match today.weekday() {
        chrono::Weekday::Sun => today - Duration::days(2),
        chrono::Weekday::Sat => today - Duration::days(1),
        _ => today,
    }
}

/// Latest possible trading day relative to now
pub fn latest_trading_day() -> NaiveDate {
    latest_trading_day_from(Utc::now().date_naive())
}

/// Start/end compact dates covering the trailing `days` calendar days from `end`
pub fn trailing_window_from(end: NaiveDate, days: i64) -> (String, String) {
    let start = end - Duration::days(days);
    (format_compact_date(start), format_compact_date(end))
}

/// Start/end compact dates covering the trailing `days` calendar days from today
pub fn trailing_window(days: i64) -> (String, String) {
    trailing_window_from(Utc::now().date_naive(), days)
}

/// Quarter-end report periods (YYYYMMDD) for the last `years` years as of `today`,
/// newest first. Only periods that have already ended are included.
pub fn report_periods_as_of(years: u32, today: NaiveDate) -> Vec<String> {
    let mut periods = Vec::new();
    let current_year = today.year();

    for year in (current_year - years as i32 + 1..=current_year).rev() {
        for &(month, day) in &[(12, 31), (9, 30), (6, 30), (3, 31)] {
            if let Some(quarter_end) = NaiveDate::from_ymd_opt(year, month, day) {
                if quarter_end <= today {
                    periods.push(format_compact_date(quarter_end));
                }
            }
        }
    }

    periods
}

/// Quarter-end report periods for the last `years` years, newest first
pub fn report_periods(years: u32) -> Vec<String> {
    report_periods_as_of(years, Utc::now().date_naive())
}

/// Whole years elapsed since a compact listing date
pub fn years_since_compact(compact: &str, today: NaiveDate) -> Option<f64> {
    let listed = parse_compact_date(compact).ok()?;
    let days = (today - listed).num_days();
    if days < 0 {
        return None;
    }
    Some(days as f64 / 365.25)
}
