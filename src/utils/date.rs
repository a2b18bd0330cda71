// Due date parsing and formatting

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use anyhow::Result;

/// Parse a date expression and return Unix timestamp (UTC)
///
/// Supported: `2026-01-10`, `2026-01-10T14:30`, `today`, `tomorrow`,
/// and day offsets like `+3d`.
pub fn parse_date_expr(expr: &str) -> Result<i64> {
    let expr = expr.trim();

    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        return local_midnight(date);
    }

    if let Ok(datetime) = NaiveDateTime::parse_from_str(expr, "%Y-%m-%dT%H:%M") {
        let local_dt = Local.from_local_datetime(&datetime)
            .single()
            .ok_or_else(|| anyhow::anyhow!("Ambiguous datetime"))?;
        return Ok(local_dt.timestamp());
    }

    let today = Local::now().date_naive();
    match expr {
        "today" => local_midnight(today),
        "tomorrow" => local_midnight(today + chrono::Duration::days(1)),
        _ => {
            if let Some(days) = expr.strip_prefix('+').and_then(|s| s.strip_suffix('d')) {
                let days: i64 = days
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid day offset: {}", expr))?;
                return local_midnight(today + chrono::Duration::days(days));
            }
            anyhow::bail!(
                "Unsupported date expression: '{}'. Use YYYY-MM-DD, YYYY-MM-DDTHH:MM, today, tomorrow, or +Nd.",
                expr
            )
        }
    }
}

fn local_midnight(date: NaiveDate) -> Result<i64> {
    let datetime = date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;
    let local_dt = Local.from_local_datetime(&datetime)
        .single()
        .ok_or_else(|| anyhow::anyhow!("Ambiguous date"))?;
    Ok(local_dt.timestamp())
}

/// Format a timestamp as a local date (YYYY-MM-DD)
pub fn format_date(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => "?".to_string(),
    }
}

/// Format a timestamp as local date and time
pub fn format_datetime(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute_date() {
        let ts = parse_date_expr("2026-01-10").unwrap();
        assert_eq!(format_date(ts), "2026-01-10");
    }

    #[test]
    fn test_parse_datetime() {
        let ts = parse_date_expr("2026-01-10T14:30").unwrap();
        assert_eq!(format_datetime(ts), "2026-01-10 14:30");
    }

    #[test]
    fn test_parse_relative() {
        let today = parse_date_expr("today").unwrap();
        let tomorrow = parse_date_expr("tomorrow").unwrap();
        let plus_one = parse_date_expr("+1d").unwrap();
        assert!(tomorrow > today);
        assert_eq!(tomorrow, plus_one);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_date_expr("next week").is_err());
        assert!(parse_date_expr("+xd").is_err());
        assert!(parse_date_expr("2026-13-40").is_err());
    }
}
