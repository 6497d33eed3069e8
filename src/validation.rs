/// Shared input validation for route handlers.
use chrono::NaiveDate;

/// Parse a calendar date in `YYYY-MM-DD` form. Rejects other formats and
/// impossible dates like `2025-02-30`.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, &'static str> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| "Date must be in YYYY-MM-DD format")
}

/// Validate a `(startDate, endDate)` pair: both well-formed and ordered.
pub fn validate_date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), &'static str> {
    let start = parse_iso_date(start)?;
    let end = parse_iso_date(end)?;
    if start > end {
        return Err("startDate must not be after endDate");
    }
    Ok((start, end))
}

/// Identifiers arriving in path segments and request bodies: non-empty,
/// bounded, no whitespace or key-separator characters.
pub fn validate_id(id: &str) -> Result<(), &'static str> {
    if id.is_empty() {
        return Err("Identifier must not be empty");
    }
    if id.len() > 128 {
        return Err("Identifier must not exceed 128 characters");
    }
    if !id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'#' || b == b'.')
    {
        return Err("Identifier contains invalid characters");
    }
    Ok(())
}
