// Date-token handling for the chat commands. Tokens look like `27May2025`
// (day, month abbreviation of three or more letters, 2- or 4-digit year).

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateParseError {
    #[error("unrecognized date token `{0}`")]
    BadToken(String),
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})([A-Za-z]{3,9})(\d{2,4})$").expect("date token regex is valid")
    })
}

/// Does this command argument look like a date token at all? Arguments that
/// don't are treated as name fragments by the query parser.
pub fn is_date_token(token: &str) -> bool {
    token_regex().is_match(token.trim())
}

/// Parse `27May2025` / `27May25` into a date. Two-digit years live in the
/// 2000s, matching how the sheet stores them.
pub fn parse_date_token(token: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = token.trim();
    let caps = token_regex()
        .captures(trimmed)
        .ok_or_else(|| DateParseError::BadToken(trimmed.to_string()))?;

    let day = &caps[1];
    let month = &caps[2];
    let mut year: i32 = caps[3]
        .parse()
        .map_err(|_| DateParseError::BadToken(trimmed.to_string()))?;
    if year < 100 {
        year += 2000;
    }

    // %b accepts both abbreviated and full month names, case-insensitively.
    NaiveDate::parse_from_str(&format!("{} {} {}", day, month, year), "%d %b %Y")
        .map_err(|_| DateParseError::BadToken(trimmed.to_string()))
}

/// Parse the `<start>-<end>` range argument of the `most` command.
pub fn parse_date_range(range: &str) -> Result<(NaiveDate, NaiveDate), DateParseError> {
    let (from, to) = range
        .split_once('-')
        .ok_or_else(|| DateParseError::BadToken(range.trim().to_string()))?;
    Ok((parse_date_token(from)?, parse_date_token(to)?))
}

/// "Today" as the café experiences it, regardless of where the bot is hosted.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_digit_year() {
        assert_eq!(
            parse_date_token("27May2025"),
            Ok(NaiveDate::from_ymd_opt(2025, 5, 27).unwrap())
        );
    }

    #[test]
    fn parses_two_digit_year_into_the_2000s() {
        assert_eq!(
            parse_date_token("1May25"),
            Ok(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap())
        );
    }

    #[test]
    fn parses_full_month_name() {
        assert_eq!(
            parse_date_token("03September2024"),
            Ok(NaiveDate::from_ymd_opt(2024, 9, 3).unwrap())
        );
    }

    #[test]
    fn rejects_garbage_month() {
        assert_eq!(
            parse_date_token("27Xyz2025"),
            Err(DateParseError::BadToken("27Xyz2025".to_string()))
        );
    }

    #[test]
    fn rejects_impossible_day() {
        assert!(parse_date_token("32May2025").is_err());
    }

    #[test]
    fn name_fragments_are_not_date_tokens() {
        assert!(!is_date_token("Alice"));
        assert!(!is_date_token("27May"));
        assert!(!is_date_token("all"));
        assert!(is_date_token("27May2025"));
    }

    #[test]
    fn parses_inclusive_range_argument() {
        let (start, end) = parse_date_range("25May2025-26May2025").unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 5, 25).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 5, 26).unwrap());
    }

    #[test]
    fn range_without_separator_is_rejected() {
        assert!(parse_date_range("25May2025").is_err());
    }
}
