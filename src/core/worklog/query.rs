// Argument parsing for the `w` command. The original accepted its pieces in
// several orders (`w y Alice`, `w all y`, `w 27May2025 all`), so tokens are
// classified independently instead of positionally.

use chrono::{Duration, NaiveDate};

use super::dates::{self, DateParseError};

/// Whose work to summarize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Named(String),
    All,
}

impl Subject {
    /// Display label for headers and not-found replies.
    pub fn label(&self) -> String {
        match self {
            Subject::Named(name) => name.clone(),
            Subject::All => "ทั้งหมด".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkQuery {
    pub date: NaiveDate,
    pub subject: Subject,
}

impl WorkQuery {
    /// Parse the free-form argument string of `w`.
    ///
    /// Tokens: `y` selects yesterday, `all` aggregates every user, anything
    /// matching the date pattern sets the date, and the remaining tokens make
    /// up the name. No date token means today; no name means `all`.
    pub fn parse(args: &str, today: NaiveDate) -> Result<Self, DateParseError> {
        let mut date = today;
        let mut all = false;
        let mut name_parts: Vec<&str> = Vec::new();

        for token in args.split_whitespace() {
            if token.eq_ignore_ascii_case("y") || token.eq_ignore_ascii_case("yesterday") {
                date = today - Duration::days(1);
            } else if token.eq_ignore_ascii_case("all") {
                all = true;
            } else if dates::is_date_token(token) {
                date = dates::parse_date_token(token)?;
            } else {
                name_parts.push(token);
            }
        }

        let subject = if all || name_parts.is_empty() {
            Subject::All
        } else {
            Subject::Named(name_parts.join(" "))
        };

        Ok(Self { date, subject })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 27).unwrap()
    }

    #[test]
    fn bare_name_defaults_to_today() {
        let query = WorkQuery::parse("Alice", today()).unwrap();
        assert_eq!(query.date, today());
        assert_eq!(query.subject, Subject::Named("Alice".to_string()));
    }

    #[test]
    fn y_selects_yesterday() {
        let query = WorkQuery::parse("y Alice", today()).unwrap();
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2025, 5, 26).unwrap());
        assert_eq!(query.subject, Subject::Named("Alice".to_string()));
    }

    #[test]
    fn explicit_date_before_name() {
        let query = WorkQuery::parse("01May2025 Alice", today()).unwrap();
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        assert_eq!(query.subject, Subject::Named("Alice".to_string()));
    }

    #[test]
    fn all_tokens_compose_in_any_order() {
        let query = WorkQuery::parse("all y", today()).unwrap();
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2025, 5, 26).unwrap());
        assert_eq!(query.subject, Subject::All);

        let query = WorkQuery::parse("27May2025 all", today()).unwrap();
        assert_eq!(query.date, today());
        assert_eq!(query.subject, Subject::All);
    }

    #[test]
    fn multi_word_names_are_joined() {
        let query = WorkQuery::parse("y Mary Jane", today()).unwrap();
        assert_eq!(query.subject, Subject::Named("Mary Jane".to_string()));
    }

    #[test]
    fn empty_args_mean_everyone_today() {
        let query = WorkQuery::parse("", today()).unwrap();
        assert_eq!(query.date, today());
        assert_eq!(query.subject, Subject::All);
    }

    #[test]
    fn malformed_date_token_is_an_error() {
        let err = WorkQuery::parse("27Qqq2025 Alice", today()).unwrap_err();
        assert_eq!(err, DateParseError::BadToken("27Qqq2025".to_string()));
    }
}
