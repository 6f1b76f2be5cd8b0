use time::{Date, OffsetDateTime};

/// Today's calendar date in the local offset, falling back to UTC when the
/// local offset cannot be determined.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Whole years elapsed between `from` and `to`.
///
/// A year only counts once `to` has reached the (month, day) of `from`.
pub fn elapsed_years(from: Date, to: Date) -> i32 {
    let mut years = to.year() - from.year();
    if (to.month() as u8, to.day()) < (from.month() as u8, from.day()) {
        years -= 1;
    }
    years
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month() as u8,
        date.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_elapsed_years_before_birthday() {
        assert_eq!(elapsed_years(date!(1990 - 06 - 15), date!(2024 - 06 - 14)), 33);
        assert_eq!(elapsed_years(date!(1990 - 06 - 15), date!(2024 - 05 - 30)), 33);
    }

    #[test]
    fn test_elapsed_years_on_and_after_birthday() {
        assert_eq!(elapsed_years(date!(1990 - 06 - 15), date!(2024 - 06 - 15)), 34);
        assert_eq!(elapsed_years(date!(1990 - 06 - 15), date!(2024 - 12 - 01)), 34);
    }

    #[test]
    fn test_elapsed_years_leap_day() {
        assert_eq!(elapsed_years(date!(2000 - 02 - 29), date!(2023 - 02 - 28)), 22);
        assert_eq!(elapsed_years(date!(2000 - 02 - 29), date!(2023 - 03 - 01)), 23);
    }

    #[test]
    fn test_format_date_zero_pads() {
        assert_eq!(format_date(date!(1949 - 01 - 05)), "1949-01-05");
        let early = Date::from_calendar_date(987, time::Month::December, 31).unwrap();
        assert_eq!(format_date(early), "0987-12-31");
    }
}
