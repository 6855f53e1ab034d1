use chrono::{Local, NaiveDate};

/// Current local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Format a date as YYYY-MM-DD (the attendance key format)
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
