use chrono::{DateTime, Datelike, NaiveDate, Weekday};

const MONTHS: [&str; 12] = [
    "Ocak", "Şubat", "Mart", "Nisan", "Mayıs", "Haziran", "Temmuz", "Ağustos", "Eylül", "Ekim",
    "Kasım", "Aralık",
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Pazartesi",
        Weekday::Tue => "Salı",
        Weekday::Wed => "Çarşamba",
        Weekday::Thu => "Perşembe",
        Weekday::Fri => "Cuma",
        Weekday::Sat => "Cumartesi",
        Weekday::Sun => "Pazar",
    }
}

/// Long Turkish date, e.g. `15 Şubat 2024 Perşembe`.
///
/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp; anything else
/// comes back unchanged.
pub fn format_date(value: &str) -> String {
    let parsed = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()));

    match parsed {
        Some(date) => format!(
            "{} {} {} {}",
            date.day(),
            MONTHS[date.month0() as usize],
            date.year(),
            weekday_name(date.weekday())
        ),
        None => value.to_string(),
    }
}
