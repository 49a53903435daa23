//! Test data generators and date helpers

use chrono::{DateTime, Duration as ChronoDuration, Local, SecondsFormat, TimeZone, Utc};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

const DIGITS: &[u8] = b"0123456789";
const LETTERS: &[u8] = b"AaBbCcDdEeFfGgHhIiJjKkLlMmNnOoPpQqRrSsTtUuVvWwXxYyZz";

fn pick(charset: &[u8], size: usize) -> String {
    let mut rng = rand::thread_rng();
    let dist = Uniform::from(0..charset.len());
    (0..size).map(|_| charset[dist.sample(&mut rng)] as char).collect()
}

/// `qaTest<7 digits>@<domain>`, intended to be unique per run
pub fn random_email(domain: &str) -> String {
    format!("qaTest{}@{}", pick(DIGITS, 7), domain)
}

/// String of `size` random digits
pub fn random_number(size: usize) -> String {
    pick(DIGITS, size)
}

/// String of `size` random ASCII letters
pub fn rand_string(size: usize) -> String {
    pick(LETTERS, size)
}

/// Random value in `[low, high)`
pub fn random_in_range(low: u64, high: u64) -> u64 {
    if low >= high {
        return low;
    }
    rand::thread_rng().gen_range(low..high)
}

/// Fresh UUID v4
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Local time as `YYYYMMDDHHmm`, or `YYYY-MM-DD-HH-mm` with separators
pub fn current_date_time(separator: bool) -> String {
    format_date_time(&Local::now(), separator)
}

fn format_date_time<Tz: TimeZone>(at: &DateTime<Tz>, separator: bool) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if separator {
        at.format("%Y-%m-%d-%H-%M").to_string()
    } else {
        at.format("%Y%m%d%H%M").to_string()
    }
}

/// Local time in RFC 3339 with seconds precision
pub fn timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// UTC ISO-8601 instant `days` from now, millisecond precision
pub fn days_to_date(days: i64) -> String {
    days_from(Utc::now(), days)
}

fn days_from(now: DateTime<Utc>, days: i64) -> String {
    (now + ChronoDuration::days(days)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fractional seconds since the Unix epoch
pub fn unix_time() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Local date `days` from today as `M/D/YYYY`
pub fn due_date(days: i64) -> String {
    short_date(&(Local::now() + ChronoDuration::days(days)))
}

fn short_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%-m/%-d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_email_shape() {
        let email = random_email("email.com");
        assert!(email.starts_with("qaTest"));
        assert!(email.ends_with("@email.com"));
        let digits = &email["qaTest".len()..email.len() - "@email.com".len()];
        assert_eq!(digits.len(), 7);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_random_strings() {
        assert_eq!(random_number(12).len(), 12);
        assert!(random_number(12).chars().all(|c| c.is_ascii_digit()));
        assert!(rand_string(20).chars().all(|c| c.is_ascii_alphabetic()));
        assert_eq!(rand_string(0), "");
    }

    #[test]
    fn test_random_in_range() {
        for _ in 0..50 {
            let n = random_in_range(5, 8);
            assert!((5..8).contains(&n));
        }
        assert_eq!(random_in_range(9, 9), 9);
    }

    #[test]
    fn test_generate_id_is_uuid() {
        let id = generate_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_ne!(id, generate_id());
    }

    #[test]
    fn test_date_formats() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(format_date_time(&at, false), "202403070905");
        assert_eq!(format_date_time(&at, true), "2024-03-07-09-05");
        assert_eq!(short_date(&at), "3/7/2024");
        assert_eq!(days_from(at, 2), "2024-03-09T09:05:00.000Z");
        assert_eq!(days_from(at, -7), "2024-02-29T09:05:00.000Z");
    }

    #[test]
    fn test_unix_time_is_recent() {
        assert!(unix_time() > 1_700_000_000.0);
    }
}
