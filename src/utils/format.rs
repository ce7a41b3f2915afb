// Display helpers for addresses, references and timestamps

use chrono::{DateTime, Utc};

/// Addresses up to this length are shown as-is
const MAX_PLAIN_LEN: usize = 20;

/// `0x1234...abcd` for long addresses, unchanged otherwise
pub fn shorten_address(address: &str) -> String {
    shorten(address, 6, 4)
}

fn shorten(value: &str, start_chars: usize, end_chars: usize) -> String {
    if value.len() <= MAX_PLAIN_LEN || !value.is_ascii() {
        return value.to_string();
    }
    format!("{}...{}", &value[..start_chars], &value[value.len() - end_chars..])
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_shorten_address() {
        assert_eq!(
            shorten_address("0xf37a740f4c3f7afd7269cec210525f85cb03e57a"),
            "0xf37a...e57a"
        );
        assert_eq!(shorten_address("bob"), "bob");
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(format_date(&date), "2025-03-04 05:06");
    }
}
