use chrono::{TimeZone, Utc};

pub fn current_timestamp() -> i64 {
  Utc::now().timestamp()
}

// Dates go out of the API as UTC strings.
// chrono formatting reference:
// https://docs.rs/chrono/0.4.19/chrono/format/strftime/index.html
pub fn timestamp_to_date_string(timestamp: i64) -> String {
  match Utc.timestamp_opt(timestamp, 0).single() {
    Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
    None => String::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn epoch_formats_as_expected() {
    assert_eq!("1970-01-01 00:00:00", timestamp_to_date_string(0));
  }

  #[test]
  fn some_timestamp_formats_as_expected() {
    let timestamp: i64 = 1615150740;
    assert_eq!("2021-03-07 20:59:00", timestamp_to_date_string(timestamp));
  }

}
