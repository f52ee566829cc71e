//! Human-readable document codes (order, storage, transfer numbers).
//!
//! Codes are allocated from the `code_sequences` table with a single
//! upsert-and-return statement, so concurrent requests never receive the
//! same value. Keys carry the date so numbering restarts every day.

use chrono::NaiveDate;
use sqlx::PgPool;

use super::error::DatabaseError;

const NEXT_VALUE_SQL: &str = r#"
    INSERT INTO code_sequences (key, value)
    VALUES ($1, 1)
    ON CONFLICT (key) DO UPDATE SET value = code_sequences.value + 1
    RETURNING value
"#;

/// Atomically increment and read the counter for `key`
pub async fn next_value(pool: &PgPool, key: &str) -> Result<i64, DatabaseError> {
    let (value,): (i64,) = sqlx::query_as(NEXT_VALUE_SQL).bind(key).fetch_one(pool).await?;
    Ok(value)
}

pub fn daily_key(name: &str, date: NaiveDate) -> String {
    format!("{}:{}", name, date.format("%Y%m%d"))
}

/// `PO` + 2026-10-18 + 7 (width 4) -> `PO20261018-0007`
pub fn format_code(prefix: &str, date: NaiveDate, value: i64, width: usize) -> String {
    format!("{}{}-{:0width$}", prefix, date.format("%Y%m%d"), value, width = width)
}

/// Sequence names end up in keys and codes; keep them boring
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn formats_zero_padded_codes() {
        assert_eq!(format_code("PO", date(), 7, 4), "PO20261018-0007");
        assert_eq!(format_code("ST", date(), 12345, 4), "ST20261018-12345");
    }

    #[test]
    fn keys_roll_over_daily() {
        let today = daily_key("purchase-order", date());
        let tomorrow = daily_key("purchase-order", date().succ_opt().unwrap());
        assert_eq!(today, "purchase-order:20261018");
        assert_ne!(today, tomorrow);
    }

    #[test]
    fn validates_names() {
        assert!(is_valid_name("purchase_order"));
        assert!(is_valid_name("ST-2"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("po; DROP TABLE code_sequences"));
        assert!(!is_valid_name(&"x".repeat(65)));
    }
}
