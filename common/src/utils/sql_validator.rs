//! SQL statement validator.
//!
//! Guards the plugin endpoint against schema-destroying statements and
//! classifies statements for result handling.

use crate::errors::AppError;

/// Validates SQL statements for security.
pub struct SqlValidator;

/// Keywords rejected anywhere in a statement.
const FORBIDDEN_KEYWORDS: [&str; 4] = ["DROP ", "TRUNCATE ", "DELETE FROM", "ALTER "];

impl SqlValidator {
    /// Rejects empty statements and statements containing forbidden keywords.
    ///
    /// # Errors
    /// `AppError::Validation` for an empty statement, `AppError::UnsafeSql`
    /// when a forbidden keyword is present.
    pub fn validate(sql: &str) -> Result<(), AppError> {
        if sql.trim().is_empty() {
            return Err(AppError::Validation("SQL statement is required".into()));
        }
        let sql_upper = sql.to_uppercase();
        for keyword in FORBIDDEN_KEYWORDS {
            if sql_upper.contains(keyword) {
                return Err(AppError::UnsafeSql(format!(
                    "forbidden operation: {}",
                    keyword.trim()
                )));
            }
        }
        Ok(())
    }

    /// True for statements whose whole result can be read as a row set
    /// (plain `SELECT` or a `WITH` query).
    pub fn is_row_query(sql: &str) -> bool {
        let head = sql.trim_start().to_uppercase();
        head.starts_with("SELECT") || head.starts_with("WITH")
    }

    /// Drops trailing whitespace and statement terminators.
    pub fn strip_terminator(sql: &str) -> &str {
        sql.trim_end().trim_end_matches(';').trim_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_allowed() {
        assert!(SqlValidator::validate("SELECT * FROM frc_sql_code").is_ok());
    }

    #[test]
    fn test_drop_is_forbidden() {
        assert!(matches!(
            SqlValidator::validate("drop table frc_sql_code"),
            Err(AppError::UnsafeSql(_))
        ));
    }

    #[test]
    fn test_upsert_is_allowed() {
        let sql = "INSERT INTO sillytavern_logging VALUES ($1) ON CONFLICT (conversation_name) DO UPDATE SET messages = EXCLUDED.messages";
        assert!(SqlValidator::validate(sql).is_ok());
        assert!(!SqlValidator::is_row_query(sql));
    }

    #[test]
    fn test_recursive_cte_is_row_query() {
        assert!(SqlValidator::is_row_query("\nWITH RECURSIVE res AS (SELECT 1) SELECT * FROM res"));
        assert!(!SqlValidator::is_row_query("INSERT INTO t VALUES (1)"));
    }

    #[test]
    fn test_strip_terminator() {
        assert_eq!(SqlValidator::strip_terminator("SELECT 1 LIMIT $5;\n"), "SELECT 1 LIMIT $5");
    }
}
