//! Candidate table search.
//!
//! Finds definitions whose text matches a measure search term and whose
//! name matches a report search term, both through
//! `websearch_to_tsquery`. A blank term never turns into a wildcard: the
//! search returns nothing and no statement is sent.

use serde_json::Value;

use common::errors::AppResult;
use common::models::{CandidateTable, SqlStatement};

use crate::lineage::DENYLIST_PATTERNS;
use crate::transport::QueryTransport;

const CANDIDATE_SQL: &str = "SELECT query_name
, query_source
FROM frc_sql_code
WHERE query_text @@ websearch_to_tsquery($1)
AND query_name @@ websearch_to_tsquery($2)
AND NOT (query_name LIKE ANY($3::text[]))
;
";

fn non_blank(term: Option<&str>) -> Option<&str> {
    term.map(str::trim).filter(|t| !t.is_empty())
}

/// Builds the search statement, or `None` when either term is blank.
pub fn candidate_statement(measure_term: Option<&str>, report_term: Option<&str>) -> Option<SqlStatement> {
    let measure = non_blank(measure_term)?;
    let report = non_blank(report_term)?;
    Some(
        SqlStatement::new(CANDIDATE_SQL)
            .bind(measure)
            .bind(report)
            .bind(DENYLIST_PATTERNS.to_vec()),
    )
}

/// Runs the candidate search and returns the engine's rows untouched.
pub async fn find_candidate_tables(
    transport: &dyn QueryTransport,
    database: &str,
    measure_term: Option<&str>,
    report_term: Option<&str>,
) -> AppResult<Value> {
    let Some(statement) = candidate_statement(measure_term, report_term) else {
        tracing::debug!("Blank search term, skipping candidate search");
        return Ok(Value::Array(Vec::new()));
    };
    tracing::info!(measure = ?measure_term, report = ?report_term, "Searching candidate tables");
    transport.query(database, &statement).await
}

/// Decodes a candidate search result.
pub fn decode_candidates(value: Value) -> AppResult<Vec<CandidateTable>> {
    match value {
        Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
        other => Ok(serde_json::from_value(other)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QueryTransport for CountingTransport {
        async fn query(&self, _database: &str, _statement: &SqlStatement) -> AppResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!([{ "query_name": "frc_revenue", "query_source": "Airflow" }]))
        }
    }

    #[tokio::test]
    async fn test_blank_terms_return_empty_without_request() {
        let transport = CountingTransport { calls: AtomicUsize::new(0) };

        for (measure, report) in [
            (Some(""), Some("sales")),
            (Some("revenue"), Some("  ")),
            (None, Some("sales")),
            (Some("revenue"), None),
        ] {
            let rows = find_candidate_tables(&transport, "shannon", measure, report)
                .await
                .unwrap();
            assert_eq!(rows, json!([]));
        }

        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_terms_are_bound() {
        let transport = CountingTransport { calls: AtomicUsize::new(0) };
        let rows = find_candidate_tables(&transport, "shannon", Some("revenue"), Some("sales"))
            .await
            .unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        let candidates = decode_candidates(rows).unwrap();
        assert_eq!(candidates[0].query_name, "frc_revenue");
        assert_eq!(candidates[0].query_source.as_deref(), Some("Airflow"));
    }

    #[test]
    fn test_statement_binds_trimmed_terms() {
        let statement = candidate_statement(Some(" net revenue "), Some("sales")).unwrap();
        assert_eq!(statement.args[0], json!("net revenue"));
        assert_eq!(statement.args[1], json!("sales"));
        assert!(!statement.sql.contains("net revenue"));
        assert!(statement.sql.contains("websearch_to_tsquery($1)"));
    }
}
