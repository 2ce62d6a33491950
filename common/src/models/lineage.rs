//! Rows returned by the lineage and candidate-search statements.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One table definition reached by a lineage traversal.
///
/// The projected result only carries `query_name` and `query_text`; the
/// remaining columns are present when a caller selects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LineageRow {
    pub query_name: String,
    pub query_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive_depth: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_relation: Option<String>,
}

/// A table whose definition matched a measure/report search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CandidateTable {
    pub query_name: String,
    /// Provenance tag, e.g. `Airflow` or `Retool`.
    #[serde(default)]
    pub query_source: Option<String>,
}
