//! Table lineage lookup.
//!
//! A lineage request becomes a single recursive CTE over `frc_sql_code`:
//! the seed row is the requested table, each expansion step follows the
//! row's contributing relations to their own definitions. The traversal
//! runs inside PostgreSQL; this module only builds the statement and
//! decodes the projected `(query_name, query_text)` rows.
//!
//! Depth is bounded on the parent row (`res.recursive_depth < $2`), so a
//! request for depth `n` returns levels `0..=n`: depth 0 is the table's
//! own definition, depth 2 adds parents and grandparents. Relations are
//! joined laterally, so the seed and leaf definitions (no relations of
//! their own) are always part of the result.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use common::errors::{AppError, AppResult};
use common::models::{LineageRow, SqlStatement};

use crate::transport::{QueryTransport, NO_RESULT_SET_MESSAGE};

/// Depth used when the caller gives none.
pub const DEFAULT_DEPTH: u32 = 1;

/// Deepest traversal a caller may ask for.
pub const MAX_DEPTH: u32 = 10;

/// Row cap used when the caller gives none.
pub const DEFAULT_ROW_LIMIT: u32 = 10;

/// Report-facing, document-model and permission tables never count as lineage.
pub const DENYLIST_PATTERNS: [&str; 4] = ["rpt__%", "%_docmodel_%", "f%", "%permissions"];

const LINEAGE_TEMPLATE: &str = r#"WITH RECURSIVE res AS (
SELECT DISTINCT
0 AS recursive_depth
, NULL::text AS prior_relation
, src.query_name
, src.query_text
, src.query_source
, rel.contributing_table
FROM frc_sql_code src
LEFT JOIN LATERAL {seed_relations} AS rel(contributing_table) ON true
WHERE src.query_name = $1

UNION ALL

SELECT DISTINCT
res.recursive_depth + 1 AS recursive_depth
, res.query_name AS prior_relation
, fsc.query_name
, fsc.query_text
, fsc.query_source
, rel.contributing_table
FROM res
JOIN frc_sql_code fsc
ON res.contributing_table = fsc.query_name
AND res.query_name != fsc.query_name
LEFT JOIN LATERAL {step_relations} AS rel(contributing_table) ON true
WHERE ($3::text IS NULL OR fsc.query_source = $3)
AND NOT (fsc.query_name LIKE ANY($4::text[]))
AND res.recursive_depth < $2
)

SELECT DISTINCT
res.query_name
, res.query_text
FROM res
LIMIT $5;
"#;

/// Where a definition's contributing relations come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationSource {
    /// The `query_relations` array column recorded with each definition.
    #[default]
    Array,
    /// Identifiers following `FROM` or `JOIN` in the definition text.
    TextPattern,
}

impl RelationSource {
    /// Relation set joined laterally, so a definition without relations
    /// still yields one row with a NULL `contributing_table`.
    fn expression(self, alias: &str) -> String {
        match self {
            RelationSource::Array => format!("UNNEST({alias}.query_relations)"),
            RelationSource::TextPattern => format!(
                r#"(SELECT (m.groups)[1] FROM regexp_matches({alias}.query_text, '(?:FROM|JOIN)\s+([A-Za-z0-9_."]+)', 'gi') AS m(groups))"#
            ),
        }
    }
}

/// Parameters of one lineage lookup.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct LineageRequest {
    #[validate(length(min = 1, message = "table_name is required"))]
    pub table_name: String,
    pub depth: u32,
    /// Expansion rows must carry this provenance tag.
    pub source_filter: Option<String>,
    pub apply_denylist: bool,
    pub relation_source: RelationSource,
    pub limit: u32,
}

impl LineageRequest {
    /// Request with default depth, denylist on and no provenance filter.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            depth: DEFAULT_DEPTH,
            source_filter: None,
            apply_denylist: true,
            relation_source: RelationSource::default(),
            limit: DEFAULT_ROW_LIMIT,
        }
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn source_filter(mut self, source: Option<String>) -> Self {
        self.source_filter = source.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn without_denylist(mut self) -> Self {
        self.apply_denylist = false;
        self
    }

    pub fn relation_source(mut self, source: RelationSource) -> Self {
        self.relation_source = source;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Builds the recursive statement. Every caller-supplied value is bound:
    /// `$1` table, `$2` depth, `$3` provenance, `$4` denylist, `$5` row cap.
    pub fn to_statement(&self) -> AppResult<SqlStatement> {
        let table_name = self.table_name.trim();
        if table_name.is_empty() {
            return Err(AppError::MissingArgument("table_name".into()));
        }
        self.validate()?;
        check_depth(self.depth)?;

        let sql = LINEAGE_TEMPLATE
            .replace("{seed_relations}", &self.relation_source.expression("src"))
            .replace("{step_relations}", &self.relation_source.expression("fsc"));

        let denylist: Vec<Value> = if self.apply_denylist {
            DENYLIST_PATTERNS.iter().map(|p| Value::from(*p)).collect()
        } else {
            Vec::new()
        };

        Ok(SqlStatement::new(sql)
            .bind(table_name)
            .bind(self.depth)
            .bind(self.source_filter.clone())
            .bind(Value::Array(denylist))
            .bind(self.limit))
    }
}

/// Parses a depth given as text (slash-command or string tool argument).
pub fn parse_depth(raw: &str) -> AppResult<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_DEPTH);
    }
    let depth = raw
        .parse::<u32>()
        .map_err(|_| AppError::Validation(format!("recursive_depth must be a non-negative integer, got {raw:?}")))?;
    check_depth(depth)
}

/// Rejects depths above [`MAX_DEPTH`].
pub fn check_depth(depth: u32) -> AppResult<u32> {
    if depth > MAX_DEPTH {
        return Err(AppError::Validation(format!(
            "recursive_depth must be at most {MAX_DEPTH}, got {depth}"
        )));
    }
    Ok(depth)
}

/// Runs a lineage request and returns the engine's rows untouched.
pub async fn fetch_lineage(
    transport: &dyn QueryTransport,
    database: &str,
    request: &LineageRequest,
) -> AppResult<Value> {
    let statement = request.to_statement()?;
    tracing::info!(
        table = %request.table_name,
        depth = request.depth,
        source = ?request.source_filter,
        "Resolving table lineage"
    );
    transport.query(database, &statement).await
}

/// Runs a lineage request and decodes the rows.
pub async fn get_lineage(
    transport: &dyn QueryTransport,
    database: &str,
    request: &LineageRequest,
) -> AppResult<Vec<LineageRow>> {
    let rows = fetch_lineage(transport, database, request).await?;
    decode_rows(rows)
}

/// Decodes a result set into lineage rows. A bare object is taken as a
/// single row.
pub fn decode_rows(value: Value) -> AppResult<Vec<LineageRow>> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
        _ => Err(AppError::MalformedResponse(NO_RESULT_SET_MESSAGE.into())),
    }
}
