//! Rendering of lineage rows and raw result sets.

use serde_json::Value;

use common::errors::AppResult;
use common::models::LineageRow;

/// Statement marker after which a definition only carries sample data.
pub const DATA_MUTATION_MARKER: &str = "INSERT INTO";

/// Prepares a definition for display: every `"\n\n"` becomes `"\n"` (one
/// pass), anything from the first `INSERT INTO` on is dropped, and the
/// rest is trimmed.
pub fn clean_definition(query_text: &str) -> String {
    let collapsed = query_text.replace("\n\n", "\n");
    let head = collapsed
        .split(DATA_MUTATION_MARKER)
        .next()
        .unwrap_or_default();
    head.trim().to_string()
}

/// Renders one definition as a Markdown section with a fenced SQL block.
pub fn definition_markdown(row: &LineageRow) -> String {
    format!(
        "###{}\n\n```sql\n{}\n```\n\n",
        row.query_name,
        clean_definition(&row.query_text)
    )
}

/// Renders every definition, separated by a newline.
pub fn definitions_markdown(rows: &[LineageRow]) -> String {
    rows.iter()
        .map(definition_markdown)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Two-space indented JSON, as returned by the slash commands.
pub fn pretty_json(value: &Value) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, text: &str) -> LineageRow {
        LineageRow {
            query_name: name.into(),
            query_text: text.into(),
            query_source: None,
            recursive_depth: None,
            prior_relation: None,
        }
    }

    #[test]
    fn test_sample_data_is_cut_and_blank_lines_collapsed() {
        let markdown = definition_markdown(&row("frc_orders", "a\n\nb\n\nINSERT INTO x"));
        assert_eq!(markdown, "###frc_orders\n\n```sql\na\nb\n```\n\n");
    }

    #[test]
    fn test_collapse_is_a_single_pass() {
        assert_eq!(clean_definition("a\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_text_without_marker_is_kept() {
        assert_eq!(clean_definition("  CREATE TABLE t AS SELECT 1\n"), "CREATE TABLE t AS SELECT 1");
    }

    #[test]
    fn test_marker_at_start_leaves_empty_block() {
        assert_eq!(definition_markdown(&row("t", "INSERT INTO t VALUES (1)")), "###t\n\n```sql\n\n```\n\n");
    }

    #[test]
    fn test_rows_are_joined_with_newline() {
        let markdown = definitions_markdown(&[row("a", "x"), row("b", "y")]);
        assert_eq!(markdown, "###a\n\n```sql\nx\n```\n\n\n###b\n\n```sql\ny\n```\n\n");
    }

    #[test]
    fn test_no_rows_render_empty() {
        assert_eq!(definitions_markdown(&[]), "");
    }
}
