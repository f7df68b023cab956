//! Table tools exposed to the model
//!
//! These four tools are the model's only access to the dataset. Execution
//! errors are rendered as text and fed back as tool output so the model can
//! recover or answer "I don't know" instead of faulting the run.

use serde::Deserialize;
use statline_error::{Error, Result};
use statline_llm::{ToolCall, ToolDefinition};
use statline_table::Table;

/// Rows shown by `preview_rows` when the model does not ask for a count.
const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Tool definitions handed to the model on every completion request.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "list_columns",
            "List the column names of the statistics table and how many rows it has.",
        ),
        ToolDefinition::new(
            "preview_rows",
            "Show the header and the first rows of the table.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "rows": {
                    "type": "integer",
                    "description": "How many rows to show (default 5)"
                }
            },
            "required": []
        })),
        ToolDefinition::new(
            "top_by_column",
            "Find the row with the maximum value of a numeric column. \
             Ties keep the first row in file order.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "column": {
                    "type": "string",
                    "description": "Numeric column to maximize, e.g. ReceivingTD"
                },
                "label_column": {
                    "type": "string",
                    "description": "Column used to label the winning row (default: first column)"
                }
            },
            "required": ["column"]
        })),
        ToolDefinition::new(
            "sum_by_group",
            "Sum a numeric column per distinct value of a grouping column, \
             ordered by descending total.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "group_column": {
                    "type": "string",
                    "description": "Column to group by, e.g. Team"
                },
                "value_column": {
                    "type": "string",
                    "description": "Numeric column to sum, e.g. ReceivingTD"
                }
            },
            "required": ["group_column", "value_column"]
        })),
    ]
}

/// Human-readable tool schema for the `schema` subcommand.
pub fn schema_summary() -> String {
    let mut out = String::from("Table tools available to the model:\n\n");
    for tool in definitions() {
        out.push_str(&format!("- **{}**: {}\n", tool.name, tool.description));
        if let Some(props) = tool.parameters["properties"].as_object() {
            for (name, schema) in props {
                let desc = schema["description"].as_str().unwrap_or("");
                out.push_str(&format!("  - {}: {}\n", name, desc));
            }
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct PreviewArgs {
    rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TopArgs {
    column: String,
    label_column: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SumArgs {
    group_column: String,
    value_column: String,
}

/// Execute one tool call against the table, rendering the result as text
/// for the model.
pub fn dispatch(table: &Table, call: &ToolCall) -> Result<String> {
    match call.name.as_str() {
        "list_columns" => Ok(format!(
            "columns: {} ({} rows)",
            table.headers().join(", "),
            table.len()
        )),
        "preview_rows" => {
            let args: PreviewArgs = parse_args(call)?;
            Ok(table.preview(args.rows.unwrap_or(DEFAULT_PREVIEW_ROWS)))
        }
        "top_by_column" => {
            let args: TopArgs = parse_args(call)?;
            let label_col = match args.label_column {
                Some(col) => col,
                None => table
                    .headers()
                    .first()
                    .cloned()
                    .ok_or_else(Error::empty_table)?,
            };
            let top = table.top_by(&label_col, &args.column)?;
            Ok(format!(
                "{} (row {}) with {} = {}",
                top.label,
                top.row + 1,
                args.column,
                top.value
            ))
        }
        "sum_by_group" => {
            let args: SumArgs = parse_args(call)?;
            let sums = table.sum_by(&args.group_column, &args.value_column)?;
            let lines: Vec<String> = sums
                .iter()
                .map(|g| format!("{}: {}", g.key, g.total))
                .collect();
            Ok(format!(
                "{} per {} (descending):\n{}",
                args.value_column,
                args.group_column,
                lines.join("\n")
            ))
        }
        other => Err(Error::tool_unknown(other).with_operation("tools::dispatch")),
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(call: &ToolCall) -> Result<T> {
    call.parse_arguments().map_err(|e| {
        Error::tool_args_invalid(&call.name, e.to_string())
            .with_operation("tools::dispatch")
            .set_source(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use statline_error::ErrorKind;

    fn sample() -> Table {
        let csv = "\
PlayerName,Team,ReceivingTD
PlayerA,TeamX,5
PlayerB,TeamY,7
PlayerC,TeamX,3
";
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_definitions_cover_all_tools() {
        let names: Vec<String> = definitions().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec!["list_columns", "preview_rows", "top_by_column", "sum_by_group"]
        );
    }

    #[test]
    fn test_schema_summary_mentions_tools() {
        let summary = schema_summary();
        assert!(summary.contains("top_by_column"));
        assert!(summary.contains("group_column"));
    }

    #[test]
    fn test_list_columns() {
        let call = ToolCall::new("list_columns", serde_json::json!({}));
        let out = dispatch(&sample(), &call).unwrap();
        assert_eq!(out, "columns: PlayerName, Team, ReceivingTD (3 rows)");
    }

    #[test]
    fn test_preview_rows_default() {
        let call = ToolCall::new("preview_rows", serde_json::json!({}));
        let out = dispatch(&sample(), &call).unwrap();
        assert!(out.contains("PlayerName | Team | ReceivingTD"));
        assert!(out.contains("PlayerC | TeamX | 3"));
    }

    #[test]
    fn test_top_by_column_with_default_label() {
        let call = ToolCall::new("top_by_column", serde_json::json!({"column": "ReceivingTD"}));
        let out = dispatch(&sample(), &call).unwrap();
        assert_eq!(out, "PlayerB (row 2) with ReceivingTD = 7");
    }

    #[test]
    fn test_top_by_column_with_explicit_label() {
        let call = ToolCall::new(
            "top_by_column",
            serde_json::json!({"column": "ReceivingTD", "label_column": "Team"}),
        );
        let out = dispatch(&sample(), &call).unwrap();
        assert_eq!(out, "TeamY (row 2) with ReceivingTD = 7");
    }

    #[test]
    fn test_sum_by_group() {
        let call = ToolCall::new(
            "sum_by_group",
            serde_json::json!({"group_column": "Team", "value_column": "ReceivingTD"}),
        );
        let out = dispatch(&sample(), &call).unwrap();
        assert!(out.starts_with("ReceivingTD per Team (descending):"));
        assert!(out.contains("TeamX: 8\nTeamY: 7"));
    }

    #[test]
    fn test_unknown_tool() {
        let call = ToolCall::new("run_python", serde_json::json!({"code": "df.head()"}));
        let err = dispatch(&sample(), &call).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolUnknown);
    }

    #[test]
    fn test_bad_arguments() {
        let call = ToolCall::new("sum_by_group", serde_json::json!({"group_column": "Team"}));
        let err = dispatch(&sample(), &call).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolArgsInvalid);
    }

    #[test]
    fn test_missing_column_propagates() {
        let call = ToolCall::new("top_by_column", serde_json::json!({"column": "RushingTD"}));
        let err = dispatch(&sample(), &call).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ColumnNotFound);
    }
}
