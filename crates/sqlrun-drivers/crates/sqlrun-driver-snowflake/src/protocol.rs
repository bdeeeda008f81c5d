//! SQL API v2 wire types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlrun_core::{RowSet, Value};

/// Session parameter that bounds how many statements one request may hold
pub(crate) const MULTI_STATEMENT_COUNT: &str = "MULTI_STATEMENT_COUNT";

/// Body of `POST /api/v2/statements`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StatementRequest<'a> {
    pub statement: &'a str,
    pub timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
    pub parameters: HashMap<&'static str, String>,
}

/// Result set returned with HTTP 200
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatementResponse {
    #[serde(default)]
    pub statement_handle: Option<String>,
    /// Handles of the individual statements of a multi-statement request
    #[serde(default)]
    pub statement_handles: Option<Vec<String>>,
    #[serde(default)]
    pub result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    pub data: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub stats: Option<DmlStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResultSetMetaData {
    #[serde(default)]
    pub row_type: Vec<ColumnMetaData>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ColumnMetaData {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DmlStats {
    #[serde(default)]
    pub num_rows_inserted: u64,
    #[serde(default)]
    pub num_rows_updated: u64,
    #[serde(default)]
    pub num_rows_deleted: u64,
}

/// Body returned with HTTP 202 while a statement is still running
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AsyncResponse {
    pub statement_handle: String,
}

/// Error body returned with a 4xx/5xx status
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub sql_state: Option<String>,
    pub message: String,
    #[serde(default)]
    pub statement_handle: Option<String>,
}

impl ErrorBody {
    /// `"{code} ({sqlState}): {message}"`, leaving out the parts that are absent
    pub fn describe(&self) -> String {
        match (&self.code, &self.sql_state) {
            (Some(code), Some(state)) => format!("{} ({}): {}", code, state, self.message),
            (Some(code), None) => format!("{}: {}", code, self.message),
            (None, Some(state)) => format!("({}): {}", state, self.message),
            (None, None) => self.message.clone(),
        }
    }
}

impl StatementResponse {
    pub fn into_row_set(self) -> RowSet {
        let columns = self
            .result_set_meta_data
            .map(|meta| meta.row_type.into_iter().map(|c| c.name).collect())
            .unwrap_or_default();

        let rows = self
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| cell.map(Value::String).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        let mut result = RowSet::new(columns, rows);
        result.affected_rows = self
            .stats
            .map(|s| s.num_rows_inserted + s.num_rows_updated + s.num_rows_deleted)
            .unwrap_or(0);
        result.statement_handle = self
            .statement_handle
            .or_else(|| self.statement_handles.and_then(|h| h.into_iter().next()));
        result
    }
}
