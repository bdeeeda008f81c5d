//! Warehouse, database, schema and role sent with each request
//!
//! The SQL API opens a fresh server-side session per request, so a `USE`
//! statement has no effect on the next call. The session instead records the
//! object a successful `USE` selected and sends it in the request body.

use crate::SnowflakeSettings;

/// Context fields of a statement request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub role: Option<String>,
}

/// Object kind selected by a `USE` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UseTarget {
    Warehouse(String),
    Database(String),
    /// `USE SCHEMA [db.]schema`
    Schema {
        database: Option<String>,
        schema: String,
    },
    Role(String),
}

impl SessionContext {
    pub fn from_settings(settings: &SnowflakeSettings) -> Self {
        Self {
            warehouse: settings.warehouse.clone(),
            database: settings.database.clone(),
            schema: settings.schema.clone(),
            role: settings.role.clone(),
        }
    }

    /// Record the object selected by `sql` if it is a `USE` statement
    ///
    /// Returns `true` when the context changed.
    pub fn apply(&mut self, sql: &str) -> bool {
        let Some(target) = parse_use(sql) else {
            return false;
        };

        tracing::debug!(?target, "carrying USE into later requests");
        match target {
            UseTarget::Warehouse(name) => self.warehouse = Some(name),
            UseTarget::Role(name) => self.role = Some(name),
            UseTarget::Database(name) => {
                // Snowflake resets the current schema on USE DATABASE.
                self.database = Some(name);
                self.schema = None;
            }
            UseTarget::Schema { database, schema } => {
                if database.is_some() {
                    self.database = database;
                }
                self.schema = Some(schema);
            }
        }
        true
    }
}

/// Parse `USE [WAREHOUSE|DATABASE|SCHEMA|ROLE] <name>`
///
/// A bare `USE <name>` selects a database, and `USE <db>.<schema>` selects
/// both. Names are kept as written. `USE SECONDARY ROLES` is not a context
/// change and yields `None`.
pub(crate) fn parse_use(sql: &str) -> Option<UseTarget> {
    let statement = sql.trim().trim_end_matches(';').trim();
    let mut words = statement.split_whitespace();
    if !words.next()?.eq_ignore_ascii_case("USE") {
        return None;
    }

    let first = words.next()?;
    let rest: Vec<&str> = words.collect();
    let keyword = first.to_ascii_uppercase();

    let (kind, name) = match keyword.as_str() {
        "WAREHOUSE" | "DATABASE" | "SCHEMA" | "ROLE" => (Some(keyword), rest.join(" ")),
        "SECONDARY" => return None,
        _ if rest.is_empty() => (None, first.to_string()),
        _ => return None,
    };
    if name.is_empty() {
        return None;
    }

    let target = match kind.as_deref() {
        Some("WAREHOUSE") => UseTarget::Warehouse(name),
        Some("DATABASE") => UseTarget::Database(name),
        Some("ROLE") => UseTarget::Role(name),
        _ => match split_qualified(&name) {
            Some((database, schema)) => UseTarget::Schema {
                database: Some(database),
                schema,
            },
            None if kind.is_some() => UseTarget::Schema {
                database: None,
                schema: name,
            },
            None => UseTarget::Database(name),
        },
    };
    Some(target)
}

/// `db.schema` into its parts; quoted names are left whole
fn split_qualified(name: &str) -> Option<(String, String)> {
    if name.contains('"') {
        return None;
    }
    let (database, schema) = name.split_once('.')?;
    if database.is_empty() || schema.is_empty() {
        return None;
    }
    Some((database.to_string(), schema.to_string()))
}
