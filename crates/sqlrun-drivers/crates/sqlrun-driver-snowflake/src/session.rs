//! Snowflake session implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use sqlrun_core::{ObjectDescriptor, Result, RowSet, Session, SqlRunError, Value, quote_pattern};

use crate::SnowflakeSettings;
use crate::context::SessionContext;
use crate::protocol::{
    AsyncResponse, ErrorBody, MULTI_STATEMENT_COUNT, StatementRequest, StatementResponse,
};

const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";

/// Extra time the HTTP client waits beyond the server-side statement timeout
const REQUEST_TIMEOUT_MARGIN_SECS: u64 = 30;

/// Exactly one statement per request
const SINGLE_STATEMENT: &str = "1";

/// Any number of statements per request
const ANY_STATEMENT_COUNT: &str = "0";

/// Session against the Snowflake SQL API
pub struct SnowflakeSession {
    client: Client,
    settings: SnowflakeSettings,
    /// Starts from the settings and follows successful `USE` statements
    context: Mutex<SessionContext>,
    closed: AtomicBool,
}

impl SnowflakeSession {
    pub fn new(settings: SnowflakeSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(
                settings.statement_timeout + REQUEST_TIMEOUT_MARGIN_SECS,
            ))
            .user_agent(concat!("sqlrun/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SqlRunError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            context: Mutex::new(SessionContext::from_settings(&settings)),
            settings,
            closed: AtomicBool::new(false),
        })
    }

    pub fn settings(&self) -> &SnowflakeSettings {
        &self.settings
    }

    /// Context sent with the next request
    pub fn context(&self) -> SessionContext {
        self.context.lock().clone()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(SqlRunError::Connection("Session is closed".into()));
        }
        Ok(())
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.settings.token)
            .header(TOKEN_TYPE_HEADER, self.settings.token_type.header_value())
            .header(ACCEPT, "application/json")
    }

    /// Submit `sql` and wait for its result
    async fn submit(&self, sql: &str, statement_count: &str) -> Result<RowSet> {
        self.ensure_open()?;
        let start_time = Instant::now();

        let context = self.context();
        let request = StatementRequest {
            statement: sql,
            timeout: self.settings.statement_timeout,
            warehouse: context.warehouse.as_deref(),
            database: context.database.as_deref(),
            schema: context.schema.as_deref(),
            role: context.role.as_deref(),
            parameters: HashMap::from([(MULTI_STATEMENT_COUNT, statement_count.to_string())]),
        };

        let response = self
            .authorized(self.client.post(self.settings.statements_url()))
            .query(&[("requestId", uuid::Uuid::new_v4().to_string())])
            .json(&request)
            .send()
            .await
            .map_err(http_error)?;

        let mut result = self.await_result(response, start_time).await?;
        result.execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            statement_handle = ?result.statement_handle,
            row_count = result.row_count(),
            execution_time_ms = result.execution_time_ms,
            "statement executed"
        );
        Ok(result)
    }

    /// Follow HTTP 202 responses until the statement finishes
    async fn await_result(&self, mut response: Response, start_time: Instant) -> Result<RowSet> {
        let deadline = Duration::from_secs(self.settings.statement_timeout);

        loop {
            let status = response.status();

            if status == StatusCode::OK {
                let body: StatementResponse = response.json().await.map_err(|e| {
                    SqlRunError::Protocol(format!("Invalid result set: {}", e))
                })?;
                return Ok(body.into_row_set());
            }

            if status != StatusCode::ACCEPTED {
                return Err(error_from_response(response).await);
            }

            let pending: AsyncResponse = response.json().await.map_err(|e| {
                SqlRunError::Protocol(format!("Invalid statement status: {}", e))
            })?;

            if start_time.elapsed() >= deadline {
                return Err(SqlRunError::Timeout(format!(
                    "Statement {} still running after {}s",
                    pending.statement_handle, self.settings.statement_timeout
                )));
            }

            tracing::debug!(
                statement_handle = %pending.statement_handle,
                "statement still running, polling"
            );
            tokio::time::sleep(self.settings.poll_interval).await;

            let url = self
                .settings
                .statement_status_url(&pending.statement_handle);
            response = self
                .authorized(self.client.get(url))
                .send()
                .await
                .map_err(http_error)?;
        }
    }
}

#[async_trait]
impl Session for SnowflakeSession {
    fn driver_name(&self) -> &str {
        "snowflake"
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn run_statement(&self, sql: &str) -> Result<RowSet> {
        let result = self.submit(sql, SINGLE_STATEMENT).await?;
        self.context.lock().apply(sql);
        Ok(result)
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn run_script(&self, sql: &str) -> Result<RowSet> {
        self.submit(sql, ANY_STATEMENT_COUNT).await
    }

    async fn list_objects(&self, pattern: &str) -> Result<Vec<ObjectDescriptor>> {
        let sql = format!("SHOW PROCEDURES LIKE {}", quote_pattern(pattern));
        let result = self.submit(&sql, SINGLE_STATEMENT).await?;

        let text = |row: usize, column: &str| -> Option<String> {
            result
                .get(row, column)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let objects = (0..result.row_count())
            .filter_map(|row| {
                let name = text(row, "name")?;
                let mut object = ObjectDescriptor::new(name).with_kind("procedure");
                object.schema = text(row, "schema_name");
                object.arguments = text(row, "arguments");
                Some(object)
            })
            .collect::<Vec<_>>();

        tracing::debug!(pattern = %pattern, count = objects.len(), "listed procedures");
        Ok(objects)
    }

    async fn close(&self) -> Result<()> {
        tracing::info!(account = %self.settings.account, "closing Snowflake session");
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn http_error(err: reqwest::Error) -> SqlRunError {
    if err.is_timeout() {
        SqlRunError::Timeout(err.to_string())
    } else if err.is_connect() {
        SqlRunError::Connection(err.to_string())
    } else {
        SqlRunError::Http(err.to_string())
    }
}

/// Turn an error status into an error carrying Snowflake's own message
async fn error_from_response(response: Response) -> SqlRunError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ErrorBody>(&body).ok();

    if status == StatusCode::UNAUTHORIZED {
        return match parsed {
            Some(error) => {
                SqlRunError::Connection(format!("Authentication failed: {}", error.describe()))
            }
            None => SqlRunError::Connection("Authentication failed (status 401)".into()),
        };
    }

    match parsed {
        Some(error) => SqlRunError::Query(error.describe()),
        None => SqlRunError::Http(format!("Status {}: {}", status, body)),
    }
}
