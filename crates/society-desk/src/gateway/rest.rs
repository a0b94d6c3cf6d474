use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::{Gateway, GatewayError, Predicate, Query, Session, User};
use crate::config::GatewayConfig;
use crate::session::SessionState;

/// HTTP client for a hosted PostgREST/GoTrue-style backend.
pub struct RestGateway {
    client: Client,
    base_url: String,
    api_key: String,
    sessions: SessionState,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
    user: User,
}

impl RestGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| GatewayError::Network(format!("failed to build HTTP client: {err}")))?;

        let base_url = config.base_url.as_str().trim_end_matches('/').to_string();
        tracing::info!(base_url = %base_url, "backend gateway initialized");

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            sessions: SessionState::new(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = self
            .sessions
            .current()
            .map(|session| session.access_token)
            .unwrap_or_else(|| self.api_key.clone());

        self.client
            .request(method, self.endpoint(path))
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(|err| {
            warn!(error = %err, "backend request failed");
            if err.is_timeout() {
                GatewayError::Network("request to backend timed out".to_string())
            } else {
                GatewayError::Network(format!("backend unavailable: {err}"))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| format!("backend error: {status}"));
        debug!(%status, message = %message, "backend rejected request");
        Err(classify_failure(status, message))
    }

    async fn json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|err| GatewayError::Network(format!("failed to read backend response: {err}")))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Gateway for RestGateway {
    fn sessions(&self) -> &SessionState {
        &self.sessions
    }

    async fn current_user(&self) -> Result<Option<User>, GatewayError> {
        if self.sessions.current().is_none() {
            return Ok(None);
        }
        let response = self
            .send(self.request(Method::GET, "/auth/v1/user"))
            .await?;
        Ok(Some(Self::json(response).await?))
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, GatewayError> {
        let request = self
            .client
            .post(self.endpoint("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }));

        let token: TokenResponse = Self::json(self.send(request).await?).await?;
        let session = Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            user: token.user,
        };
        self.sessions.sign_in(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        let outcome = if self.sessions.current().is_some() {
            self.send(self.request(Method::POST, "/auth/v1/logout"))
                .await
                .map(|_| ())
        } else {
            Ok(())
        };
        self.sessions.sign_out();
        outcome
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), GatewayError> {
        let request = self
            .request(Method::POST, "/auth/v1/recover")
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }));
        self.send(request).await?;
        Ok(())
    }

    async fn update_password(&self, password: &str) -> Result<User, GatewayError> {
        let request = self
            .request(Method::PUT, "/auth/v1/user")
            .json(&json!({ "password": password }));
        let user: User = Self::json(self.send(request).await?).await?;
        self.sessions.user_updated(user.clone());
        Ok(user)
    }

    #[instrument(skip(self, query), fields(table = %query.table))]
    async fn query(&self, query: &Query) -> Result<Vec<Value>, GatewayError> {
        let request = self
            .request(Method::GET, &format!("/rest/v1/{}", query.table))
            .query(&query_params(query));
        Self::json(self.send(request).await?).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, GatewayError> {
        let request = self
            .request(Method::POST, &format!("/rest/v1/{table}"))
            .header("Prefer", "return=representation")
            .json(&Value::Array(vec![row]));
        let rows: Vec<Value> = Self::json(self.send(request).await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::Malformed("insert returned no rows".to_string()))
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Predicate],
        patch: Value,
    ) -> Result<Vec<Value>, GatewayError> {
        let params: Vec<(String, String)> = filters.iter().map(filter_param).collect();
        let request = self
            .request(Method::PATCH, &format!("/rest/v1/{table}"))
            .query(&params)
            .header("Prefer", "return=representation")
            .json(&patch);
        Self::json(self.send(request).await?).await
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let content_type = HeaderValue::from_str(content_type)
            .map_err(|_| GatewayError::Validation(format!("invalid content type '{content_type}'")))?;
        let request = self
            .request(Method::POST, &format!("/storage/v1/object/{bucket}/{path}"))
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        self.send(request).await?;
        Ok(path.to_string())
    }

    fn public_object_url(&self, bucket: &str, path: &str) -> String {
        self.endpoint(&format!("/storage/v1/object/public/{bucket}/{path}"))
    }
}

fn classify_failure(status: StatusCode, message: String) -> GatewayError {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) || message.contains("JWT")
    {
        return GatewayError::Auth(message);
    }
    match status {
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            GatewayError::Validation(message)
        }
        StatusCode::NOT_FOUND => GatewayError::NotFound(message),
        _ => GatewayError::Network(message),
    }
}

/// Translates a [`Query`] into PostgREST query-string pairs.
pub(crate) fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.select_clause())];
    params.extend(query.filters.iter().map(filter_param));
    if let Some(order) = &query.order {
        let direction = if order.descending { "desc" } else { "asc" };
        params.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }
    params
}

fn filter_param(predicate: &Predicate) -> (String, String) {
    match predicate {
        Predicate::Any { predicates } => ("or".to_string(), format!("({})", nested(predicates))),
        Predicate::Eq { column, value } => (column.clone(), format!("eq.{}", literal(value, false))),
        Predicate::In { column, values } => (column.clone(), format!("in.({})", list(values))),
        Predicate::Gte { column, value } => {
            (column.clone(), format!("gte.{}", literal(value, false)))
        }
        Predicate::Lt { column, value } => (column.clone(), format!("lt.{}", literal(value, false))),
        Predicate::Lte { column, value } => {
            (column.clone(), format!("lte.{}", literal(value, false)))
        }
        Predicate::ILike { column, needle } => {
            (column.clone(), format!("ilike.*{}*", escape_like(needle)))
        }
    }
}

fn nested(predicates: &[Predicate]) -> String {
    predicates
        .iter()
        .map(nested_condition)
        .collect::<Vec<_>>()
        .join(",")
}

fn nested_condition(predicate: &Predicate) -> String {
    match predicate {
        Predicate::Any { predicates } => format!("or({})", nested(predicates)),
        Predicate::Eq { column, value } => format!("{column}.eq.{}", literal(value, true)),
        Predicate::In { column, values } => format!("{column}.in.({})", list(values)),
        Predicate::Gte { column, value } => format!("{column}.gte.{}", literal(value, true)),
        Predicate::Lt { column, value } => format!("{column}.lt.{}", literal(value, true)),
        Predicate::Lte { column, value } => format!("{column}.lte.{}", literal(value, true)),
        Predicate::ILike { column, needle } => {
            let pattern = format!("*{}*", escape_like(needle));
            format!("{column}.ilike.{}", quote_reserved(&pattern))
        }
    }
}

fn list(values: &[Value]) -> String {
    values
        .iter()
        .map(|value| literal(value, true))
        .collect::<Vec<_>>()
        .join(",")
}

fn literal(value: &Value, nested: bool) -> String {
    let raw = match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    };
    if nested {
        quote_reserved(&raw)
    } else {
        raw
    }
}

/// Escapes LIKE wildcards so the needle matches as a plain substring.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Values inside `or=(...)` and `in.(...)` must be quoted when they contain
/// PostgREST delimiters.
fn quote_reserved(raw: &str) -> String {
    if raw.contains([',', '.', ':', '(', ')', '"', '\\']) {
        let escaped = raw.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        raw.to_string()
    }
}
