use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::{Gateway, GatewayError, Predicate, Query, Session, User, UserId};
use crate::session::SessionState;

const SESSION_LIFETIME_MINUTES: i64 = 60;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug, Clone)]
struct PrimedFailure {
    operation: Option<&'static str>,
    error: GatewayError,
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// Recorded password-recovery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryRequest {
    pub email: String,
    pub redirect_to: String,
}

/// Self-contained backend used by tests, demos and the offline server.
///
/// Tables require a session, mirroring row-level security on the hosted
/// backend. Every call other than the local session read counts as a network
/// call.
pub struct InMemoryGateway {
    sessions: SessionState,
    base_url: String,
    tables: Mutex<BTreeMap<String, Vec<Value>>>,
    accounts: Mutex<BTreeMap<String, Account>>,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    recoveries: Mutex<Vec<RecoveryRequest>>,
    pending_failure: Mutex<Option<PrimedFailure>>,
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
    calls: AtomicUsize,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            sessions: SessionState::new(),
            base_url: "http://localhost:54321".to_string(),
            tables: Mutex::new(BTreeMap::new()),
            accounts: Mutex::new(BTreeMap::new()),
            objects: Mutex::new(BTreeMap::new()),
            recoveries: Mutex::new(Vec::new()),
            pending_failure: Mutex::new(None),
            last_timestamp: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Registers an account that can sign in with a password.
    pub fn register_user(&self, id: &str, email: &str, password: &str) -> User {
        let user = User {
            id: UserId(id.to_string()),
            email: Some(email.to_string()),
        };
        self.accounts.lock().expect("accounts mutex poisoned").insert(
            email.to_ascii_lowercase(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Installs a session for `user_id` without a sign-in round trip.
    pub fn sign_in_as(&self, user_id: &str) -> Session {
        let email = self
            .accounts
            .lock()
            .expect("accounts mutex poisoned")
            .values()
            .find(|account| account.user.id.as_str() == user_id)
            .and_then(|account| account.user.email.clone());
        let session = issue_session(User {
            id: UserId(user_id.to_string()),
            email,
        });
        self.sessions.sign_in(session.clone());
        session
    }

    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        self.tables
            .lock()
            .expect("tables mutex poisoned")
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .expect("tables mutex poisoned")
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes the next network call fail with `error`.
    pub fn fail_next(&self, error: GatewayError) {
        self.prime(None, error);
    }

    /// Makes the next call of `operation` (`"query"`, `"insert"`, ...) fail.
    pub fn fail_on(&self, operation: &'static str, error: GatewayError) {
        self.prime(Some(operation), error);
    }

    fn prime(&self, operation: Option<&'static str>, error: GatewayError) {
        *self
            .pending_failure
            .lock()
            .expect("failure mutex poisoned") = Some(PrimedFailure { operation, error });
    }

    pub fn network_calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .lock()
            .expect("objects mutex poisoned")
            .get(&object_key(bucket, path))
            .map(|object| (object.bytes.clone(), object.content_type.clone()))
    }

    pub fn recovery_requests(&self) -> Vec<RecoveryRequest> {
        self.recoveries
            .lock()
            .expect("recoveries mutex poisoned")
            .clone()
    }

    fn begin_call(&self, operation: &'static str) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        debug!(operation, "in-memory gateway call");
        let mut primed = self.pending_failure.lock().expect("failure mutex poisoned");
        let fires = primed
            .as_ref()
            .is_some_and(|failure| failure.operation.map_or(true, |target| target == operation));
        match primed.take() {
            Some(failure) if fires => Err(failure.error),
            untouched => {
                *primed = untouched;
                Ok(())
            }
        }
    }

    fn require_table_session(&self) -> Result<Session, GatewayError> {
        self.sessions
            .current()
            .ok_or_else(|| GatewayError::Auth("JWT missing or expired".to_string()))
    }

    /// Strictly increasing write timestamp so inserts keep their order.
    fn next_timestamp(&self) -> String {
        let mut last = self
            .last_timestamp
            .lock()
            .expect("timestamp mutex poisoned");
        let mut now = Utc::now();
        if let Some(previous) = *last {
            if now <= previous {
                now = previous + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[async_trait]
impl Gateway for InMemoryGateway {
    fn sessions(&self) -> &SessionState {
        &self.sessions
    }

    async fn current_user(&self) -> Result<Option<User>, GatewayError> {
        self.begin_call("current_user")?;
        Ok(self.sessions.current().map(|session| session.user))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, GatewayError> {
        self.begin_call("sign_in")?;
        let account = self
            .accounts
            .lock()
            .expect("accounts mutex poisoned")
            .get(&email.trim().to_ascii_lowercase())
            .cloned();

        match account {
            Some(account) if account.password == password => {
                let session = issue_session(account.user);
                self.sessions.sign_in(session.clone());
                Ok(session)
            }
            _ => Err(GatewayError::Validation(
                "Invalid login credentials".to_string(),
            )),
        }
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        self.begin_call("sign_out")?;
        self.sessions.sign_out();
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), GatewayError> {
        self.begin_call("recover")?;
        let email = email.trim();
        if !email.contains('@') {
            return Err(GatewayError::Validation(
                "Unable to validate email address: invalid format".to_string(),
            ));
        }
        self.recoveries
            .lock()
            .expect("recoveries mutex poisoned")
            .push(RecoveryRequest {
                email: email.to_string(),
                redirect_to: redirect_to.to_string(),
            });
        Ok(())
    }

    async fn update_password(&self, password: &str) -> Result<User, GatewayError> {
        self.begin_call("update_user")?;
        let session = self
            .sessions
            .current()
            .ok_or_else(|| GatewayError::Auth("Auth session missing!".to_string()))?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(GatewayError::Validation(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters."
            )));
        }

        let mut accounts = self.accounts.lock().expect("accounts mutex poisoned");
        let user = match accounts
            .values_mut()
            .find(|account| account.user.id == session.user.id)
        {
            Some(account) => {
                account.password = password.to_string();
                account.user.clone()
            }
            None => session.user.clone(),
        };
        drop(accounts);

        self.sessions.user_updated(user.clone());
        Ok(user)
    }

    async fn query(&self, query: &Query) -> Result<Vec<Value>, GatewayError> {
        self.begin_call("query")?;
        self.require_table_session()?;

        let tables = self.tables.lock().expect("tables mutex poisoned");
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|predicate| matches(row, predicate)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if let Some(order) = &query.order {
            rows.sort_by(|left, right| {
                let ordering = match (left.get(&order.column), right.get(&order.column)) {
                    (Some(left), Some(right)) => compare(left, right).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        if query.columns.is_empty() {
            return Ok(rows);
        }

        Ok(rows
            .into_iter()
            .map(|row| project(row, &query.columns))
            .collect())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, GatewayError> {
        self.begin_call("insert")?;
        self.require_table_session()?;

        let Value::Object(mut fields) = row else {
            return Err(GatewayError::Validation(
                "insert payload must be a JSON object".to_string(),
            ));
        };

        let timestamp = self.next_timestamp();
        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        fields
            .entry("created_at")
            .or_insert_with(|| Value::String(timestamp.clone()));
        fields
            .entry("updated_at")
            .or_insert_with(|| Value::String(timestamp));

        let stored = Value::Object(fields);
        self.tables
            .lock()
            .expect("tables mutex poisoned")
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Predicate],
        patch: Value,
    ) -> Result<Vec<Value>, GatewayError> {
        self.begin_call("update")?;
        self.require_table_session()?;

        let Value::Object(patch) = patch else {
            return Err(GatewayError::Validation(
                "update payload must be a JSON object".to_string(),
            ));
        };

        let timestamp = self.next_timestamp();
        let mut tables = self.tables.lock().expect("tables mutex poisoned");
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows
                .iter_mut()
                .filter(|row| filters.iter().all(|predicate| matches(row, predicate)))
            {
                if let Value::Object(fields) = row {
                    for (key, value) in &patch {
                        fields.insert(key.clone(), value.clone());
                    }
                    if !patch.contains_key("updated_at") {
                        fields.insert("updated_at".to_string(), Value::String(timestamp.clone()));
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        self.begin_call("upload")?;
        self.require_table_session()?;

        let mut objects = self.objects.lock().expect("objects mutex poisoned");
        let key = object_key(bucket, path);
        if objects.contains_key(&key) {
            return Err(GatewayError::Validation(
                "The resource already exists".to_string(),
            ));
        }
        objects.insert(
            key,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(path.to_string())
    }

    fn public_object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, path
        )
    }
}

fn issue_session(user: User) -> Session {
    Session {
        access_token: Uuid::new_v4().to_string(),
        refresh_token: Some(Uuid::new_v4().to_string()),
        expires_at: Utc::now() + Duration::minutes(SESSION_LIFETIME_MINUTES),
        user,
    }
}

fn object_key(bucket: &str, path: &str) -> String {
    format!("{bucket}/{path}")
}

fn project(row: Value, columns: &[String]) -> Value {
    match row {
        Value::Object(fields) => {
            let projected: Map<String, Value> = fields
                .into_iter()
                .filter(|(key, _)| columns.iter().any(|column| column == key))
                .collect();
            Value::Object(projected)
        }
        other => other,
    }
}

pub(crate) fn matches(row: &Value, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq { column, value } => {
            compare_field(row, column, value) == Some(Ordering::Equal)
        }
        Predicate::In { column, values } => values
            .iter()
            .any(|value| compare_field(row, column, value) == Some(Ordering::Equal)),
        Predicate::Gte { column, value } => {
            matches!(compare_field(row, column, value), Some(Ordering::Greater | Ordering::Equal))
        }
        Predicate::Lt { column, value } => {
            compare_field(row, column, value) == Some(Ordering::Less)
        }
        Predicate::Lte { column, value } => {
            matches!(compare_field(row, column, value), Some(Ordering::Less | Ordering::Equal))
        }
        Predicate::ILike { column, needle } => row
            .get(column)
            .and_then(Value::as_str)
            .map(|text| text.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
        Predicate::Any { predicates } => predicates.iter().any(|nested| matches(row, nested)),
    }
}

fn compare_field(row: &Value, column: &str, value: &Value) -> Option<Ordering> {
    compare(row.get(column)?, value)
}

/// Orders scalars the way the backend does, treating timestamp-shaped
/// strings as instants.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(left), Value::String(right)) => {
            match (parse_instant(left), parse_instant(right)) {
                (Some(left), Some(right)) => Some(left.cmp(&right)),
                _ => Some(left.cmp(right)),
            }
        }
        (Value::Number(left), Value::Number(right)) => left.as_f64()?.partial_cmp(&right.as_f64()?),
        (Value::Bool(left), Value::Bool(right)) => Some(left.cmp(right)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
