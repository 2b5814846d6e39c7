//! The session record persisted by the store.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use time::OffsetDateTime;

/// An authorization session for one shop.
///
/// Offline sessions carry only the shop-level grant; online sessions also
/// carry the [`OnlineAccessInfo`] of the user who authorized them.
///
/// `expires` keeps millisecond precision in memory but the store persists it
/// as whole seconds, so a loaded session's expiry is truncated to the second.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Unique session identifier; the table's primary key.
    pub id: String,
    /// Shop domain the session belongs to, e.g. `example.myshopify.com`.
    pub shop: String,
    /// OAuth state nonce from the authorization flow.
    pub state: String,
    /// `true` for per-user sessions, `false` for shop-wide offline sessions.
    pub is_online: bool,
    /// Comma-separated granted scopes. Stored as unbounded text.
    pub scope: Option<String>,
    /// When the session stops being valid. Offline sessions usually have none.
    pub expires: Option<OffsetDateTime>,
    /// API access token. Encrypted at rest when the store has an encryptor.
    pub access_token: Option<String>,
    /// Profile of the authorizing user, for online sessions.
    pub online_access_info: Option<OnlineAccessInfo>,
    /// Additional scalar fields written to same-named columns.
    ///
    /// On load, every non-null column the store does not recognise lands
    /// here. Values must not be null; storing a `null` extra fails
    /// with [`StorageError::InvalidArgument`](crate::StorageError::InvalidArgument)
    /// because a null column reads back as absent.
    ///
    /// Storing a field whose column does not exist fails with
    /// [`StorageError::SchemaMismatch`](crate::StorageError::SchemaMismatch).
    pub extra: BTreeMap<String, JsonValue>,
}

/// Profile of the user behind an online session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OnlineAccessInfo {
    /// Platform user id. Its presence marks a stored row as online.
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub account_owner: bool,
    pub locale: Option<String>,
    pub collaborator: bool,
    pub email_verified: bool,
}

impl Session {
    /// Creates a session with no scope, expiry, token or profile.
    pub fn new(
        id: impl Into<String>,
        shop: impl Into<String>,
        state: impl Into<String>,
        is_online: bool,
    ) -> Self {
        Self {
            id: id.into(),
            shop: shop.into(),
            state: state.into(),
            is_online,
            scope: None,
            expires: None,
            access_token: None,
            online_access_info: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_expires(mut self, expires: OffsetDateTime) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_online_access_info(mut self, info: OnlineAccessInfo) -> Self {
        self.online_access_info = Some(info);
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Expiry as milliseconds since the Unix epoch.
    pub fn expires_millis(&self) -> Option<i64> {
        self.expires
            .map(|at| at.unix_timestamp_nanos().div_euclid(1_000_000) as i64)
    }

    /// Sets the expiry from milliseconds since the Unix epoch.
    ///
    /// Returns `None` if the instant is outside the representable range.
    pub fn with_expires_millis(mut self, millis: i64) -> Option<Self> {
        let at = OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()?;
        self.expires = Some(at);
        Some(self)
    }

    /// Whether the session has an expiry that lies in the past.
    pub fn is_expired(&self) -> bool {
        self.expires
            .is_some_and(|at| at <= OffsetDateTime::now_utc())
    }
}
