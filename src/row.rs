//! Mapping between [`Session`] values and table rows.
//!
//! Only two columns are transformed: `expires` (milliseconds in memory,
//! whole seconds in the table) and `accessToken` (plaintext in memory,
//! encrypted in the table). Everything else passes through unchanged.

use sea_orm::Value;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use tracing::warn;

use crate::connection::Row;
use crate::encryption::Encryptor;
use crate::error::{Result, StorageError};
use crate::session::{OnlineAccessInfo, Session};

pub(crate) const ID: &str = "id";
pub(crate) const SHOP: &str = "shop";
const STATE: &str = "state";
const IS_ONLINE: &str = "isOnline";
const SCOPE: &str = "scope";
const EXPIRES: &str = "expires";
const ACCESS_TOKEN: &str = "accessToken";
const USER_ID: &str = "userId";
const FIRST_NAME: &str = "firstName";
const LAST_NAME: &str = "lastName";
const EMAIL: &str = "email";
const ACCOUNT_OWNER: &str = "accountOwner";
const LOCALE: &str = "locale";
const COLLABORATOR: &str = "collaborator";
const EMAIL_VERIFIED: &str = "emailVerified";

/// Flattens a session into `(column, value)` pairs in a fixed order.
///
/// Every canonical column is present, with `NULL` for absent optional values,
/// so that an upsert fully replaces the previous row. Profile flags fall back
/// to `false` for offline sessions because the canonical schema declares them
/// `NOT NULL`.
pub(crate) fn session_to_columns(
    session: &Session,
    encryptor: &dyn Encryptor,
) -> Result<Vec<(String, Value)>> {
    let access_token = session
        .access_token
        .as_deref()
        .map(|token| encryptor.encrypt(token))
        .transpose()?;
    let info = session.online_access_info.as_ref();

    let mut columns: Vec<(String, Value)> = vec![
        (ID.into(), session.id.clone().into()),
        (SHOP.into(), session.shop.clone().into()),
        (STATE.into(), session.state.clone().into()),
        (IS_ONLINE.into(), session.is_online.into()),
        (SCOPE.into(), session.scope.clone().into()),
        (
            EXPIRES.into(),
            session.expires.map(OffsetDateTime::unix_timestamp).into(),
        ),
        (ACCESS_TOKEN.into(), access_token.into()),
        (USER_ID.into(), info.map(|i| i.user_id).into()),
        (FIRST_NAME.into(), info.and_then(|i| i.first_name.clone()).into()),
        (LAST_NAME.into(), info.and_then(|i| i.last_name.clone()).into()),
        (EMAIL.into(), info.and_then(|i| i.email.clone()).into()),
        (ACCOUNT_OWNER.into(), info.is_some_and(|i| i.account_owner).into()),
        (LOCALE.into(), info.and_then(|i| i.locale.clone()).into()),
        (COLLABORATOR.into(), info.is_some_and(|i| i.collaborator).into()),
        (EMAIL_VERIFIED.into(), info.is_some_and(|i| i.email_verified).into()),
    ];

    for (name, value) in &session.extra {
        if value.is_null() {
            return Err(StorageError::InvalidArgument(
                "extra field must not be null",
            ));
        }
        if columns.iter().any(|(column, _)| column == name) {
            return Err(StorageError::InvalidArgument(
                "extra field shadows a session column",
            ));
        }
        columns.push((name.clone(), json_to_value(value)));
    }

    Ok(columns)
}

/// Rebuilds a session from a row, reversing the column transforms.
pub(crate) fn row_to_session(mut row: Row, encryptor: &dyn Encryptor) -> Result<Session> {
    let id = required_string(&mut row, ID)?;
    let shop = required_string(&mut row, SHOP)?;
    let state = required_string(&mut row, STATE)?;
    let is_online = take_bool(&mut row, IS_ONLINE)?.unwrap_or(false);
    let scope = take_string(&mut row, SCOPE)?;

    let expires = take_i64(&mut row, EXPIRES)?
        .map(|secs| {
            OffsetDateTime::from_unix_timestamp(secs)
                .map_err(|e| StorageError::Decode(format!("`{EXPIRES}` out of range: {e}")))
        })
        .transpose()?;

    let access_token = match take_string(&mut row, ACCESS_TOKEN)? {
        Some(token) if !token.is_empty() => Some(encryptor.decrypt(&token).inspect_err(|_| {
            warn!(
                session_id = %id,
                "stored access token could not be decrypted; it may have been written with a different encryptor"
            );
        })?),
        _ => None,
    };

    let user_id = take_i64(&mut row, USER_ID)?;
    let first_name = take_string(&mut row, FIRST_NAME)?;
    let last_name = take_string(&mut row, LAST_NAME)?;
    let email = take_string(&mut row, EMAIL)?;
    let account_owner = take_bool(&mut row, ACCOUNT_OWNER)?.unwrap_or(false);
    let locale = take_string(&mut row, LOCALE)?;
    let collaborator = take_bool(&mut row, COLLABORATOR)?.unwrap_or(false);
    let email_verified = take_bool(&mut row, EMAIL_VERIFIED)?.unwrap_or(false);

    let online_access_info = user_id.map(|user_id| OnlineAccessInfo {
        user_id,
        first_name,
        last_name,
        email,
        account_owner,
        locale,
        collaborator,
        email_verified,
    });

    let extra = row
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();

    Ok(Session {
        id,
        shop,
        state,
        is_online,
        scope,
        expires,
        access_token,
        online_access_info,
        extra,
    })
}

fn json_to_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Bool(flag) => (*flag).into(),
        JsonValue::Number(n) => match n.as_i64() {
            Some(int) => int.into(),
            None => n.as_f64().into(),
        },
        JsonValue::String(s) => s.clone().into(),
        // arrays and objects go in as JSON
        other => other.clone().into(),
    }
}

fn required_string(row: &mut Row, column: &str) -> Result<String> {
    take_string(row, column)?
        .ok_or_else(|| StorageError::Decode(format!("missing `{column}` column")))
}

fn take_string(row: &mut Row, column: &str) -> Result<Option<String>> {
    match row.remove(column) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(type_error(column, "text", &other)),
    }
}

fn take_i64(row: &mut Row, column: &str) -> Result<Option<i64>> {
    match row.remove(column) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.floor() as i64))
            .map(Some)
            .ok_or_else(|| StorageError::Decode(format!("`{column}` is not an integer"))),
        Some(JsonValue::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|_| StorageError::Decode(format!("`{column}` is not an integer"))),
        Some(other) => Err(type_error(column, "integer", &other)),
    }
}

// Drivers without a native boolean type hand flags back as 0/1.
fn take_bool(row: &mut Row, column: &str) -> Result<Option<bool>> {
    match row.remove(column) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Bool(flag)) => Ok(Some(flag)),
        Some(JsonValue::Number(n)) if n.as_i64().is_some() => Ok(Some(n.as_i64() != Some(0))),
        Some(other) => Err(type_error(column, "boolean", &other)),
    }
}

fn type_error(column: &str, expected: &str, found: &JsonValue) -> StorageError {
    let kind = match found {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "text",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    };
    StorageError::Decode(format!("`{column}` should be {expected}, found {kind}"))
}
