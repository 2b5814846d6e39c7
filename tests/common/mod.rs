#![allow(dead_code)]

use std::collections::HashSet;

use pg_session_storage::{
    Connection, EncryptionConfig, OnlineAccessInfo, PostgresStore, Session, SessionStorage,
    StorageError, SymmetricEncryptor,
};
use time::{Duration, OffsetDateTime};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn symmetric_encryptor() -> SymmetricEncryptor {
    SymmetricEncryptor::new(&EncryptionConfig::new(SymmetricEncryptor::generate_key()))
        .expect("generated key is valid")
}

/// A whole-second instant an hour from now, so it survives the round trip.
fn in_an_hour() -> OffsetDateTime {
    let at = OffsetDateTime::now_utc() + Duration::hours(1);
    OffsetDateTime::from_unix_timestamp(at.unix_timestamp()).unwrap()
}

fn offline(id: &str, shop: &str) -> Session {
    Session::new(id, shop, "state", false)
        .with_scope("test_scope")
        .with_access_token("123")
}

fn online(id: &str, shop: &str) -> Session {
    Session::new(id, shop, "state", true)
        .with_scope("test_scope")
        .with_expires(in_an_hour())
        .with_access_token("456")
        .with_online_access_info(OnlineAccessInfo {
            user_id: 1,
            first_name: Some("John".into()),
            last_name: Some("Doe".into()),
            email: Some("john@doe.com".into()),
            account_owner: true,
            locale: Some("en".into()),
            collaborator: false,
            email_verified: true,
        })
}

fn ids(sessions: &[Session]) -> HashSet<&str> {
    sessions.iter().map(|s| s.id.as_str()).collect()
}

pub async fn stores_and_deletes_all_kinds_of_sessions<C: Connection>(
    store: &PostgresStore<C>,
    prefix: &str,
) {
    let id = format!("{prefix}_session");
    let kinds = [
        offline(&id, "shop"),
        offline(&id, "shop").with_expires(in_an_hour()),
        online(&id, "shop"),
        Session::new(&id, "shop", "state", false),
        online(&id, "shop").with_scope(""),
    ];

    for session in kinds {
        assert!(store.store_session(&session).await.unwrap());
        assert_eq!(store.load_session(&id).await.unwrap(), Some(session));

        assert!(store.delete_session(&id).await.unwrap());
        assert_eq!(store.load_session(&id).await.unwrap(), None);
    }
}

pub async fn returns_none_for_missing_sessions<C: Connection>(store: &PostgresStore<C>, prefix: &str) {
    let id = format!("{prefix}_never_stored");
    assert_eq!(store.load_session(&id).await.unwrap(), None);
}

pub async fn deletes_idempotently<C: Connection>(store: &PostgresStore<C>, prefix: &str) {
    let id = format!("{prefix}_delete_twice");
    store.store_session(&offline(&id, "shop")).await.unwrap();

    assert!(store.delete_session(&id).await.unwrap());
    assert!(store.delete_session(&id).await.unwrap());
    assert!(store.delete_session(&format!("{prefix}_never_stored")).await.unwrap());
}

pub async fn upsert_replaces_every_column<C: Connection>(store: &PostgresStore<C>, prefix: &str) {
    let id = format!("{prefix}_upsert");
    let shop = format!("{prefix}-upsert.myshopify.com");

    store.store_session(&online(&id, &shop)).await.unwrap();

    let replacement = Session::new(&id, &shop, "new_state", false).with_scope("other_scope");
    store.store_session(&replacement).await.unwrap();

    assert_eq!(store.load_session(&id).await.unwrap(), Some(replacement));
    assert_eq!(store.find_sessions_by_shop(&shop).await.unwrap().len(), 1);
}

pub async fn truncates_expiry_to_seconds<C: Connection>(store: &PostgresStore<C>, prefix: &str) {
    let id = format!("{prefix}_expiry");
    let precise = OffsetDateTime::from_unix_timestamp(1_900_000_000).unwrap() + Duration::milliseconds(789);

    store
        .store_session(&offline(&id, "shop").with_expires(precise))
        .await
        .unwrap();

    let loaded = store.load_session(&id).await.unwrap().unwrap();
    assert_eq!(
        loaded.expires,
        Some(OffsetDateTime::from_unix_timestamp(1_900_000_000).unwrap())
    );
    assert_eq!(loaded.expires_millis(), Some(1_900_000_000_000));
}

pub async fn keeps_absent_expiry_absent<C: Connection>(store: &PostgresStore<C>, prefix: &str) {
    let id = format!("{prefix}_no_expiry");
    store.store_session(&offline(&id, "shop")).await.unwrap();

    let loaded = store.load_session(&id).await.unwrap().unwrap();
    assert_eq!(loaded.expires, None);
}

pub async fn finds_sessions_by_shop<C: Connection>(store: &PostgresStore<C>, prefix: &str) {
    let shop_a = format!("{prefix}-a.myshopify.com");
    let shop_b = format!("{prefix}-b.myshopify.com");

    let a1 = offline(&format!("{prefix}_a1"), &shop_a);
    let a2 = online(&format!("{prefix}_a2"), &shop_a);
    let b1 = offline(&format!("{prefix}_b1"), &shop_b);
    for session in [&a1, &a2, &b1] {
        store.store_session(session).await.unwrap();
    }

    let found = store.find_sessions_by_shop(&shop_a).await.unwrap();
    assert_eq!(ids(&found), HashSet::from([a1.id.as_str(), a2.id.as_str()]));
    assert!(found.contains(&a1) && found.contains(&a2));

    assert_eq!(store.find_sessions_by_shop(&shop_b).await.unwrap(), [b1]);
    assert!(store
        .find_sessions_by_shop(&format!("{prefix}-none.myshopify.com"))
        .await
        .unwrap()
        .is_empty());
}

pub async fn deletes_many_sessions<C: Connection>(store: &PostgresStore<C>, prefix: &str) {
    let shop = format!("{prefix}-bulk.myshopify.com");
    let other_shop = format!("{prefix}-bulk-other.myshopify.com");

    let doomed_1 = offline(&format!("{prefix}_bulk_1"), &shop);
    let doomed_2 = offline(&format!("{prefix}_bulk_2"), &shop);
    let kept = offline(&format!("{prefix}_bulk_10"), &shop);
    let other = offline(&format!("{prefix}_bulk_1_other"), &other_shop);
    for session in [&doomed_1, &doomed_2, &kept, &other] {
        store.store_session(session).await.unwrap();
    }

    assert!(store
        .delete_sessions(&[doomed_1.id.as_str(), doomed_2.id.as_str()])
        .await
        .unwrap());
    assert!(store.delete_sessions(&[]).await.unwrap());

    assert_eq!(store.load_session(&doomed_1.id).await.unwrap(), None);
    assert_eq!(store.load_session(&doomed_2.id).await.unwrap(), None);
    assert_eq!(store.find_sessions_by_shop(&shop).await.unwrap(), [kept]);
    assert_eq!(store.find_sessions_by_shop(&other_shop).await.unwrap(), [other]);
}

pub async fn keeps_long_scopes_intact<C: Connection>(store: &PostgresStore<C>, prefix: &str) {
    let id = format!("{prefix}_long_scope");
    let scope = (0..60)
        .map(|i| format!("read_resource_{i}"))
        .collect::<Vec<_>>()
        .join(",");
    assert!(scope.len() > 255);

    let session = offline(&id, "shop").with_scope(scope);
    store.store_session(&session).await.unwrap();

    assert_eq!(store.load_session(&id).await.unwrap(), Some(session));
}

pub async fn rejects_fields_without_columns<C: Connection>(store: &PostgresStore<C>, prefix: &str) {
    let id = format!("{prefix}_bogus_field");
    let original = offline(&id, "shop");
    store.store_session(&original).await.unwrap();

    let with_bogus = offline(&id, "shop")
        .with_scope("changed")
        .with_extra("notAColumn", "value");
    let result = store.store_session(&with_bogus).await;
    assert!(
        matches!(result, Err(StorageError::SchemaMismatch(_))),
        "unexpected result: {result:?}"
    );

    assert_eq!(store.load_session(&id).await.unwrap(), Some(original));
}

/// Reads the raw `accessToken` column, bypassing decryption.
pub async fn raw_access_token<C: Connection>(store: &PostgresStore<C>, id: &str) -> Option<String> {
    let conn = store.connection();
    let sql = format!(
        r#"SELECT "accessToken" FROM "{}" WHERE "id" = {}"#,
        conn.table_name(),
        conn.placeholder(1)
    );
    let rows = conn.query(&sql, vec![id.into()]).await.unwrap();
    rows.first()
        .and_then(|row| row.get("accessToken"))
        .and_then(|value| value.as_str())
        .map(str::to_string)
}

pub async fn encrypts_tokens_at_rest<C: Connection>(store: &PostgresStore<C>, prefix: &str) {
    let id = format!("{prefix}_encrypted");
    let session = offline(&id, "shop").with_access_token("shpat_secret");
    store.store_session(&session).await.unwrap();

    let stored = raw_access_token(store, &id).await.expect("token column is set");
    assert_ne!(stored, "shpat_secret");
    assert!(!stored.contains("shpat_secret"));

    assert_eq!(store.load_session(&id).await.unwrap(), Some(session));
}
