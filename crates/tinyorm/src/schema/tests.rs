use super::*;
use crate::model::{Defaults, ModelHooks};
use crate::testing::ScriptedClient;
use crate::value::Value;

#[test]
fn register_introspects_columns_in_order() {
    struct Account;
    impl ModelHooks for Account {}
    impl Model for Account {}

    let client = ScriptedClient::new(&["id", "owner", "balance"]);
    let meta = register::<Account>(client.clone()).unwrap();

    assert_eq!(meta.table(), "account");
    assert_eq!(meta.type_name(), "Account");
    assert_eq!(
        meta.field_names().collect::<Vec<_>>(),
        vec!["id", "owner", "balance"]
    );
    assert_eq!(meta.pk_index(), 0);
    assert!(meta.has_field("balance"));
    assert!(!meta.has_field("Balance"));
    assert_eq!(
        client.take_sql(),
        vec!["SELECT * FROM `account` LIMIT 0".to_string()]
    );
    assert_eq!(client.commits(), 1);
}

#[test]
fn second_registration_is_cached() {
    struct Ledger;
    impl ModelHooks for Ledger {}
    impl Model for Ledger {}

    let client = ScriptedClient::new(&["id", "memo"]);
    let first = register::<Ledger>(client.clone()).unwrap();
    let second = register::<Ledger>(client.clone()).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(client.take_log().len(), 1);
    assert!(is_registered::<Ledger>());
}

#[test]
fn custom_primary_key_position() {
    struct Person;
    impl ModelHooks for Person {}
    impl Model for Person {
        const TABLE: Option<&'static str> = Some("people");
        const PRIMARY_KEY: &'static str = "person_id";
    }

    let client = ScriptedClient::new(&["name", "person_id"]);
    let meta = register::<Person>(client).unwrap();
    assert_eq!(meta.table(), "people");
    assert_eq!(meta.primary_key(), "person_id");
    assert_eq!(meta.pk_index(), 1);
}

#[test]
fn missing_primary_key_is_schema_error() {
    struct NoKey;
    impl ModelHooks for NoKey {}
    impl Model for NoKey {}

    let client = ScriptedClient::new(&["name"]);
    let err = register::<NoKey>(client).unwrap_err();
    assert!(err.is_schema_introspection());
    assert!(!is_registered::<NoKey>());
}

#[test]
fn missing_table_is_schema_error() {
    struct Ghost;
    impl ModelHooks for Ghost {}
    impl Model for Ghost {}

    let client = ScriptedClient::new(&[]);
    let err = register::<Ghost>(client.clone()).unwrap_err();
    assert!(err.is_schema_introspection());
    assert!(err.to_string().contains("`ghost`"));
    assert!(!is_registered::<Ghost>());
}

#[test]
fn defaults_attach_only_to_known_fields() {
    struct Widget;
    impl ModelHooks for Widget {}
    impl Model for Widget {
        fn defaults() -> Defaults {
            Defaults::new()
                .value("color", "red")
                .value("weight", Value::Null)
                .value("nonexistent", 1)
        }
    }

    let client = ScriptedClient::new(&["id", "color", "weight"]);
    let meta = register::<Widget>(client).unwrap();

    let fields = meta.fields();
    assert_eq!(fields.len(), 3);
    assert!(fields[0].default.is_none());
    assert_eq!(
        fields[1].default.as_ref().map(|d| d.resolve()),
        Some(Value::from("red"))
    );
    // A Null constant never changes anything, so it is dropped.
    assert!(fields[2].default.is_none());
}

#[test]
fn lookup_before_register_fails() {
    struct Later;
    impl ModelHooks for Later {}
    impl Model for Later {}

    let err = lookup::<Later>().unwrap_err();
    assert!(matches!(err, OrmError::NotRegistered("Later")));
}
