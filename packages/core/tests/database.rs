use chrono::{TimeZone, Utc};
use serde::Deserialize;

use kvtables_core::{
    CoercionKind, Database, DatabaseSchema, Error, InMemoryKvStore, KvStore, LocalDiskKvStore,
    Record, RecordId, TableSchema, Value,
};

fn schema() -> DatabaseSchema {
    DatabaseSchema::new()
        .with_table(
            "users",
            TableSchema::structured("u")
                .with_type("born", CoercionKind::Date)
                .with_type("settings.newsletter", CoercionKind::Boolean),
        )
        .with_table("colors", TableSchema::unstructured("c"))
}

#[test]
fn documented_example_payload() {
    let mut db = Database::open(&schema(), InMemoryKvStore::new()).unwrap();
    let born = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();

    let ann = db
        .table("users")
        .unwrap()
        .put(Record::structured([
            ("name", Value::from("Ann")),
            ("born", Value::from(born)),
        ]))
        .unwrap();

    assert_eq!(ann.id(), RecordId(1));
    assert_eq!(
        db.store().get("u_1").unwrap().as_deref(),
        Some(r#"{"born":946684800000,"name":"Ann"}"#)
    );
    assert_eq!(db.store().get("maxID").unwrap().as_deref(), Some("1"));

    let fetched = db.table("users").unwrap().get(RecordId(1)).unwrap().unwrap();
    assert_eq!(
        fetched,
        Record::structured([("name", Value::from("Ann")), ("born", Value::from(born))])
            .with_id(RecordId(1))
    );
}

#[test]
fn get_zero_fails_on_every_table() {
    let mut db = Database::open(&schema(), InMemoryKvStore::new()).unwrap();
    for name in ["users", "colors"] {
        assert!(matches!(
            db.table(name).unwrap().get(RecordId::NEW),
            Err(Error::Protocol { .. })
        ));
    }
}

#[test]
fn ids_are_monotonic_across_tables() {
    let mut db = Database::open(&schema(), InMemoryKvStore::new()).unwrap();

    let mut ids = Vec::new();
    for i in 0..3 {
        ids.push(
            db.table("users")
                .unwrap()
                .put(Record::structured([("n", i)]))
                .unwrap()
                .id(),
        );
        ids.push(
            db.table("colors")
                .unwrap()
                .put(Record::unstructured(format!("color-{}", i)))
                .unwrap()
                .id(),
        );
    }

    assert!(ids.windows(2).all(|w| w[0] < w[1]), "{:?}", ids);
    assert_eq!(ids.last(), Some(&RecordId(6)));
    assert_eq!(db.table("users").unwrap().count().unwrap(), 3);
    assert_eq!(db.table("colors").unwrap().count().unwrap(), 3);
}

#[test]
fn nested_type_mapping_round_trips() {
    let mut db = Database::open(&schema(), InMemoryKvStore::new()).unwrap();

    let put = db
        .table("users")
        .unwrap()
        .put(Record::structured([
            ("name", Value::from("Cy")),
            (
                "settings",
                Value::from_iter([("newsletter", true), ("beta", false)]),
            ),
        ]))
        .unwrap();

    // Only the mapped leaf is coerced; its sibling stays a JSON boolean.
    assert_eq!(
        db.store().get("u_1").unwrap().as_deref(),
        Some(r#"{"name":"Cy","settings":{"beta":false,"newsletter":1}}"#)
    );
    let got = db.table("users").unwrap().get(put.id()).unwrap();
    assert_eq!(got.as_ref(), Some(&put));
    assert_eq!(
        put.field("settings").and_then(|s| s.field("newsletter")),
        Some(&Value::Bool(true))
    );
}

#[test]
fn partial_update_keeps_unsupplied_fields() {
    let mut db = Database::open(&schema(), InMemoryKvStore::new()).unwrap();
    let mut users = db.table("users").unwrap();

    let born = Utc.with_ymd_and_hms(1985, 3, 2, 0, 0, 0).unwrap();
    let dee = users
        .put(Record::structured([
            ("name", Value::from("Dee")),
            ("born", Value::from(born)),
            ("city", Value::from("Accra")),
        ]))
        .unwrap();

    let moved = users
        .put(Record::structured([("city", "Kumasi")]).with_id(dee.id()))
        .unwrap();

    assert_eq!(moved.field("name"), Some(&Value::from("Dee")));
    assert_eq!(moved.field("born"), Some(&Value::Date(born)));
    assert_eq!(moved.field("city"), Some(&Value::from("Kumasi")));
}

#[test]
fn unknown_table_name_is_configuration_error() {
    let mut db = Database::open(&schema(), InMemoryKvStore::new()).unwrap();
    assert!(matches!(
        db.table("nope"),
        Err(Error::Configuration { .. })
    ));
    assert_eq!(db.table_names().collect::<Vec<_>>(), vec!["colors", "users"]);
}

#[test]
fn overlapping_table_keys_are_rejected() {
    let schema = DatabaseSchema::new()
        .with_table("a", TableSchema::structured("x"))
        .with_table("b", TableSchema::structured("x_y"));
    assert!(matches!(
        Database::open(&schema, InMemoryKvStore::new()),
        Err(Error::Configuration { .. })
    ));
}

#[test]
fn typed_reads() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u64,
        name: String,
        born: chrono::DateTime<Utc>,
    }

    let mut db = Database::open(&schema(), InMemoryKvStore::new()).unwrap();
    let born = Utc.with_ymd_and_hms(2001, 9, 9, 1, 46, 40).unwrap();
    let put = db
        .table("users")
        .unwrap()
        .put(Record::structured([
            ("name", Value::from("Eve")),
            ("born", Value::from(born)),
        ]))
        .unwrap();

    assert_eq!(
        put.deserialize::<User>().unwrap(),
        User {
            id: 1,
            name: "Eve".to_string(),
            born,
        }
    );
}

#[test]
fn local_disk_database_persists() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = LocalDiskKvStore::new(dir.path().to_path_buf()).unwrap();
        let mut db = Database::open(&schema(), store).unwrap();
        db.table("colors")
            .unwrap()
            .put(Record::unstructured("teal"))
            .unwrap();
        db.table("colors")
            .unwrap()
            .put(Record::unstructured("plum"))
            .unwrap();
        db.table("colors").unwrap().delete(RecordId(1)).unwrap();
    }

    let store = LocalDiskKvStore::new(dir.path().to_path_buf()).unwrap();
    let mut db = Database::open(&schema(), store).unwrap();
    let mut colors = db.table("colors").unwrap();
    assert_eq!(
        colors.get_all().unwrap(),
        vec![Record::unstructured("plum").with_id(RecordId(2))]
    );

    // The deleted id stays retired.
    let sage = colors.put(Record::unstructured("sage")).unwrap();
    assert_eq!(sage.id(), RecordId(3));
}
