use std::collections::{BTreeMap, HashMap};

use dynbind::{lower, Error, Key, Location, Mapping, Typed, Value};
use serde_json::json;

#[derive(Typed, Default, Debug, Clone, PartialEq)]
struct Settings {
    #[bind(omit_empty)]
    name: String,
    #[bind(omit_empty)]
    retries: i64,
    #[bind(omit_empty)]
    enabled: bool,
    #[bind(omit_empty)]
    ratio: f64,
    #[bind(omit_empty)]
    tags: Vec<String>,
    #[bind(omit_empty)]
    labels: BTreeMap<String, String>,
}

#[derive(Typed, Default, Debug, Clone, PartialEq)]
struct Plain {
    name: String,
    count: i64,
}

#[derive(Typed, Default, Debug, Clone, PartialEq)]
struct Holder {
    #[bind(omit_empty)]
    inner: Option<Box<Plain>>,
    #[bind(omit_empty)]
    ratio: Option<f64>,
}

fn loc(line: usize, column: usize) -> Location {
    Location::new("job.yml", line, column)
}

#[test]
fn zero_record_against_null_is_null() {
    let out = lower(&Settings::default(), &Value::NULL).unwrap();
    assert!(out.is_null());
}

#[test]
fn zero_record_against_map_is_empty_map() {
    let reference = Value::map(Mapping::new());
    let out = lower(&Settings::default(), &reference).unwrap();
    assert_eq!(out, Value::map(Mapping::new()));
}

#[test]
fn fields_without_omit_empty_are_always_emitted() {
    let out = lower(&Plain::default(), &Value::NULL).unwrap();
    assert_eq!(out, Value::from(json!({"name": "", "count": 0})));
    assert_eq!(out.as_map().unwrap().keys().collect::<Vec<_>>(), ["name", "count"]);
}

#[test]
fn map_entries_keep_zero_values() {
    let mut map = BTreeMap::new();
    map.insert("a".to_owned(), String::new());
    let out = lower(&map, &Value::NULL).unwrap();
    assert_eq!(out, Value::from(json!({"a": ""})));
}

#[test]
fn hash_map_entries_are_sorted() {
    let map: HashMap<String, i64> = [("b", 2), ("a", 0), ("c", 3)]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();
    let out = lower(&map, &Value::NULL).unwrap();
    assert_eq!(out.as_map().unwrap().keys().collect::<Vec<_>>(), ["a", "b", "c"]);
    assert_eq!(out.get("a"), Some(&Value::from(0)));
}

#[test]
fn sequence_elements_keep_zero_values() {
    let out = lower(&vec![String::new(), "x".to_owned()], &Value::NULL).unwrap();
    assert_eq!(out, Value::from(json!(["", "x"])));

    let empty: Vec<i64> = Vec::new();
    assert_eq!(lower(&empty, &Value::NULL).unwrap(), Value::seq(Vec::new()));
}

#[test]
fn empty_collections_in_omit_empty_fields_are_omitted() {
    let settings = Settings {
        name: "nightly".to_owned(),
        ..Default::default()
    };
    let out = lower(&settings, &Value::NULL).unwrap();
    assert_eq!(out, Value::from(json!({"name": "nightly"})));

    // Unless the reference already has them.
    let reference = Value::from(json!({"tags": [], "labels": {}}));
    let out = lower(&settings, &reference).unwrap();
    assert_eq!(out, Value::from(json!({"name": "nightly", "tags": [], "labels": {}})));
}

#[test]
fn unchanged_scalars_keep_reference_provenance() {
    let reference: Mapping = [
        ("name", Value::from("nightly").with_location(loc(3, 9))),
        ("retries", Value::from(3).with_location(loc(4, 12))),
        ("enabled", Value::from(true).with_location(loc(5, 12))),
    ]
    .into_iter()
    .collect();
    let reference = Value::map(reference).with_location(loc(2, 3));

    let settings = Settings {
        name: "nightly".to_owned(),
        retries: 5,
        enabled: true,
        ..Default::default()
    };
    let out = lower(&settings, &reference).unwrap();

    assert_eq!(out.locations(), [loc(2, 3)]);
    assert_eq!(out.get("name").unwrap().locations(), [loc(3, 9)]);
    assert_eq!(out.get("enabled").unwrap().locations(), [loc(5, 12)]);

    let retries = out.get("retries").unwrap();
    assert_eq!(retries, &Value::from(5));
    assert!(retries.locations().is_empty());
}

#[test]
fn reference_keys_are_reused() {
    let reference: Mapping = [(
        Key::new("name").with_locations(vec![loc(3, 3)]),
        Value::from("old"),
    )]
    .into_iter()
    .collect();
    let reference = Value::map(reference);

    let settings = Settings {
        name: "new".to_owned(),
        ..Default::default()
    };
    let out = lower(&settings, &reference).unwrap();
    let pair = out.as_map().unwrap().get_pair("name").unwrap();
    assert_eq!(pair.key.locations(), [loc(3, 3)]);
    assert_eq!(pair.value, Value::from("new"));
}

#[test]
fn null_pointer_keeps_null_reference_provenance() {
    let none: Option<Plain> = None;

    let reference = Value::NULL.with_location(loc(7, 1));
    let out = lower(&none, &reference).unwrap();
    assert!(out.is_null());
    assert_eq!(out.locations(), [loc(7, 1)]);

    let out = lower(&none, &Value::from(json!({"name": "x"}))).unwrap();
    assert!(out.is_null());
    assert!(out.locations().is_empty());
}

#[test]
fn set_pointer_keeps_zero_pointee() {
    let holder = Holder {
        inner: Some(Box::default()),
        ratio: Some(0.0),
    };
    let out = lower(&holder, &Value::NULL).unwrap();
    assert_eq!(
        out,
        Value::from(json!({"inner": {"name": "", "count": 0}, "ratio": 0.0}))
    );

    let out = lower(&Holder::default(), &Value::NULL).unwrap();
    assert!(out.is_null());
}

#[test]
fn zero_scalar_keeps_variable_reference() {
    let reference = Value::from(json!({
        "retries": "${var.retries}",
        "enabled": "${var.enabled}",
        "name": "${var.name}",
    }));
    let out = lower(&Settings::default(), &reference).unwrap();
    // An empty string is a value in its own right and replaces the reference.
    assert_eq!(
        out,
        Value::from(json!({
            "retries": "${var.retries}",
            "enabled": "${var.enabled}",
            "name": "",
        }))
    );
}

#[test]
fn set_scalar_replaces_variable_reference() {
    let reference: Mapping = [("retries", Value::from("${var.retries}").with_location(loc(2, 10)))]
        .into_iter()
        .collect();
    let reference = Value::map(reference);
    let settings = Settings {
        retries: 5,
        ..Settings::default()
    };
    let out = lower(&settings, &reference).unwrap();
    let retries = out.get("retries").unwrap();
    assert_eq!(retries, &Value::from(5));
    assert!(retries.locations().is_empty());
}

#[test]
fn zero_record_keeps_variable_reference() {
    let reference = Value::from(json!({"inner": "${var.inner}"}));
    let holder = Holder {
        inner: Some(Box::default()),
        ratio: None,
    };
    // A set pointer materializes its zero pointee.
    let out = lower(&holder, &reference).unwrap();
    assert_eq!(out, Value::from(json!({"inner": {"name": "", "count": 0}})));

    let out = lower(&Settings::default(), &Value::from("${var.settings}")).unwrap();
    assert_eq!(out, Value::from("${var.settings}"));
}

#[test]
fn anchors_in_reference_are_ignored() {
    let reference: Mapping = [(
        "name",
        Value::from("nightly").with_location(loc(1, 7)).mark_anchor(),
    )]
    .into_iter()
    .collect();
    let settings = Settings {
        name: "nightly".to_owned(),
        ..Default::default()
    };
    let out = lower(&settings, &Value::map(reference)).unwrap();
    let name = out.get("name").unwrap();
    assert_eq!(name, &Value::from("nightly"));
    assert!(name.locations().is_empty());
    assert!(!name.is_anchor());
}

#[test]
fn sequence_elements_use_reference_by_index() {
    let reference = Value::seq(vec![
        Value::from(1).with_location(loc(2, 5)),
        Value::from(2).with_location(loc(3, 5)),
    ]);
    let out = lower(&vec![1i64, 7, 9], &reference).unwrap();
    let items = out.as_seq().unwrap();
    assert_eq!(items[0].locations(), [loc(2, 5)]);
    assert!(items[1].locations().is_empty());
    assert_eq!(out, Value::from(json!([1, 7, 9])));
}

#[derive(Typed, Default)]
struct WithAny {
    extra: serde_json::Value,
}

#[test]
fn any_fields_are_projected() {
    let with_any = WithAny {
        extra: json!({"k": [1, "two"]}),
    };
    let out = lower(&with_any, &Value::NULL).unwrap();
    assert_eq!(out, Value::from(json!({"extra": {"k": [1, "two"]}})));

    let out = lower(&WithAny::default(), &Value::NULL).unwrap();
    assert!(out.is_null());
}

#[test]
fn invalid_value_is_unsupported() {
    let mut map = BTreeMap::new();
    map.insert("bad".to_owned(), Value::INVALID);
    let err = lower(&map, &Value::NULL).unwrap_err();
    assert!(matches!(err, Error::UnsupportedKind { .. }), "{err}");
}
