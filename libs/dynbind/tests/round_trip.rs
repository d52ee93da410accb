use std::collections::BTreeMap;

use dynbind::{lower, normalize, raise, Location, Mapping, Typed, Value};
use serde_json::json;

#[derive(Typed, Default, Debug, Clone, PartialEq)]
struct Cluster {
    #[bind(name = "node_type_id")]
    node_type: String,
    #[bind(omit_empty)]
    num_workers: i32,
    #[bind(omit_empty)]
    autotermination: bool,
    #[bind(omit_empty)]
    spark_conf: BTreeMap<String, String>,
}

#[derive(Typed, Default, Debug, Clone, PartialEq)]
struct Settings {
    #[bind(omit_empty)]
    description: String,
    #[bind(omit_empty)]
    max_retries: i64,
}

#[derive(Typed, Default, Debug, Clone, PartialEq)]
struct Job {
    name: String,
    #[bind(omit_empty)]
    clusters: Vec<Cluster>,
    #[bind(omit_empty)]
    timeout: f64,
    #[bind(flatten)]
    settings: Option<Box<Settings>>,
}

fn sample() -> Job {
    Job {
        name: "nightly".to_owned(),
        clusters: vec![Cluster {
            node_type: "i3.xlarge".to_owned(),
            num_workers: 4,
            autotermination: true,
            spark_conf: [("spark.speculation".to_owned(), "true".to_owned())]
                .into_iter()
                .collect(),
        }],
        timeout: 1.5,
        settings: Some(Box::new(Settings {
            description: "runs every night".to_owned(),
            max_retries: 3,
        })),
    }
}

#[test]
fn raise_after_lower_is_identity() {
    let job = sample();
    let lowered = lower(&job, &Value::NULL).unwrap();

    let mut out = Job::default();
    raise(&mut out, &lowered).unwrap();
    assert_eq!(out, job);
}

#[test]
fn lower_after_raise_reproduces_source() {
    let src = Value::from(json!({
        "name": "nightly",
        "max_retries": 2,
        "clusters": [{"node_type_id": "m5.large", "num_workers": 0}],
    }));
    let mut job = Job::default();
    raise(&mut job, &src).unwrap();

    let out = lower(&job, &src).unwrap();
    assert_eq!(out, src);
}

#[test]
fn edit_cycle_preserves_untouched_provenance() {
    let at = |line| Location::new("databricks.yml", line, 7);
    let cluster: Mapping = [
        ("node_type_id", Value::from("i3.xlarge").with_location(at(5))),
        ("num_workers", Value::from(2).with_location(at(6))),
    ]
    .into_iter()
    .collect();
    let root: Mapping = [
        ("name", Value::from("nightly").with_location(at(2))),
        ("timeout", Value::from("90").with_location(at(3))),
        ("clusters", Value::seq(vec![Value::map(cluster).with_location(at(5))])),
    ]
    .into_iter()
    .collect();
    let loaded = Value::map(root).with_location(at(1));

    let (normalized, diags) = normalize::<Job>(&loaded);
    assert!(diags.is_empty(), "{diags}");
    assert_eq!(normalized.get("timeout").unwrap().as_float(), Some(90.0));

    let mut job = Job::default();
    raise(&mut job, &normalized).unwrap();
    job.clusters[0].num_workers = 8;

    let out = lower(&job, &normalized).unwrap();
    assert_eq!(out.locations(), [at(1)]);
    assert_eq!(out.get("name").unwrap().locations(), [at(2)]);
    assert_eq!(out.get("timeout").unwrap().locations(), [at(3)]);

    let cluster = out.get("clusters").unwrap().index(0).unwrap();
    assert_eq!(cluster.get("node_type_id").unwrap().locations(), [at(5)]);
    let workers = cluster.get("num_workers").unwrap();
    assert_eq!(workers, &Value::from(8));
    assert!(workers.locations().is_empty());
}

#[test]
fn cleared_field_stays_explicit_while_referenced() {
    let src = Value::from(json!({"name": "nightly", "description": "old"}));
    let mut job = Job::default();
    raise(&mut job, &src).unwrap();

    if let Some(settings) = job.settings.as_mut() {
        settings.description.clear();
    }
    let out = lower(&job, &src).unwrap();
    assert_eq!(out, Value::from(json!({"name": "nightly", "description": ""})));

    let out = lower(&job, &Value::NULL).unwrap();
    assert_eq!(out, Value::from(json!({"name": "nightly"})));
}
