//! Snapshots: forma completa, simplificada, update e idempotencia.

use param_core::{snapshot_fingerprint, NodeConfig, Parameter, ParameterNode, RegistryError, SnapshotOptions};
use serde_json::{json, Value};

fn simplified(name: Option<&str>) -> ParameterNode {
    ParameterNode::with_config(name, NodeConfig::default().with_simplify_snapshot(true))
}

#[test]
fn full_snapshot_contains_parameter_summary() {
    let node = ParameterNode::new("n");
    node.add_parameter(Parameter::with_value("p", 1)).unwrap();

    let snap = node.snapshot_with(SnapshotOptions::simplified(false)).unwrap();
    assert_eq!(snap["__class__"], json!("ParameterNode"));
    assert_eq!(snap["name"], json!("n"));
    assert_eq!(snap["parameters"]["p"]["value"], json!(1));
    assert_eq!(snap["parameters"]["p"]["raw_value"], json!(1));
    assert_eq!(snap["parameters"]["p"]["name"], json!("p"));
    assert_eq!(snap["parameters"]["p"]["full_name"], json!("n_p"));
    assert_eq!(snap["parameters"]["p"]["label"], json!("P"));
    assert_eq!(snap["parameters"]["p"]["__class__"], json!("Parameter"));
    assert_eq!(snap["parameter_nodes"], json!({}));
    assert_eq!(snap["functions"], json!({}));
    assert_eq!(snap["submodules"], json!({}));
}

#[test]
fn snapshot_keys_keep_insertion_order() {
    let node = ParameterNode::root();
    for name in ["zeta", "alpha", "mid"] {
        node.add_parameter(Parameter::new(name)).unwrap();
    }
    let snap = node.snapshot().unwrap();
    let keys: Vec<&String> = snap["parameters"].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["zeta", "alpha", "mid"]);
    let top: Vec<&String> = snap.keys().collect();
    assert_eq!(top, ["__class__", "name", "parameters", "parameter_nodes", "functions", "submodules"]);
}

#[test]
fn timestamp_absent_until_first_access() {
    let node = ParameterNode::root();
    let p = node.add_parameter(Parameter::new("p")).unwrap();
    let snap = node.snapshot().unwrap();
    assert!(snap["parameters"]["p"].get("timestamp").is_none());
    assert_eq!(snap["parameters"]["p"]["value"], Value::Null);

    p.get().unwrap();
    let snap = node.snapshot().unwrap();
    assert!(snap["parameters"]["p"]["timestamp"].is_string());
}

#[test]
fn simplify_scenario() {
    let node = simplified(None);
    node.add_parameter(Parameter::with_value("p", 1)).unwrap();
    let sub = node.add_node("subnode", simplified(None)).unwrap();
    sub.add_parameter(Parameter::new("p")).unwrap();

    let snap = node.snapshot().unwrap();
    assert_eq!(Value::Object(snap),
               json!({
                   "__class__": "ParameterNode",
                   "p": 1,
                   "subnode": {"__class__": "ParameterNode", "p": null}
               }));
}

#[test]
fn children_use_their_own_simplify_flag() {
    let node = simplified(Some("outer"));
    node.add_node("full", ParameterNode::root()).unwrap()
        .add_parameter(Parameter::with_value("x", 2))
        .unwrap();

    let snap = node.snapshot().unwrap();
    assert_eq!(snap["full"]["parameters"]["x"]["value"], json!(2));

    // el override sólo afecta al nodo raíz del snapshot
    let forced = node.snapshot_with(SnapshotOptions::simplified(false)).unwrap();
    assert_eq!(forced["parameter_nodes"]["full"]["parameters"]["x"]["value"], json!(2));
}

#[test]
fn simplified_keys_include_unit_and_skip_hidden_values() {
    let node = simplified(Some("pulse"));
    node.add_parameter(Parameter::builder("duration").unit("s").initial_value(0.001).build().unwrap())
        .unwrap();
    node.add_parameter(Parameter::builder("trace").snapshot_value(false).build().unwrap()).unwrap();

    let snap = node.snapshot().unwrap();
    assert_eq!(snap["duration (s)"], json!(0.001));
    assert!(snap.get("trace").is_none());
}

#[test]
fn snapshot_does_not_trigger_get() {
    let node = ParameterNode::root();
    node.add_parameter(Parameter::builder("v").get_cmd(|| Err(RegistryError::delegate("offline")))
                                              .build()
                                              .unwrap())
        .unwrap();
    // sin update no se consulta el dispositivo
    assert!(node.snapshot().is_ok());
    // con update el error se propaga
    assert_eq!(node.snapshot_with(SnapshotOptions::updated()).unwrap_err(),
               RegistryError::Delegate("offline".into()));
}

#[test]
fn update_refreshes_cached_values() {
    let node = ParameterNode::root();
    node.add_parameter(Parameter::builder("idn").get_cmd(|| Ok(json!("SIM-1"))).build().unwrap())
        .unwrap();
    assert_eq!(node.snapshot().unwrap()["parameters"]["idn"]["value"], Value::Null);
    let snap = node.snapshot_with(SnapshotOptions::updated()).unwrap();
    assert_eq!(snap["parameters"]["idn"]["value"], json!("SIM-1"));
}

#[test]
fn repeated_snapshots_are_identical() {
    let node = ParameterNode::new("n");
    node.add_parameter(Parameter::with_value("a", 1)).unwrap();
    node.add_node("child", ParameterNode::root()).unwrap()
        .add_parameter(Parameter::with_value("b", "x"))
        .unwrap();

    let first = node.snapshot().unwrap();
    let second = node.snapshot().unwrap();
    assert_eq!(first, second);
    assert_eq!(snapshot_fingerprint(&first), node.fingerprint().unwrap());

    node.set("a", 2).unwrap();
    assert_ne!(snapshot_fingerprint(&first), node.fingerprint().unwrap());
}

#[test]
fn functions_and_submodules_appear_in_full_snapshot() {
    let node = ParameterNode::new("dev");
    node.add_function("reset", |_| Ok(Value::Null)).unwrap();
    node.add_submodule("ch1", ParameterNode::root()).unwrap()
        .add_parameter(Parameter::with_value("voltage", 0))
        .unwrap();

    let snap = node.snapshot().unwrap();
    assert_eq!(snap["functions"]["reset"], json!({"__class__": "Function", "name": "reset"}));
    assert_eq!(snap["submodules"]["ch1"]["parameters"]["voltage"]["full_name"], json!("dev_ch1_voltage"));
}

#[test]
fn readable_table_lists_every_node() {
    let node = ParameterNode::new("pulse");
    node.add_parameter(Parameter::builder("t_start").unit("s").initial_value(1).build().unwrap())
        .unwrap();
    node.add_parameter(Parameter::with_value("name", "read")).unwrap();
    node.add_node("env", ParameterNode::root()).unwrap()
        .add_parameter(Parameter::new("x"))
        .unwrap();

    let text = node.format_snapshot(false, 80).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "pulse:");
    assert_eq!(lines[1], "\tparameter value");
    assert_eq!(lines[2], "-".repeat(80));
    assert_eq!(lines[3], "t_start :\t1 (s)");
    assert_eq!(lines[4], "name    :\tread");
    assert_eq!(lines[5], "pulse_env:");
    assert_eq!(lines[8], "x :\tNone");
}

#[test]
fn readable_rows_are_truncated() {
    let node = ParameterNode::new("n");
    node.add_parameter(Parameter::with_value("p", "a very long string value that will not fit")).unwrap();
    let text = node.format_snapshot(false, 20).unwrap();
    let row = text.lines().nth(3).unwrap();
    assert_eq!(row.chars().count(), 20);
    assert!(row.ends_with("..."));
}
