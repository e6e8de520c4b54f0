use param_core::{RegistryError, SnapshotOptions};
use param_domain::{DomainError, Pulse, PulseBuilder, PulseQuery, PulseSequence};
use serde_json::json;

fn pulse(name: &str, t_start: f64, duration: f64) -> Pulse {
    Pulse::builder(name).t_start(t_start).duration(duration).build().unwrap()
}

#[test]
fn duration_is_last_t_stop() {
    let seq = PulseSequence::new(Some("seq")).unwrap();
    seq.add_pulse(pulse("read", 0.0, 2.0)).unwrap();
    seq.add_pulse(pulse("plunge", 5.0, 1.0)).unwrap();

    assert_eq!(seq.len(), 2);
    assert_eq!(seq.get("duration").unwrap(), json!(6.0));
    assert_eq!(seq.get("t_stop_list").unwrap(), json!([2.0, 6.0]));
    assert_eq!(seq.get("t_start_list").unwrap(), json!([0.0, 5.0]));
}

#[test]
fn duration_follows_pulse_changes() {
    let seq = PulseSequence::new(None).unwrap();
    let read = seq.add_pulse(pulse("read", 0.0, 2.0)).unwrap();
    assert_eq!(seq.parameter("duration").unwrap().get_latest(), json!(2.0));

    read.set_attr("duration", 4.0).unwrap();
    assert_eq!(seq.parameter("duration").unwrap().get_latest(), json!(4.0));
}

#[test]
fn explicit_duration_overrides_until_reset() {
    let seq = PulseSequence::new(None).unwrap();
    seq.add_pulse(pulse("read", 0.0, 2.0)).unwrap();

    seq.set_attr("duration", 10.0).unwrap();
    assert_eq!(seq.get("duration").unwrap(), json!(10.0));

    seq.set_attr("duration", serde_json::Value::Null).unwrap();
    assert_eq!(seq.get("duration").unwrap(), json!(2.0));

    seq.set("duration", 10.0).unwrap();
    seq.add_pulse(pulse("plunge", 3.0, 1.0)).unwrap();
    assert_eq!(seq.get("duration").unwrap(), json!(4.0));
}

#[test]
fn lists_are_read_only() {
    let seq = PulseSequence::new(Some("seq")).unwrap();
    assert_eq!(seq.set("t_stop_list", json!([1.0])).unwrap_err(),
               RegistryError::ReadOnly { parameter: "seq_t_stop_list".into() });
}

#[test]
fn pulses_are_unique_and_named() {
    let seq = PulseSequence::new(None).unwrap();
    seq.add_pulse(pulse("read", 0.0, 1.0)).unwrap();

    assert_eq!(seq.add_pulse(pulse("read", 2.0, 1.0)).unwrap_err(),
               DomainError::DuplicatePulse("read".into()));
    assert_eq!(seq.add_pulse(PulseBuilder::unnamed().build().unwrap()).unwrap_err(),
               DomainError::UnnamedPulse);
    // nombres de parámetros de la secuencia tampoco sirven
    assert!(matches!(seq.add_pulse(pulse("duration", 0.0, 1.0)),
                     Err(DomainError::Registry(RegistryError::NameCollision { .. }))));
}

#[test]
fn overlap_is_rejected_when_disabled() {
    let seq = PulseSequence::new(None).unwrap();
    seq.set("allow_pulse_overlap", false).unwrap();
    seq.add_pulse(pulse("read", 0.0, 2.0)).unwrap();

    assert_eq!(seq.add_pulse(pulse("plunge", 1.0, 2.0)).unwrap_err(),
               DomainError::PulseOverlap { pulse: "plunge".into(),
                                           other: "read".into() });
    seq.add_pulse(pulse("empty", 2.0, 1.0)).unwrap();
}

#[test]
fn enabled_pulses_sorted_by_start() {
    let seq = PulseSequence::new(None).unwrap();
    seq.add_pulse(pulse("late", 5.0, 1.0)).unwrap();
    seq.add_pulse(pulse("early", 1.0, 1.0)).unwrap();
    let off = seq.add_pulse(pulse("off", 0.0, 1.0)).unwrap();
    off.set("enabled", false).unwrap();

    let names: Vec<String> = seq.enabled_pulses()
                                .unwrap()
                                .iter()
                                .filter_map(|p| p.name())
                                .collect();
    assert_eq!(names, ["early", "late"]);
    assert_eq!(seq.get("t_start_list").unwrap(), json!([1.0, 5.0]));
    assert!(seq.pulse("off").is_ok());
    assert!(seq.pulse("final_delay").is_err());
}

#[test]
fn pulse_parameters_carry_sequence_prefix() {
    let seq = PulseSequence::new(Some("seq")).unwrap();
    let read = seq.add_pulse(Pulse::builder("read").amplitude(1.0).build().unwrap()).unwrap();
    assert_eq!(read.parameter("amplitude").unwrap().full_name(), "seq_read_amplitude");
}

#[test]
fn simplified_snapshot_nests_pulses() {
    let seq = PulseSequence::new(None).unwrap();
    seq.add_pulse(pulse("read", 0.0, 2.0)).unwrap();

    let snap = seq.snapshot().unwrap();
    assert_eq!(snap["__class__"], json!("PulseSequence"));
    assert_eq!(snap["final_delay (s)"], json!(0.5e-3));
    assert_eq!(snap["duration (s)"], json!(2.0));
    assert_eq!(snap["read"]["__class__"], json!("Pulse"));
    assert_eq!(snap["read"]["t_stop (s)"], json!(2.0));

    let full = seq.snapshot_with(SnapshotOptions::simplified(false)).unwrap();
    assert_eq!(full["parameters"]["final_delay"]["unit"], json!("s"));
    assert_eq!(full["parameter_nodes"]["read"]["duration (s)"], json!(2.0));
}

#[test]
fn removed_pulse_no_longer_drives_duration() {
    let seq = PulseSequence::new(Some("seq")).unwrap();
    seq.add_pulse(pulse("read", 0.0, 2.0)).unwrap();
    let plunge = seq.add_pulse(pulse("plunge", 5.0, 1.0)).unwrap();
    assert_eq!(plunge.parameter("t_stop").unwrap().listener_count(), 1);
    seq.set("duration", 10.0).unwrap();

    let removed = seq.remove_pulse("plunge").unwrap();
    assert!(removed.as_node().ptr_eq(plunge.as_node()));
    assert_eq!(seq.len(), 1);
    assert!(plunge.parent().is_none());
    assert_eq!(plunge.parameter("t_stop").unwrap().listener_count(), 0);
    assert_eq!(seq.parameter("duration").unwrap().get_latest(), json!(2.0));

    plunge.set("duration", 10.0).unwrap();
    assert_eq!(seq.parameter("duration").unwrap().get_latest(), json!(2.0));

    let other = PulseSequence::new(Some("other")).unwrap();
    other.add_pulse(plunge.clone()).unwrap();
    assert_eq!(plunge.parameter("amplitude").unwrap().full_name(), "other_plunge_amplitude");
    assert_eq!(other.get("duration").unwrap(), json!(15.0));
}

#[test]
fn removing_unknown_pulse_fails() {
    let seq = PulseSequence::new(None).unwrap();
    assert!(matches!(seq.remove_pulse("read"),
                     Err(DomainError::Registry(RegistryError::AttributeNotFound { .. }))));
}

#[test]
fn clear_removes_every_pulse() {
    let seq = PulseSequence::new(None).unwrap();
    let read = seq.add_pulse(pulse("read", 0.0, 2.0)).unwrap();
    seq.add_pulse(pulse("plunge", 5.0, 1.0)).unwrap();

    seq.clear().unwrap();
    assert!(seq.is_empty());
    assert_eq!(seq.get("duration").unwrap(), json!(0.0));
    assert_eq!(seq.get("t_stop_list").unwrap(), json!([]));
    assert_eq!(seq.get("final_delay").unwrap(), json!(0.5e-3));
    assert!(read.parent().is_none());
}

#[test]
fn get_pulses_filters_by_state_name_and_value() {
    let seq = PulseSequence::new(None).unwrap();
    seq.add_pulse(Pulse::builder("plunge").t_start(5.0).duration(1.0).amplitude(0.5).build().unwrap())
       .unwrap();
    seq.add_pulse(Pulse::builder("read").t_start(0.0).duration(2.0).amplitude(1.0).build().unwrap())
       .unwrap();
    seq.add_pulse(Pulse::builder("off").t_start(2.0).duration(1.0).amplitude(1.0).enabled(false).build().unwrap())
       .unwrap();

    let names = |pulses: Vec<Pulse>| pulses.iter().filter_map(|p| p.name()).collect::<Vec<_>>();
    assert_eq!(names(seq.get_pulses(&PulseQuery::new()).unwrap()), ["read", "plunge"]);
    assert_eq!(names(seq.get_pulses(&PulseQuery::new().with("amplitude", 1)).unwrap()), ["read"]);
    assert_eq!(names(seq.get_pulses(&PulseQuery::new().include_disabled().with("amplitude", 1.0)).unwrap()),
               ["read", "off"]);
    assert!(seq.get_pulses(&PulseQuery::new().name("off")).unwrap().is_empty());

    let plunge = seq.get_pulse(&PulseQuery::new().name("plunge")).unwrap().unwrap();
    assert_eq!(plunge.get("amplitude").unwrap(), json!(0.5));
    assert!(seq.get_pulse(&PulseQuery::new().with("frequency", 1.0)).unwrap().is_none());
    assert!(matches!(seq.get_pulse(&PulseQuery::new().include_disabled().with("amplitude", 1.0)),
                     Err(DomainError::AmbiguousPulse(_))));
}

#[test]
fn sequence_copy_is_equal_and_independent() {
    let seq = PulseSequence::new(Some("seq")).unwrap();
    seq.add_pulse(pulse("read", 0.0, 2.0)).unwrap();
    seq.add_pulse(pulse("plunge", 5.0, 1.0)).unwrap();
    seq.set("final_delay", 1e-3).unwrap();

    let copy = seq.copy().unwrap();
    assert_eq!(copy, seq);
    assert_eq!(copy.len(), 2);
    assert!(!copy.pulse("read").unwrap().as_node().ptr_eq(seq.pulse("read").unwrap().as_node()));

    copy.pulse("read").unwrap().set("amplitude", 2.0).unwrap();
    assert_ne!(copy, seq);
    assert_eq!(seq.pulse("read").unwrap().get("amplitude").unwrap(), json!(null));

    seq.set("duration", 10.0).unwrap();
    assert_eq!(seq.copy().unwrap().get("duration").unwrap(), json!(10.0));
}
