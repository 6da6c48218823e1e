use chrono::{TimeZone, Utc};
use classic_monitor::datapoint::{DatapointDefinition, Method, Value};
use classic_monitor::error::EvalError;
use classic_monitor::{RegisterSnapshot, Registry, SnapshotEvaluator};
use std::sync::Arc;

/// A Classic 150 bulk charging a 48 V bank
const REGISTERS: &[(u16, u16)] = &[
    (4101, 0x0296),
    (4102, 2019),
    (4103, (3 << 8) | 7),
    (4115, 480),
    (4116, 1000),
    (4117, 100),
    (4118, 52),
    (4119, 480),
    (4120, (4 << 8) | 3),
    (4121, 52),
    (4126, 12345),
    (4127, 1),
    (4130, 0),
    (4131, 0),
    (4132, 65535),
    (4133, 312),
    (4134, 287),
    (4138, 0),
    (4275, 12),
    (4349, 3600),
    (4350, 0),
    (4371, 60),
    (4372, 75),
    (4373, 87),
    (4377, 180),
    (4381, 200),
    (16387, 2010),
    (16389, 1919),
];

fn snapshot(skip: &[u16]) -> RegisterSnapshot {
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
    RegisterSnapshot::new(
        ts,
        REGISTERS
            .iter()
            .copied()
            .filter(|(r, _)| !skip.contains(r)),
    )
}

fn evaluator() -> SnapshotEvaluator {
    SnapshotEvaluator::new(Registry::builtin().unwrap())
}

fn value(report: &classic_monitor::SnapshotReport, label: &str) -> Value {
    report
        .get(label)
        .and_then(|r| r.value())
        .cloned()
        .unwrap_or_else(|| panic!("{} unavailable", label))
}

#[test]
fn one_result_per_definition_in_registry_order() {
    let evaluator = evaluator();
    let report = evaluator.evaluate(&snapshot(&[]));

    let registry_labels: Vec<&str> = evaluator.registry().labels().collect();
    let report_labels: Vec<&str> = report.data.iter().map(|(l, _)| l).collect();
    assert_eq!(report_labels, registry_labels);
    assert!(report.failures().is_empty(), "{:?}", report.failures());
}

#[test]
fn decodes_a_full_snapshot() {
    let report = evaluator().evaluate(&snapshot(&[]));

    assert_eq!(value(&report, "classic"), Value::Integer(150));
    assert_eq!(value(&report, "firmdate"), Value::from("2019-3-7"));
    assert_eq!(value(&report, "uptimes"), Value::Integer(3600));
    assert_eq!(value(&report, "uptimeh"), Value::Integer(1));
    assert_eq!(value(&report, "uptime"), Value::Decimal(0.04));
    assert_eq!(value(&report, "plifetime"), Value::Decimal(7788.1));
    assert_eq!(value(&report, "cstageword"), Value::from("Bulk"));
    assert_eq!(value(&report, "cstagelin"), Value::Integer(3));
    assert_eq!(value(&report, "stateword"), Value::from("Active"));
    assert_eq!(value(&report, "restingreasonwordshort"), Value::from("Low Light"));
    assert_eq!(value(&report, "tbat"), Value::Integer(25));
    assert_eq!(value(&report, "tcc"), Value::Decimal(31.2));
    assert_eq!(value(&report, "vout"), Value::Decimal(48.0));
    assert_eq!(value(&report, "whizbtemp"), Value::Integer(25));
    assert_eq!(value(&report, "ibat"), Value::Decimal(6.0));
    assert_eq!(value(&report, "iload"), Value::Decimal(4.0));
    assert_eq!(value(&report, "pload"), Value::Decimal(192.0));
    assert_eq!(value(&report, "batstate"), Value::from("Charging"));
    assert_eq!(value(&report, "idisbat"), Value::Decimal(0.0));
    assert_eq!(value(&report, "eff"), Value::Integer(108));
}

#[test]
fn negative_shunt_current_is_discharging() {
    let mut regs: Vec<(u16, u16)> = REGISTERS.to_vec();
    for (reg, value) in regs.iter_mut() {
        if *reg == 4371 {
            // -4.5 A as a 16-bit two's complement pattern
            *value = (-45i16) as u16;
        }
    }
    let snap = RegisterSnapshot::new(Utc::now(), regs);
    let report = evaluator().evaluate(&snap);

    assert_eq!(value(&report, "ibat"), Value::Decimal(-4.5));
    assert_eq!(value(&report, "batstate"), Value::from("Discharging"));
    assert_eq!(value(&report, "idisbat"), Value::Decimal(4.5));
    assert_eq!(value(&report, "iload"), Value::Decimal(14.5));
}

#[test]
fn missing_soc_register_fails_only_soc() {
    let report = evaluator().evaluate(&snapshot(&[4373]));

    assert_eq!(report.len(), Registry::builtin().unwrap().len());
    assert_eq!(
        report.failures(),
        vec![("soc", &EvalError::MissingRegister { register: 4373 })]
    );

    let json: serde_json::Value = serde_json::from_str(&report.to_json(true).unwrap()).unwrap();
    assert_eq!(json["data"]["soc"]["value"], serde_json::Value::Null);
    assert_eq!(json["data"]["soc"]["error"], "MissingRegisterError");
    assert_eq!(json["data"]["battah"]["value"], 200);
}

#[test]
fn missing_shunt_fails_its_dependents() {
    let report = evaluator().evaluate(&snapshot(&[4371]));
    let failed: Vec<&str> = report.failures().into_iter().map(|(l, _)| l).collect();
    assert_eq!(
        failed,
        vec!["ibat", "iabsbat", "ichgbat", "idisbat", "batstate", "iload", "pload"]
    );
    assert_eq!(value(&report, "eff"), Value::Integer(108));
}

#[test]
fn undocumented_resting_reason() {
    let mut regs: Vec<(u16, u16)> = REGISTERS.to_vec();
    regs.retain(|(r, _)| *r != 4275);
    regs.push((4275, 23));
    let report = evaluator().evaluate(&RegisterSnapshot::new(Utc::now(), regs));

    let full = report.get("restingreasonword").unwrap();
    assert_eq!(full.error().map(EvalError::kind), Some("UnknownCodeError"));
    assert_eq!(value(&report, "restingreasonwordshort"), Value::from("Unknown"));
}

#[test]
fn undocumented_stage_and_state() {
    let mut regs: Vec<(u16, u16)> = REGISTERS.to_vec();
    regs.retain(|(r, _)| *r != 4120);
    regs.push((4120, (9 << 8) | 8));
    let report = evaluator().evaluate(&RegisterSnapshot::new(Utc::now(), regs));

    assert_eq!(value(&report, "cstageword"), Value::from("Unknown"));
    assert_eq!(value(&report, "stateword"), Value::from("Unknown"));
    let linear = report.get("cstagelin").unwrap();
    assert_eq!(linear.error().map(EvalError::kind), Some("UnknownCodeError"));
}

#[test]
fn evaluation_is_idempotent() {
    let evaluator = evaluator();
    let snap = snapshot(&[4131]);
    let first = evaluator.evaluate(&snap).to_json(false).unwrap();
    let second = evaluator.evaluate(&snap).to_json(false).unwrap();
    assert_eq!(first, second);
}

#[test]
fn division_by_zero_is_contained() {
    let defs = vec![
        DatapointDefinition::new("a", "A", "", Method::formula("[1] / [2]", None).unwrap()),
        DatapointDefinition::new("b", "B", "", Method::formula("[1] * 2", None).unwrap()),
    ];
    let evaluator = SnapshotEvaluator::new(Arc::new(Registry::new(defs).unwrap()));
    let report = evaluator.evaluate(&RegisterSnapshot::new(Utc::now(), [(1, 5), (2, 0)]));

    assert_eq!(
        report.get("a").unwrap().error(),
        Some(&EvalError::DivisionByZero)
    );
    assert_eq!(value(&report, "b"), Value::Integer(10));
}
