//! Normalizing whole compilation units

mod common;

use common::*;
use kiln_ir::*;
use kiln_normalize::{
    normalize_initializer, normalize_unit, start_phase, DiagnosticBag, InitPhase,
    NormalizeConfig, ReportEntry, UnitReport,
};

fn entry(index: usize, signature: &str) -> ReportEntry {
    ReportEntry {
        index,
        signature: signature.to_string(),
    }
}

fn two_initializers() -> CompilationUnit {
    let ty = record("R", vec![int_field("b"), int_field("a")]);
    let good = init_method("R", vec![assign("R", "a", lit(1))]);
    let bad = InitMethod::new(
        "R",
        "initFrom",
        Block::new(vec![assign("R", "b", field("R", "a"))]),
    );

    CompilationUnit {
        types: vec![ty],
        initializers: vec![good, bad],
        ..CompilationUnit::default()
    }
}

#[test]
fn test_report_lists_each_initializer() {
    let mut unit = two_initializers();
    let untouched = unit.initializers[1].clone();
    let mut bag = DiagnosticBag::new();

    let report = normalize_unit(&mut unit, &NormalizeConfig::default(), &mut bag).unwrap();

    assert_eq!(
        report,
        UnitReport {
            normalized: vec![entry(0, "R.init()")],
            aborted: vec![entry(1, "R.initFrom()")],
        }
    );
    assert_eq!(bag.len(), 1);
    assert_eq!(unit.initializers[1], untouched);
    assert!(unit.initializers[0]
        .body
        .pretty_print()
        .ends_with("set_member(this, \"a\", tmp2);\nthis.complete();\n"));
}

#[test]
fn test_report_serializes() {
    let mut unit = two_initializers();
    let mut bag = DiagnosticBag::new();

    let report = normalize_unit(&mut unit, &NormalizeConfig::default(), &mut bag).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["normalized"][0]["index"], 0);
    assert_eq!(json["normalized"][0]["signature"], "R.init()");
    assert_eq!(json["aborted"][0]["signature"], "R.initFrom()");
}

#[test]
fn test_overloads_are_reported_by_position() {
    let ty = record("R", vec![int_field("a"), int_field("b")]);
    let good = init_method("R", vec![assign("R", "a", lit(1))]);
    let mut bad = init_method("R", vec![assign("R", "a", field("R", "b"))]);
    bad.params.push(Param {
        name: "other".to_string(),
        ty: ValueType::record("R"),
        generic: false,
    });
    let mut unit = CompilationUnit {
        types: vec![ty],
        initializers: vec![good, bad],
        ..CompilationUnit::default()
    };
    let mut bag = DiagnosticBag::new();

    let report = normalize_unit(&mut unit, &NormalizeConfig::default(), &mut bag).unwrap();

    assert_eq!(report.normalized, vec![entry(0, "R.init()")]);
    assert_eq!(report.aborted, vec![entry(1, "R.init(other: R)")]);
    assert!(report.is_normalized(0));
    assert!(!report.is_normalized(1));
}

#[test]
fn test_exhausted_variable_ids_are_internal() {
    let ty = record("R", vec![int_field("a")]);
    let local = VarSymbol {
        id: u32::MAX,
        name: "x".to_string(),
        ty: ValueType::Unknown,
        flags: VarFlags::default(),
    };
    let mut method = init_method("R", vec![Stmt::def(local, sp())]);
    let original = method.clone();
    let mut bag = DiagnosticBag::new();

    let err = normalize_initializer(&ty, &mut method, &NormalizeConfig::default(), &mut bag)
        .unwrap_err();

    assert!(err.to_string().contains("variable ids exhausted"));
    assert_eq!(method, original);
}

#[test]
fn test_unknown_owner_is_internal() {
    let mut unit = CompilationUnit {
        initializers: vec![init_method("Missing", vec![])],
        ..CompilationUnit::default()
    };
    let mut bag = DiagnosticBag::new();

    let err = normalize_unit(&mut unit, &NormalizeConfig::default(), &mut bag).unwrap_err();

    assert!(err.to_string().contains("unknown owner type 'Missing'"));
    assert!(bag.is_empty());
}

#[test]
fn test_start_phase() {
    let config = NormalizeConfig::default();

    let implicit = init_method("R", vec![assign("R", "a", lit(1))]);
    assert_eq!(start_phase(&implicit, &config), InitPhase::Phase1);

    let delegating = init_method("R", vec![this_init(vec![])]);
    assert_eq!(start_phase(&delegating, &config), InitPhase::Phase0);

    let chaining = init_method("R", vec![super_init(vec![])]);
    assert_eq!(start_phase(&chaining, &config), InitPhase::Phase1);

    let nested = init_method(
        "R",
        vec![if_else("c", vec![this_init(vec![])], Some(vec![complete()]))],
    );
    assert_eq!(start_phase(&nested, &config), InitPhase::Phase0);
}
