//! Integration tests for fact extraction.
//!
//! These tests run the full pipeline (registry, tree reader, traversal and
//! file-level analyses) against the `.sexp` fixtures in testdata/vhdl.

use std::path::PathBuf;

use vhdl_facts::facts::{
    ActualKind, ClockEdge, ConcurrentKind, DependencyKind, Direction, FileFacts, GenerateScheme,
    ResetPolarity,
};
use vhdl_facts::semantic::elaborate::{elaborate_generate, ConstantMap};
use vhdl_facts::semantic::width::estimate_width;
use vhdl_facts::{parser, Config, Extractor, Tables};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join("vhdl")
        .join(name)
}

fn extract(name: &str) -> FileFacts {
    parser::init();
    Extractor::new()
        .extract_file(&fixture(name))
        .expect("fixture should extract")
}

// =============================================================================
// Processes, clocks and resets
// =============================================================================

#[test]
fn test_async_reset_register() {
    let facts = extract("reset_reg.sexp");

    let p = facts.process("p_reg").expect("p_reg should exist");
    assert!(p.is_sequential);
    assert!(!p.is_combinational && !p.has_wait);
    assert!(p.has_reset && p.reset_async);
    assert_eq!(p.reset_signal.as_deref(), Some("rst"));
    assert_eq!(p.reset_polarity, Some(ResetPolarity::ActiveHigh));
    assert_eq!(p.clock_signal.as_deref(), Some("clk"));
    assert_eq!(p.clock_edge, Some(ClockEdge::Rising));
    assert_eq!(p.assigned_signals, vec!["q_i"]);

    assert_eq!(facts.clock_domains.len(), 1);
    assert_eq!(facts.clock_domains[0].registers, vec!["q_i"]);
    assert_eq!(facts.reset_infos.len(), 1);
    assert!(facts.reset_infos[0].is_async);
}

#[test]
fn test_entity_interface_and_widths() {
    let facts = extract("reset_reg.sexp");

    let entity = facts.entity("reset_reg").expect("entity should exist");
    let names: Vec<_> = entity.ports.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["clk", "rst", "d", "q"]);
    assert_eq!(entity.ports[3].direction, Direction::Out);
    assert_eq!(entity.ports[2].width, 8);
    assert_eq!(entity.ports[0].width, 1);

    assert_eq!(facts.generics.len(), 1);
    assert_eq!(facts.generics[0].direction, Direction::None);
    assert_eq!(facts.generics[0].default.as_deref(), Some("8"));

    // Bounds that name a constant are not folded.
    assert_eq!(facts.signal("q_i").map(|s| s.width), Some(0));
}

#[test]
fn test_clause_dependencies() {
    let facts = extract("reset_reg.sexp");
    let targets: Vec<_> = facts
        .dependencies
        .iter()
        .map(|d| (d.kind, d.target.as_str()))
        .collect();
    assert_eq!(
        targets,
        vec![
            (DependencyKind::Library, "ieee"),
            (DependencyKind::Use, "ieee.std_logic_1164.all"),
        ]
    );
    assert!(facts.dependencies.iter().all(|d| d.source == "reset_reg"));
}

// =============================================================================
// Clock-domain crossings
// =============================================================================

#[test]
fn test_synchronized_crossing() {
    let facts = extract("cdc_sync.sexp");

    let reg = facts
        .cdc_crossings
        .iter()
        .find(|c| c.signal == "reg")
        .expect("reg should cross domains");
    assert_eq!(reg.source_clock, "clk_a");
    assert_eq!(reg.dest_clock, "clk_b");
    assert_eq!(reg.source_process, "p_src");
    assert_eq!(reg.dest_process, "p_meta");
    assert!(reg.is_synchronized);
    assert!(reg.sync_stages >= 1);
    assert!(!reg.is_multi_bit);
}

#[test]
fn test_unsynchronized_bus_crossing() {
    let facts = extract("cdc_sync.sexp");

    let bus = facts
        .cdc_crossings
        .iter()
        .find(|c| c.signal == "bus_a")
        .expect("bus_a should cross domains");
    assert!(!bus.is_synchronized);
    assert_eq!(bus.sync_stages, 0);
    assert!(bus.is_multi_bit);

    // Same-domain reads are not crossings.
    assert!(facts.cdc_crossings.iter().all(|c| c.signal != "meta"));
    assert_eq!(facts.cdc_crossings.len(), 2);
}

#[test]
fn test_cdc_can_be_disabled() {
    parser::init();
    let config = Config {
        detect_cdc: false,
        ..Config::default()
    };
    let facts = Extractor::with_config(config)
        .extract_file(&fixture("cdc_sync.sexp"))
        .unwrap();
    assert!(facts.cdc_crossings.is_empty());
    assert_eq!(facts.clock_domains.len(), 4);
}

// =============================================================================
// Generates
// =============================================================================

#[test]
fn test_for_generate_elaboration() {
    let facts = extract("generate.sexp");

    let gen = facts.generate("gen_bits").expect("gen_bits should exist");
    match &gen.scheme {
        GenerateScheme::For {
            loop_var,
            range_low,
            range_high,
            range_dir,
        } => {
            assert_eq!(loop_var, "i");
            assert_eq!(range_low, "0");
            assert_eq!(range_high, "7");
            assert_eq!(range_dir, "to");
        }
        other => panic!("expected for-generate, got {:?}", other),
    }
    assert!(gen.can_elaborate);
    assert_eq!(gen.iteration_count, 8);

    // Re-elaborating without constants gives the same answer.
    let mut copy = gen.clone();
    copy.can_elaborate = false;
    copy.iteration_count = -1;
    assert!(elaborate_generate(&mut copy, &ConstantMap::new()));
    assert_eq!(copy.iteration_count, 8);
}

#[test]
fn test_generate_bounds_use_constants() {
    let facts = extract("generate.sexp");

    let gen = facts.generate("gen_lanes").expect("gen_lanes should exist");
    assert!(gen.can_elaborate);
    assert_eq!(gen.iteration_count, 4);
    assert_eq!(gen.signals[0].scope, "rtl.gen_lanes");
    assert!(facts.signals.iter().any(|s| s.scope == "rtl.gen_lanes"));

    let opt = facts.generate("gen_opt").expect("gen_opt should exist");
    assert!(matches!(opt.scheme, GenerateScheme::If { .. }));
    assert!(!opt.can_elaborate);
    assert_eq!(opt.iteration_count, -1);
}

#[test]
fn test_generate_assignments_are_flattened() {
    let facts = extract("generate.sexp");
    let in_gen: Vec<_> = facts
        .concurrent_assignments
        .iter()
        .filter(|a| a.in_generate)
        .collect();
    assert_eq!(in_gen.len(), 3);
    assert!(in_gen
        .iter()
        .any(|a| a.generate_label.as_deref() == Some("gen_bits")));
    // Loop parameters are never signal reads.
    assert!(in_gen
        .iter()
        .all(|a| !a.read_signals.iter().any(|s| s == "i" || s == "j")));
}

// =============================================================================
// Case statements and concurrent assignments
// =============================================================================

#[test]
fn test_case_without_others() {
    let facts = extract("fsm.sexp");

    let case = &facts.case_statements[0];
    assert_eq!(case.expression, "state");
    assert!(!case.has_others);
    assert!(!case.is_complete);
    assert_eq!(case.in_process, "p_out");

    let p = facts.process("p_out").unwrap();
    assert!(p.is_combinational);
    assert_eq!(facts.enum_literals, vec!["IDLE", "RUN", "DONE"]);
}

#[test]
fn test_concurrent_assignment_kinds() {
    let facts = extract("fsm.sexp");

    let y = facts
        .concurrent_assignments
        .iter()
        .find(|a| a.target == "y")
        .unwrap();
    assert_eq!(y.kind, ConcurrentKind::Conditional);
    for s in ["a", "sel", "b"] {
        assert!(y.read_signals.iter().any(|r| r == s), "missing read {}", s);
    }

    let z = facts
        .concurrent_assignments
        .iter()
        .find(|a| a.target == "z")
        .unwrap();
    assert_eq!(z.kind, ConcurrentKind::Selected);
}

// =============================================================================
// Instances
// =============================================================================

#[test]
fn test_component_and_entity_instances() {
    let facts = extract("top.sexp");

    let fifo = facts.instance("u_fifo").unwrap();
    assert!(!fifo.is_entity);
    assert_eq!(fifo.target, "fifo");
    assert_eq!(fifo.port_map.get("din").map(String::as_str), Some("data"));

    let reg = facts.instance("u_reg").unwrap();
    assert!(reg.is_entity);
    assert_eq!(reg.target, "work.reset_reg");
    assert!(reg.associations.iter().all(|a| a.is_positional));
    assert_eq!(reg.associations[1].actual_kind, ActualKind::Open);

    let port_usages: Vec<_> = facts
        .signal_usages
        .iter()
        .filter(|u| u.in_port_map)
        .map(|u| (u.instance_name.as_str(), u.signal.as_str()))
        .collect();
    assert_eq!(
        port_usages,
        vec![("u_fifo", "clk"), ("u_fifo", "data"), ("u_reg", "clk")]
    );

    assert!(facts
        .dependencies
        .iter()
        .any(|d| d.kind == DependencyKind::Instance && d.target == "work.reset_reg"));
    assert!(facts.dependencies.iter().all(|d| d.source == "top"));
}

// =============================================================================
// Whole-pipeline properties
// =============================================================================

#[test]
fn test_width_estimation() {
    assert_eq!(estimate_width("std_logic_vector(7 downto 0)"), 8);
    assert_eq!(estimate_width("std_logic_vector(WIDTH-1 downto 0)"), 0);
    assert_eq!(estimate_width("std_logic"), 1);
}

#[test]
fn test_extraction_is_idempotent() {
    for name in ["reset_reg.sexp", "cdc_sync.sexp", "generate.sexp", "fsm.sexp", "top.sexp"] {
        let first = extract(name);
        let second = extract(name);
        assert_eq!(first, second, "{} changed between runs", name);
    }
}

#[test]
fn test_batch_results_are_sorted() {
    parser::init();
    let paths = vec![
        fixture("top.sexp"),
        fixture("fsm.sexp"),
        fixture("missing.sexp"),
        fixture("cdc_sync.sexp"),
    ];
    let results = Extractor::new().extract_files(&paths);
    let ordered: Vec<_> = results.iter().map(|r| r.path.clone()).collect();
    let mut expected = paths.clone();
    expected.sort();
    assert_eq!(ordered, expected);

    let failed: Vec<_> = results.iter().filter(|r| r.result.is_err()).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].path.ends_with("missing.sexp"));

    let facts: Vec<FileFacts> = results.into_iter().filter_map(|r| r.result.ok()).collect();
    let tables = Tables::from_facts(&facts);
    assert_eq!(tables.files.len(), 3);
    assert!(tables.instances.iter().any(|i| i.name == "u_fifo"));
    assert!(tables.processes.iter().any(|p| p.label == "p_out"));
}
