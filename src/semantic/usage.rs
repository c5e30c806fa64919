//! Signal usages: one entry per read or write site.

use crate::facts::{ActualKind, AssociationKind, FileFacts, SignalUsage};

/// Usages from process reads and writes, concurrent assignments, and
/// port-map actuals (base names; `open` and literals are skipped).
pub fn signal_usages(facts: &FileFacts) -> Vec<SignalUsage> {
    let mut usages = Vec::new();

    for p in &facts.processes {
        let usage = |signal: &String, written: bool| SignalUsage {
            signal: signal.clone(),
            is_read: !written,
            is_written: written,
            in_process: p.label_str().to_string(),
            in_arch: p.in_arch.clone(),
            line: p.line,
            ..SignalUsage::default()
        };
        usages.extend(p.assigned_signals.iter().map(|s| usage(s, true)));
        usages.extend(p.read_signals.iter().map(|s| usage(s, false)));
    }

    for ca in &facts.concurrent_assignments {
        if !ca.target_full.is_empty() {
            usages.push(SignalUsage {
                signal: ca.target_full.clone(),
                is_written: true,
                in_arch: ca.in_arch.clone(),
                line: ca.line,
                ..SignalUsage::default()
            });
        }
        usages.extend(ca.read_signals.iter().map(|s| SignalUsage {
            signal: s.clone(),
            is_read: true,
            in_arch: ca.in_arch.clone(),
            line: ca.line,
            ..SignalUsage::default()
        }));
    }

    for inst in &facts.instances {
        for assoc in &inst.associations {
            if assoc.kind != AssociationKind::Port
                || assoc.actual_kind != ActualKind::Name
                || assoc.actual_base.is_empty()
            {
                continue;
            }
            usages.push(SignalUsage {
                signal: assoc.actual_base.clone(),
                in_port_map: true,
                instance_name: inst.name.clone(),
                in_arch: inst.in_arch.clone(),
                line: assoc.line,
                ..SignalUsage::default()
            });
        }
    }

    usages
}
