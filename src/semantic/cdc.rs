//! Clock-domain-crossing detection.
//!
//! A crossing is a signal written by a clocked process on one clock and
//! read by a clocked process on another. Synchronizer chains are found by
//! looking for single-source register stages: a clocked process that
//! writes exactly one signal from exactly one read (clock and reset
//! excluded). Walking such stages backward on the same clock gives the
//! chain length for the signal at its head, on that clock. A crossing only
//! counts stages clocked by its reader.

use std::collections::HashMap;

use crate::facts::{CdcCrossing, FileFacts, Process};

use super::width::{estimate_width, is_vector_type};

/// Longest chain followed; guards against cycles.
const MAX_SYNC_DEPTH: u32 = 8;

struct Writer<'a> {
    process: &'a Process,
    clock: &'a str,
}

/// One single-source register stage.
struct Stage {
    source: String,
    clock: String,
}

fn clock_of(p: &Process) -> Option<&str> {
    if !p.is_sequential {
        return None;
    }
    p.clock_signal.as_deref().filter(|c| !c.is_empty())
}

fn stage_of(p: &Process) -> Option<(String, Stage)> {
    let clock = clock_of(p)?;
    if p.assigned_signals.len() != 1 {
        return None;
    }
    let is_control = |s: &String| {
        s.eq_ignore_ascii_case(clock)
            || p.reset_signal
                .as_deref()
                .is_some_and(|r| s.eq_ignore_ascii_case(r))
    };
    let reads: Vec<_> = p.read_signals.iter().filter(|s| !is_control(s)).collect();
    if reads.len() != 1 {
        return None;
    }
    Some((
        p.assigned_signals[0].to_ascii_lowercase(),
        Stage {
            source: reads[0].to_ascii_lowercase(),
            clock: clock.to_ascii_lowercase(),
        },
    ))
}

/// `(signal, clock)` (both lowercase) to the number of synchronizer stages
/// on that clock behind the signal. Signals with no stage have no entry.
pub fn synchronizer_stages(processes: &[Process]) -> HashMap<(String, String), u32> {
    let stages: HashMap<String, Stage> = processes.iter().filter_map(stage_of).collect();
    let mut result: HashMap<(String, String), u32> = HashMap::new();

    for (output, first) in &stages {
        let mut depth = 1;
        let mut head = first.source.clone();
        // Follow upstream stages on the same clock.
        while depth < MAX_SYNC_DEPTH {
            match stages.get(&head) {
                Some(prev) if prev.clock == first.clock && head != *output => {
                    head = prev.source.clone();
                    depth += 1;
                }
                _ => break,
            }
        }
        let entry = result.entry((head, first.clock.clone())).or_insert(0);
        *entry = (*entry).max(depth);
    }
    result
}

/// Whether the signal's declared type is wider than one bit, or a vector
/// of unknown width.
fn is_multi_bit(facts: &FileFacts, signal: &str) -> bool {
    let base = signal.split('.').next().unwrap_or(signal);
    match facts.declared_type(base) {
        Some(ty) => {
            let width = estimate_width(ty);
            width > 1 || (width == 0 && is_vector_type(ty))
        }
        None => false,
    }
}

/// Detect crossings between clocked processes of one file.
pub fn detect_crossings(facts: &FileFacts) -> Vec<CdcCrossing> {
    let mut writers: HashMap<String, Vec<Writer<'_>>> = HashMap::new();
    for p in &facts.processes {
        let Some(clock) = clock_of(p) else { continue };
        for signal in &p.assigned_signals {
            writers
                .entry(signal.to_ascii_lowercase())
                .or_default()
                .push(Writer { process: p, clock });
        }
    }

    let sync = synchronizer_stages(&facts.processes);
    let mut crossings = Vec::new();

    for reader in &facts.processes {
        let Some(dest_clock) = clock_of(reader) else {
            continue;
        };
        let dest_key = dest_clock.to_ascii_lowercase();
        for signal in &reader.read_signals {
            let key = signal.to_ascii_lowercase();
            let Some(sources) = writers.get(&key) else {
                continue;
            };
            for w in sources {
                if w.clock.eq_ignore_ascii_case(dest_clock) {
                    continue;
                }
                let stages = sync
                    .get(&(key.clone(), dest_key.clone()))
                    .copied()
                    .unwrap_or(0);
                crossings.push(CdcCrossing {
                    signal: signal.clone(),
                    source_clock: w.clock.to_string(),
                    source_process: w.process.label_str().to_string(),
                    dest_clock: dest_clock.to_string(),
                    dest_process: reader.label_str().to_string(),
                    is_synchronized: stages > 0,
                    sync_stages: stages,
                    is_multi_bit: is_multi_bit(facts, signal),
                    in_arch: reader.in_arch.clone(),
                    line: reader.line,
                });
            }
        }
    }
    crossings
}
