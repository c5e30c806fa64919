//! Clock-domain and reset summaries derived from classified processes.

use crate::facts::{ClockDomain, Process, ResetInfo};

/// One domain entry per clocked process.
pub fn clock_domains(processes: &[Process]) -> Vec<ClockDomain> {
    processes
        .iter()
        .filter_map(|p| {
            let clock = p.clock_signal.as_ref()?;
            Some(ClockDomain {
                clock: clock.clone(),
                edge: p.clock_edge?,
                registers: p.assigned_signals.clone(),
                process: p.label_str().to_string(),
                in_arch: p.in_arch.clone(),
                line: p.line,
            })
        })
        .collect()
}

/// One reset entry per process with a detected reset.
pub fn reset_infos(processes: &[Process]) -> Vec<ResetInfo> {
    processes
        .iter()
        .filter(|p| p.has_reset)
        .filter_map(|p| {
            Some(ResetInfo {
                signal: p.reset_signal.clone()?,
                polarity: p.reset_polarity.unwrap_or_default(),
                is_async: p.reset_async,
                registers: p.assigned_signals.clone(),
                process: p.label_str().to_string(),
                in_arch: p.in_arch.clone(),
                line: p.line,
            })
        })
        .collect()
}
