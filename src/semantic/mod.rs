//! Post-traversal analyzers.
//!
//! These run over one file's accumulated facts after the walk:
//!
//! - `clocks`: clock-domain and reset summaries
//! - `usage`: per-site signal usages
//! - `elaborate`: `for`-generate iteration counts
//! - `cdc`: clock-domain crossings and synchronizer chains
//! - `width`: type-text bit widths (also used during the walk)

pub mod cdc;
pub mod clocks;
pub mod elaborate;
pub mod usage;
pub mod width;

use log::debug;

use crate::config::Config;
use crate::facts::FileFacts;

/// Fill the derived lists of `facts`.
pub fn analyze(facts: &mut FileFacts, config: &Config) {
    facts.clock_domains = clocks::clock_domains(&facts.processes);
    facts.reset_infos = clocks::reset_infos(&facts.processes);
    facts.signal_usages = usage::signal_usages(facts);

    if config.elaborate_generates && !facts.generates.is_empty() {
        let constants = elaborate::build_constant_map(&facts.constants, &facts.generics);
        let count = elaborate::elaborate_all(&mut facts.generates, &constants);
        debug!(
            "{}: elaborated {} generates with {} constants",
            facts.file,
            count,
            constants.len()
        );
    }

    if config.detect_cdc {
        facts.cdc_crossings = cdc::detect_crossings(facts);
        if !facts.cdc_crossings.is_empty() {
            debug!(
                "{}: {} clock-domain crossings",
                facts.file,
                facts.cdc_crossings.len()
            );
        }
    }
}
