//! Lookup statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{LookupOutcome, LookupStats};
use crate::models::Source;

/// Logs a per-source breakdown of lookup outcomes.
pub fn print_lookup_statistics(stats: &LookupStats) {
    info!(
        "Lookup statistics: {} batch(es), {} domain(s), {} failed lookup(s)",
        stats.batches(),
        stats.domains(),
        stats.total_failures()
    );
    for source in Source::iter() {
        let total = stats.total_for(source);
        if total == 0 {
            continue;
        }
        let breakdown: Vec<String> = LookupOutcome::iter()
            .map(|outcome| (outcome, stats.get(source, outcome)))
            .filter(|(_, count)| *count > 0)
            .map(|(outcome, count)| format!("{outcome}={count}"))
            .collect();
        info!("   {source}: {total} ({})", breakdown.join(", "));
    }
}
