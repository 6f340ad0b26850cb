use std::fmt;

use indexmap::IndexMap;

/// Why a map was skipped. Skips are counted and logged per map; they never
/// abort the batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    UnparsableJson,
    NoSourceMap,
    NoLayout,
    BadDimensions,
    NoBlockData,
    NoAttributes,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::UnparsableJson => "unparsable-json",
            SkipReason::NoSourceMap => "no-source-map",
            SkipReason::NoLayout => "no-layout",
            SkipReason::BadDimensions => "bad-dimensions",
            SkipReason::NoBlockData => "no-block-data",
            SkipReason::NoAttributes => "no-attributes",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-reason skip tally, rendered in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct SkipCounter {
    counts: IndexMap<SkipReason, u64>,
}

impl SkipCounter {
    pub fn record(&mut self, reason: SkipReason) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    pub fn add(&mut self, reason: SkipReason, n: u64) {
        if n > 0 {
            *self.counts.entry(reason).or_insert(0) += n;
        }
    }

    pub fn get(&self, reason: SkipReason) -> u64 {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for SkipCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (reason, count) in &self.counts {
            if *count == 0 {
                continue;
            }
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{reason}={count}")?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct JumpSummary {
    pub updated: u64,
    pub jumps: u64,
    pub skipped: SkipCounter,
}

impl fmt::Display for JumpSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "updated {} maps, {} jumps, skipped {}",
            self.updated,
            self.jumps,
            self.skipped.total()
        )?;
        if !self.skipped.is_empty() {
            write!(f, " ({})", self.skipped)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct PortalSummary {
    pub updated: u64,
    pub warps: u64,
    pub connections: u64,
    pub skipped_warps: u64,
    pub skipped_connections: u64,
    /// Maps rewritten with no source record (events cleared, npcs reset).
    pub without_source: u64,
    pub skipped_maps: SkipCounter,
}

impl fmt::Display for PortalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "updated {} maps, {} warps, {} connections, skipped warps {}, skipped connections {}",
            self.updated, self.warps, self.connections, self.skipped_warps, self.skipped_connections
        )?;
        if self.without_source > 0 {
            write!(f, ", {} maps without source", self.without_source)?;
        }
        if !self.skipped_maps.is_empty() {
            write!(f, ", skipped maps ({})", self.skipped_maps)?;
        }
        Ok(())
    }
}
