use std::fmt;

use serde::Serialize;

use crate::trace::AccessKind;

/// Counters for one access kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindStatistics {
    pub accesses: u64,
    pub hits: u64,
}

impl KindStatistics {
    pub fn misses(&self) -> u64 {
        self.accesses - self.hits
    }
}

/// Run-wide hit/miss/eviction counters. Each processed access bumps
/// `accesses` exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub accesses: u64,
    pub hits: u64,
    pub evicts: u64,
    pub instruction: KindStatistics,
    pub data: KindStatistics,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn record_access(&mut self, kind: AccessKind) {
        self.accesses += 1;
        self.kind_mut(kind).accesses += 1;
    }
    pub fn record_hit(&mut self, kind: AccessKind) {
        self.hits += 1;
        self.kind_mut(kind).hits += 1;
    }
    pub fn record_evict(&mut self) {
        self.evicts += 1;
    }
    pub fn misses(&self) -> u64 {
        self.accesses - self.hits
    }
    /// `None` until something has been accessed.
    pub fn hit_rate(&self) -> Option<f64> {
        (self.accesses != 0).then(|| self.hits as f64 / self.accesses as f64)
    }
    pub fn kind(&self, kind: AccessKind) -> &KindStatistics {
        match kind {
            AccessKind::Instruction => &self.instruction,
            AccessKind::Data => &self.data,
        }
    }
    fn kind_mut(&mut self, kind: AccessKind) -> &mut KindStatistics {
        match kind {
            AccessKind::Instruction => &mut self.instruction,
            AccessKind::Data => &mut self.data,
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cache Statistics")?;
        writeln!(f, "-----------------")?;
        writeln!(f)?;
        writeln!(f, "Accesses: {}", self.accesses)?;
        writeln!(f, "Hits:     {}", self.hits)?;
        match self.hit_rate() {
            Some(rate) => writeln!(f, "Hit Rate: {rate:.4}")?,
            None => writeln!(f, "Hit Rate: n/a")?,
        }
        write!(f, "Evicts:   {}", self.evicts)
    }
}

#[cfg(feature = "stat")]
mod stat {
    use super::*;
    use crate::stat::*;

    impl Stat for Statistics {
        fn view(&self, _: usize) -> Box<dyn StatView + '_> {
            Box::new(CacheStatView::new(self))
        }
    }

    pub struct CacheStatView<'a> {
        stat: &'a Statistics,
    }

    impl<'a> CacheStatView<'a> {
        pub fn new(stat: &'a Statistics) -> Self {
            Self { stat }
        }
    }

    impl StatView for CacheStatView<'_> {
        fn header(&self) -> &'static str {
            "cache stat"
        }
        fn width(&self) -> usize {
            33
        }
    }

    impl fmt::Display for CacheStatView<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let total = self.stat.accesses;
            let hit = self.stat.hits;
            let miss = self.stat.misses();
            let evict = self.stat.evicts;
            let hit_pct = percent(hit, total);
            let miss_pct = percent(miss, total);
            writeln!(f, "      hit: {hit:>10} ({hit_pct:>8}%)")?;
            writeln!(f, "     miss: {miss:>10} ({miss_pct:>8}%)")?;
            writeln!(f, "    evict: {evict:>10}")?;
            for (name, k) in [
                ("instr", &self.stat.instruction),
                ("data", &self.stat.data),
            ] {
                let pct = percent(k.hits, k.accesses);
                write!(f, "\n  {name:>7}: {:>10} / {:>10} ({pct:>8}%)", k.hits, k.accesses)?;
            }
            Ok(())
        }
    }
}
