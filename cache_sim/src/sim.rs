use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

use crate::{
    address::DecodedAddress,
    cache::{AllocationError, Outcome},
    config::{CacheConfiguration, ConfigError, Mapping, Organization},
    dispatch::CacheDispatcher,
    io::TraceSource,
    statistics::Statistics,
    trace::{MemoryAccessRecord, TraceError},
};

#[cfg(feature = "stat")]
use crate::stat::{AddStats, Stats};

#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Trace(#[from] TraceError),
}

/// What happened to one access, for per-line tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEvent {
    pub record: MemoryAccessRecord,
    pub decoded: DecodedAddress,
    pub outcome: Outcome,
}

/// Replays a trace against one cache and owns its statistics.
pub struct Simulator {
    cache: CacheDispatcher,
    statistics: Statistics,
    #[cfg(feature = "stat")]
    stat_builder: stat::SimStatBuilder,
}

impl Simulator {
    pub fn new(config: CacheConfiguration) -> Result<Self, SimError> {
        log::info!("cache: {config}");
        log::info!(
            "{} bank(s) of {} blocks, address bits: {}",
            config.bank_count(),
            config.bank_length(),
            config.address_fields()
        );
        Ok(Self {
            cache: CacheDispatcher::new(config)?,
            statistics: Statistics::new(),
            #[cfg(feature = "stat")]
            stat_builder: stat::SimStatBuilder::new(),
        })
    }
    /// validates the geometry and builds the simulator in one go.
    pub fn with_geometry(
        size: u32,
        mapping: Mapping,
        organization: Organization,
    ) -> Result<Self, SimError> {
        Self::new(CacheConfiguration::new(size, mapping, organization)?)
    }
    pub fn access(&mut self, record: MemoryAccessRecord) -> TraceEvent {
        let (decoded, outcome) = self.cache.process(&record, &mut self.statistics);
        TraceEvent {
            record,
            decoded,
            outcome,
        }
    }
    /// processes the next record of `source`. `None` once it is exhausted.
    pub fn step<S: TraceSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<TraceEvent>, SimError> {
        Ok(source.next_access()?.map(|record| self.access(record)))
    }
    /// drains `source`, handing every event to `on_event`.
    pub fn run<S, F>(&mut self, source: &mut S, mut on_event: F) -> Result<&Statistics, SimError>
    where
        S: TraceSource + ?Sized,
        F: FnMut(&TraceEvent),
    {
        while let Some(event) = self.step(source)? {
            on_event(&event);
        }
        #[cfg(feature = "stat")]
        self.exit_sim();
        log::info!("processed {} accesses", self.statistics.accesses);
        Ok(&self.statistics)
    }
    #[cfg(feature = "stat")]
    fn exit_sim(&mut self) {
        self.stat_builder.accesses(self.statistics.accesses);
        self.stat_builder.stop_timer();
    }
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }
    pub fn config(&self) -> &CacheConfiguration {
        self.cache.config()
    }
    pub fn cache(&self) -> &CacheDispatcher {
        &self.cache
    }
    /// writes configuration and statistics as pretty JSON.
    pub fn write_report<W: Write>(&self, writer: W) -> Result<()> {
        let report = Report {
            config: self.config(),
            statistics: &self.statistics,
            hit_rate: self.statistics.hit_rate(),
        };
        serde_json::to_writer_pretty(writer, &report)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct Report<'a> {
    config: &'a CacheConfiguration,
    statistics: &'a Statistics,
    hit_rate: Option<f64>,
}

#[cfg(feature = "stat")]
impl Simulator {
    pub fn collect_stat(&self) -> Stats {
        let mut ss = Stats::default();
        self.add_stats(&mut ss);
        ss
    }
}

#[cfg(feature = "stat")]
impl AddStats for Simulator {
    fn add_stats(&self, buf: &mut Stats) {
        buf.push(Box::new(self.stat_builder.finish()));
        buf.push(Box::new(*self.config()));
        buf.push(Box::new(self.statistics));
    }
}

#[cfg(feature = "stat")]
mod stat {
    use crate::stat::*;

    use std::{fmt, time};

    pub struct SimStatBuilder {
        begin: time::Instant,
        accesses: Option<u64>,
        elapsed: Option<time::Duration>,
    }

    impl SimStatBuilder {
        pub fn new() -> Self {
            Self {
                begin: time::Instant::now(),
                accesses: None,
                elapsed: None,
            }
        }
        pub fn accesses(&mut self, accesses: u64) {
            self.accesses = Some(accesses)
        }
        pub fn stop_timer(&mut self) {
            self.elapsed = Some(time::Instant::now() - self.begin)
        }
        pub fn finish(&self) -> SimStat {
            SimStat {
                accesses: self.accesses.unwrap_or(0),
                elapsed: self.elapsed.unwrap_or_else(|| self.begin.elapsed()),
            }
        }
    }

    impl Default for SimStatBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    pub struct SimStat {
        accesses: u64,
        elapsed: time::Duration,
    }

    impl Stat for SimStat {
        fn view(&self, _: usize) -> Box<dyn StatView + '_> {
            Box::new(self)
        }
    }

    impl StatView for &'_ SimStat {
        fn header(&self) -> &'static str {
            "simulator stat"
        }
        fn width(&self) -> usize {
            33
        }
    }

    impl fmt::Display for &'_ SimStat {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let ms = format!("{} ms", self.elapsed.as_millis());
            writeln!(f, "  elapsed total: {ms:>9}")?;
            let accesses = format!("#{}", self.accesses);
            write!(f, "  accesses total: {accesses:>8}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        io::{EmptyTrace, RecordTrace},
        trace::{AccessKind, TraceReader},
    };

    #[test]
    fn test_run_dm_uc() {
        let mut sim = Simulator::with_geometry(128, Mapping::DirectMapped, Organization::Unified)
            .unwrap();
        let mut trace: RecordTrace = [0x8cda3fa8, 0x8158bf94, 0x8cd94c50, 0x8cd94d64, 0x8cd94c54]
            .into_iter()
            .map(|a| MemoryAccessRecord::new(AccessKind::Data, a))
            .collect();
        let mut outcomes = Vec::new();
        let stats = sim.run(&mut trace, |e| outcomes.push(e.outcome)).unwrap();
        assert_eq!((5, 0, 3), (stats.accesses, stats.hits, stats.evicts));
        assert_eq!(5, outcomes.len());
        assert!(outcomes.iter().all(|o| !o.is_hit()));
    }
    #[test]
    fn test_step_events() {
        let mut sim =
            Simulator::with_geometry(4096, Mapping::DirectMapped, Organization::Unified).unwrap();
        let mut trace = TraceReader::new("D 8cda3fa8\nD 8cda3fa0\n".as_bytes());
        let first = sim.step(&mut trace).unwrap().unwrap();
        assert_eq!(0x3e, first.decoded.index);
        assert_eq!(0x8cda3, first.decoded.tag);
        assert_eq!(Outcome::Miss { evicted: None }, first.outcome);
        let second = sim.step(&mut trace).unwrap().unwrap();
        assert_eq!(0x20, second.decoded.offset);
        assert!(second.outcome.is_hit());
        assert!(sim.step(&mut trace).unwrap().is_none());
        assert_eq!(2, sim.statistics().accesses);
    }
    #[test]
    fn test_zero_address_mid_trace() {
        let mut sim =
            Simulator::with_geometry(256, Mapping::FullyAssociative, Organization::Split)
                .unwrap();
        let mut trace = TraceReader::new("I 0\nD 0\nI 400\nI 0\nD 1\n".as_bytes());
        let stats = *sim.run(&mut trace, |_| {}).unwrap();
        assert_eq!(5, stats.accesses);
        assert_eq!(2, stats.hits);
        assert_eq!(3, stats.instruction.accesses);
        assert_eq!(1, stats.instruction.hits);
        assert_eq!(1, stats.data.hits);
    }
    #[test]
    fn test_malformed_trace_stops_run() {
        let mut sim =
            Simulator::with_geometry(128, Mapping::DirectMapped, Organization::Unified).unwrap();
        let mut trace = TraceReader::new("I 0\nW 40\nI 80\n".as_bytes());
        let r = sim.run(&mut trace, |_| {});
        assert!(matches!(
            r,
            Err(SimError::Trace(TraceError::Malformed { line: 2, .. }))
        ));
        assert_eq!(1, sim.statistics().accesses);
    }
    #[test]
    fn test_rejects_configuration() {
        assert!(matches!(
            Simulator::with_geometry(100, Mapping::DirectMapped, Organization::Unified),
            Err(SimError::Config(ConfigError::TooSmall(100)))
        ));
    }
    #[test]
    fn test_empty_trace() {
        let mut sim =
            Simulator::with_geometry(128, Mapping::FullyAssociative, Organization::Unified)
                .unwrap();
        let stats = sim.run(&mut EmptyTrace::new(), |_| {}).unwrap();
        assert_eq!(0, stats.accesses);
        assert_eq!(None, stats.hit_rate());
    }
    #[test]
    fn test_independent_simulators() {
        let mut a =
            Simulator::with_geometry(128, Mapping::DirectMapped, Organization::Unified).unwrap();
        let mut b =
            Simulator::with_geometry(128, Mapping::DirectMapped, Organization::Unified).unwrap();
        a.access(MemoryAccessRecord::new(AccessKind::Data, 0));
        a.access(MemoryAccessRecord::new(AccessKind::Data, 0));
        b.access(MemoryAccessRecord::new(AccessKind::Data, 0));
        assert_eq!(1, a.statistics().hits);
        assert_eq!(0, b.statistics().hits);
    }
    #[test]
    fn test_write_report() {
        let mut sim =
            Simulator::with_geometry(512, Mapping::DirectMapped, Organization::Split).unwrap();
        sim.access(MemoryAccessRecord::new(AccessKind::Instruction, 0x40));
        sim.access(MemoryAccessRecord::new(AccessKind::Instruction, 0x44));
        let mut buf = Vec::new();
        sim.write_report(&mut buf).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(512, v["config"]["total_size_bytes"]);
        assert_eq!("direct_mapped", v["config"]["mapping"]);
        assert_eq!("split", v["config"]["organization"]);
        assert_eq!(2, v["config"]["fields"]["index_bits"]);
        assert_eq!(2, v["statistics"]["accesses"]);
        assert_eq!(0.5, v["hit_rate"]);
    }
    #[cfg(feature = "stat")]
    #[test]
    fn test_collect_stat() {
        let mut sim =
            Simulator::with_geometry(128, Mapping::DirectMapped, Organization::Unified).unwrap();
        sim.run(&mut EmptyTrace::new(), |_| {}).unwrap();
        let ss = sim.collect_stat();
        assert_eq!(3, ss.len());
        let out = ss.view(80).to_string();
        assert!(out.contains("simulator stat:"));
        assert!(out.contains("cache geometry:"));
        assert!(out.contains("cache stat:"));
    }
}
