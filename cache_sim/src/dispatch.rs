use crate::{
    address::{AddressFields, DecodedAddress},
    associative::AssociativeBank,
    cache::{AllocationError, Bank, Outcome},
    config::{CacheConfiguration, Mapping, Organization},
    direct_mapped::DirectMappedBank,
    statistics::Statistics,
    trace::{AccessKind, MemoryAccessRecord},
};

enum Banks {
    Unified(Box<dyn Bank>),
    Split {
        instruction: Box<dyn Bank>,
        data: Box<dyn Bank>,
    },
}

/// Routes each access to the bank responsible for it.
///
/// The bank variant is fixed at construction, so processing an access never
/// has to look at the mapping again.
pub struct CacheDispatcher {
    config: CacheConfiguration,
    fields: AddressFields,
    banks: Banks,
}

impl CacheDispatcher {
    pub fn new(config: CacheConfiguration) -> Result<Self, AllocationError> {
        let length = config.bank_length() as usize;
        let make = || -> Result<Box<dyn Bank>, AllocationError> {
            let bank: Box<dyn Bank> = match config.mapping() {
                Mapping::DirectMapped => Box::new(DirectMappedBank::new(length)?),
                Mapping::FullyAssociative => Box::new(AssociativeBank::new(length)?),
            };
            Ok(bank)
        };
        let banks = match config.organization() {
            Organization::Unified => Banks::Unified(make()?),
            Organization::Split => Banks::Split {
                instruction: make()?,
                data: make()?,
            },
        };
        log::debug!(
            "allocated {} bank(s) of {length} blocks",
            config.bank_count()
        );
        Ok(Self {
            config,
            fields: config.address_fields(),
            banks,
        })
    }
    pub fn config(&self) -> &CacheConfiguration {
        &self.config
    }
    pub fn decode(&self, address: u32) -> DecodedAddress {
        self.fields.decode(address)
    }
    /// bank serving accesses of `kind`.
    pub fn bank(&self, kind: AccessKind) -> &dyn Bank {
        match &self.banks {
            Banks::Unified(bank) => bank.as_ref(),
            Banks::Split { instruction, data } => match kind {
                AccessKind::Instruction => instruction.as_ref(),
                AccessKind::Data => data.as_ref(),
            },
        }
    }
    fn bank_mut(&mut self, kind: AccessKind) -> &mut dyn Bank {
        match &mut self.banks {
            Banks::Unified(bank) => bank.as_mut(),
            Banks::Split { instruction, data } => match kind {
                AccessKind::Instruction => instruction.as_mut(),
                AccessKind::Data => data.as_mut(),
            },
        }
    }
    /// looks `record` up (installing on miss) and accounts for it in `stats`.
    /// returns the decoded address alongside the outcome.
    pub fn process(
        &mut self,
        record: &MemoryAccessRecord,
        stats: &mut Statistics,
    ) -> (DecodedAddress, Outcome) {
        let decoded = self.decode(record.address);
        let outcome = self.bank_mut(record.kind).lookup_or_install(&decoded);
        stats.record_access(record.kind);
        match outcome {
            Outcome::Hit => stats.record_hit(record.kind),
            Outcome::Miss { evicted: Some(_) } => stats.record_evict(),
            Outcome::Miss { evicted: None } => {}
        }
        log::trace!("{record} ({decoded}): {outcome}");
        (decoded, outcome)
    }
}
