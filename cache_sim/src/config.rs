use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

use crate::{
    address::{self, AddressFields},
    bin::is_power_of_two,
};

/// bytes per cache block. fixed for every configuration.
pub const BLOCK_SIZE: u32 = 64;
pub const MIN_CACHE_SIZE: u32 = 128;
pub const MAX_CACHE_SIZE: u32 = 4096;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cache size {0} is too small, minimum of 128 bytes")]
    TooSmall(u32),
    #[error("cache size {0} is too large, maximum of 4096 bytes")]
    TooLarge(u32),
    #[error("invalid cache size {0}, it must be a power of 2")]
    NotPowerOfTwo(u32),
    #[error("unknown cache mapping `{0}`, expected `dm` or `fa`")]
    UnknownMapping(String),
    #[error("unknown cache organization `{0}`, expected `uc` or `sc`")]
    UnknownOrganization(String),
    #[error("{bank_length} blocks per bank cannot be addressed with 32 bits")]
    Geometry { bank_length: u32 },
}

/// where a block may be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mapping {
    DirectMapped,
    FullyAssociative,
}

impl FromStr for Mapping {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dm" => Ok(Mapping::DirectMapped),
            "fa" => Ok(Mapping::FullyAssociative),
            _ => Err(ConfigError::UnknownMapping(s.to_owned())),
        }
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mapping::DirectMapped => write!(f, "direct mapped"),
            Mapping::FullyAssociative => write!(f, "fully associative"),
        }
    }
}

/// one bank shared by every access, or one per access kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Organization {
    Unified,
    Split,
}

impl FromStr for Organization {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uc" => Ok(Organization::Unified),
            "sc" => Ok(Organization::Split),
            _ => Err(ConfigError::UnknownOrganization(s.to_owned())),
        }
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Organization::Unified => write!(f, "unified"),
            Organization::Split => write!(f, "split"),
        }
    }
}

/// Validated cache geometry. Never mutated once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheConfiguration {
    total_size_bytes: u32,
    block_size_bytes: u32,
    mapping: Mapping,
    organization: Organization,
    fields: AddressFields,
}

impl CacheConfiguration {
    pub fn new(
        total_size_bytes: u32,
        mapping: Mapping,
        organization: Organization,
    ) -> Result<Self, ConfigError> {
        verify_cache_size(total_size_bytes)?;
        let bank_length = total_size_bytes / BLOCK_SIZE / Self::banks_of(organization);
        let fields = address::compute_fields(bank_length, mapping)?;
        Ok(Self {
            total_size_bytes,
            block_size_bytes: BLOCK_SIZE,
            mapping,
            organization,
            fields,
        })
    }
    fn banks_of(organization: Organization) -> u32 {
        match organization {
            Organization::Unified => 1,
            Organization::Split => 2,
        }
    }
    pub fn total_size_bytes(&self) -> u32 {
        self.total_size_bytes
    }
    pub fn block_size_bytes(&self) -> u32 {
        self.block_size_bytes
    }
    pub fn mapping(&self) -> Mapping {
        self.mapping
    }
    pub fn organization(&self) -> Organization {
        self.organization
    }
    /// number of banks: 1 for unified, 2 for split.
    pub fn bank_count(&self) -> u32 {
        Self::banks_of(self.organization)
    }
    /// blocks held by each bank. split organizations halve the total.
    pub fn bank_length(&self) -> u32 {
        self.total_size_bytes / self.block_size_bytes / self.bank_count()
    }
    pub fn address_fields(&self) -> AddressFields {
        self.fields
    }
}

impl fmt::Display for CacheConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes, {}, {}",
            self.total_size_bytes, self.mapping, self.organization
        )
    }
}

#[cfg(feature = "stat")]
mod stat {
    use super::CacheConfiguration;
    use crate::stat::*;

    use std::fmt;

    impl Stat for CacheConfiguration {
        fn view(&self, _: usize) -> Box<dyn StatView + '_> {
            Box::new(GeometryView(self))
        }
    }

    struct GeometryView<'a>(&'a CacheConfiguration);

    impl StatView for GeometryView<'_> {
        fn header(&self) -> &'static str {
            "cache geometry"
        }
        fn width(&self) -> usize {
            33
        }
    }

    impl fmt::Display for GeometryView<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let config = self.0;
            let fields = config.address_fields();
            writeln!(f, "     size: {:>10} bytes", config.total_size_bytes)?;
            writeln!(f, "  mapping: {:>16}", config.mapping.to_string())?;
            writeln!(f, "    banks: {:>10} x {:>3}", config.bank_count(), config.bank_length())?;
            write!(
                f,
                "     bits: {:>4} {:>4} {:>4}",
                fields.tag_bits, fields.index_bits, fields.offset_bits
            )
        }
    }
}

/// size must be a power of two within [`MIN_CACHE_SIZE`, `MAX_CACHE_SIZE`].
pub fn verify_cache_size(cache_size: u32) -> Result<(), ConfigError> {
    if cache_size < MIN_CACHE_SIZE {
        Err(ConfigError::TooSmall(cache_size))
    } else if cache_size > MAX_CACHE_SIZE {
        Err(ConfigError::TooLarge(cache_size))
    } else if !is_power_of_two(cache_size) {
        Err(ConfigError::NotPowerOfTwo(cache_size))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_cache_size() {
        assert_eq!(Err(ConfigError::TooSmall(64)), verify_cache_size(64));
        assert_eq!(Err(ConfigError::TooLarge(8192)), verify_cache_size(8192));
        assert_eq!(Err(ConfigError::NotPowerOfTwo(384)), verify_cache_size(384));
        for size in [128, 256, 512, 1024, 2048, 4096] {
            assert_eq!(Ok(()), verify_cache_size(size), "size: {size}");
        }
    }
    #[test]
    fn test_parse_tokens() {
        assert_eq!(Mapping::DirectMapped, "dm".parse().unwrap());
        assert_eq!(Mapping::FullyAssociative, "fa".parse().unwrap());
        assert_eq!(Organization::Unified, "uc".parse().unwrap());
        assert_eq!(Organization::Split, "sc".parse().unwrap());
        assert_eq!(
            Err(ConfigError::UnknownMapping("lru".to_owned())),
            "lru".parse::<Mapping>()
        );
        assert_eq!(
            Err(ConfigError::UnknownOrganization("UC".to_owned())),
            "UC".parse::<Organization>()
        );
    }
    #[test]
    fn test_bank_length() {
        let c = CacheConfiguration::new(128, Mapping::DirectMapped, Organization::Unified).unwrap();
        assert_eq!(1, c.bank_count());
        assert_eq!(2, c.bank_length());
        let c = CacheConfiguration::new(128, Mapping::DirectMapped, Organization::Split).unwrap();
        assert_eq!(2, c.bank_count());
        assert_eq!(1, c.bank_length());
        let c = CacheConfiguration::new(4096, Mapping::FullyAssociative, Organization::Split)
            .unwrap();
        assert_eq!(32, c.bank_length());
        assert_eq!(64, c.block_size_bytes());
    }
    #[test]
    fn test_rejects_before_allocation() {
        assert_eq!(
            Err(ConfigError::NotPowerOfTwo(1000)),
            CacheConfiguration::new(1000, Mapping::DirectMapped, Organization::Unified)
        );
    }
    #[cfg(feature = "stat")]
    #[test]
    fn test_geometry_view() {
        use crate::stat::Stat;

        let c = CacheConfiguration::new(4096, Mapping::DirectMapped, Organization::Unified)
            .unwrap();
        let view = c.view(80);
        assert_eq!("cache geometry", view.header());
        let out = view.to_string();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!("     size:       4096 bytes", lines[0]);
        assert_eq!("    banks:          1 x  64", lines[2]);
        assert_eq!("     bits:   20    6    6", lines[3]);
        assert!(c.to_string().starts_with("4096 bytes, direct mapped"));
    }
}
