use std::fmt;

use thiserror::Error;

use crate::address::DecodedAddress;

/// One slot of a bank. Only presence is simulated, there is no data payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheBlock {
    pub tag: u32,
    pub valid: bool,
}

impl CacheBlock {
    pub fn holds(&self, tag: u32) -> bool {
        self.valid && self.tag == tag
    }
}

/// Result of a single lookup-or-install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Hit,
    /// `evicted` carries the tag that had to make room, if any.
    Miss { evicted: Option<u32> },
}

impl Outcome {
    /// Returns `true` if the outcome is [`Hit`].
    ///
    /// [`Hit`]: Outcome::Hit
    #[must_use]
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit)
    }
    pub fn evicted(&self) -> Option<u32> {
        match self {
            Outcome::Hit => None,
            Outcome::Miss { evicted } => *evicted,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Hit => write!(f, "Cache hit"),
            Outcome::Miss { .. } => write!(f, "Cache miss"),
        }
    }
}

/// A placement/replacement strategy over a fixed array of blocks.
pub trait Bank {
    /// looks `addr` up, installing it on a miss.
    fn lookup_or_install(&mut self, addr: &DecodedAddress) -> Outcome;
    /// number of blocks the bank can hold.
    fn capacity(&self) -> usize;
    /// number of valid blocks.
    fn occupancy(&self) -> usize;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to allocate memory for {blocks} cache blocks")]
pub struct AllocationError {
    pub blocks: usize,
}

/// `length` invalid blocks.
pub(crate) fn allocate_blocks(length: usize) -> Result<Vec<CacheBlock>, AllocationError> {
    let mut blocks = Vec::new();
    blocks
        .try_reserve_exact(length)
        .map_err(|_| AllocationError { blocks: length })?;
    blocks.resize(length, CacheBlock::default());
    Ok(blocks)
}
