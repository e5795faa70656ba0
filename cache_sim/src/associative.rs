//! Fully associative bank with FIFO replacement
//!
//! Blocks form a ring buffer over a fixed arena. Resident entries live in
//! `[start, end)` modulo the bank length, oldest at `start`. `start == end`
//! means empty unless `is_full` is set, in which case every slot is resident.

use crate::{
    address::DecodedAddress,
    cache::{allocate_blocks, AllocationError, Bank, CacheBlock, Outcome},
};

pub struct AssociativeBank {
    blocks: Vec<CacheBlock>,
    start: usize,
    end: usize,
    is_full: bool,
}

impl AssociativeBank {
    /// `length` must be non-zero.
    pub fn new(length: usize) -> Result<Self, AllocationError> {
        Ok(Self {
            blocks: allocate_blocks(length)?,
            start: 0,
            end: 0,
            is_full: false,
        })
    }
    pub fn start(&self) -> usize {
        self.start
    }
    pub fn end(&self) -> usize {
        self.end
    }
    pub fn is_full(&self) -> bool {
        self.is_full
    }
    pub fn len(&self) -> usize {
        self.blocks.len()
    }
    pub fn is_empty(&self) -> bool {
        self.start == self.end && !self.is_full
    }
    /// number of resident entries.
    pub fn resident(&self) -> usize {
        if self.is_full {
            self.blocks.len()
        } else {
            (self.end + self.blocks.len() - self.start) % self.blocks.len()
        }
    }
    /// resident blocks, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &CacheBlock> + '_ {
        let len = self.blocks.len();
        (0..self.resident()).map(move |i| &self.blocks[(self.start + i) % len])
    }
    pub fn contains(&self, tag: u32) -> bool {
        self.iter().any(|b| b.holds(tag))
    }
    /// appends `tag` as the newest entry, dropping the oldest one when full.
    /// returns the dropped tag.
    pub fn install(&mut self, tag: u32) -> Option<u32> {
        let len = self.blocks.len();
        let evicted = if self.is_full {
            let oldest = self.blocks[self.start].tag;
            self.start = (self.start + 1) % len;
            Some(oldest)
        } else {
            None
        };
        self.blocks[self.end] = CacheBlock { tag, valid: true };
        self.end = (self.end + 1) % len;
        self.is_full = self.end == self.start;
        evicted
    }
    /// hits leave the ring untouched, no promotion.
    pub fn access(&mut self, tag: u32) -> Outcome {
        if self.contains(tag) {
            Outcome::Hit
        } else {
            Outcome::Miss {
                evicted: self.install(tag),
            }
        }
    }
    pub fn block(&self, slot: usize) -> Option<&CacheBlock> {
        self.blocks.get(slot)
    }
}

impl Bank for AssociativeBank {
    fn lookup_or_install(&mut self, addr: &DecodedAddress) -> Outcome {
        self.access(addr.tag)
    }
    fn capacity(&self) -> usize {
        self.blocks.len()
    }
    fn occupancy(&self) -> usize {
        self.resident()
    }
}
