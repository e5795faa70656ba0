use std::mem;

use crate::{
    address::DecodedAddress,
    cache::{allocate_blocks, AllocationError, Bank, CacheBlock, Outcome},
};

/// One block per index. A conflicting tag replaces whatever the slot held.
pub struct DirectMappedBank {
    blocks: Vec<CacheBlock>,
}

impl DirectMappedBank {
    pub fn new(length: usize) -> Result<Self, AllocationError> {
        Ok(Self {
            blocks: allocate_blocks(length)?,
        })
    }
    /// `index` must be below the bank length.
    pub fn access(&mut self, index: u32, tag: u32) -> Outcome {
        let block = &mut self.blocks[index as usize];
        if !block.valid {
            // compulsory miss
            *block = CacheBlock { tag, valid: true };
            Outcome::Miss { evicted: None }
        } else if block.tag == tag {
            Outcome::Hit
        } else {
            let evicted = mem::replace(&mut block.tag, tag);
            Outcome::Miss {
                evicted: Some(evicted),
            }
        }
    }
    pub fn block(&self, index: u32) -> Option<&CacheBlock> {
        self.blocks.get(index as usize)
    }
}

impl Bank for DirectMappedBank {
    fn lookup_or_install(&mut self, addr: &DecodedAddress) -> Outcome {
        self.access(addr.index, addr.tag)
    }
    fn capacity(&self) -> usize {
        self.blocks.len()
    }
    fn occupancy(&self) -> usize {
        self.blocks.iter().filter(|b| b.valid).count()
    }
}
