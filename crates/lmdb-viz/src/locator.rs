//! Record locator: offsets of borrowed record slices inside the memory map.
//!
//! Slices handed out by a read-only LMDB transaction point directly into the
//! environment's memory map. LMDB does not expose the address of that map, so
//! the base is recovered from the page a slice lives on: every page starts
//! with its own page number, which places the page at
//! `page_number * page_size` bytes from the base.
//!
//! This module is the only place that does address arithmetic on record
//! slices. Every result is checked to lie within `[0, map_size)`;
//! out-of-range addresses are reported as corrupt and never clamped or
//! wrapped.

use std::mem;
use std::ptr;

use crate::error::{Result, VizError};

/// Base address and length of a mapped region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRegion {
    base: usize,
    len: u64,
}

/// Position of a record slice within a [`MapRegion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: u64,
    pub len: u64,
}

impl MapRegion {
    /// Describes a region starting at address `base` and spanning `len` bytes.
    pub fn new(base: usize, len: u64) -> Self {
        Self { base, len }
    }

    /// Describes the region backing `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::new(bytes.as_ptr() as usize, bytes.len() as u64)
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Locates `bytes` inside the region.
    pub fn locate(&self, bytes: &[u8]) -> Result<Location> {
        self.locate_address(bytes.as_ptr() as usize, bytes.len() as u64)
    }

    fn locate_address(&self, address: usize, len: u64) -> Result<Location> {
        let offset = address.checked_sub(self.base).ok_or_else(|| {
            VizError::CorruptStore(format!(
                "record at {address:#x} lies below map base {:#x}",
                self.base
            ))
        })? as u64;

        let in_bounds =
            offset < self.len && offset.checked_add(len).is_some_and(|end| end <= self.len);
        if !in_bounds {
            return Err(VizError::CorruptStore(format!(
                "record at offset {offset} (+{len} bytes) exceeds map size {}",
                self.len
            )));
        }

        Ok(Location { offset, len })
    }
}

/// Locates record slices using the page numbers stored in page headers.
///
/// The map base is derived from the first slice located and every later
/// slice must agree with it.
#[derive(Debug, Clone)]
pub struct PageLocator {
    page_size: usize,
    map_size: u64,
    region: Option<MapRegion>,
}

impl PageLocator {
    /// Creates a locator for a map of `map_size` bytes made of `page_size`
    /// byte pages.
    pub fn new(page_size: u32, map_size: u64) -> Result<Self> {
        let page_size = page_size as usize;
        if !page_size.is_power_of_two() || page_size < mem::size_of::<usize>() {
            return Err(VizError::CorruptStore(format!(
                "invalid page size {page_size}"
            )));
        }
        Ok(Self {
            page_size,
            map_size,
            region: None,
        })
    }

    /// The region derived so far, if any slice has been located.
    pub fn region(&self) -> Option<MapRegion> {
        self.region
    }

    /// Locates `bytes` relative to the map base.
    ///
    /// # Safety
    ///
    /// `bytes` must borrow from the memory map this locator describes, on a
    /// page that starts with its page number (any LMDB page other than a
    /// meta page), and the map must stay mapped for the duration of the call.
    /// An empty `bytes` must directly follow a byte of such a page.
    pub unsafe fn locate(&mut self, bytes: &[u8]) -> Result<Location> {
        let address = bytes.as_ptr() as usize;
        // An empty slice may point one past the end of its node's page, so
        // the page is found from the byte just before it.
        let anchor = if bytes.is_empty() {
            address.checked_sub(1).ok_or_else(|| {
                VizError::CorruptStore("empty record at address zero".to_string())
            })?
        } else {
            address
        };
        let page_start = anchor & !(self.page_size - 1);

        // SAFETY: `page_start` is the start of the page holding `bytes` (or,
        // for an empty slice, the node it ends), which the caller guarantees
        // is a mapped LMDB page beginning with its page number.
        let page_number = unsafe { ptr::read_unaligned(page_start as *const usize) };

        let base = page_number
            .checked_mul(self.page_size)
            .and_then(|page_offset| page_start.checked_sub(page_offset))
            .ok_or_else(|| {
                VizError::CorruptStore(format!(
                    "page number {page_number} at {page_start:#x} lies outside the map"
                ))
            })?;

        let region = match self.region {
            Some(region) if region.base() != base => {
                return Err(VizError::CorruptStore(format!(
                    "page {page_number} implies map base {base:#x}, expected {:#x}",
                    region.base()
                )));
            }
            Some(region) => region,
            None => {
                let region = MapRegion::new(base, self.map_size);
                self.region = Some(region);
                region
            }
        };

        region.locate(bytes)
    }
}
