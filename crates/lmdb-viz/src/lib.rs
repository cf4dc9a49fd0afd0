//! LMDB space usage visualization library.
//!
//! This crate provides the core of the visualizer:
//! - Read-only crawling of an LMDB environment into byte extents
//! - An immutable extent index with per-table space accounting
//! - Pan/zoom binning of extents into a magnified colour grid
//! - View state, configuration, and summary statistics for front ends

pub mod binner;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extent;
pub mod format;
pub mod locator;
pub mod palette;
pub mod summary;
pub mod view;

// Re-export main types
pub use binner::{render, Frame, FrameCache};
pub use config::{StoreOptions, ViewDefaults, VizConfig};
pub use crawler::{crawl, StoreExtentCrawler};
pub use error::{Result, VizError};
pub use extent::{Extent, ExtentIndex, RecordKind, Table, TableSpace};
pub use format::render_size;
pub use palette::{color_for, Color};
pub use summary::{Summary, TableSummary};
pub use view::{KindMask, ViewState, Visibility};
