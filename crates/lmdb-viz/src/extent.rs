//! Extent index produced by a store crawl.
//!
//! An [`ExtentIndex`] is built exactly once per crawl and is read-only
//! afterwards. Extents are kept sorted ascending by start offset, which the
//! binner relies on for its last-extent-wins fill order.

use serde::Serialize;

use crate::error::{Result, VizError};

/// Which half of a stored record an extent covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Key,
    Value,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Value => "value",
        }
    }
}

/// A named sub-database of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub id: u16,
    pub name: String,
}

/// A contiguous byte range inside the mapped region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Extent {
    pub table_id: u16,
    pub kind: RecordKind,
    /// Byte offset from the map base.
    pub start: u64,
    pub size: u64,
    /// Start of the other half (key or value) of the same record.
    pub paired_offset: u64,
}

impl Extent {
    pub fn end(&self) -> u64 {
        self.start + self.size
    }
}

/// Occupied bytes of one table, split by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TableSpace {
    pub key_bytes: u64,
    pub value_bytes: u64,
}

impl TableSpace {
    pub fn total(&self) -> u64 {
        self.key_bytes + self.value_bytes
    }

    fn add(&mut self, kind: RecordKind, size: u64) {
        match kind {
            RecordKind::Key => self.key_bytes += size,
            RecordKind::Value => self.value_bytes += size,
        }
    }
}

/// Tables and their extents, sorted by start offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtentIndex {
    tables: Vec<Table>,
    extents: Vec<Extent>,
    space: Vec<TableSpace>,
    total_bytes: u64,
    map_size: u64,
    file_size: u64,
}

impl ExtentIndex {
    /// Builds an index, sorting extents and checking them against the tables
    /// and the map size.
    ///
    /// Fails with [`VizError::CorruptStore`] if an extent references an
    /// unknown table or reaches past `map_size`.
    pub fn new(
        tables: Vec<Table>,
        mut extents: Vec<Extent>,
        map_size: u64,
        file_size: u64,
    ) -> Result<Self> {
        for (position, table) in tables.iter().enumerate() {
            if usize::from(table.id) != position {
                return Err(VizError::CorruptStore(format!(
                    "table {:?} has id {} at position {position}",
                    table.name, table.id
                )));
            }
        }

        let mut space = vec![TableSpace::default(); tables.len()];
        let mut total_bytes = 0u64;
        for extent in &extents {
            let Some(table_space) = space.get_mut(usize::from(extent.table_id)) else {
                return Err(VizError::CorruptStore(format!(
                    "extent at offset {} references unknown table {}",
                    extent.start, extent.table_id
                )));
            };
            let end = extent.start.checked_add(extent.size);
            if end.map_or(true, |end| end > map_size) {
                return Err(VizError::CorruptStore(format!(
                    "{} extent at offset {} (+{} bytes) exceeds map size {map_size}",
                    extent.kind.as_str(),
                    extent.start,
                    extent.size
                )));
            }
            table_space.add(extent.kind, extent.size);
            total_bytes += extent.size;
        }

        extents.sort_by_key(|extent| extent.start);

        Ok(Self {
            tables,
            extents,
            space,
            total_bytes,
            map_size,
            file_size,
        })
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn extents(&self) -> &[Extent] {
        &self.extents
    }

    /// Size of the memory map the offsets are relative to.
    pub fn map_size(&self) -> u64 {
        self.map_size
    }

    /// Size of the data file on disk.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Number of bytes laid out by the binner.
    ///
    /// The data file is the populated prefix of the map, so its size is used
    /// when known; an unknown or inconsistent file size falls back to the map
    /// size.
    pub fn span(&self) -> u64 {
        if self.file_size > 0 && self.file_size <= self.map_size {
            self.file_size
        } else {
            self.map_size
        }
    }

    /// Total bytes covered by all extents.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Space used by one table, or `None` for an unknown id.
    pub fn table_space(&self, table_id: u16) -> Option<TableSpace> {
        self.space.get(usize::from(table_id)).copied()
    }

    /// Bytes covered by extents of `kind` in table `table_id`.
    pub fn bytes_for(&self, table_id: u16, kind: RecordKind) -> u64 {
        match (self.table_space(table_id), kind) {
            (Some(space), RecordKind::Key) => space.key_bytes,
            (Some(space), RecordKind::Value) => space.value_bytes,
            (None, _) => 0,
        }
    }

    /// Looks up a table id by name.
    pub fn table_id(&self, name: &str) -> Option<u16> {
        self.tables
            .iter()
            .find(|table| table.name == name)
            .map(|table| table.id)
    }

    /// Index of the first extent starting at or after `offset`.
    pub fn first_at_or_after(&self, offset: u64) -> usize {
        self.extents.partition_point(|extent| extent.start < offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(id: u16, name: &str) -> Table {
        Table {
            id,
            name: name.to_string(),
        }
    }

    fn extent(table_id: u16, kind: RecordKind, start: u64, size: u64) -> Extent {
        Extent {
            table_id,
            kind,
            start,
            size,
            paired_offset: 0,
        }
    }

    #[test]
    fn test_new_sorts_by_start() {
        let index = ExtentIndex::new(
            vec![table(0, "a"), table(1, "b")],
            vec![
                extent(1, RecordKind::Value, 900, 10),
                extent(0, RecordKind::Key, 10, 5),
                extent(1, RecordKind::Key, 400, 8),
                extent(0, RecordKind::Value, 15, 50),
            ],
            1000,
            1000,
        )
        .unwrap();

        let starts: Vec<u64> = index.extents().iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![10, 15, 400, 900]);
    }

    #[test]
    fn test_space_accounting() {
        let index = ExtentIndex::new(
            vec![table(0, "a"), table(1, "b")],
            vec![
                extent(0, RecordKind::Key, 0, 10),
                extent(0, RecordKind::Value, 10, 90),
                extent(1, RecordKind::Key, 100, 4),
                extent(1, RecordKind::Value, 104, 6),
                extent(1, RecordKind::Key, 110, 4),
            ],
            10_000,
            4096,
        )
        .unwrap();

        assert_eq!(index.bytes_for(0, RecordKind::Key), 10);
        assert_eq!(index.bytes_for(0, RecordKind::Value), 90);
        assert_eq!(index.bytes_for(1, RecordKind::Key), 8);
        assert_eq!(index.bytes_for(1, RecordKind::Value), 6);
        assert_eq!(index.bytes_for(7, RecordKind::Key), 0);

        let per_table: u64 = (0..2)
            .map(|id| index.table_space(id).unwrap().total())
            .sum();
        assert_eq!(per_table, index.total_bytes());
        assert_eq!(index.total_bytes(), 114);
    }

    #[test]
    fn test_extent_past_map_size_is_corrupt() {
        let result = ExtentIndex::new(
            vec![table(0, "a")],
            vec![extent(0, RecordKind::Value, 990, 20)],
            1000,
            1000,
        );
        assert!(matches!(result, Err(VizError::CorruptStore(_))));
    }

    #[test]
    fn test_extent_ending_at_map_size_is_accepted() {
        let index = ExtentIndex::new(
            vec![table(0, "a")],
            vec![extent(0, RecordKind::Value, 980, 20)],
            1000,
            1000,
        )
        .unwrap();
        assert_eq!(index.extents()[0].end(), 1000);
    }

    #[test]
    fn test_unknown_table_is_corrupt() {
        let result = ExtentIndex::new(
            vec![table(0, "a")],
            vec![extent(3, RecordKind::Key, 0, 1)],
            1000,
            1000,
        );
        assert!(matches!(result, Err(VizError::CorruptStore(_))));
    }

    #[test]
    fn test_span_prefers_file_size() {
        let index = ExtentIndex::new(vec![table(0, "a")], vec![], 1 << 30, 8192).unwrap();
        assert_eq!(index.span(), 8192);

        let index = ExtentIndex::new(vec![table(0, "a")], vec![], 1000, 0).unwrap();
        assert_eq!(index.span(), 1000);

        let index = ExtentIndex::new(vec![table(0, "a")], vec![], 1000, 4096).unwrap();
        assert_eq!(index.span(), 1000);
    }

    #[test]
    fn test_record_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_value(RecordKind::Key).unwrap(), "key");
        assert_eq!(serde_json::to_value(RecordKind::Value).unwrap(), "value");
        assert_eq!(RecordKind::Value.as_str(), "value");
    }

    #[test]
    fn test_first_at_or_after() {
        let index = ExtentIndex::new(
            vec![table(0, "a")],
            vec![
                extent(0, RecordKind::Key, 0, 1),
                extent(0, RecordKind::Key, 10, 1),
                extent(0, RecordKind::Key, 10, 1),
                extent(0, RecordKind::Key, 20, 1),
            ],
            100,
            100,
        )
        .unwrap();

        assert_eq!(index.first_at_or_after(0), 0);
        assert_eq!(index.first_at_or_after(5), 1);
        assert_eq!(index.first_at_or_after(10), 1);
        assert_eq!(index.first_at_or_after(11), 3);
        assert_eq!(index.first_at_or_after(21), 4);
    }

    #[test]
    fn test_table_lookup_by_name() {
        let index =
            ExtentIndex::new(vec![table(0, "users"), table(1, "posts")], vec![], 10, 10).unwrap();
        assert_eq!(index.table_id("posts"), Some(1));
        assert_eq!(index.table_id("missing"), None);
    }
}
