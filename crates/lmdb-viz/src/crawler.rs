//! Read-only crawl of an LMDB environment into an [`ExtentIndex`].
//!
//! The crawler opens the environment read-only, lists the named databases
//! stored in the main database, and walks every record of every table inside
//! a single read transaction. Key and value slices borrowed from the
//! transaction point into the memory map; [`PageLocator`] turns them into
//! offsets from the map base.
//!
//! The environment stays open for as long as the crawler is alive, so a front
//! end that keeps the crawler around can re-crawl without remapping.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use heed::types::Bytes;
use heed::{Database, Env, EnvFlags, EnvOpenOptions, MdbError, RoTxn};

use crate::config::StoreOptions;
use crate::error::{Result, VizError};
use crate::extent::{Extent, ExtentIndex, RecordKind, Table};
use crate::locator::PageLocator;

/// Opens `dir` with default options and crawls it once.
pub fn crawl(dir: impl AsRef<Path>) -> Result<ExtentIndex> {
    StoreExtentCrawler::open(dir, &StoreOptions::default())?.crawl()
}

/// A read-only LMDB environment being visualized.
pub struct StoreExtentCrawler {
    env: Env,
    path: PathBuf,
}

impl std::fmt::Debug for StoreExtentCrawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreExtentCrawler")
            .field("path", &self.path)
            .finish()
    }
}

impl StoreExtentCrawler {
    /// Opens the environment in `dir` for reading.
    ///
    /// Fails with [`VizError::Open`] if the directory does not hold a
    /// readable LMDB environment.
    pub fn open(dir: impl AsRef<Path>, options: &StoreOptions) -> Result<Self> {
        let path = dir.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(VizError::open(
                &path,
                heed::Error::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    "store directory does not exist",
                )),
            ));
        }

        // SAFETY: the environment is opened read-only and this process never
        // writes to it; a concurrent writer is unsupported.
        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(options.max_dbs)
                .flags(EnvFlags::READ_ONLY)
                .open(&path)
        }
        .map_err(|error| VizError::open(&path, error))?;

        log::debug!("opened store {} read-only", path.display());
        Ok(Self { env, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the environment's memory map in bytes.
    pub fn map_size(&self) -> u64 {
        self.env.info().map_size as u64
    }

    /// Size of the data file on disk.
    pub fn file_size(&self) -> Result<u64> {
        self.env.real_disk_size().map_err(|error| match error {
            heed::Error::Io(error) => VizError::Io(error),
            other => VizError::open(&self.path, other),
        })
    }

    /// Walks every record of every table and builds the extent index.
    ///
    /// Fails with [`VizError::EmptyStore`] when the store has no tables or no
    /// records, and with [`VizError::CorruptStore`] when a record lies
    /// outside the memory map.
    pub fn crawl(&self) -> Result<ExtentIndex> {
        let started = Instant::now();
        let map_size = self.map_size();
        let file_size = self.file_size()?;

        let rtxn = self
            .env
            .read_txn()
            .map_err(|error| VizError::open(&self.path, error))?;

        let Some(main) = self
            .env
            .open_database::<Bytes, Bytes>(&rtxn, None)
            .map_err(|error| VizError::open(&self.path, error))?
        else {
            return Err(VizError::EmptyStore(format!(
                "{} has no main database",
                self.path.display()
            )));
        };

        let names = self.table_names(&rtxn, main)?;
        if names.is_empty() {
            return Err(VizError::EmptyStore(format!(
                "{} contains no named databases",
                self.path.display()
            )));
        }

        let page_size = main
            .stat(&rtxn)
            .map_err(|error| VizError::open(&self.path, error))?
            .page_size;
        let mut locator = PageLocator::new(page_size, map_size)?;

        let mut tables = Vec::with_capacity(names.len());
        let mut extents = Vec::new();

        for name in names {
            let Some(db) = self.open_table(&rtxn, &name)? else {
                continue;
            };
            let Ok(id) = u16::try_from(tables.len()) else {
                log::warn!("{}: too many tables, ignoring {name:?}", self.path.display());
                break;
            };

            let before = extents.len();
            crawl_table(&rtxn, db, id, &mut locator, &mut extents).map_err(|error| match error {
                VizError::CorruptStore(message) => {
                    VizError::CorruptStore(format!("table {name:?}: {message}"))
                }
                other => other,
            })?;
            log::debug!(
                "table {name:?} (id {id}): {} records",
                (extents.len() - before) / 2
            );

            tables.push(Table { id, name });
        }

        if tables.is_empty() || extents.is_empty() {
            return Err(VizError::EmptyStore(format!(
                "{} has {} tables and no records",
                self.path.display(),
                tables.len()
            )));
        }

        let index = ExtentIndex::new(tables, extents, map_size, file_size)?;
        log::info!(
            "crawled {}: {} tables, {} extents, {} bytes occupied in {:?}",
            self.path.display(),
            index.tables().len(),
            index.extents().len(),
            index.total_bytes(),
            started.elapsed()
        );
        Ok(index)
    }

    /// Names of the databases listed in the main database, in catalog order.
    fn table_names(&self, rtxn: &RoTxn, main: Database<Bytes, Bytes>) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let records = main
            .iter(rtxn)
            .map_err(|error| VizError::open(&self.path, error))?;
        for record in records {
            let (key, _) = record.map_err(|error| VizError::open(&self.path, error))?;
            match std::str::from_utf8(key) {
                Ok(name) => names.push(name.to_string()),
                Err(_) => log::warn!(
                    "{}: skipping database with non UTF-8 name {:?}",
                    self.path.display(),
                    String::from_utf8_lossy(key)
                ),
            }
        }
        Ok(names)
    }

    /// Opens a named database, or `None` if the main database entry is a
    /// plain record rather than a database.
    fn open_table(&self, rtxn: &RoTxn, name: &str) -> Result<Option<Database<Bytes, Bytes>>> {
        match self.env.open_database::<Bytes, Bytes>(rtxn, Some(name)) {
            Ok(Some(db)) => Ok(Some(db)),
            Ok(None) => {
                log::warn!("{}: database {name:?} disappeared", self.path.display());
                Ok(None)
            }
            Err(heed::Error::Mdb(MdbError::Incompatible)) => {
                log::warn!(
                    "{}: main database entry {name:?} is not a database",
                    self.path.display()
                );
                Ok(None)
            }
            Err(error) => Err(VizError::open(&self.path, error)),
        }
    }
}

/// Appends a key and a value extent for every record of `db`.
fn crawl_table(
    rtxn: &RoTxn,
    db: Database<Bytes, Bytes>,
    table_id: u16,
    locator: &mut PageLocator,
    extents: &mut Vec<Extent>,
) -> Result<()> {
    let records = db.iter(rtxn).map_err(store_error)?;
    for record in records {
        let (key, value) = record.map_err(store_error)?;

        // SAFETY: both slices were just returned by a cursor of the live read
        // transaction `rtxn`, so they borrow leaf or overflow pages of the
        // environment's memory map.
        let (key_location, value_location) =
            unsafe { (locator.locate(key)?, locator.locate(value)?) };

        extents.push(Extent {
            table_id,
            kind: RecordKind::Key,
            start: key_location.offset,
            size: key_location.len,
            paired_offset: value_location.offset,
        });
        extents.push(Extent {
            table_id,
            kind: RecordKind::Value,
            start: value_location.offset,
            size: value_location.len,
            paired_offset: key_location.offset,
        });
    }
    Ok(())
}

fn store_error(error: heed::Error) -> VizError {
    match error {
        heed::Error::Io(error) => VizError::Io(error),
        other => VizError::CorruptStore(other.to_string()),
    }
}
