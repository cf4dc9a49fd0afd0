#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, DatabaseFlags, EnvOpenOptions};
use tempfile::TempDir;

/// Records of one named database, written in the given order.
pub struct TableFixture<'a> {
    pub name: &'a str,
    pub dup_sort: bool,
    pub records: Vec<(Vec<u8>, Vec<u8>)>,
}

impl<'a> TableFixture<'a> {
    pub fn new(name: &'a str, records: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        Self {
            name,
            dup_sort: false,
            records,
        }
    }

    pub fn dup_sort(mut self) -> Self {
        self.dup_sort = true;
        self
    }
}

/// A temporary LMDB environment, closed after being written.
pub struct StoreFixture {
    pub dir: TempDir,
}

impl StoreFixture {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_file(&self) -> PathBuf {
        self.dir.path().join("data.mdb")
    }

    pub fn data(&self) -> Vec<u8> {
        fs::read(self.data_file()).unwrap()
    }
}

pub fn create_store(tables: Vec<TableFixture<'_>>) -> StoreFixture {
    create_store_with(tables, &[])
}

/// Creates a store holding `tables` plus `plain` records in the main database.
pub fn create_store_with(tables: Vec<TableFixture<'_>>, plain: &[(&[u8], &[u8])]) -> StoreFixture {
    let dir = tempfile::tempdir().unwrap();
    let env = unsafe {
        EnvOpenOptions::new()
            .map_size(16 * 1024 * 1024)
            .max_dbs(32)
            .open(dir.path())
    }
    .unwrap();

    let mut wtxn = env.write_txn().unwrap();
    for table in &tables {
        let mut options = env.database_options().types::<Bytes, Bytes>();
        options.name(table.name);
        if table.dup_sort {
            options.flags(DatabaseFlags::DUP_SORT);
        }
        let db: Database<Bytes, Bytes> = options.create(&mut wtxn).unwrap();
        for (key, value) in &table.records {
            db.put(&mut wtxn, key, value).unwrap();
        }
    }
    if !plain.is_empty() {
        let main: Database<Bytes, Bytes> = env.create_database(&mut wtxn, None).unwrap();
        for (key, value) in plain {
            main.put(&mut wtxn, key, value).unwrap();
        }
    }
    wtxn.commit().unwrap();
    env.prepare_for_closing().wait();

    StoreFixture { dir }
}

pub fn records(prefix: &str, count: usize, value_len: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    (0..count)
        .map(|i| {
            let key = format!("{prefix}-{i:06}").into_bytes();
            let value = vec![(i % 251) as u8; value_len];
            (key, value)
        })
        .collect()
}
