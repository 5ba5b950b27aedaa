//! Engine services forwarded by the instance
//!
//! Sizes, journaling, binary dumps and CSV exchange are engine business;
//! the instance forwards them and turns a non-zero status into
//! `EngineFatal` carrying the operation name and raw code.

use std::fmt::Write as _;
use std::path::Path;

use tracing::info;

use wgbind_core::{Error, Result};

use super::Database;

fn check(op: &'static str, status: i64) -> Result<()> {
    match status {
        0 => Ok(()),
        code => Err(Error::engine(op, code)),
    }
}

impl Database {
    /// Store size in bytes
    pub fn size(&self) -> u64 {
        self.native().database_size()
    }

    /// Free bytes left in the store
    pub fn free_size(&self) -> u64 {
        self.native().free_size()
    }

    /// Start journaling mutations
    pub fn start_logging(&self) -> Result<()> {
        check("start_logging", self.native().start_logging())
    }

    /// Stop journaling mutations
    pub fn stop_logging(&self) -> Result<()> {
        check("stop_logging", self.native().stop_logging())
    }

    /// Re-apply a journal file
    pub fn replay_log(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        check("replay_log", self.native().replay_log(path))?;
        info!(target: "wgbind::db", name = %self.name(), path = %path.display(), "Journal replayed");
        Ok(())
    }

    /// Write a binary dump of the store
    pub fn dump(&self, path: impl AsRef<Path>) -> Result<()> {
        check("dump", self.native().dump(path.as_ref()))
    }

    /// Replace the store content with a binary dump
    ///
    /// Every record handle issued before the import becomes stale.
    pub fn import_dump(&self, path: impl AsRef<Path>) -> Result<()> {
        check("import_dump", self.native().import_dump(path.as_ref()))?;
        self.invalidate_handles();
        Ok(())
    }

    /// Append the rows of a CSV file as records
    pub fn import_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        check("import_csv", self.native().import_csv(path.as_ref()))
    }

    /// Write all records to a CSV file
    pub fn export_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        check("export_csv", self.native().export_csv(path.as_ref()))
    }

    /// Render every record, one per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        for rec in self.records() {
            let _ = writeln!(out, "{}", rec);
        }
        out
    }
}
