//! Read/write lock bookkeeping
//!
//! The engine grants cooperative read and write locks as tokens. An
//! instance holds at most one outstanding token of each kind:
//! - `begin_*` while that kind is held is a `LockStateViolation`
//! - `end_*` while that kind is not held is a `LockStateViolation`
//! - a zero token from the engine (refusal) is `EngineFatal`
//!
//! `with_read` / `with_write` pair begin and end around a closure, ending
//! the transaction whether the closure succeeds, fails or panics.

use tracing::{debug, warn};

use wgbind_core::{Error, LockToken, Result};

use super::Database;

/// Outstanding tokens of one instance
#[derive(Debug, Default)]
pub(crate) struct LockState {
    read: Option<LockToken>,
    write: Option<LockToken>,
}

#[derive(Debug, Clone, Copy)]
enum LockKind {
    Read,
    Write,
}

impl LockKind {
    fn begin_op(self) -> &'static str {
        match self {
            LockKind::Read => "begin_read",
            LockKind::Write => "begin_write",
        }
    }

    fn end_op(self) -> &'static str {
        match self {
            LockKind::Read => "end_read",
            LockKind::Write => "end_write",
        }
    }
}

/// Ends a transaction begun by `with_read` / `with_write` if the closure unwinds
struct TxnGuard<'a> {
    db: &'a Database,
    kind: LockKind,
    armed: bool,
}

impl<'a> TxnGuard<'a> {
    fn begin(db: &'a Database, kind: LockKind) -> Result<Self> {
        db.begin(kind)?;
        Ok(Self {
            db,
            kind,
            armed: true,
        })
    }

    fn finish(mut self) -> Result<()> {
        self.armed = false;
        self.db.end(self.kind)
    }
}

impl Drop for TxnGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(target: "wgbind::txn", name = %self.db.name(), op = self.kind.end_op(), "Ending transaction after panic");
        if let Err(e) = self.db.end(self.kind) {
            warn!(target: "wgbind::txn", name = %self.db.name(), error = %e, "Transaction end failed during unwind");
        }
    }
}

impl LockState {
    fn slot(&mut self, kind: LockKind) -> &mut Option<LockToken> {
        match kind {
            LockKind::Read => &mut self.read,
            LockKind::Write => &mut self.write,
        }
    }
}

impl Database {
    fn begin(&self, kind: LockKind) -> Result<()> {
        let mut state = self.locks.lock();
        let slot = state.slot(kind);
        if slot.is_some() {
            return Err(Error::LockStateViolation {
                op: kind.begin_op(),
                reason: "lock of this kind already held",
            });
        }
        let raw = match kind {
            LockKind::Read => self.native().start_read(),
            LockKind::Write => self.native().start_write(),
        };
        let token = LockToken::from_raw(raw).ok_or(Error::engine(kind.begin_op(), raw))?;
        *slot = Some(token);
        debug!(target: "wgbind::txn", op = kind.begin_op(), token = token.as_raw(), "Lock acquired");
        Ok(())
    }

    fn end(&self, kind: LockKind) -> Result<()> {
        let mut state = self.locks.lock();
        let token = state.slot(kind).take().ok_or(Error::LockStateViolation {
            op: kind.end_op(),
            reason: "no lock of this kind held",
        })?;
        let status = match kind {
            LockKind::Read => self.native().end_read(token.as_raw()),
            LockKind::Write => self.native().end_write(token.as_raw()),
        };
        if status != 0 {
            return Err(Error::engine(kind.end_op(), status));
        }
        debug!(target: "wgbind::txn", op = kind.end_op(), token = token.as_raw(), "Lock released");
        Ok(())
    }

    /// Acquire the shared lock
    pub fn begin_read(&self) -> Result<()> {
        self.begin(LockKind::Read)
    }

    /// Release the shared lock
    pub fn end_read(&self) -> Result<()> {
        self.end(LockKind::Read)
    }

    /// Acquire the exclusive lock
    pub fn begin_write(&self) -> Result<()> {
        self.begin(LockKind::Write)
    }

    /// Release the exclusive lock
    pub fn end_write(&self) -> Result<()> {
        self.end(LockKind::Write)
    }

    /// Whether this instance holds a read token
    pub fn has_read_lock(&self) -> bool {
        self.locks.lock().read.is_some()
    }

    /// Whether this instance holds a write token
    pub fn has_write_lock(&self) -> bool {
        self.locks.lock().write.is_some()
    }

    /// Run `f` under the shared lock
    ///
    /// # Example
    ///
    /// ```ignore
    /// let total = db.with_read(|db| db.count(&query))?;
    /// ```
    pub fn with_read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.with_lock(LockKind::Read, f)
    }

    /// Run `f` under the exclusive lock
    pub fn with_write<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.with_lock(LockKind::Write, f)
    }

    fn with_lock<F, T>(&self, kind: LockKind, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let guard = TxnGuard::begin(self, kind)?;
        let result = f(self);
        let ended = guard.finish();
        let value = result?;
        ended.map(|_| value)
    }

    /// End any token still outstanding, ahead of detach
    pub(crate) fn release_outstanding_locks(&self) -> Result<()> {
        let (read, write) = {
            let state = self.locks.lock();
            (state.read.is_some(), state.write.is_some())
        };
        if read || write {
            warn!(target: "wgbind::txn", name = %self.name(), read, write, "Releasing locks held at teardown");
        }
        let mut outcome = Ok(());
        if write {
            outcome = self.end_write();
        }
        if read {
            let ended = self.end_read();
            if outcome.is_ok() {
                outcome = ended;
            }
        }
        outcome
    }
}
