//! The write loop.

use crate::shutdown::StopSignal;
use crate::stats::RunningTotals;
use std::fs::File;
use std::io::{self, Write};
use std::sync::Arc;

/// Destination the benchmark writes chunks into.
pub trait WriteTarget: Send {
    /// Issue one write of `buf`, returning how many bytes were accepted.
    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Force written data down to storage.
    fn sync(&mut self) -> io::Result<()>;
}

impl WriteTarget for File {
    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write(buf)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// Writes a fixed chunk to a target as fast as it accepts it.
pub struct Writer<T: WriteTarget> {
    target: T,
    chunk: Vec<u8>,
    sync_after_write: bool,
    totals: Arc<RunningTotals>,
    short_writes: u64,
}

impl<T: WriteTarget> Writer<T> {
    /// The chunk buffer is allocated once here and reused for every write.
    pub fn new(target: T, chunk_size: usize, sync_after_write: bool, totals: Arc<RunningTotals>) -> Self {
        Self {
            target,
            chunk: vec![0u8; chunk_size],
            sync_after_write,
            totals,
            short_writes: 0,
        }
    }

    /// Write the chunk once and account for the accepted bytes.
    ///
    /// A short write is logged and counted but not an error. A failing write
    /// or flush is returned to the caller.
    pub fn write_once(&mut self) -> io::Result<usize> {
        let written = self.target.write_chunk(&self.chunk)?;

        if written < self.chunk.len() {
            self.short_writes += 1;
            log::warn!(
                "short write: {} of {} bytes not written",
                self.chunk.len() - written,
                self.chunk.len()
            );
        }

        if self.sync_after_write {
            self.target.sync()?;
        }

        self.totals.record(written as u64);
        Ok(written)
    }

    /// Write until `stop` fires or a write fails.
    ///
    /// Returns the number of completed write calls.
    pub fn run(&mut self, stop: &StopSignal) -> io::Result<u64> {
        let mut writes = 0u64;
        while !stop.is_triggered() {
            self.write_once()?;
            writes += 1;
        }
        log::debug!(
            "writer stopped after {} writes ({} short)",
            writes,
            self.short_writes
        );
        Ok(writes)
    }

    /// Number of writes that accepted fewer bytes than the chunk size.
    pub fn short_writes(&self) -> u64 {
        self.short_writes
    }

    /// Bytes requested per write.
    pub fn chunk_size(&self) -> usize {
        self.chunk.len()
    }

    pub fn into_target(self) -> T {
        self.target
    }
}
