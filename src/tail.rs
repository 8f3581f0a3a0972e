//! Tail reader: last N lines at startup, then only the bytes appended since
//! the previous observation.
//!
//! No file handle outlives a call. Every `initialize`/`poll` opens the file,
//! reads what it needs and drops the handle before returning, so other tools
//! may rotate or replace the file between cycles. A file that got smaller is
//! reported as [`LogviewError::FileShrunk`] instead of being re-read.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::constants::BACKSCAN_CHUNK;
use crate::error::{LogviewError, Result};

/// A complete line and its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailLine {
    pub number: u64,
    pub text: String,
}

/// Position of the reader in the file. Only mutated by [`TailReader::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailState {
    pub path: PathBuf,
    /// Offset just past the last newline handed out. Never above
    /// `last_observed_size`.
    pub consumed_offset: u64,
    /// File size measured by the last observation; the shrink check
    /// compares against this.
    pub last_observed_size: u64,
    pub last_line_number: u64,
}

/// Lines found by one poll plus the state to commit once they are printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailBatch {
    pub lines: Vec<TailLine>,
    pub consumed_offset: u64,
    pub observed_size: u64,
    pub last_line_number: u64,
}

#[derive(Debug)]
pub struct TailReader {
    state: TailState,
    max_line_length: usize,
}

struct BoundedLine {
    text: String,
    /// Bytes consumed from the reader, newline included.
    consumed: u64,
    terminated: bool,
}

/// Reads one line keeping at most `max_len` bytes of it. The rest of an
/// overlong line is consumed and dropped.
fn read_line_bounded<R: BufRead>(r: &mut R, max_len: usize) -> io::Result<Option<BoundedLine>> {
    let mut buf = Vec::with_capacity(4096.min(max_len));
    let mut consumed: u64 = 0;
    let mut truncated = false;
    let mut terminated = false;
    loop {
        let (used, found_newline) = {
            let chunk = r.fill_buf()?;
            if chunk.is_empty() {
                break;
            }
            let (part, used, found) = match chunk.iter().position(|&b| b == b'\n') {
                Some(i) => (&chunk[..i], i + 1, true),
                None => (chunk, chunk.len(), false),
            };
            let room = max_len.saturating_sub(buf.len());
            if part.len() > room {
                truncated = true;
            }
            buf.extend_from_slice(&part[..part.len().min(room)]);
            (used, found)
        };
        r.consume(used);
        consumed += used as u64;
        if found_newline {
            terminated = true;
            break;
        }
    }
    if consumed == 0 {
        return Ok(None);
    }
    if truncated {
        // Drop a multi-byte sequence cut in half by the length cap.
        if let Err(e) = std::str::from_utf8(&buf) {
            if e.error_len().is_none() {
                buf.truncate(e.valid_up_to());
            }
        }
    } else if terminated && buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(BoundedLine {
        text: String::from_utf8_lossy(&buf).into_owned(),
        consumed,
        terminated,
    }))
}

/// Offset just past the last newline before `size`, scanning backward so the
/// body of the file is never read. 0 when the file holds no newline.
fn last_line_end<R: Read + Seek>(r: &mut R, size: u64) -> io::Result<u64> {
    let mut chunk = vec![0u8; BACKSCAN_CHUNK];
    let mut end = size;
    while end > 0 {
        let start = end.saturating_sub(BACKSCAN_CHUNK as u64);
        let len = (end - start) as usize;
        r.seek(SeekFrom::Start(start))?;
        r.read_exact(&mut chunk[..len])?;
        if let Some(i) = chunk[..len].iter().rposition(|&b| b == b'\n') {
            return Ok(start + i as u64 + 1);
        }
        end = start;
    }
    Ok(0)
}

impl TailReader {
    /// Opens `path` and collects its last `tail_line_count` complete lines.
    ///
    /// A trailing line without newline is not returned; it shows up in a
    /// later poll once it is terminated.
    pub fn initialize(
        path: &Path,
        tail_line_count: usize,
        max_line_length: usize,
    ) -> Result<(Self, Vec<TailLine>)> {
        let mut file = File::open(path).map_err(|e| LogviewError::file_open(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| LogviewError::file_read(path, e))?
            .len();

        if tail_line_count == 0 {
            let baseline =
                last_line_end(&mut file, size).map_err(|e| LogviewError::file_read(path, e))?;
            debug!(path = %path.display(), size, baseline, "skipping history");
            let reader = Self::with_state(path, baseline, size, 0, max_line_length);
            return Ok((reader, Vec::new()));
        }

        // Lines appended after the size was measured wait for the first poll.
        let mut reader = BufReader::new(file.take(size));
        let mut window: VecDeque<TailLine> = VecDeque::with_capacity(tail_line_count.min(1024) + 1);
        let mut number: u64 = 0;
        let mut offset: u64 = 0;
        while let Some(line) = read_line_bounded(&mut reader, max_line_length)
            .map_err(|e| LogviewError::file_read(path, e))?
        {
            if !line.terminated {
                break;
            }
            number += 1;
            offset += line.consumed;
            window.push_back(TailLine {
                number,
                text: line.text,
            });
            if window.len() > tail_line_count {
                window.pop_front();
            }
        }
        debug!(
            path = %path.display(),
            size,
            lines = number,
            kept = window.len(),
            "initial tail read"
        );
        let tail = Self::with_state(path, offset, size, number, max_line_length);
        Ok((tail, window.into()))
    }

    fn with_state(
        path: &Path,
        offset: u64,
        size: u64,
        line_number: u64,
        max_line_length: usize,
    ) -> Self {
        Self {
            state: TailState {
                path: path.to_path_buf(),
                consumed_offset: offset,
                last_observed_size: size,
                last_line_number: line_number,
            },
            max_line_length,
        }
    }

    pub fn state(&self) -> &TailState {
        &self.state
    }

    /// Reads the complete lines appended since the last commit.
    ///
    /// Does not change the reader; pass the batch to [`commit`](Self::commit)
    /// once its lines have been emitted.
    pub fn poll(&self) -> Result<TailBatch> {
        let path = &self.state.path;
        let previous = self.state.last_observed_size;
        let offset = self.state.consumed_offset;

        let mut file = File::open(path).map_err(|e| LogviewError::file_open(path, e))?;
        let current = file
            .seek(SeekFrom::End(0))
            .map_err(|e| LogviewError::file_read(path, e))?;
        if current < previous {
            return Err(LogviewError::FileShrunk {
                path: path.clone(),
                previous,
                current,
            });
        }
        let mut batch = TailBatch {
            lines: Vec::new(),
            consumed_offset: offset,
            observed_size: current,
            last_line_number: self.state.last_line_number,
        };
        if current == previous {
            return Ok(batch);
        }

        // The window starts at any pending fragment, so it re-reads it.
        let delta = current - offset;
        trace!(previous, current, offset, delta, "file grew");
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| LogviewError::file_read(path, e))?;
        // Bytes appended after the size was measured wait for the next poll.
        let mut reader = BufReader::new(file.take(delta));

        while let Some(line) = read_line_bounded(&mut reader, self.max_line_length)
            .map_err(|e| LogviewError::file_read(path, e))?
        {
            if !line.terminated {
                trace!(pending = line.consumed, "partial line left for next poll");
                break;
            }
            batch.last_line_number += 1;
            batch.consumed_offset += line.consumed;
            batch.lines.push(TailLine {
                number: batch.last_line_number,
                text: line.text,
            });
        }
        Ok(batch)
    }

    /// Records a polled batch as emitted.
    pub fn commit(&mut self, batch: &TailBatch) {
        self.state.consumed_offset = batch.consumed_offset;
        self.state.last_observed_size = batch.observed_size;
        self.state.last_line_number = batch.last_line_number;
    }
}
