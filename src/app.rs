//! Poll loop: print the initial tail, then follow the file until an error.

use std::future::Future;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::error::{LogviewError, Result};
use crate::highlight::render_numbered;
use crate::tail::{TailLine, TailReader};

const BANNER_RULE: &str = "------------------------------------------------------------";

pub struct App<'a, W: Write> {
    config: &'a Config,
    tail: TailReader,
    out: W,
}

impl<'a, W: Write> App<'a, W> {
    /// Prints the banner and the last `tail_line_count` lines of `path`.
    pub fn start(path: &Path, config: &'a Config, mut out: W) -> Result<Self> {
        writeln!(out, "{BANNER_RULE}").map_err(LogviewError::output)?;
        writeln!(out, "{:^60}", "logview").map_err(LogviewError::output)?;
        writeln!(out, "{BANNER_RULE}").map_err(LogviewError::output)?;

        let (tail, lines) =
            TailReader::initialize(path, config.tail_line_count, config.max_line_length)?;
        let mut app = Self { config, tail, out };
        app.emit(&lines)?;
        app.out.flush().map_err(LogviewError::output)?;
        Ok(app)
    }

    fn emit(&mut self, lines: &[TailLine]) -> Result<()> {
        for line in lines {
            let rendered = render_numbered(&line.text, line.number, self.config);
            writeln!(self.out, "{rendered}").map_err(LogviewError::output)?;
        }
        if !lines.is_empty() {
            self.out.flush().map_err(LogviewError::output)?;
        }
        Ok(())
    }

    /// One poll cycle. The new size is committed only after every line of
    /// the batch was written.
    pub fn poll_once(&mut self) -> Result<usize> {
        let batch = self.tail.poll()?;
        self.emit(&batch.lines)?;
        self.tail.commit(&batch);
        Ok(batch.lines.len())
    }

    /// Sleeps and polls forever; only returns on a fatal error.
    pub async fn run(mut self) -> Result<()> {
        let interval = self.config.poll_interval();
        debug!(?interval, path = %self.tail.state().path.display(), "following");
        loop {
            tokio::time::sleep(interval).await;
            let count = self.poll_once()?;
            if count > 0 {
                debug!(
                    count,
                    offset = self.tail.state().consumed_offset,
                    "printed new lines"
                );
            }
        }
    }
}

/// Starts following `path` and keeps going until `interrupt` resolves.
///
/// The interrupt is polled first, before the startup tail is read. Returns
/// `Ok(())` only when interrupted; every other way out is an error.
pub async fn follow<W, F>(path: &Path, config: &Config, out: W, interrupt: F) -> Result<()>
where
    W: Write,
    F: Future,
{
    let following = async { App::start(path, config, out)?.run().await };
    tokio::select! {
        biased;
        _ = interrupt => Ok(()),
        result = following => result,
    }
}
