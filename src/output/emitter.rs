//! CSV record writer and error sink
//!
//! The emitter is the only consumer of the result and error channels. It
//! runs on the task that called `Crawler::crawl`, so sinks can be borrowed
//! writers such as `&mut Vec<u8>` or a locked stdout.

use crate::crawler::Link;
use crate::PageError;
use std::io::Write;
use tokio::sync::mpsc;

/// Column names of the output CSV
pub const CSV_HEADER: [&str; 5] = ["Depth", "Url", "Text", "Title", "Content"];

/// What the emitter wrote over one crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitterCounts {
    /// Records successfully written to the output sink
    pub records: u64,

    /// Errors received on the error channel
    pub errors: u64,
}

/// Writes link records as CSV rows and errors as plain lines
pub struct ResultEmitter<W: Write, E: Write> {
    records: csv::Writer<W>,
    errors: E,
    counts: EmitterCounts,
}

impl<W: Write, E: Write> ResultEmitter<W, E> {
    pub fn new(output: W, errors: E) -> Self {
        Self {
            records: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(output),
            errors,
            counts: EmitterCounts::default(),
        }
    }

    /// Writes and flushes the header row
    ///
    /// Unlike row failures, a header failure is returned to the caller.
    pub fn write_header(&mut self) -> Result<(), csv::Error> {
        self.records.write_record(CSV_HEADER)?;
        self.records.flush()?;
        Ok(())
    }

    /// Writes one record, logging (not returning) failures
    pub fn write_link(&mut self, link: &Link) {
        let depth = link.depth.to_string();
        let row = [
            depth.as_str(),
            link.url.as_str(),
            link.text.as_str(),
            link.title.as_deref().unwrap_or(""),
            link.content.as_deref().unwrap_or(""),
        ];

        let result = self
            .records
            .write_record(row)
            .and_then(|()| self.records.flush().map_err(csv::Error::from));

        match result {
            Ok(()) => self.counts.records += 1,
            Err(e) => tracing::warn!("Failed to write record for {}: {}", link.url, e),
        }
    }

    /// Writes one error line
    pub fn write_error(&mut self, error: &PageError) {
        self.counts.errors += 1;
        if let Err(e) = writeln!(self.errors, "{}", error).and_then(|()| self.errors.flush()) {
            tracing::warn!("Failed to write error line: {}", e);
        }
    }

    /// Drains both channels until they are closed
    ///
    /// Records and errors are each written in the order they were sent.
    pub async fn drain(
        &mut self,
        mut links: mpsc::Receiver<Link>,
        mut errors: mpsc::Receiver<PageError>,
    ) -> EmitterCounts {
        let mut links_open = true;
        let mut errors_open = true;

        while links_open || errors_open {
            tokio::select! {
                link = links.recv(), if links_open => match link {
                    Some(link) => self.write_link(&link),
                    None => links_open = false,
                },
                error = errors.recv(), if errors_open => match error {
                    Some(error) => self.write_error(&error),
                    None => errors_open = false,
                },
            }
        }

        tracing::debug!(
            "Emitter done: {} records, {} errors",
            self.counts.records,
            self.counts.errors
        );
        self.counts
    }

    pub fn counts(&self) -> EmitterCounts {
        self.counts
    }
}
