//! The pager owns the database file and the in-memory page cache.
//!
//! Pages are loaded lazily on first access and stay resident until the
//! table closes. There is no dirty tracking: every resident page is
//! written back on close, so the file always consists of whole pages.

use super::btree::Node;
use crate::errors::Error;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, trace};

/// Page size 4 kilobytes because it's the same size as a page used in
/// the virtual memory systems of most computer architectures.
pub const PAGE_SIZE: usize = 4096;

pub const TABLE_MAX_PAGES: usize = 100;

pub struct Pager {
    file: File,
    file_length: u64,
    num_pages: u32,
    pages: heapless::Vec<Option<Node>, TABLE_MAX_PAGES>,
}

impl Pager {
    /// Opens or creates the database file and sizes the page count from
    /// its length. A length that is not a whole number of pages means the
    /// file was not produced by a clean close.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let file_length = file.seek(SeekFrom::End(0))?;
        if file_length % PAGE_SIZE as u64 != 0 {
            return Err(err!(
                Storage,
                "Db file is not a whole number of pages. Corrupt file."
            ));
        }
        let num_pages = (file_length / PAGE_SIZE as u64) as u32;

        debug!(
            path = %path.display(),
            file_length,
            num_pages,
            "Opened database file."
        );

        Ok(Pager {
            file,
            file_length,
            num_pages,
            pages: heapless::Vec::new(),
        })
    }

    /// Pages allocated so far, on disk or in memory.
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// For now, we're assuming that in a database with N pages, page
    /// numbers 0 through N-1 are allocated. Therefore we can always
    /// allocate page number N for new pages. Eventually after we
    /// implement deletion, some pages may become empty and their page
    /// numbers unused, and we could re-allocate those free pages.
    pub fn get_unused_page_num(&self) -> u32 {
        self.num_pages
    }

    fn ensure_loaded(&mut self, page_num: u32) -> Result<(), Error> {
        if page_num as usize >= TABLE_MAX_PAGES {
            return Err(err!(
                Storage,
                "Tried to fetch page number out of bounds. {} >= {}",
                page_num,
                TABLE_MAX_PAGES
            ));
        }

        while self.pages.len() <= page_num as usize {
            if self.pages.push(None).is_err() {
                return Err(err!(Storage, "Page cache full at page {}", page_num));
            }
        }
        if self.pages[page_num as usize].is_some() {
            return Ok(());
        }

        let mut node = Node::new();

        let mut pages_on_disk = self.file_length / PAGE_SIZE as u64;
        if self.file_length % PAGE_SIZE as u64 != 0 {
            pages_on_disk += 1;
        }
        if (page_num as u64) < pages_on_disk {
            self.file
                .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
            // A short read at the end of the file leaves the rest zeroed.
            let buf = node.as_bytes_mut();
            let mut filled = 0;
            while filled < PAGE_SIZE {
                let n = self.file.read(&mut buf[filled..])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            trace!(page_num, bytes = filled, "Read page from disk.");
        }

        self.pages[page_num as usize] = Some(node);
        if page_num >= self.num_pages {
            self.num_pages = page_num + 1;
        }
        Ok(())
    }

    /// The node on page `page_num`, loading it from disk if needed.
    pub fn page(&mut self, page_num: u32) -> Result<&Node, Error> {
        self.ensure_loaded(page_num)?;
        self.pages[page_num as usize]
            .as_ref()
            .ok_or_else(|| err!(Storage, "Memory page {} not found.", page_num))
    }

    pub fn page_mut(&mut self, page_num: u32) -> Result<&mut Node, Error> {
        self.ensure_loaded(page_num)?;
        self.pages[page_num as usize]
            .as_mut()
            .ok_or_else(|| err!(Storage, "Memory page {} not found.", page_num))
    }

    /// Writes one resident page back to its slot in the file. Whole
    /// pages only, never a partial tail.
    pub fn flush(&mut self, page_num: u32) -> Result<(), Error> {
        let node = match self.pages.get(page_num as usize) {
            Some(Some(node)) => node,
            _ => {
                return Err(err!(
                    Storage,
                    "Tried to flush a page that is not in memory. page_num={}",
                    page_num
                ));
            }
        };

        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(node.as_bytes())?;
        trace!(page_num, "Flushed page.");
        Ok(())
    }

    /// Writes every resident page. Pages that were never touched are
    /// still intact on disk and are skipped.
    pub fn flush_all(&mut self) -> Result<(), Error> {
        let mut flushed = 0;
        for page_num in 0..self.num_pages {
            if matches!(self.pages.get(page_num as usize), Some(Some(_))) {
                self.flush(page_num)?;
                flushed += 1;
            }
        }
        info!("Flushed {} pages.", flushed);
        Ok(())
    }
}
