//! I/O adapters: wiki scraping, page cache, spreadsheets.

pub mod cache;
pub mod spreadsheet;
pub mod wiki;
