//! # zipserve
//!
//! Serve files and directory listings that live inside zip archives, as if
//! the archive contents were part of the filesystem.
//!
//! Archives sit directly under a root directory. A request such as
//! `run-2017.zip/logs/server/stdout.txt` is checked against two independent
//! boundaries: the path must resolve strictly inside the root, and its first
//! segment must name an archive there. The rest of the path is looked up in
//! the archive's central directory and answered with either the entry's
//! bytes, streamed and decompressed on the fly, or a listing of a virtual
//! directory.
//!
//! ## Features
//!
//! - Path traversal defense at both the filesystem and the archive level
//! - Explicit and implicit directories, including the archive root
//! - STORED and DEFLATE entries, ZIP64 archives, CRC-32 verification
//! - Bounded-memory streaming; archives are never loaded whole
//! - HTML and JSON directory listings
//!
//! ## Example
//!
//! ```no_run
//! use zipserve::{Outcome, UnzipConfig, Unzipper};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let unzipper = Unzipper::new(UnzipConfig::new("/srv/results", "zip")?);
//!
//!     match unzipper.handle("run.zip/logs").await? {
//!         Outcome::Listing(listing) => {
//!             for child in &listing.children {
//!                 println!("{}", child.full_path);
//!             }
//!         }
//!         Outcome::File(content) => println!("{} bytes", content.size),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod io;
pub mod unzip;
pub mod zip;

pub use cli::Cli;
pub use config::UnzipConfig;
pub use error::{ConfigError, UnzipError};
pub use crate::io::{LocalFileReader, ReadAt};
pub use unzip::{DirectoryListing, Outcome, Unzipper};
pub use crate::zip::{ZipArchive, ZipFileEntry};
