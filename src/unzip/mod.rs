//! Serving paths inside archives: resolution, location, and the data
//! produced for each kind of entry.
//!
//! A request flows resolver -> locator -> [`ZipArchive`](crate::zip::ZipArchive)
//! lookup -> either a file stream or a [`DirectoryListing`]. Every step is
//! request-scoped; nothing is cached between requests.

pub mod listing;
pub mod locator;
pub mod media_type;
pub mod resolver;
mod service;

pub use listing::{Breadcrumb, ChildEntry, DirectoryListing, format_size_si};
pub use locator::{LocatedEntry, locate};
pub use media_type::MediaTypes;
pub use resolver::{Rejected, ResolvedPath, resolve};
pub use service::{FileContent, Outcome, Unzipper};
