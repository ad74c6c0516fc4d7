//! # Archivum Configuration Library
//!
//! Configuration shared by the archivum query core and its tools:
//! request size limits enforced before parsing, and the names of the
//! precomputed ancestry fields the compiler targets.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use archivum_config::ArchivumConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ArchivumConfig::load(None)?;
//!     println!("max request size: {}", config.limits.max_request_size);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ancestry;
mod error;
mod limits;
mod loader;

pub use ancestry::*;
pub use error::*;
pub use limits::*;
pub use loader::*;
