#![forbid(unsafe_code)]

//! User-facing operators over a matte session.
//!
//! This is the only crate that talks to host services, always through the
//! capability traits in [`host`]. Every operator obeys one propagation rule:
//! failures become a `tracing` warning plus [`OpStatus::Cancelled`] — nothing
//! ever escapes into the host's dispatch loop.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod host;
pub mod session;

pub use host::{HostPurge, ImageIo, LoadedImage, PlaneFactory};
pub use session::{OpStatus, Session};
