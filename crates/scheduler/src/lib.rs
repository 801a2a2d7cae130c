//! Overtype Scheduler Library
//!
//! Cooperative invalidation primitives for the editor's async collaborators.
//!
//! Rasterization and document loading complete out of band, so their results
//! can arrive after the session has already moved on to a new zoom level or a
//! new document. This crate provides the two guards the rest of the workspace
//! uses to discard such stale work:
//!
//! - [`CancellationToken`] lets an in-flight render job stop early once it
//!   has been superseded.
//! - [`Epoch`] and [`Stamp`] let a completed result prove it still belongs
//!   to the active document/zoom generation before it is applied.

mod cancel;
mod epoch;

pub use cancel::CancellationToken;
pub use epoch::{Epoch, Stamp};
