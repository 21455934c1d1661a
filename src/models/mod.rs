//! Data Models
//!
//! Entities of the analysis pipeline: lifecycle state, snapshot payloads
//! and their derived sub-records, parsed audit content, and the composed
//! detail view.

pub mod analysis;
pub mod detail;
pub mod result;
pub mod snapshot;

pub use analysis::*;
pub use detail::*;
pub use result::*;
pub use snapshot::*;
