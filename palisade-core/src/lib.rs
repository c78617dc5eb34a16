//! Shared types for the Palisade access-control engine
//!
//! This crate holds the primitives every other Palisade crate builds on:
//!
//! - [`Subject`]: the resolved request identity with materialized org-unit
//!   membership (direct units plus ancestor closure)
//! - [`OrgHierarchy`]: org-unit parent links with write-time cycle
//!   rejection, used to materialize subjects
//! - [`Record`]: the attribute-map shape candidate records take at the
//!   security boundary
//! - [`Error`]: the shared error taxonomy (validation, not-found,
//!   configuration)
//!
//! Evaluation crates (`palisade-policy`, `palisade-admission`) are
//! stateless over these types; nothing here performs I/O.

pub mod error;
pub mod org;
pub mod record;
pub mod subject;

pub use error::{Error, Result};
pub use org::OrgHierarchy;
pub use record::{as_record, str_attr, Record};
pub use subject::Subject;
