//! Request pipeline for the Palisade engine
//!
//! Composes the security layers into the order protected handlers run
//! under: network admission, permission resolution, the handler itself,
//! then row filtering, field decryption, and column masking on the
//! response path. The engine has no endpoint of its own; host request
//! handlers call [`RequestPipeline::execute`] in-process.
//!
//! ```ignore
//! use palisade_api::{ProtectedRequest, RequestPipeline, ResourceCapabilities, ResourceRegistry};
//!
//! let registry = ResourceRegistry::new().register(
//!     "employees",
//!     ResourceCapabilities::with_encrypted_fields(["ssn"]),
//! );
//! let pipeline = RequestPipeline::new(store, settings, cipher, registry);
//!
//! let request = ProtectedRequest::new(subject, "employees", "READ")
//!     .with_forwarded_for("203.0.113.7");
//! let records = pipeline.execute(&request, |subject| {
//!     // fetch candidate records for the tenant
//!     Ok(load_employees(&subject.tenant_id)?)
//! })?;
//! ```

mod error;
mod pipeline;
mod registry;

pub use error::{ApiError, Result, DENIED_MESSAGE};
pub use pipeline::{ProtectedRequest, RequestPipeline};
pub use registry::{ResourceCapabilities, ResourceRegistry};
