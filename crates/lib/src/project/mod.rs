//! Project descriptions.
//!
//! A [`ProjectDescriptor`] is the caller-supplied, read-only description of what to
//! build: where the sources live, how dependencies are declared, which runtime the
//! image targets and how the job is launched.
//!
//! The descriptor is not modified by the build pipeline; the single side effect on
//! the project is the entrypoint wrapper written into its source tree by
//! [`crate::recipe::compose`].

mod types;

pub use types::*;
