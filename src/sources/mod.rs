//! Runtime release sources.
//!
//! Sources provide upstream release metadata. The resolver matches it
//! against the requested targets and minor versions.

pub mod errors;
pub mod remote;
pub mod resolver;
pub mod source;

pub use errors::ResolveError;
pub use remote::{RemoteReleaseSource, DEFAULT_RELEASE_URL};
pub use resolver::{resolve_release, VersionResolver, DEFAULT_MINOR_COUNT};
pub use source::{Asset, Release, ReleaseSource};
