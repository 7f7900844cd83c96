//! Timezone enrichment gateway (EMBP).
//!
//! - `registry`: the lookup collaborator trait and its error type
//! - `info`: the `TimezoneInfo` value the registry hands back
//! - `convert`: payload traversal that rewrites timestamp fields
//! - `enrich`: fail-open enrichment, the generic wrapper, and the
//!   synchronous metadata decorator
//! - `pg_registry` / `http_registry`: concrete registries

mod convert;
mod enrich;
mod http_registry;
mod info;
mod pg_registry;
mod registry;

#[cfg(test)]
mod testing;

pub use convert::{convert_payload, parse_utc, to_local_rfc3339, DEFAULT_TIMESTAMP_FIELDS};
pub use enrich::{attach_timezone_metadata, ExperimentArg, TimezoneEnricher};
pub use http_registry::HttpTimezoneRegistry;
pub use info::TimezoneInfo;
pub use pg_registry::PgTimezoneRegistry;
pub use registry::{RegistryError, TimezoneRegistry};
