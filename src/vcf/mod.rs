//! Thin adapters around the opaque variant record format.
//!
//! The rest of the crate never touches `noodles_vcf` types directly outside
//! of this module; everything the consolidation and merge engines need is
//! exposed through [`record::VariantRecord`] and [`classify::VariantKind`].

pub mod classify;
pub mod record;

pub use classify::{classify, VariantKind};
pub use record::{contig_index_map, VariantRecord};
