use std::{
    num::ParseIntError,
    process::{ExitCode, Termination},
};

/// Fatal errors raised by the `consolidate` subcommand.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConsolidateError {
    /// The input stream violated the non-decreasing `(rid, pos)` ordering contract.
    #[error("{path}: unordered input at {chrom}:{position}: record precedes a record already in the buffer")]
    UnorderedInput {
        path: String,
        chrom: String,
        position: usize,
    },
    /// A record referenced a contig absent from the input header.
    #[error("unknown contig {0:?}")]
    UnknownContig(String),
}

impl Termination for ConsolidateError {
    fn report(self) -> ExitCode {
        ExitCode::from(1)
    }
}

/// Fatal errors raised by the `merge` subcommand.
#[derive(thiserror::Error, Debug, Clone)]
pub enum MergeError {
    /// A source's header declared neither the `SINGLE` nor the `AGGREGATED` shape.
    #[error("source {path:?} is neither SINGLE (one sample, FORMAT/E,N) nor AGGREGATED (no samples, INFO/NSAMPLES)")]
    UnclassifiableSource { path: String },
    /// A source advertised a field in its header but a record failed to carry it.
    #[error("source {path:?} is missing required field {field:?} on a record it should carry it on")]
    MissingRequiredField { path: String, field: String },
    /// A record referenced a contig absent from the shared contig index (built
    /// from the first source's header).
    #[error("source {path:?} has record on contig {contig:?} unknown to the first source's header")]
    UnknownContig { path: String, contig: String },
}

impl Termination for MergeError {
    fn report(self) -> ExitCode {
        ExitCode::from(1)
    }
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum ArgError {
    #[error("Invalid format in interval")]
    IntervalInvalidFormat,
    #[error("Invalid integer coordinates in interval")]
    IntervalInvalidInts(#[from] ParseIntError),
}
