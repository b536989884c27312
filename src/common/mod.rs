//! Common functionality shared by the `consolidate` and `merge` subcommands.

use std::str::FromStr;

use byte_unit::Byte;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

use crate::err::ArgError;

pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Helper to print the current memory resident set size via `tracing`.
pub fn trace_rss_now() {
    let me = procfs::process::Process::myself().unwrap();
    let page_size = procfs::page_size();
    tracing::debug!(
        "RSS now: {}",
        Byte::from_bytes((me.stat().unwrap().rss * page_size) as u128).get_appropriate_unit(true)
    );
}

/// The version of the `vtconsolidate` package.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Return the crate version, pinned to `x.y.z` in tests so snapshots stay stable.
pub fn worker_version() -> &'static str {
    if cfg!(test) {
        "x.y.z"
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// A `-i`/`-I` region restriction: a chromosome, optionally narrowed to a
/// 1-based inclusive sub-range. `samtools`-style `chrom`, `chrom:beg-end`, or
/// `chrom:beg-` syntax.
///
/// Per spec §1 this is treated as an external collaborator's concern — the
/// consolidator and merger only ever ask "does this record's position fall
/// inside one of the given regions", never anything about interval semantics
/// beyond that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeInterval {
    pub chrom: String,
    pub beg1: Option<usize>,
    pub end1: Option<usize>,
}

impl FromStr for GenomeInterval {
    type Err = ArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((chrom, range)) = s.split_once(':') else {
            return Ok(Self {
                chrom: s.to_string(),
                beg1: None,
                end1: None,
            });
        };
        let (beg, end) = range
            .split_once('-')
            .ok_or(ArgError::IntervalInvalidFormat)?;
        let beg1 = if beg.is_empty() { None } else { Some(beg.parse()?) };
        let end1 = if end.is_empty() { None } else { Some(end.parse()?) };
        Ok(Self {
            chrom: chrom.to_string(),
            beg1,
            end1,
        })
    }
}

impl GenomeInterval {
    fn contains(&self, chrom: &str, pos1: usize) -> bool {
        self.chrom == chrom
            && self.beg1.map_or(true, |beg1| pos1 >= beg1)
            && self.end1.map_or(true, |end1| pos1 <= end1)
    }
}

/// Parse the `-i <str>` comma-separated list and `-I <path>` list-file of
/// regions into a combined, flat list, tilde-expanding the list file path.
pub fn parse_intervals(
    intervals: Option<&str>,
    interval_list: Option<&str>,
) -> Result<Vec<GenomeInterval>, anyhow::Error> {
    let mut out = Vec::new();

    if let Some(csv) = intervals {
        for part in csv.split(',').filter(|s| !s.is_empty()) {
            out.push(part.parse()?);
        }
    }

    if let Some(path) = interval_list {
        let path = shellexpand::tilde(path);
        for line in io::read_lines(path.into_owned())? {
            let line = line?;
            let line = line.trim();
            if !line.is_empty() {
                out.push(line.parse()?);
            }
        }
    }

    Ok(out)
}

/// Whether `(chrom, pos1)` lies in at least one of `regions`. An empty
/// `regions` list imposes no restriction (matches every position) — this is
/// the common case of no `-i`/`-I` given on the command line.
pub fn region_matches(regions: &[GenomeInterval], chrom: &str, pos1: usize) -> bool {
    regions.is_empty() || regions.iter().any(|region| region.contains(chrom, pos1))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn trace_rss_now_smoke() {
        super::trace_rss_now();
    }

    #[test]
    fn worker_version_in_test_is_pinned() {
        assert_eq!(super::worker_version(), "x.y.z");
    }

    #[test]
    fn parses_bare_chromosome() {
        let interval: GenomeInterval = "chr1".parse().unwrap();
        assert_eq!(interval.beg1, None);
        assert_eq!(interval.end1, None);
        assert!(interval.contains("chr1", 1));
        assert!(interval.contains("chr1", 1_000_000));
        assert!(!interval.contains("chr2", 1));
    }

    #[test]
    fn parses_bounded_range() {
        let interval: GenomeInterval = "chr1:100-200".parse().unwrap();
        assert!(!interval.contains("chr1", 99));
        assert!(interval.contains("chr1", 100));
        assert!(interval.contains("chr1", 200));
        assert!(!interval.contains("chr1", 201));
    }

    #[test]
    fn parses_open_ended_range() {
        let interval: GenomeInterval = "chr1:100-".parse().unwrap();
        assert!(interval.contains("chr1", 100));
        assert!(interval.contains("chr1", 1_000_000));
        assert!(!interval.contains("chr1", 99));
    }

    #[test]
    fn empty_region_list_matches_everything() {
        assert!(region_matches(&[], "chr1", 42));
    }

    #[test]
    fn rejects_malformed_range() {
        assert!("chr1:100".parse::<GenomeInterval>().is_err());
    }

    #[test]
    fn parse_intervals_combines_csv_and_file() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("intervals.txt");
        std::fs::write(&path, "chr2:1-100\nchr3\n")?;

        let combined = parse_intervals(
            Some("chr1:1-50"),
            Some(path.to_str().expect("valid utf8 path")),
        )?;

        assert_eq!(combined.len(), 3);
        assert_eq!(combined[0].chrom, "chr1");
        assert_eq!(combined[1].chrom, "chr2");
        assert_eq!(combined[2].chrom, "chr3");

        Ok(())
    }
}
