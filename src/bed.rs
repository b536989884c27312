//! The `BEDRecord` auxiliary entity.
//!
//! A line-oriented, tab-separated `<chrom>\t<start0>\t<end0>` record. Stored
//! internally as an inclusive 1-based interval (`start1 = start0 + 1`,
//! `end1 = end0`) per spec §6, but [`Display`](std::fmt::Display) round-trips
//! the original half-open 0-based text rather than the internal coordinates.

use std::{fmt, str::FromStr};

/// An inclusive, 1-based genomic interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start1: usize,
    pub end1: usize,
}

/// A single BED line: chromosome plus a half-open, 0-based interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedRecord {
    pub chrom: String,
    pub interval: Interval,
    start0: usize,
    end0: usize,
}

impl BedRecord {
    pub fn start0(&self) -> usize {
        self.start0
    }

    pub fn end0(&self) -> usize {
        self.end0
    }
}

impl FromStr for BedRecord {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.trim_end_matches(['\n', '\r']).splitn(4, '\t');
        let chrom = fields
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("BED line missing chrom field: {line:?}"))?
            .to_string();
        let start0: usize = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("BED line missing start field: {line:?}"))?
            .parse()?;
        let end0: usize = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("BED line missing end field: {line:?}"))?
            .parse()?;
        if start0 >= end0 {
            return Err(anyhow::anyhow!(
                "BED line has non-positive-length interval: {line:?}"
            ));
        }

        Ok(Self {
            chrom,
            interval: Interval {
                start1: start0 + 1,
                end1: end0,
            },
            start0,
            end0,
        })
    }
}

impl fmt::Display for BedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start0, self.end0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_half_open_zero_based_interval() {
        let record: BedRecord = "chr1\t99\t110".parse().unwrap();
        assert_eq!(record.chrom, "chr1");
        assert_eq!(record.interval, Interval { start1: 100, end1: 110 });
    }

    #[test]
    fn display_round_trips_original_text() {
        let original = "chr1\t99\t110";
        let record: BedRecord = original.parse().unwrap();
        assert_eq!(record.to_string(), original);
    }

    #[test]
    fn rejects_empty_interval() {
        assert!("chr1\t99\t99".parse::<BedRecord>().is_err());
    }

    #[test]
    fn rejects_missing_fields() {
        assert!("chr1\t99".parse::<BedRecord>().is_err());
    }
}
