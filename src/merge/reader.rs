//! N-way synchronized reader: aligns records from N ordered sources by
//! `(rid, pos, ref, alts)` and yields them one shared-position batch at a
//! time.

use std::io::BufRead;

use indexmap::IndexMap;
use noodles_vcf::{self as vcf};

use crate::err::MergeError;
use crate::vcf::VariantRecord;

/// Whether a source carries raw per-sample evidence or has already been
/// folded into the aggregated `NSAMPLES`/`SAMPLES`/`E`/`N` info shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Single { sample_name: String },
    Aggregated,
}

/// Classify a source's header as `SINGLE` or `AGGREGATED` (§4.2).
pub fn classify_source(header: &vcf::Header) -> Option<SourceKind> {
    let n_samples = header.sample_names().len();
    if header.infos().contains_key("NSAMPLES") && n_samples == 0 {
        Some(SourceKind::Aggregated)
    } else if header.formats().contains_key("E") && n_samples == 1 {
        Some(SourceKind::Single {
            sample_name: header
                .sample_names()
                .iter()
                .next()
                .expect("checked n_samples == 1")
                .clone(),
        })
    } else {
        None
    }
}

/// The sort key the N-way reader batches records by: `(rid, pos, ref, alts)`.
type RecordKey = (usize, usize, String, Vec<String>);

fn record_key(
    path: &str,
    record: &VariantRecord,
    contig_index: &IndexMap<String, usize>,
) -> Result<RecordKey, MergeError> {
    let chrom = record.reference_sequence_name().to_string();
    let rid = *contig_index
        .get(chrom.as_str())
        .ok_or_else(|| MergeError::UnknownContig {
            path: path.to_string(),
            contig: chrom.clone(),
        })?;
    Ok((
        rid,
        record.start1(),
        record.reference_bases().to_string(),
        record.alternate_bases(),
    ))
}

struct Source {
    path: String,
    kind: SourceKind,
    reader: vcf::reader::Reader<Box<dyn BufRead>>,
    header: vcf::Header,
    pending: Option<(RecordKey, VariantRecord)>,
}

impl Source {
    fn advance(&mut self, contig_index: &IndexMap<String, usize>) -> Result<(), anyhow::Error> {
        let mut record_buf = vcf::variant::RecordBuf::default();
        let bytes_read = self
            .reader
            .read_record_buf(&self.header, &mut record_buf)
            .map_err(|e| anyhow::anyhow!("problem reading record from {}: {}", &self.path, e))?;
        if bytes_read == 0 {
            self.pending = None;
            return Ok(());
        }
        let record: VariantRecord = record_buf.into();
        let key = record_key(&self.path, &record, contig_index)?;
        self.pending = Some((key, record));
        Ok(())
    }
}

/// One source's metadata, as surfaced to the aggregator — the sample name
/// (for `SINGLE`) it needs to build the `SAMPLES` list.
pub struct SourceInfo {
    pub path: String,
    pub kind: SourceKind,
}

/// Reads N ordered sources in lockstep, yielding one batch per shared
/// `(rid, pos, ref, alts)` key across however many sources currently carry
/// a record at that key.
pub struct NWayReader {
    sources: Vec<Source>,
    contig_index: IndexMap<String, usize>,
}

impl NWayReader {
    /// Open every path in `paths`, classify each source, and build the
    /// shared contig index from the first source's header (§6: "contig
    /// lines are copied from the first source").
    pub fn open(paths: &[String]) -> Result<Self, anyhow::Error> {
        if paths.is_empty() {
            anyhow::bail!("merge requires at least one input source");
        }

        let mut sources = Vec::with_capacity(paths.len());
        let mut contig_index = IndexMap::new();

        for (i, path) in paths.iter().enumerate() {
            let reader_inner = crate::common::io::open_read_maybe_gz(path)
                .map_err(|e| anyhow::anyhow!("could not open source {}: {}", path, e))?;
            let mut reader = vcf::reader::Builder::default()
                .build_from_reader(reader_inner)
                .map_err(|e| anyhow::anyhow!("could not build VCF reader for {}: {}", path, e))?;
            let header = reader
                .read_header()
                .map_err(|e| anyhow::anyhow!("problem reading header of {}: {}", path, e))?;

            let kind = classify_source(&header)
                .ok_or_else(|| MergeError::UnclassifiableSource { path: path.clone() })?;

            if i == 0 {
                contig_index = crate::vcf::contig_index_map(&header);
            }

            sources.push(Source {
                path: path.clone(),
                kind,
                reader,
                header,
                pending: None,
            });
        }

        let mut reader = Self {
            sources,
            contig_index,
        };
        for i in 0..reader.sources.len() {
            reader.sources[i].advance(&reader.contig_index)?;
        }
        Ok(reader)
    }

    pub fn source_infos(&self) -> Vec<SourceInfo> {
        self.sources
            .iter()
            .map(|s| SourceInfo {
                path: s.path.clone(),
                kind: s.kind.clone(),
            })
            .collect()
    }

    pub fn first_header(&self) -> &vcf::Header {
        &self.sources[0].header
    }

    /// Pull the next batch of records sharing the minimum pending key across
    /// all sources, advancing each contributing source by one record.
    /// Returns `None` once every source is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<Vec<(usize, VariantRecord)>>, anyhow::Error> {
        let min_key = self
            .sources
            .iter()
            .filter_map(|s| s.pending.as_ref().map(|(key, _)| key.clone()))
            .min();
        let Some(min_key) = min_key else {
            return Ok(None);
        };

        let mut batch = Vec::new();
        for i in 0..self.sources.len() {
            let matches = self.sources[i]
                .pending
                .as_ref()
                .map(|(key, _)| *key == min_key)
                .unwrap_or(false);
            if matches {
                let (_, record) = self.sources[i].pending.take().expect("just checked Some");
                batch.push((i, record));
                self.sources[i].advance(&self.contig_index)?;
            }
        }

        Ok(Some(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_vcf(path: &std::path::Path, lines: &str) {
        std::fs::write(path, lines).unwrap();
    }

    #[test]
    fn classifies_single_and_aggregated_sources() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();

        let single_path = tmp_dir.join("single.vcf");
        write_vcf(
            &single_path,
            "##fileformat=VCFv4.2\n\
             ##contig=<ID=chr1>\n\
             ##FORMAT=<ID=E,Number=1,Type=Integer,Description=\"evidence\">\n\
             ##FORMAT=<ID=N,Number=1,Type=Integer,Description=\"depth\">\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
             chr1\t100\t.\tA\tC\t40\t.\t.\tE:N\t5:10\n",
        );

        let aggregated_path = tmp_dir.join("aggregated.vcf");
        write_vcf(
            &aggregated_path,
            "##fileformat=VCFv4.2\n\
             ##contig=<ID=chr1>\n\
             ##INFO=<ID=NSAMPLES,Number=1,Type=Integer,Description=\"n\">\n\
             ##INFO=<ID=E,Number=.,Type=Integer,Description=\"e\">\n\
             ##INFO=<ID=N,Number=.,Type=Integer,Description=\"n\">\n\
             ##INFO=<ID=SAMPLES,Number=.,Type=String,Description=\"s\">\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
             chr1\t100\t.\tA\tC\t35\t.\tNSAMPLES=2;E=3,4;N=8,9;SAMPLES=S2,S3\n",
        );

        let reader = NWayReader::open(&[
            single_path.to_str().unwrap().to_string(),
            aggregated_path.to_str().unwrap().to_string(),
        ])?;

        let infos = reader.source_infos();
        assert_eq!(
            infos[0].kind,
            SourceKind::Single {
                sample_name: "S1".to_string()
            }
        );
        assert_eq!(infos[1].kind, SourceKind::Aggregated);

        Ok(())
    }

    #[test]
    fn batches_records_sharing_a_position() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();

        let a_path = tmp_dir.join("a.vcf");
        write_vcf(
            &a_path,
            "##fileformat=VCFv4.2\n\
             ##contig=<ID=chr1>\n\
             ##FORMAT=<ID=E,Number=1,Type=Integer,Description=\"evidence\">\n\
             ##FORMAT=<ID=N,Number=1,Type=Integer,Description=\"depth\">\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
             chr1\t100\t.\tA\tC\t40\t.\t.\tE:N\t5:10\n",
        );

        let b_path = tmp_dir.join("b.vcf");
        write_vcf(
            &b_path,
            "##fileformat=VCFv4.2\n\
             ##contig=<ID=chr1>\n\
             ##FORMAT=<ID=E,Number=1,Type=Integer,Description=\"evidence\">\n\
             ##FORMAT=<ID=N,Number=1,Type=Integer,Description=\"depth\">\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS2\n\
             chr1\t100\t.\tA\tC\t10\t.\t.\tE:N\t1:2\n\
             chr1\t200\t.\tG\tT\t20\t.\t.\tE:N\t2:3\n",
        );

        let mut reader = NWayReader::open(&[
            a_path.to_str().unwrap().to_string(),
            b_path.to_str().unwrap().to_string(),
        ])?;

        let batch1 = reader.next_batch()?.expect("first batch");
        assert_eq!(batch1.len(), 2);

        let batch2 = reader.next_batch()?.expect("second batch");
        assert_eq!(batch2.len(), 1);
        assert_eq!(batch2[0].0, 1);

        assert!(reader.next_batch()?.is_none());

        Ok(())
    }
}
