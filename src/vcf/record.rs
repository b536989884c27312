//! Thin wrapper over `noodles_vcf`'s owned record buffer.
//!
//! The consolidation and merge engines never touch `RecordBuf` directly;
//! everything they need — reading chrom/pos/alleles, reading and writing
//! integer/string info fields, reading per-sample format integers, and
//! setting filter ids — goes through [`VariantRecord`]. This mirrors the
//! teacher's pattern of keeping `noodles_vcf` access behind small, typed
//! helpers rather than threading `record_buf::info::field::Value` matches
//! throughout the engine.

use indexmap::IndexMap;
use noodles_vcf::{
    self as vcf,
    variant::{
        record_buf::{
            info::field::{value::Array, Value},
            AlternateBases, Info,
        },
        RecordBuf,
    },
};

/// Maps a contig name (as it appears in `CHROM`) to its 0-based position in
/// the header's contig declaration order — the `rid` of the data model.
pub fn contig_index_map(header: &vcf::Header) -> IndexMap<String, usize> {
    header
        .contigs()
        .keys()
        .enumerate()
        .map(|(rid, name)| (name.clone(), rid))
        .collect()
}

/// An owned variant record plus the handful of operations the engines use.
#[derive(Debug, Clone)]
pub struct VariantRecord {
    inner: RecordBuf,
}

impl From<RecordBuf> for VariantRecord {
    fn from(inner: RecordBuf) -> Self {
        Self { inner }
    }
}

impl VariantRecord {
    pub fn inner(&self) -> &RecordBuf {
        &self.inner
    }

    pub fn reference_sequence_name(&self) -> &str {
        self.inner.reference_sequence_name()
    }

    /// 1-based inclusive start position.
    pub fn start1(&self) -> usize {
        self.inner
            .variant_start()
            .expect("record without POS")
            .get()
    }

    pub fn reference_bases(&self) -> &str {
        self.inner.reference_bases()
    }

    /// All `ALT` allele strings, in declaration order.
    pub fn alternate_bases(&self) -> Vec<String> {
        self.inner
            .alternate_bases()
            .as_ref()
            .iter()
            .cloned()
            .collect()
    }

    pub fn quality_score(&self) -> Option<f32> {
        self.inner.quality_score()
    }

    pub fn set_quality_score(&mut self, value: f32) {
        *self.inner.quality_score_mut() = Some(value);
    }

    pub fn has_filters(&self) -> bool {
        !self.inner.filters().is_empty()
    }

    /// Add a FILTER id, idempotently (matches `bcf_add_filter` semantics).
    pub fn add_filter(&mut self, id: &str) {
        self.inner.filters_mut().insert(id.to_string());
    }

    pub fn set_info_int3(&mut self, key: &str, values: [i32; 3]) {
        self.set_info_int_array(key, &values);
    }

    pub fn set_info_int_array(&mut self, key: &str, values: &[i32]) {
        self.info_mut().insert(
            key.to_string(),
            Some(Value::Array(Array::Integer(
                values.iter().map(|v| Some(*v)).collect(),
            ))),
        );
    }

    pub fn set_info_int(&mut self, key: &str, value: i32) {
        self.info_mut()
            .insert(key.to_string(), Some(Value::Integer(value)));
    }

    pub fn set_info_string(&mut self, key: &str, value: impl Into<String>) {
        self.info_mut()
            .insert(key.to_string(), Some(Value::String(value.into())));
    }

    pub fn get_info_int(&self, key: &str) -> Option<i32> {
        match self.inner.info().get(key)?? {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_info_int_array(&self, key: &str) -> Option<Vec<i32>> {
        match self.inner.info().get(key)?? {
            Value::Array(Array::Integer(values)) => {
                Some(values.iter().map(|v| v.unwrap_or(0)).collect())
            }
            _ => None,
        }
    }

    pub fn get_info_string(&self, key: &str) -> Option<String> {
        match self.inner.info().get(key)?? {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Read a scalar `FORMAT` integer from the sample at `sample_idx`.
    pub fn get_format_int(&self, sample_idx: usize, key: &str) -> Option<i32> {
        use vcf::variant::record_buf::samples::sample::Value as SampleValue;

        let sample = self.inner.samples().values().nth(sample_idx)?;
        match sample.get(key)?? {
            SampleValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    fn info_mut(&mut self) -> &mut Info {
        self.inner.info_mut()
    }

    /// Build a fresh, sample-less record at `(rid's chrom, pos1)` with the
    /// given `REF`/`ALT` alleles. Used both for synthesized multi-allelic
    /// sites and for the candidate merger's cross-sample output record.
    pub fn new_site(
        chrom: impl Into<String>,
        pos1: usize,
        reference_bases: impl AsRef<str>,
        alternate_bases: Vec<String>,
    ) -> Result<Self, anyhow::Error> {
        use noodles_core::Position;
        use vcf::variant::record_buf::builder::Builder;

        let inner = Builder::default()
            .set_reference_sequence_name(chrom.into())
            .set_variant_start(
                Position::try_from(pos1)
                    .map_err(|e| anyhow::anyhow!("invalid 1-based position {}: {}", pos1, e))?,
            )
            .set_reference_bases(
                reference_bases
                    .as_ref()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid reference bases: {:?}", e))?,
            )
            .set_alternate_bases(AlternateBases::from(alternate_bases))
            .build();

        Ok(Self { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(chrom: &str, pos1: usize, reference: &str, alt: &str) -> VariantRecord {
        VariantRecord::new_site(chrom, pos1, reference, vec![alt.to_string()]).unwrap()
    }

    #[test]
    fn roundtrips_overlaps_info() {
        let mut v = record("chr1", 100, "A", "C");
        v.set_info_int3("OVERLAPS", [1, 2, 3]);
        assert_eq!(v.get_info_int_array("OVERLAPS"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn add_filter_is_observable() {
        let mut v = record("chr1", 100, "A", "C");
        assert!(!v.has_filters());
        v.add_filter("overlap_snp");
        assert!(v.has_filters());
    }

    #[test]
    fn start1_matches_constructed_position() {
        let v = record("chr1", 42, "A", "C");
        assert_eq!(v.start1(), 42);
    }
}
