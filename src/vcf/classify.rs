//! Variant type classification.
//!
//! Classification is a pure function from a record's alleles (and, where
//! present, an upstream caller's `VT` annotation) to one of the four type
//! tags the consolidation engine reasons about.

use noodles_vcf::variant::RecordBuf;

/// The four variant shapes the overlap engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum VariantKind {
    #[strum(serialize = "SNP")]
    Snp,
    #[strum(serialize = "INDEL")]
    Indel,
    #[strum(serialize = "VNTR")]
    Vntr,
    #[strum(serialize = "OTHER")]
    Other,
}

/// Classify a record into one of the four [`VariantKind`] tags.
///
/// Upstream callers that already know a record is a VNTR tag it with
/// `INFO/VT=VNTR`; that annotation always wins. Otherwise the record is
/// classified structurally from its reference and first alternate allele:
/// equal, single-base alleles are a SNP, equal multi-base alleles of
/// differing sequence are treated as `Other` (e.g. MNPs), and alleles of
/// differing length are an indel.
pub fn classify(record: &RecordBuf) -> VariantKind {
    if let Some(vt) = info_vt(record) {
        match vt.as_str() {
            "VNTR" => return VariantKind::Vntr,
            "INDEL" => return VariantKind::Indel,
            "SNP" => return VariantKind::Snp,
            _ => {}
        }
    }

    let reference_bases = record.reference_bases();
    let Some(first_alt) = record.alternate_bases().as_ref().first() else {
        return VariantKind::Other;
    };

    match (reference_bases.len(), first_alt.len()) {
        (1, 1) => VariantKind::Snp,
        (r, a) if r != a => VariantKind::Indel,
        _ => VariantKind::Other,
    }
}

fn info_vt(record: &RecordBuf) -> Option<String> {
    use noodles_vcf::variant::record_buf::info::field::Value;

    match record.info().get("VT")? {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noodles_vcf::variant::record_buf::Builder;

    fn record(reference: &str, alt: &str) -> RecordBuf {
        Builder::default()
            .set_reference_bases(reference.parse().unwrap())
            .set_alternate_bases(vec![alt.parse().unwrap()].into())
            .build()
    }

    #[test]
    fn classifies_snp() {
        assert_eq!(classify(&record("A", "C")), VariantKind::Snp);
    }

    #[test]
    fn classifies_indel() {
        assert_eq!(classify(&record("AT", "A")), VariantKind::Indel);
        assert_eq!(classify(&record("A", "AT")), VariantKind::Indel);
    }
}
