//! Output header construction for `consolidate`.
//!
//! The output header carries everything the input header declared —
//! contigs, samples, and any existing FILTER/INFO/FORMAT entries — plus the
//! five FILTER ids and the `OVERLAPS` INFO field the consolidation engine
//! itself writes.

use noodles_vcf::{self as vcf};
use vcf::header::record::value::{
    map::{info::Number, Filter, Info},
    Map,
};

/// Build the `consolidate` output header from the input header.
pub fn build_output_header(input: &vcf::Header) -> Result<vcf::Header, anyhow::Error> {
    let mut builder = vcf::Header::builder();

    for name in input.sample_names() {
        builder = builder.add_sample_name(name.clone());
    }

    for (name, map) in input.contigs() {
        builder = builder.add_contig(name.parse()?, map.clone());
    }

    for (name, map) in input.filters() {
        builder = builder.add_filter(name.clone(), map.clone());
    }

    for (key, map) in input.infos() {
        builder = builder.add_info(key.clone(), map.clone());
    }

    for (key, map) in input.formats() {
        builder = builder.add_format(key.clone(), map.clone());
    }

    builder = builder
        .add_filter(
            "overlap_snp",
            Map::<Filter>::new("Overlaps with SNP."),
        )
        .add_filter(
            "overlap_indel",
            Map::<Filter>::new("Overlaps with Indel."),
        )
        .add_filter(
            "overlap_vntr",
            Map::<Filter>::new("Overlaps with VNTR."),
        )
        .add_filter(
            "shorter_vntr",
            Map::<Filter>::new("Another VNTR overlaps with this VNTR."),
        )
        .add_filter(
            "on_vntr_boundary",
            Map::<Filter>::new("This variant lies near a VNTR boundary."),
        )
        .add_info(
            "OVERLAPS",
            Map::<Info>::new(
                Number::Count(3),
                vcf::header::record::value::map::info::Type::Integer,
                "Number of SNPs, Indels and VNTRs overlapping with this variant.",
            ),
        );

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_header_declares_overlap_filters_and_info() {
        let input = vcf::Header::builder().build();
        let output = build_output_header(&input).unwrap();

        assert!(output.filters().contains_key("overlap_snp"));
        assert!(output.filters().contains_key("overlap_indel"));
        assert!(output.filters().contains_key("overlap_vntr"));
        assert!(output.filters().contains_key("shorter_vntr"));
        assert!(output.filters().contains_key("on_vntr_boundary"));
        assert!(output.infos().contains_key("OVERLAPS"));
    }
}
