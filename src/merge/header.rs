//! Output header construction for `merge`.
//!
//! Contigs are copied from the first source only (§6), and the cross-sample
//! `INFO` keys the aggregator writes are declared once, up front.

use noodles_vcf::{self as vcf};
use vcf::header::record::value::{
    map::{info::Number, Info},
    Map,
};

/// Build the `merge` output header from the first source's header.
pub fn build_output_header(first_source_header: &vcf::Header) -> Result<vcf::Header, anyhow::Error> {
    let mut builder = vcf::Header::builder();

    for (name, map) in first_source_header.contigs() {
        builder = builder.add_contig(name.parse()?, map.clone());
    }

    builder = builder
        .insert(
            "QUAL".parse()?,
            vcf::header::record::Value::from(
                "Maximum variant score of the alternative allele likelihood ratio: \
                 -10 * log10 [P(Non variant)/P(Variant)] amongst all individuals.",
            ),
        )?
        .add_info(
            "NSAMPLES",
            Map::<Info>::new(
                Number::Count(1),
                vcf::header::record::value::map::info::Type::Integer,
                "Number of samples.",
            ),
        )
        .add_info(
            "SAMPLES",
            Map::<Info>::new(
                Number::Unknown,
                vcf::header::record::value::map::info::Type::String,
                "Samples with evidence. (up to first 10 samples)",
            ),
        )
        .add_info(
            "E",
            Map::<Info>::new(
                Number::Unknown,
                vcf::header::record::value::map::info::Type::Integer,
                "Evidence read counts for each sample",
            ),
        )
        .add_info(
            "N",
            Map::<Info>::new(
                Number::Unknown,
                vcf::header::record::value::map::info::Type::Integer,
                "Read counts for each sample",
            ),
        )
        .add_info(
            "ESUM",
            Map::<Info>::new(
                Number::Count(1),
                vcf::header::record::value::map::info::Type::Integer,
                "Total evidence read count",
            ),
        )
        .add_info(
            "NSUM",
            Map::<Info>::new(
                Number::Count(1),
                vcf::header::record::value::map::info::Type::Integer,
                "Total read count",
            ),
        );

    Ok(builder.build())
}
