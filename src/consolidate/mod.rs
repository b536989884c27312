//! The `consolidate` subcommand: sliding-window overlap annotation and
//! multi-allelic synthesis over a single ordered variant stream.

pub mod buffer;
pub mod engine;
pub mod header;
pub mod llr;
pub mod variant;

use std::io::Write;

use noodles_vcf as vcf;
use thousands::Separable;

use crate::common;
use crate::vcf::{contig_index_map, VariantRecord};

use self::engine::Engine;

/// Command line arguments for the `consolidate` subcommand.
#[derive(Debug, clap::Parser)]
#[command(
    about = "Annotate overlaps and synthesize multi-allelic sites in an ordered variant stream"
)]
pub struct Args {
    /// Input variant record file.
    pub path_in: String,

    /// Output variant record file, `-` for standard output.
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub path_out: String,

    /// Comma-separated list of regions to restrict input to.
    #[arg(short = 'i', long = "intervals")]
    pub intervals: Option<String>,

    /// File containing a list of regions to restrict input to, one per line.
    #[arg(short = 'I', long = "interval-list")]
    pub interval_list: Option<String>,
}

/// Main entry point for the `consolidate` subcommand.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    common::trace_rss_now();

    let path_in = shellexpand::tilde(&args.path_in).into_owned();
    let regions = common::parse_intervals(args.intervals.as_deref(), args.interval_list.as_deref())?;

    tracing::info!("opening input file {:?}...", &path_in);
    let mut input_reader = {
        let reader = crate::common::io::open_read_maybe_gz(&path_in)
            .map_err(|e| anyhow::anyhow!("could not open input file {}: {}", &path_in, e))?;
        vcf::reader::Builder::default()
            .build_from_reader(reader)
            .map_err(|e| anyhow::anyhow!("could not build VCF reader for {}: {}", &path_in, e))?
    };
    let input_header = input_reader
        .read_header()
        .map_err(|e| anyhow::anyhow!("problem reading header of {}: {}", &path_in, e))?;
    let contig_index = contig_index_map(&input_header);
    let output_header = header::build_output_header(&input_header)?;

    let mut output_writer = open_output_writer(&args.path_out)?;
    output_writer.write_header(&output_header)?;

    let mut engine = Engine::new();
    let mut record_buf = vcf::variant::RecordBuf::default();
    let mut prev_heartbeat = std::time::Instant::now();
    let mut count_skipped_by_region = 0u64;

    let mut sink = |record: VariantRecord| {
        if let Err(e) = output_writer.write_variant_record(&output_header, record.inner()) {
            tracing::error!("failed to write record: {}", e);
        }
    };

    loop {
        let bytes_read = input_reader
            .read_record_buf(&input_header, &mut record_buf)
            .map_err(|e| anyhow::anyhow!("problem reading record from {}: {}", &path_in, e))?;
        if bytes_read == 0 {
            break;
        }

        let chrom = record_buf.reference_sequence_name().to_string();
        let pos1 = record_buf
            .variant_start()
            .ok_or_else(|| anyhow::anyhow!("record at {} missing POS", &chrom))?
            .get();

        if !common::region_matches(&regions, &chrom, pos1) {
            count_skipped_by_region += 1;
            continue;
        }

        let rid = *contig_index
            .get(chrom.as_str())
            .ok_or_else(|| crate::err::ConsolidateError::UnknownContig(chrom.clone()))?;

        let record: VariantRecord = record_buf.clone().into();
        engine.ingest(&path_in, rid, record, &mut sink)?;

        if prev_heartbeat.elapsed().as_secs() >= 60 {
            tracing::info!("at {}:{}", &chrom, pos1);
            prev_heartbeat = std::time::Instant::now();
        }
    }

    engine.finalize(&mut sink);
    drop(sink);

    let stats = engine.stats();
    tracing::info!(
        "stats: total={} nonoverlap={} overlap={} new_multiallelic_snps={} new_multiallelic_indels={} skipped_by_region={}",
        stats.no_total_variants.separate_with_commas(),
        stats.no_nonoverlap_variants.separate_with_commas(),
        stats.no_overlap_variants.separate_with_commas(),
        stats.no_new_multiallelic_snps.separate_with_commas(),
        stats.no_new_multiallelic_indels.separate_with_commas(),
        count_skipped_by_region.separate_with_commas(),
    );

    common::trace_rss_now();
    tracing::info!(
        "All of `consolidate` completed in {:?}",
        before_anything.elapsed()
    );

    Ok(())
}

fn open_output_writer(
    path_out: &str,
) -> Result<vcf::writer::Writer<Box<dyn Write>>, anyhow::Error> {
    let writer: Box<dyn Write> = if path_out == "-" {
        Box::new(std::io::BufWriter::new(std::io::stdout()))
    } else {
        crate::common::io::open_write_maybe_gz(path_out)
            .map_err(|e| anyhow::anyhow!("could not open output file {}: {}", path_out, e))?
    };
    Ok(vcf::writer::Writer::new(writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap_verbosity_flag::Verbosity;

    #[test]
    fn run_smoke_no_overlap() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path_in = tmp_dir.join("in.vcf");
        std::fs::write(
            &path_in,
            "##fileformat=VCFv4.2\n\
             ##contig=<ID=chr1>\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
             chr1\t100\t.\tA\tC\t.\t.\t.\n\
             chr1\t5000\t.\tG\tT\t.\t.\t.\n",
        )?;

        let args_common = common::Args::default();
        let args = Args {
            path_in: path_in.to_str().expect("valid utf8 path").to_string(),
            path_out: tmp_dir.join("out.vcf").to_str().expect("valid utf8 path").to_string(),
            intervals: None,
            interval_list: None,
        };

        run(&args_common, &args)?;

        let output = std::fs::read_to_string(tmp_dir.join("out.vcf"))?;
        assert!(output.contains("OVERLAPS=0,0,0"));
        assert!(output.contains("chr1\t100"));
        assert!(output.contains("chr1\t5000"));

        Ok(())
    }

    #[test]
    fn run_honors_region_restriction() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path_in = tmp_dir.join("in.vcf");
        std::fs::write(
            &path_in,
            "##fileformat=VCFv4.2\n\
             ##contig=<ID=chr1>\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
             chr1\t100\t.\tA\tC\t.\t.\t.\n\
             chr1\t5000\t.\tG\tT\t.\t.\t.\n",
        )?;

        let args_common = common::Args {
            verbose: Verbosity::new(0, 0),
        };
        let args = Args {
            path_in: path_in.to_str().expect("valid utf8 path").to_string(),
            path_out: tmp_dir.join("out.vcf").to_str().expect("valid utf8 path").to_string(),
            intervals: Some("chr1:1-1000".to_string()),
            interval_list: None,
        };

        run(&args_common, &args)?;

        let output = std::fs::read_to_string(tmp_dir.join("out.vcf"))?;
        assert!(output.contains("chr1\t100"));
        assert!(!output.contains("chr1\t5000"));

        Ok(())
    }
}
