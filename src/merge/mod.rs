//! The `merge` subcommand: N-way synchronized candidate merging across
//! per-sample and previously-aggregated ordered variant streams.

pub mod aggregator;
pub mod header;
pub mod reader;

use std::io::Write;

use noodles_vcf as vcf;
use thousands::Separable;

use crate::common;

use self::reader::NWayReader;

/// Command line arguments for the `merge` subcommand.
#[derive(Debug, clap::Parser)]
#[command(about = "Merge candidate variants across N ordered streams")]
pub struct Args {
    /// Input variant record files (one or more).
    pub paths_in: Vec<String>,

    /// File listing additional input sources, one per line; merged with `paths_in`.
    #[arg(short = 'L', long = "sources-list")]
    pub sources_list: Option<String>,

    /// Output variant record file, `-` for standard output.
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub path_out: String,

    /// SNP quality cutoff.
    #[arg(short = 'c', long = "snp-cutoff", default_value_t = 30.0)]
    pub snp_cutoff: f32,

    /// Indel quality cutoff.
    #[arg(short = 'd', long = "indel-cutoff", default_value_t = 30.0)]
    pub indel_cutoff: f32,

    /// Comma-separated list of regions to restrict input to.
    #[arg(short = 'i', long = "intervals")]
    pub intervals: Option<String>,

    /// File containing a list of regions to restrict input to, one per line.
    #[arg(short = 'I', long = "interval-list")]
    pub interval_list: Option<String>,
}

/// Read a file listing one path per line, tilde-expanding both the list file
/// path itself and each path it contains. Backs both `-L <path>` and the
/// `@path` positional-argument convention.
fn expand_list_file(path: &str) -> Result<Vec<String>, anyhow::Error> {
    let path = shellexpand::tilde(path);
    let mut out = Vec::new();
    for line in crate::common::io::read_lines(path.into_owned())? {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            out.push(shellexpand::tilde(line).into_owned());
        }
    }
    Ok(out)
}

/// Main entry point for the `merge` subcommand.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    common::trace_rss_now();

    let regions = common::parse_intervals(args.intervals.as_deref(), args.interval_list.as_deref())?;

    let mut paths = Vec::new();
    for path in &args.paths_in {
        if let Some(list_path) = path.strip_prefix('@') {
            paths.extend(expand_list_file(list_path)?);
        } else {
            paths.push(shellexpand::tilde(path).into_owned());
        }
    }
    if let Some(path) = &args.sources_list {
        paths.extend(expand_list_file(path)?);
    }
    if paths.is_empty() {
        anyhow::bail!("merge requires at least one input source (positional, @file, or via -L)");
    }

    tracing::info!("opening {} source(s)...", paths.len());
    let mut input_reader = NWayReader::open(&paths)?;
    let sources = input_reader.source_infos();
    let output_header = header::build_output_header(input_reader.first_header())?;

    let mut output_writer = open_output_writer(&args.path_out)?;
    output_writer.write_header(&output_header)?;

    let mut stats = aggregator::Stats::default();
    let mut prev_heartbeat = std::time::Instant::now();
    let mut count_skipped_by_region = 0u64;

    while let Some(batch) = input_reader.next_batch()? {
        let (_, seed) = batch.first().expect("batches are never empty");
        let chrom = seed.reference_sequence_name().to_string();
        let pos1 = seed.start1();

        if !common::region_matches(&regions, &chrom, pos1) {
            count_skipped_by_region += 1;
            continue;
        }

        if let Some(record) =
            aggregator::aggregate_batch(&batch, &sources, args.snp_cutoff, args.indel_cutoff, &mut stats)?
        {
            output_writer.write_variant_record(&output_header, record.inner())?;
        }

        if prev_heartbeat.elapsed().as_secs() >= 60 {
            tracing::info!("at {}:{}", &chrom, pos1);
            prev_heartbeat = std::time::Instant::now();
        }
    }

    tracing::info!(
        "stats: candidate_snps={} candidate_indels={} skipped_by_region={}",
        stats.no_candidate_snps.separate_with_commas(),
        stats.no_candidate_indels.separate_with_commas(),
        count_skipped_by_region.separate_with_commas(),
    );

    common::trace_rss_now();
    tracing::info!(
        "All of `merge` completed in {:?}",
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
