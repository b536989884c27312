//! Per-batch aggregation: quality-threshold filtering plus per-sample
//! evidence vector construction (§4.2).

use crate::err::MergeError;
use crate::vcf::{classify, VariantKind, VariantRecord};

use super::reader::{SourceInfo, SourceKind};

#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub no_candidate_snps: u64,
    pub no_candidate_indels: u64,
}

/// Aggregate one batch of same-site records into a single cross-sample
/// output record, or `None` if nothing in the batch cleared its type's
/// quality cutoff.
pub fn aggregate_batch(
    batch: &[(usize, VariantRecord)],
    sources: &[SourceInfo],
    snp_cutoff: f32,
    indel_cutoff: f32,
    stats: &mut Stats,
) -> Result<Option<VariantRecord>, MergeError> {
    let (_, seed) = batch.first().expect("batches are never empty");
    let chrom = seed.reference_sequence_name().to_string();
    let pos1 = seed.start1();
    let reference = seed.reference_bases().to_string();
    let alts = seed.alternate_bases();
    let vtype = classify(seed.inner());

    let mut e: Vec<i32> = Vec::new();
    let mut n: Vec<i32> = Vec::new();
    let mut esum: i64 = 0;
    let mut nsum: i64 = 0;
    let mut n_samples: i64 = 0;
    let mut samples: Vec<String> = Vec::new();
    let mut kept = false;
    let mut max_q: f32 = 0.0;

    for (source_idx, record) in batch {
        let cutoff = match vtype {
            VariantKind::Snp => Some(snp_cutoff),
            VariantKind::Indel => Some(indel_cutoff),
            VariantKind::Vntr | VariantKind::Other => None,
        };
        let Some(cutoff) = cutoff else { continue };

        let q = record.quality_score().unwrap_or(0.0);
        if q < cutoff {
            continue;
        }
        kept = true;
        if q > max_q {
            max_q = q;
        }

        let source = &sources[*source_idx];
        match &source.kind {
            SourceKind::Single { sample_name } => {
                let e_val = record
                    .get_format_int(0, "E")
                    .ok_or_else(|| missing_field(source, "E"))?;
                let n_val = record
                    .get_format_int(0, "N")
                    .ok_or_else(|| missing_field(source, "N"))?;

                n_samples += 1;
                e.push(e_val);
                n.push(n_val);
                esum += e_val as i64;
                nsum += n_val as i64;

                if samples.len() < 10 {
                    samples.push(sample_name.clone());
                }
            }
            SourceKind::Aggregated => {
                let k = record
                    .get_info_int("NSAMPLES")
                    .ok_or_else(|| missing_field(source, "NSAMPLES"))?;
                let e_arr = record
                    .get_info_int_array("E")
                    .ok_or_else(|| missing_field(source, "E"))?;
                let n_arr = record
                    .get_info_int_array("N")
                    .ok_or_else(|| missing_field(source, "N"))?;
                let samples_str = record
                    .get_info_string("SAMPLES")
                    .ok_or_else(|| missing_field(source, "SAMPLES"))?;

                let k = k.max(0) as usize;
                if e_arr.len() < k || n_arr.len() < k {
                    return Err(missing_field(source, "E/N"));
                }

                let prev_total = n_samples;
                for i in 0..k {
                    n_samples += 1;
                    e.push(e_arr[i]);
                    n.push(n_arr[i]);
                    esum += e_arr[i] as i64;
                    nsum += n_arr[i] as i64;
                }

                if prev_total < 10 {
                    for name in samples_str.split(',').filter(|s| !s.is_empty()) {
                        if samples.len() >= 10 {
                            break;
                        }
                        samples.push(name.to_string());
                    }
                }
            }
        }
    }

    if !kept {
        return Ok(None);
    }

    let mut out = VariantRecord::new_site(chrom, pos1, reference, alts)
        .map_err(|e| MergeError::MissingRequiredField {
            path: "<output>".to_string(),
            field: e.to_string(),
        })?;
    out.set_quality_score(max_q);
    out.set_info_int("NSAMPLES", n_samples as i32);
    out.set_info_string("SAMPLES", samples.join(","));
    out.set_info_int_array("E", &e);
    out.set_info_int_array("N", &n);
    out.set_info_int("ESUM", esum as i32);
    out.set_info_int("NSUM", nsum as i32);

    match vtype {
        VariantKind::Snp => stats.no_candidate_snps += 1,
        VariantKind::Indel => stats.no_candidate_indels += 1,
        VariantKind::Vntr | VariantKind::Other => unreachable!("kept implies snp or indel"),
    }

    Ok(Some(out))
}

fn missing_field(source: &SourceInfo, field: &str) -> MergeError {
    MergeError::MissingRequiredField {
        path: source.path.clone(),
        field: field.to_string(),
    }
}
