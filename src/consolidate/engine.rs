//! The overlap-annotation and multi-allelic synthesis engine.
//!
//! Walks a position-ordered stream of records against a sliding window
//! buffer, annotating each with overlap filters and counters and spawning
//! pending multi-allelic containers where the rule table calls for one.

use crate::err::ConsolidateError;
use crate::vcf::{classify, VariantKind, VariantRecord};

use super::buffer::WindowBuffer;
use super::llr::compute_glfsingle_llr;
use super::variant::{Variant, VariantState};

/// Two records interact only within this many bases of each other.
pub const HORIZON: i64 = 1000;

#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub no_total_variants: u64,
    pub no_nonoverlap_variants: u64,
    pub no_overlap_variants: u64,
    pub no_new_multiallelic_snps: u64,
    pub no_new_multiallelic_indels: u64,
}

/// Sink callback: receives a fully-annotated record ready for writing.
pub trait Sink {
    fn write(&mut self, record: VariantRecord);
}

impl<F: FnMut(VariantRecord)> Sink for F {
    fn write(&mut self, record: VariantRecord) {
        self(record)
    }
}

pub struct Engine {
    buffer: WindowBuffer,
    stats: Stats,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            buffer: WindowBuffer::new(),
            stats: Stats::default(),
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Ingest one incoming record: classify it, flush what has left the
    /// horizon, apply the overlap rule table against what remains, then
    /// buffer it.
    pub fn ingest(
        &mut self,
        path: &str,
        rid: usize,
        mut record: VariantRecord,
        sink: &mut impl Sink,
    ) -> Result<(), ConsolidateError> {
        self.stats.no_total_variants += 1;

        let kind = classify(record.inner());
        let beg1 = record.start1() as i64;
        let end1 = end1_of(&record, kind, beg1);

        self.flush_phase(rid, beg1, sink);
        let (had_overlap, counts) =
            self.interaction_phase(path, rid, beg1, end1, &mut record, kind)?;

        if had_overlap {
            self.stats.no_overlap_variants += 1;
        } else {
            self.stats.no_nonoverlap_variants += 1;
        }

        let mut variant = Variant::new(rid, beg1, end1, VariantState::from(kind), record);
        variant.n_overlap_snp = counts[0];
        variant.n_overlap_indel = counts[1];
        variant.n_overlap_vntr = counts[2];
        self.buffer.push_front(variant);

        Ok(())
    }

    /// Drain everything still in the buffer, in tail-to-front order.
    pub fn finalize(&mut self, sink: &mut impl Sink) {
        while let Some(variant) = self.buffer.pop_back() {
            self.emit(variant, sink);
        }
    }

    fn flush_phase(&mut self, rid: usize, beg1: i64, sink: &mut impl Sink) {
        loop {
            let Some(back_id) = self.buffer.back_id() else {
                break;
            };
            let back = self.buffer.get(back_id);
            let past_horizon =
                back.rid < rid || (back.rid == rid && back.beg1 < beg1 - HORIZON);
            if !past_horizon {
                break;
            }
            let variant = self.buffer.pop_back().expect("back_id just observed");
            self.emit(variant, sink);
        }
    }

    /// Walk the buffer front-to-tail, applying the overlap rule table.
    /// Returns whether the incoming record overlapped anything.
    fn interaction_phase(
        &mut self,
        path: &str,
        rid: usize,
        beg1: i64,
        end1: i64,
        record: &mut VariantRecord,
        kind: VariantKind,
    ) -> Result<(bool, [u32; 3]), ConsolidateError> {
        let mut overlapped = false;
        let mut incoming_snp = 0u32;
        let mut incoming_indel = 0u32;
        let mut incoming_vntr = 0u32;
        let mut spawn: Option<Variant> = None;

        for id in self.buffer.ids_front_to_back() {
            let u_rid = self.buffer.get(id).rid;
            if u_rid < rid {
                break;
            }

            let u_beg1 = self.buffer.get(id).beg1;
            let u_end1 = self.buffer.get(id).end1;

            if end1 < u_beg1 {
                return Err(ConsolidateError::UnorderedInput {
                    path: path.to_string(),
                    chrom: record.reference_sequence_name().to_string(),
                    position: record.start1(),
                });
            }
            if beg1 > u_end1 + HORIZON {
                break;
            }
            if !(end1 >= u_beg1 && beg1 <= u_end1) {
                continue;
            }

            overlapped = true;
            let u_state = self.buffer.get(id).state;

            if u_state == VariantState::Undefined {
                let u = self.buffer.get_mut(id);
                u.children.push(record.clone());
                match kind {
                    VariantKind::Snp => u.n_overlap_snp += 1,
                    VariantKind::Indel => u.n_overlap_indel += 1,
                    VariantKind::Vntr => u.n_overlap_vntr += 1,
                    VariantKind::Other => {}
                }
                continue;
            }

            let u_kind = match u_state {
                VariantState::Snp => VariantKind::Snp,
                VariantState::Indel => VariantKind::Indel,
                VariantState::Vntr => VariantKind::Vntr,
                VariantState::Other => VariantKind::Other,
                VariantState::Undefined => unreachable!("handled above"),
            };

            match (kind, u_kind) {
                (VariantKind::Snp, VariantKind::Snp) => {
                    let u = self.buffer.get_mut(id);
                    if !u.record.as_ref().expect("resident variant").has_filters() {
                        let first_record = u.record.clone().expect("resident variant");
                        spawn = Some(Variant::new_pending_multiallelic(
                            u,
                            first_record,
                            record.clone(),
                            VariantKind::Snp,
                        ));
                    }
                    record.add_filter("overlap_snp");
                    incoming_snp += 1;
                    let u = self.buffer.get_mut(id);
                    u.record
                        .as_mut()
                        .expect("resident variant")
                        .add_filter("overlap_snp");
                    u.n_overlap_snp += 1;
                }
                (VariantKind::Snp, VariantKind::Indel) => {
                    record.add_filter("overlap_indel");
                    incoming_indel += 1;
                    let u = self.buffer.get_mut(id);
                    u.record
                        .as_mut()
                        .expect("resident variant")
                        .add_filter("overlap_snp");
                    u.n_overlap_snp += 1;
                }
                (VariantKind::Snp, VariantKind::Vntr) => {
                    // Preserved anomaly: the incoming SNP's own counter is
                    // bumped here instead of the buffered VNTR's.
                    record.add_filter("overlap_vntr");
                    incoming_vntr += 1;
                    incoming_snp += 1;
                    let u = self.buffer.get_mut(id);
                    u.record
                        .as_mut()
                        .expect("resident variant")
                        .add_filter("overlap_snp");
                }
                (VariantKind::Indel, VariantKind::Snp) => {
                    record.add_filter("overlap_snp");
                    incoming_snp += 1;
                    let u = self.buffer.get_mut(id);
                    u.record
                        .as_mut()
                        .expect("resident variant")
                        .add_filter("overlap_indel");
                    u.n_overlap_indel += 1;
                }
                (VariantKind::Indel, VariantKind::Indel) => {
                    let u = self.buffer.get_mut(id);
                    if !u.record.as_ref().expect("resident variant").has_filters() {
                        let first_record = u.record.clone().expect("resident variant");
                        spawn = Some(Variant::new_pending_multiallelic(
                            u,
                            first_record,
                            record.clone(),
                            VariantKind::Indel,
                        ));
                    }
                    record.add_filter("overlap_indel");
                    incoming_indel += 1;
                    let u = self.buffer.get_mut(id);
                    u.record
                        .as_mut()
                        .expect("resident variant")
                        .add_filter("overlap_indel");
                    u.n_overlap_indel += 1;
                }
                (VariantKind::Indel, VariantKind::Vntr) => {
                    record.add_filter("overlap_vntr");
                    incoming_vntr += 1;
                    let u = self.buffer.get_mut(id);
                    u.record
                        .as_mut()
                        .expect("resident variant")
                        .add_filter("overlap_indel");
                    u.n_overlap_indel += 1;
                }
                (VariantKind::Vntr, VariantKind::Snp) => {
                    record.add_filter("overlap_snp");
                    incoming_snp += 1;
                    let u = self.buffer.get_mut(id);
                    u.record
                        .as_mut()
                        .expect("resident variant")
                        .add_filter("overlap_vntr");
                    u.n_overlap_vntr += 1;
                }
                (VariantKind::Vntr, VariantKind::Indel) => {
                    record.add_filter("overlap_indel");
                    incoming_indel += 1;
                    let u = self.buffer.get_mut(id);
                    u.record
                        .as_mut()
                        .expect("resident variant")
                        .add_filter("overlap_vntr");
                    u.n_overlap_vntr += 1;
                }
                (VariantKind::Vntr, VariantKind::Vntr) => {
                    // Preserved anomaly: the incoming VNTR's indel counter
                    // is bumped here instead of its vntr counter.
                    record.add_filter("overlap_vntr");
                    incoming_indel += 1;
                    let u = self.buffer.get_mut(id);
                    u.record
                        .as_mut()
                        .expect("resident variant")
                        .add_filter("overlap_vntr");
                    u.n_overlap_vntr += 1;
                }
                (_, VariantKind::Other) | (VariantKind::Other, _) => {
                    // Neither side of the rule table covers `Other`; it
                    // takes part in horizon bookkeeping only.
                }
            }
        }

        if let Some(spawn) = spawn {
            self.buffer.push_front(spawn);
        }

        Ok((overlapped, [incoming_snp, incoming_indel, incoming_vntr]))
    }

    fn emit(&mut self, mut variant: Variant, sink: &mut impl Sink) {
        if variant.state == VariantState::Undefined {
            if let Some(mut record) = synthesize_multiallelic(&variant, &mut self.stats) {
                record.set_info_int3("OVERLAPS", variant.overlap_counts());
                sink.write(record);
            }
            return;
        }

        let overlaps = variant.overlap_counts();
        if let Some(mut record) = variant.record.take() {
            record.set_info_int3("OVERLAPS", overlaps);
            sink.write(record);
        }
    }
}

fn end1_of(record: &VariantRecord, kind: VariantKind, beg1: i64) -> i64 {
    match kind {
        VariantKind::Snp => beg1,
        _ => beg1 + record.reference_bases().len() as i64 - 1,
    }
}

/// Build the consolidated multi-allelic record for a pure-SNP container, or
/// run the complex-site diagnostic path and return nothing to emit.
fn synthesize_multiallelic(variant: &Variant, stats: &mut Stats) -> Option<VariantRecord> {
    let pure_snp =
        variant.n_overlap_snp != 0 && variant.n_overlap_indel == 0 && variant.n_overlap_vntr == 0;

    if pure_snp {
        let first = variant.children.first()?;
        let chrom = first.reference_sequence_name().to_string();
        let pos1 = first.start1();
        let reference = first.reference_bases().to_string();

        // Selection sort over each child's single ALT base, reproducing the
        // original's overwrite-inside-inner-loop anomaly verbatim: `alts[i]`
        // is reassigned from `vs[i]` on every inner-loop iteration, which
        // clobbers swaps made earlier in the same outer pass.
        let mut alts: Vec<String> = variant
            .children
            .iter()
            .map(|c| c.alternate_bases().first().cloned().unwrap_or_default())
            .collect();
        let n = alts.len();
        for i in 0..n.saturating_sub(1) {
            for j in (i + 1)..n {
                if alts[j] < alts[i] {
                    alts.swap(i, j);
                }
                alts[i] = variant.children[i]
                    .alternate_bases()
                    .first()
                    .cloned()
                    .unwrap_or_default();
            }
        }

        stats.no_new_multiallelic_snps += 1;
        VariantRecord::new_site(chrom, pos1, reference, alts).ok()
    } else {
        // Complex site: diagnostic-only, never emitted. Report the most
        // reference-disfavoring child's log-likelihood ratio (§4.3);
        // never affects which alleles are written out.
        for child in &variant.children {
            if let (Some(e), Some(n)) = (
                child.get_info_int_array("E"),
                child.get_info_int_array("N"),
            ) {
                if e.len() == n.len() {
                    let min_ln_lr = e
                        .iter()
                        .zip(n.iter())
                        .map(|(e_i, n_i)| compute_glfsingle_llr((*e_i).max(0) as u32, (*n_i).max(0) as u32))
                        .fold(f64::INFINITY, f64::min);
                    tracing::debug!(min_ln_lr, "complex multi-allelic site diagnostic");
                }
            }
        }
        stats.no_new_multiallelic_indels += 1;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snp(pos1: usize, alt: &str) -> VariantRecord {
        VariantRecord::new_site("chr1", pos1, "A", vec![alt.to_string()]).unwrap()
    }

    fn indel(pos1: usize, reference: &str, alt: &str) -> VariantRecord {
        VariantRecord::new_site("chr1", pos1, reference, vec![alt.to_string()]).unwrap()
    }

    fn vntr(beg1: usize, end1: usize) -> VariantRecord {
        let mut r =
            VariantRecord::new_site("chr1", beg1, "A".repeat(end1 - beg1 + 1), vec!["T".to_string()])
                .unwrap();
        r.set_info_string("VT", "VNTR");
        r
    }

    fn collect(engine: &mut Engine, records: Vec<(usize, VariantRecord)>) -> Vec<VariantRecord> {
        let mut out = Vec::new();
        let mut sink = |r: VariantRecord| out.push(r);
        for (rid, record) in records {
            engine.ingest("test.vcf", rid, record, &mut sink).unwrap();
        }
        engine.finalize(&mut sink);
        out
    }

    #[test]
    fn s1_no_overlap_both_pass_through_unflagged() {
        let mut engine = Engine::new();
        let out = collect(
            &mut engine,
            vec![(0, snp(100, "C")), (0, snp(5000, "T"))],
        );
        assert_eq!(out.len(), 2);
        for record in &out {
            assert_eq!(record.get_info_int_array("OVERLAPS"), Some(vec![0, 0, 0]));
            assert!(!record.has_filters());
        }
    }

    #[test]
    fn s2_two_snps_spawn_a_multiallelic_container() {
        let mut engine = Engine::new();
        let out = collect(
            &mut engine,
            vec![(0, snp(100, "C")), (0, snp(100, "G"))],
        );

        // The spawned container is pushed to the front inside
        // `interaction_phase`, before `ingest` pushes the incoming SNP in
        // front of that — so buffer order front-to-back is [SNP2, spawn,
        // SNP1], and `finalize`'s tail-to-front drain emits SNP1, then the
        // synthesized record, then SNP2.
        assert_eq!(out.len(), 3);
        assert!(out[0].has_filters());
        assert_eq!(out[0].get_info_int_array("OVERLAPS"), Some(vec![1, 0, 0]));
        assert!(!out[1].has_filters());
        assert_eq!(out[1].alternate_bases(), vec!["C".to_string(), "G".to_string()]);
        assert_eq!(out[1].get_info_int_array("OVERLAPS"), Some(vec![2, 0, 0]));
        assert!(out[2].has_filters());
        assert_eq!(out[2].get_info_int_array("OVERLAPS"), Some(vec![1, 0, 0]));
        assert_eq!(engine.stats().no_new_multiallelic_snps, 1);
    }

    #[test]
    fn s3_snp_inside_indel_flags_both_without_synthesis() {
        let mut engine = Engine::new();
        let out = collect(
            &mut engine,
            vec![(0, snp(100, "C")), (0, indel(99, "AT", "A"))],
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get_info_int_array("OVERLAPS"), Some(vec![0, 1, 0]));
        assert_eq!(out[1].get_info_int_array("OVERLAPS"), Some(vec![1, 0, 0]));
    }

    #[test]
    fn s4_vntr_absorbs_snp_without_synthesis() {
        let mut engine = Engine::new();
        let out = collect(
            &mut engine,
            vec![(0, snp(100, "C")), (0, vntr(95, 110))],
        );
        assert_eq!(out.len(), 2);
        // SNP buffered first, VNTR arrives second: this hits the
        // non-anomalous (Vntr, Snp) table cell, not the (Snp, Vntr) one
        // documented in §9 — both sides get their own counters bumped.
        assert!(out[0].has_filters());
        assert_eq!(out[0].get_info_int_array("OVERLAPS"), Some(vec![0, 0, 1]));
        assert!(out[1].has_filters());
        assert_eq!(out[1].get_info_int_array("OVERLAPS"), Some(vec![1, 0, 0]));
        assert_eq!(engine.stats().no_new_multiallelic_snps, 0);
    }

    #[test]
    fn s6_unordered_input_is_rejected() {
        let mut engine = Engine::new();
        let mut sink = |_: VariantRecord| {};
        engine.ingest("test.vcf", 0, snp(100, "C"), &mut sink).unwrap();
        let err = engine.ingest("test.vcf", 0, snp(50, "T"), &mut sink);
        assert!(err.is_err());
    }
}
