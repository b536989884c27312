//! The `Variant` entity: a buffered record plus its overlap bookkeeping.

use crate::vcf::{VariantKind, VariantRecord};

/// The five shapes a buffered [`Variant`] can take.
///
/// `Undefined` is not a classification of an input record — it tags a
/// *pending multi-allelic container*, synthesized in-buffer when two
/// compatible biallelic records collide at a position (see
/// `engine::apply_overlap_rule`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantState {
    Snp,
    Indel,
    Vntr,
    Other,
    Undefined,
}

impl From<VariantKind> for VariantState {
    fn from(kind: VariantKind) -> Self {
        match kind {
            VariantKind::Snp => VariantState::Snp,
            VariantKind::Indel => VariantState::Indel,
            VariantKind::Vntr => VariantState::Vntr,
            VariantKind::Other => VariantState::Other,
        }
    }
}

/// A buffered variant: the in-memory wrapper the sliding window holds.
///
/// Invariants: `beg1 <= end1`; the three `n_overlap_*` counters only ever
/// grow while the variant is resident in the buffer; `children` is empty
/// unless `state == Undefined`.
#[derive(Debug, Clone)]
pub struct Variant {
    pub rid: usize,
    pub beg1: i64,
    pub end1: i64,
    pub state: VariantState,
    /// The underlying record. `None` only transiently, after it has been
    /// handed to the sink at emit time.
    pub record: Option<VariantRecord>,
    /// Constituent biallelic records of a pending multi-allelic container.
    /// Non-empty only when `state == Undefined`.
    pub children: Vec<VariantRecord>,
    pub n_overlap_snp: u32,
    pub n_overlap_indel: u32,
    pub n_overlap_vntr: u32,
}

impl Variant {
    pub fn new(rid: usize, beg1: i64, end1: i64, state: VariantState, record: VariantRecord) -> Self {
        debug_assert!(beg1 <= end1);
        Self {
            rid,
            beg1,
            end1,
            state,
            record: Some(record),
            children: Vec::new(),
            n_overlap_snp: 0,
            n_overlap_indel: 0,
            n_overlap_vntr: 0,
        }
    }

    /// Construct the pending multi-allelic container spawned when two
    /// compatible biallelic records collide (§4.1 overlap rule table).
    /// Takes its position from `first` — the earlier (already-buffered)
    /// constituent — matching `Variant(cvariant, variant)` in the original.
    /// `n_overlap_snp`/`n_overlap_indel` seed at 2 for a same-type pair per
    /// the rule table (e.g. SNP-SNP seeds `n_overlap_snp=2`).
    pub fn new_pending_multiallelic(
        first: &Variant,
        first_record: VariantRecord,
        second_record: VariantRecord,
        kind: VariantKind,
    ) -> Self {
        let (n_overlap_snp, n_overlap_indel, n_overlap_vntr) = match kind {
            VariantKind::Snp => (2, 0, 0),
            VariantKind::Indel => (0, 2, 0),
            VariantKind::Vntr => (0, 0, 2),
            VariantKind::Other => (0, 0, 0),
        };
        Self {
            rid: first.rid,
            beg1: first.beg1,
            end1: first.end1,
            state: VariantState::Undefined,
            record: None,
            children: vec![first_record, second_record],
            n_overlap_snp,
            n_overlap_indel,
            n_overlap_vntr,
        }
    }

    pub fn overlaps(&self, other: &Variant) -> bool {
        self.rid == other.rid && self.end1 >= other.beg1 && self.beg1 <= other.end1
    }

    pub fn overlap_counts(&self) -> [i32; 3] {
        [
            self.n_overlap_snp as i32,
            self.n_overlap_indel as i32,
            self.n_overlap_vntr as i32,
        ]
    }
}
