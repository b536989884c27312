//! Diagnostic log-likelihood-ratio helper.
//!
//! Reproduces the original tool's `compute_glfsingle_llr`: given the pooled
//! "non-reference" evidence count `e` out of `n` observations at a candidate
//! multi-allelic site, estimate how strongly the evidence favors a
//! homozygous-reference call over a variant call under a simple three-state
//! genotype model. This is purely diagnostic — it is logged for the complex
//! multi-allelic branch and never affects which alleles are emitted.

const LN_THETA: f64 = -6.907_755;
const LN_ONE_MINUS_THETA: f64 = -0.001_000_5;
const LN_ONE_THIRD: f64 = -1.098_612;
const LN_TWO_THIRDS: f64 = -0.405_465_1;
const LN_0_001: f64 = -6.907_755;
const LN_0_999: f64 = -0.001_000_5;
const LN_0_5: f64 = -0.693_147_2;

/// `ln(exp(a) + exp(b))`, computed without overflow.
fn logspace_add(a: f64, b: f64) -> f64 {
    if a.is_infinite() && a < 0.0 {
        return b;
    }
    if b.is_infinite() && b < 0.0 {
        return a;
    }
    if a > b {
        a + (1.0 + (b - a).exp()).ln()
    } else {
        b + (1.0 + (a - b).exp()).ln()
    }
}

/// Compute the diagnostic log-likelihood ratio for `e` alt-supporting
/// observations out of `n` total, under a model that places mass `1-theta`
/// on homozygous-reference and splits the remaining `theta` 1:2 between
/// het and homozygous-alt. Returns `ln(P(data|RR)) - ln(P(data))`.
pub fn compute_glfsingle_llr(e: u32, n: u32) -> f64 {
    let e = e as f64;
    let n = n as f64;

    let ln_p_rr = (n - e) * LN_0_999 + e * LN_0_001;
    let ln_p_ra = n * LN_0_5;
    let ln_p_aa = e * LN_0_999 + (n - e) * LN_0_001;

    let mut ln_lr = LN_ONE_MINUS_THETA + ln_p_rr;
    ln_lr = logspace_add(ln_lr, LN_ONE_THIRD + LN_THETA + ln_p_ra);
    ln_lr = logspace_add(ln_lr, LN_TWO_THIRDS + LN_THETA + ln_p_aa);

    ln_p_rr - ln_lr
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn all_reference_evidence_favors_rr() {
        let llr = compute_glfsingle_llr(0, 30);
        assert!(llr > -0.01, "expected llr close to 0, got {llr}");
    }

    #[test]
    fn all_alt_evidence_disfavors_rr() {
        let llr = compute_glfsingle_llr(30, 30);
        assert!(llr < -10.0, "expected strongly negative llr, got {llr}");
    }

    #[test]
    fn logspace_add_matches_naive_sum_in_log_space() {
        let a = -1.0_f64;
        let b = -2.0_f64;
        let expected = (a.exp() + b.exp()).ln();
        assert!(approx_eq!(f64, logspace_add(a, b), expected, epsilon = 1e-9));
    }

    #[test]
    fn logspace_add_handles_neg_infinity_identity() {
        assert_eq!(logspace_add(f64::NEG_INFINITY, -3.0), -3.0);
        assert_eq!(logspace_add(-3.0, f64::NEG_INFINITY), -3.0);
    }
}
