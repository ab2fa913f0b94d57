//! Tone curve representation and the PQ/HLG transfer function math.

/// A profile's tone reproduction curve, as derived from an ICC TRC tag or
/// supplied directly when synthesizing a profile.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Curve {
    /// Pure power law, `out = in^g`, `g > 0`.
    Gamma(f64),
    /// SMPTE ST.2084 perceptual quantizer. No parameters.
    Pq,
    /// ARIB/BT.2100 Hybrid Log-Gamma. No parameters.
    Hlg,
    /// A parametric or LUT-based curve that does not reduce to a scalar
    /// gamma. Carries an optional estimated gamma for reporting (negative
    /// when unknown) and an optional scale extracted from an A2B0
    /// matrix-curve tag.
    Complex { estimated_gamma: Option<f64>, matrix_curve_scale: Option<f64> },
    /// No tone curve tag was present.
    Unknown,
}

impl Curve {
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        matches!(self, Curve::Gamma(_) | Curve::Pq | Curve::Hlg)
    }
}

/// The per-direction transfer function an engine kernel actually evaluates.
/// Symmetric for EOTF (decode) and OETF (encode) use: for the destination
/// side, `Gamma` already carries the inverted exponent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TransferKind {
    /// Identity; used for XYZ pass-through.
    None,
    Gamma(f64),
    Pq,
    Hlg,
}

impl TransferKind {
    /// Converts a linear sample decoded from, or destined for, one side of
    /// a transform. For a source curve this is the EOTF (code value ->
    /// linear); for a destination curve (with `Gamma` already carrying
    /// `1/g`) this is the OETF (linear -> code value).
    #[inline]
    #[must_use]
    pub fn apply(&self, x: f32) -> f32 {
        match self {
            TransferKind::None => x,
            TransferKind::Gamma(g) => x.max(0.0).powf(*g as f32),
            TransferKind::Pq => pq_eotf(x),
            TransferKind::Hlg => hlg_eotf(x),
        }
    }
}

// SMPTE ST.2084 constants, reproduced exactly as specified.
const PQ_C1: f64 = 3424.0 / 4096.0;
const PQ_C2: f64 = 32.0 * 2413.0 / 4096.0;
const PQ_C3: f64 = 32.0 * 2392.0 / 4096.0;
const PQ_M1: f64 = (2610.0 / 4096.0) / 4.0;
const PQ_M2: f64 = 128.0 * 2523.0 / 4096.0;

/// PQ EOTF: display light from code value `n` (equation 4.1).
#[must_use]
pub fn pq_eotf(n: f32) -> f32 {
    let n = n as f64;
    let np = n.max(0.0).powf(1.0 / PQ_M2);
    let numerator = (np - PQ_C1).max(0.0);
    let denominator = PQ_C2 - PQ_C3 * np;
    (numerator / denominator).powf(1.0 / PQ_M1) as f32
}

/// PQ OETF: code value from display light `l` (equation 5.2).
#[must_use]
pub fn pq_oetf(l: f32) -> f32 {
    let l = (l as f64).max(0.0);
    let lm = l.powf(PQ_M1);
    ((PQ_C1 + PQ_C2 * lm) / (1.0 + PQ_C3 * lm)).powf(PQ_M2) as f32
}

// BT.2100 Hybrid Log-Gamma constants.
const HLG_A: f64 = 0.17883277;
const HLG_B: f64 = 1.0 - 4.0 * HLG_A;
const HLG_C: f64 = 0.5 - HLG_A * (4.0 * HLG_A).ln();

/// HLG OETF: scene linear to non-linear signal, in `[0, 1]`.
#[must_use]
pub fn hlg_oetf(e: f32) -> f32 {
    let e = (e as f64).max(0.0);
    let v = if e <= 1.0 / 12.0 {
        (3.0 * e).sqrt()
    } else {
        HLG_A * (12.0 * e - HLG_B).ln() + HLG_C
    };
    v as f32
}

/// HLG EOTF: non-linear signal to scene linear. This crate treats HLG as
/// a self-inverse pair (OETF/inverse-OETF) rather than applying the
/// system gamma and ambient surround adjustment of the full display
/// EOTF, matching the scope of the rest of the built-in math (no
/// viewing-environment state is modeled).
#[must_use]
pub fn hlg_eotf(v: f32) -> f32 {
    let v = (v as f64).max(0.0);
    let e = if v <= 0.5 {
        (v * v) / 3.0
    } else {
        (((v - HLG_C) / HLG_A).exp() + HLG_B) / 12.0
    };
    e as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pq_round_trips() {
        for n in [0.0f32, 0.1, 0.25, 0.5081, 0.75, 1.0] {
            let l = pq_eotf(n);
            let back = pq_oetf(l);
            assert!((back - n).abs() < 1e-4, "n={n} back={back}");
        }
    }

    #[test]
    fn pq_decode_point() {
        let l = pq_eotf(0.5081);
        assert!((l - 0.01).abs() < 1e-3, "l={l}");
    }

    #[test]
    fn hlg_round_trips() {
        for e in [0.0f32, 0.05, 0.2, 0.5, 0.9, 1.0] {
            let v = hlg_oetf(e);
            let back = hlg_eotf(v);
            assert!((back - e).abs() < 1e-3, "e={e} back={back}");
        }
    }

    #[test]
    fn gamma_transfer_kind() {
        let k = TransferKind::Gamma(2.4);
        assert!((k.apply(0.5) - 0.5f32.powf(2.4)).abs() < 1e-6);
    }

    #[test]
    fn identity_transfer_kind() {
        assert_eq!(0.37, TransferKind::None.apply(0.37));
    }
}
