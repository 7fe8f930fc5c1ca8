//! Lower/upper bound generation.
//!
//! Lower bounds anchor on the smaller reference price and round toward
//! negative infinity; upper bounds anchor on the larger one and round toward
//! positive infinity, so the emitted interval never narrows the raw one.

use bounds_core::{BoundaryRow, Price, ReferencePrices, SigmaProfile};

/// Scaled-unit slack absorbing representation error before `floor`/`ceil`,
/// so `0.29` at 2 decimals stays `0.29` instead of dropping to `0.28`.
const SCALE_TOLERANCE: f64 = 1e-9;

/// Round down to `precision` decimals.
#[inline]
pub fn floor_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor + SCALE_TOLERANCE).floor() / factor
}

/// Round up to `precision` decimals.
#[inline]
pub fn ceil_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor - SCALE_TOLERANCE).ceil() / factor
}

/// Round half away from zero to `precision` decimals.
#[inline]
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Bound generator for a fixed output precision.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryGenerator {
    precision: u32,
}

impl BoundaryGenerator {
    /// Create a generator emitting `precision` decimals.
    pub fn new(precision: u32) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Unrounded `(lower, upper)` for a sigma.
    #[inline]
    pub fn raw_bounds(sigma: f64, references: &ReferencePrices) -> (Price, Price) {
        (
            references.min_price() * (1.0 - sigma),
            references.max_price() * (1.0 + sigma),
        )
    }

    /// Rounded `(lower, upper)` for a sigma.
    pub fn bounds(&self, sigma: f64, references: &ReferencePrices) -> (Price, Price) {
        let (lower, upper) = Self::raw_bounds(sigma, references);
        // Re-round to strip residue left by the floor/ceil division.
        (
            round_to(floor_to(lower, self.precision), self.precision),
            round_to(ceil_to(upper, self.precision), self.precision),
        )
    }

    /// One row per minute of the profile.
    pub fn generate(&self, profile: &SigmaProfile, references: &ReferencePrices) -> Vec<BoundaryRow> {
        profile
            .points()
            .iter()
            .map(|point| {
                let (lower, upper) = self.bounds(point.sigma, references);
                BoundaryRow {
                    time: point.time,
                    lower,
                    upper,
                }
            })
            .collect()
    }
}
