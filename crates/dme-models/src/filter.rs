//! Smoothing filter parameters.

/// Gaussian blur strength bounds.
pub const BLUR_MIN: f64 = 0.0;
pub const BLUR_MAX: f64 = 3.0;
pub const DEFAULT_BLUR: f64 = 0.5;

/// Bilateral range sigma bounds.
pub const SIGMA_R_MIN: f64 = 0.0;
pub const SIGMA_R_MAX: f64 = 0.040;
pub const DEFAULT_SIGMA_R: f64 = 0.020;

/// Derive the bilateral range sigma from the blur strength.
///
/// Piecewise linear: flat at 0.020 up to a blur of 0.6, rising to the
/// 0.040 ceiling at 1.2. Rounded to three decimals.
pub fn auto_balance_sigma_r(blur: f64) -> f64 {
    let sigma_r = if blur <= 0.6 {
        0.020
    } else if blur <= 0.8 {
        0.020 + (blur - 0.6) * 0.03
    } else if blur <= 1.0 {
        0.026 + (blur - 0.8) * 0.035
    } else if blur <= 1.2 {
        0.033 + (blur - 1.0) * 0.035
    } else {
        SIGMA_R_MAX
    };

    (sigma_r * 1000.0).round() / 1000.0
}
