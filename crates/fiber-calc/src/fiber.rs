//! V-Number & Dispersion Calculator
//!
//! - V-number: normalized frequency of a step-index fiber, which decides
//!   single- vs multi-mode propagation
//! - Dispersion: pulse spreading over a fiber span and the bit rate it allows

use crate::format::{to_fixed, to_fixed_trimmed};
use crate::parse::parse_required;
use crate::{require_finite, CalcError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use tracing::debug;

/// First zero of J₀: below this V only the fundamental mode is guided
pub const SINGLE_MODE_CUTOFF: f64 = 2.405;

const MICRON_M: f64 = 1e-6;
const NANOMETER_M: f64 = 1e-9;
const PICOSECOND_S: f64 = 1e-12;

const V_NUMBER_FIELDS: &str = "core radius, wavelength and NA";
const DISPERSION_FIELDS: &str = "dispersion coefficient, length and spectral width";
const DISPERSION_POSITIVE_FIELDS: &str = "Length and spectral width";

// ============================================================================
// V-Number
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VNumberInputs {
    pub core_radius_um: f64,
    pub wavelength_nm: f64,
    pub numerical_aperture: f64,
}

impl VNumberInputs {
    pub fn from_fields(core_radius_um: &str, wavelength_nm: &str, na: &str) -> Result<Self> {
        let [a, lambda, na] = parse_required([core_radius_um, wavelength_nm, na], V_NUMBER_FIELDS)?;
        Ok(Self {
            core_radius_um: a,
            wavelength_nm: lambda,
            numerical_aperture: na,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FiberMode {
    SingleMode,
    MultiMode,
}

impl FiberMode {
    /// Strict comparison: V exactly at the cutoff is multi-mode.
    pub fn classify(v: f64) -> Self {
        if v < SINGLE_MODE_CUTOFF {
            Self::SingleMode
        } else {
            Self::MultiMode
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SingleMode => "Single-mode",
            Self::MultiMode => "Multi-mode",
        }
    }
}

impl fmt::Display for FiberMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VNumber {
    pub v: f64,
    pub fiber_mode: FiberMode,
    /// Guided mode count; step-index approximation ⌊V²/2⌋ when multi-mode.
    /// Kept as `f64` since large cores push it past any integer type.
    pub mode_count: f64,
}

impl VNumber {
    pub fn v_display(&self) -> String {
        to_fixed(self.v, 4)
    }

    pub fn mode_count_display(&self) -> String {
        if self.mode_count == 1.0 {
            "1 mode".to_string()
        } else {
            format!("{} modes", to_fixed_trimmed(self.mode_count, 0))
        }
    }
}

/// V = (2π·a / λ)·NA, with a in µm and λ in nm.
pub fn v_number(inputs: &VNumberInputs) -> Result<VNumber> {
    let VNumberInputs {
        core_radius_um: a,
        wavelength_nm: lambda,
        numerical_aperture: na,
    } = *inputs;

    require_finite(&[a, lambda, na], V_NUMBER_FIELDS)?;
    if a <= 0.0 || lambda <= 0.0 || na <= 0.0 {
        return Err(CalcError::NonPositiveValue("All values"));
    }
    if na > 1.0 {
        return Err(CalcError::OutOfRangeNA);
    }

    let a_m = a * MICRON_M;
    let lambda_m = lambda * NANOMETER_M;
    let v = (2.0 * PI * a_m / lambda_m) * na;

    let fiber_mode = FiberMode::classify(v);
    let mode_count = match fiber_mode {
        FiberMode::SingleMode => 1.0,
        FiberMode::MultiMode => ((v * v) / 2.0).floor(),
    };

    debug!(
        "V-number: a={}um lambda={}nm NA={} -> V={} {} ({} modes)",
        a, lambda, na, v, fiber_mode, mode_count
    );

    Ok(VNumber {
        v,
        fiber_mode,
        mode_count,
    })
}

// ============================================================================
// Dispersion
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DispersionInputs {
    /// Signed dispersion coefficient, ps/(nm·km)
    pub coefficient_ps_nm_km: f64,
    pub length_km: f64,
    pub spectral_width_nm: f64,
}

impl DispersionInputs {
    pub fn from_fields(
        coefficient: &str,
        length_km: &str,
        spectral_width_nm: &str,
    ) -> Result<Self> {
        let [d, l, width] =
            parse_required([coefficient, length_km, spectral_width_nm], DISPERSION_FIELDS)?;
        Ok(Self {
            coefficient_ps_nm_km: d,
            length_km: l,
            spectral_width_nm: width,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitRateUnit {
    Gbps,
    Mbps,
    Kbps,
}

impl BitRateUnit {
    /// Largest unit whose threshold the rate reaches; kbps below 1 Mbps.
    pub fn for_rate(bits_per_second: f64) -> Self {
        if bits_per_second >= 1e9 {
            Self::Gbps
        } else if bits_per_second >= 1e6 {
            Self::Mbps
        } else {
            Self::Kbps
        }
    }

    pub fn scale(&self) -> f64 {
        match self {
            Self::Gbps => 1e9,
            Self::Mbps => 1e6,
            Self::Kbps => 1e3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Gbps => "Gbps",
            Self::Mbps => "Mbps",
            Self::Kbps => "kbps",
        }
    }
}

/// Maximum bit rate a span supports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BitRate {
    Finite { bits_per_second: f64 },
    /// No pulse spreading (D = 0), so dispersion imposes no limit
    Unbounded,
}

impl BitRate {
    fn from_spreading(delta_t_s: f64) -> Self {
        let rate = 1.0 / (4.0 * delta_t_s);
        if rate.is_finite() {
            Self::Finite {
                bits_per_second: rate,
            }
        } else {
            Self::Unbounded
        }
    }

    pub fn bits_per_second(&self) -> Option<f64> {
        match self {
            Self::Finite { bits_per_second } => Some(*bits_per_second),
            Self::Unbounded => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Finite { bits_per_second } => {
                let unit = BitRateUnit::for_rate(*bits_per_second);
                format!("{} {}", to_fixed(bits_per_second / unit.scale(), 3), unit.label())
            }
            Self::Unbounded => "Unbounded".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dispersion {
    /// Pulse spreading Δt in ps (always a magnitude)
    pub pulse_spread_ps: f64,
    pub max_bit_rate: BitRate,
}

impl Dispersion {
    /// Time dispersion and pulse broadening both show this value
    pub fn pulse_spread_display(&self) -> String {
        format!("{} ps", to_fixed(self.pulse_spread_ps, 3))
    }

    pub fn max_bit_rate_display(&self) -> String {
        self.max_bit_rate.display()
    }
}

/// Δt = |D·L·Δλ|; the bit rate keeps spreading within a quarter bit period.
pub fn dispersion(inputs: &DispersionInputs) -> Result<Dispersion> {
    let DispersionInputs {
        coefficient_ps_nm_km: d,
        length_km: l,
        spectral_width_nm: width,
    } = *inputs;

    require_finite(&[d, l, width], DISPERSION_FIELDS)?;
    if l <= 0.0 || width <= 0.0 {
        return Err(CalcError::NonPositiveValue(DISPERSION_POSITIVE_FIELDS));
    }

    let delta_t_ps = (d * l * width).abs();
    let max_bit_rate = BitRate::from_spreading(delta_t_ps * PICOSECOND_S);

    debug!(
        "Dispersion: D={} L={}km dl={}nm -> dt={}ps rate={:?}",
        d, l, width, delta_t_ps, max_bit_rate
    );

    Ok(Dispersion {
        pulse_spread_ps: delta_t_ps,
        max_bit_rate,
    })
}
