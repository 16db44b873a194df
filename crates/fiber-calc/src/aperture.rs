//! Numerical Aperture Calculator
//!
//! Two ways to arrive at a fiber's NA:
//! - Refractive mode: from core (n₁) and cladding (n₂) indices
//! - Diameter mode: from the spot a diverging beam projects at a distance

use crate::format::{degrees, to_fixed};
use crate::parse::parse_required;
use crate::units::{LengthQuantity, LengthUnit};
use crate::{require_finite, CalcError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const REFRACTIVE_FIELDS: &str = "n1 and n2";
const DIAMETER_FIELDS: &str = "D and L";

/// Core and cladding refractive indices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefractiveInputs {
    pub n1: f64,
    pub n2: f64,
}

impl RefractiveInputs {
    pub fn from_fields(n1: &str, n2: &str) -> Result<Self> {
        let [n1, n2] = parse_required([n1, n2], REFRACTIVE_FIELDS)?;
        Ok(Self { n1, n2 })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefractiveAperture {
    pub numerical_aperture: f64,
    pub acceptance_angle_deg: f64,
    pub critical_angle_deg: f64,
}

impl RefractiveAperture {
    pub fn numerical_aperture_display(&self) -> String {
        to_fixed(self.numerical_aperture, 4)
    }

    pub fn acceptance_angle_display(&self) -> String {
        degrees(self.acceptance_angle_deg)
    }

    pub fn critical_angle_display(&self) -> String {
        degrees(self.critical_angle_deg)
    }
}

/// NA, acceptance angle and critical angle from two refractive indices.
///
/// Guided propagation needs both indices ≥ 1 and n₂ < n₁.
pub fn numerical_aperture_refractive(inputs: &RefractiveInputs) -> Result<RefractiveAperture> {
    let RefractiveInputs { n1, n2 } = *inputs;

    require_finite(&[n1, n2], REFRACTIVE_FIELDS)?;
    if n1 < 1.0 || n2 < 1.0 {
        return Err(CalcError::BelowUnityIndex);
    }
    if n2 >= n1 {
        return Err(CalcError::InvalidIndexOrdering);
    }

    let na = (n1 * n1 - n2 * n2).sqrt();
    // NA can exceed 1 for high-contrast pairs; asin needs the clamp
    let acceptance = na.min(1.0).asin().to_degrees();
    let critical = (n2 / n1).asin().to_degrees();

    debug!(
        "Refractive NA: n1={} n2={} -> NA={} theta={} theta_c={}",
        n1, n2, na, acceptance, critical
    );

    Ok(RefractiveAperture {
        numerical_aperture: na,
        acceptance_angle_deg: acceptance,
        critical_angle_deg: critical,
    })
}

/// Spot diameter and distance, each in its own unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiameterInputs {
    pub spot_diameter: LengthQuantity,
    pub distance: LengthQuantity,
}

impl DiameterInputs {
    /// Build from raw form fields. Unknown unit codes are read as mm.
    pub fn from_fields(
        diameter: &str,
        diameter_unit: &str,
        distance: &str,
        distance_unit: &str,
    ) -> Result<Self> {
        let [d, l] = parse_required([diameter, distance], DIAMETER_FIELDS)?;
        Ok(Self {
            spot_diameter: LengthQuantity::new(d, LengthUnit::from_code_lenient(diameter_unit)),
            distance: LengthQuantity::new(l, LengthUnit::from_code_lenient(distance_unit)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DivergenceAperture {
    pub numerical_aperture: f64,
    pub half_angle_deg: f64,
    pub full_angle_deg: f64,
}

impl DivergenceAperture {
    pub fn numerical_aperture_display(&self) -> String {
        to_fixed(self.numerical_aperture, 4)
    }

    pub fn half_angle_display(&self) -> String {
        degrees(self.half_angle_deg)
    }

    pub fn full_angle_display(&self) -> String {
        degrees(self.full_angle_deg)
    }
}

/// NA and divergence angles from spot diameter D at distance L.
pub fn numerical_aperture_divergence(inputs: &DiameterInputs) -> Result<DivergenceAperture> {
    let (d_raw, l_raw) = (inputs.spot_diameter.value, inputs.distance.value);

    require_finite(&[d_raw, l_raw], DIAMETER_FIELDS)?;
    if d_raw <= 0.0 || l_raw <= 0.0 {
        return Err(CalcError::NonPositiveValue(DIAMETER_FIELDS));
    }

    let d_mm = inputs.spot_diameter.to_millimeters();
    let l_mm = inputs.distance.to_millimeters();

    let half_angle_rad = (d_mm / (2.0 * l_mm)).atan();
    let na = half_angle_rad.sin();
    let half_angle = half_angle_rad.to_degrees();

    debug!(
        "Divergence NA: D={}mm L={}mm -> NA={} half={}",
        d_mm, l_mm, na, half_angle
    );

    Ok(DivergenceAperture {
        numerical_aperture: na,
        half_angle_deg: half_angle,
        full_angle_deg: half_angle * 2.0,
    })
}
