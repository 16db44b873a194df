//! Fiber Calculator Engine
//!
//! Stateless formula engine behind the OptiCom optical toolbox calculators.
//! Every calculator is a pure function: one input record in, one immutable
//! result record (or a typed validation failure) out.
//!
//! # Calculators
//!
//! | Mode | Formula |
//! |------|---------|
//! | NA (refractive) | `NA = √(n₁² − n₂²)` |
//! | NA (diameter/distance) | `NA = sin(atan(D / 2L))` |
//! | V-number | `V = (2π·a / λ)·NA` |
//! | Dispersion | `Δt = \|D·L·Δλ\|`, `B = 1 / (4·Δt)` |
//! | dBm ⇌ mW | `P_mW = 10^(P_dBm/10)` |
//! | Link power budget | `P_rx = P_tx − Σ losses` |
//!
//! Raw form fields go through [`parse`] first; display strings come from
//! [`format`], and the [`calculator`] registry ties modes, fields and
//! readouts together for front ends.

use serde::Serialize;
use thiserror::Error;

pub mod aperture;
pub mod calculator;
pub mod fiber;
pub mod format;
pub mod link_budget;
pub mod parse;
pub mod power;
pub mod units;

pub use aperture::{
    numerical_aperture_divergence, numerical_aperture_refractive, DiameterInputs,
    DivergenceAperture, RefractiveAperture, RefractiveInputs,
};
pub use calculator::{
    evaluate, evaluate_with, Calculator, EvalConfig, FieldSpec, Fields, Mode, Readout,
    ReadoutEntry, UnknownMode,
};
pub use fiber::{
    dispersion, v_number, BitRate, BitRateUnit, Dispersion, DispersionInputs, FiberMode,
    VNumber, VNumberInputs, SINGLE_MODE_CUTOFF,
};
pub use link_budget::{
    link_power_budget, link_power_budget_strict, LinkBudget, LinkBudgetFields, LinkBudgetInputs,
};
pub use power::{dbm_to_milliwatts, milliwatts_to_dbm, PowerValue};
pub use units::{to_millimeters, LengthQuantity, LengthUnit};

/// Validation failures shared by every calculator.
///
/// Field names carried by a variant are the user-facing labels of the
/// offending inputs, so the message can be shown as-is.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum CalcError {
    #[error("Enter valid numeric values for {0}")]
    NotANumber(&'static str),
    #[error("Refractive index cannot be less than 1")]
    BelowUnityIndex,
    #[error("n2 must be smaller than n1 for total internal reflection")]
    InvalidIndexOrdering,
    #[error("{0} must be greater than 0")]
    NonPositiveValue(&'static str),
    #[error("NA cannot be greater than 1")]
    OutOfRangeNA,
    #[error("{0} cannot be negative")]
    NegativeValue(&'static str),
}

impl CalcError {
    /// Stable machine-readable identifier for the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotANumber(_) => "not_a_number",
            Self::BelowUnityIndex => "below_unity_index",
            Self::InvalidIndexOrdering => "invalid_index_ordering",
            Self::NonPositiveValue(_) => "non_positive_value",
            Self::OutOfRangeNA => "out_of_range_na",
            Self::NegativeValue(_) => "negative_value",
        }
    }
}

pub type Result<T> = std::result::Result<T, CalcError>;

/// Fail with `NotANumber` unless every value is finite.
pub(crate) fn require_finite(values: &[f64], fields: &'static str) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(CalcError::NotANumber(fields))
    }
}
