//! Calculator registry and form dispatch
//!
//! Front ends hand a [`Mode`] and the raw text of its form fields to
//! [`evaluate`] and render the [`Readout`] that comes back. Each mode knows
//! its fields and the values its form resets to.

use crate::aperture::{
    numerical_aperture_divergence, numerical_aperture_refractive, DiameterInputs,
    RefractiveInputs,
};
use crate::fiber::{dispersion, v_number, DispersionInputs, VNumberInputs};
use crate::link_budget::{
    link_power_budget, link_power_budget_strict, LinkBudgetFields, LinkBudgetInputs,
};
use crate::power::{
    dbm_display, dbm_to_milliwatts_field, milliwatts_display, milliwatts_to_dbm_field,
};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raw form input keyed by field name
pub type Fields = HashMap<String, String>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown calculator mode: {0}")]
pub struct UnknownMode(pub String);

/// Calculator pages of the optical toolbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Calculator {
    NumericalAperture,
    VNumberDispersion,
    UnitConverter,
    LinkPowerBudget,
}

impl Calculator {
    pub const ALL: [Calculator; 4] = [
        Calculator::NumericalAperture,
        Calculator::VNumberDispersion,
        Calculator::UnitConverter,
        Calculator::LinkPowerBudget,
    ];

    /// Page identifier used by the site
    pub fn page_id(&self) -> &'static str {
        match self {
            Self::NumericalAperture => "NACalculator",
            Self::VNumberDispersion => "VDCalculator",
            Self::UnitConverter => "UCCalculator",
            Self::LinkPowerBudget => "LPBCalculator",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::NumericalAperture => "Numerical Aperture Calculator",
            Self::VNumberDispersion => "V-Number & Dispersion Calculator",
            Self::UnitConverter => "Unit Converter (dBm ⇌ mW)",
            Self::LinkPowerBudget => "Link Power Budget Calculator",
        }
    }

    /// Tabs on the page, first one shown by default
    pub fn modes(&self) -> &'static [Mode] {
        match self {
            Self::NumericalAperture => &[Mode::NaRefractive, Mode::NaDiameter],
            Self::VNumberDispersion => &[Mode::VNumber, Mode::Dispersion],
            Self::UnitConverter => &[Mode::DbmToMw, Mode::MwToDbm],
            Self::LinkPowerBudget => &[Mode::LinkBudget],
        }
    }
}

/// One form field: key, label, and the value the form resets to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub default: &'static str,
}

const fn field(key: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        default,
    }
}

const NA_REFRACTIVE_FIELDS: [FieldSpec; 2] = [
    field("n1", "Core refractive index (n₁)", "1.50"),
    field("n2", "Cladding refractive index (n₂)", "1.48"),
];

const NA_DIAMETER_FIELDS: [FieldSpec; 4] = [
    field("diameter", "Spot diameter (D)", "25.4"),
    field("diameter_unit", "Diameter unit", "mm"),
    field("distance", "Distance (L)", "100"),
    field("distance_unit", "Distance unit", "mm"),
];

const V_NUMBER_FIELDS: [FieldSpec; 3] = [
    field("core_radius_um", "Core radius a (µm)", ""),
    field("wavelength_nm", "Wavelength λ (nm)", ""),
    field("na", "Numerical aperture (NA)", ""),
];

const DISPERSION_FIELDS: [FieldSpec; 3] = [
    field("coefficient", "Dispersion coefficient D (ps/nm·km)", ""),
    field("length_km", "Fiber length L (km)", ""),
    field("spectral_width_nm", "Spectral width Δλ (nm)", ""),
];

const DBM_TO_MW_FIELDS: [FieldSpec; 1] = [field("dbm", "Power (dBm)", "10")];

const MW_TO_DBM_FIELDS: [FieldSpec; 1] = [field("mw", "Power (mW)", "10")];

const LINK_BUDGET_FIELDS: [FieldSpec; 7] = [
    field("tx_power_dbm", "Tx power (dBm)", "3"),
    field("rx_sensitivity_dbm", "Rx sensitivity (dBm)", "-28"),
    field("fiber_length_km", "Fiber length (km)", "10"),
    field("loss_per_km_db", "Fiber loss (dB/km)", "0.35"),
    field("connector_loss_db", "Connector loss (dB)", "0.5"),
    field("splice_loss_db", "Splice loss (dB)", "0.1"),
    field("splitter_loss_db", "Splitter loss (dB)", "0"),
];

/// A single calculation a form can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    NaRefractive,
    NaDiameter,
    VNumber,
    Dispersion,
    DbmToMw,
    MwToDbm,
    LinkBudget,
}

impl Mode {
    pub const ALL: [Mode; 7] = [
        Mode::NaRefractive,
        Mode::NaDiameter,
        Mode::VNumber,
        Mode::Dispersion,
        Mode::DbmToMw,
        Mode::MwToDbm,
        Mode::LinkBudget,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::NaRefractive => "na-refractive",
            Self::NaDiameter => "na-diameter",
            Self::VNumber => "v-number",
            Self::Dispersion => "dispersion",
            Self::DbmToMw => "dbm-to-mw",
            Self::MwToDbm => "mw-to-dbm",
            Self::LinkBudget => "link-budget",
        }
    }

    pub fn calculator(&self) -> Calculator {
        match self {
            Self::NaRefractive | Self::NaDiameter => Calculator::NumericalAperture,
            Self::VNumber | Self::Dispersion => Calculator::VNumberDispersion,
            Self::DbmToMw | Self::MwToDbm => Calculator::UnitConverter,
            Self::LinkBudget => Calculator::LinkPowerBudget,
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::NaRefractive => &NA_REFRACTIVE_FIELDS,
            Self::NaDiameter => &NA_DIAMETER_FIELDS,
            Self::VNumber => &V_NUMBER_FIELDS,
            Self::Dispersion => &DISPERSION_FIELDS,
            Self::DbmToMw => &DBM_TO_MW_FIELDS,
            Self::MwToDbm => &MW_TO_DBM_FIELDS,
            Self::LinkBudget => &LINK_BUDGET_FIELDS,
        }
    }

    /// Field values after a form reset
    pub fn defaults(&self) -> Fields {
        self.fields()
            .iter()
            .map(|f| (f.key.to_string(), f.default.to_string()))
            .collect()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.code() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// One labelled output value, already formatted for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadoutEntry {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readout {
    pub mode: Mode,
    pub entries: Vec<ReadoutEntry>,
}

impl Readout {
    fn new(mode: Mode, entries: &[(&str, &str, String)]) -> Self {
        Self {
            mode,
            entries: entries
                .iter()
                .map(|(key, label, value)| ReadoutEntry {
                    key: key.to_string(),
                    label: label.to_string(),
                    value: value.clone(),
                })
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }
}

/// Evaluation switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Validate link budget fields instead of reading unparsed ones as 0
    pub strict_link_budget: bool,
}

fn field_value<'a>(fields: &'a Fields, key: &str) -> &'a str {
    fields.get(key).map(String::as_str).unwrap_or("")
}

/// Run `mode` on raw form fields. Missing fields read as empty.
pub fn evaluate(mode: Mode, fields: &Fields) -> Result<Readout> {
    evaluate_with(mode, fields, &EvalConfig::default())
}

pub fn evaluate_with(mode: Mode, fields: &Fields, config: &EvalConfig) -> Result<Readout> {
    let get = |key| field_value(fields, key);

    let readout = match mode {
        Mode::NaRefractive => {
            let inputs = RefractiveInputs::from_fields(get("n1"), get("n2"))?;
            let r = numerical_aperture_refractive(&inputs)?;
            Readout::new(
                mode,
                &[
                    (
                        "numerical_aperture",
                        "Numerical Aperture (NA)",
                        r.numerical_aperture_display(),
                    ),
                    ("acceptance_angle", "Acceptance Angle (θ)", r.acceptance_angle_display()),
                    ("critical_angle", "Critical Angle (θc)", r.critical_angle_display()),
                ],
            )
        }
        Mode::NaDiameter => {
            let inputs = DiameterInputs::from_fields(
                get("diameter"),
                get("diameter_unit"),
                get("distance"),
                get("distance_unit"),
            )?;
            let r = numerical_aperture_divergence(&inputs)?;
            Readout::new(
                mode,
                &[
                    (
                        "numerical_aperture",
                        "Numerical Aperture (NA)",
                        r.numerical_aperture_display(),
                    ),
                    ("half_angle", "Half Angle (θ)", r.half_angle_display()),
                    ("full_angle", "Full Angle (2θ)", r.full_angle_display()),
                ],
            )
        }
        Mode::VNumber => {
            let inputs =
                VNumberInputs::from_fields(get("core_radius_um"), get("wavelength_nm"), get("na"))?;
            let r = v_number(&inputs)?;
            Readout::new(
                mode,
                &[
                    ("v_number", "V-Number", r.v_display()),
                    ("fiber_type", "Fiber Type", r.fiber_mode.label().to_string()),
                    ("mode_count", "Number of Modes", r.mode_count_display()),
                ],
            )
        }
        Mode::Dispersion => {
            let inputs = DispersionInputs::from_fields(
                get("coefficient"),
                get("length_km"),
                get("spectral_width_nm"),
            )?;
            let r = dispersion(&inputs)?;
            Readout::new(
                mode,
                &[
                    ("time_dispersion", "Time Dispersion (Δt)", r.pulse_spread_display()),
                    ("pulse_broadening", "Pulse Broadening", r.pulse_spread_display()),
                    ("max_bit_rate", "Maximum Bit Rate", r.max_bit_rate_display()),
                ],
            )
        }
        Mode::DbmToMw => {
            let mw = dbm_to_milliwatts_field(get("dbm"))?;
            Readout::new(mode, &[("power_mw", "Power (mW)", milliwatts_display(mw))])
        }
        Mode::MwToDbm => {
            let dbm = milliwatts_to_dbm_field(get("mw"))?;
            Readout::new(mode, &[("power_dbm", "Power (dBm)", dbm_display(dbm))])
        }
        Mode::LinkBudget => {
            let raw = LinkBudgetFields {
                tx_power: get("tx_power_dbm"),
                rx_sensitivity: get("rx_sensitivity_dbm"),
                fiber_length: get("fiber_length_km"),
                loss_per_km: get("loss_per_km_db"),
                connector_loss: get("connector_loss_db"),
                splice_loss: get("splice_loss_db"),
                splitter_loss: get("splitter_loss_db"),
            };
            let r = if config.strict_link_budget {
                link_power_budget_strict(&LinkBudgetInputs::from_fields_strict(&raw)?)?
            } else {
                link_power_budget(&LinkBudgetInputs::from_fields(&raw))
            };
            Readout::new(
                mode,
                &[
                    ("total_loss", "Total Loss", r.total_loss_display()),
                    ("rx_power", "Received Power", r.rx_power_display()),
                    ("link_margin", "Link Margin", r.link_margin_display()),
                    ("power_budget", "Power Budget", r.power_budget_display()),
                ],
            )
        }
    };

    Ok(readout)
}
