//! Fiber Link Power Budget Calculator
//!
//! Sums the losses along a fiber link and compares received power to the
//! receiver sensitivity. Accounts for:
//! - Fiber attenuation (length × dB/km)
//! - Connector losses
//! - Splice losses
//! - Passive splitter loss
//!
//! Budgeting arithmetic has no physical validation: unparsed fields count
//! as 0 and a negative margin is a result, not an error.
//! [`link_power_budget_strict`] is the opt-in validating variant.

use crate::format::to_fixed_trimmed;
use crate::parse::{parse_number, parse_or_zero};
use crate::{require_finite, CalcError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lab reference link (laser transmitter over 10 km of SMF)
const TX_POWER_DBM: f64 = 3.0;
const RX_SENSITIVITY_DBM: f64 = -28.0;
const FIBER_LENGTH_KM: f64 = 10.0;
const LOSS_PER_KM_DB: f64 = 0.35;
const CONNECTOR_LOSS_DB: f64 = 0.5;
const SPLICE_LOSS_DB: f64 = 0.1;
const SPLITTER_LOSS_DB: f64 = 0.0;

/// Budget inputs; every field defaults to 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkBudgetInputs {
    pub tx_power_dbm: f64,
    pub rx_sensitivity_dbm: f64,
    pub fiber_length_km: f64,
    pub loss_per_km_db: f64,
    pub connector_loss_db: f64,
    pub splice_loss_db: f64,
    pub splitter_loss_db: f64,
}

/// Raw form fields for the budget, in display order
#[derive(Debug, Clone, Copy)]
pub struct LinkBudgetFields<'a> {
    pub tx_power: &'a str,
    pub rx_sensitivity: &'a str,
    pub fiber_length: &'a str,
    pub loss_per_km: &'a str,
    pub connector_loss: &'a str,
    pub splice_loss: &'a str,
    pub splitter_loss: &'a str,
}

impl LinkBudgetInputs {
    /// Reference link the calculator form resets to
    pub fn lab_reference() -> Self {
        Self {
            tx_power_dbm: TX_POWER_DBM,
            rx_sensitivity_dbm: RX_SENSITIVITY_DBM,
            fiber_length_km: FIBER_LENGTH_KM,
            loss_per_km_db: LOSS_PER_KM_DB,
            connector_loss_db: CONNECTOR_LOSS_DB,
            splice_loss_db: SPLICE_LOSS_DB,
            splitter_loss_db: SPLITTER_LOSS_DB,
        }
    }

    /// Lenient read: any field without a number becomes 0.
    pub fn from_fields(fields: &LinkBudgetFields<'_>) -> Self {
        Self {
            tx_power_dbm: parse_or_zero(fields.tx_power),
            rx_sensitivity_dbm: parse_or_zero(fields.rx_sensitivity),
            fiber_length_km: parse_or_zero(fields.fiber_length),
            loss_per_km_db: parse_or_zero(fields.loss_per_km),
            connector_loss_db: parse_or_zero(fields.connector_loss),
            splice_loss_db: parse_or_zero(fields.splice_loss),
            splitter_loss_db: parse_or_zero(fields.splitter_loss),
        }
    }

    /// Strict read: every field must hold a number.
    pub fn from_fields_strict(fields: &LinkBudgetFields<'_>) -> Result<Self> {
        let required = |field: &str, label: &'static str| {
            parse_number(field).ok_or(CalcError::NotANumber(label))
        };
        Ok(Self {
            tx_power_dbm: required(fields.tx_power, "Tx power")?,
            rx_sensitivity_dbm: required(fields.rx_sensitivity, "Rx sensitivity")?,
            fiber_length_km: required(fields.fiber_length, "fiber length")?,
            loss_per_km_db: required(fields.loss_per_km, "loss per km")?,
            connector_loss_db: required(fields.connector_loss, "connector loss")?,
            splice_loss_db: required(fields.splice_loss, "splice loss")?,
            splitter_loss_db: required(fields.splitter_loss, "splitter loss")?,
        })
    }

    /// Non-finite values count as absent, matching unparsed form fields.
    fn sanitized(&self) -> Self {
        let z = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            tx_power_dbm: z(self.tx_power_dbm),
            rx_sensitivity_dbm: z(self.rx_sensitivity_dbm),
            fiber_length_km: z(self.fiber_length_km),
            loss_per_km_db: z(self.loss_per_km_db),
            connector_loss_db: z(self.connector_loss_db),
            splice_loss_db: z(self.splice_loss_db),
            splitter_loss_db: z(self.splitter_loss_db),
        }
    }
}

/// Budget breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkBudget {
    pub fiber_loss_db: f64,
    pub total_loss_db: f64,
    pub rx_power_dbm: f64,
    pub link_margin_db: f64,
    pub power_budget_db: f64,
    pub link_viable: bool,
}

impl LinkBudget {
    pub fn total_loss_display(&self) -> String {
        format!("{} dB", to_fixed_trimmed(self.total_loss_db, 2))
    }

    pub fn rx_power_display(&self) -> String {
        format!("{} dBm", to_fixed_trimmed(self.rx_power_dbm, 2))
    }

    pub fn link_margin_display(&self) -> String {
        format!("{} dB", to_fixed_trimmed(self.link_margin_db, 2))
    }

    pub fn power_budget_display(&self) -> String {
        format!("{} dB", to_fixed_trimmed(self.power_budget_db, 2))
    }
}

/// Compute the budget. Defined for every input; never fails.
pub fn link_power_budget(inputs: &LinkBudgetInputs) -> LinkBudget {
    let i = inputs.sanitized();

    let fiber_loss = i.fiber_length_km * i.loss_per_km_db;
    let total_loss = fiber_loss + i.connector_loss_db + i.splice_loss_db + i.splitter_loss_db;

    // Received power = launched power minus everything lost on the way
    let rx_power = i.tx_power_dbm - total_loss;
    let margin = rx_power - i.rx_sensitivity_dbm;
    let budget = i.tx_power_dbm - i.rx_sensitivity_dbm;

    debug!(
        "Link budget: loss={} dB rx={} dBm margin={} dB budget={} dB",
        total_loss, rx_power, margin, budget
    );

    LinkBudget {
        fiber_loss_db: fiber_loss,
        total_loss_db: total_loss,
        rx_power_dbm: rx_power,
        link_margin_db: margin,
        power_budget_db: budget,
        link_viable: margin > 0.0,
    }
}

/// Validating variant: rejects non-finite values and negative loss terms.
pub fn link_power_budget_strict(inputs: &LinkBudgetInputs) -> Result<LinkBudget> {
    require_finite(
        &[inputs.tx_power_dbm, inputs.rx_sensitivity_dbm],
        "Tx power and Rx sensitivity",
    )?;

    let losses = [
        (inputs.fiber_length_km, "fiber length"),
        (inputs.loss_per_km_db, "loss per km"),
        (inputs.connector_loss_db, "connector loss"),
        (inputs.splice_loss_db, "splice loss"),
        (inputs.splitter_loss_db, "splitter loss"),
    ];
    for (value, label) in losses {
        require_finite(&[value], label)?;
    }
    for (value, label) in losses {
        if value < 0.0 {
            return Err(CalcError::NegativeValue(label));
        }
    }

    Ok(link_power_budget(inputs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lab_fields() -> LinkBudgetFields<'static> {
        LinkBudgetFields {
            tx_power: "3",
            rx_sensitivity: "-28",
            fiber_length: "10",
            loss_per_km: "0.35",
            connector_loss: "0.5",
            splice_loss: "0.1",
            splitter_loss: "0",
        }
    }

    #[test]
    fn test_lab_reference_budget() {
        let budget = link_power_budget(&LinkBudgetInputs::lab_reference());
        assert!((budget.total_loss_db - 4.1).abs() < 1e-9);
        assert!((budget.rx_power_dbm + 1.1).abs() < 1e-9);
        assert!((budget.link_margin_db - 26.9).abs() < 1e-9);
        assert!((budget.power_budget_db - 31.0).abs() < 1e-9);
        assert!(budget.link_viable);

        assert_eq!(budget.total_loss_display(), "4.1 dB");
        assert_eq!(budget.rx_power_display(), "-1.1 dBm");
        assert_eq!(budget.link_margin_display(), "26.9 dB");
        assert_eq!(budget.power_budget_display(), "31 dB");
    }

    #[test]
    fn test_from_fields_matches_reference() {
        let inputs = LinkBudgetInputs::from_fields(&lab_fields());
        assert_eq!(inputs, LinkBudgetInputs::lab_reference());
    }

    #[test]
    fn test_unparsed_fields_default_to_zero() {
        let fields = LinkBudgetFields {
            tx_power: "3",
            rx_sensitivity: "",
            fiber_length: "ten",
            loss_per_km: "0.35",
            connector_loss: "",
            splice_loss: "-",
            splitter_loss: "",
        };
        let inputs = LinkBudgetInputs::from_fields(&fields);
        assert_eq!(inputs.rx_sensitivity_dbm, 0.0);
        assert_eq!(inputs.fiber_length_km, 0.0);

        let budget = link_power_budget(&inputs);
        assert_eq!(budget.total_loss_db, 0.0);
        assert_eq!(budget.rx_power_dbm, 3.0);
        assert_eq!(budget.power_budget_display(), "3 dB");
    }

    #[test]
    fn test_negative_margin_is_not_an_error() {
        let inputs = LinkBudgetInputs {
            fiber_length_km: 100.0,
            ..LinkBudgetInputs::lab_reference()
        };
        let budget = link_power_budget(&inputs);
        assert!(budget.link_margin_db < 0.0);
        assert!(!budget.link_viable);
        assert_eq!(budget.link_margin_display(), "-4.6 dB");
    }

    #[test]
    fn test_default_is_all_zero() {
        let budget = link_power_budget(&LinkBudgetInputs::default());
        assert_eq!(budget.total_loss_display(), "0 dB");
        assert_eq!(budget.rx_power_display(), "0 dBm");
        assert!(!budget.link_viable);
    }

    #[test]
    fn test_non_finite_treated_as_zero() {
        let inputs = LinkBudgetInputs {
            splitter_loss_db: f64::NAN,
            ..LinkBudgetInputs::lab_reference()
        };
        let budget = link_power_budget(&inputs);
        assert_eq!(budget.total_loss_display(), "4.1 dB");
    }

    #[test]
    fn test_strict_rejects_unparsed() {
        let fields = LinkBudgetFields {
            splice_loss: "",
            ..lab_fields()
        };
        assert_eq!(
            LinkBudgetInputs::from_fields_strict(&fields),
            Err(CalcError::NotANumber("splice loss"))
        );
        assert!(LinkBudgetInputs::from_fields_strict(&lab_fields()).is_ok());
    }

    #[test]
    fn test_strict_rejects_negative_loss() {
        let inputs = LinkBudgetInputs {
            connector_loss_db: -0.5,
            ..LinkBudgetInputs::lab_reference()
        };
        assert_eq!(
            link_power_budget_strict(&inputs),
            Err(CalcError::NegativeValue("connector loss"))
        );
        // Negative powers are fine: they are absolute levels, not losses
        let low_tx = LinkBudgetInputs {
            tx_power_dbm: -5.0,
            ..LinkBudgetInputs::lab_reference()
        };
        assert!(link_power_budget_strict(&low_tx).is_ok());
    }
}
