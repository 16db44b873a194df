//! Optical power unit conversion (dBm ⇌ mW)
//!
//! P_mW = 10^(P_dBm / 10), P_dBm = 10·log10(P_mW). The mW → dBm direction is
//! only defined for strictly positive power.

use crate::format::to_fixed_trimmed;
use crate::parse::parse_number;
use crate::{require_finite, CalcError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Display rounding for milliwatt readouts
pub const MILLIWATT_DECIMALS: usize = 6;
/// Display rounding for dBm readouts
pub const DBM_DECIMALS: usize = 2;

/// One optical power level in either representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerValue {
    Dbm(f64),
    Milliwatts(f64),
}

impl PowerValue {
    pub fn to_milliwatts(&self) -> Result<f64> {
        match *self {
            Self::Dbm(dbm) => dbm_to_milliwatts(dbm),
            Self::Milliwatts(mw) => {
                require_finite(&[mw], "mW")?;
                Ok(mw)
            }
        }
    }

    pub fn to_dbm(&self) -> Result<f64> {
        match *self {
            Self::Dbm(dbm) => {
                require_finite(&[dbm], "dBm")?;
                Ok(dbm)
            }
            Self::Milliwatts(mw) => milliwatts_to_dbm(mw),
        }
    }
}

pub fn dbm_to_milliwatts(dbm: f64) -> Result<f64> {
    require_finite(&[dbm], "dBm")?;
    let mw = 10f64.powf(dbm / 10.0);
    debug!("dBm -> mW: {} dBm = {} mW", dbm, mw);
    Ok(mw)
}

pub fn milliwatts_to_dbm(mw: f64) -> Result<f64> {
    require_finite(&[mw], "mW")?;
    if mw <= 0.0 {
        return Err(CalcError::NonPositiveValue("mW"));
    }
    let dbm = 10.0 * mw.log10();
    debug!("mW -> dBm: {} mW = {} dBm", mw, dbm);
    Ok(dbm)
}

pub fn dbm_to_milliwatts_field(field: &str) -> Result<f64> {
    dbm_to_milliwatts(parse_number(field).ok_or(CalcError::NotANumber("dBm"))?)
}

pub fn milliwatts_to_dbm_field(field: &str) -> Result<f64> {
    milliwatts_to_dbm(parse_number(field).ok_or(CalcError::NotANumber("mW"))?)
}

/// `"10 mW"`, rounded to 6 decimals with trailing zeros dropped
pub fn milliwatts_display(mw: f64) -> String {
    format!("{} mW", to_fixed_trimmed(mw, MILLIWATT_DECIMALS))
}

/// `"3.01 dBm"`, rounded to 2 decimals with trailing zeros dropped
pub fn dbm_display(dbm: f64) -> String {
    format!("{} dBm", to_fixed_trimmed(dbm, DBM_DECIMALS))
}
