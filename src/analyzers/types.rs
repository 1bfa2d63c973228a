//! Row types for the datasets the analyzers read.
//!
//! Each struct names only the columns it needs; other columns in the file
//! are ignored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Income bracket of a census row. Any other literal fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Salary {
    #[serde(rename = "<=50K")]
    AtMost50K,
    #[serde(rename = ">50K")]
    Above50K,
}

/// A single row of the adult census dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct CensusRow {
    pub age: u32,
    pub education: String,
    pub occupation: String,
    pub race: String,
    pub sex: String,
    #[serde(rename = "hours-per-week")]
    pub hours_per_week: u32,
    #[serde(rename = "native-country")]
    pub native_country: String,
    pub salary: Salary,
}

impl CensusRow {
    pub fn is_rich(&self) -> bool {
        self.salary == Salary::Above50K
    }
}

/// A single row of the medical examination dataset.
///
/// `cholesterol` and `gluc` arrive on a 1..=3 scale and are normalized to
/// 0/1 by [`crate::analyzers::medical::good_bad`].
#[derive(Debug, Clone, Deserialize)]
pub struct MedicalRow {
    pub id: i64,
    /// Age in days.
    pub age: i64,
    pub sex: i64,
    /// Centimeters.
    pub height: f64,
    /// Kilograms.
    pub weight: f64,
    pub ap_hi: i64,
    pub ap_lo: i64,
    pub cholesterol: i64,
    pub gluc: i64,
    pub smoke: i64,
    pub alco: i64,
    pub active: i64,
    pub cardio: i64,
    #[serde(default)]
    pub overweight: i64,
}

/// A single row of the EPA sea level dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct SeaLevelRow {
    #[serde(rename = "Year")]
    pub year: i32,
    /// Inches.
    #[serde(rename = "CSIRO Adjusted Sea Level")]
    pub csiro_adjusted: f64,
}

/// Daily forum page views.
#[derive(Debug, Clone, Deserialize)]
pub struct PageViewRow {
    pub date: NaiveDate,
    pub value: f64,
}
