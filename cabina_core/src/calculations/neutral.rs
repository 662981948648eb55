//! # LV Neutral Arrangement
//!
//! Recommends the LV earthing arrangement of the transformer neutral from the
//! kind of installation served. Industrial sites favour continuity of service
//! (TN-S); civil and tertiary sites favour protection of people (TT).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Kind of installation supplied by the substation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupancy {
    #[default]
    Industrial,
    /// Residential, offices, commercial
    Civil,
}

impl FromStr for Occupancy {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "industrial" => Ok(Occupancy::Industrial),
            "civil" => Ok(Occupancy::Civil),
            _ => Err(CalcError::invalid_input("occupancy", s, "Expected industrial or civil")),
        }
    }
}

/// IEC 60364 earthing arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarthingSystem {
    #[serde(rename = "TN-S")]
    TnS,
    #[serde(rename = "TT")]
    Tt,
}

impl fmt::Display for EarthingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EarthingSystem::TnS => "TN-S",
            EarthingSystem::Tt => "TT",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeutralInput {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub occupancy: Occupancy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeutralResult {
    pub system: EarthingSystem,
    pub reason: String,
    /// Protections specific to the arrangement
    pub protections: Vec<String>,
    /// Requirements common to every arrangement
    pub requirements: Vec<String>,
}

pub fn calculate(input: &NeutralInput) -> CalcResult<NeutralResult> {
    let (system, reason, protections) = match input.occupancy {
        Occupancy::Industrial => (
            EarthingSystem::TnS,
            "Continuity of service for industrial loads",
            ["Selective residual current devices", "Coordination with the MV protection"],
        ),
        Occupancy::Civil => (
            EarthingSystem::Tt,
            "Protection of people in civil and tertiary buildings",
            ["Main plus branch residual current devices", "Dedicated earth electrode"],
        ),
    };
    Ok(NeutralResult {
        system,
        reason: reason.to_string(),
        protections: protections.iter().map(|s| s.to_string()).collect(),
        requirements: [
            "Transformer neutral solidly earthed",
            "Dyn11 vector group",
            "MV/LV protection coordination",
            "Periodic earth resistance measurements",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_industrial_is_tn_s() {
        let r = calculate(&NeutralInput {
            label: "TR1".to_string(),
            occupancy: Occupancy::Industrial,
        })
        .unwrap();
        assert_eq!(r.system, EarthingSystem::TnS);
        assert_eq!(r.requirements.len(), 4);
        assert_eq!(serde_json::to_string(&r.system).unwrap(), "\"TN-S\"");
    }

    #[test]
    fn test_civil_is_tt() {
        let r = calculate(&NeutralInput {
            label: String::new(),
            occupancy: "Civil".parse().unwrap(),
        })
        .unwrap();
        assert_eq!(r.system, EarthingSystem::Tt);
        assert_eq!(r.system.to_string(), "TT");
        assert!(r.protections.iter().any(|p| p.contains("earth electrode")));
    }

    #[test]
    fn test_occupancy_defaults_to_industrial() {
        let input: NeutralInput = serde_json::from_str("{}").unwrap();
        assert_eq!(input.occupancy, Occupancy::Industrial);
        assert!("farm".parse::<Occupancy>().is_err());
    }
}
