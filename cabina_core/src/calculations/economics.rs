//! # Economic Analysis
//!
//! Capital cost, yearly running cost and lifetime indicators of a substation.
//!
//! ```text
//! CAPEX = transformer + MV switchgear (40 %) + LV switchboard (30 %)
//!       + cables (3 MV cores, 4 LV cores) + civil works + installation (15 %)
//! OPEX  = losses × hours × €/kWh + maintenance (2 % CAPEX) + inspections
//! NPV   = −(CAPEX + Σ OPEX / (1 + r)^y)
//! ```
//!
//! Load losses are taken at the average load factor, so both the transformer
//! load losses and the cable losses scale with its square.

use serde::{Deserialize, Serialize};

use super::cables::{CableResult, CableRun};
use super::transformer::{Efficiency, TransformerResult};
use crate::catalog::{costs, transformers, CableVoltage};
use crate::errors::{require_positive, CalcError, CalcResult};

/// MV switchgear cost as a share of the transformer price
pub const MV_SWITCHGEAR_SHARE: f64 = 0.4;
/// LV switchboard cost as a share of the transformer price
pub const LV_SWITCHBOARD_SHARE: f64 = 0.3;
/// Installation and commissioning, share of the equipment cost
pub const INSTALLATION_SHARE: f64 = 0.15;
pub const MV_CORES: f64 = 3.0;
pub const LV_CORES: f64 = 4.0;
/// Prefabricated room, 6 × 4 × 2.5 m
pub const ROOM_VOLUME_M3: f64 = 60.0;
pub const CIVIL_WORKS_PER_M3: f64 = 800.0;
/// Reference transformer losses, share of the average load
pub const REFERENCE_LOSS_SHARE: f64 = 0.015;
/// No-load losses above this share of the rating suggest a better transformer
pub const HIGH_NO_LOAD_LOSS_SHARE: f64 = 0.008;
/// Load factors of the efficiency table
pub const EFFICIENCY_LOAD_FACTORS: [f64; 4] = [0.25, 0.5, 0.75, 1.0];
pub const EFFICIENCY_POWER_FACTOR: f64 = 0.95;

/// Financial assumptions of the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicRates {
    pub service_life_years: u32,
    pub energy_price_per_kwh: f64,
    pub discount_rate: f64,
    /// Average load as a fraction of the rating
    pub average_load_factor: f64,
    pub operating_hours_per_year: f64,
    /// Maintenance per year, share of CAPEX
    pub maintenance_share: f64,
    /// Periodic measurements and inspections (€ per year)
    pub inspections_per_year: f64,
}

impl Default for EconomicRates {
    fn default() -> Self {
        EconomicRates {
            service_life_years: 25,
            energy_price_per_kwh: 0.20,
            discount_rate: 0.06,
            average_load_factor: 0.6,
            operating_hours_per_year: 8760.0,
            maintenance_share: 0.02,
            inspections_per_year: 2000.0,
        }
    }
}

impl EconomicRates {
    pub fn validate(&self) -> CalcResult<()> {
        if self.service_life_years == 0 {
            return Err(CalcError::invalid_input(
                "service_life_years",
                "0",
                "Service life must be at least one year",
            ));
        }
        require_positive("energy_price_per_kwh", self.energy_price_per_kwh)?;
        require_positive("average_load_factor", self.average_load_factor)?;
        require_positive("operating_hours_per_year", self.operating_hours_per_year)?;
        if !(0.0..1.0).contains(&self.discount_rate) {
            return Err(CalcError::invalid_input(
                "discount_rate",
                self.discount_rate.to_string(),
                "Discount rate must be in [0, 1)",
            ));
        }
        if self.average_load_factor > 1.0 {
            return Err(CalcError::invalid_input(
                "average_load_factor",
                self.average_load_factor.to_string(),
                "Average load factor cannot exceed 1",
            ));
        }
        if self.operating_hours_per_year > 8760.0 {
            return Err(CalcError::invalid_input(
                "operating_hours_per_year",
                self.operating_hours_per_year.to_string(),
                "A year has 8760 hours",
            ));
        }
        for (field, value) in [
            ("maintenance_share", self.maintenance_share),
            ("inspections_per_year", self.inspections_per_year),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CalcError::invalid_input(field, value.to_string(), "Value must be zero or positive"));
            }
        }
        Ok(())
    }
}

/// Input parameters for the economic analysis.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Cabina 1",
///   "transformer_kva": 500,
///   "mv_section_mm2": 35,
///   "lv_section_mm2": 630,
///   "mv_length_m": 50.0,
///   "lv_length_m": 30.0,
///   "cable_losses_kw": 1.71,
///   "rates": { "energy_price_per_kwh": 0.25 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicsInput {
    #[serde(default)]
    pub label: String,
    pub transformer_kva: u32,
    pub mv_section_mm2: u32,
    pub lv_section_mm2: u32,
    pub mv_length_m: f64,
    pub lv_length_m: f64,
    /// Cable losses at nominal current (kW)
    pub cable_losses_kw: f64,
    #[serde(default)]
    pub rates: EconomicRates,
}

impl EconomicsInput {
    /// Input built from the sized transformer and cables.
    pub fn from_results(
        label: impl Into<String>,
        transformer: &TransformerResult,
        cables: &CableResult,
        run: &CableRun,
        rates: EconomicRates,
    ) -> Self {
        EconomicsInput {
            label: label.into(),
            transformer_kva: transformer.selected_kva,
            mv_section_mm2: cables.mv.section_mm2,
            lv_section_mm2: cables.lv.section_mm2,
            mv_length_m: run.mv_length_m,
            lv_length_m: run.lv_length_m,
            cable_losses_kw: cables.total_losses_kw,
            rates,
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("mv_length_m", self.mv_length_m)?;
        require_positive("lv_length_m", self.lv_length_m)?;
        if !self.cable_losses_kw.is_finite() || self.cable_losses_kw < 0.0 {
            return Err(CalcError::invalid_input(
                "cable_losses_kw",
                self.cable_losses_kw.to_string(),
                "Value must be zero or positive",
            ));
        }
        self.rates.validate()
    }
}

/// Capital expenditure breakdown (€).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalCost {
    pub transformer: f64,
    pub mv_switchgear: f64,
    pub lv_switchboard: f64,
    pub mv_cables: f64,
    pub lv_cables: f64,
    pub civil_works: f64,
    pub installation: f64,
    pub total: f64,
}

/// Yearly operating cost breakdown (€).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingCost {
    pub losses: f64,
    pub maintenance: f64,
    pub inspections: f64,
    pub total: f64,
}

/// Power losses at the average load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyLosses {
    pub transformer_no_load_kw: f64,
    pub transformer_load_kw: f64,
    pub cables_kw: f64,
    pub total_kw: f64,
    pub energy_per_year_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialIndicators {
    /// CAPEX plus undiscounted OPEX over the service life (€)
    pub total_cost_of_ownership: f64,
    /// Discounted cost, negative (€)
    pub net_present_value: f64,
    pub capex_per_kva: f64,
    /// CAPEX over the yearly cost of losses (years)
    pub loss_payback_years: f64,
    /// Yearly saving against a transformer losing 1.5 % of the average load (€)
    pub efficiency_savings_per_year: f64,
    pub efficiency_return_percent: f64,
}

/// Results of the economic analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicsResult {
    pub capex: CapitalCost,
    pub opex: OperatingCost,
    pub losses: EnergyLosses,
    pub indicators: FinancialIndicators,
    /// Transformer efficiency at 25, 50, 75 and 100 % load
    pub efficiency_by_load: Vec<Efficiency>,
    pub rates: EconomicRates,
    pub recommendations: Vec<String>,
}

/// Run the economic analysis.
pub fn calculate(input: &EconomicsInput) -> CalcResult<EconomicsResult> {
    input.validate()?;
    let rates = &input.rates;
    let spec = transformers::lookup(input.transformer_kva)?;
    let rated_kva = f64::from(spec.rated_kva);

    let transformer = costs::transformer_price(spec.rated_kva)?;
    let mv_switchgear = transformer * MV_SWITCHGEAR_SHARE;
    let lv_switchboard = transformer * LV_SWITCHBOARD_SHARE;
    let mv_cables = costs::cable_price_per_m(CableVoltage::Mv, input.mv_section_mm2)? * input.mv_length_m * MV_CORES;
    let lv_cables = costs::cable_price_per_m(CableVoltage::Lv, input.lv_section_mm2)? * input.lv_length_m * LV_CORES;
    let civil_works = ROOM_VOLUME_M3 * CIVIL_WORKS_PER_M3;
    let installation = (transformer + mv_switchgear + lv_switchboard) * INSTALLATION_SHARE;
    let capex = CapitalCost {
        total: transformer + mv_switchgear + lv_switchboard + mv_cables + lv_cables + civil_works + installation,
        transformer,
        mv_switchgear,
        lv_switchboard,
        mv_cables,
        lv_cables,
        civil_works,
        installation,
    };

    let load_scale = rates.average_load_factor * rates.average_load_factor;
    let no_load_kw = spec.no_load_losses_w / 1000.0;
    let load_kw = spec.load_losses_w / 1000.0 * load_scale;
    let cables_kw = input.cable_losses_kw * load_scale;
    let total_kw = no_load_kw + load_kw + cables_kw;
    let losses = EnergyLosses {
        transformer_no_load_kw: no_load_kw,
        transformer_load_kw: load_kw,
        cables_kw,
        total_kw,
        energy_per_year_kwh: total_kw * rates.operating_hours_per_year,
    };

    let loss_cost = losses.energy_per_year_kwh * rates.energy_price_per_kwh;
    let maintenance = capex.total * rates.maintenance_share;
    let opex = OperatingCost {
        losses: loss_cost,
        maintenance,
        inspections: rates.inspections_per_year,
        total: loss_cost + maintenance + rates.inspections_per_year,
    };

    let discounted_opex: f64 = (1..=rates.service_life_years)
        .map(|year| opex.total / (1.0 + rates.discount_rate).powi(year as i32))
        .sum();
    let reference_kw = rated_kva * rates.average_load_factor * REFERENCE_LOSS_SHARE;
    let efficiency_savings_per_year = ((reference_kw - (no_load_kw + load_kw)).max(0.0))
        * rates.operating_hours_per_year
        * rates.energy_price_per_kwh;
    let indicators = FinancialIndicators {
        total_cost_of_ownership: capex.total + opex.total * f64::from(rates.service_life_years),
        net_present_value: -(capex.total + discounted_opex),
        capex_per_kva: capex.total / rated_kva,
        loss_payback_years: capex.total / loss_cost,
        efficiency_savings_per_year,
        efficiency_return_percent: efficiency_savings_per_year / capex.total * 100.0,
    };

    let efficiency_by_load = EFFICIENCY_LOAD_FACTORS
        .iter()
        .map(|&load| Efficiency::at(spec, load, EFFICIENCY_POWER_FACTOR))
        .collect();

    let mut recommendations = vec![
        format!("Total investment: {:.0} €", capex.total),
        format!("Operating cost: {:.0} €/year", opex.total),
        format!("Energy losses: {:.0} kWh/year", losses.energy_per_year_kwh),
        format!(
            "Total cost of ownership over {} years: {:.0} €",
            rates.service_life_years, indicators.total_cost_of_ownership
        ),
    ];
    if no_load_kw > rated_kva * HIGH_NO_LOAD_LOSS_SHARE {
        recommendations.push("Consider a high-efficiency transformer to reduce running costs".to_string());
    } else {
        recommendations.push("Selected transformer has low no-load losses".to_string());
    }

    Ok(EconomicsResult {
        capex,
        opex,
        losses,
        indicators,
        efficiency_by_load,
        rates: rates.clone(),
        recommendations,
    })
}
