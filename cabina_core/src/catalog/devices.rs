//! Standard protection device ratings.

/// MV circuit-breaker rated currents (A)
pub const MV_BREAKER_RATINGS_A: [f64; 6] = [630.0, 1250.0, 1600.0, 2000.0, 2500.0, 3150.0];

/// Protection CT primary currents (A), IEC 61869-2 preferred values
pub const CT_PRIMARIES_A: [f64; 20] = [
    5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 40.0, 50.0, 60.0, 75.0, 100.0, 125.0, 150.0, 200.0, 250.0,
    300.0, 400.0, 500.0, 600.0, 750.0,
];

/// LV main breaker rated currents (A): moulded-case up to 1600 A, air above
pub const LV_BREAKER_RATINGS_A: [f64; 14] = [
    160.0, 250.0, 400.0, 630.0, 800.0, 1000.0, 1250.0, 1600.0, 2000.0, 2500.0, 3200.0, 4000.0,
    5000.0, 6300.0,
];

/// LV breaker ultimate breaking capacities Icu (kA)
pub const BREAKING_CAPACITIES_KA: [f64; 6] = [25.0, 35.0, 50.0, 65.0, 85.0, 100.0];

/// Transformer secondary current of protection CTs (A)
pub const CT_SECONDARY_A: f64 = 5.0;

/// IEC 60071-1 standard insulation levels: (U_m kV, power-frequency withstand
/// kV rms, lightning impulse withstand kV peak)
pub const INSULATION_LEVELS: [(f64, f64, f64); 6] = [
    (7.2, 20.0, 60.0),
    (12.0, 28.0, 75.0),
    (17.5, 38.0, 95.0),
    (24.0, 50.0, 125.0),
    (36.0, 70.0, 170.0),
    (52.0, 95.0, 250.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn ascending(table: &[f64]) -> bool {
        table.windows(2).all(|w| w[0] < w[1])
    }

    #[test]
    fn test_tables_ascending() {
        assert!(ascending(&MV_BREAKER_RATINGS_A));
        assert!(ascending(&CT_PRIMARIES_A));
        assert!(ascending(&LV_BREAKER_RATINGS_A));
        assert!(ascending(&BREAKING_CAPACITIES_KA));
        let um: Vec<f64> = INSULATION_LEVELS.iter().map(|l| l.0).collect();
        assert!(ascending(&um));
    }
}
