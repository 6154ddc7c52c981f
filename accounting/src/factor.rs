//! Offset factor table and the offset formula.

use ecn_types::EnergyCategory;

/// Fixed-point scale of stored offsets: 1000 units = 1 tCO2e.
pub const OFFSET_SCALE: u64 = 1000;

/// Offset factor for a category, in milli-tonnes CO2e per MWh.
///
/// Equivalently: offset units (tCO2e x 1000) per 1000 kWh. Unrecognised
/// categories use the 0.4 fallback instead of failing.
pub fn factor_milli(category: &EnergyCategory) -> u64 {
    match category {
        EnergyCategory::Solar => 466,
        EnergyCategory::Wind => 11,
        EnergyCategory::Hydro => 24,
        EnergyCategory::Biomass => 180,
        EnergyCategory::Other(_) => 400,
    }
}

/// Carbon offset for `energy_kwh` of energy from `category`.
///
/// `floor(energy_kwh * factor)` with the factor in tCO2e/MWh, which lands the
/// result directly in offset units. Truncation never overstates a claim.
/// Every factor is below [`OFFSET_SCALE`], so the result always fits in `u64`.
pub fn compute_offset(energy_kwh: u64, category: &EnergyCategory) -> u64 {
    let scaled = u128::from(energy_kwh) * u128::from(factor_milli(category));
    (scaled / u128::from(OFFSET_SCALE)) as u64
}

/// Render an offset as tonnes with three decimals (`466` -> `"0.466"`).
pub fn format_offset(offset: u64) -> String {
    format!("{}.{:03}", offset / OFFSET_SCALE, offset % OFFSET_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solar_thousand_kwh() {
        assert_eq!(compute_offset(1000, &EnergyCategory::Solar), 466);
    }

    #[test]
    fn wind_two_thousand_kwh() {
        assert_eq!(compute_offset(2000, &EnergyCategory::Wind), 22);
    }

    #[test]
    fn hydro_and_biomass() {
        assert_eq!(compute_offset(1000, &EnergyCategory::Hydro), 24);
        assert_eq!(compute_offset(1000, &EnergyCategory::Biomass), 180);
    }

    #[test]
    fn unknown_category_uses_fallback() {
        let geothermal = EnergyCategory::Other("geothermal".into());
        assert_eq!(compute_offset(1000, &geothermal), 400);
    }

    #[test]
    fn truncates_toward_zero() {
        // 1500 * 0.466 = 699.0, 1501 * 0.466 = 699.466
        assert_eq!(compute_offset(1500, &EnergyCategory::Solar), 699);
        assert_eq!(compute_offset(1501, &EnergyCategory::Solar), 699);
        // 90 * 0.011 = 0.99
        assert_eq!(compute_offset(90, &EnergyCategory::Wind), 0);
    }

    #[test]
    fn zero_energy_is_zero_offset() {
        assert_eq!(compute_offset(0, &EnergyCategory::Solar), 0);
    }

    #[test]
    fn max_energy_does_not_overflow() {
        let offset = compute_offset(u64::MAX, &EnergyCategory::Solar);
        assert!(offset < u64::MAX);
        assert_eq!(offset, ((u64::MAX as u128) * 466 / 1000) as u64);
    }

    #[test]
    fn formats_three_decimals() {
        assert_eq!(format_offset(466), "0.466");
        assert_eq!(format_offset(22), "0.022");
        assert_eq!(format_offset(12_345), "12.345");
        assert_eq!(format_offset(0), "0.000");
    }
}
