//! Per-area economic data used when building the weekly dispatch problem.
//!
//! An area is a modelled market/grid zone with its own generation, load and storage. The cost
//! builder reads these tables every sub-interval; none of them change within a week.

/// One thermal plant (cluster of identical units) belonging to an area.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalCluster {
    /// Position of this cluster in the study-wide cluster set.
    ///
    /// Variable-correspondence lookups for thermal production are indexed by this number, not by
    /// the cluster's position within its area.
    pub cluster_index: usize,
    /// Hourly production cost, one entry per time step of the week
    pub hourly_cost: Vec<f64>,
}

/// Hydraulic characteristics of an area
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HydroCharacteristics {
    /// Whether the area has modulable (load-following) hydraulic capacity
    pub has_modulable_capacity: bool,
    /// Penalty applied to both ramp directions under sum-of-variations smoothing
    pub ramp_penalty_sum_of_variations: f64,
    /// Penalty applied on the first step of the range under max-variation smoothing
    pub ramp_penalty_max_variation: f64,
    /// Whether hydraulic production must carry the configured "effectively infinite" cost
    pub infinite_cost: bool,
}

/// Penalty costs for the three kinds of shortfall, per MWh
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShortfallPenalties {
    /// Unserved demand
    pub positive: f64,
    /// Excess/curtailed energy
    pub negative: f64,
    /// Reserve shortfall
    pub reserve: f64,
}

/// A modelled market/grid zone
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    /// The name of the area
    pub name: String,
    /// Thermal plant roster
    pub thermal: Vec<ThermalCluster>,
    /// Hydraulic characteristics
    pub hydro: HydroCharacteristics,
    /// Shortfall penalty costs
    pub shortfall: ShortfallPenalties,
    /// Deterministic noise added to the hydraulic opportunity cost, one entry per hour of the
    /// year. Indexed by the week's hour-in-year offset plus the time step.
    pub hydro_cost_noise: Vec<f64>,
}

/// Minimum and maximum abated load observed over the current optimisation window.
///
/// One scratch pad exists per area *per scenario space*, so that concurrently running scenario
/// threads never share mutable state. The cost builder resets and refills these at the start of
/// every call, before any hydraulic cost is derived from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaScratchpad {
    /// Minimum abated load over the window
    pub load_min: f64,
    /// Maximum abated load over the window
    pub load_max: f64,
}

impl AreaScratchpad {
    /// Reset the extrema so that any observed load narrows them
    pub fn reset(&mut self) {
        self.load_min = f64::INFINITY;
        self.load_max = f64::NEG_INFINITY;
    }
}

impl Default for AreaScratchpad {
    fn default() -> Self {
        Self {
            load_min: f64::INFINITY,
            load_max: f64::NEG_INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratchpad_reset() {
        let mut scratchpad = AreaScratchpad {
            load_min: 1.0,
            load_max: 2.0,
        };
        scratchpad.reset();
        assert_eq!(scratchpad, AreaScratchpad::default());
        assert!(scratchpad.load_min > scratchpad.load_max);
    }
}
