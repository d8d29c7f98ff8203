//! The variable-correspondence table.
//!
//! Each time step of an optimisation sub-interval carries its own block of decision variables.
//! The correspondence table maps a native quantity (a plant's output, a flow on an
//! interconnection, an area's shortfall) to the positional index of its optimisation variable for
//! that step, or `None` when the quantity has no variable in this step's formulation. Writes
//! through an absent mapping are silently skipped; this is a validated invariant of the cost
//! builder, not an error.

/// A native quantity that may be mapped to an optimisation variable.
///
/// Used by the problem buffer's result back-pointers so that result extraction can tell which
/// quantity each solved column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeVariable {
    /// Net flow on an interconnection
    InterconnectionFlow {
        /// Interconnection index
        interconnection: usize,
    },
    /// Origin-to-destination transport cost variable of an interconnection
    TransportCostDirect {
        /// Interconnection index
        interconnection: usize,
    },
    /// Destination-to-origin transport cost variable of an interconnection
    TransportCostReturn {
        /// Interconnection index
        interconnection: usize,
    },
    /// Production of a thermal cluster (study-wide cluster index)
    ThermalProduction {
        /// Study-wide cluster index
        cluster: usize,
    },
    /// Hydraulic production of an area
    HydroProduction {
        /// Area index
        area: usize,
    },
    /// Downward variation of an area's hydraulic production
    HydroRampDown {
        /// Area index
        area: usize,
    },
    /// Upward variation of an area's hydraulic production
    HydroRampUp {
        /// Area index
        area: usize,
    },
    /// Unserved demand in an area
    ShortfallPositive {
        /// Area index
        area: usize,
    },
    /// Excess/curtailed energy in an area
    ShortfallNegative {
        /// Area index
        area: usize,
    },
    /// Reserve shortfall in an area
    ShortfallReserve {
        /// Area index
        area: usize,
    },
}

/// Maps native quantities to optimisation-variable indices for one time step.
///
/// All vectors hold `None` for quantities absent from this step's formulation.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableCorrespondence {
    /// Net flow variable per interconnection
    pub interconnection_flow: Vec<Option<usize>>,
    /// Origin-to-destination transport cost variable per interconnection
    pub transport_cost_direct: Vec<Option<usize>>,
    /// Destination-to-origin transport cost variable per interconnection
    pub transport_cost_return: Vec<Option<usize>>,
    /// Production variable per study-wide thermal cluster
    pub thermal_production: Vec<Option<usize>>,
    /// Hydraulic production variable per area
    pub hydro_production: Vec<Option<usize>>,
    /// Downward hydraulic ramp variable per area
    pub hydro_ramp_down: Vec<Option<usize>>,
    /// Upward hydraulic ramp variable per area
    pub hydro_ramp_up: Vec<Option<usize>>,
    /// Unserved-demand variable per area
    pub shortfall_positive: Vec<Option<usize>>,
    /// Excess-energy variable per area
    pub shortfall_negative: Vec<Option<usize>>,
    /// Reserve-shortfall variable per area
    pub shortfall_reserve: Vec<Option<usize>>,
}

impl VariableCorrespondence {
    /// Create a table with every mapping absent.
    ///
    /// External constraint construction fills the mappings in as it assigns variable positions.
    pub fn unmapped(area_count: usize, interconnection_count: usize, cluster_count: usize) -> Self {
        Self {
            interconnection_flow: vec![None; interconnection_count],
            transport_cost_direct: vec![None; interconnection_count],
            transport_cost_return: vec![None; interconnection_count],
            thermal_production: vec![None; cluster_count],
            hydro_production: vec![None; area_count],
            hydro_ramp_down: vec![None; area_count],
            hydro_ramp_up: vec![None; area_count],
            shortfall_positive: vec![None; area_count],
            shortfall_negative: vec![None; area_count],
            shortfall_reserve: vec![None; area_count],
        }
    }
}
