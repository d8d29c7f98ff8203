//! Interconnections between areas and their transport cost tables.

/// A directed transmission link between two areas
#[derive(Debug, Clone, PartialEq)]
pub struct Interconnection {
    /// Index of the origin area
    pub origin: usize,
    /// Index of the destination area
    pub destination: usize,
    /// Transport cost tables, if this interconnection is managed with costs
    pub transport_costs: Option<TransportCosts>,
}

/// Direction-dependent transport costs for one interconnection
#[derive(Debug, Clone, PartialEq)]
pub struct TransportCosts {
    /// Cost of transporting one MWh from origin to destination, per time step of the week
    pub origin_to_destination: Vec<f64>,
    /// Cost of transporting one MWh from destination to origin, per time step of the week
    pub destination_to_origin: Vec<f64>,
}
