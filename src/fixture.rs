//! Fixtures for tests
use crate::area::{Area, HydroCharacteristics, ShortfallPenalties, ThermalCluster};
use crate::correspondence::VariableCorrespondence;
use crate::problem::ProblemDimensions;
use crate::week::{CostOptions, WeeklyProblem};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn dimensions() -> ProblemDimensions {
    ProblemDimensions {
        variables: 16,
        constraints: 50,
        flexibility_classes: 2,
        max_plants_per_constraint: 4,
    }
}

#[fixture]
pub fn area() -> Area {
    Area {
        name: "area1".into(),
        thermal: vec![ThermalCluster {
            cluster_index: 0,
            hourly_cost: vec![10.0, 12.0],
        }],
        hydro: HydroCharacteristics::default(),
        shortfall: ShortfallPenalties {
            positive: 1000.0,
            negative: 500.0,
            reserve: 200.0,
        },
        hydro_cost_noise: vec![0.0, 0.0],
    }
}

/// A two-step, one-area week with one thermal cluster and no interconnections.
///
/// Variables 0..4 belong to step 0 (thermal, then the three shortfalls) and 4..8 to step 1;
/// hydro and ramp variables are unmapped unless a test maps them.
#[fixture]
pub fn week(area: Area) -> WeeklyProblem {
    let mut correspondence = Vec::new();
    for step in 0..2 {
        let mut table = VariableCorrespondence::unmapped(1, 0, 1);
        table.thermal_production[0] = Some(step * 4);
        table.shortfall_positive[0] = Some(step * 4 + 1);
        table.shortfall_negative[0] = Some(step * 4 + 2);
        table.shortfall_reserve[0] = Some(step * 4 + 3);
        correspondence.push(table);
    }

    WeeklyProblem {
        total_steps: 2,
        steps_per_interval: 2,
        hour_in_year: 0,
        areas: vec![area],
        interconnections: Vec::new(),
        abated_load: vec![vec![100.0], vec![120.0]],
        correspondence,
        startup_cost_terms: 0,
        options: CostOptions::default(),
        problem: None,
    }
}
