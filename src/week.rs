//! The weekly problem context: one week of one scenario's dispatch problem.
use crate::area::Area;
use crate::correspondence::VariableCorrespondence;
use crate::interconnection::Interconnection;
use crate::problem::{OptimisationProblem, ProblemDimensions, estimate_term_count};
use anyhow::{Result, ensure};
use log::debug;

/// How hydraulic production variations are smoothed over the week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HydroSmoothing {
    /// No ramping penalty
    #[default]
    None,
    /// Penalise the sum of upward and downward variations, every step
    SumOfVariations,
    /// Penalise the maximum variation, on the first step of the range only
    MaxVariation,
}

/// Switches and coefficients governing the cost build
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostOptions {
    /// Whether directional transport costs are accounted for
    pub transport_costs: bool,
    /// Whether hydraulic opportunity costs are accounted for
    pub hydraulic_costs: bool,
    /// Hydraulic ramping-penalty smoothing mode
    pub hydro_smoothing: HydroSmoothing,
    /// The "effectively infinite" cost applied to areas flagged for infinite hydro cost
    pub global_maximum_cost: f64,
    /// When set, shortfall penalties are divided by this coefficient to keep coefficient
    /// magnitudes compatible with the solver's numeric tolerance
    pub large_variable_scaling: Option<f64>,
    /// Whether startup-cost-aware optimisation is enabled
    pub startup_costs: bool,
}

impl Default for CostOptions {
    fn default() -> Self {
        Self {
            transport_costs: true,
            hydraulic_costs: true,
            hydro_smoothing: HydroSmoothing::None,
            global_maximum_cost: 1e12,
            large_variable_scaling: None,
            startup_costs: false,
        }
    }
}

/// One week of one scenario's dispatch problem.
///
/// Owns at most one [`OptimisationProblem`] at a time. A context (and its buffer and scratch
/// pads) belongs to exactly one scenario space; the orchestrating caller must never share an
/// instance across concurrently running scenario threads.
pub struct WeeklyProblem {
    /// Number of time steps in the week
    pub total_steps: usize,
    /// Number of time steps per optimisation sub-interval
    pub steps_per_interval: usize,
    /// Hour-of-year offset of the week's first time step, used to index noise tables
    pub hour_in_year: usize,
    /// The modelled areas
    pub areas: Vec<Area>,
    /// The interconnections between areas
    pub interconnections: Vec<Interconnection>,
    /// Abated load per time step (outer) and area (inner)
    pub abated_load: Vec<Vec<f64>>,
    /// Variable-correspondence table, one entry per time step of a sub-interval
    pub correspondence: Vec<VariableCorrespondence>,
    /// Number of matrix terms the startup-cost constraints will need
    pub startup_cost_terms: usize,
    /// Cost-build switches and coefficients
    pub options: CostOptions,
    /// The problem buffer, present between allocation and release
    pub problem: Option<OptimisationProblem>,
}

impl WeeklyProblem {
    /// Number of optimisation sub-intervals in the week.
    ///
    /// Integer division: a trailing partial sub-interval is dropped, not rounded up. This
    /// truncation is intentional; the scenario horizon is arranged so that whole weeks divide
    /// evenly into sub-intervals.
    pub fn sub_interval_count(&self) -> usize {
        self.total_steps / self.steps_per_interval
    }

    /// Check that the context's tables are mutually consistent
    pub fn validate(&self) -> Result<()> {
        ensure!(self.steps_per_interval > 0, "Steps per sub-interval must be positive");
        ensure!(
            self.steps_per_interval <= self.total_steps,
            "Sub-interval cannot be longer than the week"
        );
        ensure!(
            self.abated_load.len() == self.total_steps,
            "Expected one abated load entry per time step"
        );
        for (step, loads) in self.abated_load.iter().enumerate() {
            ensure!(
                loads.len() == self.areas.len(),
                "Abated load for step {step} must cover every area"
            );
        }
        ensure!(
            self.correspondence.len() == self.steps_per_interval,
            "Expected one correspondence table per step of a sub-interval"
        );
        for (step, table) in self.correspondence.iter().enumerate() {
            ensure!(
                table.interconnection_flow.len() == self.interconnections.len()
                    && table.transport_cost_direct.len() == self.interconnections.len()
                    && table.transport_cost_return.len() == self.interconnections.len(),
                "Correspondence table for step {step} must cover every interconnection"
            );
            ensure!(
                table.hydro_production.len() == self.areas.len()
                    && table.hydro_ramp_down.len() == self.areas.len()
                    && table.hydro_ramp_up.len() == self.areas.len()
                    && table.shortfall_positive.len() == self.areas.len()
                    && table.shortfall_negative.len() == self.areas.len()
                    && table.shortfall_reserve.len() == self.areas.len(),
                "Correspondence table for step {step} must cover every area"
            );
            ensure!(
                self.areas
                    .iter()
                    .flat_map(|area| &area.thermal)
                    .all(|cluster| cluster.cluster_index < table.thermal_production.len()),
                "Correspondence table for step {step} must cover every thermal cluster"
            );
        }
        for area in &self.areas {
            ensure!(
                area.hydro_cost_noise.len() >= self.hour_in_year + self.total_steps,
                "Hydro cost noise table for area {} does not cover the week",
                area.name
            );
            for cluster in &area.thermal {
                ensure!(
                    cluster.hourly_cost.len() == self.total_steps,
                    "Thermal cost table in area {} must cover every time step",
                    area.name
                );
            }
        }
        for (index, interconnection) in self.interconnections.iter().enumerate() {
            if let Some(costs) = &interconnection.transport_costs {
                ensure!(
                    costs.origin_to_destination.len() == self.total_steps
                        && costs.destination_to_origin.len() == self.total_steps,
                    "Transport cost tables for interconnection {index} must cover every time step"
                );
            }
        }
        Ok(())
    }

    /// Allocate the week's problem buffer from the supplied dimensions.
    ///
    /// The matrix term storage is sized with [`estimate_term_count`]; any previously owned
    /// buffer is released first.
    pub fn allocate_problem(&mut self, dims: &ProblemDimensions) -> Result<()> {
        self.validate()?;

        let terms = estimate_term_count(
            dims,
            self.areas.len(),
            self.interconnections.len(),
            self.steps_per_interval,
            self.startup_cost_terms,
        );
        self.problem = Some(OptimisationProblem::allocate(
            dims,
            terms,
            self.sub_interval_count(),
        ));
        Ok(())
    }

    /// Release the problem buffer and everything it owns.
    ///
    /// Safe to call on a context that owns no buffer, or one whose buffer was only partially
    /// populated. Afterwards the context owns no buffer until the next allocation.
    pub fn release_problem(&mut self) {
        if self.problem.take().is_some() {
            debug!("Released weekly problem buffer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, dimensions, week};
    use crate::interconnection::Interconnection;
    use rstest::rstest;

    #[rstest]
    fn test_sub_interval_count_truncates(mut week: WeeklyProblem) {
        week.total_steps = 10;
        week.steps_per_interval = 4;
        assert_eq!(week.sub_interval_count(), 2);
    }

    #[rstest]
    fn test_allocate_problem(mut week: WeeklyProblem, dimensions: ProblemDimensions) {
        week.allocate_problem(&dimensions).unwrap();

        let problem = week.problem.as_ref().unwrap();
        assert_eq!(problem.variable_count, dimensions.variables);
        assert_eq!(problem.constraint_count, dimensions.constraints);
        assert_eq!(problem.workspaces.len(), dimensions.flexibility_classes);
    }

    #[rstest]
    fn test_validate_rejects_short_load_series(mut week: WeeklyProblem) {
        week.abated_load.pop();
        assert_error!(
            week.validate(),
            "Expected one abated load entry per time step"
        );
    }

    #[rstest]
    fn test_validate_rejects_unmapped_interconnection(mut week: WeeklyProblem) {
        // A new interconnection with no matching correspondence entries must not pass
        week.interconnections.push(Interconnection {
            origin: 0,
            destination: 0,
            transport_costs: None,
        });
        assert_error!(
            week.validate(),
            "Correspondence table for step 0 must cover every interconnection"
        );
    }

    #[rstest]
    fn test_validate_rejects_short_area_tables(mut week: WeeklyProblem) {
        week.correspondence[1].shortfall_reserve.pop();
        assert_error!(
            week.validate(),
            "Correspondence table for step 1 must cover every area"
        );
    }

    #[rstest]
    fn test_validate_rejects_unmapped_thermal_cluster(mut week: WeeklyProblem) {
        week.areas[0].thermal[0].cluster_index = 1;
        assert_error!(
            week.validate(),
            "Correspondence table for step 0 must cover every thermal cluster"
        );
    }

    #[rstest]
    fn test_validate_rejects_zero_interval(mut week: WeeklyProblem) {
        week.steps_per_interval = 0;
        assert_error!(week.validate(), "Steps per sub-interval must be positive");
    }

    #[rstest]
    fn test_release_problem(mut week: WeeklyProblem, dimensions: ProblemDimensions) {
        // Releasing with no buffer is a no-op
        week.release_problem();
        assert!(week.problem.is_none());

        week.allocate_problem(&dimensions).unwrap();
        assert!(week.problem.is_some());
        week.release_problem();
        assert!(week.problem.is_none());
    }
}
