//! Builds the linear cost coefficients for one optimisation sub-interval.
//!
//! For every time step of the window `[first, last)` the builder overwrites the buffer's linear
//! cost vector in place, applying a fixed set of economic rules in a fixed order: transport
//! costs, thermal production costs, the degeneracy-breaking hydraulic opportunity cost,
//! hydraulic ramping penalties and shortfall penalties. Variables with no mapping in a step are
//! left at the value set by the initial zero-fill.
//!
//! The hydraulic cost deserves a word: economically equivalent hydro dispatch solutions are
//! degenerate, so a small cost nudges the solver toward load-following behaviour. The cost
//! blends a deterministic per-hour noise term with the step's normalised position between the
//! area's minimum and maximum abated load over the window; when the window's load range is
//! negligible the noise term is used alone. Magnitudes stay around 1e-4 so the nudge never
//! materially affects total cost.
use crate::area::AreaScratchpad;
use crate::week::{HydroSmoothing, WeeklyProblem};
use float_cmp::approx_eq;
use itertools::Itertools;
use itertools::MinMaxResult::{MinMax, NoElements, OneElement};
use std::ops::Range;

/// Absolute load range (in MW) under which a window counts as flat for the hydraulic cost
const LOAD_RANGE_ZERO_TOLERANCE: f64 = 1e-9;

/// External routine that overlays startup costs onto the linear cost vector.
///
/// Invoked by [`build_linear_costs`] after all base costs for the range are in place, so that
/// startup terms overlay rather than are overwritten by them.
pub trait StartupCostAugmenter {
    /// Augment the linear costs of the week's buffer over the given step range
    fn augment_linear_costs(&mut self, week: &mut WeeklyProblem, range: Range<usize>);
}

/// Recompute each area's minimum and maximum abated load over the window.
///
/// The extrema are reset before the scan; an empty window leaves them at their reset values.
fn compute_load_extrema(
    abated_load: &[Vec<f64>],
    range: &Range<usize>,
    scratchpads: &mut [AreaScratchpad],
) {
    for (area, scratchpad) in scratchpads.iter_mut().enumerate() {
        scratchpad.reset();
        match range.clone().map(|step| abated_load[step][area]).minmax() {
            NoElements => {}
            OneElement(load) => {
                scratchpad.load_min = load;
                scratchpad.load_max = load;
            }
            MinMax(min, max) => {
                scratchpad.load_min = min;
                scratchpad.load_max = max;
            }
        }
    }
}

/// Overwrite the buffer's linear cost vector for the time steps in `range`.
///
/// `scratchpads` holds one [`AreaScratchpad`] per area for the calling scenario space; passing
/// it explicitly (rather than reaching into shared state) is what lets independent scenario
/// threads run this concurrently on their own contexts.
///
/// `startup` is consulted only when startup-cost-aware optimisation is enabled for the week; it
/// runs last, over the same range.
///
/// # Panics
///
/// Panics if the week owns no problem buffer or `scratchpads` does not cover every area.
pub fn build_linear_costs(
    week: &mut WeeklyProblem,
    range: Range<usize>,
    scratchpads: &mut [AreaScratchpad],
    startup: Option<&mut dyn StartupCostAugmenter>,
) {
    {
        let WeeklyProblem {
            hour_in_year,
            areas,
            interconnections,
            abated_load,
            correspondence,
            options,
            problem,
            ..
        } = week;
        let problem = problem.as_mut().expect("No problem buffer allocated");
        assert_eq!(
            scratchpads.len(),
            areas.len(),
            "Expected one scratchpad per area"
        );

        // A linear problem: the whole cost vector is rewritten, the quadratic part stays zero
        problem.linear_cost.fill(0.0);
        problem.quadratic_cost.fill(0.0);

        compute_load_extrema(abated_load, &range, scratchpads);

        for step in range.clone() {
            let table = &correspondence[step - range.start];

            for (index, interconnection) in interconnections.iter().enumerate() {
                problem.set_linear_cost(table.interconnection_flow[index], 0.0);

                if options.transport_costs
                    && let Some(costs) = &interconnection.transport_costs
                {
                    problem.set_linear_cost(
                        table.transport_cost_direct[index],
                        costs.origin_to_destination[step],
                    );
                    problem.set_linear_cost(
                        table.transport_cost_return[index],
                        costs.destination_to_origin[step],
                    );
                }
            }

            for (index, area) in areas.iter().enumerate() {
                let scratchpad = &scratchpads[index];

                for cluster in &area.thermal {
                    problem.set_linear_cost(
                        table.thermal_production[cluster.cluster_index],
                        cluster.hourly_cost[step],
                    );
                }

                let hydro = table.hydro_production[index];
                problem.set_linear_cost(hydro, 0.0);
                if options.hydraulic_costs {
                    let cost = if area.hydro.infinite_cost {
                        options.global_maximum_cost
                    } else {
                        let noise = area.hydro_cost_noise[*hour_in_year + step];
                        let load_range = scratchpad.load_max - scratchpad.load_min;
                        if approx_eq!(f64, load_range, 0.0, epsilon = LOAD_RANGE_ZERO_TOLERANCE) {
                            1e-4 * (5.0 + noise / 10.0)
                        } else {
                            let position =
                                (abated_load[step][index] - scratchpad.load_min) / load_range;
                            1e-4 * (5.0 + (noise + position) / 10.0)
                        }
                    };
                    problem.set_linear_cost(hydro, cost);
                }

                if area.hydro.has_modulable_capacity {
                    match options.hydro_smoothing {
                        HydroSmoothing::SumOfVariations => {
                            let penalty = area.hydro.ramp_penalty_sum_of_variations;
                            problem.set_linear_cost(table.hydro_ramp_down[index], penalty);
                            problem.set_linear_cost(table.hydro_ramp_up[index], penalty);
                        }
                        HydroSmoothing::MaxVariation if step == range.start => {
                            let penalty = area.hydro.ramp_penalty_max_variation;
                            problem.set_linear_cost(table.hydro_ramp_down[index], penalty);
                            problem.set_linear_cost(table.hydro_ramp_up[index], -penalty);
                        }
                        _ => {}
                    }
                }

                let scale = options.large_variable_scaling.unwrap_or(1.0);
                problem.set_linear_cost(
                    table.shortfall_positive[index],
                    area.shortfall.positive / scale,
                );
                problem.set_linear_cost(
                    table.shortfall_negative[index],
                    area.shortfall.negative / scale,
                );
                problem.set_linear_cost(
                    table.shortfall_reserve[index],
                    area.shortfall.reserve / scale,
                );
            }
        }
    }

    if week.options.startup_costs
        && let Some(augmenter) = startup
    {
        augmenter.augment_linear_costs(week, range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{dimensions, week};
    use crate::interconnection::{Interconnection, TransportCosts};
    use crate::problem::ProblemDimensions;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn linear_costs(week: &WeeklyProblem) -> &[f64] {
        &week.problem.as_ref().unwrap().linear_cost
    }

    /// The reference scenario: one area, no interconnections, one thermal plant with hourly
    /// costs 10 then 12, shortfall penalties 1000/500/200, hydro disabled. Variables 0..4 belong
    /// to step 0 and 4..8 to step 1.
    #[rstest]
    fn test_reference_scenario(mut week: WeeklyProblem, dimensions: ProblemDimensions) {
        week.options.hydraulic_costs = false;
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        build_linear_costs(&mut week, 0..2, &mut scratchpads, None);

        let costs = linear_costs(&week);
        assert_eq!(&costs[0..4], &[10.0, 1000.0, 500.0, 200.0]);
        assert_eq!(&costs[4..8], &[12.0, 1000.0, 500.0, 200.0]);
        assert!(costs[8..].iter().all(|&cost| cost == 0.0));
    }

    #[rstest]
    fn test_zero_fill_clears_stale_costs(mut week: WeeklyProblem, dimensions: ProblemDimensions) {
        week.options.hydraulic_costs = false;
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        build_linear_costs(&mut week, 0..2, &mut scratchpads, None);

        // Unmap the thermal plant for step 1; a rebuild must not keep its stale cost
        week.correspondence[1].thermal_production[0] = None;
        build_linear_costs(&mut week, 0..2, &mut scratchpads, None);

        let costs = linear_costs(&week);
        assert_eq!(costs[0], 10.0);
        assert_eq!(costs[4], 0.0);
    }

    #[rstest]
    fn test_hydro_cost_uses_noise_branch_for_flat_load(
        mut week: WeeklyProblem,
        dimensions: ProblemDimensions,
    ) {
        // Identical load in every step: max - min is exactly zero
        week.abated_load = vec![vec![75.0], vec![75.0]];
        week.areas[0].hydro_cost_noise = vec![2.0, 3.0];
        week.correspondence[0].hydro_production[0] = Some(8);
        week.correspondence[1].hydro_production[0] = Some(9);
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        build_linear_costs(&mut week, 0..2, &mut scratchpads, None);

        let costs = linear_costs(&week);
        assert_approx_eq!(f64, costs[8], 1e-4 * (5.0 + 2.0 / 10.0));
        assert_approx_eq!(f64, costs[9], 1e-4 * (5.0 + 3.0 / 10.0));
        assert!(costs.iter().all(|cost| cost.is_finite()));
    }

    #[rstest]
    fn test_hydro_cost_treats_tiny_load_range_as_flat(
        mut week: WeeklyProblem,
        dimensions: ProblemDimensions,
    ) {
        // A load range of 1e-13 is numerical jitter, not a real spread
        week.abated_load = vec![vec![75.0], vec![75.0 + 1e-13]];
        week.areas[0].hydro_cost_noise = vec![2.0, 3.0];
        week.correspondence[0].hydro_production[0] = Some(8);
        week.correspondence[1].hydro_production[0] = Some(9);
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        build_linear_costs(&mut week, 0..2, &mut scratchpads, None);

        let costs = linear_costs(&week);
        assert_approx_eq!(f64, costs[8], 1e-4 * (5.0 + 2.0 / 10.0));
        assert_approx_eq!(f64, costs[9], 1e-4 * (5.0 + 3.0 / 10.0));
        assert!(costs.iter().all(|cost| cost.is_finite()));
    }

    #[rstest]
    fn test_hydro_cost_follows_load(mut week: WeeklyProblem, dimensions: ProblemDimensions) {
        week.abated_load = vec![vec![50.0], vec![150.0]];
        week.correspondence[0].hydro_production[0] = Some(8);
        week.correspondence[1].hydro_production[0] = Some(9);
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        build_linear_costs(&mut week, 0..2, &mut scratchpads, None);

        // Noise is zero in the fixture, so the cost reflects position in [min, max] alone
        let costs = linear_costs(&week);
        assert_approx_eq!(f64, costs[8], 1e-4 * 5.0);
        assert_approx_eq!(f64, costs[9], 1e-4 * (5.0 + 1.0 / 10.0));
        assert_eq!(scratchpads[0].load_min, 50.0);
        assert_eq!(scratchpads[0].load_max, 150.0);
    }

    #[rstest]
    fn test_hydro_infinite_cost_override(mut week: WeeklyProblem, dimensions: ProblemDimensions) {
        week.areas[0].hydro.infinite_cost = true;
        week.options.global_maximum_cost = 1e9;
        week.correspondence[0].hydro_production[0] = Some(8);
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        build_linear_costs(&mut week, 0..2, &mut scratchpads, None);

        assert_eq!(linear_costs(&week)[8], 1e9);
    }

    #[rstest]
    fn test_ramp_penalty_sum_of_variations(mut week: WeeklyProblem, dimensions: ProblemDimensions) {
        week.areas[0].hydro.has_modulable_capacity = true;
        week.areas[0].hydro.ramp_penalty_sum_of_variations = 7.5;
        week.options.hydro_smoothing = HydroSmoothing::SumOfVariations;
        week.correspondence[0].hydro_ramp_down[0] = Some(10);
        week.correspondence[0].hydro_ramp_up[0] = Some(11);
        week.correspondence[1].hydro_ramp_down[0] = Some(12);
        week.correspondence[1].hydro_ramp_up[0] = Some(13);
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        build_linear_costs(&mut week, 0..2, &mut scratchpads, None);

        // Both directions, every step
        let costs = linear_costs(&week);
        assert_eq!(&costs[10..14], &[7.5, 7.5, 7.5, 7.5]);
    }

    #[rstest]
    fn test_ramp_penalty_max_variation(mut week: WeeklyProblem, dimensions: ProblemDimensions) {
        week.areas[0].hydro.has_modulable_capacity = true;
        week.areas[0].hydro.ramp_penalty_max_variation = 4.0;
        week.options.hydro_smoothing = HydroSmoothing::MaxVariation;
        week.correspondence[0].hydro_ramp_down[0] = Some(10);
        week.correspondence[0].hydro_ramp_up[0] = Some(11);
        week.correspondence[1].hydro_ramp_down[0] = Some(12);
        week.correspondence[1].hydro_ramp_up[0] = Some(13);
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        build_linear_costs(&mut week, 0..2, &mut scratchpads, None);

        // First step of the range only, antisymmetric
        let costs = linear_costs(&week);
        assert_eq!(&costs[10..14], &[4.0, -4.0, 0.0, 0.0]);
    }

    #[rstest]
    fn test_shortfall_scaling(mut week: WeeklyProblem, dimensions: ProblemDimensions) {
        week.options.hydraulic_costs = false;
        week.options.large_variable_scaling = Some(10.0);
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        build_linear_costs(&mut week, 0..2, &mut scratchpads, None);

        let costs = linear_costs(&week);
        assert_eq!(&costs[1..4], &[100.0, 50.0, 20.0]);
    }

    fn add_interconnection(week: &mut WeeklyProblem) {
        week.interconnections.push(Interconnection {
            origin: 0,
            destination: 0,
            transport_costs: Some(TransportCosts {
                origin_to_destination: vec![3.0, 4.0],
                destination_to_origin: vec![5.0, 6.0],
            }),
        });
        for (step, table) in week.correspondence.iter_mut().enumerate() {
            table.interconnection_flow.push(Some(step * 4 + 8));
            table.transport_cost_direct.push(Some(step * 4 + 9));
            table.transport_cost_return.push(Some(step * 4 + 10));
        }
    }

    #[rstest]
    fn test_transport_costs(mut week: WeeklyProblem, dimensions: ProblemDimensions) {
        week.options.hydraulic_costs = false;
        add_interconnection(&mut week);
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        build_linear_costs(&mut week, 0..2, &mut scratchpads, None);

        let costs = linear_costs(&week);
        assert_eq!(&costs[8..11], &[0.0, 3.0, 5.0]);
        assert_eq!(&costs[12..15], &[0.0, 4.0, 6.0]);
    }

    #[rstest]
    fn test_transport_costs_disabled(mut week: WeeklyProblem, dimensions: ProblemDimensions) {
        week.options.hydraulic_costs = false;
        week.options.transport_costs = false;
        add_interconnection(&mut week);
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        build_linear_costs(&mut week, 0..2, &mut scratchpads, None);

        // Directional cost variables stay at the zero-fill value
        let costs = linear_costs(&week);
        assert_eq!(&costs[9..11], &[0.0, 0.0]);
        assert_eq!(&costs[13..15], &[0.0, 0.0]);
    }

    struct RecordingAugmenter {
        calls: Vec<(Range<usize>, f64)>,
    }

    impl StartupCostAugmenter for RecordingAugmenter {
        fn augment_linear_costs(&mut self, week: &mut WeeklyProblem, range: Range<usize>) {
            // Record the thermal cost visible when we run, to prove base costs came first
            let cost = week.problem.as_ref().unwrap().linear_cost[0];
            self.calls.push((range, cost));
        }
    }

    #[rstest]
    fn test_startup_hook_runs_after_base_costs(
        mut week: WeeklyProblem,
        dimensions: ProblemDimensions,
    ) {
        week.options.startup_costs = true;
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        let mut augmenter = RecordingAugmenter { calls: Vec::new() };
        build_linear_costs(&mut week, 0..2, &mut scratchpads, Some(&mut augmenter));

        assert_eq!(augmenter.calls, vec![(0..2, 10.0)]);
    }

    #[rstest]
    fn test_startup_hook_skipped_when_disabled(
        mut week: WeeklyProblem,
        dimensions: ProblemDimensions,
    ) {
        week.allocate_problem(&dimensions).unwrap();

        let mut scratchpads = vec![AreaScratchpad::default()];
        let mut augmenter = RecordingAugmenter { calls: Vec::new() };
        build_linear_costs(&mut week, 0..2, &mut scratchpads, Some(&mut augmenter));

        assert!(augmenter.calls.is_empty());
    }
}
