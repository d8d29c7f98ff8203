//! Hands a populated problem buffer to the LP solver for one sub-interval.
//!
//! Only the handoff and result scatter live here: the buffer is converted to a [`highs`] row
//! problem, minimised, and the solution values, reduced costs and constraint dual values are
//! written back into the buffer's result arrays. The solve is also recorded in the workspace
//! handle for its flexibility class and sub-interval.
use crate::problem::{ConstraintSense, VariableKind};
use crate::week::WeeklyProblem;
use anyhow::{Result, bail, ensure};
use highs::{HighsModelStatus, RowProblem, Sense};
use log::debug;

/// Solve one sub-interval of the week for the given flexibility class.
///
/// On success the buffer's solution values, reduced costs and marginal costs hold the solve's
/// results and the class's workspace handle for `interval` is populated.
///
/// # Panics
///
/// Panics if the week owns no problem buffer.
pub fn solve_sub_interval(week: &mut WeeklyProblem, class: usize, interval: usize) -> Result<()> {
    let problem = week.problem.as_mut().expect("No problem buffer allocated");
    ensure!(class < problem.workspaces.len(), "No such flexibility class");
    ensure!(
        interval < problem.workspaces[class].subproblems.len(),
        "No such sub-interval"
    );
    ensure!(
        problem
            .variable_kind
            .iter()
            .all(|&kind| kind == VariableKind::Continuous),
        "Integer variables are not supported by the LP handoff"
    );

    let mut row_problem = RowProblem::default();
    let columns: Vec<_> = (0..problem.variable_count)
        .map(|var| {
            row_problem.add_column(
                problem.linear_cost[var],
                problem.lower_bound[var]..=problem.upper_bound[var],
            )
        })
        .collect();

    for row in 0..problem.constraint_count {
        let start = problem.row_start[row];
        let terms = (start..start + problem.row_term_count[row])
            .map(|term| (columns[problem.column_indices[term]], problem.matrix_coefficients[term]));
        let rhs = problem.rhs[row];
        match problem.sense[row] {
            ConstraintSense::Equal => row_problem.add_row(rhs..=rhs, terms),
            ConstraintSense::LessOrEqual => row_problem.add_row(..=rhs, terms),
            ConstraintSense::GreaterOrEqual => row_problem.add_row(rhs.., terms),
        };
    }

    debug!(
        "Solving sub-interval {interval} for flexibility class {class}: {} variables, {} constraints",
        problem.variable_count, problem.constraint_count
    );

    let solved = row_problem.optimise(Sense::Minimise).solve();
    match solved.status() {
        HighsModelStatus::Optimal => {}
        status => bail!("Could not solve sub-interval {interval}: {status:?}"),
    }

    let solution = solved.get_solution();
    problem.solution_value.copy_from_slice(solution.columns());
    problem.reduced_cost.copy_from_slice(solution.dual_columns());
    problem.marginal_cost.copy_from_slice(solution.dual_rows());
    problem.workspaces[class].subproblems[interval] = Some(solution);

    Ok(())
}
