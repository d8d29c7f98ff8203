//! The sparse LP representation handed to the external solver.
//!
//! An [`OptimisationProblem`] is allocated once per weekly problem, sized from topology counts
//! supplied by the (external) variable/constraint counter. Variable and constraint counts are
//! fixed for the buffer's lifetime; only the sparse constraint-matrix term storage grows, in
//! fixed additive increments, as external constraint construction appends terms.
//!
//! Teardown is Rust ownership: dropping the buffer releases the two-level flexibility-class
//! workspace structure (each class owns its per-sub-interval handles) before the buffer itself,
//! and tolerates a buffer that was never fully populated. Allocation failure is process-fatal,
//! consistent with a batch numerical run where partial allocation cannot be recovered from.
use crate::correspondence::NativeVariable;
use log::debug;

/// Problem sizes computed by the external variable/constraint counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemDimensions {
    /// Total number of decision variables
    pub variables: usize,
    /// Total number of constraints
    pub constraints: usize,
    /// Number of active flexibility (manageability) classes
    pub flexibility_classes: usize,
    /// Estimated maximum number of thermal plants appearing in one constraint
    pub max_plants_per_constraint: usize,
}

/// The type of a decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableKind {
    /// A continuous variable
    #[default]
    Continuous,
    /// An integer variable
    Integer,
}

/// The sense of a constraint row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstraintSense {
    /// Row must equal the right-hand side
    #[default]
    Equal,
    /// Row must not exceed the right-hand side
    LessOrEqual,
    /// Row must be at least the right-hand side
    GreaterOrEqual,
}

/// Identifies the native quantity behind a variable, for result extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableRef {
    /// Time step within the sub-interval
    pub step: usize,
    /// The native quantity the variable's solved value belongs to
    pub native: NativeVariable,
}

/// The family a constraint row belongs to, for result extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Supply/demand balance of an area
    AreaBalance {
        /// Area index
        area: usize,
    },
    /// Reserve margin of an area
    ReserveMargin {
        /// Area index
        area: usize,
    },
    /// Decomposition of an interconnection flow into directional parts
    FlowDecomposition {
        /// Interconnection index
        interconnection: usize,
    },
    /// Weekly hydraulic energy budget of an area
    HydroWeeklyEnergy {
        /// Area index
        area: usize,
    },
    /// Hydraulic ramping constraint of an area
    HydroRamp {
        /// Area index
        area: usize,
    },
}

/// Identifies the native constraint behind a row, for result extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintRef {
    /// Time step within the sub-interval
    pub step: usize,
    /// The constraint family
    pub kind: ConstraintKind,
}

/// Solver workspace for one flexibility class.
///
/// Holds one handle per optimisation sub-interval of the week, populated by the solver
/// invocation. Handles start out `None` ("unsolved").
#[derive(Default)]
pub struct FlexibilityWorkspace {
    /// One solver state per sub-interval
    pub subproblems: Vec<Option<highs::Solution>>,
}

impl FlexibilityWorkspace {
    /// Create a workspace with every sub-interval unsolved
    fn new(sub_intervals: usize) -> Self {
        Self {
            subproblems: (0..sub_intervals).map(|_| None).collect(),
        }
    }
}

/// The sparse LP/MIP buffer consumed by the external solver.
///
/// External constraint construction writes the bounds, matrix terms and right-hand sides; the
/// cost builder overwrites the linear cost vector once per sub-interval. The invariant
/// `term_capacity >= terms written so far` holds after every growth/append cycle.
#[derive(Default)]
pub struct OptimisationProblem {
    /// Number of decision variables (fixed at allocation)
    pub variable_count: usize,
    /// Number of constraints (fixed at allocation)
    pub constraint_count: usize,

    /// Linear cost coefficient per variable
    pub linear_cost: Vec<f64>,
    /// Quadratic cost coefficient per variable (zero for a linear problem)
    pub quadratic_cost: Vec<f64>,
    /// Lower bound per variable
    pub lower_bound: Vec<f64>,
    /// Upper bound per variable
    pub upper_bound: Vec<f64>,
    /// Type per variable
    pub variable_kind: Vec<VariableKind>,
    /// Solved value per variable, scattered back after a solve
    pub solution_value: Vec<f64>,
    /// Reduced cost per variable, scattered back after a solve
    pub reduced_cost: Vec<f64>,
    /// Back-pointer per variable to the native quantity it represents
    pub variable_target: Vec<Option<VariableRef>>,

    /// Sense per constraint row
    pub sense: Vec<ConstraintSense>,
    /// Offset of each row's first term in the term arrays
    pub row_start: Vec<usize>,
    /// Number of terms in each row
    pub row_term_count: Vec<usize>,
    /// Right-hand side per constraint
    pub rhs: Vec<f64>,
    /// Marginal cost (dual value) per constraint, scattered back after a solve
    pub marginal_cost: Vec<f64>,
    /// Back-pointer per constraint to the native constraint it represents
    pub constraint_target: Vec<Option<ConstraintRef>>,

    /// Nonzero coefficients of the constraint matrix; length equals [`Self::term_capacity`]
    pub matrix_coefficients: Vec<f64>,
    /// Column index of each nonzero coefficient; length equals [`Self::term_capacity`]
    pub column_indices: Vec<usize>,
    /// Allocated term capacity of the matrix storage
    pub term_capacity: usize,
    /// Number of terms added per growth call, fixed at allocation
    pub growth_increment: usize,

    /// One solver workspace per active flexibility class
    pub workspaces: Vec<FlexibilityWorkspace>,
}

/// Conservative estimate of the number of nonzero matrix terms the weekly problem needs.
///
/// The estimate deliberately over-allocates so that a full constraint-construction pass for the
/// given topology fits without growth; later variable-data-dependent appends may still exceed it
/// and are handled by [`OptimisationProblem::grow_constraint_matrix`].
pub fn estimate_term_count(
    dims: &ProblemDimensions,
    area_count: usize,
    interconnection_count: usize,
    steps_per_interval: usize,
    startup_cost_terms: usize,
) -> usize {
    let mut terms = dims.max_plants_per_constraint + 3 + interconnection_count / 4;
    terms *= dims.constraints;
    terms += area_count * steps_per_interval;
    terms += area_count * steps_per_interval * 4;
    terms + startup_cost_terms
}

impl OptimisationProblem {
    /// Allocate every array of the buffer.
    ///
    /// Per-variable arrays are sized to the variable count, per-constraint arrays to the
    /// constraint count, and the matrix term storage to `initial_terms` (see
    /// [`estimate_term_count`]). The growth increment is fixed at 10% of the initial term
    /// capacity. One workspace is created per flexibility class, each with `sub_intervals`
    /// unsolved handles.
    pub fn allocate(dims: &ProblemDimensions, initial_terms: usize, sub_intervals: usize) -> Self {
        debug!(
            "Allocating problem buffer: {} variables, {} constraints, {} terms",
            dims.variables, dims.constraints, initial_terms
        );

        Self {
            variable_count: dims.variables,
            constraint_count: dims.constraints,
            linear_cost: vec![0.0; dims.variables],
            quadratic_cost: vec![0.0; dims.variables],
            lower_bound: vec![0.0; dims.variables],
            upper_bound: vec![0.0; dims.variables],
            variable_kind: vec![VariableKind::Continuous; dims.variables],
            solution_value: vec![0.0; dims.variables],
            reduced_cost: vec![0.0; dims.variables],
            variable_target: vec![None; dims.variables],
            sense: vec![ConstraintSense::Equal; dims.constraints],
            row_start: vec![0; dims.constraints],
            row_term_count: vec![0; dims.constraints],
            rhs: vec![0.0; dims.constraints],
            marginal_cost: vec![0.0; dims.constraints],
            constraint_target: vec![None; dims.constraints],
            matrix_coefficients: vec![0.0; initial_terms],
            column_indices: vec![0; initial_terms],
            term_capacity: initial_terms,
            growth_increment: initial_terms / 10,
            workspaces: (0..dims.flexibility_classes)
                .map(|_| FlexibilityWorkspace::new(sub_intervals))
                .collect(),
        }
    }

    /// Grow the constraint-matrix term storage by the fixed increment.
    ///
    /// Growth is additive: the new capacity is the old capacity plus the increment chosen at
    /// allocation. Every previously written (coefficient, column index) pair is preserved at its
    /// old position. Callers that need more than one increment call this repeatedly.
    pub fn grow_constraint_matrix(&mut self) {
        let new_capacity = self.term_capacity + self.growth_increment;
        debug!(
            "Growing constraint matrix storage from {} to {} terms",
            self.term_capacity, new_capacity
        );

        self.matrix_coefficients.resize(new_capacity, 0.0);
        self.column_indices.resize(new_capacity, 0);
        self.term_capacity = new_capacity;
    }

    /// Set the linear cost of a possibly-absent variable.
    ///
    /// An absent mapping or an index outside the variable range means the quantity has no
    /// variable in this formulation; the write is silently skipped.
    pub(crate) fn set_linear_cost(&mut self, variable: Option<usize>, value: f64) {
        if let Some(var) = variable
            && var < self.variable_count
        {
            self.linear_cost[var] = value;
        }
    }
}
