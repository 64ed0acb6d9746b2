//! Linear-constraint layout.
//!
//! Every event gets two continuous variables on a level axis of
//! `[0, max_level]`: where its band starts and how thick it is. Overlapping
//! events are forced apart in input order, while weak constraints push bands
//! to fill the axis and keep mutually overlapping bands the same thickness.
//! The system is solved with the Cassowary incremental simplex solver.
//!
//! Solved bands are half-open ranges `[start, start + size)` mapped onto
//! integer levels, so adjacent bands never share a level after rounding.

use cassowary::WeightedRelation::{EQ, GE, LE};
use cassowary::strength::{REQUIRED, WEAK};
use cassowary::{AddConstraintError, Constraint, Expression, Solver, Variable};
use thiserror::Error;

use crate::event::{ClippedEvent, LayoutResult, LeveledEvent};
use crate::overlap::overlaps;

/// Default extent of the continuous level axis.
pub const DEFAULT_MAX_LEVEL: u32 = 10_000;

/// Solved values are snapped to a grid of `1 / SNAP_SCALE` before rounding to
/// absorb floating-point noise around half-level boundaries.
const SNAP_SCALE: f64 = 1e6;

/// Ways the constraint layout can fail.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConstraintError {
    /// A required constraint contradicts the ones already added.
    #[error("unsatisfiable required constraint: {constraint}")]
    Unsatisfiable { constraint: String },

    /// The same constraint object was added twice.
    #[error("duplicate constraint: {constraint}")]
    Duplicate { constraint: String },

    /// The solver reported an internal failure.
    #[error("internal solver error on {constraint}: {message}")]
    Internal {
        constraint: String,
        message: &'static str,
    },

    /// A solved value was NaN or infinite.
    #[error("solver produced a non-finite value for event {index}")]
    NonFinite { index: usize },
}

impl ConstraintError {
    fn from_solver(err: AddConstraintError, constraint: impl Into<String>) -> Self {
        let constraint = constraint.into();
        match err {
            AddConstraintError::UnsatisfiableConstraint => Self::Unsatisfiable { constraint },
            AddConstraintError::DuplicateConstraint => Self::Duplicate { constraint },
            AddConstraintError::InternalSolverError(message) => Self::Internal {
                constraint,
                message,
            },
        }
    }
}

/// Layout engine backed by a linear constraint solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintEngine {
    max_level: u32,
}

impl Default for ConstraintEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEVEL)
    }
}

impl ConstraintEngine {
    pub const fn new(max_level: u32) -> Self {
        Self { max_level }
    }

    /// Lays out events in the given order.
    ///
    /// The result always reports the engine's `max_level` as its global
    /// maximum, independent of how many levels the bands actually use.
    pub fn layout(&self, events: &[ClippedEvent]) -> Result<LayoutResult, ConstraintError> {
        let model = Model::build(events, self.max_level)?;
        let result = model.solve()?;
        tracing::debug!(
            events = result.events.len(),
            max_level = result.max_level,
            "constraint layout complete"
        );
        Ok(result)
    }
}

/// A populated solver with one `(start, size)` variable pair per event.
struct Model<'a> {
    events: &'a [ClippedEvent],
    solver: Solver,
    starts: Vec<Variable>,
    sizes: Vec<Variable>,
    max_level: u32,
}

impl<'a> Model<'a> {
    fn build(events: &'a [ClippedEvent], max_level: u32) -> Result<Self, ConstraintError> {
        let mut solver = Solver::new();
        let starts: Vec<_> = events.iter().map(|_| Variable::new()).collect();
        let sizes: Vec<_> = events.iter().map(|_| Variable::new()).collect();
        let axis = f64::from(max_level);

        for (i, (&start, &size)) in starts.iter().zip(&sizes).enumerate() {
            add(&mut solver, start | GE(REQUIRED) | 0.0, || format!("start[{i}] >= 0"))?;
            add(&mut solver, start | LE(REQUIRED) | axis, || format!("start[{i}] <= max"))?;
            add(&mut solver, size | GE(REQUIRED) | 1.0, || format!("size[{i}] >= 1"))?;
            add(&mut solver, size | LE(REQUIRED) | axis, || format!("size[{i}] <= max"))?;
            add(&mut solver, start + size | LE(REQUIRED) | axis, || {
                format!("start[{i}] + size[{i}] <= max")
            })?;
        }

        // The stacking direction of an overlapping pair follows input order.
        for (i, j) in overlapping_pairs(events) {
            add(&mut solver, starts[i] + sizes[i] | LE(REQUIRED) | starts[j], || {
                format!("event {i} below event {j}")
            })?;
            add(&mut solver, sizes[i] | EQ(WEAK * 0.5) | sizes[j], || {
                format!("size[{i}] == size[{j}]")
            })?;
        }

        #[expect(
            clippy::cast_precision_loss,
            reason = "event counts are far below f64 precision limits"
        )]
        let target = axis * events.len() as f64;
        let total = sizes
            .iter()
            .fold(Expression::from_constant(0.0), |acc, size| acc + *size);
        add(&mut solver, total | GE(WEAK) | target, || {
            "sum(size) >= max * n".to_string()
        })?;

        Ok(Self {
            events,
            solver,
            starts,
            sizes,
            max_level,
        })
    }

    fn solve(self) -> Result<LayoutResult, ConstraintError> {
        let events = self
            .events
            .iter()
            .enumerate()
            .map(|(index, event)| {
                let start = self.solver.get_value(self.starts[index]);
                let size = self.solver.get_value(self.sizes[index]);
                if !start.is_finite() || !size.is_finite() {
                    return Err(ConstraintError::NonFinite { index });
                }
                let min_level = to_level(start, self.max_level);
                let end = to_level(start + size, self.max_level);
                let max_level = end.saturating_sub(1).max(min_level);
                Ok(LeveledEvent::new(*event, min_level, max_level))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LayoutResult {
            events,
            max_level: self.max_level,
        })
    }
}

fn add(
    solver: &mut Solver,
    constraint: Constraint,
    describe: impl FnOnce() -> String,
) -> Result<(), ConstraintError> {
    solver
        .add_constraint(constraint)
        .map_err(|err| ConstraintError::from_solver(err, describe()))
}

/// Index pairs `(i, j)` with `i < j` whose events overlap.
fn overlapping_pairs(events: &[ClippedEvent]) -> impl Iterator<Item = (usize, usize)> + '_ {
    events.iter().enumerate().flat_map(move |(i, a)| {
        events
            .iter()
            .enumerate()
            .skip(i + 1)
            .filter(move |(_, b)| overlaps(a, *b))
            .map(move |(j, _)| (i, j))
    })
}

/// Rounds a solved coordinate to an integer level within `[0, max_level]`.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to [0, max_level] before the cast"
)]
fn to_level(value: f64, max_level: u32) -> u32 {
    let snapped = (value * SNAP_SCALE).round() / SNAP_SCALE;
    snapped.round().clamp(0.0, f64::from(max_level)) as u32
}
