//! Layout orchestration: primary engine, fallback, and the sanity pass.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraint::{ConstraintEngine, ConstraintError, DEFAULT_MAX_LEVEL};
use crate::event::{ClippedEvent, LayoutResult};
use crate::greedy;
use crate::overlap::overlaps;

/// Which algorithm produced (or should produce) a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    /// Linear-constraint solver. Evenly sized bands, can fail.
    #[default]
    Constraint,
    /// Greedy hole-finding. Always succeeds.
    Greedy,
}

impl Engine {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Constraint => "constraint",
            Self::Greedy => "greedy",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to show when the constraint solver fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Lay the events out again with the greedy engine.
    #[default]
    Greedy,
    /// Publish an empty layout, hiding every event for this cycle.
    Empty,
}

/// Layout settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Engine tried first.
    pub primary: Engine,
    /// Behavior when the primary engine is the solver and it fails.
    pub on_solver_failure: FailurePolicy,
    /// Extent of the solver's continuous level axis.
    pub max_level: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            primary: Engine::Constraint,
            on_solver_failure: FailurePolicy::Greedy,
            max_level: DEFAULT_MAX_LEVEL,
        }
    }
}

/// A fallible layout algorithm used as the primary engine.
pub trait LayoutEngine {
    /// Lays out events in the given order.
    fn layout(&self, events: &[ClippedEvent]) -> Result<LayoutResult, ConstraintError>;
}

impl LayoutEngine for ConstraintEngine {
    fn layout(&self, events: &[ClippedEvent]) -> Result<LayoutResult, ConstraintError> {
        Self::layout(self, events)
    }
}

/// A broken layout invariant found by [`check_invariants`].
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// An event's band is upside down.
    #[error("event {index} has min level {min_level} above max level {max_level}")]
    InvertedBand {
        index: usize,
        min_level: u32,
        max_level: u32,
    },

    /// An event reaches past the layout's global max level.
    #[error("event {index} reaches level {max_level}, above global max {global_max}")]
    AboveGlobalMax {
        index: usize,
        max_level: u32,
        global_max: u32,
    },

    /// Two events overlap in time and share a level.
    #[error("events {first} and {second} overlap in time and share a level")]
    SharedLevel { first: usize, second: usize },
}

/// The layout chosen for one computation, with how it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutOutcome {
    pub result: LayoutResult,
    /// Engine whose output is in `result`.
    pub engine: Engine,
    /// True when the primary engine failed.
    pub fell_back: bool,
    /// Invariant violations found in `result`. Expected to be empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

impl LayoutOutcome {
    /// Outcome for a window with nothing to show.
    pub const fn empty(engine: Engine) -> Self {
        Self {
            result: LayoutResult::empty(),
            engine,
            fell_back: false,
            violations: Vec::new(),
        }
    }
}

/// Runs a primary engine and falls back according to policy.
#[derive(Debug, Clone)]
pub struct Orchestrator<P> {
    primary: P,
    primary_kind: Engine,
    on_failure: FailurePolicy,
}

impl Orchestrator<ConstraintEngine> {
    /// Builds the orchestrator described by `config`.
    pub const fn from_config(config: &LayoutConfig) -> Self {
        Self {
            primary: ConstraintEngine::new(config.max_level),
            primary_kind: config.primary,
            on_failure: config.on_solver_failure,
        }
    }
}

impl<P: LayoutEngine> Orchestrator<P> {
    /// Uses `primary` as the solver engine.
    pub const fn with_primary(primary: P, on_failure: FailurePolicy) -> Self {
        Self {
            primary,
            primary_kind: Engine::Constraint,
            on_failure,
        }
    }

    /// Lays out events and checks the result.
    ///
    /// Never fails: solver errors are logged and handled by the failure
    /// policy, and invariant violations are logged and reported in the outcome.
    pub fn run(&self, events: &[ClippedEvent]) -> LayoutOutcome {
        if events.is_empty() {
            return LayoutOutcome::empty(self.primary_kind);
        }

        let (result, engine, fell_back) = match self.primary_kind {
            Engine::Greedy => (greedy::layout(events), Engine::Greedy, false),
            Engine::Constraint => match self.primary.layout(events) {
                Ok(result) => (result, Engine::Constraint, false),
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        events = events.len(),
                        policy = ?self.on_failure,
                        "constraint layout failed"
                    );
                    match self.on_failure {
                        FailurePolicy::Greedy => (greedy::layout(events), Engine::Greedy, true),
                        FailurePolicy::Empty => (LayoutResult::empty(), Engine::Constraint, true),
                    }
                }
            },
        };

        let violations = check_invariants(&result);
        for violation in &violations {
            tracing::error!(%violation, engine = %engine, "layout invariant violated");
        }

        LayoutOutcome {
            result,
            engine,
            fell_back,
            violations,
        }
    }
}

/// Lays out events according to `config`.
pub fn compute_layout(events: &[ClippedEvent], config: &LayoutConfig) -> LayoutOutcome {
    Orchestrator::from_config(config).run(events)
}

/// Checks a layout against its invariants.
///
/// Every band must be non-inverted and stay at or below the global max
/// level, and events that overlap in time must not share any level.
pub fn check_invariants(result: &LayoutResult) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (index, event) in result.events.iter().enumerate() {
        if event.min_level > event.max_level {
            violations.push(Violation::InvertedBand {
                index,
                min_level: event.min_level,
                max_level: event.max_level,
            });
        }
        if event.max_level > result.max_level {
            violations.push(Violation::AboveGlobalMax {
                index,
                max_level: event.max_level,
                global_max: result.max_level,
            });
        }
    }

    for (first, a) in result.events.iter().enumerate() {
        for (second, b) in result.events.iter().enumerate().skip(first + 1) {
            if overlaps(a, b) && a.shares_level_with(b) {
                violations.push(Violation::SharedLevel { first, second });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LeveledEvent;

    const MIN: i64 = 60_000;

    fn event(start_min: i64, end_min: i64) -> ClippedEvent {
        ClippedEvent::new(start_min * MIN, end_min * MIN, 0)
    }

    struct FailingEngine;

    impl LayoutEngine for FailingEngine {
        fn layout(&self, _events: &[ClippedEvent]) -> Result<LayoutResult, ConstraintError> {
            Err(ConstraintError::Unsatisfiable {
                constraint: "injected".to_string(),
            })
        }
    }

    /// Returns a layout that stacks everything on level 0.
    struct OverlappingEngine;

    impl LayoutEngine for OverlappingEngine {
        fn layout(&self, events: &[ClippedEvent]) -> Result<LayoutResult, ConstraintError> {
            let events = events.iter().map(|e| LeveledEvent::new(*e, 0, 0));
            Ok(LayoutResult {
                events: events.collect(),
                max_level: 0,
            })
        }
    }

    fn busy_morning() -> Vec<ClippedEvent> {
        vec![
            event(0, 60),
            event(30, 90),
            event(45, 50),
            event(100, 200),
            event(0, 300),
        ]
    }

    #[test]
    fn empty_input_is_empty_layout() {
        let outcome = compute_layout(&[], &LayoutConfig::default());
        assert!(outcome.result.events.is_empty());
        assert_eq!(outcome.result.max_level, 0);
        assert!(!outcome.fell_back);
    }

    #[test]
    fn constraint_engine_is_default_primary() {
        let events = busy_morning();
        let outcome = compute_layout(&events, &LayoutConfig::default());
        assert_eq!(outcome.engine, Engine::Constraint);
        assert!(!outcome.fell_back);
        assert_eq!(outcome.result.max_level, DEFAULT_MAX_LEVEL);
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn greedy_primary_skips_solver() {
        let config = LayoutConfig {
            primary: Engine::Greedy,
            ..LayoutConfig::default()
        };
        let outcome = compute_layout(&[event(0, 60), event(30, 90)], &config);
        assert_eq!(outcome.engine, Engine::Greedy);
        assert_eq!(outcome.result.max_level, 1);
    }

    #[test]
    fn solver_failure_falls_back_to_greedy() {
        let events = busy_morning();
        let outcome = Orchestrator::with_primary(FailingEngine, FailurePolicy::Greedy).run(&events);

        assert!(outcome.fell_back);
        assert_eq!(outcome.engine, Engine::Greedy);
        assert_eq!(outcome.result, greedy::layout(&events));
        assert!(outcome.violations.is_empty());
        assert!(check_invariants(&outcome.result).is_empty());
    }

    #[test]
    fn solver_failure_with_empty_policy_hides_events() {
        let events = busy_morning();
        let outcome = Orchestrator::with_primary(FailingEngine, FailurePolicy::Empty).run(&events);
        assert!(outcome.fell_back);
        assert!(outcome.result.events.is_empty());
        assert_eq!(outcome.result.max_level, 0);
    }

    #[test]
    fn unsatisfiable_axis_falls_back() {
        // Five mutually overlapping events cannot fit on a two-level axis
        // with one level each.
        let config = LayoutConfig {
            max_level: 2,
            ..LayoutConfig::default()
        };
        let events: Vec<_> = (0..5).map(|i| event(i, 100 + i)).collect();
        let outcome = compute_layout(&events, &config);

        assert!(outcome.fell_back);
        assert_eq!(outcome.engine, Engine::Greedy);
        assert_eq!(outcome.result.max_level, 4);
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn violations_are_reported_not_fatal() {
        let events = [event(0, 60), event(30, 90)];
        let orchestrator = Orchestrator::with_primary(OverlappingEngine, FailurePolicy::Greedy);
        let outcome = orchestrator.run(&events);

        assert!(!outcome.fell_back);
        assert_eq!(outcome.result.events.len(), 2);
        let shared = Violation::SharedLevel {
            first: 0,
            second: 1,
        };
        assert_eq!(outcome.violations, vec![shared]);
    }

    #[test]
    fn check_invariants_flags_bad_bands() {
        let result = LayoutResult {
            events: vec![
                LeveledEvent::new(event(0, 10), 3, 1),
                LeveledEvent::new(event(20, 30), 0, 7),
            ],
            max_level: 5,
        };
        let inverted = Violation::InvertedBand {
            index: 0,
            min_level: 3,
            max_level: 1,
        };
        let above = Violation::AboveGlobalMax {
            index: 1,
            max_level: 7,
            global_max: 5,
        };
        assert_eq!(check_invariants(&result), vec![inverted, above]);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: LayoutConfig = serde_json::from_str(r#"{"primary": "greedy"}"#).unwrap();
        assert_eq!(config.primary, Engine::Greedy);
        assert_eq!(config.on_solver_failure, FailurePolicy::Greedy);
        assert_eq!(config.max_level, DEFAULT_MAX_LEVEL);

        let json = r#"{"on_solver_failure": "empty", "max_level": 50}"#;
        let config: LayoutConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.on_solver_failure, FailurePolicy::Empty);
        assert_eq!(config.max_level, 50);
    }
}
