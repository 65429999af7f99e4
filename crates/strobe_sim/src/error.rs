//! Schedule validation errors.
//!
//! All errors are construction-time: once a [`Schedule`](crate::Schedule)
//! exists, the tick loop has no failure path. A defect in a supplied step
//! sequence is reported here as a variant of [`ScheduleError`].

/// Errors that can occur while validating a per-tick schedule.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// A step references a signal ID that is not in the signal table.
    #[error("step `{step}` references signal id {id} outside the signal table")]
    UnknownSignal {
        /// Name of the offending step.
        step: String,
        /// The raw out-of-range signal ID.
        id: u32,
    },

    /// Two steps both write the same signal.
    #[error("signal `{signal}` is written by both `{first}` and `{second}`")]
    MultipleWriters {
        /// Name of the multiply-driven signal.
        signal: String,
        /// Name of the first writing step.
        first: String,
        /// Name of the second writing step.
        second: String,
    },

    /// The combinational producer→consumer relation contains a cycle, so
    /// no step order could be valid.
    #[error("combinational cycle through steps: {path}")]
    CombinationalCycle {
        /// The step names on the cycle, joined with ` -> `.
        path: String,
    },

    /// A step reads a signal before the step that produces it has run.
    #[error("step `{consumer}` reads `{signal}` before its producer `{producer}` has run")]
    OrderViolation {
        /// Name of the signal read too early.
        signal: String,
        /// Name of the producing step.
        producer: String,
        /// Name of the consuming step.
        consumer: String,
    },

    /// A register commit is placed after a same-tick producer of one of
    /// its input ports, which would make the register flow the current
    /// tick's value through instead of holding the previous tick's.
    #[error("commit `{commit}` runs after `{producer}`, which drives its input `{signal}` in the same tick")]
    CommitAfterProducer {
        /// Name of the commit step.
        commit: String,
        /// Name of the step producing the commit's input.
        producer: String,
        /// Name of the input signal.
        signal: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_signal_display() {
        let e = ScheduleError::UnknownSignal {
            step: "top.mux".into(),
            id: 17,
        };
        assert_eq!(
            e.to_string(),
            "step `top.mux` references signal id 17 outside the signal table"
        );
    }

    #[test]
    fn multiple_writers_display() {
        let e = ScheduleError::MultipleWriters {
            signal: "top.x".into(),
            first: "top.a".into(),
            second: "top.b".into(),
        };
        assert_eq!(
            e.to_string(),
            "signal `top.x` is written by both `top.a` and `top.b`"
        );
    }

    #[test]
    fn combinational_cycle_display() {
        let e = ScheduleError::CombinationalCycle {
            path: "top.a -> top.b -> top.a".into(),
        };
        assert_eq!(
            e.to_string(),
            "combinational cycle through steps: top.a -> top.b -> top.a"
        );
    }

    #[test]
    fn order_violation_display() {
        let e = ScheduleError::OrderViolation {
            signal: "top.x".into(),
            producer: "top.adder".into(),
            consumer: "top.mux".into(),
        };
        assert_eq!(
            e.to_string(),
            "step `top.mux` reads `top.x` before its producer `top.adder` has run"
        );
    }

    #[test]
    fn commit_after_producer_display() {
        let e = ScheduleError::CommitAfterProducer {
            commit: "top.reg".into(),
            producer: "top.mux.out".into(),
            signal: "top.reg.in".into(),
        };
        assert_eq!(
            e.to_string(),
            "commit `top.reg` runs after `top.mux.out`, which drives its input `top.reg.in` in the same tick"
        );
    }
}
