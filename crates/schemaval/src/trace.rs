//! Narration hooks for the evaluation engine.
use crate::paths::Location;

/// A sink for engine narration.
///
/// Keywords narrate noteworthy decisions (reference resolution, dynamic
/// reparenting, scope transitions) through the sink configured in
/// [`crate::EvaluationOptions::with_logger`]. The default sink forwards to
/// [`tracing`] at debug level.
pub trait EvaluationLog: Send + Sync {
    /// Record one narration event at `evaluation_path`.
    fn narrate(&self, evaluation_path: &Location, message: &str);
}

/// The default sink: forwards narration to `tracing::debug!`.
#[derive(Debug, Default)]
pub struct TracingLog;

impl EvaluationLog for TracingLog {
    fn narrate(&self, evaluation_path: &Location, message: &str) {
        tracing::debug!(evaluation_path = %evaluation_path, "{message}");
    }
}

impl<F> EvaluationLog for F
where
    F: Fn(&Location, &str) + Send + Sync,
{
    fn narrate(&self, evaluation_path: &Location, message: &str) {
        self(evaluation_path, message);
    }
}

#[cfg(test)]
mod tests {
    use super::EvaluationLog;
    use crate::paths::Location;
    use std::sync::{Arc, Mutex};

    #[test]
    fn closures_are_sinks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |path: &Location, message: &str| {
                seen.lock().expect("Lock is not poisoned").push(format!("{path}: {message}"));
            }
        };
        sink.narrate(&Location::new().join("items"), "resolved");
        assert_eq!(seen.lock().expect("Lock is not poisoned").as_slice(), ["/items: resolved"]);
    }
}
