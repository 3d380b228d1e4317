use thiserror::Error;

/// Failures that abort a layout pass or an interactive update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SankeyError {
    /// Column assignment stalled: these nodes wait on each other through
    /// their incoming flows and can never become ready.
    #[error("flow graph contains a cycle through: {}", unplaced.join(", "))]
    Cycle { unplaced: Vec<String> },

    #[error("unknown node: {0}")]
    UnknownNode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_nodes() {
        let err = SankeyError::Cycle {
            unplaced: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(err.to_string(), "flow graph contains a cycle through: A, B");
    }
}
