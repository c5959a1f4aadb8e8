use std::fmt;

/// Lifecycle of one execution.
///
/// ```text
/// Ready -> Trying -> Succeeded ------------------------------+
///                 -> Failed -> Unrecovered ------------------+-> Releasing -> Done
///                           -> Recovering -> Recovered ------+
///                                         -> AggregateFailed-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeState {
    Ready,
    Trying,
    Succeeded,
    Failed,
    /// Primary failed with no recovery; the primary error is handed back as is.
    Unrecovered,
    Recovering,
    Recovered,
    AggregateFailed,
    Releasing,
    Done,
}

impl ScopeState {
    /// States an execution settles in before the resource is released.
    pub fn is_outcome(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Unrecovered | Self::Recovered | Self::AggregateFailed
        )
    }

    pub fn can_advance_to(self, next: ScopeState) -> bool {
        use ScopeState::*;
        match (self, next) {
            (Ready, Trying) => true,
            (Trying, Succeeded | Failed) => true,
            (Failed, Unrecovered | Recovering) => true,
            (Recovering, Recovered | AggregateFailed) => true,
            (from, Releasing) => from.is_outcome(),
            (Releasing, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ScopeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "ready",
            Self::Trying => "trying",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Unrecovered => "unrecovered",
            Self::Recovering => "recovering",
            Self::Recovered => "recovered",
            Self::AggregateFailed => "aggregate_failed",
            Self::Releasing => "releasing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Tracks the current state of one execution and traces every transition.
#[derive(Debug)]
pub(crate) struct Machine {
    state: ScopeState,
    outcome: Option<ScopeState>,
}

impl Machine {
    pub(crate) fn new() -> Self {
        Self {
            state: ScopeState::Ready,
            outcome: None,
        }
    }

    pub(crate) fn advance(&mut self, next: ScopeState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal scope transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "scope transition");
        if next.is_outcome() {
            self.outcome = Some(next);
        }
        self.state = next;
    }

    /// The outcome state reached before release, or the current state if
    /// none was reached yet.
    pub(crate) fn outcome(&self) -> ScopeState {
        self.outcome.unwrap_or(self.state)
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> ScopeState {
        self.state
    }
}
