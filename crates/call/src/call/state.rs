use std::sync::atomic::{AtomicU8, Ordering};

/// Where a call is in its lifecycle.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Created = 0,
    Executing = 1,
    Succeeded = 2,
    Failed = 3,
    /// Canceled while executing.
    Canceled = 4,
    /// Canceled before anyone executed it.
    CanceledIdle = 5,
}

impl CallState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CallState::Created,
            1 => CallState::Executing,
            2 => CallState::Succeeded,
            3 => CallState::Failed,
            4 => CallState::Canceled,
            _ => CallState::CanceledIdle,
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, CallState::Created | CallState::Executing)
    }

    /// True once `execute` or `enqueue` has been accepted, regardless of completion.
    #[inline]
    pub fn is_executed(self) -> bool {
        !matches!(self, CallState::Created | CallState::CanceledIdle)
    }
}

/// The single mutable field of a call. Every transition is a compare-and-set, so exactly one
/// of several racing `execute`/`enqueue`/`cancel` calls wins the move out of `Created`.
#[derive(Debug)]
pub(crate) struct StateCell {
    state: AtomicU8,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        Self { state: AtomicU8::new(CallState::Created as u8) }
    }

    #[inline]
    pub(crate) fn load(&self) -> CallState {
        CallState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `Created -> Executing`. On failure returns the state that blocked the move.
    pub(crate) fn start(&self) -> Result<(), CallState> {
        self.transition(CallState::Created, CallState::Executing)
    }

    /// `Created -> CanceledIdle`.
    pub(crate) fn cancel_idle(&self) -> Result<(), CallState> {
        self.transition(CallState::Created, CallState::CanceledIdle)
    }

    /// `Executing -> outcome`. Only the owner of the execution calls this; later calls are no-ops.
    pub(crate) fn finish(&self, outcome: CallState) -> bool {
        debug_assert!(outcome.is_terminal());
        self.transition(CallState::Executing, outcome).is_ok()
    }

    fn transition(&self, from: CallState, to: CallState) -> Result<(), CallState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(CallState::from_u8)
    }
}
