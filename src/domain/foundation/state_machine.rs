//! State machine trait for lifecycle enums.
//!
//! Gives lifecycle enums (the realtime channel's connection state, for
//! instance) a single way to validate and perform transitions.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors list the legal transitions and get a validated
/// [`transition_to`](StateMachine::transition_to) for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for ChannelState {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Disconnected, Connecting) | (Connecting, Open) | ...)
///     }
///     // ...
/// }
///
/// let next = state.transition_to(ChannelState::Open)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Every state reachable in one step.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns `target` if the move is legal.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::illegal_transition(self, target))
        }
    }

    /// No outgoing transitions.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
