use tracing::{info, warn};

use super::state::ConversationState;

/// Where the workflow goes after feedback has been interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Back to query translation with the rewritten request.
    Retranslate,
    /// The turn is over.
    End,
}

/// Decide between looping and ending from the selection and whether the
/// user rejected the suggestions this pass. Same inputs, same route.
///
/// Feedback that could not be read counts as no rejection, so the turn ends.
pub fn recipe_satisfaction(selected: Option<usize>, rejected: bool) -> Route {
    match (selected, rejected) {
        (None, true) => Route::Retranslate,
        (Some(_), _) => Route::End,
        (None, false) => Route::End,
    }
}

/// Route for a live state. A selection that does not point into the
/// current recipes is treated as an error and ends the turn.
pub fn route(state: &ConversationState, rejected: bool) -> Route {
    if let Some(index) = state.selected {
        if !state.is_valid_index(index) {
            warn!(
                "Error in satisfaction check: selection {} is outside {} recipes",
                index,
                state.recipes.len()
            );
            return Route::End;
        }
    }

    let route = recipe_satisfaction(state.selected, rejected);
    match (route, state.selected) {
        (Route::Retranslate, _) => info!("User not satisfied, restarting query"),
        (Route::End, Some(index)) => info!("User satisfied with recipe {}", index),
        (Route::End, None) => info!("No feedback yet or current iteration complete"),
    }
    route
}
