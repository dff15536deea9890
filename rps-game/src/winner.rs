use crate::throw::Throw;
use serde::{Deserialize, Serialize};

/// Result of pairing two throws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Tie,
    Winner { player: String },
}

impl RoundOutcome {
    /// Notification text sent to both players.
    pub fn message(&self) -> String {
        match self {
            RoundOutcome::Tie => "tie".to_string(),
            RoundOutcome::Winner { player } => format!("{} wins.", player),
        }
    }
}

/// Pure winner determination over two well-formed throws.
///
/// Input validation happens at the message boundary; by the time this runs
/// the enum makes invalid throws unrepresentable, so there is no fallback
/// branch.
pub fn determine_winner(
    first_throw: Throw,
    first_player: &str,
    second_throw: Throw,
    second_player: &str,
) -> RoundOutcome {
    if first_throw == second_throw {
        RoundOutcome::Tie
    } else if first_throw.beats(second_throw) {
        RoundOutcome::Winner {
            player: first_player.to_string(),
        }
    } else {
        RoundOutcome::Winner {
            player: second_player.to_string(),
        }
    }
}
