use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A player's move. Parsing rejects anything outside the three recognised
/// throws before the state machine ever sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Throw {
    Rock,
    Paper,
    Scissors,
}

impl Throw {
    /// Standard precedence: paper beats rock, rock beats scissors,
    /// scissors beats paper.
    pub fn beats(self, other: Throw) -> bool {
        matches!(
            (self, other),
            (Throw::Paper, Throw::Rock)
                | (Throw::Rock, Throw::Scissors)
                | (Throw::Scissors, Throw::Paper)
        )
    }
}

impl FromStr for Throw {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rock" => Ok(Throw::Rock),
            "paper" => Ok(Throw::Paper),
            "scissors" => Ok(Throw::Scissors),
            other => Err(GameError::InvalidThrow(other.to_string())),
        }
    }
}

impl fmt::Display for Throw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Throw::Rock => "rock",
            Throw::Paper => "paper",
            Throw::Scissors => "scissors",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognised_throws() {
        assert_eq!("rock".parse::<Throw>().unwrap(), Throw::Rock);
        assert_eq!("paper".parse::<Throw>().unwrap(), Throw::Paper);
        assert_eq!("scissors".parse::<Throw>().unwrap(), Throw::Scissors);
    }

    #[test]
    fn parsing_trims_and_lowercases() {
        assert_eq!("  Rock ".parse::<Throw>().unwrap(), Throw::Rock);
        assert_eq!("SCISSORS\n".parse::<Throw>().unwrap(), Throw::Scissors);
    }

    #[test]
    fn rejects_anything_else() {
        assert!(matches!(
            "lizard".parse::<Throw>(),
            Err(GameError::InvalidThrow(_))
        ));
        assert!("".parse::<Throw>().is_err());
        assert!("rock paper".parse::<Throw>().is_err());
    }

    #[test]
    fn precedence_relation() {
        assert!(Throw::Paper.beats(Throw::Rock));
        assert!(Throw::Rock.beats(Throw::Scissors));
        assert!(Throw::Scissors.beats(Throw::Paper));

        assert!(!Throw::Rock.beats(Throw::Paper));
        assert!(!Throw::Rock.beats(Throw::Rock));
    }

    #[test]
    fn serializes_as_lowercase() {
        assert_eq!(serde_json::to_string(&Throw::Rock).unwrap(), "\"rock\"");
        let parsed: Throw = serde_json::from_str("\"scissors\"").unwrap();
        assert_eq!(parsed, Throw::Scissors);
    }
}
