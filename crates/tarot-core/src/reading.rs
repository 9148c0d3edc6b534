//! Reading Types
//!
//! A reading is one question and a three-card spread (past / present /
//! future). The client draws the cards; the server only validates shape.

use serde::{Deserialize, Serialize};

use crate::error::{FortuneError, Result};

/// Position of a card within the three-card spread
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadPosition {
    Past,
    Present,
    Future,
}

impl SpreadPosition {
    pub fn label(self) -> &'static str {
        match self {
            SpreadPosition::Past => "Past",
            SpreadPosition::Present => "Present",
            SpreadPosition::Future => "Future",
        }
    }
}

/// One drawn card as submitted by the client
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrawnCard {
    pub position: SpreadPosition,

    #[serde(rename = "cardName")]
    pub card_name: String,

    #[serde(rename = "isReversed", default)]
    pub reversed: bool,
}

impl DrawnCard {
    /// "The Tower (reversed)" style description for prompts and logs
    pub fn describe(&self) -> String {
        if self.reversed {
            format!("{} (reversed)", self.card_name)
        } else {
            format!("{} (upright)", self.card_name)
        }
    }
}

/// A validated request for one interpretation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadingRequest {
    pub question: String,
    pub cards: Vec<DrawnCard>,
}

impl ReadingRequest {
    /// Check shape: a non-empty question and exactly one card per spread
    /// position.
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(FortuneError::InvalidReading("question is empty".into()));
        }
        if self.cards.len() != 3 {
            return Err(FortuneError::InvalidReading(format!(
                "expected 3 cards, got {}",
                self.cards.len()
            )));
        }
        for position in [
            SpreadPosition::Past,
            SpreadPosition::Present,
            SpreadPosition::Future,
        ] {
            let count = self.cards.iter().filter(|c| c.position == position).count();
            if count != 1 {
                return Err(FortuneError::InvalidReading(format!(
                    "spread needs exactly one {} card, got {count}",
                    position.label()
                )));
            }
        }
        if self.cards.iter().any(|c| c.card_name.trim().is_empty()) {
            return Err(FortuneError::InvalidReading("unnamed card in spread".into()));
        }
        Ok(())
    }
}
