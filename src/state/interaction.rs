//! Interaction states and what each one shows to the user

use serde::{Deserialize, Serialize};

/// The five states of a voice interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    /// Waiting for the wake phrase
    ActivationListening,
    /// Wake phrase heard, capturing the query
    QueryListening,
    /// Query sent, waiting for the answer
    Processing,
    /// Answer is being spoken
    Speaking,
    /// Input permission was denied; needs a new start trigger
    Error,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::ActivationListening
    }
}

impl std::fmt::Display for InteractionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionState::ActivationListening => write!(f, "ActivationListening"),
            InteractionState::QueryListening => write!(f, "QueryListening"),
            InteractionState::Processing => write!(f, "Processing"),
            InteractionState::Speaking => write!(f, "Speaking"),
            InteractionState::Error => write!(f, "Error"),
        }
    }
}

impl InteractionState {
    #[cfg(test)]
    pub const ALL: [InteractionState; 5] = [
        InteractionState::ActivationListening,
        InteractionState::QueryListening,
        InteractionState::Processing,
        InteractionState::Speaking,
        InteractionState::Error,
    ];

    /// Accent color bound to this state
    pub fn accent(self) -> Accent {
        match self {
            InteractionState::ActivationListening => Accent::Red,
            InteractionState::QueryListening => Accent::Blue,
            InteractionState::Processing => Accent::Yellow,
            InteractionState::Speaking => Accent::Green,
            InteractionState::Error => Accent::Grey,
        }
    }

    pub fn is_speaking(self) -> bool {
        self == InteractionState::Speaking
    }
}

/// Accent color applied to every visual band at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accent {
    Red,
    Blue,
    Yellow,
    Green,
    Grey,
}

impl Accent {
    /// 24-bit RGB value
    pub fn rgb(self) -> u32 {
        match self {
            Accent::Red => 0xff0000,
            Accent::Blue => 0x0088ff,
            Accent::Yellow => 0xffff00,
            Accent::Green => 0x00ff00,
            Accent::Grey => 0x808080,
        }
    }
}

/// Style tag attached to a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusClass {
    ListeningActivation,
    ListeningQuery,
    Processing,
    Speaking,
    Error,
}

/// Plain-text status shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    pub text: String,
    pub class: StatusClass,
}

impl StatusLine {
    pub fn activation(wake_phrase: &str) -> Self {
        Self {
            text: format!("Say \"{}\" to activate", wake_phrase),
            class: StatusClass::ListeningActivation,
        }
    }

    pub fn query() -> Self {
        Self {
            text: "Listening for your query...".to_string(),
            class: StatusClass::ListeningQuery,
        }
    }

    pub fn processing() -> Self {
        Self {
            text: "Processing...".to_string(),
            class: StatusClass::Processing,
        }
    }

    pub fn speaking() -> Self {
        Self {
            text: "Speaking...".to_string(),
            class: StatusClass::Speaking,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            text: message.into(),
            class: StatusClass::Error,
        }
    }
}
