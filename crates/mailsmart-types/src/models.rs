use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

// -- Badge colors --

/// Badge / stat colors understood by the panel front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Success,
    Warning,
    Danger,
    Info,
    Gray,
    Primary,
}

// -- Roles --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }

    /// Landing page of the panel this role belongs to.
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Self::User => "/",
            Self::Admin => "/admin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::User => "Utilisateur",
            Self::Admin => "Administrateur",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::User => Color::Info,
            Self::Admin => Color::Success,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(ParseEnumError {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

// -- Emotions --

/// Affect label assigned to a message, either predicted or corrected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Anger,
    Joy,
    Sadness,
    #[default]
    Neutral,
    Fear,
    Surprise,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Self::Anger,
        Self::Joy,
        Self::Sadness,
        Self::Neutral,
        Self::Fear,
        Self::Surprise,
    ];

    /// Wire/storage value, as exchanged with the prediction API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anger => "anger",
            Self::Joy => "joy",
            Self::Sadness => "sadness",
            Self::Neutral => "neutral",
            Self::Fear => "fear",
            Self::Surprise => "surprise",
        }
    }

    /// Display label shown in the panels.
    pub fn label(self) -> &'static str {
        match self {
            Self::Anger => "Colère",
            Self::Joy => "Joie",
            Self::Sadness => "Tristesse",
            Self::Neutral => "Neutre",
            Self::Fear => "Peur",
            Self::Surprise => "Surprise",
        }
    }

    /// Inverse of [`Emotion::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.label() == label)
    }

    /// Lenient parse for classifier output: anything missing or unrecognized is neutral.
    pub fn from_prediction(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    pub fn color(self) -> Color {
        match self {
            Self::Anger => Color::Danger,
            Self::Joy => Color::Success,
            Self::Sadness => Color::Info,
            Self::Fear | Self::Surprise => Color::Warning,
            Self::Neutral => Color::Gray,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "emotion",
                value: s.to_string(),
            })
    }
}

// -- Spam badge --

pub fn spam_label(is_spam: bool) -> &'static str {
    if is_spam { "Oui" } else { "Non" }
}

pub fn spam_color(is_spam: bool) -> Color {
    if is_spam { Color::Danger } else { Color::Success }
}
