//! Toxicity attribute definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Scores per attribute, each in [0, 1], computed once over the whole corpus.
pub type AttributeScoreMap = BTreeMap<ToxicityAttribute, f64>;

/// Attributes requested from the toxicity provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToxicityAttribute {
    /// Rude, disrespectful, or unreasonable content
    Toxicity,
    /// Negative or hateful content targeting identity
    IdentityAttack,
    /// Insulting, inflammatory, or negative content toward a person
    Insult,
    /// Swear words, curse words, or other obscene language
    Profanity,
    /// Intention to inflict pain, injury, or violence
    Threat,
    /// References to sexual acts or body parts
    SexuallyExplicit,
    /// Pickup lines, complimenting appearance, subtle sexual innuendos
    Flirtation,
}

impl std::fmt::Display for ToxicityAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToxicityAttribute {
    /// Every attribute the service asks for by default.
    pub const ALL: [ToxicityAttribute; 7] = [
        ToxicityAttribute::Toxicity,
        ToxicityAttribute::IdentityAttack,
        ToxicityAttribute::Insult,
        ToxicityAttribute::Profanity,
        ToxicityAttribute::Threat,
        ToxicityAttribute::SexuallyExplicit,
        ToxicityAttribute::Flirtation,
    ];

    /// Wire name used by the toxicity provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToxicityAttribute::Toxicity => "TOXICITY",
            ToxicityAttribute::IdentityAttack => "IDENTITY_ATTACK",
            ToxicityAttribute::Insult => "INSULT",
            ToxicityAttribute::Profanity => "PROFANITY",
            ToxicityAttribute::Threat => "THREAT",
            ToxicityAttribute::SexuallyExplicit => "SEXUALLY_EXPLICIT",
            ToxicityAttribute::Flirtation => "FLIRTATION",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|attr| attr.as_str().eq_ignore_ascii_case(s.trim()))
    }
}
