use serde::{Deserialize, Serialize};

/// A health fund (payer). The knowledge base uses the canonical Hebrew
/// labels; transliterated aliases are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Payer {
    #[serde(rename = "מכבי")]
    Maccabi,
    #[serde(rename = "מאוחדת")]
    Meuhedet,
    #[serde(rename = "כללית")]
    Clalit,
    #[default]
    #[serde(rename = "", other)]
    Unknown,
}

impl Payer {
    /// Canonical label as it appears in the knowledge base.
    pub fn as_str(&self) -> &'static str {
        match self {
            Payer::Maccabi => "מכבי",
            Payer::Meuhedet => "מאוחדת",
            Payer::Clalit => "כללית",
            Payer::Unknown => "",
        }
    }

    /// Parse a canonical label or a known alias (case-insensitive).
    pub fn parse(s: &str) -> Option<Payer> {
        match s.trim().to_lowercase().as_str() {
            "מכבי" | "maccabi" => Some(Payer::Maccabi),
            "מאוחדת" | "meuhedet" => Some(Payer::Meuhedet),
            "כללית" | "clalit" => Some(Payer::Clalit),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Payer::Unknown)
    }
}

/// A membership tier modifying benefit entitlements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Tier {
    #[serde(rename = "זהב")]
    Gold,
    #[serde(rename = "כסף")]
    Silver,
    #[serde(rename = "ארד")]
    Bronze,
    #[default]
    #[serde(rename = "", other)]
    Unknown,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Gold => "זהב",
            Tier::Silver => "כסף",
            Tier::Bronze => "ארד",
            Tier::Unknown => "",
        }
    }

    pub fn parse(s: &str) -> Option<Tier> {
        match s.trim().to_lowercase().as_str() {
            "זהב" | "gold" => Some(Tier::Gold),
            "כסף" | "silver" => Some(Tier::Silver),
            "ארד" | "bronze" => Some(Tier::Bronze),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Tier::Unknown)
    }
}

/// An atomic benefit row extracted from one source document.
/// Immutable after extraction; `text` is always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BenefitRow {
    pub category: String,
    pub service: String,
    pub payer: Payer,
    pub tier: Tier,
    pub text: String,
    /// Origin document id (file name).
    pub source: String,
}

/// A retrieval result: one scored benefit row.
#[derive(Debug, Clone, Serialize)]
pub struct Snippet {
    pub score: f32,
    pub category: String,
    pub service: String,
    pub payer: Payer,
    pub tier: Tier,
    pub text: String,
    pub source: String,
}

/// User profile collected during phase A. Fields are partial until the
/// model submits them via the `submit_profile` tool and they validate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// National ID, 9 digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<Payer>,
    /// Payer membership card number, 9 digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_card: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
}

/// A single chat turn (user or assistant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Request for the profile-collection phase.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub language_hint: Option<String>,
    /// Client may pass a partial profile accumulated so far.
    #[serde(default)]
    pub user_profile: Option<Profile>,
}

/// Response for the profile-collection phase.
#[derive(Debug, Clone, Serialize)]
pub struct CollectResponse {
    pub assistant_message: String,
    pub updated_profile: Profile,
    pub profile_confirmed: bool,
}

/// Request for the QA phase. The profile is expected to be confirmed.
#[derive(Debug, Clone, Deserialize)]
pub struct QaRequest {
    pub messages: Vec<ChatMessage>,
    pub user_profile: Profile,
    #[serde(default)]
    pub language_hint: Option<String>,
}

/// Response for the QA phase.
#[derive(Debug, Clone, Serialize)]
pub struct QaResponse {
    pub answer: String,
    pub used_snippets: Vec<Snippet>,
}
