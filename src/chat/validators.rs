//! Profile field validation and PII masking.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::models::{Payer, Profile, Tier};

static NINE_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{9}$").unwrap_or_else(|e| panic!("bad id regex: {e}")));

static PII_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{6})\d{3}\b").unwrap_or_else(|e| panic!("bad pii regex: {e}")));

/// One field that failed validation, with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Arguments of a `submit_profile` tool call, as the model produced
/// them. Everything is optional and loosely typed; `apply_profile_args`
/// does the real validation. `age` accepts either a JSON number or a
/// numeric string since models emit both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileArgs {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<serde_json::Value>,
    #[serde(default)]
    pub payer: Option<String>,
    #[serde(default)]
    pub payer_card: Option<String>,
    #[serde(default)]
    pub tier: Option<Tier>,
}

/// Validate the submitted arguments and merge the valid ones into the
/// profile. Invalid fields are reported and left untouched.
pub fn apply_profile_args(args: &ProfileArgs, profile: &mut Profile) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(v) = nonempty(&args.first_name) {
        profile.first_name = Some(v);
    }
    if let Some(v) = nonempty(&args.last_name) {
        profile.last_name = Some(v);
    }
    if let Some(v) = nonempty(&args.gender) {
        profile.gender = Some(v);
    }

    if let Some(id) = nonempty(&args.id) {
        if NINE_DIGITS_RE.is_match(&id) {
            profile.id_number = Some(id);
        } else {
            errors.push(FieldError {
                field: "id",
                message: "ID number must be exactly 9 digits".to_string(),
            });
        }
    }

    if let Some(card) = nonempty(&args.payer_card) {
        if NINE_DIGITS_RE.is_match(&card) {
            profile.payer_card = Some(card);
        } else {
            errors.push(FieldError {
                field: "payer_card",
                message: "HMO card number must be exactly 9 digits".to_string(),
            });
        }
    }

    if let Some(raw) = &args.age {
        match parse_age(raw) {
            Some(age) if age <= 120 => profile.age = Some(age),
            _ => errors.push(FieldError {
                field: "age",
                message: "age must be a whole number between 0 and 120".to_string(),
            }),
        }
    }

    if let Some(raw) = nonempty(&args.payer) {
        match Payer::parse(&raw) {
            Some(payer) => profile.payer = Some(payer),
            None => errors.push(FieldError {
                field: "payer",
                message: "HMO must be one of מכבי, מאוחדת, כללית".to_string(),
            }),
        }
    }

    if let Some(tier) = args.tier {
        if tier.is_known() {
            profile.tier = Some(tier);
        } else {
            errors.push(FieldError {
                field: "tier",
                message: "membership tier must be one of זהב, כסף, ארד".to_string(),
            });
        }
    }

    errors
}

fn nonempty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_age(raw: &serde_json::Value) -> Option<u32> {
    match raw {
        serde_json::Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Mask 9-digit identifiers before they reach logs: keep the first six
/// digits, replace the last three.
pub fn mask_pii(s: &str) -> String {
    PII_RE.replace_all(s, "$1***").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_json(json: &str) -> ProfileArgs {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_submission_fills_profile() {
        let args = args_json(
            r#"{"first_name":"דנה","last_name":"לוי","id":"123456789",
                "gender":"נקבה","age":34,"payer":"מכבי",
                "payer_card":"987654321","tier":"זהב"}"#,
        );
        let mut profile = Profile::default();
        let errors = apply_profile_args(&args, &mut profile);
        assert!(errors.is_empty());
        assert_eq!(profile.first_name.as_deref(), Some("דנה"));
        assert_eq!(profile.id_number.as_deref(), Some("123456789"));
        assert_eq!(profile.age, Some(34));
        assert_eq!(profile.payer, Some(Payer::Maccabi));
        assert_eq!(profile.tier, Some(Tier::Gold));
    }

    #[test]
    fn test_bad_id_rejected_field_untouched() {
        let args = args_json(r#"{"id":"12345"}"#);
        let mut profile = Profile::default();
        let errors = apply_profile_args(&args, &mut profile);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "id");
        assert!(profile.id_number.is_none());
    }

    #[test]
    fn test_age_as_string_accepted() {
        let args = args_json(r#"{"age":"42"}"#);
        let mut profile = Profile::default();
        assert!(apply_profile_args(&args, &mut profile).is_empty());
        assert_eq!(profile.age, Some(42));
    }

    #[test]
    fn test_age_out_of_range_rejected() {
        let args = args_json(r#"{"age":200}"#);
        let mut profile = Profile::default();
        let errors = apply_profile_args(&args, &mut profile);
        assert_eq!(errors[0].field, "age");
        assert!(profile.age.is_none());
    }

    #[test]
    fn test_transliterated_payer_accepted() {
        let args = args_json(r#"{"payer":"Clalit"}"#);
        let mut profile = Profile::default();
        assert!(apply_profile_args(&args, &mut profile).is_empty());
        assert_eq!(profile.payer, Some(Payer::Clalit));
    }

    #[test]
    fn test_unknown_payer_rejected() {
        let args = args_json(r#"{"payer":"kaiser"}"#);
        let mut profile = Profile::default();
        let errors = apply_profile_args(&args, &mut profile);
        assert_eq!(errors[0].field, "payer");
    }

    #[test]
    fn test_unrecognized_tier_string_rejected() {
        // Unknown tier strings deserialize to the Unknown variant.
        let args = args_json(r#"{"tier":"platinum"}"#);
        let mut profile = Profile::default();
        let errors = apply_profile_args(&args, &mut profile);
        assert_eq!(errors[0].field, "tier");
        assert!(profile.tier.is_none());
    }

    #[test]
    fn test_valid_fields_kept_alongside_invalid() {
        let args = args_json(r#"{"first_name":"יוסי","id":"abc"}"#);
        let mut profile = Profile::default();
        let errors = apply_profile_args(&args, &mut profile);
        assert_eq!(errors.len(), 1);
        assert_eq!(profile.first_name.as_deref(), Some("יוסי"));
    }

    #[test]
    fn test_empty_strings_ignored() {
        let args = args_json(r#"{"first_name":"  ","id":""}"#);
        let mut profile = Profile::default();
        assert!(apply_profile_args(&args, &mut profile).is_empty());
        assert!(profile.first_name.is_none());
    }

    #[test]
    fn test_mask_pii() {
        assert_eq!(mask_pii("id 123456789 sent"), "id 123456*** sent");
        assert_eq!(
            mask_pii("{\"id\":\"123456789\",\"card\":\"987654321\"}"),
            "{\"id\":\"123456***\",\"card\":\"987654***\"}"
        );
        assert_eq!(mask_pii("no digits here"), "no digits here");
        // 8 digits are not an id; leave them alone.
        assert_eq!(mask_pii("12345678"), "12345678");
    }
}
