//! Prompt assembly for both chat phases.
//!
//! The collection phase steers the model through a fixed field order and
//! a `submit_profile` tool call; the QA phase grounds the model in the
//! retrieved snippets and forbids outside knowledge.

use serde_json::json;

use crate::chat::lang::Lang;
use crate::chat::validators::FieldError;
use crate::models::{ChatMessage, Profile, Snippet};

/// Fields in the order the assistant asks for them.
pub const FIELD_ORDER: &[&str] = &[
    "first_name",
    "last_name",
    "id",
    "gender",
    "age",
    "payer",
    "payer_card",
    "tier",
];

const COLLECT_SYSTEM_HE: &str = "אתה עוזר וירטואלי של שירותי בריאות. תפקידך לאסוף את פרטי המשתמש לפני מתן מידע על הטבות.\n\
עליך לאסוף את השדות הבאים, אחד או שניים בכל פעם, בסדר הזה: שם פרטי, שם משפחה, מספר תעודת זהות (9 ספרות), מגדר, גיל (0-120), קופת חולים (מכבי / מאוחדת / כללית), מספר כרטיס קופה (9 ספרות), מסלול ביטוח (זהב / כסף / ארד).\n\
כאשר כל השדות נאספו, הצג למשתמש סיכום ובקש אישור מפורש.\n\
רק לאחר שהמשתמש אישר במפורש, קרא לכלי submit_profile עם כל השדות.\n\
לעולם אל תדפיס JSON או את תוכן הכלי בטקסט התשובה.\n\
היה אדיב וקצר. אל תענה על שאלות רפואיות בשלב זה.";

const COLLECT_SYSTEM_EN: &str = "You are a virtual assistant for a health services provider. Your job is to collect the user's details before answering benefit questions.\n\
Collect the following fields, one or two at a time, in this order: first name, last name, national ID (9 digits), gender, age (0-120), HMO (מכבי / מאוחדת / כללית), HMO card number (9 digits), membership tier (זהב / כסף / ארד).\n\
Once every field is collected, show the user a summary and ask for explicit confirmation.\n\
Only after the user explicitly confirms, call the submit_profile tool with all fields.\n\
Never print JSON or tool contents in your reply text.\n\
Be polite and concise. Do not answer medical questions during this phase.";

const QA_SYSTEM_HE: &str = "אתה עוזר וירטואלי העונה על שאלות לגבי הטבות בריאות.\n\
ענה אך ורק על סמך קטעי המידע המצורפים. אם המידע אינו מופיע בקטעים, אמור שאין לך מידע על כך.\n\
הנח שהשאלה מתייחסת לקופה ולמסלול של המשתמש אלא אם צוין אחרת.\n\
השתמש במונח \"ארד\" ולא \"ברונזה\".\n\
ציין סכומים, אחוזי הנחה ותנאים בדיוק כפי שהם מופיעים בקטעים.";

const QA_SYSTEM_EN: &str = "You are a virtual assistant answering questions about health benefits.\n\
Answer strictly from the attached knowledge snippets. If the information is not in the snippets, say you do not have information about it.\n\
Assume the question refers to the user's own HMO and membership tier unless stated otherwise.\n\
Quote amounts, discount percentages and conditions exactly as they appear in the snippets.";

/// Tool schema the collection phase hands to the model.
pub fn submit_profile_tool() -> serde_json::Value {
    json!([{
        "type": "function",
        "function": {
            "name": "submit_profile",
            "description": "Submit the collected and user-confirmed profile.",
            "parameters": {
                "type": "object",
                "properties": {
                    "first_name": {"type": "string"},
                    "last_name": {"type": "string"},
                    "id": {"type": "string", "description": "9-digit national ID"},
                    "gender": {"type": "string"},
                    "age": {"type": "integer", "minimum": 0, "maximum": 120},
                    "payer": {
                        "type": "string",
                        "enum": ["מכבי", "מאוחדת", "כללית", "Maccabi", "Meuhedet", "Clalit"]
                    },
                    "payer_card": {"type": "string", "description": "9-digit HMO card number"},
                    "tier": {
                        "type": "string",
                        "enum": ["זהב", "כסף", "ארד", "gold", "silver", "bronze"]
                    }
                },
                "required": FIELD_ORDER
            }
        }
    }])
}

/// Short worked example showing the ask-one-field-at-a-time rhythm.
fn few_shot(lang: Lang) -> [ChatMessage; 2] {
    match lang {
        Lang::He => [
            ChatMessage::new("user", "שלום, קוראים לי דנה"),
            ChatMessage::new("assistant", "נעים מאוד דנה! מה שם המשפחה שלך?"),
        ],
        Lang::En => [
            ChatMessage::new("user", "Hi, my name is Dana"),
            ChatMessage::new("assistant", "Nice to meet you, Dana! What is your last name?"),
        ],
    }
}

/// System prompt + few-shot example + current-state context + sanitized
/// history for the collection phase.
pub fn build_collection_messages(
    history: &[ChatMessage],
    profile: &Profile,
    lang: Lang,
) -> Vec<ChatMessage> {
    let system = match lang {
        Lang::He => COLLECT_SYSTEM_HE,
        Lang::En => COLLECT_SYSTEM_EN,
    };

    let known = serde_json::to_string(profile).unwrap_or_else(|_| "{}".to_string());
    let order = FIELD_ORDER.join(", ");
    let context = match lang {
        Lang::He => format!("שדות שנאספו עד כה: {known}. סדר השדות: {order}."),
        Lang::En => format!("Fields collected so far: {known}. Field order: {order}."),
    };

    let mut messages = vec![ChatMessage::new("system", system)];
    messages.extend(few_shot(lang));
    messages.push(ChatMessage::new("system", context));
    messages.extend(history.iter().cloned());
    messages
}

/// System prompt + profile defaults + grounding snippets + history for
/// the QA phase.
pub fn build_qa_messages(
    history: &[ChatMessage],
    snippets: &[Snippet],
    profile: &Profile,
    lang: Lang,
) -> Vec<ChatMessage> {
    let system = match lang {
        Lang::He => QA_SYSTEM_HE,
        Lang::En => QA_SYSTEM_EN,
    };

    let payer = profile.payer.map(|p| p.as_str()).unwrap_or("");
    let tier = profile.tier.map(|t| t.as_str()).unwrap_or("");
    let defaults = match lang {
        Lang::He => format!("קופת החולים של המשתמש: {payer}. מסלול: {tier}."),
        Lang::En => format!("The user's HMO: {payer}. Tier: {tier}."),
    };

    let grounding: Vec<serde_json::Value> = snippets
        .iter()
        .map(|s| {
            json!({
                "category": s.category,
                "service": s.service,
                "payer": s.payer,
                "tier": s.tier,
                "text": s.text,
            })
        })
        .collect();
    let grounding =
        serde_json::to_string(&grounding).unwrap_or_else(|_| "[]".to_string());
    let grounding_msg = match lang {
        Lang::He => format!("קטעי מידע מהמאגר:\n{grounding}"),
        Lang::En => format!("Knowledge snippets:\n{grounding}"),
    };

    let mut messages = vec![
        ChatMessage::new("system", system),
        ChatMessage::new("system", defaults),
        ChatMessage::new("system", grounding_msg),
    ];
    messages.extend(history.iter().cloned());
    messages
}

/// Canned acknowledgement when the profile is confirmed but the model
/// returned no accompanying text.
pub fn confirmation_line(lang: Lang) -> &'static str {
    match lang {
        Lang::He => "תודה! הפרטים נקלטו. אפשר לשאול אותי כל שאלה על ההטבות שלך.",
        Lang::En => "Thanks! Your details were saved. You can now ask me anything about your benefits.",
    }
}

/// Canned reply when retrieval found nothing relevant.
pub fn no_match_line(lang: Lang) -> &'static str {
    match lang {
        Lang::He => "לא מצאתי התאמה במאגר המידע לשאלה הזו. נסה לנסח אותה אחרת או לשאול על שירות אחר.",
        Lang::En => "I couldn't find a match for that in the knowledge base. Try rephrasing, or ask about a different service.",
    }
}

/// User-facing message listing validation failures after a tool
/// submission, asking for corrected values.
pub fn correction_message(errors: &[FieldError], lang: Lang) -> String {
    let list: Vec<String> = errors
        .iter()
        .map(|e| format!("- {}: {}", e.field, e.message))
        .collect();
    let list = list.join("\n");
    match lang {
        Lang::He => format!("חלק מהפרטים לא תקינים:\n{list}\nאנא תקן אותם ונמשיך."),
        Lang::En => format!("Some of the details are invalid:\n{list}\nPlease correct them and we'll continue."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Payer, Tier};

    #[test]
    fn test_tool_schema_requires_all_fields() {
        let tools = submit_profile_tool();
        let required = &tools[0]["function"]["parameters"]["required"];
        assert_eq!(required.as_array().map(Vec::len), Some(8));
    }

    #[test]
    fn test_collection_messages_start_with_system() {
        let history = vec![ChatMessage::new("user", "שלום")];
        let messages = build_collection_messages(&history, &Profile::default(), Lang::He);
        assert_eq!(messages[0].role, "system");
        assert!(messages.last().map(|m| m.role == "user").unwrap_or(false));
    }

    #[test]
    fn test_collection_context_carries_known_fields() {
        let profile = Profile {
            first_name: Some("דנה".to_string()),
            ..Profile::default()
        };
        let messages = build_collection_messages(&[], &profile, Lang::En);
        // System, two few-shot turns, then the context message.
        assert!(messages[3].content.contains("דנה"));
        assert!(messages[3].content.contains("payer_card"));
    }

    #[test]
    fn test_qa_messages_carry_profile_and_snippets() {
        let profile = Profile {
            payer: Some(Payer::Maccabi),
            tier: Some(Tier::Gold),
            ..Profile::default()
        };
        let snippets = vec![Snippet {
            score: 0.9,
            category: "מרפאות שיניים".to_string(),
            service: "ניקוי אבנית".to_string(),
            payer: Payer::Maccabi,
            tier: Tier::Gold,
            text: "פעמיים בשנה ללא עלות".to_string(),
            source: "dental_services.html".to_string(),
        }];
        let messages = build_qa_messages(&[], &snippets, &profile, Lang::He);
        assert!(messages[1].content.contains("מכבי"));
        assert!(messages[2].content.contains("ניקוי אבנית"));
    }

    #[test]
    fn test_correction_message_lists_every_error() {
        let errors = vec![
            FieldError {
                field: "id",
                message: "ID number must be exactly 9 digits".to_string(),
            },
            FieldError {
                field: "age",
                message: "age must be a whole number between 0 and 120".to_string(),
            },
        ];
        let msg = correction_message(&errors, Lang::En);
        assert!(msg.contains("- id:"));
        assert!(msg.contains("- age:"));
    }
}
