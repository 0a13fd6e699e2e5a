//! Reply rendering: turns whatever JSON the mail-search service returned into one chat line.
//!
//! The raw value is first decoded into a [`ReplyPayload`] and then rendered by an exhaustive
//! match, so every shape the service can send (and every shape it should not) maps to text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix for application-level errors reported by the service in an `error` field.
pub const ERROR_PREFIX: &str = "⚠️ Error: ";

/// Shown when the service found nothing for the query.
pub const NO_RESULTS_MESSAGE: &str =
    "No matching emails found. Try asking about meetings, orders, or reports.";

/// Shown when the reply has neither a usable `error` nor a usable `response` field.
pub const UNEXPECTED_FORMAT_MESSAGE: &str = "Received unexpected response format.";

/// One matching email as listed by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSummary {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub snippet: String,
}

impl EmailSummary {
    /// Three-line block: subject, sender, snippet.
    fn render(&self) -> String {
        format!("📧 *{}*\nFrom: {}\n{}", self.subject, self.from, self.snippet)
    }
}

/// Decoded shape of a successful reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPayload {
    /// Non-empty `error` field. Takes precedence over `response`.
    ApplicationError(String),
    /// `response` is a list of emails (possibly empty).
    Results(Vec<EmailSummary>),
    /// `response` is plain text.
    Text(String),
    /// Anything else.
    Unrecognized,
}

impl ReplyPayload {
    pub fn decode(raw: &Value) -> Self {
        if let Some(err) = raw.get("error").and_then(error_text) {
            return ReplyPayload::ApplicationError(err);
        }
        match raw.get("response") {
            Some(Value::String(text)) => ReplyPayload::Text(text.clone()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| serde_json::from_value::<EmailSummary>(item.clone()))
                .collect::<Result<Vec<_>, _>>()
                .map(ReplyPayload::Results)
                .unwrap_or_else(|e| {
                    log::debug!("normalize: response list entry is not an email: {}", e);
                    ReplyPayload::Unrecognized
                }),
            _ => ReplyPayload::Unrecognized,
        }
    }

    pub fn render(&self) -> String {
        match self {
            ReplyPayload::ApplicationError(err) => format!("{}{}", ERROR_PREFIX, err),
            ReplyPayload::Results(emails) if emails.is_empty() => NO_RESULTS_MESSAGE.to_string(),
            ReplyPayload::Results(emails) => emails
                .iter()
                .map(EmailSummary::render)
                .collect::<Vec<_>>()
                .join("\n\n"),
            ReplyPayload::Text(text) => text.clone(),
            ReplyPayload::Unrecognized => UNEXPECTED_FORMAT_MESSAGE.to_string(),
        }
    }
}

/// `error` counts when it is set to something other than null, false, 0 or "".
/// Non-string values are shown as their JSON text.
fn error_text(v: &Value) -> Option<String> {
    match v {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Display text for a decoded reply. Never fails.
pub fn normalize(raw: &Value) -> String {
    ReplyPayload::decode(raw).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn single_email_block() {
        let raw = json!({"response": [{"subject": "Sync", "from": "a@b.com", "snippet": "10am"}]});
        assert_eq!(normalize(&raw), "📧 *Sync*\nFrom: a@b.com\n10am");
    }

    #[test]
    fn emails_keep_order_and_blank_line_separator() {
        let raw = json!({"response": [
            {"subject": "First", "from": "x@y.z", "snippet": "one"},
            {"subject": "Second", "from": "p@q.r", "snippet": "two"},
        ]});
        assert_eq!(
            normalize(&raw),
            "📧 *First*\nFrom: x@y.z\none\n\n📧 *Second*\nFrom: p@q.r\ntwo"
        );
    }

    #[test]
    fn empty_list_is_no_results() {
        assert_eq!(normalize(&json!({"response": []})), NO_RESULTS_MESSAGE);
    }

    #[test]
    fn text_response_is_verbatim() {
        assert_eq!(normalize(&json!({"response": "Hi there"})), "Hi there");
        assert_eq!(
            normalize(&json!({"response": "<b>*raw*</b>\n\ttext"})),
            "<b>*raw*</b>\n\ttext"
        );
        assert_eq!(normalize(&json!({"response": ""})), "");
    }

    #[test]
    fn error_field_wins_over_response() {
        assert_eq!(
            normalize(&json!({"error": "No JSON data received"})),
            "⚠️ Error: No JSON data received"
        );
        assert_eq!(
            normalize(&json!({"error": "boom", "response": "Hi there"})),
            "⚠️ Error: boom"
        );
        assert_eq!(
            normalize(&json!({"error": "boom", "response": []})),
            "⚠️ Error: boom"
        );
    }

    #[test]
    fn empty_or_falsy_error_is_ignored() {
        assert_eq!(normalize(&json!({"error": "", "response": "ok"})), "ok");
        assert_eq!(normalize(&json!({"error": null, "response": "ok"})), "ok");
        assert_eq!(normalize(&json!({"error": false, "response": "ok"})), "ok");
        assert_eq!(normalize(&json!({"error": 0, "response": "ok"})), "ok");
    }

    #[test]
    fn non_string_error_is_shown_as_json() {
        assert_eq!(
            normalize(&json!({"error": {"code": 7}})),
            "⚠️ Error: {\"code\":7}"
        );
        assert_eq!(normalize(&json!({"error": 42})), "⚠️ Error: 42");
    }

    #[test]
    fn unexpected_shapes() {
        for raw in [
            json!({}),
            json!({"status": "running"}),
            json!({"response": 12}),
            json!({"response": null}),
            json!({"response": {"subject": "not a list"}}),
            json!({"response": ["plain string entry"]}),
            json!([1, 2, 3]),
            json!("just a string"),
            json!(null),
        ] {
            assert_eq!(normalize(&raw), UNEXPECTED_FORMAT_MESSAGE, "payload {}", raw);
        }
    }

    #[test]
    fn missing_email_fields_render_empty() {
        let raw = json!({"response": [{"subject": "Only subject"}]});
        assert_eq!(normalize(&raw), "📧 *Only subject*\nFrom: \n");
    }

    #[test]
    fn decode_tags_each_shape() {
        assert_eq!(
            ReplyPayload::decode(&json!({"response": "t"})),
            ReplyPayload::Text("t".to_string())
        );
        assert_eq!(
            ReplyPayload::decode(&json!({"response": []})),
            ReplyPayload::Results(Vec::new())
        );
        assert_eq!(
            ReplyPayload::decode(&json!({"error": "e"})),
            ReplyPayload::ApplicationError("e".to_string())
        );
        assert_eq!(ReplyPayload::decode(&json!({})), ReplyPayload::Unrecognized);
    }

    fn arb_email() -> impl Strategy<Value = EmailSummary> {
        (
            "[a-zA-Z0-9 _.!?,]{0,40}",
            "[a-z0-9.]{1,12}@[a-z]{1,8}\\.com",
            "[a-zA-Z0-9 _.!?,\n]{0,80}",
        )
            .prop_map(|(subject, from, snippet)| EmailSummary {
                subject,
                from,
                snippet,
            })
    }

    proptest! {
        #[test]
        fn text_reply_round_trips_verbatim(text in any::<String>()) {
            prop_assert_eq!(normalize(&json!({"response": text.clone()})), text);
        }

        #[test]
        fn non_empty_error_always_wins(err in ".{1,60}", text in any::<String>()) {
            let raw = json!({"error": err.clone(), "response": text});
            prop_assert_eq!(normalize(&raw), format!("{}{}", ERROR_PREFIX, err));
        }

        #[test]
        fn email_list_renders_one_block_per_entry(
            emails in proptest::collection::vec(arb_email(), 1..8)
        ) {
            let raw = json!({"response": serde_json::to_value(&emails).unwrap()});
            let expected = emails
                .iter()
                .map(|e| format!("📧 *{}*\nFrom: {}\n{}", e.subject, e.from, e.snippet))
                .collect::<Vec<_>>()
                .join("\n\n");
            prop_assert_eq!(normalize(&raw), expected);
        }

        #[test]
        fn non_text_non_list_response_is_unexpected(n in any::<i64>(), b in any::<bool>()) {
            prop_assert_eq!(normalize(&json!({"response": n})), UNEXPECTED_FORMAT_MESSAGE);
            prop_assert_eq!(normalize(&json!({"response": b})), UNEXPECTED_FORMAT_MESSAGE);
        }

        #[test]
        fn normalize_is_deterministic(text in any::<String>()) {
            let raw = json!({"response": text});
            prop_assert_eq!(normalize(&raw), normalize(&raw));
        }
    }
}
