use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_CAPTION: &str = "Would you rather?";
pub const EMAIL_ATTRIBUTE: &str = "email";
pub const ZIPNUM_ATTRIBUTE: &str = "custom:zipnum";
pub const QUESTIONS_REMAINING_ATTRIBUTE: &str = "custom:qs_remain";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollRecord {
    pub create_date: Option<DateTime<FixedOffset>>,
    pub post_id: String,
    pub is_user_generated: bool,
    pub is_sponsored: bool,
    pub sponsor_id: String,
    pub caption: String,
    pub option1: String,
    pub option2: String,
    pub total_responses: u64,
    pub response_count1: u64,
    pub percent1: f64,
    pub response_count2: u64,
    pub percent2: f64,
    pub count_view: u64,
    pub count_like: u64,
    pub count_comment: u64,
    pub count_bookmark: u64,
    pub count_skip: u64,
}

impl PollRecord {
    // Counts arrive as numbers or numeric strings, flags as booleans or 0/1.
    pub fn from_value(raw: &Value) -> Self {
        let caption = text(raw, "caption");
        Self {
            create_date: DateTime::parse_from_rfc3339(&text(raw, "create_date")).ok(),
            post_id: text(raw, "post_id"),
            is_user_generated: flag(raw, "is_user_generated"),
            is_sponsored: flag(raw, "is_sponsored"),
            sponsor_id: text(raw, "sponsor_id"),
            caption: if caption.is_empty() { DEFAULT_CAPTION.to_string() } else { caption },
            option1: text(raw, "option1"),
            option2: text(raw, "option2"),
            total_responses: count(raw, "total_responses"),
            response_count1: count(raw, "resp_option1"),
            percent1: ratio(raw, "pct_option1"),
            response_count2: count(raw, "resp_option2"),
            percent2: ratio(raw, "pct_option2"),
            count_view: count(raw, "count_view"),
            count_like: count(raw, "count_like"),
            count_comment: count(raw, "count_comment"),
            count_bookmark: count(raw, "count_bookmark"),
            count_skip: count(raw, "count_skip"),
        }
    }

    pub fn total_count(&self) -> u64 {
        self.response_count1 + self.response_count2
    }

    pub fn field_values(&self) -> Vec<String> {
        vec![
            self.create_date
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, false))
                .unwrap_or_default(),
            self.post_id.clone(),
            self.is_user_generated.to_string(),
            self.is_sponsored.to_string(),
            self.sponsor_id.clone(),
            self.caption.clone(),
            self.option1.clone(),
            self.option2.clone(),
            self.total_responses.to_string(),
            self.response_count1.to_string(),
            self.percent1.to_string(),
            self.response_count2.to_string(),
            self.percent2.to_string(),
            self.count_view.to_string(),
            self.count_like.to_string(),
            self.count_comment.to_string(),
            self.count_bookmark.to_string(),
            self.count_skip.to_string(),
        ]
    }
}

pub fn percent_label(ratio: f64) -> String {
    format!("{}%", fixed(ratio * 100.0, 0))
}

// Ties round away from zero (0.125 -> "0.13"). `{:.2}` alone rounds them to even.
pub fn fixed(value: f64, digits: u32) -> String {
    let scale = 10f64.powi(digits as i32);
    let rounded = (value * scale).round() / scale;
    format!("{:.*}", digits as usize, rounded)
}

fn text(raw: &Value, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn count(raw: &Value, key: &str) -> u64 {
    match raw.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => leading_integer(s),
        _ => 0,
    }
}

// Mirrors integer parsing of the lookup table's text columns: "357", "357 ", "12.0".
fn leading_integer(s: &str) -> u64 {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

fn ratio(raw: &Value, key: &str) -> f64 {
    match raw.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn flag(raw: &Value, key: &str) -> bool {
    match raw.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        _ => false,
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallerContext {
    pub groups: BTreeSet<String>,
    pub attributes: HashMap<String, String>,
    pub remaining_questions: Option<u32>,
}

impl CallerContext {
    pub fn new(groups: impl IntoIterator<Item = String>, attributes: HashMap<String, String>) -> Self {
        let remaining_questions = attributes
            .get(QUESTIONS_REMAINING_ATTRIBUTE)
            .and_then(|v| v.trim().parse().ok());
        Self {
            groups: groups.into_iter().filter(|g| !g.is_empty()).collect(),
            attributes,
            remaining_questions,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.attributes.get(EMAIL_ATTRIBUTE).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    NotStarted,
    Loading,
    Loaded,
    Failed,
}

impl FetchState {
    pub fn can_start(self) -> bool {
        matches!(self, FetchState::NotStarted | FetchState::Failed)
    }
}

#[cfg(test)]
pub(crate) fn sample_poll(post_id: &str, sponsor_id: &str) -> PollRecord {
    PollRecord::from_value(&serde_json::json!({
        "post_id": post_id,
        "sponsor_id": sponsor_id,
        "caption": format!("Question {}", post_id),
        "option1": "Yes",
        "option2": "No",
        "resp_option1": "60",
        "resp_option2": "40",
        "pct_option1": "0.6",
        "pct_option2": "0.4",
    }))
}
