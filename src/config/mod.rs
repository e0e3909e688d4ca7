use log::warn;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::models::{EMAIL_ATTRIBUTE, QUESTIONS_REMAINING_ATTRIBUTE, ZIPNUM_ATTRIBUTE};

pub const DEFAULT_POLL_API_URL: &str = "https://0odsntgafl.execute-api.ap-southeast-1.amazonaws.com/Prod/codalookup";
pub const DEFAULT_REPORT_API_URL: &str = "https://8ho3c3e0ne.execute-api.ap-southeast-1.amazonaws.com/Prod/instructai";
pub const DEFAULT_CHART_WIDTH: f64 = 600.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub poll_api_url: String,
    pub report_api_url: String,
    pub report_api_token: Option<String>,
    pub user_email: String,
    pub user_password: Option<String>,
    pub user_groups: Vec<String>,
    pub zipnum: Option<String>,
    pub questions_remaining: Option<String>,
    pub chart_width: f64,
    pub search: Option<String>,
    pub select: Option<String>,
    pub generate_report: bool,
    pub chat: bool,
    pub chart_output: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let chart_width = match get("CHART_WIDTH") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Invalid CHART_WIDTH {:?}, using {}", raw, DEFAULT_CHART_WIDTH);
                DEFAULT_CHART_WIDTH
            }),
            None => DEFAULT_CHART_WIDTH,
        };

        Self {
            poll_api_url: get("POLL_API_URL").unwrap_or_else(|| DEFAULT_POLL_API_URL.to_string()),
            report_api_url: get("REPORT_API_URL").unwrap_or_else(|| DEFAULT_REPORT_API_URL.to_string()),
            report_api_token: get("REPORT_API_TOKEN"),
            user_email: get("DASHBOARD_USER_EMAIL").unwrap_or_default(),
            user_password: get("DASHBOARD_USER_PASSWORD"),
            user_groups: get("DASHBOARD_USER_GROUPS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|g| !g.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            zipnum: get("DASHBOARD_ZIPNUM"),
            questions_remaining: get("DASHBOARD_QS_REMAIN"),
            chart_width,
            search: get("DASHBOARD_SEARCH"),
            select: get("DASHBOARD_SELECT"),
            generate_report: get("DASHBOARD_REPORT").is_some_and(|v| is_truthy(&v)),
            chat: get("DASHBOARD_CHAT").is_some_and(|v| is_truthy(&v)),
            chart_output: get("CHART_OUTPUT").map(PathBuf::from),
        }
    }

    pub fn user_attributes(&self) -> HashMap<String, String> {
        let mut attributes = HashMap::new();
        if !self.user_email.is_empty() {
            attributes.insert(EMAIL_ATTRIBUTE.to_string(), self.user_email.clone());
        }
        if let Some(zipnum) = &self.zipnum {
            attributes.insert(ZIPNUM_ATTRIBUTE.to_string(), zipnum.clone());
        }
        if let Some(remaining) = &self.questions_remaining {
            attributes.insert(QUESTIONS_REMAINING_ATTRIBUTE.to_string(), remaining.clone());
        }
        attributes
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.poll_api_url, DEFAULT_POLL_API_URL);
        assert_eq!(config.report_api_url, DEFAULT_REPORT_API_URL);
        assert_eq!(config.report_api_token, None);
        assert_eq!(config.user_password, None);
        assert_eq!(config.chart_width, 600.0);
        assert!(config.user_groups.is_empty());
        assert!(!config.generate_report);
        assert!(!config.chat);
        assert!(config.user_attributes().is_empty());
    }

    #[test]
    fn test_groups_and_attributes() {
        let config = config(&[
            ("DASHBOARD_USER_GROUPS", " acme, ,globex "),
            ("DASHBOARD_USER_EMAIL", "a@b.com"),
            ("DASHBOARD_QS_REMAIN", "4"),
            ("DASHBOARD_REPORT", "TRUE"),
            ("REPORT_API_TOKEN", ""),
            ("DASHBOARD_CHAT", "yes"),
        ]);
        assert_eq!(config.user_groups, vec!["acme", "globex"]);
        assert_eq!(config.report_api_token, None);
        assert!(config.generate_report);
        assert!(config.chat);

        let attributes = config.user_attributes();
        assert_eq!(attributes[EMAIL_ATTRIBUTE], "a@b.com");
        assert_eq!(attributes[QUESTIONS_REMAINING_ATTRIBUTE], "4");
        assert!(!attributes.contains_key(ZIPNUM_ATTRIBUTE));
    }

    #[test]
    fn test_invalid_width_falls_back() {
        assert_eq!(config(&[("CHART_WIDTH", "wide")]).chart_width, DEFAULT_CHART_WIDTH);
        assert_eq!(config(&[("CHART_WIDTH", "320")]).chart_width, 320.0);
    }
}
