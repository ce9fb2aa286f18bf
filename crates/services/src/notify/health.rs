use serde::Serialize;
use traino_config::SmsSettings;

use super::sms::is_e164;

/// Startup report on carrier configuration. Issues mean SMS cannot work;
/// warnings flag present-but-suspect values. Never fatal: the service runs
/// email-only when SMS is unusable.
#[derive(Debug, Clone, Serialize)]
pub struct SmsConfigReport {
    pub is_configured: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn check_sms_configuration(settings: &SmsSettings) -> SmsConfigReport {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    let account_sid = settings.account_sid.as_deref().unwrap_or("");
    let auth_token = settings.auth_token.as_deref().unwrap_or("");
    let from_number = settings.from_number.as_deref().unwrap_or("");

    if account_sid.is_empty() {
        issues.push("sms.account_sid is not set".to_string());
    } else if !account_sid.starts_with("AC") {
        warnings.push(format!(
            "sms.account_sid \"{account_sid}\" does not start with \"AC\""
        ));
    }

    if auth_token.is_empty() {
        issues.push("sms.auth_token is not set".to_string());
    }

    if from_number.is_empty() {
        issues.push("sms.from_number is not set".to_string());
    } else if !is_e164(from_number) {
        warnings.push(format!(
            "sms.from_number \"{from_number}\" is not an E.164 phone number"
        ));
    }

    SmsConfigReport {
        is_configured: issues.is_empty(),
        issues,
        warnings,
    }
}
