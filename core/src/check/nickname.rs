//! Nickname-pattern check

use crate::check::{CheckDescriptor, CheckMode};
use crate::config::NicknameCheckSettings;
use crate::error::{GuardError, Result};
use crate::user::ConnectingUser;
use regex::Regex;

/// Rejects nicknames matching the configured expression. The expression is
/// compiled once at configuration load; a malformed pattern aborts startup
/// instead of silently disabling the check.
pub struct NicknameCheck {
    descriptor: CheckDescriptor,
    mode: CheckMode,
    message: String,
    expression: Regex,
}

impl NicknameCheck {
    pub fn from_settings(settings: &NicknameCheckSettings, message: String) -> Result<Self> {
        let expression = Regex::new(&settings.expression).map_err(|e| {
            GuardError::Config(format!("invalid nickname-check expression: {e}"))
        })?;
        Ok(Self {
            descriptor: CheckDescriptor::new("nickname", settings.priority),
            mode: settings.check_mode,
            message,
            expression,
        })
    }

    pub fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_detected(&self, user: &ConnectingUser, under_attack: bool) -> bool {
        self.mode
            .evaluate(under_attack, self.expression.is_match(&user.nickname))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check() -> NicknameCheck {
        let settings = NicknameCheckSettings::default();
        NicknameCheck::from_settings(&settings, "nickname".to_string()).unwrap()
    }

    #[test]
    fn default_expression_catches_bot_names() {
        let check = check();
        assert!(check.is_detected(&ConnectingUser::new("203.0.113.5", "Bot_4821"), false));
        assert!(check.is_detected(&ConnectingUser::new("203.0.113.5", "mcdown_user"), false));
        assert!(!check.is_detected(&ConnectingUser::new("203.0.113.5", "Steve"), false));
    }

    #[test]
    fn malformed_expression_is_a_config_error() {
        let settings = NicknameCheckSettings {
            expression: "(oops".to_string(),
            ..NicknameCheckSettings::default()
        };
        assert!(NicknameCheck::from_settings(&settings, String::new()).is_err());
    }
}
