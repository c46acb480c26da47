//! Call-control markup for the telephony platform.

use std::fmt::Write as _;

use quick_xml::escape::escape;

use crate::menu::MenuNode;
use crate::settings::VoiceSettings;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred. Please try again later.";
pub const DEFAULT_HANGUP_MESSAGE: &str = "Thank you for calling. Goodbye.";
pub const NO_INPUT_MESSAGE: &str = "We didn't receive any input. Please try again.";

/// Turns navigation results into markup text. Implementations are pure and
/// never fail for a well-formed node.
pub trait MarkupRenderer: Send + Sync {
    fn render(&self, node: &MenuNode, action_target: &str) -> String;

    fn render_error(&self, message: &str) -> String;

    fn render_hangup(&self, message: &str) -> String;
}

/// LaML / TwiML compatible renderer.
#[derive(Debug, Clone)]
pub struct LamlRenderer {
    voice: String,
    language: String,
    gather_timeout_secs: u32,
}

impl Default for LamlRenderer {
    fn default() -> Self {
        Self::from_settings(&VoiceSettings::default())
    }
}

impl LamlRenderer {
    pub fn from_settings(settings: &VoiceSettings) -> Self {
        Self {
            voice: settings.voice.clone(),
            language: settings.language.clone(),
            gather_timeout_secs: settings.gather_timeout_secs,
        }
    }

    fn say(&self, out: &mut String, text: &str) {
        let _ = write!(
            out,
            r#"<Say voice="{}" language="{}">{}</Say>"#,
            escape(self.voice.as_str()),
            escape(self.language.as_str()),
            escape(text),
        );
    }

    fn say_then_hangup(&self, message: &str, fallback: &str) -> String {
        let text = if message.trim().is_empty() {
            fallback
        } else {
            message
        };

        let mut out = String::from(XML_DECLARATION);
        out.push_str("<Response>");
        self.say(&mut out, text);
        out.push_str("<Hangup/></Response>");
        out
    }
}

impl MarkupRenderer for LamlRenderer {
    fn render(&self, node: &MenuNode, action_target: &str) -> String {
        let action = escape(action_target);
        let mut out = String::from(XML_DECLARATION);
        out.push_str("<Response>");
        let _ = write!(
            out,
            r#"<Gather input="dtmf" action="{}" method="POST" numDigits="1" timeout="{}">"#,
            action, self.gather_timeout_secs,
        );
        self.say(&mut out, &node.prompt);
        out.push_str("</Gather>");
        // Reached only when the gather times out without digits.
        self.say(&mut out, NO_INPUT_MESSAGE);
        let _ = write!(out, r#"<Redirect method="POST">{}</Redirect>"#, action);
        out.push_str("</Response>");
        out
    }

    fn render_error(&self, message: &str) -> String {
        self.say_then_hangup(message, DEFAULT_ERROR_MESSAGE)
    }

    fn render_hangup(&self, message: &str) -> String {
        self.say_then_hangup(message, DEFAULT_HANGUP_MESSAGE)
    }
}
