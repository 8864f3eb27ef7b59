//! WhatsApp patient messaging.

use serde_json::json;
use tracing::{info, warn};

use dental_core::messaging::Messenger;
use dental_core::patients::normalize_phone;

use crate::config::{env_lookup, Lookup, MessagingConfig};

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v18.0";

/// Message body sent to a patient.
pub fn format_message(patient_name: &str, link: &str) -> String {
    format!(
        "Hello {}, thank you for visiting our clinic today. \
         Your visit details and next steps are available here: {}",
        patient_name.trim(),
        link
    )
}

/// International number for a canonical phone, e.g. `919876543210`.
pub fn international_number(phone: &str, country_code: &str) -> Option<String> {
    normalize_phone(phone).map(|local| format!("{}{}", country_code, local))
}

/// Click-to-chat link that opens WhatsApp with the message prefilled.
pub fn click_to_chat_link(international: &str, message: &str) -> String {
    format!("https://wa.me/{}?text={}", international, percent_encode(message))
}

/// Percent-encode everything outside the URL unreserved set.
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// JSON body of a Cloud API text message.
pub fn message_payload(international: &str, body: &str) -> serde_json::Value {
    json!({
        "messaging_product": "whatsapp",
        "to": international,
        "type": "text",
        "text": { "preview_url": true, "body": body },
    })
}

pub struct WhatsAppMessenger {
    lookup: Lookup,
}

impl WhatsAppMessenger {
    pub fn from_env() -> Self {
        Self { lookup: env_lookup() }
    }

    pub fn with_lookup(lookup: Lookup) -> Self {
        Self { lookup }
    }
}

impl Messenger for WhatsAppMessenger {
    fn send(&self, phone: &str, patient_name: &str, link: &str) -> bool {
        let config = MessagingConfig::from_lookup(self.lookup.as_ref());

        let Some(to) = international_number(phone, &config.country_code) else {
            warn!(phone, "message not sent, invalid phone number");
            return false;
        };
        let Some((token, phone_number_id)) = config.credentials() else {
            warn!(
                link = %click_to_chat_link(&to, &format_message(patient_name, link)),
                "message not sent, WhatsApp credentials not configured"
            );
            return false;
        };

        let url = format!("{}/{}/messages", GRAPH_API_BASE, phone_number_id);
        let payload = message_payload(&to, &format_message(patient_name, link));
        match transport::post_json(&url, token, &payload) {
            Ok(()) => {
                info!(to = %to, "patient message sent");
                true
            }
            Err(e) => {
                warn!(to = %to, error = %format!("{:#}", e), "patient message failed");
                false
            }
        }
    }
}

#[cfg(feature = "http")]
mod transport {
    use anyhow::{bail, Context, Result};
    use reqwest::blocking::Client;

    pub fn post_json(url: &str, token: &str, payload: &serde_json::Value) -> Result<()> {
        let response = Client::new()
            .post(url)
            .bearer_auth(token)
            .json(payload)
            .send()
            .context("message request failed")?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!("message rejected with {}: {}", status, body);
        }
        Ok(())
    }
}

#[cfg(not(feature = "http"))]
mod transport {
    use anyhow::{bail, Result};

    pub fn post_json(_url: &str, _token: &str, _payload: &serde_json::Value) -> Result<()> {
        bail!("built without the `http` feature")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{lookup_from, WHATSAPP_PHONE_ID_VAR, WHATSAPP_TOKEN_VAR};
    use proptest::prelude::*;

    #[test]
    fn test_international_number() {
        assert_eq!(international_number("098765 43210", "91").as_deref(), Some("919876543210"));
        assert_eq!(international_number("12345", "91"), None);
    }

    #[test]
    fn test_click_to_chat_link() {
        let link = click_to_chat_link("919876543210", "Hi Asha & co");
        assert_eq!(link, "https://wa.me/919876543210?text=Hi%20Asha%20%26%20co");
    }

    #[test]
    fn test_message_mentions_name_and_link() {
        let message = format_message(" Asha Rao ", "https://clinic.example/v/1");
        assert!(message.starts_with("Hello Asha Rao,"));
        assert!(message.ends_with("https://clinic.example/v/1"));

        let payload = message_payload("919876543210", &message);
        assert_eq!(payload["to"], "919876543210");
        assert_eq!(payload["type"], "text");
    }

    #[test]
    fn test_send_without_credentials_returns_false() {
        let messenger = WhatsAppMessenger::with_lookup(lookup_from(&[]));
        assert!(!messenger.send("9876543210", "Asha Rao", "https://x"));
    }

    #[test]
    fn test_send_invalid_phone_returns_false() {
        let messenger = WhatsAppMessenger::with_lookup(lookup_from(&[
            (WHATSAPP_TOKEN_VAR, "token"),
            (WHATSAPP_PHONE_ID_VAR, "123"),
        ]));
        assert!(!messenger.send("12", "Asha Rao", "https://x"));
    }

    proptest! {
        #[test]
        fn prop_encoded_text_is_url_safe(text in ".{0,64}") {
            let encoded = percent_encode(&text);
            prop_assert!(encoded
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"-_.~%".contains(&b)));
        }
    }
}
