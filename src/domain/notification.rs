//! Operator notifications: app lifecycle pushes, lead and receipt emails.

use serde::{Deserialize, Serialize};

use super::foundation::{decode, Document, ValidationError};
use super::payment::format_amount;
use super::trigger::AnalyticsEvent;

pub const POTENTIAL_LEADS: &str = "potential_leads";

/// Two-line push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
}

/// Analytics events the operator is notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLifecycle {
    Installed,
    Removed,
}

impl AppLifecycle {
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "first_open" => Some(AppLifecycle::Installed),
            "app_remove" => Some(AppLifecycle::Removed),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AppLifecycle::Installed => "You have a new user \u{1F643}",
            AppLifecycle::Removed => "You lost a user \u{1F61E}",
        }
    }
}

/// Push message for `event`, or `None` for events nobody is notified about.
pub fn lifecycle_message(event: &AnalyticsEvent) -> Option<PushMessage> {
    let lifecycle = AppLifecycle::from_event_name(&event.name)?;
    let user = &event.user;
    Some(PushMessage {
        title: lifecycle.title().to_string(),
        body: format!(
            "{} from {}, {}",
            user.device_info.mobile_model_name, user.geo_info.city, user.geo_info.country
        ),
    })
}

/// Plain-text email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Lead submitted through the public interest form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl Lead {
    pub fn from_document(doc: &Document) -> Result<Self, ValidationError> {
        let lead: Lead = decode("potential lead", doc)?;
        if lead.name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if !lead.email.contains('@') {
            return Err(ValidationError::invalid_format("email", "missing @"));
        }
        Ok(lead)
    }

    pub fn operator_email(&self, from: &str, operator: &str) -> OutgoingEmail {
        let mut body = format!("Name: {}\nEmail: {}\n", self.name, self.email);
        if let Some(message) = self.message.as_deref().filter(|m| !m.trim().is_empty()) {
            body.push_str(&format!("\n{}\n", message));
        }
        OutgoingEmail {
            from: from.to_string(),
            to: operator.to_string(),
            subject: format!("New potential lead: {}", self.name),
            body,
        }
    }
}

/// Receipt sent to the customer once a payment succeeds.
pub fn receipt_email(
    from: &str,
    to: &str,
    intent_id: &str,
    amount: i64,
    currency: &str,
) -> OutgoingEmail {
    OutgoingEmail {
        from: from.to_string(),
        to: to.to_string(),
        subject: "Your Lidora receipt".to_string(),
        body: format!(
            "Thanks for your order!\n\nAmount charged: {}\nPayment reference: {}\n",
            format_amount(amount, currency),
            intent_id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trigger::{AnalyticsUser, DeviceInfo, GeoInfo};
    use serde_json::json;

    fn event(name: &str) -> AnalyticsEvent {
        AnalyticsEvent {
            name: name.to_string(),
            user: AnalyticsUser {
                device_info: DeviceInfo {
                    mobile_model_name: "Pixel 7".into(),
                },
                geo_info: GeoInfo {
                    city: "Lisbon".into(),
                    country: "Portugal".into(),
                },
            },
        }
    }

    #[test]
    fn first_open_announces_new_user() {
        let message = lifecycle_message(&event("first_open")).unwrap();
        assert_eq!(message.title, "You have a new user 🙃");
        assert_eq!(message.body, "Pixel 7 from Lisbon, Portugal");
    }

    #[test]
    fn app_remove_announces_lost_user() {
        let message = lifecycle_message(&event("app_remove")).unwrap();
        assert_eq!(message.title, "You lost a user 😞");
    }

    #[test]
    fn other_events_are_not_announced() {
        assert!(lifecycle_message(&event("screen_view")).is_none());
    }

    #[test]
    fn lead_email_lists_contact_details() {
        let doc = json!({"name": "Sam", "email": "sam@example.com", "message": "Catering?"});
        let lead = Lead::from_document(doc.as_object().unwrap()).unwrap();
        let email = lead.operator_email("noreply@lidora.app", "ops@lidora.app");
        assert_eq!(email.to, "ops@lidora.app");
        assert_eq!(email.subject, "New potential lead: Sam");
        assert!(email.body.contains("sam@example.com"));
        assert!(email.body.contains("Catering?"));
    }

    #[test]
    fn lead_requires_plausible_email() {
        let doc = json!({"name": "Sam", "email": "nope"});
        assert!(Lead::from_document(doc.as_object().unwrap()).is_err());
    }

    #[test]
    fn receipt_shows_major_units() {
        let email = receipt_email("from@x.com", "a@x.com", "pi_1", 1200, "usd");
        assert!(email.body.contains("12.00 USD"));
        assert!(email.body.contains("pi_1"));
    }
}
