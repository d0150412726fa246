//! Message templates

use common::Email;

/// Which template a message was rendered from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Matched { partner: Email },
    NoMatch,
}

/// A rendered plain-text message for one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: Email,
    pub to_name: String,
    pub subject: String,
    pub body: String,
    pub kind: MessageKind,
}

/// Renders messages signed with the carousel's name
#[derive(Debug, Clone)]
pub struct Templates {
    signature: String,
    subject: String,
}

impl Templates {
    pub fn new(signature: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            subject: subject.into(),
        }
    }

    pub fn from_config(config: &config::CarouselConfig) -> Self {
        Self::new(
            config.carousel.name.clone(),
            config.notifications.subject.clone(),
        )
    }

    /// Tell `to` who their partner is and how to reach them
    pub fn matched(&self, to: &Email, to_name: &str, partner: &Email, partner_name: &str) -> Message {
        let body = format!(
            "Hi {},\n\n\
             You have been matched with {} for this week's coffee carousel.\n\n\
             Drop them a line at {} to sort something out.\n\n\
             Till next time,\n\n\
             {}\n",
            greeting_name(to_name),
            partner_name,
            partner,
            self.signature
        );

        Message {
            to: to.clone(),
            to_name: to_name.to_string(),
            subject: self.subject.clone(),
            body,
            kind: MessageKind::Matched {
                partner: partner.clone(),
            },
        }
    }

    /// Tell `to` that no partner was available this run
    pub fn no_match(&self, to: &Email, to_name: &str) -> Message {
        let body = format!(
            "Hi {},\n\n\
             There was nobody left to pair you with this week, sorry!\n\n\
             You are still subscribed and will be first in line next time.\n\n\
             Till next time,\n\n\
             {}\n",
            greeting_name(to_name),
            self.signature
        );

        Message {
            to: to.clone(),
            to_name: to_name.to_string(),
            subject: self.subject.clone(),
            body,
            kind: MessageKind::NoMatch,
        }
    }
}

fn greeting_name(name: &str) -> &str {
    let name = name.trim();
    if name.is_empty() {
        "there"
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> Templates {
        Templates::new("The Union St Coffee Carousel", "Coffee Time")
    }

    #[test]
    fn test_matched_mentions_partner() {
        let msg = templates().matched(
            &Email::new("ann@x.com"),
            "Ann",
            &Email::new("bob@x.com"),
            "Bob",
        );

        assert_eq!(msg.to.as_str(), "ann@x.com");
        assert_eq!(msg.subject, "Coffee Time");
        assert!(msg.body.starts_with("Hi Ann,"));
        assert!(msg.body.contains("matched with Bob"));
        assert!(msg.body.contains("bob@x.com"));
        assert!(msg.body.trim_end().ends_with("The Union St Coffee Carousel"));
        assert_eq!(
            msg.kind,
            MessageKind::Matched {
                partner: Email::new("bob@x.com")
            }
        );
    }

    #[test]
    fn test_no_match() {
        let msg = templates().no_match(&Email::new("cat@x.com"), "  ");
        assert!(msg.body.starts_with("Hi there,"));
        assert!(msg.body.contains("nobody left"));
        assert_eq!(msg.kind, MessageKind::NoMatch);
    }
}
