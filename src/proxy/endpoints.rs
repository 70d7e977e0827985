use reqwest::Method;

/// How a 200 from upstream is relayed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessBody {
    /// Upstream text, verbatim, after a confirmation line.
    Raw { prefix: &'static str },
    /// Upstream body parsed as JSON and re-serialised.
    Json,
}

/// One Apollo.io operation this proxy exposes.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Metric and log label.
    pub name: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub success: SuccessBody,
    /// Message returned when upstream answers with anything but 200.
    pub failure_message: &'static str,
}

pub const CREATE_CONTACT: Endpoint = Endpoint {
    name: "contacts",
    method: Method::POST,
    path: "/v1/contacts",
    success: SuccessBody::Raw {
        prefix: "New Contact has been created successfully!",
    },
    failure_message: "Failed to create contact",
};

pub const CONTACT_STAGES: Endpoint = Endpoint {
    name: "contact_stages",
    method: Method::GET,
    path: "/v1/contact_stages",
    success: SuccessBody::Json,
    failure_message: "Failed to get contact",
};

pub const EMAIL_ACCOUNTS: Endpoint = Endpoint {
    name: "email_accounts",
    method: Method::GET,
    path: "/v1/email_accounts",
    success: SuccessBody::Json,
    failure_message: "Failed to get emails",
};

pub const CREATE_ACCOUNT: Endpoint = Endpoint {
    name: "accounts",
    method: Method::POST,
    path: "/v1/accounts",
    success: SuccessBody::Json,
    failure_message: "Failed to create an account",
};

impl Endpoint {
    /// Whether the caller's JSON body is sent along.
    pub fn sends_body(&self) -> bool {
        self.method == Method::POST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_posts_send_bodies() {
        assert!(CREATE_CONTACT.sends_body());
        assert!(CREATE_ACCOUNT.sends_body());
        assert!(!CONTACT_STAGES.sends_body());
        assert!(!EMAIL_ACCOUNTS.sends_body());
    }

    #[test]
    fn test_paths_are_versioned() {
        for ep in [&CREATE_CONTACT, &CONTACT_STAGES, &EMAIL_ACCOUNTS, &CREATE_ACCOUNT] {
            assert!(ep.path.starts_with("/v1/"), "{}", ep.name);
        }
    }
}
