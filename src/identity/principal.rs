use serde::{Deserialize, Serialize};

/// Client context carried on a token: locale, timezone and a free-form
/// client-info string supplied by the frontend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Details {
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub client_info: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    /// Granted authorities (roles/permissions) presented to authorization checks.
    #[serde(default)]
    pub authorities: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
    /// True when this principal is backed by a persisted record; drives the
    /// reload extension point on activation.
    #[serde(default)]
    pub persisted: bool,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

fn default_true() -> bool { true }

impl Principal {
    pub fn named<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            authorities: Vec::new(),
            enabled: true,
            locked: false,
            persisted: false,
            locale: None,
            timezone: None,
        }
    }

    pub fn with_authorities<I, S>(mut self, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authorities = authorities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_display_name<S: Into<String>>(mut self, display_name: S) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }
}
