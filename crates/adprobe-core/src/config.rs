//! Configuration for the directory probe.
//!
//! Only the target host comes from the environment. Everything else is fixed: port 389,
//! Negotiate authentication, LDAP v3, no referral chasing and a 500 entry user cap.

use crate::Error;
use tracing::debug;
use url::Url;
use validator::Validate;

/// Environment variable naming the LDAP host.
pub const HOST_ENV_VAR: &str = "AD_LDAP_HOST";
/// Host used when [`HOST_ENV_VAR`] is unset. Obviously not a real host name.
pub const PLACEHOLDER_HOST: &str = "CHANGE_THIS_TO_YOUR_AD_LDAP_HOST";
/// Plain LDAP port.
pub const LDAP_PORT: u16 = 389;
/// Server-side cap on the number of user entries requested.
pub const USER_SIZE_LIMIT: i32 = 500;
/// The only protocol version spoken.
pub const LDAP_PROTOCOL_VERSION: u8 = 3;

/// Authentication mechanism used for the bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMechanism {
    /// SASL GSSAPI using the caller's ambient Kerberos credential cache.
    #[default]
    Negotiate,
}

impl std::fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMechanism::Negotiate => write!(f, "Negotiate (Kerberos/GSSAPI)"),
        }
    }
}

/// Connection parameters for a probe run.
///
/// Constructed once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct ProbeConfig {
    /// LDAP server host name
    #[validate(length(min = 1))]
    pub host: String,

    /// Bind mechanism
    pub auth: AuthMechanism,
}

impl ProbeConfig {
    /// Creates a configuration for the given host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            auth: AuthMechanism::default(),
        }
    }

    /// Loads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// The host is taken verbatim when present; only its absence selects the placeholder.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV_VAR).unwrap_or_else(|| PLACEHOLDER_HOST.to_string());
        let config = Self::new(host);
        debug!(host = %config.host, "Loaded probe configuration");
        config
    }

    /// LDAP port connected to.
    #[must_use]
    pub const fn port(&self) -> u16 {
        LDAP_PORT
    }

    /// Maximum number of user entries requested from the server.
    #[must_use]
    pub const fn user_size_limit(&self) -> i32 {
        USER_SIZE_LIMIT
    }

    /// LDAP protocol version used for every request.
    #[must_use]
    pub const fn protocol_version(&self) -> u8 {
        LDAP_PROTOCOL_VERSION
    }

    /// Referrals returned by the server are reported, never followed.
    #[must_use]
    pub const fn chase_referrals(&self) -> bool {
        false
    }

    /// Returns true if the host is still the unconfigured placeholder.
    #[must_use]
    pub fn is_placeholder_host(&self) -> bool {
        self.host == PLACEHOLDER_HOST
    }

    /// Renders and validates the `ldap://host:389` URL for this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the host is empty or the URL cannot be parsed.
    pub fn ldap_url(&self) -> Result<String, Error> {
        self.validate()?;

        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        let url = format!("ldap://{host}:{}", self.port());
        Url::parse(&url)?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn unset_host_falls_back_to_placeholder() {
        let config = ProbeConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.host, PLACEHOLDER_HOST);
        assert!(config.is_placeholder_host());
    }

    #[test]
    fn set_host_is_used_verbatim() {
        let config =
            ProbeConfig::from_lookup(lookup_from(&[("AD_LDAP_HOST", "dc01.corp.example.com")]));
        assert_eq!(config.host, "dc01.corp.example.com");
        assert!(!config.is_placeholder_host());
    }

    #[test]
    fn port_is_not_configurable() {
        let config = ProbeConfig::from_lookup(lookup_from(&[
            ("AD_LDAP_HOST", "dc01"),
            ("AD_LDAP_PORT", "3268"),
        ]));
        assert_eq!(config.port(), 389);
        assert_eq!(config.ldap_url().unwrap(), "ldap://dc01:389");
    }

    #[test]
    fn fixed_session_options() {
        let config = ProbeConfig::new("dc01.corp.example.com");
        assert_eq!(config.auth, AuthMechanism::Negotiate);
        assert_eq!(config.protocol_version(), 3);
        assert!(!config.chase_referrals());
        assert_eq!(config.user_size_limit(), 500);
    }

    #[test]
    fn ldap_url_rendering() {
        let config = ProbeConfig::new("dc01.corp.example.com");
        assert_eq!(config.ldap_url().unwrap(), "ldap://dc01.corp.example.com:389");

        let config = ProbeConfig::new("::1");
        assert_eq!(config.ldap_url().unwrap(), "ldap://[::1]:389");
    }

    #[test]
    fn empty_host_is_rejected_before_connecting() {
        let config = ProbeConfig::from_lookup(lookup_from(&[("AD_LDAP_HOST", "")]));
        assert_eq!(config.host, "");
        let err = config.ldap_url().unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
