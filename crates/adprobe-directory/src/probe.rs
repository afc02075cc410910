//! The directory probe: bind, discover the naming context, pick a random user.

use crate::{
    entry::DirectoryEntry,
    session::{
        DirectoryConnector, DirectorySession, LdapConnector, SearchRequest, DEFAULT_NAMING_CONTEXT,
    },
    Result,
};
use adprobe_core::ProbeConfig;
use rand::Rng;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Attributes requested for every user entry.
pub const USER_ATTRIBUTES: &[&str] = &["sAMAccountName", "userPrincipalName", "cn"];

const STARTING_MESSAGE: &str = "Starting LDAP Kerberos test...";
const BINDING_MESSAGE: &str = "Binding using Kerberos ticket...";
const BIND_SUCCESS_MESSAGE: &str = "SUCCESS — Kerberos LDAP bind worked!";
const NO_NAMING_CONTEXT_MESSAGE: &str = "Could not determine AD default naming context.";
const EMPTY_NAMING_CONTEXT_MESSAGE: &str = "Default naming context was empty.";
const NO_USERS_MESSAGE: &str = "No AD user objects were returned.";

/// How a probe run ended when no fatal error occurred.
///
/// Every variant is a successful completion: the directory answered, even if the answer was
/// not interesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The root DSE search returned no entries.
    NoRootDse,
    /// The root DSE entry has no `defaultNamingContext` attribute.
    NamingContextMissing,
    /// `defaultNamingContext` is empty or whitespace.
    NamingContextEmpty,
    /// The user search returned no entries.
    NoUsers,
    /// A user was selected and reported.
    UserReported(RandomUser),
}

impl ProbeOutcome {
    /// Console line describing the outcome.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NoRootDse | Self::NamingContextMissing => NO_NAMING_CONTEXT_MESSAGE.to_string(),
            Self::NamingContextEmpty => EMPTY_NAMING_CONTEXT_MESSAGE.to_string(),
            Self::NoUsers => NO_USERS_MESSAGE.to_string(),
            Self::UserReported(user) => user.to_string(),
        }
    }
}

/// Display attributes of the randomly chosen user, with placeholders for unset values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomUser {
    /// Distinguished name of the entry.
    pub dn: String,
    /// `cn`, or `(no cn)`.
    pub common_name: String,
    /// `sAMAccountName`, or `(no sAMAccountName)`.
    pub sam_account_name: String,
    /// `userPrincipalName`, or `(no userPrincipalName)`.
    pub user_principal_name: String,
}

impl RandomUser {
    /// Extracts the reported attributes from an entry.
    #[must_use]
    pub fn from_entry(entry: &DirectoryEntry) -> Self {
        Self {
            dn: entry.dn.clone(),
            common_name: entry.first_or_placeholder("cn"),
            sam_account_name: entry.first_or_placeholder("sAMAccountName"),
            user_principal_name: entry.first_or_placeholder("userPrincipalName"),
        }
    }
}

impl fmt::Display for RandomUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Random AD user: CN={}, sAMAccountName={}, UPN={}",
            self.common_name, self.sam_account_name, self.user_principal_name
        )
    }
}

/// Picks one entry uniformly at random, or `None` if there are none.
pub fn select_entry<'a, T, R>(entries: &'a [T], rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    if entries.is_empty() {
        return None;
    }
    entries.get(rng.random_range(0..entries.len()))
}

/// Directory probe with a pluggable connector.
pub struct DirectoryProbe {
    config: Arc<ProbeConfig>,
    connector: Box<dyn DirectoryConnector>,
}

impl DirectoryProbe {
    /// Creates a probe that talks to a real LDAP server.
    #[must_use]
    pub fn new(config: ProbeConfig) -> Self {
        let config = Arc::new(config);
        let connector: Box<dyn DirectoryConnector> = Box::new(LdapConnector::new(config.clone()));
        Self { config, connector }
    }

    /// Creates a probe over an arbitrary connector.
    #[must_use]
    pub fn with_connector(config: ProbeConfig, connector: Box<dyn DirectoryConnector>) -> Self {
        Self {
            config: Arc::new(config),
            connector,
        }
    }

    /// Runs the probe, writing its console lines to `out`.
    ///
    /// Once connected, the session is unbound on every path, including failures.
    ///
    /// # Errors
    ///
    /// Connection, bind and search failures are returned unchanged; they are the conditions
    /// the probe exists to surface. Empty directory answers are reported as [`ProbeOutcome`]s.
    pub async fn run<R, W>(&self, rng: &mut R, out: &mut W) -> Result<ProbeOutcome>
    where
        R: Rng + ?Sized,
        W: Write + ?Sized,
    {
        writeln!(out, "{STARTING_MESSAGE}")?;
        info!(
            host = %self.config.host,
            port = self.config.port(),
            auth = %self.config.auth,
            "Starting directory probe"
        );

        writeln!(out, "{BINDING_MESSAGE}")?;
        let mut session = self.connector.connect().await?;
        let outcome = self.probe_session(session.as_mut(), rng, out).await;

        if let Err(err) = session.unbind().await {
            warn!(error = %err, "Failed to release directory connection");
        }

        let outcome = outcome?;
        writeln!(out, "{}", outcome.message())?;
        Ok(outcome)
    }

    async fn probe_session<R, W>(
        &self,
        session: &mut dyn DirectorySession,
        rng: &mut R,
        out: &mut W,
    ) -> Result<ProbeOutcome>
    where
        R: Rng + ?Sized,
        W: Write + ?Sized,
    {
        session.negotiate_bind().await?;
        writeln!(out, "{BIND_SUCCESS_MESSAGE}")?;
        info!("Kerberos bind succeeded");

        let root_dse = session.search(&SearchRequest::root_dse()).await?;
        let Some(root) = root_dse.entries.first() else {
            return Ok(ProbeOutcome::NoRootDse);
        };
        let Some(values) = root.values(DEFAULT_NAMING_CONTEXT) else {
            return Ok(ProbeOutcome::NamingContextMissing);
        };
        let naming_context = values.first().map_or("", String::as_str);
        if naming_context.trim().is_empty() {
            return Ok(ProbeOutcome::NamingContextEmpty);
        }
        debug!(%naming_context, "Discovered default naming context");

        let users = session
            .search(&SearchRequest::users(
                naming_context,
                USER_ATTRIBUTES,
                self.config.user_size_limit(),
            ))
            .await?;
        if users.truncated {
            info!(
                returned = users.entries.len(),
                "User search hit the size limit; using the truncated result"
            );
        }

        let Some(entry) = select_entry(&users.entries, rng) else {
            return Ok(ProbeOutcome::NoUsers);
        };
        debug!(dn = %entry.dn, candidates = users.entries.len(), "Selected user");
        Ok(ProbeOutcome::UserReported(RandomUser::from_entry(entry)))
    }
}
