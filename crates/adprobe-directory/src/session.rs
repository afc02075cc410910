//! Directory session abstraction and its `ldap3` implementation.

use crate::{entry::DirectoryEntry, Result};
use adprobe_core::{Error, ProbeConfig};
use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchOptions, SearchResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Root DSE attribute holding the domain's default naming context.
pub const DEFAULT_NAMING_CONTEXT: &str = "defaultNamingContext";

/// Person-type user accounts, excluding computer accounts (which also carry `objectClass=user`).
pub const USER_FILTER: &str =
    "(&(objectCategory=person)(objectClass=user)(!(objectClass=computer)))";

const ANY_OBJECT_FILTER: &str = "(objectClass=*)";

/// `sizeLimitExceeded`: the server stopped returning entries at the requested cap.
const RC_SIZE_LIMIT_EXCEEDED: u32 = 4;

/// Represents the search scope for LDAP queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// Entire subtree.
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

/// A single search operation as sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Search base distinguished name (empty for the root DSE).
    pub base: String,
    /// Search scope.
    pub scope: SearchScope,
    /// LDAP filter string.
    pub filter: String,
    /// Attributes requested.
    pub attributes: Vec<String>,
    /// Server-side size limit; `None` sends no limit.
    pub size_limit: Option<i32>,
}

impl SearchRequest {
    /// Base-scope read of the root DSE, requesting only `defaultNamingContext`.
    #[must_use]
    pub fn root_dse() -> Self {
        Self {
            base: String::new(),
            scope: SearchScope::Base,
            filter: ANY_OBJECT_FILTER.to_string(),
            attributes: vec![DEFAULT_NAMING_CONTEXT.to_string()],
            size_limit: None,
        }
    }

    /// Subtree search for user accounts below `naming_context`, capped at `size_limit` entries.
    #[must_use]
    pub fn users(naming_context: impl Into<String>, attributes: &[&str], size_limit: i32) -> Self {
        Self {
            base: naming_context.into(),
            scope: SearchScope::Subtree,
            filter: USER_FILTER.to_string(),
            attributes: attributes.iter().map(|name| (*name).to_string()).collect(),
            size_limit: Some(size_limit),
        }
    }
}

/// Entries returned by a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    /// Entries in server order, never more than the request's size limit.
    pub entries: Vec<DirectoryEntry>,
    /// Set when the server had more matches than the size limit allowed.
    pub truncated: bool,
}

impl SearchResponse {
    /// Builds a response from server entries, enforcing the request's size limit.
    #[must_use]
    pub fn capped(
        mut entries: Vec<DirectoryEntry>,
        size_limit: Option<i32>,
        truncated: bool,
    ) -> Self {
        let mut truncated = truncated;
        if let Some(limit) = size_limit.and_then(|limit| usize::try_from(limit).ok()) {
            if limit > 0 && entries.len() > limit {
                entries.truncate(limit);
                truncated = true;
            }
        }
        Self { entries, truncated }
    }
}

/// A bound (or bindable) connection to a directory server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectorySession: Send {
    /// Binds with the caller's ambient Kerberos credential (SASL GSSAPI).
    async fn negotiate_bind(&mut self) -> Result<()>;
    /// Runs a single search.
    async fn search(&mut self, request: &SearchRequest) -> Result<SearchResponse>;
    /// Releases the connection.
    async fn unbind(&mut self) -> Result<()>;
}

/// Opens directory sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    /// Opens a new, unbound session.
    async fn connect(&self) -> Result<Box<dyn DirectorySession>>;
}

/// Real LDAP connector backed by `ldap3`.
///
/// `ldap3` only speaks LDAP v3 and never chases referrals, which is what the probe needs.
pub struct LdapConnector {
    config: Arc<ProbeConfig>,
}

impl LdapConnector {
    /// Creates a new connector instance.
    #[must_use]
    pub fn new(config: Arc<ProbeConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DirectoryConnector for LdapConnector {
    async fn connect(&self) -> Result<Box<dyn DirectorySession>> {
        let url = self.config.ldap_url()?;
        debug!(
            %url,
            protocol_version = self.config.protocol_version(),
            chase_referrals = self.config.chase_referrals(),
            "Connecting to directory"
        );
        let session = LdapSession::open(&url, &self.config.host).await?;
        Ok(Box::new(session))
    }
}

struct LdapSession {
    inner: ldap3::Ldap,
    server_fqdn: String,
}

impl LdapSession {
    async fn open(url: &str, server_fqdn: &str) -> Result<Self> {
        let (conn, ldap) = LdapConnAsync::with_settings(LdapConnSettings::new(), url)
            .await
            .map_err(map_ldap_error)?;
        ldap3::drive!(conn);

        Ok(Self {
            inner: ldap,
            server_fqdn: server_fqdn.to_string(),
        })
    }

    #[cfg(feature = "gssapi")]
    async fn gssapi_bind(&mut self) -> Result<()> {
        self.inner
            .sasl_gssapi_bind(&self.server_fqdn)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(map_ldap_error)?;
        Ok(())
    }

    #[cfg(not(feature = "gssapi"))]
    #[allow(clippy::unused_async)]
    async fn gssapi_bind(&mut self) -> Result<()> {
        Err(Error::Unsupported(format!(
            "Kerberos bind to {} requires building with the `gssapi` feature",
            self.server_fqdn
        )))
    }
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn negotiate_bind(&mut self) -> Result<()> {
        debug!(server = %self.server_fqdn, "SASL GSSAPI bind");
        self.gssapi_bind().await
    }

    async fn search(&mut self, request: &SearchRequest) -> Result<SearchResponse> {
        debug!(
            base = %request.base,
            scope = ?request.scope,
            filter = %request.filter,
            size_limit = ?request.size_limit,
            "LDAP search"
        );

        let mut options = SearchOptions::new();
        if let Some(limit) = request.size_limit {
            options = options.sizelimit(limit);
        }
        let SearchResult(raw_entries, result) = self
            .inner
            .with_search_options(options)
            .search(
                request.base.as_str(),
                request.scope.into(),
                request.filter.as_str(),
                request.attributes.clone(),
            )
            .await
            .map_err(map_ldap_error)?;

        if !result.refs.is_empty() {
            warn!(referrals = ?result.refs, "Server returned referrals; not following");
        }
        let truncated = result.rc == RC_SIZE_LIMIT_EXCEEDED;
        if !truncated {
            result.success().map_err(map_ldap_error)?;
        }

        let entries = raw_entries
            .into_iter()
            .filter(|entry| !entry.is_ref())
            .map(SearchEntry::construct)
            .map(|entry| DirectoryEntry {
                dn: entry.dn,
                attributes: entry.attrs,
            })
            .collect();
        Ok(SearchResponse::capped(entries, request.size_limit, truncated))
    }

    async fn unbind(&mut self) -> Result<()> {
        self.inner.unbind().await.map_err(map_ldap_error)
    }
}

fn map_ldap_error(err: ldap3::LdapError) -> Error {
    Error::ldap(err.to_string())
}
