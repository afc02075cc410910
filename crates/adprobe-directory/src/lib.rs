//! Active Directory probe over LDAP.
//!
//! This crate binds to a directory server with the caller's ambient Kerberos credential,
//! discovers the default naming context and reports one randomly chosen user account.

#![deny(missing_docs)]

mod entry;
mod probe;
mod session;

pub use entry::DirectoryEntry;
pub use probe::{select_entry, DirectoryProbe, ProbeOutcome, RandomUser, USER_ATTRIBUTES};
pub use session::{
    DirectoryConnector, DirectorySession, LdapConnector, SearchRequest, SearchResponse,
    SearchScope, DEFAULT_NAMING_CONTEXT, USER_FILTER,
};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = adprobe_core::Result<T>;
