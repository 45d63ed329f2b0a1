//! Per-domain hub clients.
//!
//! Each hub is a thin façade over one registry entry with a fixed path.
//! Typed subscriptions decode envelopes into the wire-crate event enums;
//! payloads that fail typed parsing are logged and dropped so one
//! malformed broadcast never tears down the connection.
//!
//! Outbound calls come in two flavors. Activity pings are best-effort:
//! failures are logged and swallowed. Everything else is request-style:
//! an unconnected hub fails synchronously with
//! [`RegistryError::NotConnected`](crate::registry::RegistryError) and
//! transport failures are rethrown after logging.

pub mod activity;
pub mod chat;
pub mod comments;
pub mod ideas;
pub mod notifications;
pub mod votes;

pub use activity::ActivityHub;
pub use chat::ChatHub;
pub use comments::CommentsHub;
pub use ideas::IdeasHub;
pub use notifications::NotificationsHub;
pub use votes::VotesHub;
