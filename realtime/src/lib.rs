//! Realtime synchronization client for the idea-sharing platform.
//!
//! SYSTEM CONTEXT
//! ==============
//! The platform pushes entity changes over a set of independent websocket
//! channels ("hubs": activity, chat, comments, ideas, notifications, votes)
//! while plain REST endpoints accept mutations. This crate keeps a client's
//! visible state consistent with both, and with the user's own in-flight
//! optimistic mutations:
//!
//! - [`registry`] owns at most one live connection per hub name, with
//!   transport-driven auto-reconnect and token-refreshing handshakes.
//! - [`hubs`] are the typed per-domain façades over registry entries.
//! - [`dispatch`] fans one channel's events out to many local consumers.
//! - [`optimistic`] arbitrates between locally-applied provisional values
//!   and concurrently arriving broadcasts for the same entity key.
//! - [`presence`] tracks self-expiring typing/viewing state without
//!   leaking timers.
//! - [`rest`] is the REST collaborator the mutation tracker confirms
//!   against.

pub mod dispatch;
pub mod hubs;
pub mod optimistic;
pub mod presence;
pub mod registry;
pub mod rest;
pub mod transport;
