//! Types shared by the Mailsmart panel crates.
//!
//! `models` holds the domain enums stored in the database, `api` the request and
//! response bodies of the HTTP surface (and of the external prediction API), and
//! `notifications` the user-visible toasts returned alongside mutations.

pub mod api;
pub mod models;
pub mod notifications;
