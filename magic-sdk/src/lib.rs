//! Blocking HTTP session bound to a base URL and a namespace.
//!
//! Every request carries an `X-Namespace` header. Once a token is bound with
//! [`Session::bind_token`], requests also carry `Authorization: Bearer <token>`.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![deny(clippy::pedantic)]
#![deny(clippy::get_unwrap)]
#![allow(clippy::module_name_repetitions)]

pub(crate) mod base;
mod session;
pub(crate) mod utils;

pub use magic_types::{config::SessionConfig, error::Error, error::Result, file::FilePart};
pub use serde_json::Value;
pub use session::{Session, AUTHORIZATION_HEADER, NAMESPACE_HEADER, NO_QUERY};
