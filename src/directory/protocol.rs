//! Directory Network Protocol
//!
//! Endpoint paths and DTOs served by the registry process and consumed by
//! `HttpDirectory`.

use serde::{Deserialize, Serialize};

use super::types::Endpoint;

/// Binds (or rebinds) a name to an endpoint.
pub const ENDPOINT_REGISTER: &str = "/directory/register";
/// Resolves a single name; followed by `/<name>`.
pub const ENDPOINT_LOOKUP: &str = "/directory/lookup";
/// Lists every registered name.
pub const ENDPOINT_LIST: &str = "/directory/list";

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub endpoint: Endpoint,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
}

/// `endpoint` is `None` when the name is not bound (sent with 404).
#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    pub endpoint: Option<Endpoint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub names: Vec<String>,
}
