//! Credential store contract.
//!
//! Out of scope to implement a real vault; Director depends only on this
//! trait so that a node referencing `{{credential:<name>}}` can be
//! dispatched with the real value substituted into the payload sent to the
//! driver, never written back to node config or the variable store.

use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the credential values needed for one dispatched step.
    async fn get_for_step(&self, step_id: &str, workflow_id: &str) -> HashMap<String, String>;
}

/// A credential store with nothing in it — the default when no vault is
/// configured. `{{credential:*}}` references resolve to empty strings.
pub struct EmptyCredentialStore;

#[async_trait]
impl CredentialStore for EmptyCredentialStore {
    async fn get_for_step(&self, _step_id: &str, _workflow_id: &str) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// Prefix recognized inside `{{...}}` templates for credential references.
pub const CREDENTIAL_PREFIX: &str = "credential:";
