//! Project member invite handler.
//!
//! Invites are ephemeral: a create upserts into the project's `invites`
//! list, while update and delete both remove every invite matching the
//! payload by email or user id. An invite changing state is represented by
//! its disappearance from the view; invite statuses themselves are not
//! projected.

use async_trait::async_trait;
use projview_events::{invite_statuses, Resource};
use serde_json::Value;
use tracing::debug;

use crate::state::AppState;
use crate::store::Collection;

use super::contract;
use super::merge::{self, IdentityField};
use super::{HandlerResult, ResourceHandler};

/// Handler for project member invites.
pub struct InviteHandler;

impl InviteHandler {
    fn validate_identity(payload: &Value) -> HandlerResult {
        contract::require_object(payload)?;
        contract::require_positive_int(payload, "id")?;
        contract::require_positive_int(payload, "projectId")?;
        contract::optional_string(payload, "email")?;
        contract::optional_int(payload, "userId")?;
        Ok(())
    }

    async fn remove_matching(&self, state: &AppState, payload: Value, verb: &'static str) -> HandlerResult {
        Self::validate_identity(&payload)?;

        let doc_id = payload["projectId"].to_string();
        let invite_id = payload["id"].clone();

        state
            .accessor()
            .apply_to_document(Collection::Projects, &doc_id, move |mut doc| async move {
                if let Some(obj) = doc.as_object_mut() {
                    let mut invites = merge::take_list(obj.remove("invites"));
                    merge::remove_matching_invites(
                        &mut invites,
                        payload.get("email"),
                        payload.get("userId"),
                    );
                    obj.insert("invites".to_string(), Value::Array(invites));
                }
                doc
            })
            .await?;

        debug!(invite_id = %invite_id, "member invite {} in search index", verb);
        Ok(())
    }
}

#[async_trait]
impl ResourceHandler for InviteHandler {
    fn resources(&self) -> &'static [Resource] {
        &[Resource::ProjectMemberInvite]
    }

    async fn create(&self, state: &AppState, payload: Value) -> HandlerResult {
        Self::validate_identity(&payload)?;
        contract::require_one_of(&payload, "status", invite_statuses::ALL)?;

        let doc_id = payload["projectId"].to_string();
        let invite_id = payload["id"].clone();

        state
            .accessor()
            .apply_to_document(Collection::Projects, &doc_id, move |mut doc| async move {
                if let Some(obj) = doc.as_object_mut() {
                    let mut invites = merge::take_list(obj.remove("invites"));
                    merge::upsert(&mut invites, payload, IdentityField::Id, false);
                    obj.insert("invites".to_string(), Value::Array(invites));
                }
                doc
            })
            .await?;

        debug!(invite_id = %invite_id, "member invite created in search index");
        Ok(())
    }

    async fn update(&self, state: &AppState, payload: Value) -> HandlerResult {
        self.remove_matching(state, payload, "updated").await
    }

    async fn delete(&self, state: &AppState, payload: Value) -> HandlerResult {
        self.remove_matching(state, payload, "deleted").await
    }
}
