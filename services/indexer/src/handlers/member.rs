//! Project member handler.
//!
//! Member adds are the one place the merge protocol has side effects beyond
//! its own list: the payload is enriched with profile fields from the member
//! service, and any invite the new member was created from is removed from
//! the project's `invites` list. Both steps are best-effort; failures are
//! logged and never abort the add.

use async_trait::async_trait;
use projview_events::{member_roles, Resource};
use serde_json::Value;
use tracing::{debug, warn};

use crate::members::{LookupError, MemberLookup};
use crate::state::AppState;
use crate::store::Collection;

use super::contract;
use super::merge::{self, IdentityField};
use super::{HandlerResult, ResourceHandler};

/// Handler for project members.
pub struct MemberHandler;

impl MemberHandler {
    fn validate_identity(payload: &Value) -> HandlerResult {
        contract::require_object(payload)?;
        contract::require_positive_int(payload, "id")?;
        contract::require_positive_int(payload, "projectId")?;
        Ok(())
    }

    fn parent_doc_id(payload: &Value) -> String {
        payload["projectId"].to_string()
    }
}

/// Merge profile fields fetched from the member service into the payload.
///
/// Returns the enriched payload, or the error from the lookup so the caller
/// can log it and fall back to the bare payload.
pub(super) async fn enrich_member(
    members: &dyn MemberLookup,
    mut payload: Value,
) -> Result<Value, (Value, LookupError)> {
    let Some(user_id) = payload.get("userId").and_then(Value::as_i64) else {
        return Ok(payload);
    };

    let profiles = match members.member_details(&[user_id]).await {
        Ok(profiles) => profiles,
        Err(err) => return Err((payload, err)),
    };
    let Some(profile) = profiles.into_iter().find(|p| p.user_id == user_id) else {
        return Ok(payload);
    };

    if let Some(obj) = payload.as_object_mut() {
        let picked = [
            ("handle", profile.handle),
            ("firstName", profile.first_name),
            ("lastName", profile.last_name),
            ("email", profile.email),
        ];
        for (field, value) in picked {
            if let Some(value) = value {
                obj.insert(field.to_string(), Value::String(value));
            }
        }
    }
    Ok(payload)
}

/// Remove invites matching the materialized member, returning the removed
/// entries for diagnostics.
fn reconcile_invites(doc: &mut Value, member: &Value) -> Vec<Value> {
    let Some(obj) = doc.as_object_mut() else {
        return Vec::new();
    };
    let mut invites = merge::take_list(obj.remove("invites"));
    let removed =
        merge::remove_matching_invites(&mut invites, member.get("email"), member.get("userId"));
    obj.insert("invites".to_string(), Value::Array(invites));
    removed
}

#[async_trait]
impl ResourceHandler for MemberHandler {
    fn resources(&self) -> &'static [Resource] {
        &[Resource::ProjectMember]
    }

    async fn create(&self, state: &AppState, payload: Value) -> HandlerResult {
        Self::validate_identity(&payload)?;
        contract::optional_one_of(&payload, "role", member_roles::ALL)?;

        let doc_id = Self::parent_doc_id(&payload);
        let member_id = payload["id"].clone();
        let members = state.members().clone();

        state
            .accessor()
            .apply_to_document(Collection::Projects, &doc_id, move |mut doc| async move {
                let mut list = match doc.as_object_mut() {
                    Some(obj) => merge::take_list(obj.remove("members")),
                    None => return doc,
                };
                let is_new = !list.iter().any(|m| m.get("id") == payload.get("id"));

                // A repair of an already-indexed member re-uses the raw
                // payload; only a genuinely new member is enriched.
                let member = if is_new {
                    match enrich_member(members.as_ref(), payload).await {
                        Ok(member) => member,
                        Err((bare, err)) => {
                            // Missing profile fields are preferable to a
                            // lost add.
                            warn!(error = %err, "Member lookup failed, indexing bare member");
                            bare
                        }
                    }
                } else {
                    payload
                };

                merge::upsert(&mut list, member.clone(), IdentityField::Id, false);
                if let Some(obj) = doc.as_object_mut() {
                    obj.insert("members".to_string(), Value::Array(list));
                }

                for invite in reconcile_invites(&mut doc, &member) {
                    warn!(
                        invite_id = %invite["id"],
                        "Removing stale invite superseded by member add"
                    );
                }
                doc
            })
            .await?;

        debug!(member_id = %member_id, "project member created in search index");
        Ok(())
    }

    async fn update(&self, state: &AppState, payload: Value) -> HandlerResult {
        Self::validate_identity(&payload)?;
        contract::require_one_of(&payload, "role", member_roles::ALL)?;

        let doc_id = Self::parent_doc_id(&payload);
        let member_id = payload["id"].clone();

        state
            .accessor()
            .apply_to_document(Collection::Projects, &doc_id, move |mut doc| async move {
                if let Some(obj) = doc.as_object_mut() {
                    let mut list = merge::take_list(obj.remove("members"));
                    merge::patch(&mut list, &payload, IdentityField::Id);
                    obj.insert("members".to_string(), Value::Array(list));
                }
                doc
            })
            .await?;

        debug!(member_id = %member_id, "project member updated in search index");
        Ok(())
    }

    async fn delete(&self, state: &AppState, payload: Value) -> HandlerResult {
        Self::validate_identity(&payload)?;

        let doc_id = Self::parent_doc_id(&payload);
        let member_id = payload["id"].clone();

        state
            .accessor()
            .apply_to_document(Collection::Projects, &doc_id, move |mut doc| async move {
                if let Some(obj) = doc.as_object_mut() {
                    let mut list = merge::take_list(obj.remove("members"));
                    merge::remove(&mut list, &payload, IdentityField::Id);
                    obj.insert("members".to_string(), Value::Array(list));
                }
                doc
            })
            .await?;

        debug!(member_id = %member_id, "project member deleted in search index");
        Ok(())
    }
}
