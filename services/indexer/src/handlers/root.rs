//! Handlers for root-level documents: projects, timelines, and customer
//! payments.
//!
//! These are whole documents rather than nested sub-entities, so they go
//! straight to the store: create fails on an existing id instead of
//! repairing it, and update/delete surface `NotFound` instead of treating
//! absence as a no-op.

use async_trait::async_trait;
use projview_events::{payment_statuses, project_statuses, timeline_references, Resource};
use serde_json::Value;
use tracing::{debug, warn};

use crate::state::AppState;
use crate::store::Collection;

use super::contract;
use super::member::enrich_member;
use super::{HandlerResult, ResourceHandler};

/// Handler for project documents.
pub struct ProjectHandler;

/// Handler for timeline documents.
pub struct TimelineHandler;

/// Handler for customer payment documents.
pub struct CustomerPaymentHandler;

#[async_trait]
impl ResourceHandler for ProjectHandler {
    fn resources(&self) -> &'static [Resource] {
        &[Resource::Project]
    }

    async fn create(&self, state: &AppState, mut payload: Value) -> HandlerResult {
        contract::require_object(&payload)?;
        contract::require_positive_int(&payload, "id")?;
        contract::require_string(&payload, "name")?;
        contract::require_string(&payload, "type")?;
        let status = contract::require_string(&payload, "status")?;
        if status == project_statuses::CANCELLED {
            contract::require_string(&payload, "cancelReason")?;
        }

        let id = payload["id"].to_string();

        // The initial member is enriched with profile details before the
        // document is written; lookup failure falls back to the raw member.
        let initial_member = payload
            .get("members")
            .and_then(Value::as_array)
            .and_then(|members| members.first())
            .cloned();
        if let Some(member) = initial_member {
            let member = match enrich_member(state.members().as_ref(), member).await {
                Ok(member) => member,
                Err((bare, err)) => {
                    warn!(error = %err, "Member lookup failed, indexing bare member");
                    bare
                }
            };
            payload["members"] = Value::Array(vec![member]);
        }

        state.store().create(Collection::Projects, &id, &payload).await?;
        debug!(project_id = %id, "project created in search index");
        Ok(())
    }

    async fn update(&self, state: &AppState, payload: Value) -> HandlerResult {
        contract::require_object(&payload)?;
        contract::require_positive_int(&payload, "id")?;

        let id = payload["id"].to_string();
        state.store().update(Collection::Projects, &id, &payload).await?;
        debug!(project_id = %id, "project updated in search index");
        Ok(())
    }

    async fn delete(&self, state: &AppState, payload: Value) -> HandlerResult {
        contract::require_object(&payload)?;
        contract::require_positive_int(&payload, "id")?;

        let id = payload["id"].to_string();
        state.store().delete(Collection::Projects, &id).await?;
        debug!(project_id = %id, "project deleted in search index");
        Ok(())
    }
}

#[async_trait]
impl ResourceHandler for TimelineHandler {
    fn resources(&self) -> &'static [Resource] {
        &[Resource::Timeline]
    }

    async fn create(&self, state: &AppState, payload: Value) -> HandlerResult {
        contract::require_object(&payload)?;
        contract::require_positive_int(&payload, "id")?;
        contract::require_string(&payload, "name")?;
        contract::require_present(&payload, "startDate")?;
        contract::require_one_of(&payload, "reference", timeline_references::ALL)?;
        contract::require_positive_int(&payload, "referenceId")?;

        let id = payload["id"].to_string();
        state.store().create(Collection::Timelines, &id, &payload).await?;
        debug!(timeline_id = %id, "timeline created in search index");
        Ok(())
    }

    async fn update(&self, state: &AppState, payload: Value) -> HandlerResult {
        contract::require_object(&payload)?;
        contract::require_positive_int(&payload, "id")?;

        let id = payload["id"].to_string();
        state.store().update(Collection::Timelines, &id, &payload).await?;
        debug!(timeline_id = %id, "timeline updated in search index");
        Ok(())
    }

    async fn delete(&self, state: &AppState, payload: Value) -> HandlerResult {
        contract::require_object(&payload)?;
        contract::require_positive_int(&payload, "id")?;

        let id = payload["id"].to_string();
        state.store().delete(Collection::Timelines, &id).await?;
        debug!(timeline_id = %id, "timeline deleted in search index");
        Ok(())
    }
}

#[async_trait]
impl ResourceHandler for CustomerPaymentHandler {
    fn resources(&self) -> &'static [Resource] {
        &[Resource::CustomerPayment]
    }

    async fn create(&self, state: &AppState, payload: Value) -> HandlerResult {
        contract::require_object(&payload)?;
        contract::require_positive_int(&payload, "id")?;
        contract::require_positive_int(&payload, "amount")?;
        contract::require_string(&payload, "currency")?;
        contract::require_string(&payload, "paymentIntentId")?;
        contract::require_one_of(&payload, "status", payment_statuses::ALL)?;

        let id = payload["id"].to_string();
        state.store().create(Collection::Payments, &id, &payload).await?;
        debug!(payment_id = %id, "customer payment created in search index");
        Ok(())
    }

    async fn update(&self, state: &AppState, payload: Value) -> HandlerResult {
        contract::require_object(&payload)?;
        contract::require_positive_int(&payload, "id")?;
        contract::optional_one_of(&payload, "status", payment_statuses::ALL)?;

        let id = payload["id"].to_string();
        state.store().update(Collection::Payments, &id, &payload).await?;
        debug!(payment_id = %id, "customer payment updated in search index");
        Ok(())
    }

    async fn delete(&self, state: &AppState, payload: Value) -> HandlerResult {
        contract::require_object(&payload)?;
        contract::require_positive_int(&payload, "id")?;

        let id = payload["id"].to_string();
        state.store().delete(Collection::Payments, &id).await?;
        debug!(payment_id = %id, "customer payment deleted in search index");
        Ok(())
    }
}
