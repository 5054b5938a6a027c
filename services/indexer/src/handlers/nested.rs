//! Descriptor-driven handler for nested sub-entities.
//!
//! Every nested resource follows the same protocol: fetch the parent
//! document, rewrite one list field, write the parent back. The differences
//! between resource kinds fit in a small descriptor (which collection, which
//! payload field names the parent, which list field, which identity field,
//! whether inserts renumber sibling orders, and whether the list lives
//! inside an outer list element as phase products do), so one engine serves
//! them all.

use async_trait::async_trait;
use projview_events::{Action, Resource};
use serde_json::Value;
use tracing::debug;

use crate::state::AppState;
use crate::store::Collection;

use super::contract;
use super::merge::{self, IdentityField};
use super::{HandlerResult, ResourceHandler};

/// How the parent document id is resolved from a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKey {
    /// The payload field holding the parent document id.
    Field(&'static str),
    /// The metadata singleton; the id comes from configuration.
    MetadataSingleton,
}

/// A list nested inside an element of an outer list (phase products live in
/// `phases[].products`).
#[derive(Debug, Clone, Copy)]
pub struct OuterScope {
    /// The outer list field on the parent document.
    pub list_field: &'static str,
    /// The payload field naming the outer element's id.
    pub key_field: &'static str,
}

/// Everything that distinguishes one nested resource kind from another.
#[derive(Debug, Clone, Copy)]
pub struct NestedDescriptor {
    pub resources: &'static [Resource],
    /// Human label for diagnostics ("project phase", "milestone", ...).
    pub label: &'static str,
    pub collection: Collection,
    pub parent: ParentKey,
    pub list_field: &'static str,
    pub identity: IdentityField,
    /// Inserting renumbers sibling `order` values.
    pub positioned: bool,
    pub outer: Option<OuterScope>,
}

pub(super) const ATTACHMENTS: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::Attachment],
    label: "project attachment",
    collection: Collection::Projects,
    parent: ParentKey::Field("projectId"),
    list_field: "attachments",
    identity: IdentityField::Id,
    positioned: false,
    outer: None,
};

pub(super) const PHASES: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::Phase],
    label: "project phase",
    collection: Collection::Projects,
    parent: ParentKey::Field("projectId"),
    list_field: "phases",
    identity: IdentityField::Id,
    positioned: true,
    outer: None,
};

pub(super) const PHASE_PRODUCTS: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::PhaseProduct],
    label: "phase product",
    collection: Collection::Projects,
    parent: ParentKey::Field("projectId"),
    list_field: "products",
    identity: IdentityField::Id,
    positioned: false,
    outer: Some(OuterScope {
        list_field: "phases",
        key_field: "phaseId",
    }),
};

pub(super) const MILESTONES: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::Milestone],
    label: "milestone",
    collection: Collection::Timelines,
    parent: ParentKey::Field("timelineId"),
    list_field: "milestones",
    identity: IdentityField::Id,
    positioned: true,
    outer: None,
};

pub(super) const MILESTONE_TEMPLATES: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::MilestoneTemplate],
    label: "milestone template",
    collection: Collection::Metadata,
    parent: ParentKey::MetadataSingleton,
    list_field: "milestoneTemplates",
    identity: IdentityField::Id,
    positioned: false,
    outer: None,
};

pub(super) const PROJECT_TEMPLATES: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::ProjectTemplate],
    label: "project template",
    collection: Collection::Metadata,
    parent: ParentKey::MetadataSingleton,
    list_field: "projectTemplates",
    identity: IdentityField::Id,
    positioned: false,
    outer: None,
};

pub(super) const PROJECT_TYPES: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::ProjectType],
    label: "project type",
    collection: Collection::Metadata,
    parent: ParentKey::MetadataSingleton,
    list_field: "projectTypes",
    identity: IdentityField::Key,
    positioned: false,
    outer: None,
};

pub(super) const ORG_CONFIGS: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::OrgConfig],
    label: "organization config",
    collection: Collection::Metadata,
    parent: ParentKey::MetadataSingleton,
    list_field: "orgConfigs",
    identity: IdentityField::Id,
    positioned: false,
    outer: None,
};

pub(super) const FORMS: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::FormVersion, Resource::FormRevision],
    label: "project form",
    collection: Collection::Metadata,
    parent: ParentKey::MetadataSingleton,
    list_field: "forms",
    identity: IdentityField::Id,
    positioned: false,
    outer: None,
};

pub(super) const PLAN_CONFIGS: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::PlanConfigVersion, Resource::PlanConfigRevision],
    label: "plan config",
    collection: Collection::Metadata,
    parent: ParentKey::MetadataSingleton,
    list_field: "planConfigs",
    identity: IdentityField::Id,
    positioned: false,
    outer: None,
};

pub(super) const PRICE_CONFIGS: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::PriceConfigVersion, Resource::PriceConfigRevision],
    label: "price config",
    collection: Collection::Metadata,
    parent: ParentKey::MetadataSingleton,
    list_field: "priceConfigs",
    identity: IdentityField::Id,
    positioned: false,
    outer: None,
};

pub(super) const PRODUCT_TEMPLATES: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::ProductTemplate],
    label: "product template",
    collection: Collection::Metadata,
    parent: ParentKey::MetadataSingleton,
    list_field: "productTemplates",
    identity: IdentityField::Id,
    positioned: false,
    outer: None,
};

pub(super) const PRODUCT_CATEGORIES: NestedDescriptor = NestedDescriptor {
    resources: &[Resource::ProductCategory],
    label: "product category",
    collection: Collection::Metadata,
    parent: ParentKey::MetadataSingleton,
    list_field: "productCategories",
    identity: IdentityField::Key,
    positioned: false,
    outer: None,
};

/// Generic handler for descriptor-driven nested resources.
pub struct NestedHandler {
    desc: NestedDescriptor,
}

impl NestedHandler {
    pub fn new(desc: NestedDescriptor) -> Self {
        Self { desc }
    }

    fn validate(&self, payload: &Value) -> HandlerResult {
        contract::require_object(payload)?;
        match self.desc.identity {
            IdentityField::Id => {
                contract::require_positive_int(payload, "id")?;
            }
            IdentityField::Key => {
                contract::require_string(payload, "key")?;
            }
        }
        if let ParentKey::Field(field) = self.desc.parent {
            contract::require_positive_int(payload, field)?;
        }
        if let Some(outer) = self.desc.outer {
            contract::require_positive_int(payload, outer.key_field)?;
        }
        if self.desc.positioned {
            contract::optional_int(payload, "order")?;
        }
        Ok(())
    }

    fn parent_doc_id(&self, state: &AppState, payload: &Value) -> String {
        match self.desc.parent {
            // validate() already pinned the field to a positive integer
            ParentKey::Field(field) => payload[field].to_string(),
            ParentKey::MetadataSingleton => state.accessor().metadata_doc_id().to_string(),
        }
    }

    async fn apply(&self, state: &AppState, payload: Value, action: Action) -> HandlerResult {
        self.validate(&payload)?;

        let doc_id = self.parent_doc_id(state, &payload);
        let identity = payload[self.desc.identity.name()].clone();
        let desc = self.desc;

        state
            .accessor()
            .apply_to_document(self.desc.collection, &doc_id, move |mut doc| async move {
                apply_list_op(&desc, &mut doc, payload, action);
                doc
            })
            .await?;

        let verb = match action {
            Action::Create => "created",
            Action::Update => "updated",
            Action::Delete => "deleted",
        };
        debug!(identity = %identity, "{} {} in search index", self.desc.label, verb);
        Ok(())
    }
}

/// Rewrite the descriptor's list field inside `doc` according to `action`.
fn apply_list_op(desc: &NestedDescriptor, doc: &mut Value, payload: Value, action: Action) {
    let Some(obj) = doc.as_object_mut() else {
        return;
    };

    match desc.outer {
        None => {
            let mut list = merge::take_list(obj.remove(desc.list_field));
            run_op(&mut list, payload, desc, action);
            obj.insert(desc.list_field.to_string(), Value::Array(list));
        }
        Some(outer) => {
            let key = payload.get(outer.key_field).cloned().unwrap_or(Value::Null);
            let mut outer_list = merge::take_list(obj.remove(outer.list_field));
            for entry in &mut outer_list {
                if entry.get("id") != Some(&key) {
                    continue;
                }
                let inner = entry
                    .as_object_mut()
                    .and_then(|e| e.remove(desc.list_field));
                let mut list = merge::take_list(inner);
                run_op(&mut list, payload.clone(), desc, action);
                entry[desc.list_field] = Value::Array(list);
            }
            obj.insert(outer.list_field.to_string(), Value::Array(outer_list));
        }
    }
}

fn run_op(list: &mut Vec<Value>, payload: Value, desc: &NestedDescriptor, action: Action) {
    match action {
        Action::Create => merge::upsert(list, payload, desc.identity, desc.positioned),
        Action::Update => merge::patch(list, &payload, desc.identity),
        Action::Delete => merge::remove(list, &payload, desc.identity),
    }
}

#[async_trait]
impl ResourceHandler for NestedHandler {
    fn resources(&self) -> &'static [Resource] {
        self.desc.resources
    }

    async fn create(&self, state: &AppState, payload: Value) -> HandlerResult {
        self.apply(state, payload, Action::Create).await
    }

    async fn update(&self, state: &AppState, payload: Value) -> HandlerResult {
        self.apply(state, payload, Action::Update).await
    }

    async fn delete(&self, state: &AppState, payload: Value) -> HandlerResult {
        self.apply(state, payload, Action::Delete).await
    }
}
