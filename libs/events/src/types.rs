//! Resource kinds, action topics, and domain constants.

use serde::{Deserialize, Serialize};

use crate::error::EventError;

// =============================================================================
// Action Topics
// =============================================================================

/// Default topic names, one per action. Deployments may override them via
/// configuration; the defaults match the producing project service.
pub mod topics {
    pub const CREATE: &str = "project.action.create";
    pub const UPDATE: &str = "project.action.update";
    pub const DELETE: &str = "project.action.delete";
}

/// The store operation a message requests, derived from the topic it
/// arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

// =============================================================================
// Resource Kinds
// =============================================================================

/// Every resource kind the projector knows how to apply.
///
/// The wire tag (the payload's `resource` field) uses the producer's dotted
/// vocabulary; `from_tag`/`as_tag` convert between the two. Form, plan-config
/// and price-config changes arrive under separate `version`/`revision` tags
/// but project into the same metadata list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Project,
    ProjectTemplate,
    ProjectType,
    ProjectMember,
    ProjectMemberInvite,
    OrgConfig,
    FormVersion,
    FormRevision,
    PriceConfigVersion,
    PriceConfigRevision,
    PlanConfigVersion,
    PlanConfigRevision,
    ProductTemplate,
    ProductCategory,
    Phase,
    PhaseProduct,
    Timeline,
    Milestone,
    MilestoneTemplate,
    CustomerPayment,
    Attachment,
}

impl Resource {
    /// All resource kinds, in dispatch-registry order.
    pub const ALL: &'static [Resource] = &[
        Resource::Project,
        Resource::ProjectTemplate,
        Resource::ProjectType,
        Resource::ProjectMember,
        Resource::ProjectMemberInvite,
        Resource::OrgConfig,
        Resource::FormVersion,
        Resource::FormRevision,
        Resource::PriceConfigVersion,
        Resource::PriceConfigRevision,
        Resource::PlanConfigVersion,
        Resource::PlanConfigRevision,
        Resource::ProductTemplate,
        Resource::ProductCategory,
        Resource::Phase,
        Resource::PhaseProduct,
        Resource::Timeline,
        Resource::Milestone,
        Resource::MilestoneTemplate,
        Resource::CustomerPayment,
        Resource::Attachment,
    ];

    /// The wire tag for this resource kind.
    pub fn as_tag(self) -> &'static str {
        match self {
            Resource::Project => "project",
            Resource::ProjectTemplate => "project.template",
            Resource::ProjectType => "project.type",
            Resource::ProjectMember => "project.member",
            Resource::ProjectMemberInvite => "project.member.invite",
            Resource::OrgConfig => "project.orgConfig",
            Resource::FormVersion => "project.form.version",
            Resource::FormRevision => "project.form.revision",
            Resource::PriceConfigVersion => "project.priceConfig.version",
            Resource::PriceConfigRevision => "project.priceConfig.revision",
            Resource::PlanConfigVersion => "project.planConfig.version",
            Resource::PlanConfigRevision => "project.planConfig.revision",
            Resource::ProductTemplate => "product.template",
            Resource::ProductCategory => "product.category",
            Resource::Phase => "project.phase",
            Resource::PhaseProduct => "project.phase.product",
            Resource::Timeline => "timeline",
            Resource::Milestone => "milestone",
            Resource::MilestoneTemplate => "milestone.template",
            Resource::CustomerPayment => "customer-payment",
            Resource::Attachment => "attachment",
        }
    }

    /// Resolve a wire tag to a resource kind.
    pub fn from_tag(tag: &str) -> Result<Resource, EventError> {
        Resource::ALL
            .iter()
            .copied()
            .find(|r| r.as_tag() == tag)
            .ok_or_else(|| EventError::UnknownResource(tag.to_string()))
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

// =============================================================================
// Domain Constants
// =============================================================================

/// Project member roles. The producer may materialize members with any of
/// these roles implicitly, e.g. when an invitation is accepted.
pub mod member_roles {
    pub const ALL: &[&str] = &[
        "manager",
        "observer",
        "customer",
        "copilot",
        "account_manager",
        "program_manager",
        "account_executive",
        "solution_architect",
        "project_manager",
    ];
}

/// Member invite statuses.
pub mod invite_statuses {
    pub const ALL: &[&str] = &[
        "pending",
        "accepted",
        "refused",
        "requested",
        "request_rejected",
        "request_approved",
        "canceled",
    ];
}

/// Project lifecycle statuses.
pub mod project_statuses {
    pub const CANCELLED: &str = "cancelled";

    pub const ALL: &[&str] = &[
        "draft",
        "in_review",
        "reviewed",
        "active",
        "completed",
        "paused",
        CANCELLED,
    ];
}

/// Customer payment statuses.
pub mod payment_statuses {
    pub const ALL: &[&str] = &[
        "canceled",
        "processing",
        "requires_action",
        "requires_capture",
        "requires_confirmation",
        "requires_payment_method",
        "succeeded",
        "refunded",
        "refund_failed",
        "refund_pending",
    ];
}

/// Attachment types.
pub mod attachment_types {
    pub const FILE: &str = "file";
    pub const LINK: &str = "link";

    pub const ALL: &[&str] = &[FILE, LINK];
}

/// What a timeline may reference.
pub mod timeline_references {
    pub const ALL: &[&str] = &["project", "phase", "product"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_tag_round_trip() {
        for resource in Resource::ALL {
            assert_eq!(Resource::from_tag(resource.as_tag()).unwrap(), *resource);
        }
    }

    #[test]
    fn test_resource_from_tag_rejects_unknown() {
        assert!(matches!(
            Resource::from_tag("project.unknown"),
            Err(EventError::UnknownResource(_))
        ));
    }

    #[test]
    fn test_resource_display_uses_wire_tag() {
        assert_eq!(Resource::ProjectMemberInvite.to_string(), "project.member.invite");
        assert_eq!(Resource::CustomerPayment.to_string(), "customer-payment");
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Create.to_string(), "create");
        assert_eq!(Action::Delete.to_string(), "delete");
    }
}
