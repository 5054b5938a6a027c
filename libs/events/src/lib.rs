//! # projview-events
//!
//! Message envelope and resource definitions for the projview projector.
//!
//! ## Design Principles
//!
//! - Messages are opaque JSON payloads tagged with a resource kind
//! - The envelope is validated before any payload is interpreted
//! - Resource kinds are a closed set; unknown tags are rejected at dispatch
//!
//! ## Message Envelope
//!
//! All messages share a common envelope with:
//! - The topic the message was published on (`topic`)
//! - The producing system (`originator`), checked against configuration
//! - A timestamp (`timestamp`), either epoch milliseconds or an ISO 8601 date
//! - The payload content type (`mime-type`)
//! - The resource-tagged payload (`payload.resource`)
//!
//! ## Resource Kinds
//!
//! Resources are organized by parent document:
//! - Project-nested (`project.phase`, `project.member`, `attachment`, ...)
//! - Timeline-nested (`milestone`)
//! - Metadata-nested (`project.template`, `product.category`, ...)
//! - Root documents (`project`, `timeline`, `customer-payment`)

mod envelope;
mod error;
mod types;

pub use envelope::*;
pub use error::EventError;
pub use types::*;
