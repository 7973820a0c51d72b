//! Element grounding for browser automation.
//!
//! Turns a rendered page into something an agent can address: short ids
//! written onto interactive elements, structural selectors for single
//! elements and repeated groups, a ranking of content-dense containers and a
//! visual overlay tying ids to what is on screen.

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod grounding;
pub mod session;
pub mod trace;

pub use browser::classifier::Scope;
pub use dom::document::{Document, NodeId, Rect};
pub use error::{GroundingError, Result};
pub use session::grounding_session::{ContentItem, GroundingSession, Snapshot, StabilityOutcome};
