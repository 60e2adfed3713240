//! kingfisher-streets: street-network shortest paths for multimodal planning
//!
//! The engine computes access, egress and transfer legs over a compact
//! edge-indexed street graph. A throw-away [`StreetRouter`] explores outward
//! from one or more origins under A* with a configurable dominance variable
//! (time, distance or generalized weight), honoring turn restrictions and
//! turn costs, and exposes the resulting state cloud so callers can recover
//! the best path to any point on any edge, enumerate transit stops reached
//! within a budget, or enumerate vertices carrying a capability flag
//! (park-and-ride, bike share).
//!
//! The street layer itself is immutable during routing and safely shared
//! across threads; spin up one router per search.

pub mod geo;
pub mod matrix;
pub mod profiles;
pub mod request;
pub mod streets;
pub mod transit;

pub use request::{LegMode, ProfileRequest, StreetMode};
pub use streets::edge_store::{EdgeFlag, EdgeStore};
pub use streets::router::{StreetRouter, ALL_VERTICES};
pub use streets::split::Split;
pub use streets::state::{RoutingVariable, State};
pub use streets::turn_restrictions::TurnRestriction;
pub use streets::vertex_store::{VertexFlag, VertexStore};
pub use streets::visitor::RoutingVisitor;
pub use streets::{EdgeSpec, StreetLayer, LINK_RADIUS_METERS};
pub use transit::TransitLayer;
