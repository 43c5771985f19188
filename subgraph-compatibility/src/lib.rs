//! Compatibility checks for [Apollo Federation](https://www.apollographql.com/docs/federation/)
//! subgraph implementations.
//!
//! The federated introspection check asks a running subgraph for its `_service { sdl }`,
//! normalizes that SDL and a reference schema into the same canonical form, and diffs them
//! structurally.
//!
//! ## Usage
//!
//! ```no_run
//! # async fn check() -> Result<(), Box<dyn std::error::Error>> {
//! use subgraph_compatibility::HttpTestContext;
//! use subgraph_compatibility::IntrospectionCheck;
//!
//! let context = HttpTestContext::new("http://localhost:4001/graphql".parse()?);
//! if !IntrospectionCheck::products()?.test(&context).await {
//!     std::process::exit(1);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`normalize`] and [`diff()`] can also be used on their own.

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

pub mod context;
pub mod diff;
pub mod error;
pub mod introspection;
pub mod link;
pub mod normalize;
pub mod subgraph;

pub use crate::context::GraphQLRequest;
pub use crate::context::HttpTestContext;
pub use crate::context::TestContext;
pub use crate::diff::DiffOptions;
pub use crate::diff::SchemaDiff;
pub use crate::diff::diff;
pub use crate::error::CheckError;
pub use crate::error::LoadError;
pub use crate::error::NormalizeError;
pub use crate::error::TransportError;
pub use crate::introspection::IntrospectionCheck;
pub use crate::introspection::PRODUCTS_SCHEMA;
pub use crate::normalize::normalize;
pub use crate::normalize::normalize_document;
pub use crate::subgraph::SubgraphSchema;
