pub mod engine;
pub mod errors;
pub mod loader;
pub mod resolver;
pub mod types;
pub mod web;

pub use engine::{authorize, build_authorizer, decide, Authorizer};
pub use errors::AuthzError;
pub use resolver::{GroupGrantResolver, PermissionResolver, StaticResolver};
pub use types::{Actor, AuthorizationPolicy, BitsSelector, Decision, DeniedFields};
