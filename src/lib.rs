//! fieldgate - field-level edit authorization and change tracking
//!
//! Gates collaborative edits to games, developers and characters: a static
//! field registry with stable bit indices, bitmask allow checks with
//! field-precise denials, and the change-set and relation-identity extraction
//! used by edit history and undo.

pub mod authz;
pub mod bitmask;
pub mod diff;
pub mod errors;
pub mod permission_map;
pub mod registry;
pub mod relation;
pub mod settings;
pub mod web;

pub use authz::{
    authorize, build_authorizer, Actor, AuthorizationPolicy, Authorizer, AuthzError,
    BitsSelector, Decision, DeniedFields, PermissionResolver,
};
pub use bitmask::{has_bit, mask, Bitmask};
pub use diff::{pick_changes, ChangeSet};
pub use permission_map::{build_permission_map, get_editable_fields, PermissionMap};
pub use registry::{all_fields, bit_index_of, fields_of_group, PermissionEntity};
pub use relation::{extract_relation_id, extract_relation_key, RelationChange};
