//! Node naming conventions.
//!
//! Nodes are plain UTF-8 strings. The reserved name `"0"` denotes ground
//! and is never allocated a matrix row. Composite devices introduce
//! internal nodes following the `<purpose>@<id>` convention (for example
//! `@JV1` for the branch current of voltage source `V1`, or `be@Q1` for
//! the internal base-emitter node of transistor `Q1`); user-supplied
//! names should avoid the `@` character.

/// The reserved ground node name.
pub const GROUND: &str = "0";

/// Check whether a node name refers to ground.
pub fn is_ground(name: &str) -> bool {
    name == GROUND
}

/// Build the branch-current node name for a voltage-defining element.
pub fn branch_node(id: &str) -> String {
    format!("@J{id}")
}

/// Build an internal node name such as `be@Q1`.
pub fn internal_node(purpose: &str, id: &str) -> String {
    format!("{purpose}@{id}")
}
