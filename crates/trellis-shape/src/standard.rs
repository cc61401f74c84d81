//! The standard shape set.
//!
//! Most hosts care about the same handful of part-level changes: physical
//! constants, resource inventories, render models, colliders. This module
//! registers that baseline so hosts and parts can agree on names without
//! each shipping their own catalog.
//!
//! ```text
//!  PhysicsChanged (abstract)
//!    ├── MassChanged(mass)
//!    ├── CenterOfMassShifted(offset)
//!    └── MomentsChanged
//!
//!  ResourcesChanged (abstract)
//!    ├── ResourceListChanged
//!    ├── ResourceMaxAmountChanged(resource, amount)
//!    └── ResourceInitialAmountChanged(resource, amount)
//!
//!  ModelChanged
//!  ColliderChanged
//! ```
//!
//! Hosts extend the returned catalog with their own shapes before handing
//! it to the bus; registration stays open until then.

use crate::{Catalog, ParamKind, ShapeDef};

/// Any physical constant of a part changed: mass, center of mass, moments
/// of inertia. Abstract — send one of its children.
pub const PHYSICS_CHANGED: &str = "PhysicsChanged";

/// A part's mass changed. Parameter: the new mass.
pub const MASS_CHANGED: &str = "MassChanged";

/// A part's center of mass moved. Parameter: the new offset.
pub const CENTER_OF_MASS_SHIFTED: &str = "CenterOfMassShifted";

/// A part's moments of inertia changed.
pub const MOMENTS_CHANGED: &str = "MomentsChanged";

/// A part's resource inventory changed in some way. Abstract — send one of
/// its children.
pub const RESOURCES_CHANGED: &str = "ResourcesChanged";

/// Resources were added to or removed from a part.
pub const RESOURCE_LIST_CHANGED: &str = "ResourceListChanged";

/// The capacity of one resource changed. Parameters: resource name, new
/// maximum.
pub const RESOURCE_MAX_AMOUNT_CHANGED: &str = "ResourceMaxAmountChanged";

/// The starting fill of one resource changed (editor only in most hosts).
/// Parameters: resource name, new amount.
pub const RESOURCE_INITIAL_AMOUNT_CHANGED: &str = "ResourceInitialAmountChanged";

/// A part's render model changed.
pub const MODEL_CHANGED: &str = "ModelChanged";

/// A part's collider changed.
pub const COLLIDER_CHANGED: &str = "ColliderChanged";

/// Builds a catalog preloaded with the standard shapes.
///
/// # Example
///
/// ```
/// use trellis_shape::standard;
///
/// let catalog = standard::standard_catalog();
/// let mass = catalog.resolve(standard::MASS_CHANGED).unwrap();
/// let physics = catalog.resolve(standard::PHYSICS_CHANGED).unwrap();
///
/// assert!(catalog.is_abstract(physics));
/// assert_eq!(catalog.ancestors(mass).last(), Some(physics));
/// ```
#[must_use]
pub fn standard_catalog() -> Catalog {
    let mut catalog = Catalog::new();

    // Registration order matters: parents first. A failure here is a defect
    // in this module, not a runtime condition.
    let defs = [
        ShapeDef::new(PHYSICS_CHANGED).abstract_only(),
        ShapeDef::new(MASS_CHANGED)
            .with_parent(PHYSICS_CHANGED)
            .with_param("mass", ParamKind::Float),
        ShapeDef::new(CENTER_OF_MASS_SHIFTED)
            .with_parent(PHYSICS_CHANGED)
            .with_param("offset", ParamKind::Any),
        ShapeDef::new(MOMENTS_CHANGED).with_parent(PHYSICS_CHANGED),
        ShapeDef::new(RESOURCES_CHANGED).abstract_only(),
        ShapeDef::new(RESOURCE_LIST_CHANGED).with_parent(RESOURCES_CHANGED),
        ShapeDef::new(RESOURCE_MAX_AMOUNT_CHANGED)
            .with_parent(RESOURCES_CHANGED)
            .with_param("resource", ParamKind::Text)
            .with_param("amount", ParamKind::Float),
        ShapeDef::new(RESOURCE_INITIAL_AMOUNT_CHANGED)
            .with_parent(RESOURCES_CHANGED)
            .with_param("resource", ParamKind::Text)
            .with_param("amount", ParamKind::Float),
        ShapeDef::new(MODEL_CHANGED),
        ShapeDef::new(COLLIDER_CHANGED),
    ];

    for def in defs {
        let name = def.name.clone();
        catalog
            .register(def)
            .unwrap_or_else(|e| panic!("standard shape {name} failed to register: {e}"));
    }

    catalog
}
