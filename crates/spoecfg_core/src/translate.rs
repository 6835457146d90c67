//! Translation of document failures into engine errors.

use crate::error::{ConfError, Parent};
use spoecfg_document::DocumentError;

/// The object an operation was acting on, used to give errors context.
#[derive(Debug, Clone, Default)]
pub struct ObjectRef {
    /// Object id (section name, scope name, or directive index).
    pub id: String,
    /// Parent object, for nested objects.
    pub parent: Option<Parent>,
}

impl ObjectRef {
    /// A top-level object.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
        }
    }

    /// An object nested in `parent_kind parent_name`.
    pub fn nested(
        id: impl Into<String>,
        parent_kind: impl Into<String>,
        parent_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent: Some(Parent::new(parent_kind, parent_name)),
        }
    }
}

/// Maps a document failure to the engine's error taxonomy.
///
/// | document signal                  | engine error            |
/// |----------------------------------|-------------------------|
/// | section/scope missing, parent    | `ParentNotFound`        |
/// | section/scope missing, no parent | `ObjectNotFound`        |
/// | section/scope already exists     | `ObjectAlreadyExists`   |
/// | fetch failure                    | `ObjectNotFound`        |
/// | index out of range               | `ObjectIndexOutOfRange` |
///
/// Invalid names and directives are not remapped; like anything else they
/// are passed through as [`ConfError::Document`].
///
/// Anything else is passed through as [`ConfError::Document`].
pub fn translate(err: DocumentError, object: &ObjectRef) -> ConfError {
    match err {
        DocumentError::SectionMissing { .. } | DocumentError::ScopeMissing(_) => {
            match &object.parent {
                Some(parent) => ConfError::ParentNotFound {
                    parent: parent.clone(),
                },
                None => ConfError::object_not_found(object.id.clone()),
            }
        }
        DocumentError::SectionAlreadyExists { .. } | DocumentError::ScopeAlreadyExists(_) => {
            ConfError::ObjectAlreadyExists {
                id: object.id.clone(),
            }
        }
        DocumentError::Fetch { .. } => ConfError::ObjectNotFound {
            id: object.id.clone(),
            parent: object.parent.clone(),
        },
        DocumentError::IndexOutOfRange { .. } => ConfError::ObjectIndexOutOfRange {
            id: object.id.clone(),
            parent: object.parent.clone(),
        },
        other => ConfError::Document(other),
    }
}
