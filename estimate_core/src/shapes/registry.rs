//! Shape lookup for the cutting-length calculator.
//!
//! A registry is a cheap snapshot of the built-in templates plus whatever
//! user shapes the estimation currently holds. Build a fresh one whenever
//! shapes may have changed; nothing is cached across estimations.

use once_cell::sync::Lazy;
use tracing::warn;

use super::{builtin_shapes, ShapeDefinition, STRAIGHT_ID};
use crate::errors::{CalcError, CalcResult, LookupPolicy};

static BUILTINS: Lazy<Vec<ShapeDefinition>> = Lazy::new(builtin_shapes);

/// Built-in straight bar, the fallback for unresolved references
fn straight() -> &'static ShapeDefinition {
    BUILTINS
        .iter()
        .find(|s| s.id == STRAIGHT_ID)
        .unwrap_or(&BUILTINS[0])
}

/// Built-in templates plus user-defined shapes.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    custom: Vec<ShapeDefinition>,
}

impl ShapeRegistry {
    /// Registry with only the built-in templates
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Registry over the built-ins and the given user shapes.
    pub fn with_custom(custom: impl IntoIterator<Item = ShapeDefinition>) -> Self {
        ShapeRegistry {
            custom: custom.into_iter().collect(),
        }
    }

    /// Add or replace a user shape by id
    pub fn insert(&mut self, shape: ShapeDefinition) {
        match self.custom.iter_mut().find(|s| s.id == shape.id) {
            Some(existing) => *existing = shape,
            None => self.custom.push(shape),
        }
    }

    /// Exact lookup. User shapes are searched first, then built-ins; ids
    /// match exactly, names case-insensitively as a second pass.
    pub fn get(&self, shape_ref: &str) -> Option<&ShapeDefinition> {
        let shape_ref = shape_ref.trim();
        self.iter()
            .find(|s| s.id == shape_ref)
            .or_else(|| self.iter().find(|s| s.name.eq_ignore_ascii_case(shape_ref)))
    }

    /// Resolve a reference, falling back to the straight bar when unknown.
    pub fn resolve(&self, shape_ref: &str) -> &ShapeDefinition {
        match self.get(shape_ref) {
            Some(shape) => shape,
            None => {
                warn!(shape_ref, "unknown shape reference, using straight bar");
                straight()
            }
        }
    }

    /// Resolve under an explicit policy: `Lenient` behaves like [`resolve`](Self::resolve),
    /// `Strict` reports [`CalcError::UnknownShape`].
    pub fn resolve_with(&self, shape_ref: &str, policy: LookupPolicy) -> CalcResult<&ShapeDefinition> {
        match policy {
            LookupPolicy::Lenient => Ok(self.resolve(shape_ref)),
            LookupPolicy::Strict => self
                .get(shape_ref)
                .ok_or_else(|| CalcError::unknown_shape(shape_ref)),
        }
    }

    /// All shapes, user-defined first
    pub fn iter(&self) -> impl Iterator<Item = &ShapeDefinition> {
        self.custom.iter().chain(BUILTINS.iter())
    }

    pub fn len(&self) -> usize {
        self.custom.len() + BUILTINS.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{BendDeductions, Segment, ShapeKind, STIRRUP_ID};

    fn crank() -> ShapeDefinition {
        ShapeDefinition::segment_based(
            "Crank",
            vec![Segment::new("A", 1.0)],
            BendDeductions::none(),
        )
        .with_id("crank-1")
    }

    #[test]
    fn test_builtin_lookup() {
        let registry = ShapeRegistry::builtin();
        assert_eq!(registry.resolve(STIRRUP_ID).kind, ShapeKind::Stirrup);
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_unknown_falls_back_to_straight() {
        let registry = ShapeRegistry::builtin();
        let shape = registry.resolve("does-not-exist");
        assert_eq!(shape.id, STRAIGHT_ID);
        assert_eq!(shape.kind, ShapeKind::Straight);
    }

    #[test]
    fn test_strict_policy_reports_unknown() {
        let registry = ShapeRegistry::builtin();
        let err = registry
            .resolve_with("does-not-exist", LookupPolicy::Strict)
            .unwrap_err();
        assert_eq!(err, CalcError::unknown_shape("does-not-exist"));
        assert!(registry.resolve_with(STIRRUP_ID, LookupPolicy::Strict).is_ok());
    }

    #[test]
    fn test_custom_shapes_visible() {
        let registry = ShapeRegistry::with_custom(vec![crank()]);
        assert_eq!(registry.resolve("crank-1").name, "Crank");
        assert_eq!(registry.resolve("crank").id, "crank-1");
    }

    #[test]
    fn test_insert_replaces_by_id() {
        let mut registry = ShapeRegistry::with_custom(vec![crank()]);
        let mut edited = crank();
        edited.name = "Crank v2".to_string();
        registry.insert(edited);
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.resolve("crank-1").name, "Crank v2");
    }
}
