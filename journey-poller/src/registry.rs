//! Route registry.
//!
//! The set of configured routes for one instance, keyed by route name.
//! Built once at startup and never mutated afterwards.

use indexmap::IndexMap;

use crate::domain::{RouteConfig, ValidationError};

/// Read-only mapping from route name to [`RouteConfig`].
///
/// Iteration follows configuration order.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: IndexMap<String, RouteConfig>,
}

impl RouteRegistry {
    /// Build a registry, validating every route.
    ///
    /// Routes are keyed by [`RouteConfig::name`]. Duplicate names are the
    /// configuration layer's concern; here a later route replaces an earlier one.
    pub fn new(routes: impl IntoIterator<Item = RouteConfig>) -> Result<Self, ValidationError> {
        let mut map = IndexMap::new();
        for route in routes {
            if route.name.trim().is_empty() {
                return Err(ValidationError::EmptyRouteName);
            }
            route.validate()?;
            map.insert(route.name.clone(), route);
        }
        Ok(Self { routes: map })
    }

    pub fn get(&self, name: &str) -> Option<&RouteConfig> {
        self.routes.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteConfig> {
        self.routes.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Place;

    fn route(name: &str) -> RouteConfig {
        RouteConfig::new(
            name,
            Place::new("Perth Busport", "-31.951,115.853"),
            Place::new("Curtin University", "-32.005,115.894"),
        )
    }

    #[test]
    fn keeps_configuration_order() {
        let registry = RouteRegistry::new([route("work"), route("gym"), route("home")]).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["work", "gym", "home"]);
        assert_eq!(registry.get("gym").unwrap().name, "gym");
        assert!(registry.get("beach").is_none());
    }

    #[test]
    fn rejects_invalid_route() {
        let mut bad = route("bad");
        bad.from.location = "  ".into();

        let err = RouteRegistry::new([route("ok"), bad]).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("from_location"));
    }

    #[test]
    fn rejects_blank_name() {
        let err = RouteRegistry::new([route(" ")]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyRouteName);
    }

    #[test]
    fn empty_registry() {
        let registry = RouteRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.iter().count(), 0);
    }
}
