//! Query descriptors for entity lookups.
//!
//! An [`EntityQuery`] names an entity type, the scope the query is restricted
//! to, optional attribute filters, and an optional result limit. The store
//! gateway evaluates it as a single predicate; every query built through
//! [`EntityQuery::scoped`] carries the scope filter, and there is no way to
//! drop it afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{Entity, EntityRecord};
use crate::scope::EntityScope;

/// Which records a query may see, independent of its other filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryScope {
    /// Only records owned by a principal in the scope.
    Principals(EntityScope),
    /// Every record of the type. Reserved for backend internals such as the
    /// authenticator looking players up by email.
    Unrestricted,
}

/// A filter that narrows the set of records matched by a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeFilter {
    /// The attribute must exist and equal the value.
    Equals(String, Value),
}

impl AttributeFilter {
    fn matches(&self, record: &EntityRecord) -> bool {
        match self {
            Self::Equals(name, value) => record.attributes.get(name) == Some(value),
        }
    }
}

/// Describes one entity lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityQuery {
    entity_type: String,
    scope: QueryScope,
    filters: Vec<AttributeFilter>,
    limit: Option<usize>,
}

impl EntityQuery {
    /// Query records of `T` owned by a principal in `scope`.
    #[must_use]
    pub fn scoped<T: Entity>(scope: EntityScope) -> Self {
        Self::scoped_by_name(T::type_name(), scope)
    }

    /// Like [`EntityQuery::scoped`] but for an entity type known only by name.
    #[must_use]
    pub fn scoped_by_name(entity_type: impl Into<String>, scope: EntityScope) -> Self {
        Self {
            entity_type: entity_type.into(),
            scope: QueryScope::Principals(scope),
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Query every record of `T` regardless of ownership.
    #[must_use]
    pub fn unrestricted<T: Entity>() -> Self {
        Self {
            entity_type: T::type_name().to_string(),
            scope: QueryScope::Unrestricted,
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Add an attribute equality filter.
    #[must_use]
    pub fn filter_eq(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters
            .push(AttributeFilter::Equals(attribute.into(), value.into()));
        self
    }

    /// Stop after `limit` matches.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the queried entity type name.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the query's scope.
    #[must_use]
    pub fn scope(&self) -> &QueryScope {
        &self.scope
    }

    /// Returns the attribute filters.
    #[must_use]
    pub fn filters(&self) -> &[AttributeFilter] {
        &self.filters
    }

    /// Returns the result limit, if any.
    #[must_use]
    pub fn result_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns `true` if no record can ever match (an empty principal scope
    /// or a zero limit).
    #[must_use]
    pub fn is_vacuous(&self) -> bool {
        matches!(&self.scope, QueryScope::Principals(scope) if scope.is_empty())
            || self.limit == Some(0)
    }

    /// Evaluate the full predicate (type, scope and filters) against a record.
    #[must_use]
    pub fn matches(&self, record: &EntityRecord) -> bool {
        if record.entity_type != self.entity_type {
            return false;
        }

        let in_scope = match &self.scope {
            QueryScope::Principals(scope) => scope.admits(record),
            QueryScope::Unrestricted => true,
        };
        if !in_scope {
            return false;
        }

        self.filters.iter().all(|f| f.matches(record))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::json;

    use super::*;
    use crate::entity::EntityId;
    use crate::principal::PrincipalId;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Score {
        level: u32,
    }

    impl Entity for Score {
        fn type_name() -> &'static str {
            "Score"
        }
    }

    fn score(owner: &str, level: u32) -> EntityRecord {
        EntityRecord::from_entity(
            EntityId::generate(),
            BTreeSet::from([PrincipalId::new(owner)]),
            &Score { level },
        )
        .unwrap()
    }

    fn scope_of(ids: &[&str]) -> EntityScope {
        EntityScope::from_ids(ids.iter().map(|id| PrincipalId::new(*id)))
    }

    #[test]
    fn test_scoped_query_rejects_foreign_owner() {
        let q = EntityQuery::scoped::<Score>(scope_of(&["alice"]));
        assert!(q.matches(&score("alice", 1)));
        assert!(!q.matches(&score("bob", 1)));
    }

    #[test]
    fn test_type_must_match() {
        let q = EntityQuery::scoped_by_name("Other", scope_of(&["alice"]));
        assert!(!q.matches(&score("alice", 1)));
    }

    #[test]
    fn test_filters_are_conjunctive_with_scope() {
        let q = EntityQuery::scoped::<Score>(scope_of(&["alice"])).filter_eq("level", json!(3));
        assert!(q.matches(&score("alice", 3)));
        assert!(!q.matches(&score("alice", 2)));
        assert!(!q.matches(&score("bob", 3)));
    }

    #[test]
    fn test_unrestricted_ignores_owner() {
        let q = EntityQuery::unrestricted::<Score>();
        assert!(q.matches(&score("bob", 1)));
        assert!(!q.is_vacuous());
    }

    #[test]
    fn test_vacuous_queries() {
        assert!(EntityQuery::scoped::<Score>(EntityScope::empty()).is_vacuous());
        assert!(
            EntityQuery::scoped::<Score>(scope_of(&["alice"]))
                .limit(0)
                .is_vacuous()
        );
        assert!(!EntityQuery::scoped::<Score>(scope_of(&["alice"])).is_vacuous());
    }
}
