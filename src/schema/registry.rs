//! Type declarations and the read-only registry built from them.

use std::collections::BTreeMap;

use super::{AttributeKind, CapabilityDescriptor, RelationshipSchema};
use crate::permission::{Action, CheckRegistry, PermissionEvaluator};
use crate::{Error, Result};

/// Declaration of one resource type.
///
/// ```rust
/// use jsonapi_graph::permission::Action;
/// use jsonapi_graph::schema::{AttributeKind, CapabilityDescriptor, RelationshipSchema, TypeSchema};
///
/// let property = TypeSchema::new("property")
///     .with_attribute("owner", AttributeKind::String)
///     .with_relationship(RelationshipSchema::to_one_any("myStuff", ["tractor", "smartphone"]))
///     .with_permission(Action::Read, "allow all")
///     .with_field_permission("owner", Action::Update, "deny all");
///
/// let tractor = TypeSchema::new("tractor")
///     .with_root_level(true)
///     .with_attribute("horsepower", AttributeKind::Integer)
///     .with_capabilities(CapabilityDescriptor::builder().filterable(false).sortable(false).build());
///
/// assert!(property.relationship("myStuff").unwrap().is_polymorphic());
/// assert!(!tractor.capabilities().filterable);
/// ```
#[derive(Debug, Clone)]
pub struct TypeSchema {
    name: String,
    root_level: bool,
    attributes: BTreeMap<String, AttributeKind>,
    relationships: BTreeMap<String, RelationshipSchema>,
    capabilities: CapabilityDescriptor,
    permissions: BTreeMap<Action, String>,
    field_permissions: BTreeMap<(String, Action), String>,
}

impl TypeSchema {
    /// Declares a root-level type with full capabilities and no permission rules.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root_level: true,
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
            capabilities: CapabilityDescriptor::default(),
            permissions: BTreeMap::new(),
            field_permissions: BTreeMap::new(),
        }
    }

    /// Sets whether the type is addressable at `/<type>`.
    ///
    /// Non-root types are reachable only through relationships.
    #[must_use]
    pub fn with_root_level(mut self, root_level: bool) -> Self {
        self.root_level = root_level;
        self
    }

    /// Declares an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, kind: AttributeKind) -> Self {
        self.attributes.insert(name.into(), kind);
        self
    }

    /// Declares a relationship.
    #[must_use]
    pub fn with_relationship(mut self, relationship: RelationshipSchema) -> Self {
        self.relationships.insert(relationship.name().to_string(), relationship);
        self
    }

    /// Sets the capability descriptor.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: CapabilityDescriptor) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Sets the type-level permission expression for `action`.
    #[must_use]
    pub fn with_permission(mut self, action: Action, expression: impl Into<String>) -> Self {
        self.permissions.insert(action, expression.into());
        self
    }

    /// Sets a field-level permission expression, overriding the type-level one.
    #[must_use]
    pub fn with_field_permission(
        mut self,
        field: impl Into<String>,
        action: Action,
        expression: impl Into<String>,
    ) -> Self {
        self.field_permissions.insert((field.into(), action), expression.into());
        self
    }

    /// Returns the type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the type is addressable at the root.
    #[inline]
    pub fn is_root_level(&self) -> bool {
        self.root_level
    }

    /// Returns the capability descriptor.
    pub fn capabilities(&self) -> CapabilityDescriptor {
        self.capabilities
    }

    /// Returns the declared kind of an attribute.
    pub fn attribute_kind(&self, name: &str) -> Option<AttributeKind> {
        self.attributes.get(name).copied()
    }

    /// Iterates over attribute names in declaration-independent (sorted) order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Returns a relationship declaration.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipSchema> {
        self.relationships.get(name)
    }

    /// Iterates over relationship declarations.
    pub fn relationships(&self) -> impl Iterator<Item = &RelationshipSchema> {
        self.relationships.values()
    }

    /// Returns `true` if `name` is an attribute or relationship.
    pub fn has_field(&self, name: &str) -> bool {
        self.attributes.contains_key(name) || self.relationships.contains_key(name)
    }

    fn validate(&self, registry: &BTreeMap<String, TypeSchema>) -> Result<()> {
        for name in self.attributes.keys() {
            if name == "id" {
                return Err(Error::configuration(format!(
                    "type '{}' declares a field named 'id'",
                    self.name
                )));
            }
            if self.relationships.contains_key(name) {
                return Err(Error::configuration(format!(
                    "type '{}' declares '{}' as both attribute and relationship",
                    self.name, name
                )));
            }
        }

        for relationship in self.relationships.values() {
            if relationship.name() == "id" {
                return Err(Error::configuration(format!(
                    "type '{}' declares a field named 'id'",
                    self.name
                )));
            }
            if relationship.targets().next().is_none() {
                return Err(Error::configuration(format!(
                    "relationship '{}.{}' has no target types",
                    self.name,
                    relationship.name()
                )));
            }
            for target in relationship.targets() {
                if !registry.contains_key(target) {
                    return Err(Error::configuration(format!(
                        "relationship '{}.{}' targets unknown type '{}'",
                        self.name,
                        relationship.name(),
                        target
                    )));
                }
            }
            if let Some(inverse) = relationship.inverse() {
                self.validate_inverse(relationship, inverse, registry)?;
            }
        }

        for (field, _) in self.field_permissions.keys() {
            if !self.has_field(field) {
                return Err(Error::configuration(format!(
                    "permission declared on unknown field '{}.{}'",
                    self.name, field
                )));
            }
        }

        Ok(())
    }

    fn validate_inverse(
        &self,
        relationship: &RelationshipSchema,
        inverse: &str,
        registry: &BTreeMap<String, TypeSchema>,
    ) -> Result<()> {
        let Some(target) = relationship.single_target() else {
            return Err(Error::configuration(format!(
                "polymorphic relationship '{}.{}' cannot declare an inverse",
                self.name,
                relationship.name()
            )));
        };
        let mirror = registry
            .get(target)
            .and_then(|t| t.relationship(inverse))
            .filter(|m| m.single_target() == Some(self.name.as_str()))
            .filter(|m| m.inverse().is_none_or(|back| back == relationship.name()));
        if mirror.is_none() {
            return Err(Error::configuration(format!(
                "relationship '{}.{}' declares inverse '{}.{}' which does not point back",
                self.name,
                relationship.name(),
                target,
                inverse
            )));
        }
        Ok(())
    }
}

/// The read-only set of type declarations, validated at build time.
///
/// ```rust
/// use jsonapi_graph::schema::{AttributeKind, RelationshipSchema, SchemaRegistry, TypeSchema};
///
/// let registry = SchemaRegistry::builder()
///     .register(TypeSchema::new("tractor").with_attribute("horsepower", AttributeKind::Integer))
///     .register(TypeSchema::new("smartphone").with_attribute("type", AttributeKind::String))
///     .register(
///         TypeSchema::new("property")
///             .with_relationship(RelationshipSchema::to_one_any("myStuff", ["tractor", "smartphone"])),
///     )
///     .build()
///     .unwrap();
///
/// assert!(registry.get("property").is_some());
/// assert_eq!(registry.len(), 3);
///
/// let broken = SchemaRegistry::builder()
///     .register(TypeSchema::new("property").with_relationship(RelationshipSchema::to_one("owner", "person")))
///     .build();
/// assert!(broken.is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    types: BTreeMap<String, TypeSchema>,
}

impl SchemaRegistry {
    /// Starts a registry builder.
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Returns the declaration of `resource_type`.
    pub fn get(&self, resource_type: &str) -> Option<&TypeSchema> {
        self.types.get(resource_type)
    }

    /// Returns the declaration of `resource_type`, or a 404 error.
    pub fn require(&self, resource_type: &str) -> Result<&TypeSchema> {
        self.get(resource_type)
            .ok_or_else(|| Error::not_found(format!("unknown type '{}'", resource_type)))
    }

    /// Iterates over every declared type.
    pub fn types(&self) -> impl Iterator<Item = &TypeSchema> {
        self.types.values()
    }

    /// Returns the number of declared types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Compiles every declared permission expression.
    ///
    /// Fails with a configuration error naming the offending type and field if
    /// any expression is malformed or names an unregistered check.
    pub fn compile_permissions(&self, checks: &CheckRegistry) -> Result<PermissionEvaluator> {
        let mut evaluator = PermissionEvaluator::new(checks.clone());
        for schema in self.types.values() {
            for (action, source) in &schema.permissions {
                evaluator.add_rule(&schema.name, None, *action, source).map_err(|e| {
                    Error::configuration(format!(
                        "{} permission on '{}': {}",
                        action, schema.name, e
                    ))
                    .with_source(e)
                })?;
            }
            for ((field, action), source) in &schema.field_permissions {
                evaluator.add_rule(&schema.name, Some(field.as_str()), *action, source).map_err(|e| {
                    Error::configuration(format!(
                        "{} permission on '{}.{}': {}",
                        action, schema.name, field, e
                    ))
                    .with_source(e)
                })?;
            }
        }
        Ok(evaluator)
    }
}

/// Collects type declarations for a [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    types: Vec<TypeSchema>,
}

impl SchemaRegistryBuilder {
    /// Adds a type declaration.
    #[must_use]
    pub fn register(mut self, schema: TypeSchema) -> Self {
        self.types.push(schema);
        self
    }

    /// Validates the declarations and builds the registry.
    pub fn build(self) -> Result<SchemaRegistry> {
        let mut types = BTreeMap::new();
        for schema in self.types {
            if schema.name.is_empty() || schema.name.contains('/') {
                return Err(Error::configuration(format!("invalid type name '{}'", schema.name)));
            }
            if types.contains_key(&schema.name) {
                return Err(Error::configuration(format!(
                    "type '{}' is registered twice",
                    schema.name
                )));
            }
            types.insert(schema.name.clone(), schema);
        }
        for schema in types.values() {
            schema.validate(&types)?;
        }
        tracing::debug!(types = types.len(), "schema registry built");
        Ok(SchemaRegistry { types })
    }
}
