//! Declarative field tables for entity shapes
//!
//! Every entity shape publishes a static, ordered table of [`FieldSpec`]s
//! describing its fields: the JSON name, the value kind, the generation
//! directives and a pair of typed accessors erased behind [`Value`]. The
//! generator walks these tables instead of inspecting types at runtime.

use std::fmt;

use crate::error::{Error, Result};
use crate::model::{Entity, ShapeKind};
use crate::types::UserRole;

/// How the generator may populate a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Never populated automatically
    Skip,
    /// Filled with a fresh random string (text fields only)
    Random,
    /// Filled from the caller-supplied parameter list
    FromParameters,
    /// Copied from the identically-named field of an entity already in context
    CopyFrom(ShapeKind),
}

/// Value type held by a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Flag,
    Role,
    Nested(ShapeKind),
    List(ShapeKind),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => f.write_str("text"),
            FieldKind::Flag => f.write_str("flag"),
            FieldKind::Role => f.write_str("role"),
            FieldKind::Nested(kind) => write!(f, "{}", kind.name()),
            FieldKind::List(kind) => write!(f, "[{}]", kind.name()),
        }
    }
}

/// A type-erased field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Flag(bool),
    Role(UserRole),
    Entity(Entity),
    List(Vec<Entity>),
}

impl Value {
    /// Build a list value from entities of any shape
    pub fn list<I, E>(items: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Entity>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Short name of the variant, used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Flag(_) => "flag",
            Value::Role(_) => "role",
            Value::Entity(_) => "entity",
            Value::List(_) => "list",
        }
    }

    /// String form of a scalar value, suitable as a resource identifier
    pub fn as_identifier(&self) -> Option<String> {
        match self {
            Value::Text(text) => Some(text.clone()),
            Value::Flag(flag) => Some(flag.to_string()),
            Value::Role(role) => Some(role.to_string()),
            Value::Entity(_) | Value::List(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Flag(value)
    }
}

impl From<UserRole> for Value {
    fn from(value: UserRole) -> Self {
        Value::Role(value)
    }
}

impl From<Entity> for Value {
    fn from(value: Entity) -> Self {
        Value::Entity(value)
    }
}

/// Conversion between a concrete field type and [`Value`]
pub trait FieldValue: Sized {
    fn kind() -> FieldKind;
    fn into_value(self) -> Value;
    /// Returns the rejected value when it does not fit this type
    fn from_value(value: Value) -> std::result::Result<Self, Value>;
}

impl FieldValue for String {
    fn kind() -> FieldKind {
        FieldKind::Text
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Text(text) => Ok(text),
            other => Err(other),
        }
    }
}

impl FieldValue for bool {
    fn kind() -> FieldKind {
        FieldKind::Flag
    }

    fn into_value(self) -> Value {
        Value::Flag(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Flag(flag) => Ok(flag),
            other => Err(other),
        }
    }
}

impl FieldValue for UserRole {
    fn kind() -> FieldKind {
        FieldKind::Role
    }

    fn into_value(self) -> Value {
        Value::Role(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Role(role) => Ok(role),
            other => Err(other),
        }
    }
}

impl<T: Shape> FieldValue for Vec<T> {
    fn kind() -> FieldKind {
        FieldKind::List(T::KIND)
    }

    fn into_value(self) -> Value {
        Value::list(self)
    }

    fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::List(items) => items
                .into_iter()
                .map(T::try_from)
                .collect::<std::result::Result<Vec<_>, Entity>>()
                .map_err(Value::Entity),
            other => Err(other),
        }
    }
}

/// Type-erased view of a [`FieldSpec`], shared by every shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldInfo {
    pub owner: &'static str,
    pub name: &'static str,
    pub kind: FieldKind,
    pub directives: &'static [Directive],
}

impl FieldInfo {
    pub fn has(&self, directive: Directive) -> bool {
        self.directives.contains(&directive)
    }

    /// Shape named by a `CopyFrom` directive, if any
    pub fn copy_source(&self) -> Option<ShapeKind> {
        self.directives.iter().find_map(|d| match d {
            Directive::CopyFrom(kind) => Some(*kind),
            _ => None,
        })
    }
}

type Getter<S> = Box<dyn Fn(&S) -> Option<Value> + Send + Sync>;
type Setter<S> = Box<dyn Fn(&mut S, Option<Value>) -> std::result::Result<(), Value> + Send + Sync>;

/// One row of a shape's field table
pub struct FieldSpec<S> {
    owner: &'static str,
    name: &'static str,
    kind: FieldKind,
    directives: Vec<Directive>,
    get: Getter<S>,
    set: Setter<S>,
}

impl<S: 'static> FieldSpec<S> {
    pub fn new<V: FieldValue + 'static>(
        owner: &'static str,
        name: &'static str,
        directives: Vec<Directive>,
        get: fn(&S) -> Option<V>,
        set: fn(&mut S, Option<V>),
    ) -> Self {
        Self {
            owner,
            name,
            kind: V::kind(),
            directives,
            get: Box::new(move |shape| get(shape).map(FieldValue::into_value)),
            set: Box::new(move |shape, value| {
                let converted = match value {
                    Some(value) => Some(V::from_value(value)?),
                    None => None,
                };
                set(shape, converted);
                Ok(())
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn info(&'static self) -> FieldInfo {
        FieldInfo {
            owner: self.owner,
            name: self.name,
            kind: self.kind,
            directives: &self.directives,
        }
    }

    pub fn has(&self, directive: Directive) -> bool {
        self.directives.contains(&directive)
    }

    /// Shape named by a `CopyFrom` directive, if any
    pub fn copy_source(&self) -> Option<ShapeKind> {
        self.directives.iter().find_map(|d| match d {
            Directive::CopyFrom(kind) => Some(*kind),
            _ => None,
        })
    }

    pub fn read(&self, shape: &S) -> Option<Value> {
        (self.get)(shape)
    }

    /// Store `value` into the field; a value of the wrong type is a schema bug
    pub fn write(&self, shape: &mut S, value: Option<Value>) -> Result<()> {
        (self.set)(shape, value).map_err(|rejected| Error::FieldType {
            shape: self.owner,
            field: self.name,
            expected: self.kind.to_string(),
            found: rejected.describe(),
        })
    }
}

impl<S> fmt::Debug for FieldSpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("directives", &self.directives)
            .finish()
    }
}

/// An entity record the generator can build
pub trait Shape:
    Default
    + Clone
    + fmt::Debug
    + PartialEq
    + Send
    + Sync
    + Into<Entity>
    + TryFrom<Entity, Error = Entity>
    + 'static
{
    const KIND: ShapeKind;

    /// Field table in declaration order
    fn fields() -> &'static [FieldSpec<Self>];

    fn field(name: &str) -> Option<&'static FieldSpec<Self>> {
        Self::fields().iter().find(|f| f.name() == name)
    }
}

/// Build a [`FieldSpec`] row for a named struct field.
///
/// `field!(Project, "id" => id, Directive::Random)`
macro_rules! field {
    ($shape:ty, $name:literal => $field:ident $(, $directive:expr)* $(,)?) => {
        $crate::shape::FieldSpec::new(
            stringify!($shape),
            $name,
            vec![$($directive),*],
            |s: &$shape| s.$field.clone(),
            |s: &mut $shape, v| s.$field = v,
        )
    };
}

pub(crate) use field;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Project, Role, Roles};

    #[test]
    fn test_field_lookup_by_name() {
        let field = Project::field("name").unwrap();
        assert_eq!(field.kind(), FieldKind::Text);
        assert!(field.has(Directive::Random));
        assert_eq!(field.copy_source(), Some(ShapeKind::NewProjectDescription));
        assert!(Project::field("missing").is_none());
    }

    #[test]
    fn test_write_rejects_mismatched_value() {
        let mut project = Project::default();
        let field = Project::field("id").unwrap();

        let err = field.write(&mut project, Some(Value::Flag(true))).unwrap_err();
        match err {
            Error::FieldType { shape, field, found, .. } => {
                assert_eq!(shape, "Project");
                assert_eq!(field, "id");
                assert_eq!(found, "flag");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(project.id, None);
    }

    #[test]
    fn test_list_values_round_through_entities() {
        let mut roles = Roles::default();
        let field = Roles::field("role").unwrap();
        assert_eq!(field.kind(), FieldKind::List(ShapeKind::Role));

        let role = Role {
            role_id: Some(UserRole::ProjectViewer),
            scope: Some("p:demo".to_string()),
        };
        field
            .write(&mut roles, Some(Value::list(vec![role.clone()])))
            .unwrap();

        assert_eq!(roles.role, Some(vec![role.clone()]));
        assert_eq!(field.read(&roles), Some(Value::list(vec![role])));
    }

    #[test]
    fn test_identifier_rendering() {
        assert_eq!(Value::from("abc").as_identifier().as_deref(), Some("abc"));
        assert_eq!(
            Value::from(UserRole::AgentManager).as_identifier().as_deref(),
            Some("AGENT_MANAGER")
        );
        assert_eq!(Value::List(vec![]).as_identifier(), None);
    }
}
