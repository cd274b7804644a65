//! Entity shapes exchanged with the server's REST API
//!
//! Each shape is a plain serde record with optional fields plus a static
//! field table (see [`crate::shape`]). [`ShapeKind`] and [`Entity`] give the
//! generator a closed, dynamically-dispatchable view over all of them.

use serde::Serialize;

use crate::error::Result;
use crate::shape::{FieldInfo, FieldKind, FieldSpec, FieldValue, Shape, Value};

mod auth;
mod build;
mod build_type;
mod project;
mod test_data;
mod user;

pub use auth::{AuthModule, AuthModules, ServerAuthSettings};
pub use build::Build;
pub use build_type::{BuildType, Properties, Property, Step, Steps};
pub use project::{NewProjectDescription, Project};
pub use test_data::TestData;
pub use user::{Role, Roles, User};

/// Locator of the server's root project
pub const ROOT_PROJECT_LOCATOR: &str = "_Root";

macro_rules! entity_registry {
    ($($shape:ident),+ $(,)?) => {
        /// Every entity shape the generator can build
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ShapeKind {
            $($shape),+
        }

        impl ShapeKind {
            pub const ALL: &'static [ShapeKind] = &[$(ShapeKind::$shape),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(ShapeKind::$shape => stringify!($shape)),+
                }
            }

            /// Field table of this shape in declaration order
            pub fn fields(self) -> Vec<FieldInfo> {
                match self {
                    $(ShapeKind::$shape => <$shape as Shape>::fields()
                        .iter()
                        .map(FieldSpec::info)
                        .collect()),+
                }
            }

            pub fn has_field(self, name: &str) -> bool {
                self.fields().iter().any(|f| f.name == name)
            }

            pub(crate) fn generate(self, context: &[Entity], parameters: &[Value]) -> Result<Entity> {
                match self {
                    $(ShapeKind::$shape => {
                        crate::generator::generate_with::<$shape>(context, parameters).map(Entity::from)
                    }),+
                }
            }
        }

        /// An instance of any entity shape
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum Entity {
            $($shape($shape)),+
        }

        impl Entity {
            pub fn kind(&self) -> ShapeKind {
                match self {
                    $(Entity::$shape(_) => ShapeKind::$shape),+
                }
            }

            /// `None` when the shape has no such field, `Some(None)` when it is unset
            pub fn field_value(&self, name: &str) -> Option<Option<Value>> {
                match self {
                    $(Entity::$shape(inner) => <$shape as Shape>::field(name).map(|f| f.read(inner))),+
                }
            }
        }

        $(
            impl From<$shape> for Entity {
                fn from(value: $shape) -> Self {
                    Entity::$shape(value)
                }
            }

            impl TryFrom<Entity> for $shape {
                type Error = Entity;

                fn try_from(entity: Entity) -> std::result::Result<Self, Entity> {
                    match entity {
                        Entity::$shape(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }

            impl FieldValue for $shape {
                fn kind() -> FieldKind {
                    FieldKind::Nested(ShapeKind::$shape)
                }

                fn into_value(self) -> Value {
                    Value::Entity(Entity::$shape(self))
                }

                fn from_value(value: Value) -> std::result::Result<Self, Value> {
                    match value {
                        Value::Entity(entity) => $shape::try_from(entity).map_err(Value::Entity),
                        other => Err(other),
                    }
                }
            }
        )+
    };
}

entity_registry!(
    NewProjectDescription,
    Project,
    User,
    Roles,
    Role,
    BuildType,
    Steps,
    Step,
    Properties,
    Property,
    Build,
    ServerAuthSettings,
    AuthModules,
    AuthModule,
);

/// Identifiers the server may send either as JSON strings or numbers
pub(crate) mod id_format {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    pub fn serialize<S: Serializer>(id: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.serialize_str(id),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }))
    }
}
