//! Entity generation from shape field tables
//!
//! Every field of a shape is resolved by exactly one rule, checked in this
//! order:
//!
//! 1. `Skip` leaves the field at its default
//! 2. `FromParameters` takes the next caller parameter, if any remain
//! 3. `CopyFrom(shape)` copies the same-named field of the first instance of
//!    `shape` in the context, if one is present
//! 4. `Random` fills text fields with [`random_string`]
//! 5. nested shapes reuse a context instance of that shape or are generated
//! 6. list fields get a single freshly generated element
//!
//! A field no rule applies to keeps its default.

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Entity, ShapeKind, TestData};
use crate::random::random_string;
use crate::shape::{Directive, FieldInfo, FieldKind, Shape, Value};

/// The rule chosen for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Skipped,
    Parameter,
    Copied(ShapeKind),
    Random,
    Nested(ShapeKind),
    NestedList(ShapeKind),
    Unset,
}

/// Pick the rule for `field` given the context and the number of unconsumed parameters
pub fn resolve(field: &FieldInfo, context: &[Entity], parameters_left: usize) -> Resolution {
    if field.has(Directive::Skip) {
        return Resolution::Skipped;
    }
    if field.has(Directive::FromParameters) && parameters_left > 0 {
        return Resolution::Parameter;
    }
    if let Some(source) = field.copy_source() {
        if find_in_context(context, source).is_some() {
            return Resolution::Copied(source);
        }
    }
    if field.has(Directive::Random) && field.kind == FieldKind::Text {
        return Resolution::Random;
    }
    match field.kind {
        FieldKind::Nested(kind) => Resolution::Nested(kind),
        FieldKind::List(kind) => Resolution::NestedList(kind),
        _ => Resolution::Unset,
    }
}

/// Generate a `T`, consulting `context` for copies and reuse.
///
/// Parameters are consumed left to right by `FromParameters` fields in
/// declaration order. A nested generation sees the parameters remaining at
/// that point, and whatever it consumes is not deducted from this call.
pub fn generate_with<T: Shape>(context: &[Entity], parameters: &[Value]) -> Result<T> {
    let mut instance = T::default();
    let mut remaining = parameters;

    for field in T::fields() {
        let resolution = resolve(&field.info(), context, remaining.len());
        match resolution {
            Resolution::Skipped | Resolution::Unset => {}
            Resolution::Parameter => {
                if let Some((first, rest)) = remaining.split_first() {
                    field.write(&mut instance, Some(first.clone()))?;
                    remaining = rest;
                }
            }
            Resolution::Copied(source) => {
                let value = copy_field(context, source, T::KIND, field.name())?;
                field.write(&mut instance, value)?;
            }
            Resolution::Random => {
                field.write(&mut instance, Some(Value::Text(random_string())))?;
            }
            Resolution::Nested(kind) => {
                let nested = reuse_or_generate(context, kind, remaining)?;
                field.write(&mut instance, Some(Value::Entity(nested)))?;
            }
            Resolution::NestedList(kind) => {
                // List elements are never reused from the context
                let element = generate_kind(kind, context, remaining)?;
                field.write(&mut instance, Some(Value::List(vec![element])))?;
            }
        }
    }

    debug!(
        "Generated {} ({} of {} parameter(s) consumed)",
        T::KIND.name(),
        parameters.len() - remaining.len(),
        parameters.len()
    );
    Ok(instance)
}

/// Generate a `T` with an empty context
pub fn generate<T: Shape>(parameters: &[Value]) -> Result<T> {
    generate_with(&[], parameters)
}

/// Generate an entity of a shape chosen at runtime
pub fn generate_kind(kind: ShapeKind, context: &[Entity], parameters: &[Value]) -> Result<Entity> {
    kind.generate(context, parameters)
}

/// Generate every [`TestData`] slot in declaration order.
///
/// Each slot is generated with the entities of the slots before it as
/// context, so later slots copy from and reuse earlier ones.
pub fn generate_all() -> Result<TestData> {
    TestData::validate_schema()?;

    let mut data = TestData::default();
    let mut context: Vec<Entity> = Vec::with_capacity(TestData::SLOTS.len());
    for (_, kind) in TestData::SLOTS {
        let entity = generate_kind(*kind, &context, &[])?;
        context.push(entity.clone());
        data.store(entity)?;
    }

    debug!("Generated test data with {} top-level entities", context.len());
    Ok(data)
}

/// Check every `CopyFrom` reference and the [`TestData`] slot table.
///
/// The same checks happen lazily during generation; this surfaces them
/// before any test runs.
pub fn validate_schema() -> Result<()> {
    TestData::validate_schema()?;

    for kind in ShapeKind::ALL {
        for field in kind.fields() {
            if let Some(source) = field.copy_source() {
                if !source.has_field(field.name) {
                    return Err(missing_copy_source(source, *kind, field.name));
                }
            }
        }
    }
    Ok(())
}

fn find_in_context(context: &[Entity], kind: ShapeKind) -> Option<&Entity> {
    context.iter().find(|entity| entity.kind() == kind)
}

fn reuse_or_generate(context: &[Entity], kind: ShapeKind, parameters: &[Value]) -> Result<Entity> {
    match find_in_context(context, kind) {
        Some(existing) => Ok(existing.clone()),
        None => generate_kind(kind, context, parameters),
    }
}

fn copy_field(context: &[Entity], source: ShapeKind, target: ShapeKind, name: &str) -> Result<Option<Value>> {
    let entity = find_in_context(context, source).ok_or_else(|| {
        Error::Schema(format!("No {} in context to copy into {}", source.name(), target.name()))
    })?;
    entity
        .field_value(name)
        .ok_or_else(|| missing_copy_source(source, target, name))
}

fn missing_copy_source(source: ShapeKind, target: ShapeKind, name: &str) -> Error {
    Error::Schema(format!(
        "{}.{} copies from {}, which has no field '{}'",
        target.name(),
        name,
        source.name(),
        name
    ))
}
