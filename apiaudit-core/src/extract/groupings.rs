//! Operation groups and data models of generated client packages.
//!
//! Generated clients expose `<module>.operations`, a namespace of
//! service-client classes, and `<module>.models`, a namespace of
//! serializable data types. Only capitalised class members count.

use std::collections::BTreeMap;

use tracing::debug;

use super::function_signature;
use crate::error::{ReflectError, Result};
use crate::reflect::{ClassMemberKind, ClassShape, MemberKind, ModuleSurface, Reflector};
use crate::report::{
    ModelGroups, ModelKind, ModelParameter, ModelSignature, OperationGroup, ParameterProperties,
};

/// Inspect `<module>.<namespace>`; a missing namespace is empty.
fn inspect_namespace<R>(reflector: &R, module: &str, namespace: &str) -> Result<Option<ModuleSurface>>
where
    R: Reflector + ?Sized,
{
    let name = format!("{}.{}", module, namespace);
    match reflector.inspect(&name) {
        Ok(surface) => Ok(Some(surface)),
        Err(ReflectError::ModuleNotFound { .. }) => {
            debug!("No {} namespace in {}", namespace, module);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Capitalised classes of a namespace, by bound name.
fn public_classes(surface: &ModuleSurface) -> impl Iterator<Item = (&str, &ClassShape)> {
    surface.members.iter().filter_map(|member| match &member.kind {
        MemberKind::Class(shape) if member.name.starts_with(|c: char| c.is_uppercase()) => {
            Some((member.name.as_str(), shape))
        }
        _ => None,
    })
}

pub fn operation_groups<R>(reflector: &R, module: &str) -> Result<BTreeMap<String, OperationGroup>>
where
    R: Reflector + ?Sized,
{
    let mut groups = BTreeMap::new();
    let Some(surface) = inspect_namespace(reflector, module, "operations")? else {
        return Ok(groups);
    };

    for (name, shape) in public_classes(&surface) {
        let functions = shape
            .members
            .iter()
            .filter(|m| !m.name.starts_with('_'))
            .filter_map(|m| match &m.kind {
                ClassMemberKind::Function(callable) => {
                    Some((m.name.clone(), function_signature(callable)))
                }
                _ => None,
            })
            .collect();
        groups.insert(
            name.to_string(),
            OperationGroup {
                name: name.to_string(),
                functions,
            },
        );
    }
    Ok(groups)
}

/// Classify a model class: an attribute map makes a model, an exception
/// base an exception, anything else an enumeration.
pub fn model_signature(name: &str, shape: &ClassShape) -> ModelSignature {
    if let Some(attribute_map) = &shape.attribute_map {
        let parameters = attribute_map
            .iter()
            .map(|attribute| {
                (
                    attribute.name.clone(),
                    ModelParameter {
                        name: attribute.name.clone(),
                        properties: ParameterProperties {
                            type_name: attribute.type_name.clone(),
                            required: attribute.required,
                            readonly: attribute.readonly,
                        },
                    },
                )
            })
            .collect();
        return ModelSignature {
            name: name.to_string(),
            kind: ModelKind::Model,
            parameters: Some(parameters),
            values: None,
        };
    }

    if shape.is_exception {
        return ModelSignature {
            name: name.to_string(),
            kind: ModelKind::Exception,
            parameters: None,
            values: None,
        };
    }

    ModelSignature {
        name: name.to_string(),
        kind: ModelKind::Enum,
        parameters: None,
        values: Some(shape.enum_members.clone().unwrap_or_default()),
    }
}

pub fn model_groups<R>(reflector: &R, module: &str) -> Result<ModelGroups>
where
    R: Reflector + ?Sized,
{
    let mut groups = ModelGroups::default();
    let Some(surface) = inspect_namespace(reflector, module, "models")? else {
        return Ok(groups);
    };

    for (name, shape) in public_classes(&surface) {
        groups.insert(model_signature(name, shape));
    }
    Ok(groups)
}
