//! Report data model.
//!
//! A report is the canonical snapshot of one module's public surface. Every
//! category is a name-keyed map, so two reports of the same module taken at
//! different versions line up key by key when handed to the tree diff.
//! Maps are `BTreeMap`s to keep serialization order stable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category keys of a module report.
pub const FUNCTIONS: &str = "functions";
pub const CLASSES: &str = "classes";
pub const EXCEPTIONS: &str = "exceptions";
pub const OTHERS: &str = "others";
pub const OPERATIONS: &str = "operations";
pub const MODELS: &str = "models";

/// Keys inside class and model entries.
pub const METHODS: &str = "methods";
pub const ATTRIBUTES: &str = "attributes";
pub const PARAMETERS: &str = "parameters";
pub const METADATA: &str = "metadata";

/// Model categories under `models`.
pub const MODEL_MODELS: &str = "models";
pub const MODEL_ENUMS: &str = "enums";
pub const MODEL_EXCEPTIONS: &str = "exceptions";

/// One parameter of a callable.
///
/// Variadic parameters carry their arity in the name: `*args`, `**kwargs`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, default: Option<Value>) -> Self {
        Self {
            name: name.into(),
            default,
        }
    }
}

/// Name and ordered parameters of a callable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub parameters: Vec<ParameterSpec>,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>, parameters: Vec<ParameterSpec>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

/// Marker for a callable whose parameters could not be read.
///
/// Serializes as an empty mapping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnknownSignature {}

/// The signature slot of a function or method.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Signature {
    Known(FunctionSignature),
    Unknown(UnknownSignature),
}

impl Signature {
    pub fn unknown() -> Self {
        Signature::Unknown(UnknownSignature {})
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Signature::Unknown(_))
    }
}

impl From<Option<FunctionSignature>> for Signature {
    fn from(signature: Option<FunctionSignature>) -> Self {
        signature.map_or_else(Signature::unknown, Signature::Known)
    }
}

/// A symbol defined elsewhere and re-exported by the inspected module.
///
/// Only the origin is recorded so that internal changes in the defining
/// module are not reported against the re-exporting one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportedSymbol {
    pub names: String,
    #[serde(rename = "type")]
    pub type_repr: Value,
    pub source: String,
}

/// A class or exception class.
///
/// Exceptions only carry `name` and `baseclasses`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassSignature {
    pub name: String,
    pub baseclasses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<BTreeMap<String, Signature>>,
}

impl ClassSignature {
    /// Reduced form used for exception classes.
    pub fn exception(name: impl Into<String>, baseclasses: Vec<String>) -> Self {
        Self {
            name: name.into(),
            baseclasses,
            attributes: None,
            methods: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionEntry {
    Imported(ImportedSymbol),
    Local(Signature),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassEntry {
    Imported(ImportedSymbol),
    Local(ClassSignature),
}

/// An operation group: a service-client-like class of operations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationGroup {
    pub name: String,
    #[serde(default)]
    pub functions: BTreeMap<String, Signature>,
}

/// Discriminator of a data model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    Model,
    Exception,
    Enum,
}

impl ModelKind {
    /// Category key under `models` for this kind.
    pub fn category(&self) -> &'static str {
        match self {
            ModelKind::Model => MODEL_MODELS,
            ModelKind::Exception => MODEL_EXCEPTIONS,
            ModelKind::Enum => MODEL_ENUMS,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterProperties {
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
    pub readonly: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParameter {
    pub name: String,
    pub properties: ParameterProperties,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSignature {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ModelKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, ModelParameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

/// Data models split by category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelGroups {
    #[serde(default)]
    pub models: BTreeMap<String, ModelSignature>,
    #[serde(default)]
    pub enums: BTreeMap<String, ModelSignature>,
    #[serde(default)]
    pub exceptions: BTreeMap<String, ModelSignature>,
}

impl ModelGroups {
    pub fn insert(&mut self, model: ModelSignature) {
        let target = match model.kind {
            ModelKind::Model => &mut self.models,
            ModelKind::Exception => &mut self.exceptions,
            ModelKind::Enum => &mut self.enums,
        };
        target.insert(model.name.clone(), model);
    }
}

/// Snapshot of one module's public surface.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleReport {
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionEntry>,
    #[serde(default)]
    pub classes: BTreeMap<String, ClassEntry>,
    #[serde(default)]
    pub exceptions: BTreeMap<String, ClassEntry>,
    #[serde(default)]
    pub others: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<BTreeMap<String, OperationGroup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelGroups>,
}

impl ModuleReport {
    /// Total number of named entries across all categories.
    pub fn entry_count(&self) -> usize {
        self.functions.len() + self.classes.len() + self.exceptions.len() + self.others.len()
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Reports of several modules keyed by fully qualified module name.
pub type AggregateReport = BTreeMap<String, ModuleReport>;
