//! Reflection boundary between a built package and the report model.
//!
//! A [`Reflector`] answers one question: given a module of an installed
//! package, which symbols does it expose, of what kind, with which
//! signatures and base types. Everything downstream (extraction, diffing,
//! classification) only sees the types in this module and the report schema,
//! never the mechanism used to obtain them.
//!
//! The shipped implementation, [`python::PythonSourceReflector`], reads the
//! package's source tree with tree-sitter instead of importing it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReflectError;

mod helpers;
pub mod python;

pub use python::PythonSourceReflector;

/// Source of module surfaces.
pub trait Reflector {
    /// List every member bound in `module`, private ones included.
    fn inspect(&self, module: &str) -> Result<ModuleSurface, ReflectError>;

    /// List the direct child modules of a package, sorted by name.
    ///
    /// Plain modules have no children.
    fn children(&self, module: &str) -> Result<Vec<ModuleChild>, ReflectError>;
}

/// A direct child of a package.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleChild {
    /// Fully qualified module name.
    pub name: String,
    /// Whether the child is itself a package.
    pub is_package: bool,
}

/// Everything bound at module level.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModuleSurface {
    pub name: String,
    pub members: Vec<Member>,
}

impl ModuleSurface {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// One module-level binding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Member {
    /// Name the member is bound to in the module.
    pub name: String,
    /// Module that defines the object, for functions and classes.
    pub origin: Option<String>,
    pub kind: MemberKind,
}

impl Member {
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MemberKind {
    Module,
    Function(Callable),
    Class(ClassShape),
    Value(ObjectRepr),
}

/// A callable and its parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Callable {
    pub name: String,
    /// `None` when the parameter list cannot be read.
    pub params: Option<Vec<Param>>,
}

impl Callable {
    pub fn new(name: impl Into<String>, params: Option<Vec<Param>>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Positional,
    KeywordOnly,
    VarPositional,
    VarKeyword,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<ObjectRepr>,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamKind, default: Option<ObjectRepr>) -> Self {
        Self {
            name: name.into(),
            kind,
            default,
        }
    }

    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Positional, None)
    }
}

/// A class with its full member listing, inherited members included.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassShape {
    pub name: String,
    /// Names of the direct base classes, in declaration order.
    pub bases: Vec<String>,
    /// Whether the class derives from the platform base exception.
    pub is_exception: bool,
    /// Members sorted by name.
    pub members: Vec<ClassMember>,
    /// Declared serialization map, for generated data models.
    pub attribute_map: Option<Vec<MappedAttribute>>,
    /// Member names, for enumerations.
    pub enum_members: Option<Vec<String>>,
}

impl ClassShape {
    pub fn member(&self, name: &str) -> Option<&ClassMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassMember {
    pub name: String,
    pub kind: ClassMemberKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClassMemberKind {
    /// A plain function reached through the class.
    Function(Callable),
    /// Any other callable: bound class methods, nested classes.
    OtherCallable(Callable),
    /// A method provided by the platform itself; its implementation cannot
    /// change between package versions.
    Platform,
    /// A non-callable member.
    Attribute,
}

/// One entry of a generated model's attribute map.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MappedAttribute {
    pub name: String,
    pub type_name: String,
    pub required: bool,
    pub readonly: bool,
}

/// What is known about a runtime value.
///
/// This is the closed set of value kinds the report formatter accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObjectRepr {
    /// A JSON-native literal; Python `None` is `Null`.
    Json(Value),
    /// A class object, by qualified name.
    Class { qualname: String },
    /// An instance with its type and textual representation.
    Instance { type_name: String, repr: String },
    /// Anything else, by its string form.
    Text(String),
}
