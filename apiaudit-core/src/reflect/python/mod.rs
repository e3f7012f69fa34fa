//! Reflector over an installed Python source tree.
//!
//! Modules are located under a list of search roots the same way the import
//! system does (`a/b/c/__init__.py`, then `a/b/c.py`, then namespace
//! directories) and parsed with tree-sitter. Names are resolved through
//! imports, relative ones included, to the module that defines them, so a
//! re-exported class reports its real origin.
//!
//! Anything outside the roots is opaque. A base class that cannot be
//! resolved is a platform class when it is a builtin or comes from a handful
//! of standard library modules, and unknown otherwise.

mod builtins;
pub mod syntax;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ignore::WalkBuilder;
use serde_json::Value;
use tracing::{debug, trace};

use self::builtins::{
    is_builtin_class, is_enum_base, is_exception_name, is_platform_path, last_segment,
};
use self::syntax::{ClassDef, Expr, FunctionDef, ModulePath, Statement, SyntaxModule, SyntaxParam};
use super::{
    Callable, ClassMember, ClassMemberKind, ClassShape, Member, MemberKind, MappedAttribute,
    ModuleChild, ModuleSurface, ObjectRepr, Param, ParamKind, Reflector,
};
use crate::error::ReflectError;

/// A parsed module with the facts needed to resolve relative imports.
#[derive(Debug)]
struct ParsedModule {
    name: String,
    is_package: bool,
    syntax: SyntaxModule,
}

/// Where a module lives on disk.
#[derive(Debug)]
enum Location {
    Module(PathBuf),
    Package { init: PathBuf, dir: PathBuf },
    Namespace(Vec<PathBuf>),
}

/// A class defined in source.
#[derive(Clone, Debug)]
struct ClassRef {
    module: String,
    /// Dotted path of the class inside its module.
    qualname: String,
    def: ClassDef,
}

impl ClassRef {
    fn full_name(&self) -> String {
        format!("{}.{}", self.module, self.qualname)
    }

    fn nested(&self, def: &ClassDef) -> ClassRef {
        ClassRef {
            module: self.module.clone(),
            qualname: format!("{}.{}", self.qualname, def.name),
            def: def.clone(),
        }
    }
}

/// What a name refers to after following imports.
#[derive(Clone, Debug)]
enum Resolved {
    Module(String),
    Function { origin: String, def: FunctionDef },
    Class(ClassRef),
    /// A builtin class.
    Builtin(String),
    /// A name from a module outside the search roots, by dotted path.
    External(String),
    Value(ObjectRepr),
}

/// One step of the approximated method resolution order.
#[derive(Clone, Debug)]
enum MroEntry {
    Source(ClassRef),
    /// Builtin or standard library class.
    Platform(String),
    /// Class from outside the roots whose members are unknown.
    Unknown(String),
}

impl MroEntry {
    fn name(&self) -> String {
        match self {
            MroEntry::Source(class) => class.def.name.clone(),
            MroEntry::Platform(path) | MroEntry::Unknown(path) => last_segment(path).to_string(),
        }
    }
}

/// Outcome of looking for a constructor along the resolution order.
enum Constructor {
    Source { module: String, def: FunctionDef },
    Platform,
    Unknown,
}

/// Stack of `(module, name)` lookups in progress, guarding import cycles.
type LookupStack = Vec<(String, String)>;

/// [`Reflector`] reading Python sources under a set of search roots.
pub struct PythonSourceReflector {
    roots: Vec<PathBuf>,
    cache: Mutex<HashMap<String, Arc<ParsedModule>>>,
}

impl PythonSourceReflector {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, Arc<ParsedModule>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Find a module under the search roots.
    ///
    /// Regular packages and modules win over namespace directories, which
    /// are merged across roots.
    fn locate(&self, module: &str) -> Option<Location> {
        if !is_module_name(module) {
            return None;
        }
        let relative: PathBuf = module.split('.').collect();
        let mut namespace = Vec::new();

        for root in &self.roots {
            let dir = root.join(&relative);
            let init = dir.join("__init__.py");
            if init.is_file() {
                return Some(Location::Package { init, dir });
            }
            let file = dir.with_extension("py");
            if file.is_file() {
                return Some(Location::Module(file));
            }
            if dir.is_dir() {
                namespace.push(dir);
            }
        }

        if namespace.is_empty() {
            None
        } else {
            Some(Location::Namespace(namespace))
        }
    }

    fn exists(&self, module: &str) -> bool {
        self.cache().contains_key(module) || self.locate(module).is_some()
    }

    fn load(&self, module: &str) -> Result<Arc<ParsedModule>, ReflectError> {
        if let Some(parsed) = self.cache().get(module) {
            return Ok(Arc::clone(parsed));
        }

        let location = self
            .locate(module)
            .ok_or_else(|| ReflectError::ModuleNotFound {
                module: module.to_string(),
            })?;
        let (path, is_package) = match location {
            Location::Module(path) => (Some(path), false),
            Location::Package { init, .. } => (Some(init), true),
            Location::Namespace(_) => (None, true),
        };

        let syntax = match path {
            Some(path) => {
                let source =
                    fs::read_to_string(&path).map_err(|source| ReflectError::Unreadable {
                        module: module.to_string(),
                        path: path.clone(),
                        source,
                    })?;
                syntax::parse(&source).map_err(|message| ReflectError::Parse {
                    module: module.to_string(),
                    message,
                })?
            }
            None => SyntaxModule::default(),
        };
        trace!("Parsed module {} ({} statements)", module, syntax.statements.len());

        let parsed = Arc::new(ParsedModule {
            name: module.to_string(),
            is_package,
            syntax,
        });
        self.cache()
            .insert(module.to_string(), Arc::clone(&parsed));
        Ok(parsed)
    }

    /// Resolve `name` as bound in `module`. `None` when the module does not
    /// bind it or the lookup loops back on itself.
    fn lookup(&self, module: &str, name: &str, stack: &mut LookupStack) -> Option<Resolved> {
        let key = (module.to_string(), name.to_string());
        if stack.contains(&key) {
            debug!("Import cycle while resolving {}.{}", module, name);
            return None;
        }

        let parsed = match self.load(module) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Cannot resolve {}.{}: {}", module, name, e);
                return None;
            }
        };

        stack.push(key);
        let resolved = self.lookup_in(&parsed, name, stack);
        stack.pop();

        resolved.or_else(|| {
            let submodule = format!("{}.{}", module, name);
            (parsed.is_package && self.exists(&submodule)).then_some(Resolved::Module(submodule))
        })
    }

    fn lookup_in(
        &self,
        parsed: &ParsedModule,
        name: &str,
        stack: &mut LookupStack,
    ) -> Option<Resolved> {
        for statement in parsed.syntax.statements.iter().rev() {
            match statement {
                Statement::Wildcard(path) => {
                    let Some(target) = absolute_module(parsed, path) else {
                        continue;
                    };
                    let mut visited = HashSet::new();
                    if self.exports(&target, &mut visited).contains(name) {
                        if let Some(resolved) = self.lookup(&target, name, stack) {
                            return Some(resolved);
                        }
                    }
                }
                statement if statement.bound_name() == Some(name) => {
                    return self.resolve_statement(parsed, statement, stack);
                }
                _ => {}
            }
        }
        None
    }

    fn resolve_statement(
        &self,
        parsed: &ParsedModule,
        statement: &Statement,
        stack: &mut LookupStack,
    ) -> Option<Resolved> {
        match statement {
            Statement::Function(def) => Some(Resolved::Function {
                origin: parsed.name.clone(),
                def: def.clone(),
            }),
            Statement::Class(def) => Some(Resolved::Class(ClassRef {
                module: parsed.name.clone(),
                qualname: def.name.clone(),
                def: def.clone(),
            })),
            Statement::Import(binding) => {
                let Some(target) = absolute_module(parsed, &binding.module) else {
                    return Some(Resolved::External(binding.module.dotted.clone()));
                };
                let Some(attr) = &binding.attr else {
                    return Some(Resolved::Module(target));
                };
                let path = format!("{}.{}", target, attr);
                if !self.exists(&target) {
                    return Some(Resolved::External(path));
                }
                // `from pkg import sub` falls back to the submodule.
                match self.lookup(&target, attr, stack) {
                    Some(resolved) => Some(resolved),
                    None if self.exists(&path) => Some(Resolved::Module(path)),
                    None => Some(Resolved::External(path)),
                }
            }
            Statement::Assign { value, .. } => Some(self.eval(&parsed.name, value, stack)),
            Statement::Wildcard(_) => None,
        }
    }

    /// Names a wildcard import of `module` binds: the literal `__all__` when
    /// there is one, every public name otherwise.
    fn exports(&self, module: &str, visited: &mut HashSet<String>) -> BTreeSet<String> {
        if !visited.insert(module.to_string()) {
            return BTreeSet::new();
        }
        let Ok(parsed) = self.load(module) else {
            return BTreeSet::new();
        };
        if let Some(all) = dunder_all(&parsed.syntax) {
            return all.into_iter().collect();
        }
        self.bound_names(&parsed, visited)
            .into_iter()
            .filter(|name| !name.starts_with('_'))
            .collect()
    }

    /// Every name bound at module level, wildcard imports expanded.
    fn bound_names(&self, parsed: &ParsedModule, visited: &mut HashSet<String>) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for statement in &parsed.syntax.statements {
            match statement {
                Statement::Wildcard(path) => {
                    if let Some(target) = absolute_module(parsed, path) {
                        names.extend(self.exports(&target, visited));
                    }
                }
                statement => {
                    if let Some(name) = statement.bound_name() {
                        names.insert(name.to_string());
                    }
                }
            }
        }
        names
    }

    /// Resolve a possibly dotted name in the scope of `module`.
    fn resolve_name(&self, module: &str, dotted: &str, stack: &mut LookupStack) -> Option<Resolved> {
        let mut parts = dotted.split('.');
        let first = parts.next()?;
        let mut current = match self.lookup(module, first, stack) {
            Some(resolved) => resolved,
            None if is_builtin_class(first) => Resolved::Builtin(first.to_string()),
            None => return None,
        };

        for part in parts {
            current = match current {
                Resolved::Module(m) => match self.lookup(&m, part, stack) {
                    Some(resolved) => resolved,
                    None => Resolved::External(format!("{}.{}", m, part)),
                },
                Resolved::External(path) => Resolved::External(format!("{}.{}", path, part)),
                Resolved::Class(class) => {
                    let nested = class.def.body.iter().rev().find_map(|s| match s {
                        Statement::Class(def) if def.name == part => Some(class.nested(def)),
                        _ => None,
                    });
                    match nested {
                        Some(nested) => Resolved::Class(nested),
                        None => return Some(Resolved::Value(ObjectRepr::Text(dotted.to_string()))),
                    }
                }
                _ => return Some(Resolved::Value(ObjectRepr::Text(dotted.to_string()))),
            };
        }
        Some(current)
    }

    /// Evaluate an expression statically in the scope of `module`.
    fn eval(&self, module: &str, expr: &Expr, stack: &mut LookupStack) -> Resolved {
        match expr {
            Expr::Literal(value) => Resolved::Value(ObjectRepr::Json(value.clone())),
            Expr::Name(name) => self
                .resolve_name(module, name, stack)
                .unwrap_or_else(|| Resolved::Value(ObjectRepr::Text(name.clone()))),
            Expr::Call { callee, text } => {
                let target = callee
                    .as_deref()
                    .and_then(|c| self.resolve_name(module, c, stack));
                let type_name = match target {
                    Some(Resolved::Class(class)) => Some(class.full_name()),
                    Some(Resolved::Builtin(name)) if name == "object" => Some(name),
                    _ => None,
                };
                match type_name {
                    Some(type_name) => Resolved::Value(ObjectRepr::Instance {
                        repr: format!("<{} object>", type_name),
                        type_name,
                    }),
                    None => Resolved::Value(ObjectRepr::Text(text.clone())),
                }
            }
            Expr::Lambda => Resolved::Function {
                origin: module.to_string(),
                def: FunctionDef {
                    name: "<lambda>".to_string(),
                    params: None,
                    decorators: Vec::new(),
                },
            },
            Expr::Other(text) => Resolved::Value(ObjectRepr::Text(text.clone())),
        }
    }

    /// Runtime value of a resolved object, as a default or constant.
    fn repr(&self, resolved: &Resolved) -> ObjectRepr {
        match resolved {
            Resolved::Value(repr) => repr.clone(),
            Resolved::Class(class) => ObjectRepr::Class {
                qualname: class.full_name(),
            },
            Resolved::Builtin(name) => ObjectRepr::Class {
                qualname: name.clone(),
            },
            Resolved::Function { def, .. } => ObjectRepr::Instance {
                type_name: "function".to_string(),
                repr: format!("<function {}>", def.name),
            },
            Resolved::Module(name) => ObjectRepr::Instance {
                type_name: "module".to_string(),
                repr: format!("<module '{}'>", name),
            },
            Resolved::External(path) => ObjectRepr::Text(path.clone()),
        }
    }

    fn callable(
        &self,
        module: &str,
        name: &str,
        params: Option<&Vec<SyntaxParam>>,
        stack: &mut LookupStack,
    ) -> Callable {
        let params = params.map(|params| {
            params
                .iter()
                .map(|p| {
                    let default = p.default.as_ref().map(|d| {
                        let resolved = self.eval(module, d, stack);
                        self.repr(&resolved)
                    });
                    Param::new(p.name.clone(), p.kind, default)
                })
                .collect()
        });
        Callable::new(name, params)
    }

    fn resolve_base(&self, module: &str, base: &Expr, stack: &mut LookupStack) -> MroEntry {
        let resolved = match base {
            Expr::Name(name) => self.resolve_name(module, name, stack),
            _ => None,
        };
        match resolved {
            Some(Resolved::Class(class)) => MroEntry::Source(class),
            Some(Resolved::Builtin(name)) => MroEntry::Platform(name),
            Some(Resolved::External(path)) if is_platform_path(&path) => MroEntry::Platform(path),
            Some(Resolved::External(path)) => MroEntry::Unknown(path),
            _ => {
                let text = match base {
                    Expr::Name(name) => name.clone(),
                    Expr::Call { text, .. } | Expr::Other(text) => text.clone(),
                    Expr::Literal(value) => value.to_string(),
                    Expr::Lambda => "<lambda>".to_string(),
                };
                MroEntry::Unknown(text)
            }
        }
    }

    /// Depth-first, left-to-right walk of the base classes, each class once.
    fn mro(&self, class: &ClassRef, stack: &mut LookupStack) -> Vec<MroEntry> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.walk_bases(class, stack, &mut seen, &mut out);
        out
    }

    fn walk_bases(
        &self,
        class: &ClassRef,
        stack: &mut LookupStack,
        seen: &mut HashSet<String>,
        out: &mut Vec<MroEntry>,
    ) {
        if !seen.insert(class.full_name()) {
            return;
        }
        out.push(MroEntry::Source(class.clone()));
        for base in &class.def.bases {
            match self.resolve_base(&class.module, base, stack) {
                MroEntry::Source(base) => self.walk_bases(&base, stack, seen, out),
                MroEntry::Platform(path) => {
                    if seen.insert(path.clone()) {
                        out.push(MroEntry::Platform(path));
                    }
                }
                MroEntry::Unknown(path) => {
                    if seen.insert(path.clone()) {
                        out.push(MroEntry::Unknown(path));
                    }
                }
            }
        }
    }

    fn constructor(&self, mro: &[MroEntry]) -> Constructor {
        for entry in mro {
            match entry {
                MroEntry::Source(class) => {
                    let init = class.def.body.iter().rev().find_map(|s| match s {
                        Statement::Function(def) if def.name == "__init__" => Some(def.clone()),
                        _ => None,
                    });
                    if let Some(def) = init {
                        return Constructor::Source {
                            module: class.module.clone(),
                            def,
                        };
                    }
                }
                MroEntry::Unknown(_) => return Constructor::Unknown,
                MroEntry::Platform(_) => {}
            }
        }
        Constructor::Platform
    }

    /// Parameters of `cls(...)`: the constructor's minus `self`.
    fn class_call(&self, class: &ClassRef, stack: &mut LookupStack) -> Callable {
        let mro = self.mro(class, stack);
        let params = match self.constructor(&mro) {
            Constructor::Source { module, def } => self
                .callable(&module, &def.name, def.params.as_ref(), stack)
                .params
                .map(drop_first),
            Constructor::Platform => Some(Vec::new()),
            Constructor::Unknown => None,
        };
        Callable::new(class.def.name.clone(), params)
    }

    /// Members defined in one class body; later definitions win.
    fn body_members(&self, class: &ClassRef, stack: &mut LookupStack) -> BTreeMap<String, ClassMemberKind> {
        let mut members = BTreeMap::new();
        for statement in &class.def.body {
            let (name, kind) = match statement {
                Statement::Function(def) => (def.name.clone(), self.method_kind(class, def, stack)),
                Statement::Class(def) => (
                    def.name.clone(),
                    ClassMemberKind::OtherCallable(self.class_call(&class.nested(def), stack)),
                ),
                Statement::Assign { name, value } => {
                    let local = match value {
                        Expr::Name(target) => members.get(target).cloned(),
                        _ => None,
                    };
                    let kind = match local {
                        Some(kind) => kind,
                        None => match self.eval(&class.module, value, stack) {
                            Resolved::Function { origin, def } => ClassMemberKind::Function(
                                self.callable(&origin, &def.name, def.params.as_ref(), stack),
                            ),
                            Resolved::Class(target) => {
                                ClassMemberKind::OtherCallable(self.class_call(&target, stack))
                            }
                            Resolved::Builtin(_) => ClassMemberKind::Platform,
                            _ => ClassMemberKind::Attribute,
                        },
                    };
                    (name.clone(), kind)
                }
                Statement::Import(_) | Statement::Wildcard(_) => continue,
            };
            members.insert(name, kind);
        }
        members
    }

    fn method_kind(&self, class: &ClassRef, def: &FunctionDef, stack: &mut LookupStack) -> ClassMemberKind {
        let is_property = def.decorators.iter().any(|d| {
            matches!(
                d.as_str(),
                "property" | "cached_property" | "functools.cached_property" | "abc.abstractproperty"
            ) || d.ends_with(".setter")
                || d.ends_with(".getter")
                || d.ends_with(".deleter")
        });
        if is_property {
            return ClassMemberKind::Attribute;
        }

        let callable = self.callable(&class.module, &def.name, def.params.as_ref(), stack);
        if def.has_decorator("classmethod") {
            ClassMemberKind::OtherCallable(Callable::new(
                callable.name,
                callable.params.map(drop_first),
            ))
        } else {
            ClassMemberKind::Function(callable)
        }
    }

    /// Serialization map of a generated model, looked up along the MRO.
    fn attribute_map(&self, mro: &[MroEntry]) -> Option<Vec<MappedAttribute>> {
        let map = class_literal(mro, "_attribute_map")?;
        let validation = class_literal(mro, "_validation");

        let Some(Value::Object(map)) = map else {
            return Some(Vec::new());
        };
        let validation = match validation {
            Some(Some(Value::Object(validation))) => validation,
            _ => serde_json::Map::new(),
        };

        let attributes = map
            .iter()
            .map(|(name, conf)| {
                let rules = validation.get(name);
                let flag = |key: &str| {
                    rules
                        .and_then(|r| r.get(key))
                        .and_then(Value::as_bool)
                        .unwrap_or(false)
                };
                MappedAttribute {
                    name: name.clone(),
                    type_name: conf
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    required: flag("required"),
                    readonly: flag("readonly"),
                }
            })
            .collect();
        Some(attributes)
    }

    /// Public non-callable class attributes, in definition order.
    fn enum_members(&self, class: &ClassRef, members: &BTreeMap<String, ClassMemberKind>) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for statement in &class.def.body {
            if let Statement::Assign { name, .. } = statement {
                let is_value = matches!(members.get(name), Some(ClassMemberKind::Attribute));
                if is_value && !name.starts_with('_') && !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    fn class_shape(&self, class: &ClassRef, stack: &mut LookupStack) -> ClassShape {
        let mro = self.mro(class, stack);

        let mut bases: Vec<String> = class
            .def
            .bases
            .iter()
            .map(|base| self.resolve_base(&class.module, base, stack).name())
            .collect();
        if bases.is_empty() {
            bases.push("object".to_string());
        }

        let is_exception = mro.iter().any(|entry| match entry {
            MroEntry::Platform(path) | MroEntry::Unknown(path) => {
                is_exception_name(last_segment(path))
            }
            MroEntry::Source(_) => false,
        });
        let is_enum = mro.iter().any(|entry| match entry {
            MroEntry::Platform(path) | MroEntry::Unknown(path) => is_enum_base(last_segment(path)),
            MroEntry::Source(_) => false,
        });

        let mut members: BTreeMap<String, ClassMemberKind> = BTreeMap::new();
        let mut own = BTreeMap::new();
        for (idx, entry) in mro.iter().enumerate() {
            if let MroEntry::Source(base) = entry {
                let body = self.body_members(base, stack);
                if idx == 0 {
                    own = body.clone();
                }
                for (name, kind) in body {
                    members.entry(name).or_insert(kind);
                }
            }
        }

        let init = match self.constructor(&mro) {
            Constructor::Source { module, def } => {
                self.callable(&module, "__init__", def.params.as_ref(), stack)
            }
            Constructor::Platform => Callable::new(
                "__init__",
                Some(vec![
                    Param::positional("self"),
                    Param::new("args", ParamKind::VarPositional, None),
                    Param::new("kwargs", ParamKind::VarKeyword, None),
                ]),
            ),
            Constructor::Unknown => Callable::new("__init__", None),
        };
        members.insert("__init__".to_string(), ClassMemberKind::Function(init));

        ClassShape {
            name: class.def.name.clone(),
            bases,
            is_exception,
            attribute_map: self.attribute_map(&mro),
            enum_members: is_enum.then(|| self.enum_members(class, &own)),
            members: members
                .into_iter()
                .map(|(name, kind)| ClassMember { name, kind })
                .collect(),
        }
    }

    fn builtin_shape(name: &str) -> ClassShape {
        ClassShape {
            name: name.to_string(),
            bases: vec!["object".to_string()],
            is_exception: is_exception_name(name),
            ..Default::default()
        }
    }

    fn member(&self, name: String, resolved: Resolved, stack: &mut LookupStack) -> Member {
        let (origin, kind) = match resolved {
            Resolved::Module(_) => (None, MemberKind::Module),
            Resolved::Function { origin, def } => {
                let callable = self.callable(&origin, &def.name, def.params.as_ref(), stack);
                (Some(origin), MemberKind::Function(callable))
            }
            Resolved::Class(class) => {
                let shape = self.class_shape(&class, stack);
                (Some(class.module.clone()), MemberKind::Class(shape))
            }
            Resolved::Builtin(builtin) => (
                Some("builtins".to_string()),
                MemberKind::Class(Self::builtin_shape(&builtin)),
            ),
            other => (None, MemberKind::Value(self.repr(&other))),
        };
        Member { name, origin, kind }
    }
}

impl Reflector for PythonSourceReflector {
    fn inspect(&self, module: &str) -> Result<ModuleSurface, ReflectError> {
        let parsed = self.load(module)?;
        let names = self.bound_names(&parsed, &mut HashSet::from([module.to_string()]));

        let mut stack = LookupStack::new();
        let mut members = Vec::with_capacity(names.len());
        for name in names {
            match self.lookup(module, &name, &mut stack) {
                Some(resolved) => members.push(self.member(name, resolved, &mut stack)),
                None => debug!("Skipping unresolvable name {} in {}", name, module),
            }
        }

        Ok(ModuleSurface {
            name: module.to_string(),
            members,
        })
    }

    fn children(&self, module: &str) -> Result<Vec<ModuleChild>, ReflectError> {
        let location = self
            .locate(module)
            .ok_or_else(|| ReflectError::ModuleNotFound {
                module: module.to_string(),
            })?;
        let dirs = match location {
            Location::Module(_) => return Ok(Vec::new()),
            Location::Package { dir, .. } => vec![dir],
            Location::Namespace(dirs) => dirs,
        };

        let mut children: BTreeMap<String, bool> = BTreeMap::new();
        for dir in &dirs {
            for (name, is_package) in list_children(dir) {
                let entry = children.entry(name).or_insert(is_package);
                *entry |= is_package;
            }
        }

        Ok(children
            .into_iter()
            .map(|(name, is_package)| ModuleChild {
                name: format!("{}.{}", module, name),
                is_package,
            })
            .collect())
    }
}

/// Direct child modules of one directory.
fn list_children(dir: &Path) -> Vec<(String, bool)> {
    let mut builder = WalkBuilder::new(dir);
    builder
        .standard_filters(false)
        .max_depth(Some(1))
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut children = Vec::new();
    for entry in builder.build().filter_map(|e| e.ok()) {
        if entry.depth() != 1 {
            continue;
        }
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if is_identifier(name) && path.join("__init__.py").is_file() {
                children.push((name.to_string(), true));
            }
        } else if path.extension().and_then(|e| e.to_str()) == Some("py") {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem != "__init__" && is_identifier(stem) {
                children.push((stem.to_string(), false));
            }
        }
    }
    children
}

/// Absolute name of the module an import refers to.
fn absolute_module(parsed: &ParsedModule, path: &ModulePath) -> Option<String> {
    if path.level == 0 {
        return Some(path.dotted.clone());
    }
    let mut package: Vec<&str> = parsed.name.split('.').collect();
    if !parsed.is_package {
        package.pop();
    }
    for _ in 1..path.level {
        package.pop()?;
    }
    if package.is_empty() {
        return None;
    }
    let mut name = package.join(".");
    if !path.dotted.is_empty() {
        name.push('.');
        name.push_str(&path.dotted);
    }
    Some(name)
}

/// Literal `__all__` of a module.
fn dunder_all(module: &SyntaxModule) -> Option<Vec<String>> {
    module.statements.iter().rev().find_map(|s| match s {
        Statement::Assign {
            name,
            value: Expr::Literal(Value::Array(items)),
        } if name == "__all__" => Some(
            items
                .iter()
                .filter_map(|i| i.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    })
}

/// Last literal assigned to `name` in the first class along the MRO that
/// assigns it. The inner `None` means the assignment is not a literal.
fn class_literal(mro: &[MroEntry], name: &str) -> Option<Option<Value>> {
    mro.iter().find_map(|entry| {
        let MroEntry::Source(class) = entry else {
            return None;
        };
        class.def.body.iter().rev().find_map(|s| match s {
            Statement::Assign { name: n, value } if n == name => Some(match value {
                Expr::Literal(value) => Some(value.clone()),
                _ => None,
            }),
            _ => None,
        })
    })
}

fn drop_first(mut params: Vec<Param>) -> Vec<Param> {
    if params
        .first()
        .map(|p| p.kind == ParamKind::Positional)
        .unwrap_or(false)
    {
        params.remove(0);
    }
    params
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

fn is_module_name(module: &str) -> bool {
    !module.is_empty() && module.split('.').all(is_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sample_package() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "shop/__init__.py",
            r#"
from .core import Widget, make_widget as build
from .errors import *
from . import models
import os

VERSION = "1.0"
DEFAULT = Widget()
_private = 1
"#,
        );
        write(
            root,
            "shop/core.py",
            r#"
from enum import Enum
from msrest.serialization import Model

LIMIT = 3

class Base:
    kind = "base"

    def describe(self, verbose=False):
        pass

class Widget(Base):
    def __init__(self, width, height=LIMIT):
        self.width = width

    def resize(self, width):
        pass

    @property
    def area(self):
        return 0

    @classmethod
    def create(cls, name, *, strict=True):
        pass

    @staticmethod
    def helper(value):
        pass

    class Options:
        def __init__(self, flag=None):
            pass

class Plain:
    pass

class Remote(Model):
    pass

class Color(str, Enum):
    RED = "red"
    GREEN = "green"

    def label(self):
        return self.value

def make_widget(name, *args, size=None, **kwargs):
    pass
"#,
        );
        write(
            root,
            "shop/errors.py",
            r#"
__all__ = ["ShopError"]

class ShopError(Exception):
    pass

class HiddenError(ValueError):
    pass
"#,
        );
        write(
            root,
            "shop/models/__init__.py",
            r#"
from ._models import Pet

class Model:
    _attribute_map = {}

class Order(Model):
    _validation = {"id": {"required": True}, "etag": {"readonly": True}}
    _attribute_map = {
        "id": {"key": "id", "type": "str"},
        "etag": {"key": "etag", "type": "str"},
        "note": {"key": "note", "type": "str"},
    }
"#,
        );
        write(root, "shop/models/_models.py", "class Pet:\n    name = None\n");
        write(root, "shop/tests/__init__.py", "");
        write(root, "shop/notes.txt", "not a module");
        dir
    }

    fn reflector(dir: &TempDir) -> PythonSourceReflector {
        PythonSourceReflector::new(vec![dir.path().to_path_buf()])
    }

    fn class<'a>(surface: &'a ModuleSurface, name: &str) -> &'a ClassShape {
        match &surface.member(name).unwrap().kind {
            MemberKind::Class(shape) => shape,
            other => panic!("{} is not a class: {:?}", name, other),
        }
    }

    #[test]
    fn test_inspect_follows_imports_to_origin() {
        let dir = sample_package();
        let surface = reflector(&dir).inspect("shop").unwrap();

        let widget = surface.member("Widget").unwrap();
        assert_eq!(widget.origin.as_deref(), Some("shop.core"));

        let build = surface.member("build").unwrap();
        assert_eq!(build.origin.as_deref(), Some("shop.core"));
        let MemberKind::Function(callable) = &build.kind else {
            panic!("expected a function");
        };
        assert_eq!(callable.name, "make_widget");

        assert!(matches!(surface.member("models").unwrap().kind, MemberKind::Module));
        assert!(matches!(surface.member("os").unwrap().kind, MemberKind::Module));
        assert!(surface.member("_private").unwrap().is_private());
    }

    #[test]
    fn test_wildcard_import_respects_dunder_all() {
        let dir = sample_package();
        let surface = reflector(&dir).inspect("shop").unwrap();
        assert!(surface.member("ShopError").is_some());
        assert!(surface.member("HiddenError").is_none());
        assert!(class(&surface, "ShopError").is_exception);
    }

    #[test]
    fn test_values_are_evaluated() {
        let dir = sample_package();
        let surface = reflector(&dir).inspect("shop").unwrap();

        let MemberKind::Value(version) = &surface.member("VERSION").unwrap().kind else {
            panic!("expected a value");
        };
        assert_eq!(version, &ObjectRepr::Json(json!("1.0")));

        let MemberKind::Value(default) = &surface.member("DEFAULT").unwrap().kind else {
            panic!("expected a value");
        };
        assert_eq!(
            default,
            &ObjectRepr::Instance {
                type_name: "shop.core.Widget".to_string(),
                repr: "<shop.core.Widget object>".to_string(),
            }
        );
    }

    #[test]
    fn test_function_parameters_and_defaults() {
        let dir = sample_package();
        let surface = reflector(&dir).inspect("shop.core").unwrap();
        let MemberKind::Function(callable) = &surface.member("make_widget").unwrap().kind else {
            panic!("expected a function");
        };
        let params = callable.params.as_ref().unwrap();
        assert_eq!(params.len(), 4);
        assert_eq!(params[1].kind, ParamKind::VarPositional);
        assert_eq!(params[2].kind, ParamKind::KeywordOnly);
        assert_eq!(params[2].default, Some(ObjectRepr::Json(Value::Null)));
        assert_eq!(params[3].kind, ParamKind::VarKeyword);
    }

    #[test]
    fn test_class_members_include_inherited() {
        let dir = sample_package();
        let surface = reflector(&dir).inspect("shop.core").unwrap();
        let widget = class(&surface, "Widget");

        assert_eq!(widget.bases, vec!["Base"]);
        assert!(!widget.is_exception);
        assert!(matches!(widget.member("kind").unwrap().kind, ClassMemberKind::Attribute));
        assert!(matches!(widget.member("area").unwrap().kind, ClassMemberKind::Attribute));
        assert!(matches!(
            widget.member("describe").unwrap().kind,
            ClassMemberKind::Function(_)
        ));

        let ClassMemberKind::Function(init) = &widget.member("__init__").unwrap().kind else {
            panic!("expected __init__");
        };
        let init_params = init.params.as_ref().unwrap();
        assert_eq!(init_params[2].default, Some(ObjectRepr::Json(json!(3))));

        let ClassMemberKind::OtherCallable(create) = &widget.member("create").unwrap().kind else {
            panic!("expected a class method");
        };
        let names: Vec<_> = create.params.as_ref().unwrap().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "strict"]);

        let ClassMemberKind::Function(helper) = &widget.member("helper").unwrap().kind else {
            panic!("expected a static method");
        };
        assert_eq!(helper.params.as_ref().unwrap().len(), 1);

        let ClassMemberKind::OtherCallable(options) = &widget.member("Options").unwrap().kind else {
            panic!("expected a nested class");
        };
        assert_eq!(options.params.as_ref().unwrap()[0].name, "flag");
    }

    #[test]
    fn test_constructor_fallbacks() {
        let dir = sample_package();
        let surface = reflector(&dir).inspect("shop.core").unwrap();

        let plain = class(&surface, "Plain");
        assert_eq!(plain.bases, vec!["object"]);
        let ClassMemberKind::Function(init) = &plain.member("__init__").unwrap().kind else {
            panic!("expected __init__");
        };
        let names: Vec<_> = init.params.as_ref().unwrap().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["self", "args", "kwargs"]);

        let remote = class(&surface, "Remote");
        assert_eq!(remote.bases, vec!["Model"]);
        let ClassMemberKind::Function(init) = &remote.member("__init__").unwrap().kind else {
            panic!("expected __init__");
        };
        assert!(init.params.is_none());
    }

    #[test]
    fn test_enum_members() {
        let dir = sample_package();
        let surface = reflector(&dir).inspect("shop.core").unwrap();
        let color = class(&surface, "Color");
        assert_eq!(color.bases, vec!["str", "Enum"]);
        assert_eq!(
            color.enum_members,
            Some(vec!["RED".to_string(), "GREEN".to_string()])
        );
        assert!(class(&surface, "Widget").enum_members.is_none());
    }

    #[test]
    fn test_attribute_map_with_validation() {
        let dir = sample_package();
        let surface = reflector(&dir).inspect("shop.models").unwrap();

        let order = class(&surface, "Order");
        let map = order.attribute_map.as_ref().unwrap();
        let id = map.iter().find(|a| a.name == "id").unwrap();
        assert!(id.required);
        assert_eq!(id.type_name, "str");
        let etag = map.iter().find(|a| a.name == "etag").unwrap();
        assert!(etag.readonly && !etag.required);

        assert_eq!(class(&surface, "Model").attribute_map, Some(Vec::new()));
        assert!(class(&surface, "Pet").attribute_map.is_none());
    }

    #[test]
    fn test_children_lists_modules_and_packages() {
        let dir = sample_package();
        let children = reflector(&dir).children("shop").unwrap();
        let names: Vec<_> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["shop.core", "shop.errors", "shop.models", "shop.tests"]
        );
        assert!(children[2].is_package);
        assert!(!children[0].is_package);

        assert!(reflector(&dir).children("shop.core").unwrap().is_empty());
    }

    #[test]
    fn test_missing_module_is_an_error() {
        let dir = sample_package();
        let err = reflector(&dir).inspect("shop.nowhere").unwrap_err();
        assert!(matches!(err, ReflectError::ModuleNotFound { .. }));
        assert!(reflector(&dir).children("nowhere").is_err());
    }

    #[test]
    fn test_import_cycle_terminates() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "loop/__init__.py", "from .a import thing\n");
        write(dir.path(), "loop/a.py", "from .b import thing\n");
        write(dir.path(), "loop/b.py", "from .a import thing\n");
        let surface = reflector(&dir).inspect("loop").unwrap();
        assert!(surface.member("thing").is_some());
    }

    #[test]
    fn test_absolute_module() {
        let parsed = ParsedModule {
            name: "shop.models._models".to_string(),
            is_package: false,
            syntax: SyntaxModule::default(),
        };
        let relative = |level, dotted: &str| ModulePath {
            level,
            dotted: dotted.to_string(),
        };
        assert_eq!(
            absolute_module(&parsed, &relative(1, "base")),
            Some("shop.models.base".to_string())
        );
        assert_eq!(
            absolute_module(&parsed, &relative(2, "")),
            Some("shop".to_string())
        );
        assert_eq!(absolute_module(&parsed, &relative(4, "x")), None);
    }
}
