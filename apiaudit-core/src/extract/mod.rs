//! Surface extraction: module surfaces to canonical reports.
//!
//! [`create_report`] turns what a [`Reflector`] sees in one module into a
//! [`ModuleReport`]. Batch helpers enumerate a package's modules and extract
//! them in parallel.

mod format;
pub mod groupings;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::reflect::{Callable, ClassMemberKind, ClassShape, MemberKind, ObjectRepr, ParamKind, Reflector};
use crate::report::{
    AggregateReport, ClassEntry, ClassSignature, FunctionEntry, FunctionSignature, ImportedSymbol,
    ModuleReport, ParameterSpec, Signature,
};

pub use format::{class_repr, format_for_report};

/// Module names skipped during package enumeration by default.
pub const DEFAULT_DENYLIST: &[&str] = &["tests"];

/// Options for extraction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Also extract operation groups and data models.
    pub groupings: bool,
    /// Last-segment module names skipped when walking a package.
    pub denylist: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            groupings: false,
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Split `package-name#submodule` into the distribution name and the full
/// module name (`package.name.submodule`).
pub fn parse_input(input: &str) -> (String, String) {
    let mut parts = input.split('#');
    let package = parts.next().unwrap_or_default().to_string();
    let mut module = package.replace('-', ".");
    if let Some(sub) = parts.next() {
        module.push('.');
        module.push_str(sub);
    }
    (package, module)
}

/// Part of `module` below the package's root module.
///
/// Empty for the root module itself, and for modules outside the package,
/// which are logged.
pub fn sub_module_part(package: &str, module: &str) -> String {
    let root = package.replace('-', ".");
    match module.strip_prefix(&root) {
        Some(rest) if rest.is_empty() || rest.starts_with('.') => {
            rest.trim_start_matches('.').to_string()
        }
        _ => {
            warn!("Submodule {} does not start with package name {}", module, package);
            String::new()
        }
    }
}

pub fn function_signature(callable: &Callable) -> Signature {
    let Some(params) = &callable.params else {
        return Signature::unknown();
    };
    let parameters = params
        .iter()
        .map(|p| {
            let name = match p.kind {
                ParamKind::VarPositional => format!("*{}", p.name),
                ParamKind::VarKeyword => format!("**{}", p.name),
                ParamKind::Positional | ParamKind::KeywordOnly => p.name.clone(),
            };
            ParameterSpec::new(name, p.default.as_ref().map(format_for_report))
        })
        .collect();
    Signature::Known(FunctionSignature::new(callable.name.clone(), parameters))
}

/// Public members split into attributes and methods.
///
/// `__init__` is always kept; platform methods never are.
pub fn class_signature(shape: &ClassShape) -> ClassSignature {
    let mut signature = ClassSignature {
        name: shape.name.clone(),
        baseclasses: shape.bases.clone(),
        attributes: Some(Vec::new()),
        methods: Some(Default::default()),
    };

    for member in &shape.members {
        if member.name.starts_with('_') && member.name != "__init__" {
            continue;
        }
        match &member.kind {
            ClassMemberKind::Platform => {}
            ClassMemberKind::Function(callable) | ClassMemberKind::OtherCallable(callable) => {
                if let Some(methods) = signature.methods.as_mut() {
                    methods.insert(member.name.clone(), function_signature(callable));
                }
            }
            ClassMemberKind::Attribute => {
                if let Some(attributes) = signature.attributes.as_mut() {
                    attributes.push(member.name.clone());
                }
            }
        }
    }
    signature
}

fn imported(origin: &Option<String>, module: &str) -> Option<String> {
    origin.as_ref().filter(|o| o.as_str() != module).cloned()
}

/// Build the report of one module.
pub fn create_report<R>(reflector: &R, module: &str, options: &ExtractOptions) -> Result<ModuleReport>
where
    R: Reflector + ?Sized,
{
    let surface = reflector.inspect(module)?;
    let mut report = ModuleReport::default();

    for member in &surface.members {
        if member.is_private() {
            continue;
        }
        match &member.kind {
            MemberKind::Module => {}
            MemberKind::Function(callable) if callable.name.starts_with('_') => {
                // A public alias of a private function is just a value.
                let repr = ObjectRepr::Instance {
                    type_name: "function".to_string(),
                    repr: format!("<function {}>", callable.name),
                };
                report.others.insert(member.name.clone(), format_for_report(&repr));
            }
            MemberKind::Function(callable) => {
                let entry = match imported(&member.origin, module) {
                    Some(source) => FunctionEntry::Imported(ImportedSymbol {
                        names: callable.name.clone(),
                        type_repr: format_for_report(&ObjectRepr::Instance {
                            type_name: "function".to_string(),
                            repr: format!("<function {}>", callable.name),
                        }),
                        source,
                    }),
                    None => FunctionEntry::Local(function_signature(callable)),
                };
                report.functions.insert(callable.name.clone(), entry);
            }
            MemberKind::Class(shape) => {
                let entry = match imported(&member.origin, module) {
                    Some(source) => {
                        let qualname = if source == "builtins" {
                            shape.name.clone()
                        } else {
                            format!("{}.{}", source, shape.name)
                        };
                        ClassEntry::Imported(ImportedSymbol {
                            names: shape.name.clone(),
                            type_repr: class_repr(&qualname).into(),
                            source,
                        })
                    }
                    None if shape.is_exception => ClassEntry::Local(ClassSignature::exception(
                        shape.name.clone(),
                        shape.bases.clone(),
                    )),
                    None => ClassEntry::Local(class_signature(shape)),
                };
                let category = if shape.is_exception {
                    &mut report.exceptions
                } else {
                    &mut report.classes
                };
                category.insert(shape.name.clone(), entry);
            }
            MemberKind::Value(value) => {
                report
                    .others
                    .insert(member.name.clone(), format_for_report(value));
            }
        }
    }

    if options.groupings {
        report.operations = Some(groupings::operation_groups(reflector, module)?);
        report.models = Some(groupings::model_groups(reflector, module)?);
    }

    debug!("Extracted {} entries from {}", report.entry_count(), module);
    Ok(report)
}

/// Every module of a package, the package first, skipping denylisted names.
pub fn find_all_modules<R>(reflector: &R, module: &str, denylist: &[String]) -> Result<Vec<String>>
where
    R: Reflector + ?Sized,
{
    info!("Looking for all modules in {}", module);
    let mut result = vec![module.to_string()];

    for child in reflector.children(module)? {
        let last = child.name.rsplit('.').next().unwrap_or(&child.name);
        if denylist.iter().any(|d| d == last) {
            info!("Skip {}", child.name);
            continue;
        }
        if child.is_package {
            result.extend(find_all_modules(reflector, &child.name, denylist)?);
        } else {
            result.push(child.name);
        }
    }
    Ok(result)
}

/// Extract several modules in parallel, keeping their order.
pub fn create_reports<R>(
    reflector: &R,
    modules: &[String],
    options: &ExtractOptions,
) -> Result<Vec<(String, ModuleReport)>>
where
    R: Reflector + Sync + ?Sized,
{
    modules
        .par_iter()
        .map(|module| {
            info!("Working on {}", module);
            create_report(reflector, module, options).map(|report| (module.clone(), report))
        })
        .collect()
}

pub fn aggregate(reports: Vec<(String, ModuleReport)>) -> AggregateReport {
    reports.into_iter().collect()
}

/// Aggregate report of every module under `module`.
pub fn extract_package<R>(reflector: &R, module: &str, options: &ExtractOptions) -> Result<AggregateReport>
where
    R: Reflector + Sync + ?Sized,
{
    let modules = find_all_modules(reflector, module, &options.denylist)?;
    Ok(aggregate(create_reports(reflector, &modules, options)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReflectError;
    use crate::reflect::{ClassMember, Member, ModuleChild, ModuleSurface, Param};
    use serde_json::json;
    use std::collections::HashMap;

    /// Reflector over hand-built surfaces.
    #[derive(Default)]
    struct FakeReflector {
        surfaces: HashMap<String, ModuleSurface>,
        children: HashMap<String, Vec<ModuleChild>>,
    }

    impl FakeReflector {
        fn with_module(mut self, name: &str, members: Vec<Member>) -> Self {
            self.surfaces.insert(
                name.to_string(),
                ModuleSurface {
                    name: name.to_string(),
                    members,
                },
            );
            self
        }

        fn with_children(mut self, name: &str, children: &[(&str, bool)]) -> Self {
            self.children.insert(
                name.to_string(),
                children
                    .iter()
                    .map(|(n, p)| ModuleChild {
                        name: n.to_string(),
                        is_package: *p,
                    })
                    .collect(),
            );
            self
        }
    }

    impl Reflector for FakeReflector {
        fn inspect(&self, module: &str) -> std::result::Result<ModuleSurface, ReflectError> {
            self.surfaces
                .get(module)
                .cloned()
                .ok_or_else(|| ReflectError::ModuleNotFound {
                    module: module.to_string(),
                })
        }

        fn children(&self, module: &str) -> std::result::Result<Vec<ModuleChild>, ReflectError> {
            Ok(self.children.get(module).cloned().unwrap_or_default())
        }
    }

    fn member(name: &str, origin: Option<&str>, kind: MemberKind) -> Member {
        Member {
            name: name.to_string(),
            origin: origin.map(str::to_string),
            kind,
        }
    }

    fn widget() -> ClassShape {
        ClassShape {
            name: "Widget".to_string(),
            bases: vec!["object".to_string()],
            members: vec![
                ClassMember {
                    name: "__eq__".to_string(),
                    kind: ClassMemberKind::Platform,
                },
                ClassMember {
                    name: "__init__".to_string(),
                    kind: ClassMemberKind::Function(Callable::new(
                        "__init__",
                        Some(vec![Param::positional("self")]),
                    )),
                },
                ClassMember {
                    name: "_cache".to_string(),
                    kind: ClassMemberKind::Attribute,
                },
                ClassMember {
                    name: "resize".to_string(),
                    kind: ClassMemberKind::Function(Callable::new(
                        "resize",
                        Some(vec![Param::positional("self"), Param::positional("width")]),
                    )),
                },
                ClassMember {
                    name: "size".to_string(),
                    kind: ClassMemberKind::Attribute,
                },
                ClassMember {
                    name: "upper".to_string(),
                    kind: ClassMemberKind::Platform,
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(
            parse_input("azure-mgmt-compute"),
            ("azure-mgmt-compute".to_string(), "azure.mgmt.compute".to_string())
        );
        assert_eq!(
            parse_input("azure-mgmt-compute#v2018_10_01"),
            (
                "azure-mgmt-compute".to_string(),
                "azure.mgmt.compute.v2018_10_01".to_string()
            )
        );
    }

    #[test]
    fn test_sub_module_part() {
        assert_eq!(
            sub_module_part("azure-mgmt-compute", "azure.mgmt.compute.v2018_10_01.models"),
            "v2018_10_01.models"
        );
        assert_eq!(sub_module_part("azure-mgmt-compute", "azure.mgmt.compute"), "");
        assert_eq!(sub_module_part("azure-mgmt-compute", "other.module"), "");
    }

    #[test]
    fn test_function_signature_prefixes_variadics() {
        let callable = Callable::new(
            "make",
            Some(vec![
                Param::positional("name"),
                Param::new("args", ParamKind::VarPositional, None),
                Param::new(
                    "size",
                    ParamKind::KeywordOnly,
                    Some(ObjectRepr::Json(serde_json::Value::Null)),
                ),
                Param::new("kwargs", ParamKind::VarKeyword, None),
            ]),
        );
        let value = serde_json::to_value(function_signature(&callable)).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "make",
                "parameters": [
                    {"name": "name"},
                    {"name": "*args"},
                    {"name": "size", "default": "None"},
                    {"name": "**kwargs"}
                ]
            })
        );
        assert!(function_signature(&Callable::new("opaque", None)).is_unknown());
    }

    #[test]
    fn test_class_signature_filters_members() {
        let signature = class_signature(&widget());
        assert_eq!(signature.attributes, Some(vec!["size".to_string()]));
        let methods = signature.methods.unwrap();
        let names: Vec<_> = methods.keys().cloned().collect();
        assert_eq!(names, vec!["__init__", "resize"]);
    }

    #[test]
    fn test_create_report_categories() {
        let reflector = FakeReflector::default().with_module(
            "shop",
            vec![
                member("MAX_SIZE", None, MemberKind::Value(ObjectRepr::Json(json!(10)))),
                member("Widget", Some("shop"), MemberKind::Class(widget())),
                member(
                    "ShopError",
                    Some("shop"),
                    MemberKind::Class(ClassShape {
                        name: "ShopError".to_string(),
                        bases: vec!["Exception".to_string()],
                        is_exception: true,
                        ..Default::default()
                    }),
                ),
                member(
                    "build",
                    Some("shop.core"),
                    MemberKind::Function(Callable::new("make_widget", Some(vec![]))),
                ),
                member("alias", Some("shop"), MemberKind::Function(Callable::new("_hidden", Some(vec![])))),
                member("core", None, MemberKind::Module),
                member("_secret", None, MemberKind::Value(ObjectRepr::Json(json!(1)))),
            ],
        );

        let report = create_report(&reflector, "shop", &ExtractOptions::default()).unwrap();
        let value = report.to_value().unwrap();

        assert_eq!(value["others"], json!({"MAX_SIZE": "10", "alias": "instance of <class 'function'>"}));
        assert_eq!(
            value["functions"]["make_widget"],
            json!({
                "names": "make_widget",
                "type": "instance of <class 'function'>",
                "source": "shop.core"
            })
        );
        assert_eq!(
            value["exceptions"]["ShopError"],
            json!({"name": "ShopError", "baseclasses": ["Exception"]})
        );
        assert_eq!(value["classes"]["Widget"]["attributes"], json!(["size"]));
        assert!(value.get("operations").is_none());
    }

    #[test]
    fn test_imported_class_records_origin() {
        let reflector = FakeReflector::default().with_module(
            "shop",
            vec![member("Widget", Some("shop.core"), MemberKind::Class(widget()))],
        );
        let report = create_report(&reflector, "shop", &ExtractOptions::default()).unwrap();
        assert_eq!(
            serde_json::to_value(&report.classes["Widget"]).unwrap(),
            json!({
                "names": "Widget",
                "type": "<class 'shop.core.Widget'>",
                "source": "shop.core"
            })
        );
    }

    #[test]
    fn test_groupings_with_missing_namespaces_are_empty() {
        let reflector = FakeReflector::default().with_module("shop", vec![]);
        let options = ExtractOptions {
            groupings: true,
            ..Default::default()
        };
        let value = create_report(&reflector, "shop", &options)
            .unwrap()
            .to_value()
            .unwrap();
        assert_eq!(value["operations"], json!({}));
        assert_eq!(
            value["models"],
            json!({"models": {}, "enums": {}, "exceptions": {}})
        );
    }

    #[test]
    fn test_groupings_collect_operations() {
        let mut operations = widget();
        operations.name = "WidgetsOperations".to_string();
        let reflector = FakeReflector::default()
            .with_module("shop", vec![])
            .with_module(
                "shop.operations",
                vec![
                    member("WidgetsOperations", Some("shop.operations._ops"), MemberKind::Class(operations)),
                    member("helper", None, MemberKind::Value(ObjectRepr::Json(json!(1)))),
                ],
            );
        let options = ExtractOptions {
            groupings: true,
            ..Default::default()
        };
        let report = create_report(&reflector, "shop", &options).unwrap();
        let group = &report.operations.unwrap()["WidgetsOperations"];
        let names: Vec<_> = group.functions.keys().cloned().collect();
        assert_eq!(names, vec!["resize"]);
    }

    #[test]
    fn test_find_all_modules_recurses_and_skips_denylist() {
        let reflector = FakeReflector::default()
            .with_children(
                "shop",
                &[("shop.core", false), ("shop.models", true), ("shop.tests", true)],
            )
            .with_children("shop.models", &[("shop.models._models", false)]);
        let modules = find_all_modules(&reflector, "shop", &["tests".to_string()]).unwrap();
        assert_eq!(
            modules,
            vec!["shop", "shop.core", "shop.models", "shop.models._models"]
        );
    }

    #[test]
    fn test_extract_package_aggregates_in_order() {
        let reflector = FakeReflector::default()
            .with_module("shop", vec![])
            .with_module(
                "shop.core",
                vec![member("LIMIT", None, MemberKind::Value(ObjectRepr::Json(json!(3))))],
            )
            .with_children("shop", &[("shop.core", false)]);
        let aggregate = extract_package(&reflector, "shop", &ExtractOptions::default()).unwrap();
        let keys: Vec<_> = aggregate.keys().cloned().collect();
        assert_eq!(keys, vec!["shop", "shop.core"]);
        assert_eq!(aggregate["shop.core"].others["LIMIT"], json!("3"));
    }

    #[test]
    fn test_missing_module_fails() {
        let reflector = FakeReflector::default();
        assert!(create_report(&reflector, "nowhere", &ExtractOptions::default()).is_err());
    }
}
