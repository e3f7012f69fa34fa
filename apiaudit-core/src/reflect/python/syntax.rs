//! Statement-level view of a Python module using tree-sitter.
//!
//! Only the statements that bind names visible from outside are kept:
//! definitions, imports and plain assignments, including those nested in
//! top-level `if`/`try`/`with` blocks. Expressions are reduced to [`Expr`],
//! which is what the reflector evaluates statically.

use serde_json::{Map, Number, Value};
use tree_sitter::{Node, Parser};

use crate::reflect::helpers::{
    find_child_by_type, get_node_text, has_error, named_children, string_literal_value,
};
use crate::reflect::ParamKind;

/// Parsed module: name-binding statements in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyntaxModule {
    pub statements: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Function(FunctionDef),
    Class(ClassDef),
    Import(ImportBinding),
    /// `from module import *`
    Wildcard(ModulePath),
    Assign { name: String, value: Expr },
}

impl Statement {
    /// Name bound by the statement, if it binds exactly one.
    pub fn bound_name(&self) -> Option<&str> {
        match self {
            Statement::Function(f) => Some(&f.name),
            Statement::Class(c) => Some(&c.name),
            Statement::Import(i) => Some(&i.name),
            Statement::Assign { name, .. } => Some(name),
            Statement::Wildcard(_) => None,
        }
    }
}

/// Module named by an import, possibly relative (`level` leading dots).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModulePath {
    pub level: usize,
    pub dotted: String,
}

impl ModulePath {
    pub fn absolute(dotted: impl Into<String>) -> Self {
        Self {
            level: 0,
            dotted: dotted.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportBinding {
    /// Local name the import binds.
    pub name: String,
    pub module: ModulePath,
    /// Attribute taken from the module; `None` binds the module itself.
    pub attr: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    /// `None` when the parameter list does not parse.
    pub params: Option<Vec<SyntaxParam>>,
    /// Decorator names without `@` and call arguments.
    pub decorators: Vec<String>,
}

impl FunctionDef {
    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators.iter().any(|d| d == name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxParam {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Expr>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub body: Vec<Statement>,
}

/// Statically known shape of an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A literal whose value is fully known.
    Literal(Value),
    /// A possibly dotted name reference.
    Name(String),
    /// A call; `callee` is set when the called expression is a name.
    Call { callee: Option<String>, text: String },
    Lambda,
    /// Anything else, by its source text.
    Other(String),
}

/// Parse Python source code.
pub fn parse(source: &str) -> Result<SyntaxModule, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| format!("Failed to set Python language: {}", e))?;

    let tree = parser
        .parse(source, None)
        .ok_or("Failed to parse Python source")?;

    let mut module = SyntaxModule::default();
    collect_statements(&tree.root_node(), source, &mut module.statements);
    Ok(module)
}

/// Walk a block and push its binding statements.
fn collect_statements(block: &Node, source: &str, out: &mut Vec<Statement>) {
    for child in named_children(block) {
        match child.kind() {
            "function_definition" => {
                out.push(Statement::Function(extract_function(&child, source, Vec::new())));
            }
            "class_definition" => {
                out.push(Statement::Class(extract_class(&child, source)));
            }
            "decorated_definition" => {
                if let Some(statement) = extract_decorated(&child, source) {
                    out.push(statement);
                }
            }
            "import_statement" => extract_import(&child, source, out),
            "import_from_statement" => extract_from_import(&child, source, out),
            "expression_statement" => {
                if let Some(assignment) = find_child_by_type(&child, "assignment") {
                    extract_assignment(&assignment, source, out);
                }
            }
            "if_statement" => extract_if(&child, source, out),
            "try_statement" => extract_try(&child, source, out),
            "with_statement" => {
                if let Some(body) = child.child_by_field_name("body") {
                    collect_statements(&body, source, out);
                }
            }
            _ => {}
        }
    }
}

/// Both branches of a conditional bind names; type-checking-only blocks do not
/// exist at runtime and are skipped.
fn extract_if(node: &Node, source: &str, out: &mut Vec<Statement>) {
    let condition = node
        .child_by_field_name("condition")
        .map(|c| get_node_text(&c, source))
        .unwrap_or_default();
    let type_checking = matches!(condition, "TYPE_CHECKING" | "typing.TYPE_CHECKING");

    if !type_checking {
        if let Some(consequence) = node.child_by_field_name("consequence") {
            collect_statements(&consequence, source, out);
        }
    }

    let mut cursor = node.walk();
    for alternative in node.children_by_field_name("alternative", &mut cursor) {
        let block = match alternative.kind() {
            "elif_clause" => alternative.child_by_field_name("consequence"),
            _ => alternative.child_by_field_name("body"),
        };
        if let Some(block) = block {
            collect_statements(&block, source, out);
        }
    }
}

/// Handlers are collected before the `try` body, so names bound by the body
/// take precedence.
fn extract_try(node: &Node, source: &str, out: &mut Vec<Statement>) {
    let mut body = None;
    let mut trailing = Vec::new();
    for child in named_children(node) {
        match child.kind() {
            "block" => body = Some(child),
            "except_clause" | "except_group_clause" => {
                if let Some(block) = find_child_by_type(&child, "block") {
                    collect_statements(&block, source, out);
                }
            }
            "else_clause" => {
                if let Some(block) = child.child_by_field_name("body") {
                    trailing.push(block);
                }
            }
            "finally_clause" => {
                if let Some(block) = find_child_by_type(&child, "block") {
                    trailing.push(block);
                }
            }
            _ => {}
        }
    }
    if let Some(body) = body {
        collect_statements(&body, source, out);
    }
    for block in trailing {
        collect_statements(&block, source, out);
    }
}

fn extract_decorated(node: &Node, source: &str) -> Option<Statement> {
    let mut decorators = Vec::new();
    for child in named_children(node) {
        if child.kind() == "decorator" {
            decorators.push(decorator_name(&child, source));
        }
    }

    let definition = node.child_by_field_name("definition")?;
    match definition.kind() {
        "function_definition" => Some(Statement::Function(extract_function(
            &definition,
            source,
            decorators,
        ))),
        "class_definition" => Some(Statement::Class(extract_class(&definition, source))),
        _ => None,
    }
}

fn decorator_name(node: &Node, source: &str) -> String {
    let text = get_node_text(node, source).trim_start_matches('@').trim();
    let text = match text.find('(') {
        Some(idx) => &text[..idx],
        None => text,
    };
    text.trim().to_string()
}

fn extract_function(node: &Node, source: &str, decorators: Vec<String>) -> FunctionDef {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_node_text(&n, source).to_string())
        .unwrap_or_default();
    let params = node
        .child_by_field_name("parameters")
        .and_then(|p| extract_parameters(&p, source));

    FunctionDef {
        name,
        params,
        decorators,
    }
}

/// Extract function parameters; `None` when the list contains syntax errors.
fn extract_parameters(node: &Node, source: &str) -> Option<Vec<SyntaxParam>> {
    if has_error(node) {
        return None;
    }

    let mut params = Vec::new();
    let mut keyword_only = false;
    let named_kind = |keyword_only: bool| {
        if keyword_only {
            ParamKind::KeywordOnly
        } else {
            ParamKind::Positional
        }
    };

    for child in named_children(node) {
        match child.kind() {
            "identifier" => params.push(SyntaxParam {
                name: get_node_text(&child, source).to_string(),
                kind: named_kind(keyword_only),
                default: None,
            }),
            "default_parameter" | "typed_default_parameter" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| get_node_text(&n, source).to_string())
                    .unwrap_or_default();
                let default = child
                    .child_by_field_name("value")
                    .map(|v| extract_expr(&v, source));
                params.push(SyntaxParam {
                    name,
                    kind: named_kind(keyword_only),
                    default,
                });
            }
            "typed_parameter" => {
                let inner = named_children(&child).into_iter().next()?;
                let param = match inner.kind() {
                    "identifier" => SyntaxParam {
                        name: get_node_text(&inner, source).to_string(),
                        kind: named_kind(keyword_only),
                        default: None,
                    },
                    "list_splat_pattern" => {
                        keyword_only = true;
                        splat_param(&inner, source, ParamKind::VarPositional)
                    }
                    "dictionary_splat_pattern" => {
                        splat_param(&inner, source, ParamKind::VarKeyword)
                    }
                    _ => return None,
                };
                params.push(param);
            }
            "list_splat_pattern" => {
                keyword_only = true;
                params.push(splat_param(&child, source, ParamKind::VarPositional));
            }
            "dictionary_splat_pattern" => {
                params.push(splat_param(&child, source, ParamKind::VarKeyword));
            }
            "keyword_separator" => keyword_only = true,
            "positional_separator" => {}
            _ => return None,
        }
    }

    Some(params)
}

fn splat_param(node: &Node, source: &str, kind: ParamKind) -> SyntaxParam {
    let name = find_child_by_type(node, "identifier")
        .map(|n| get_node_text(&n, source).to_string())
        .unwrap_or_else(|| match kind {
            ParamKind::VarKeyword => "kwargs".to_string(),
            _ => "args".to_string(),
        });
    SyntaxParam {
        name,
        kind,
        default: None,
    }
}

fn extract_class(node: &Node, source: &str) -> ClassDef {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_node_text(&n, source).to_string())
        .unwrap_or_default();

    let mut bases = Vec::new();
    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        for arg in named_children(&superclasses) {
            match arg.kind() {
                "keyword_argument" | "list_splat" | "dictionary_splat" => {}
                // `Generic[T]` has the subscripted class as its base.
                "subscript" => {
                    if let Some(value) = arg.child_by_field_name("value") {
                        bases.push(extract_expr(&value, source));
                    }
                }
                // `six.with_metaclass(Meta, *bases)` yields a class with `bases`.
                "call" if is_with_metaclass(&arg, source) => {
                    if let Some(arguments) = arg.child_by_field_name("arguments") {
                        for base in named_children(&arguments).iter().skip(1) {
                            bases.push(extract_expr(base, source));
                        }
                    }
                }
                _ => bases.push(extract_expr(&arg, source)),
            }
        }
    }

    let mut body = Vec::new();
    if let Some(block) = node.child_by_field_name("body") {
        collect_statements(&block, source, &mut body);
    }

    ClassDef { name, bases, body }
}

fn is_with_metaclass(call: &Node, source: &str) -> bool {
    call.child_by_field_name("function")
        .map(|f| get_node_text(&f, source).ends_with("with_metaclass"))
        .unwrap_or(false)
}

/// Extract regular import statements: `import a.b` binds `a`, `import a.b as c`
/// binds `c` to `a.b`.
fn extract_import(node: &Node, source: &str, out: &mut Vec<Statement>) {
    let mut cursor = node.walk();
    for name_node in node.children_by_field_name("name", &mut cursor) {
        match name_node.kind() {
            "dotted_name" => {
                let dotted = get_node_text(&name_node, source);
                let head = dotted.split('.').next().unwrap_or(dotted);
                out.push(Statement::Import(ImportBinding {
                    name: head.to_string(),
                    module: ModulePath::absolute(head),
                    attr: None,
                }));
            }
            "aliased_import" => {
                let dotted = name_node
                    .child_by_field_name("name")
                    .map(|n| get_node_text(&n, source))
                    .unwrap_or_default();
                let alias = name_node
                    .child_by_field_name("alias")
                    .map(|n| get_node_text(&n, source))
                    .unwrap_or_default();
                out.push(Statement::Import(ImportBinding {
                    name: alias.to_string(),
                    module: ModulePath::absolute(dotted),
                    attr: None,
                }));
            }
            _ => {}
        }
    }
}

/// Extract from...import statement.
fn extract_from_import(node: &Node, source: &str, out: &mut Vec<Statement>) {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return;
    };
    let module = match module_node.kind() {
        "relative_import" => {
            let level = find_child_by_type(&module_node, "import_prefix")
                .map(|p| get_node_text(&p, source).matches('.').count())
                .unwrap_or(0);
            let dotted = find_child_by_type(&module_node, "dotted_name")
                .map(|n| get_node_text(&n, source).to_string())
                .unwrap_or_default();
            ModulePath { level, dotted }
        }
        _ => ModulePath::absolute(get_node_text(&module_node, source)),
    };

    if find_child_by_type(node, "wildcard_import").is_some() {
        out.push(Statement::Wildcard(module));
        return;
    }

    let mut cursor = node.walk();
    for name_node in node.children_by_field_name("name", &mut cursor) {
        let (attr, name) = match name_node.kind() {
            "aliased_import" => {
                let attr = name_node
                    .child_by_field_name("name")
                    .map(|n| get_node_text(&n, source))
                    .unwrap_or_default();
                let alias = name_node
                    .child_by_field_name("alias")
                    .map(|n| get_node_text(&n, source))
                    .unwrap_or(attr);
                (attr, alias)
            }
            _ => {
                let attr = get_node_text(&name_node, source);
                (attr, attr)
            }
        };
        out.push(Statement::Import(ImportBinding {
            name: name.to_string(),
            module: module.clone(),
            attr: Some(attr.to_string()),
        }));
    }
}

/// `a = b = value` binds every plain name target; `a, b = x, y` binds
/// pairwise when both sides have the same length.
fn extract_assignment(node: &Node, source: &str, out: &mut Vec<Statement>) {
    let mut targets = Vec::new();
    let mut current = *node;
    loop {
        if let Some(left) = current.child_by_field_name("left") {
            targets.push(left);
        }
        match current.child_by_field_name("right") {
            Some(right) if right.kind() == "assignment" => current = right,
            Some(right) => {
                for target in targets {
                    bind_target(&target, &right, source, out);
                }
                return;
            }
            // Annotation without a value binds nothing at runtime.
            None => return,
        }
    }
}

fn bind_target(target: &Node, value: &Node, source: &str, out: &mut Vec<Statement>) {
    match target.kind() {
        "identifier" => out.push(Statement::Assign {
            name: get_node_text(target, source).to_string(),
            value: extract_expr(value, source),
        }),
        "pattern_list" | "tuple_pattern" => {
            let names = named_children(target);
            let values = match value.kind() {
                "expression_list" | "tuple" => named_children(value),
                _ => Vec::new(),
            };
            if names.len() == values.len() {
                for (name, value) in names.iter().zip(values.iter()) {
                    bind_target(name, value, source, out);
                }
            } else {
                for name in names.iter().filter(|n| n.kind() == "identifier") {
                    out.push(Statement::Assign {
                        name: get_node_text(name, source).to_string(),
                        value: Expr::Other(get_node_text(value, source).to_string()),
                    });
                }
            }
        }
        _ => {}
    }
}

/// Reduce an expression node to what can be known without running it.
pub fn extract_expr(node: &Node, source: &str) -> Expr {
    let text = get_node_text(node, source);
    let other = || Expr::Other(text.to_string());

    match node.kind() {
        "string" => {
            if find_child_by_type(node, "interpolation").is_some() {
                return other();
            }
            string_literal_value(text)
                .map(|s| Expr::Literal(Value::String(s)))
                .unwrap_or_else(other)
        }
        "concatenated_string" => {
            let mut joined = String::new();
            for part in named_children(node) {
                match extract_expr(&part, source) {
                    Expr::Literal(Value::String(s)) => joined.push_str(&s),
                    _ => return other(),
                }
            }
            Expr::Literal(Value::String(joined))
        }
        "integer" => parse_integer(text).map(Expr::Literal).unwrap_or_else(other),
        "float" => text
            .replace('_', "")
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(|n| Expr::Literal(Value::Number(n)))
            .unwrap_or_else(other),
        "true" => Expr::Literal(Value::Bool(true)),
        "false" => Expr::Literal(Value::Bool(false)),
        "none" => Expr::Literal(Value::Null),
        "unary_operator" => {
            let operator = node
                .child_by_field_name("operator")
                .map(|o| get_node_text(&o, source))
                .unwrap_or_default();
            let argument = node.child_by_field_name("argument");
            match (operator, argument.map(|a| extract_expr(&a, source))) {
                ("-", Some(Expr::Literal(Value::Number(n)))) => negate(&n)
                    .map(|n| Expr::Literal(Value::Number(n)))
                    .unwrap_or_else(other),
                ("+", Some(Expr::Literal(Value::Number(n)))) => Expr::Literal(Value::Number(n)),
                _ => other(),
            }
        }
        "parenthesized_expression" => named_children(node)
            .first()
            .map(|inner| extract_expr(inner, source))
            .unwrap_or_else(other),
        "list" | "tuple" | "set" | "expression_list" => {
            let mut items = Vec::new();
            for element in named_children(node) {
                match extract_expr(&element, source) {
                    Expr::Literal(value) => items.push(value),
                    _ => return other(),
                }
            }
            Expr::Literal(Value::Array(items))
        }
        "dictionary" => {
            let mut map = Map::new();
            for pair in named_children(node) {
                if pair.kind() != "pair" {
                    return other();
                }
                let key = pair.child_by_field_name("key").map(|k| extract_expr(&k, source));
                let value = pair
                    .child_by_field_name("value")
                    .map(|v| extract_expr(&v, source));
                match (key, value) {
                    (Some(Expr::Literal(Value::String(k))), Some(Expr::Literal(v))) => {
                        map.insert(k, v);
                    }
                    _ => return other(),
                }
            }
            Expr::Literal(Value::Object(map))
        }
        "identifier" => Expr::Name(text.to_string()),
        "attribute" if is_dotted_name(text) => Expr::Name(text.to_string()),
        "call" => {
            let callee = node
                .child_by_field_name("function")
                .map(|f| get_node_text(&f, source))
                .filter(|f| is_dotted_name(f))
                .map(str::to_string);
            Expr::Call {
                callee,
                text: text.to_string(),
            }
        }
        "lambda" => Expr::Lambda,
        _ => other(),
    }
}

fn is_dotted_name(text: &str) -> bool {
    !text.is_empty()
        && text.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c == '_' || c.is_alphabetic())
                && chars.all(|c| c == '_' || c.is_alphanumeric())
        })
}

fn parse_integer(text: &str) -> Option<Value> {
    let cleaned = text.replace('_', "").to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = cleaned.strip_prefix("0x") {
        (rest.to_string(), 16)
    } else if let Some(rest) = cleaned.strip_prefix("0o") {
        (rest.to_string(), 8)
    } else if let Some(rest) = cleaned.strip_prefix("0b") {
        (rest.to_string(), 2)
    } else {
        (cleaned, 10)
    };
    if let Ok(value) = i64::from_str_radix(&digits, radix) {
        return Some(Value::Number(value.into()));
    }
    u64::from_str_radix(&digits, radix)
        .ok()
        .map(|value| Value::Number(value.into()))
}

fn negate(number: &Number) -> Option<Number> {
    if let Some(i) = number.as_i64() {
        return i.checked_neg().map(Number::from);
    }
    number.as_f64().and_then(|f| Number::from_f64(-f))
}
