//! Names provided by the interpreter itself.

/// Builtin exception classes.
pub const BUILTIN_EXCEPTIONS: &[&str] = &[
    "BaseException",
    "Exception",
    "ArithmeticError",
    "AssertionError",
    "AttributeError",
    "BufferError",
    "EOFError",
    "ImportError",
    "LookupError",
    "MemoryError",
    "NameError",
    "OSError",
    "ReferenceError",
    "RuntimeError",
    "StopIteration",
    "StopAsyncIteration",
    "SyntaxError",
    "SystemError",
    "TypeError",
    "ValueError",
    "KeyError",
    "IndexError",
    "NotImplementedError",
    "TimeoutError",
    "ConnectionError",
    "FileNotFoundError",
    "PermissionError",
    "UnicodeError",
    "ZeroDivisionError",
    "OverflowError",
    "Warning",
    "UserWarning",
    "DeprecationWarning",
    "FutureWarning",
    "RuntimeWarning",
    "GeneratorExit",
    "KeyboardInterrupt",
    "SystemExit",
];

/// Builtin non-exception classes.
pub const BUILTIN_CLASSES: &[&str] = &[
    "object",
    "type",
    "int",
    "float",
    "complex",
    "bool",
    "str",
    "bytes",
    "bytearray",
    "list",
    "tuple",
    "dict",
    "set",
    "frozenset",
    "range",
    "slice",
    "property",
    "staticmethod",
    "classmethod",
    "super",
    "memoryview",
];

/// Standard library modules whose classes are treated like builtins: their
/// constructors and methods do not change with the audited package.
const PLATFORM_MODULES: &[&str] = &["builtins", "enum", "abc", "typing", "collections"];

/// Base classes that turn a class into an enumeration.
pub const ENUM_BASES: &[&str] = &["Enum", "IntEnum", "StrEnum", "Flag", "IntFlag"];

pub fn is_builtin_class(name: &str) -> bool {
    BUILTIN_CLASSES.contains(&name) || BUILTIN_EXCEPTIONS.contains(&name)
}

/// Whether a class name denotes an exception, by builtin name or convention.
pub fn is_exception_name(name: &str) -> bool {
    BUILTIN_EXCEPTIONS.contains(&name)
        || name.ends_with("Error")
        || name.ends_with("Exception")
        || name.ends_with("Warning")
}

pub fn is_enum_base(name: &str) -> bool {
    ENUM_BASES.contains(&name)
}

/// Whether a dotted path outside the search roots belongs to the platform.
pub fn is_platform_path(path: &str) -> bool {
    let head = path.split('.').next().unwrap_or(path);
    PLATFORM_MODULES.contains(&head)
}

/// Last segment of a dotted path, the `__name__` of what it refers to.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}
