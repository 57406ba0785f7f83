//! Builtin function and class signatures.
//!
//! Only what analyzed code commonly touches: string helpers, type-test
//! functions and the core classes. Anything else is reported as undefined.

use crate::registry::{
    ClassSignature, FunctionSignature, InMemoryRegistry, ParamSignature,
};
use docflow_solver::{TypeExpr, union};

fn param(name: &str, ty: TypeExpr) -> ParamSignature {
    ParamSignature::new(name).typed(ty)
}

fn function(name: &str, params: Vec<ParamSignature>, ret: TypeExpr) -> FunctionSignature {
    FunctionSignature {
        params,
        ..FunctionSignature::new(name).returns(ret)
    }
}

pub fn register_builtins(registry: &mut InMemoryRegistry) {
    for signature in builtin_functions() {
        registry.add_function(signature);
    }
    for signature in builtin_classes() {
        registry.add_class(signature);
    }
}

fn builtin_functions() -> Vec<FunctionSignature> {
    let string_list = TypeExpr::keyed_array(TypeExpr::INT, TypeExpr::STRING);
    let mut functions = vec![
        function(
            "substr",
            vec![
                param("$string", TypeExpr::STRING),
                param("$offset", TypeExpr::INT),
                param("$length", TypeExpr::nullable(TypeExpr::INT)).optional(),
            ],
            TypeExpr::STRING,
        ),
        function(
            "strpos",
            vec![
                param("$haystack", TypeExpr::STRING),
                param("$needle", TypeExpr::STRING),
                param("$offset", TypeExpr::INT).optional(),
            ],
            union(&TypeExpr::INT, &TypeExpr::FALSE),
        ),
        function("strlen", vec![param("$string", TypeExpr::STRING)], TypeExpr::INT),
        function("strtolower", vec![param("$string", TypeExpr::STRING)], TypeExpr::STRING),
        function("strtoupper", vec![param("$string", TypeExpr::STRING)], TypeExpr::STRING),
        function("trim", vec![param("$string", TypeExpr::STRING)], TypeExpr::STRING),
        function(
            "str_repeat",
            vec![param("$string", TypeExpr::STRING), param("$times", TypeExpr::INT)],
            TypeExpr::STRING,
        ),
        function(
            "explode",
            vec![
                param("$separator", TypeExpr::STRING),
                param("$string", TypeExpr::STRING),
            ],
            string_list,
        ),
        function(
            "implode",
            vec![
                param("$separator", TypeExpr::STRING),
                param("$array", TypeExpr::array()),
            ],
            TypeExpr::STRING,
        ),
        function(
            "rand",
            vec![
                param("$min", TypeExpr::INT).optional(),
                param("$max", TypeExpr::INT).optional(),
            ],
            TypeExpr::INT,
        ),
        function("count", vec![param("$value", TypeExpr::array())], TypeExpr::INT),
        function(
            "in_array",
            vec![
                param("$needle", TypeExpr::MIXED),
                param("$haystack", TypeExpr::array()),
                param("$strict", TypeExpr::BOOL).optional(),
            ],
            TypeExpr::BOOL,
        ),
        function(
            "array_keys",
            vec![param("$array", TypeExpr::array())],
            TypeExpr::array(),
        ),
        function("intval", vec![param("$value", TypeExpr::MIXED)], TypeExpr::INT),
        function(
            "define",
            vec![
                param("$constant_name", TypeExpr::STRING),
                param("$value", TypeExpr::MIXED),
            ],
            TypeExpr::BOOL,
        ),
    ];

    for test in [
        "is_string",
        "is_int",
        "is_integer",
        "is_float",
        "is_bool",
        "is_array",
        "is_object",
        "is_callable",
        "is_null",
        "is_scalar",
    ] {
        functions.push(function(
            test,
            vec![param("$value", TypeExpr::MIXED)],
            TypeExpr::BOOL,
        ));
    }
    functions
}

fn builtin_classes() -> Vec<ClassSignature> {
    let throwable = ClassSignature::new("Throwable");
    let traversable = ClassSignature::new("Traversable");

    let exception = ClassSignature::new("Exception")
        .implements("Throwable")
        .method(function(
            "__construct",
            vec![
                param("$message", TypeExpr::STRING).optional(),
                param("$code", TypeExpr::INT).optional(),
            ],
            TypeExpr::VOID,
        ))
        .method(function("getMessage", Vec::new(), TypeExpr::STRING))
        .method(function("getCode", Vec::new(), TypeExpr::INT));

    vec![
        throwable,
        traversable,
        exception,
        ClassSignature::new("Generator").implements("Traversable"),
        ClassSignature::new("Closure"),
        ClassSignature::new("stdClass"),
    ]
}
