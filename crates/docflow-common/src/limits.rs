//! Centralized limits and thresholds for the analyzer.
//!
//! Shared constants for recursion depths and size caps. Each guards a
//! recursive algorithm against pathological input.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting of generic arguments / parentheses in a type expression.
///
/// `array<array<array<…>>>` deeper than this fails to parse with
/// `TypeParseError::TooDeep` instead of recursing further.
pub const MAX_TYPE_EXPR_DEPTH: u32 = 32;

/// Maximum depth for expression type inference.
///
/// Deeply nested expressions (`f(f(f(…)))`, long concatenation chains)
/// stop inferring and produce `mixed` past this depth.
pub const MAX_EXPR_CHECK_DEPTH: u32 = 500;

/// Maximum depth for nested statement blocks (ifs inside loops inside ifs…).
pub const MAX_STATEMENT_DEPTH: u32 = 200;

/// Maximum length of a class ancestry chain walked during subtype checks
/// and member resolution. Guards against cyclic `extends` in the registry.
pub const MAX_CLASS_ANCESTRY_DEPTH: u32 = 64;
