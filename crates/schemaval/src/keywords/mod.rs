pub(crate) mod additional_items;
pub(crate) mod additional_properties;
pub(crate) mod all_of;
pub(crate) mod annotation;
pub(crate) mod any_of;
pub(crate) mod const_;
pub(crate) mod contains;
pub(crate) mod custom;
pub(crate) mod dependencies;
pub(crate) mod enum_;
pub(crate) mod exclusive_maximum;
pub(crate) mod exclusive_minimum;
pub(crate) mod format;
pub(crate) mod helpers;
pub(crate) mod if_;
pub(crate) mod items;
pub(crate) mod max_items;
pub(crate) mod max_length;
pub(crate) mod max_properties;
pub(crate) mod maximum;
pub(crate) mod min_items;
pub(crate) mod min_length;
pub(crate) mod min_properties;
pub(crate) mod minimum;
pub(crate) mod multiple_of;
pub(crate) mod not;
pub(crate) mod one_of;
pub(crate) mod pattern;
pub(crate) mod pattern_properties;
pub(crate) mod prefix_items;
pub(crate) mod properties;
pub(crate) mod property_names;
pub(crate) mod ref_;
pub(crate) mod required;
pub(crate) mod type_;
pub(crate) mod unevaluated_items;
pub(crate) mod unevaluated_properties;
pub(crate) mod unique_items;

use referencing::{Draft, Vocabulary};
use serde_json::{Map, Value};

use crate::{compiler, context::EvalContext, error::EvaluationError};

/// A compiled keyword, ready to evaluate against instances.
///
/// Evaluators record failures and annotations on the current frame through
/// the context; the `Err` channel is reserved for structural aborts.
pub(crate) trait Evaluate: Send + Sync {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError>;
}

pub(crate) type BoxedKeyword = Box<dyn Evaluate + Send + Sync>;
pub(crate) type CompilationResult = Result<BoxedKeyword, EvaluationError>;

type CompileFunc =
    for<'a> fn(&compiler::Context<'a>, &Map<String, Value>, &Value) -> Option<CompilationResult>;

/// Dispatch priority: lower runs earlier. Ties break lexicographically, so
/// annotation delivery between equal-priority siblings is deterministic.
pub(crate) fn priority(keyword: &str) -> u8 {
    match keyword {
        "$ref" | "$recursiveRef" | "$dynamicRef" => 0,
        "allOf" | "anyOf" | "dependencies" | "dependentSchemas" | "if" | "not" | "oneOf"
        | "propertyNames" => 2,
        "additionalItems" | "contains" | "items" | "patternProperties" | "prefixItems"
        | "properties" => 3,
        "additionalProperties" => 4,
        "unevaluatedItems" | "unevaluatedProperties" => 5,
        _ => 1,
    }
}

/// Producers whose annotations a keyword reads; the dispatcher places a
/// keyword only after every present dependency has run.
pub(crate) fn dependencies(keyword: &str) -> &'static [&'static str] {
    match keyword {
        "additionalItems" => &["items"],
        "additionalProperties" => &["patternProperties", "properties"],
        "items" => &["prefixItems"],
        "unevaluatedItems" => &["additionalItems", "contains", "items", "prefixItems"],
        "unevaluatedProperties" => &["additionalProperties", "patternProperties", "properties"],
        _ => &[],
    }
}

/// The compile function for `keyword` under the context's dialect and active
/// vocabularies, or `None` when the keyword is not recognized there.
pub(crate) fn get_for_draft(ctx: &compiler::Context, keyword: &str) -> Option<CompileFunc> {
    match (ctx.draft(), keyword) {
        // Keywords common to all supported dialects
        (_, "$ref") => Some(ref_::compile_ref),
        (_, "additionalProperties") if ctx.has_vocabulary(&Vocabulary::Applicator) => {
            Some(additional_properties::compile)
        }
        (_, "allOf") if ctx.has_vocabulary(&Vocabulary::Applicator) => Some(all_of::compile),
        (_, "anyOf") if ctx.has_vocabulary(&Vocabulary::Applicator) => Some(any_of::compile),
        (_, "oneOf") if ctx.has_vocabulary(&Vocabulary::Applicator) => Some(one_of::compile),
        (_, "not") if ctx.has_vocabulary(&Vocabulary::Applicator) => Some(not::compile),
        (_, "contains") if ctx.has_vocabulary(&Vocabulary::Applicator) => Some(contains::compile),
        (_, "patternProperties") if ctx.has_vocabulary(&Vocabulary::Applicator) => {
            Some(pattern_properties::compile)
        }
        (_, "properties") if ctx.has_vocabulary(&Vocabulary::Applicator) => {
            Some(properties::compile)
        }
        (_, "propertyNames") if ctx.has_vocabulary(&Vocabulary::Applicator) => {
            Some(property_names::compile)
        }
        (_, "const") if ctx.has_vocabulary(&Vocabulary::Validation) => Some(const_::compile),
        (_, "enum") if ctx.has_vocabulary(&Vocabulary::Validation) => Some(enum_::compile),
        (_, "exclusiveMaximum") if ctx.has_vocabulary(&Vocabulary::Validation) => {
            Some(exclusive_maximum::compile)
        }
        (_, "exclusiveMinimum") if ctx.has_vocabulary(&Vocabulary::Validation) => {
            Some(exclusive_minimum::compile)
        }
        (_, "maximum") if ctx.has_vocabulary(&Vocabulary::Validation) => Some(maximum::compile),
        (_, "minimum") if ctx.has_vocabulary(&Vocabulary::Validation) => Some(minimum::compile),
        (_, "multipleOf") if ctx.has_vocabulary(&Vocabulary::Validation) => {
            Some(multiple_of::compile)
        }
        (_, "maxItems") if ctx.has_vocabulary(&Vocabulary::Validation) => Some(max_items::compile),
        (_, "minItems") if ctx.has_vocabulary(&Vocabulary::Validation) => Some(min_items::compile),
        (_, "maxLength") if ctx.has_vocabulary(&Vocabulary::Validation) => {
            Some(max_length::compile)
        }
        (_, "minLength") if ctx.has_vocabulary(&Vocabulary::Validation) => {
            Some(min_length::compile)
        }
        (_, "maxProperties") if ctx.has_vocabulary(&Vocabulary::Validation) => {
            Some(max_properties::compile)
        }
        (_, "minProperties") if ctx.has_vocabulary(&Vocabulary::Validation) => {
            Some(min_properties::compile)
        }
        (_, "pattern") if ctx.has_vocabulary(&Vocabulary::Validation) => Some(pattern::compile),
        (_, "required") if ctx.has_vocabulary(&Vocabulary::Validation) => Some(required::compile),
        (_, "type") if ctx.has_vocabulary(&Vocabulary::Validation) => Some(type_::compile),
        (_, "uniqueItems") if ctx.has_vocabulary(&Vocabulary::Validation) => {
            Some(unique_items::compile)
        }
        // `format` is always recognized; the active vocabulary decides
        // whether it asserts or annotates.
        (_, "format") => Some(format::compile),
        // Array applicators changed shape in 2020-12
        (Draft::Draft6 | Draft::Draft7 | Draft::Draft201909, "items")
            if ctx.has_vocabulary(&Vocabulary::Applicator) =>
        {
            Some(items::compile_legacy)
        }
        (Draft::Draft202012 | Draft::DraftNext, "items")
            if ctx.has_vocabulary(&Vocabulary::Applicator) =>
        {
            Some(items::compile)
        }
        (Draft::Draft6 | Draft::Draft7 | Draft::Draft201909, "additionalItems")
            if ctx.has_vocabulary(&Vocabulary::Applicator) =>
        {
            Some(additional_items::compile)
        }
        (Draft::Draft202012 | Draft::DraftNext, "prefixItems")
            if ctx.has_vocabulary(&Vocabulary::Applicator) =>
        {
            Some(prefix_items::compile)
        }
        // Dependency keywords: unified pre-2019, split afterwards
        (Draft::Draft6 | Draft::Draft7, "dependencies")
            if ctx.has_vocabulary(&Vocabulary::Applicator) =>
        {
            Some(dependencies::compile_legacy)
        }
        (Draft::Draft201909 | Draft::Draft202012 | Draft::DraftNext, "dependentRequired")
            if ctx.has_vocabulary(&Vocabulary::Validation) =>
        {
            Some(dependencies::compile_dependent_required)
        }
        (Draft::Draft201909 | Draft::Draft202012 | Draft::DraftNext, "dependentSchemas")
            if ctx.has_vocabulary(&Vocabulary::Applicator) =>
        {
            Some(dependencies::compile_dependent_schemas)
        }
        (Draft::Draft7 | Draft::Draft201909 | Draft::Draft202012 | Draft::DraftNext, "if")
            if ctx.has_vocabulary(&Vocabulary::Applicator) =>
        {
            Some(if_::compile)
        }
        // Locators beyond `$ref`
        (Draft::Draft201909, "$recursiveRef") => Some(ref_::compile_recursive_ref),
        (Draft::Draft202012 | Draft::DraftNext, "$dynamicRef") => Some(ref_::compile_dynamic_ref),
        // The unevaluated family moved into its own vocabulary in 2020-12
        (Draft::Draft201909, "unevaluatedItems")
            if ctx.has_vocabulary(&Vocabulary::Applicator) =>
        {
            Some(unevaluated_items::compile)
        }
        (Draft::Draft202012 | Draft::DraftNext, "unevaluatedItems")
            if ctx.has_vocabulary(&Vocabulary::Unevaluated) =>
        {
            Some(unevaluated_items::compile)
        }
        (Draft::Draft201909, "unevaluatedProperties")
            if ctx.has_vocabulary(&Vocabulary::Applicator) =>
        {
            Some(unevaluated_properties::compile)
        }
        (Draft::Draft202012 | Draft::DraftNext, "unevaluatedProperties")
            if ctx.has_vocabulary(&Vocabulary::Unevaluated) =>
        {
            Some(unevaluated_properties::compile)
        }
        // Unknown or structural-only keyword
        _ => None,
    }
}
