use std::str::FromStr;

use fraction::{BigFraction, BigUint};
use serde_json::{Map, Number, Value};

use crate::{
    compiler,
    context::EvalContext,
    error::EvaluationError,
    keywords::{CompilationResult, Evaluate},
};

/// Exact decimal representation of a JSON number lexeme. The lexeme survives
/// decoding (arbitrary precision), so `0.1` really is one tenth here, not
/// the nearest binary float.
fn to_fraction(number: &Number) -> BigFraction {
    BigFraction::from_str(&number.to_string())
        .unwrap_or_else(|_| BigFraction::from(number.as_f64().unwrap_or(f64::NAN)))
}

pub(crate) struct MultipleOfIntegerEvaluator {
    multiple_of: Number,
    divisor: f64,
}

impl Evaluate for MultipleOfIntegerEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::Number(number) = instance {
            let Some(item) = number.as_f64() else {
                return Ok(());
            };
            // Any value with a non-zero fractional part cannot be a multiple
            // of an integer divisor.
            if !(item.fract() == 0. && (item % self.divisor) == 0.) {
                ctx.error(format!("{instance} is not a multiple of {}", self.multiple_of));
            }
        }
        Ok(())
    }
}

pub(crate) struct MultipleOfFractionEvaluator {
    multiple_of: Number,
    divisor: BigFraction,
}

impl Evaluate for MultipleOfFractionEvaluator {
    fn evaluate(&self, ctx: &mut EvalContext<'_>, instance: &Value) -> Result<(), EvaluationError> {
        if let Value::Number(number) = instance {
            let ratio = to_fraction(number) / self.divisor.clone();
            let is_multiple = match ratio.denom() {
                Some(denom) => denom == &BigUint::from(1_u8),
                None => true,
            };
            if !is_multiple {
                ctx.error(format!("{instance} is not a multiple of {}", self.multiple_of));
            }
        }
        Ok(())
    }
}

#[inline]
pub(crate) fn compile(
    ctx: &compiler::Context,
    _: &Map<String, Value>,
    value: &Value,
) -> Option<CompilationResult> {
    let Value::Number(multiple_of) = value else {
        return Some(Err(
            ctx.malformed("the value of 'multipleOf' must be a number")
        ));
    };
    match multiple_of.as_f64() {
        Some(divisor) if divisor.fract() == 0. => Some(Ok(Box::new(MultipleOfIntegerEvaluator {
            multiple_of: multiple_of.clone(),
            divisor,
        }))),
        _ => Some(Ok(Box::new(MultipleOfFractionEvaluator {
            multiple_of: multiple_of.clone(),
            divisor: to_fraction(multiple_of),
        }))),
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"multipleOf": 2}), &json!(4))]
    #[test_case(&json!({"multipleOf": 1.0}), &json!(4.0))]
    #[test_case(&json!({"multipleOf": 1.5}), &json!(4.5))]
    #[test_case(&json!({"multipleOf": 0.1}), &json!(0.3); "exact decimal semantics")]
    #[test_case(&json!({"multipleOf": 0.01}), &json!(1.07); "more decimal semantics")]
    #[test_case(&json!({"multipleOf": 2}), &json!("not a number"))]
    fn is_valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"multipleOf": 2}), &json!(7), "7 is not a multiple of 2")]
    #[test_case(&json!({"multipleOf": 1.5}), &json!(4), "4 is not a multiple of 1.5")]
    #[test_case(&json!({"multipleOf": 0.1}), &json!(0.35), "0.35 is not a multiple of 0.1")]
    fn error_message(schema: &Value, instance: &Value, expected: &str) {
        tests_util::expect_error_message(schema, instance, expected);
    }
}
