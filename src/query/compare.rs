//! Total-order comparison over heterogeneous JSON values
//!
//! Sorting and cursor derivation need a total, antisymmetric, transitive
//! order across every value a record field can hold, including the "field
//! is missing" state (represented as `None`).
//!
//! Ascending rank, lowest first:
//!
//! 1. numbers (numeric order)
//! 2. strings (code-point order)
//! 3. `true`
//! 4. `false`
//! 5. `null`
//! 6. everything else (arrays, objects) - mutually equal
//! 7. missing - always highest

use std::cmp::Ordering;

use serde_json::{Number, Value};

/// Type rank within the total order. Values of different ranks never
/// interleave.
fn rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Number(_)) => 0,
        Some(Value::String(_)) => 1,
        Some(Value::Bool(true)) => 2,
        Some(Value::Bool(false)) => 3,
        Some(Value::Null) => 4,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 5,
        None => 6,
    }
}

/// Compares two field values under the ascending total order.
///
/// Values equal by `==` compare `Equal` regardless of type.
pub fn compare(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    if left == right {
        return Ordering::Equal;
    }

    let left_rank = rank(left);
    let right_rank = rank(right);
    if left_rank != right_rank {
        return left_rank.cmp(&right_rank);
    }

    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => compare_numbers(a, b),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        // Same rank, no intra-rank order (arrays, objects)
        _ => Ordering::Equal,
    }
}

/// 2^127 as f64. Finite floats at or beyond this magnitude lie outside
/// the i128 range.
const I128_BOUND: f64 = 170141183460469231731687303715884105728.0;

/// Exact numeric comparison across integer and float representations.
///
/// Integers widen to i128 (covering both i64 and u64 payloads); a mixed
/// int/float pair compares the float's integral part exactly with the
/// fraction as tie-break. A lossy cast to f64 would make integers above
/// 2^53 compare inconsistently and break transitivity.
fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    match (integer_value(a), integer_value(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(a), None) => compare_int_float(a, float_value(b)),
        (None, Some(b)) => compare_int_float(b, float_value(a)).reverse(),
        (None, None) => float_value(a).total_cmp(&float_value(b)),
    }
}

fn integer_value(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn float_value(n: &Number) -> f64 {
    n.as_f64().unwrap_or(0.0)
}

fn compare_int_float(int: i128, float: f64) -> Ordering {
    if float >= I128_BOUND {
        return Ordering::Less;
    }
    if float < -I128_BOUND {
        return Ordering::Greater;
    }
    // An in-range integral f64 casts to i128 exactly
    match int.cmp(&(float.trunc() as i128)) {
        Ordering::Equal if float.fract() > 0.0 => Ordering::Less,
        Ordering::Equal if float.fract() < 0.0 => Ordering::Greater,
        ordering => ordering,
    }
}

/// Descending comparator: the reversal of [`compare`].
pub fn compare_desc(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    compare(left, right).reverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn cmp(left: &Value, right: &Value) -> Ordering {
        compare(Some(left), Some(right))
    }

    #[test]
    fn test_numbers_order_numerically() {
        assert_eq!(cmp(&json!(1), &json!(2)), Ordering::Less);
        assert_eq!(cmp(&json!(2.5), &json!(2)), Ordering::Greater);
        assert_eq!(cmp(&json!(-1), &json!(1)), Ordering::Less);
        assert_eq!(cmp(&json!(7), &json!(7)), Ordering::Equal);
    }

    #[test]
    fn test_mixed_numbers_above_float_precision() {
        // 2^53 + 1 has no exact f64 representation; a lossy cast would
        // rank these three inconsistently
        let big_int = json!(9007199254740993i64);
        let big_float = json!(9007199254740992.0);
        let same_int = json!(9007199254740992i64);

        assert_eq!(cmp(&big_int, &big_float), Ordering::Greater);
        assert_eq!(cmp(&big_float, &same_int), Ordering::Equal);
        assert_eq!(cmp(&big_int, &same_int), Ordering::Greater);
    }

    #[test]
    fn test_mixed_numbers_fraction_tie_break() {
        assert_eq!(cmp(&json!(1), &json!(1.5)), Ordering::Less);
        assert_eq!(cmp(&json!(-1), &json!(-1.5)), Ordering::Greater);
        assert_eq!(cmp(&json!(2), &json!(2.0)), Ordering::Equal);
    }

    #[test]
    fn test_u64_beyond_i64_range() {
        let huge = json!(u64::MAX);
        assert_eq!(cmp(&huge, &json!(i64::MAX)), Ordering::Greater);
        assert_eq!(cmp(&json!(-1), &huge), Ordering::Less);
        assert_eq!(cmp(&huge, &json!(1.0e40)), Ordering::Less);
    }

    #[test]
    fn test_strings_order_by_code_point() {
        assert_eq!(cmp(&json!("aaa"), &json!("aab")), Ordering::Less);
        assert_eq!(cmp(&json!("b"), &json!("a")), Ordering::Greater);
    }

    #[test]
    fn test_type_ranking() {
        // number < string < true < false < null < other < missing
        assert_eq!(cmp(&json!(900), &json!("aaa")), Ordering::Less);
        assert_eq!(cmp(&json!("zzz"), &json!(true)), Ordering::Less);
        assert_eq!(cmp(&json!(true), &json!(false)), Ordering::Less);
        assert_eq!(cmp(&json!(false), &json!(null)), Ordering::Less);
        assert_eq!(cmp(&json!(null), &json!([1])), Ordering::Less);
        assert_eq!(compare(Some(&json!({})), None), Ordering::Less);
    }

    #[test]
    fn test_other_values_mutually_equal() {
        assert_eq!(cmp(&json!([1, 2]), &json!({"a": 1})), Ordering::Equal);
        assert_eq!(cmp(&json!({"a": 1}), &json!({"b": 2})), Ordering::Equal);
    }

    #[test]
    fn test_missing_is_highest() {
        assert_eq!(compare(None, Some(&json!(null))), Ordering::Greater);
        assert_eq!(compare(None, None), Ordering::Equal);
    }

    #[test]
    fn test_descending_is_reversal() {
        assert_eq!(compare_desc(Some(&json!(1)), Some(&json!(2))), Ordering::Greater);
        assert_eq!(compare_desc(None, Some(&json!("x"))), Ordering::Less);
    }

    /// Strategy over the full value domain, including the missing state.
    /// Numbers deliberately cluster around the f64 integer-precision
    /// boundary so int/float mixes get exercised.
    fn field_value() -> impl Strategy<Value = Option<Value>> {
        let number = prop_oneof![
            any::<i64>().prop_map(|n| json!(n)),
            any::<u64>().prop_map(|n| json!(n)),
            (-1.0e30f64..1.0e30).prop_map(|f| json!(f)),
            (-4i64..=4).prop_map(|d| json!(9007199254740992i64 + d)),
            (-4i32..=4).prop_map(|d| json!(9007199254740992.0 + f64::from(d))),
        ];
        prop_oneof![
            Just(None),
            Just(Some(Value::Null)),
            any::<bool>().prop_map(|b| Some(Value::Bool(b))),
            number.prop_map(Some),
            "[a-c]{0,3}".prop_map(|s| Some(Value::String(s))),
            Just(Some(json!([1, 2]))),
            Just(Some(json!({"k": 1}))),
        ]
    }

    proptest! {
        #[test]
        fn prop_antisymmetric(a in field_value(), b in field_value()) {
            prop_assert_eq!(compare(a.as_ref(), b.as_ref()),
                            compare(b.as_ref(), a.as_ref()).reverse());
        }

        #[test]
        fn prop_transitive(a in field_value(), b in field_value(), c in field_value()) {
            let ab = compare(a.as_ref(), b.as_ref());
            let bc = compare(b.as_ref(), c.as_ref());
            if ab != Ordering::Greater && bc != Ordering::Greater {
                prop_assert_ne!(compare(a.as_ref(), c.as_ref()), Ordering::Greater);
            }
        }

        #[test]
        fn prop_reflexive(a in field_value()) {
            prop_assert_eq!(compare(a.as_ref(), a.as_ref()), Ordering::Equal);
        }
    }
}
