//! End-to-end evaluation scenarios across output formats.
use schemaval::OutputFormat;
use serde_json::{json, Value};

fn object_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"a": {"type": "integer"}},
        "required": ["a"]
    })
}

#[test]
fn valid_object_collects_annotations() {
    let result = schemaval::evaluate(&object_schema(), &json!({"a": 1})).expect("Evaluates");
    assert!(result.valid());
    assert_eq!(result.root().annotation("properties"), Some(&json!(["a"])));
}

#[test]
fn verbose_output_shape() {
    let result = schemaval::evaluate(&object_schema(), &json!({"a": 1})).expect("Evaluates");
    assert_eq!(
        serde_json::to_value(result.verbose()).expect("Serializable"),
        json!({
            "valid": true,
            "evaluationPath": "",
            "schemaLocation": "schemaval:///",
            "instanceLocation": "",
            "annotations": {"properties": ["a"]},
            "details": [
                {
                    "valid": true,
                    "evaluationPath": "/properties/a",
                    "schemaLocation": "schemaval:///#/properties/a",
                    "instanceLocation": "/a"
                }
            ]
        })
    );
}

#[test]
fn type_mismatch_is_reported_at_the_nested_subschema() {
    let result = schemaval::evaluate(&object_schema(), &json!({"a": "x"})).expect("Evaluates");
    assert!(!result.valid());
    assert_eq!(
        serde_json::to_value(result.basic()).expect("Serializable"),
        json!({
            "valid": false,
            "details": [
                {
                    "valid": false,
                    "evaluationPath": "/properties/a",
                    "schemaLocation": "schemaval:///#/properties/a",
                    "instanceLocation": "/a",
                    "errors": [
                        {"keyword": "type", "message": "\"x\" is not of type \"integer\""}
                    ]
                }
            ]
        })
    );
}

#[test]
fn missing_required_property_is_reported_at_the_root() {
    let result = schemaval::evaluate(&object_schema(), &json!({})).expect("Evaluates");
    assert!(!result.valid());
    let units = result.basic().units();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].evaluation_path().to_string(), "");
    assert_eq!(units[0].errors().len(), 1);
    assert_eq!(units[0].errors()[0].keyword(), "required");
    assert_eq!(units[0].errors()[0].message(), "\"a\" is a required property");
}

#[test]
fn internal_references_resolve() {
    let schema = json!({"$ref": "#/$defs/x", "$defs": {"x": {"type": "string"}}});
    assert!(schemaval::is_valid(&schema, &json!("hi")));
    assert!(!schemaval::is_valid(&schema, &json!(1)));
}

#[test]
fn items_failure_produces_exactly_one_error_unit() {
    let schema = json!({"items": {"type": "integer"}});
    let result = schemaval::evaluate(&schema, &json!([1, 2, "x"])).expect("Evaluates");
    assert!(!result.valid());
    let units = result.basic().units();
    let error_units: Vec<_> = units
        .iter()
        .filter(|unit| !unit.errors().is_empty())
        .collect();
    assert_eq!(error_units.len(), 1);
    assert_eq!(error_units[0].evaluation_path().to_string(), "/items");
    assert_eq!(error_units[0].instance_location().to_string(), "/2");
    assert_eq!(error_units[0].errors()[0].keyword(), "type");
}

#[test]
fn all_of_keeps_every_branch_result() {
    let schema = json!({"allOf": [{"type": "integer"}, {"minimum": 0}]});
    let result = schemaval::evaluate(&schema, &json!(-3)).expect("Evaluates");
    assert!(!result.valid());
    let children = result.root().children();
    assert_eq!(children.len(), 2);
    assert!(children[0].valid());
    assert!(!children[1].valid());
    assert_eq!(children[0].evaluation_path().to_string(), "/allOf/0");
    assert_eq!(children[1].evaluation_path().to_string(), "/allOf/1");
}

#[test]
fn every_format_reports_the_same_validity() {
    let cases = [
        (object_schema(), json!({"a": 1})),
        (object_schema(), json!({"a": "x"})),
        (json!({"items": {"type": "integer"}}), json!([1, "x"])),
        (json!({"anyOf": [{"type": "string"}, {"minimum": 3}]}), json!(5)),
        (json!({"not": {"type": "integer"}}), json!(1)),
    ];
    for (schema, instance) in cases {
        let mut verdicts = Vec::new();
        for format in [
            OutputFormat::Flag,
            OutputFormat::Basic,
            OutputFormat::Detailed,
            OutputFormat::Verbose,
        ] {
            let evaluator = schemaval::options()
                .with_output_format(format)
                .build(&schema)
                .expect("Valid schema");
            verdicts.push(evaluator.evaluate(&instance).expect("Evaluates").valid());
        }
        assert!(
            verdicts.windows(2).all(|pair| pair[0] == pair[1]),
            "formats disagree for {instance}: {verdicts:?}"
        );
    }
}

#[test]
fn detailed_output_collapses_contentless_interior_nodes() {
    // The passing `allOf/0` branch has no errors or annotations and
    // disappears; the failing branch stays.
    let schema = json!({"allOf": [{"type": "integer"}, {"minimum": 0}]});
    let evaluator = schemaval::options()
        .with_output_format(OutputFormat::Detailed)
        .build(&schema)
        .expect("Valid schema");
    let result = evaluator.evaluate(&json!(-3)).expect("Evaluates");
    let output = serde_json::to_value(result.detailed()).expect("Serializable");
    let details = output["details"].as_array().expect("Has details");
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["evaluationPath"], json!("/allOf/1"));
}

#[test]
fn flag_output_serializes_to_a_bare_boolean_member() {
    let evaluator = schemaval::options()
        .with_output_format(OutputFormat::Flag)
        .build(&object_schema())
        .expect("Valid schema");
    let result = evaluator.evaluate(&json!({"a": 1})).expect("Evaluates");
    assert_eq!(
        serde_json::to_value(result.output()).expect("Serializable"),
        json!({"valid": true})
    );
}

#[test]
fn mathematical_integers_satisfy_integer_type() {
    assert!(schemaval::is_valid(&json!({"type": "integer"}), &json!(1.0)));
}

#[test]
fn multiple_of_uses_decimal_semantics() {
    assert!(schemaval::is_valid(&json!({"multipleOf": 0.1}), &json!(0.3)));
}

#[test]
fn cyclic_schema_with_noncyclic_instance_terminates() {
    let schema = json!({
        "type": "object",
        "properties": {"next": {"$ref": "#"}}
    });
    let instance = json!({"next": {"next": {"next": {}}}});
    assert!(schemaval::is_valid(&schema, &instance));
}

#[test]
fn evaluation_is_idempotent() {
    let schema = object_schema();
    let evaluator = schemaval::evaluator_for(&schema).expect("Valid schema");
    let first = evaluator.evaluate(&json!({"a": 1})).expect("Evaluates");
    let second = evaluator.evaluate(&json!({"a": 1})).expect("Evaluates");
    assert_eq!(first.root(), second.root());
}

#[test]
fn schema_round_trips_preserve_behaviour() {
    let schema = object_schema();
    let reencoded: Value =
        serde_json::from_str(&serde_json::to_string(&schema).expect("Serializable"))
            .expect("Valid JSON");
    for instance in [json!({"a": 1}), json!({"a": "x"}), json!({}), json!(7)] {
        assert_eq!(
            schemaval::is_valid(&schema, &instance),
            schemaval::is_valid(&reencoded, &instance),
            "round-trip changed the verdict for {instance}"
        );
    }
}

#[test]
fn member_order_does_not_change_the_verdict() {
    let schema = json!({
        "type": "object",
        "properties": {
            "a": {"type": "integer"},
            "b": {"type": "string"}
        },
        "required": ["a", "b"]
    });
    let forward: Value = serde_json::from_str(r#"{"a": 1, "b": "x"}"#).expect("Valid JSON");
    let backward: Value = serde_json::from_str(r#"{"b": "x", "a": 1}"#).expect("Valid JSON");
    assert_eq!(
        schemaval::is_valid(&schema, &forward),
        schemaval::is_valid(&schema, &backward)
    );
}
