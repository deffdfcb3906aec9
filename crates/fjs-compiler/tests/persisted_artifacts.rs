//! Property tests for the persisted artifact form.
//!
//! Emission must be deterministic, and a reloaded artifact must accept and
//! reject exactly what the in-memory artifact does.

use fjs_compiler::{compile, emit, write_artifact, Handlers, ValidationArtifact};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Small schemas built from keywords that cannot fail to compile.
///
/// Some are wrapped in a root that recurses through `$ref`s under
/// `properties`, so the program has more than one routine.
fn schema_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(json!({"type": "string"})),
        Just(json!({"type": "integer", "minimum": 0})),
        Just(json!({"type": "number", "maximum": 100.5})),
        Just(json!({"type": "boolean"})),
        Just(json!({"enum": [1, "one", null]})),
        Just(json!({"type": "string", "pattern": "^[a-z]+$", "maxLength": 8})),
        Just(json!(true)),
    ];
    let body = leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::btree_map("[a-c]", inner.clone(), 1..3).prop_map(|props| {
                let required: Vec<&String> = props.keys().take(1).collect();
                json!({"type": "object", "properties": props, "required": required})
            }),
            prop::collection::btree_map("[a-c]", inner.clone(), 0..2).prop_map(|mut props| {
                props.insert("d".to_string(), json!({"type": "string", "default": "dflt"}));
                json!({"type": "object", "properties": props})
            }),
            inner.clone().prop_map(|items| json!({"type": "array", "items": items})),
            prop::collection::vec(inner.clone(), 1..3).prop_map(|branches| json!({"anyOf": branches})),
            prop::collection::vec(inner, 1..3).prop_map(|branches| json!({"allOf": branches})),
        ]
    });
    (body, any::<bool>()).prop_map(|(schema, recursive)| {
        if !recursive {
            return schema;
        }
        json!({
            "type": "object",
            "definitions": {"node": schema},
            "properties": {
                "a": {"$ref": "#/definitions/node"},
                "b": {"$ref": "#"}
            }
        })
    })
}

fn instance_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..200).prop_map(Value::from),
        "[a-z0-9]{0,10}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
            prop::collection::btree_map("[a-c]", inner, 0..3)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn emission_is_deterministic(schema in schema_strategy()) {
        let (first, entry_a) = emit(&schema, Handlers::new()).unwrap();
        let (second, entry_b) = emit(&schema, Handlers::new()).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(entry_a, entry_b);
    }

    #[test]
    fn reloaded_artifact_agrees_with_in_memory(
        schema in schema_strategy(),
        instances in prop::collection::vec(instance_strategy(), 1..6),
    ) {
        let compiled = compile(&schema, Handlers::new()).unwrap();
        let (source, _) = emit(&schema, Handlers::new()).unwrap();
        let reloaded = ValidationArtifact::from_source(&source).unwrap();
        prop_assert_eq!(reloaded.digest(), compiled.digest());
        for instance in instances {
            prop_assert_eq!(
                compiled.validate(instance.clone()),
                reloaded.validate(instance)
            );
        }
    }
}

#[test]
fn written_artifact_loads_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("person.fjs.json");
    let schema = json!({
        "$id": "http://example.com/person.json",
        "type": "object",
        "required": ["name"],
        "properties": {
            "name": {"type": "string"},
            "tags": {"type": "array", "items": {"type": "string"}, "default": []}
        }
    });

    let entry_point = write_artifact(&path, &schema, Handlers::new(), false).unwrap();
    assert_eq!(entry_point, "validate_http_example_com_person_json");

    let loaded = ValidationArtifact::from_source(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded.entry_point(), entry_point);
    assert_eq!(
        loaded.validate(json!({"name": "Ada"})).unwrap(),
        json!({"name": "Ada", "tags": []})
    );
    assert_eq!(
        loaded.validate(json!({})).unwrap_err().message,
        "data must contain [\"name\"] properties"
    );

    let again = write_artifact(&path, &schema, Handlers::new(), false).unwrap_err();
    assert!(again.to_string().ends_with("already exists"));
}
