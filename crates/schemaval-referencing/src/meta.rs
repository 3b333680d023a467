//! Embedded meta-schema documents for the supported dialects.
//!
//! Only the members the engine consumes are embedded: the identifier chain
//! and the `$vocabulary` declaration. Full structural validation of schemas
//! against their meta-schemas is out of scope for this crate.
use once_cell::sync::Lazy;
use serde_json::{json, Value};

pub static DRAFT6: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-06/schema#",
        "$id": "http://json-schema.org/draft-06/schema#",
        "title": "Core schema meta-schema",
        "type": ["object", "boolean"],
        "default": {}
    })
});

pub static DRAFT7: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$id": "http://json-schema.org/draft-07/schema#",
        "title": "Core schema meta-schema",
        "type": ["object", "boolean"],
        "default": true
    })
});

pub static DRAFT201909: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$id": "https://json-schema.org/draft/2019-09/schema",
        "$vocabulary": {
            "https://json-schema.org/draft/2019-09/vocab/core": true,
            "https://json-schema.org/draft/2019-09/vocab/applicator": true,
            "https://json-schema.org/draft/2019-09/vocab/validation": true,
            "https://json-schema.org/draft/2019-09/vocab/meta-data": true,
            "https://json-schema.org/draft/2019-09/vocab/format": false,
            "https://json-schema.org/draft/2019-09/vocab/content": true
        },
        "$recursiveAnchor": true,
        "title": "Core and Validation specifications meta-schema",
        "type": ["object", "boolean"]
    })
});

pub static DRAFT202012: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://json-schema.org/draft/2020-12/schema",
        "$vocabulary": {
            "https://json-schema.org/draft/2020-12/vocab/core": true,
            "https://json-schema.org/draft/2020-12/vocab/applicator": true,
            "https://json-schema.org/draft/2020-12/vocab/unevaluated": true,
            "https://json-schema.org/draft/2020-12/vocab/validation": true,
            "https://json-schema.org/draft/2020-12/vocab/meta-data": true,
            "https://json-schema.org/draft/2020-12/vocab/format-annotation": true,
            "https://json-schema.org/draft/2020-12/vocab/content": true
        },
        "$dynamicAnchor": "meta",
        "title": "Core and Validation specifications meta-schema",
        "type": ["object", "boolean"]
    })
});

pub static DRAFT_NEXT: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/next/schema",
        "$id": "https://json-schema.org/draft/next/schema",
        "$vocabulary": {
            "https://json-schema.org/draft/next/vocab/core": true,
            "https://json-schema.org/draft/next/vocab/applicator": true,
            "https://json-schema.org/draft/next/vocab/unevaluated": true,
            "https://json-schema.org/draft/next/vocab/validation": true,
            "https://json-schema.org/draft/next/vocab/meta-data": true,
            "https://json-schema.org/draft/next/vocab/format-annotation": true,
            "https://json-schema.org/draft/next/vocab/content": true
        },
        "$dynamicAnchor": "meta",
        "title": "Core and Validation specifications meta-schema",
        "type": ["object", "boolean"]
    })
});

pub(crate) static META_SCHEMAS: Lazy<[(&'static str, &'static Value); 5]> = Lazy::new(|| {
    [
        ("http://json-schema.org/draft-06/schema#", &*DRAFT6),
        ("http://json-schema.org/draft-07/schema#", &*DRAFT7),
        ("https://json-schema.org/draft/2019-09/schema", &*DRAFT201909),
        ("https://json-schema.org/draft/2020-12/schema", &*DRAFT202012),
        ("https://json-schema.org/draft/next/schema", &*DRAFT_NEXT),
    ]
});
