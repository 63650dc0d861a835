//! Integration tests for lv-redact.
//!
//! Each scenario feeds a realistic server log line through
//! `RedactionEngine::redact_line` and checks individual values of the
//! output by JSON pointer. They cover:
//! - filters, updates, inserts and aggregation pipelines
//! - eager field-name hashing and matching plan summaries
//! - Atlas Search and vector search stages
//! - namespace hashing, IP redaction and placeholder overrides

use lv_redact::{FieldNameHasher, RedactionConfig, RedactionEngine};
use serde_json::{json, Value};

const EPOCH: &str = "1970-01-01T00:00:00.000Z";
const ZERO_OID: &str = "000000000000000000000000";

fn entry(category: &str, msg: &str, attr: Value) -> Value {
    json!({
        "t": {"$date": "2025-05-30T09:47:39.001+00:00"},
        "s": "I",
        "c": category,
        "id": 51803,
        "ctx": "conn87195",
        "msg": msg,
        "attr": attr
    })
}

fn slow_query(attr: Value) -> Value {
    entry("COMMAND", "Slow query", attr)
}

fn redact(engine: &RedactionEngine, line: &Value) -> Value {
    let out = engine.redact_line(&line.to_string()).unwrap();
    serde_json::from_str(&out).unwrap()
}

/// Value at a JSON pointer below `attr`, or null when absent.
fn at(out: &Value, pointer: &str) -> Value {
    out.pointer(&format!("/attr{}", pointer))
        .cloned()
        .unwrap_or(Value::Null)
}

fn strings() -> RedactionConfig {
    RedactionConfig::default()
}

fn all() -> RedactionConfig {
    RedactionConfig::default()
        .with_redact_numbers(true)
        .with_redact_booleans(true)
        .with_redact_ips(true)
}

fn eager() -> RedactionConfig {
    RedactionConfig::default().with_eager_namespace("my_db.my_coll")
}

fn namespaces() -> RedactionConfig {
    RedactionConfig::default().with_redact_namespaces(true)
}

/// Pseudonyms depend only on the placeholder, so a fresh hasher gives the
/// same names the engine used.
fn h(name: &str) -> String {
    FieldNameHasher::new("REDACTED").hash(name)
}

fn engine(config: RedactionConfig) -> RedactionEngine {
    RedactionEngine::new(config).unwrap()
}

// ============================================================================
// Fixtures
// ============================================================================

fn simple_find() -> Value {
    slow_query(json!({
        "type": "command",
        "ns": "my_db.my_coll",
        "appName": "my_app",
        "command": {
            "find": "my_coll",
            "filter": {"foo": "simple string", "bar": "another simple string"},
            "sort": {"_id": -1},
            "limit": 1,
            "lsid": {"id": {"$uuid": "7938452b-c804-4245-8eed-d64238a3096e"}},
            "$db": "my_db"
        },
        "planSummary": "IXSCAN { foo: 1, bar: 1, _id: -1 }",
        "keysExamined": 540,
        "nreturned": 1,
        "remote": "20.40.131.128:11803",
        "durationMillis": 43
    }))
}

fn find_with_expr() -> Value {
    slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "find": "my_coll",
            "filter": {"$expr": {"$and": [
                {"$eq": ["$foo", "first value"]},
                {"$eq": ["$bar", "second value"]}
            ]}},
            "sort": {"_id": -1},
            "$db": "my_db"
        },
        "planSummary": "IXSCAN { foo: 1, bar: 1, _id: -1 }"
    }))
}

fn simple_aggregation() -> Value {
    slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "aggregate": "my_coll",
            "pipeline": [
                {"$match": {"status": "active", "createdAt": {"$lt": {"$date": "2024-05-01T00:00:00Z"}}}}
            ],
            "cursor": {},
            "$db": "my_db"
        }
    }))
}

fn complex_aggregation() -> Value {
    slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "aggregate": "my_coll",
            "pipeline": [
                {"$match": {"$expr": {"$and": [
                    {"$ne": ["$status", "deleted"]},
                    {"$lt": ["$createdAt", {"$date": "2024-01-01T00:00:00Z"}]}
                ]}}},
                {"$lookup": {
                    "from": "another_coll",
                    "let": {"orgId": "$organizationId"},
                    "pipeline": [
                        {"$match": {"organizationId": {"$oid": "65f0a1b2c3d4e5f6a7b8c9d0"}}},
                        {"$project": {"_id": 0, "name": 1, "createdAt": 1}}
                    ],
                    "as": "organization"
                }},
                {"$project": {"numericStatus": {"$cond": {
                    "if": {"$eq": ["$status", "active"]},
                    "then": -1,
                    "else": 1
                }}}}
            ],
            "$db": "my_db"
        }
    }))
}

fn aggregation_edge_cases() -> Value {
    slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "aggregate": "my_coll",
            "pipeline": [
                {"$bucket": {
                    "groupBy": "$year_born",
                    "boundaries": [1840, 1850, 1860, 1870, 1880],
                    "default": "Other",
                    "output": {"count": {"$sum": 1}}
                }},
                {"$count": "totalArtists"},
                {"$densify": {
                    "field": "timestamp",
                    "range": {"step": 1, "unit": "hour", "bounds": [
                        {"$date": "2021-05-18T00:00:00.000Z"},
                        {"$date": "2021-05-18T08:00:00.000Z"}
                    ]}
                }},
                {"$facet": {
                    "meta": [{"$count": "total"}],
                    "docs": [{"$limit": 10}, {"$skip": 0}]
                }}
            ],
            "$db": "my_db"
        }
    }))
}

fn compound_search() -> Value {
    slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "aggregate": "my_coll",
            "pipeline": [{"$search": {
                "index": "default",
                "compound": {
                    "should": [
                        {"text": {"query": "fruit", "path": "type"}},
                        {"compound": {"must": [
                            {"text": {"query": "organic", "path": "category"}},
                            {"equals": {"value": true, "path": "in_stock"}},
                            {"embeddedDocument": {
                                "path": "items",
                                "operator": {"compound": {
                                    "must": [{"text": {"query": "apple", "path": "items.tags"}}],
                                    "should": [{"text": {"query": "red", "path": "items.name"}}]
                                }},
                                "score": {"embedded": {"aggregate": "mean"}}
                            }}
                        ]}},
                        {"exists": {"path": "quantities.lemons"}},
                        {"geoShape": {
                            "relation": "disjoint",
                            "geometry": {"type": "Polygon", "coordinates": [[[-161.3, 22.1], [-152.9, 22.0], [-161.3, 22.1]]]},
                            "path": "address.location"
                        }}
                    ],
                    "minimumShouldMatch": 1
                }
            }}],
            "$db": "my_db"
        }
    }))
}

fn search_meta_facets() -> Value {
    slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "aggregate": "my_coll",
            "pipeline": [{"$searchMeta": {"facet": {
                "operator": {"range": {
                    "path": "released",
                    "gte": {"$date": "2000-01-01T00:00:00.000Z"},
                    "lte": {"$date": "2015-01-31T00:00:00.000Z"}
                }},
                "facets": {
                    "directorsFacet": {"type": "string", "path": "directors", "numBuckets": 7},
                    "yearFacet": {"type": "number", "path": "year", "boundaries": [2000, 2005, 2010, 2015]}
                }
            }}}],
            "$db": "my_db"
        }
    }))
}

// ============================================================================
// Filters and updates
// ============================================================================

#[test]
fn test_simple_find() {
    let out = redact(&engine(strings()), &simple_find());
    assert_eq!(at(&out, "/command/filter/foo"), json!("REDACTED"));
    assert_eq!(at(&out, "/command/filter/bar"), json!("REDACTED"));
    assert_eq!(at(&out, "/command/limit"), json!(1));
    assert_eq!(at(&out, "/nreturned"), json!(1));
    assert_eq!(at(&out, "/remote"), json!("20.40.131.128:11803"));
    assert_eq!(at(&out, "/planSummary"), json!("IXSCAN { foo: 1, bar: 1, _id: -1 }"));
}

#[test]
fn test_envelope_untouched() {
    let out = redact(&engine(all()), &simple_find());
    let input = simple_find();
    for key in ["t", "s", "c", "id", "ctx", "msg"] {
        assert_eq!(out[key], input[key], "envelope field {}", key);
    }
}

#[test]
fn test_expr_values() {
    let out = redact(&engine(strings()), &find_with_expr());
    assert_eq!(at(&out, "/command/filter/$expr/$and/0/$eq/0"), json!("$foo"));
    assert_eq!(at(&out, "/command/filter/$expr/$and/0/$eq/1"), json!("REDACTED"));
    assert_eq!(at(&out, "/command/filter/$expr/$and/1/$eq/1"), json!("REDACTED"));
}

#[test]
fn test_update_batch() {
    let line = entry(
        "WRITE",
        "Slow query",
        json!({
            "ns": "my_db.my_coll",
            "command": {
                "update": "my_coll",
                "updates": [{
                    "q": {"_id": {"$oid": "65f0a1b2c3d4e5f6a7b8c9d0"}},
                    "u": {"$set": {"timestamp": 1716800000, "foo": "new value", "bar": true}}
                }],
                "$db": "my_db"
            }
        }),
    );
    let out = redact(&engine(all()), &line);
    assert_eq!(at(&out, "/command/updates/0/q/_id/$oid"), json!(ZERO_OID));
    assert_eq!(at(&out, "/command/updates/0/u/$set/timestamp"), json!(0));
    assert_eq!(at(&out, "/command/updates/0/u/$set/foo"), json!("REDACTED"));
    assert_eq!(at(&out, "/command/updates/0/u/$set/bar"), json!(false));
    assert_eq!(at(&out, "/command/update"), json!("my_coll"));
}

fn update_one() -> Value {
    entry(
        "WRITE",
        "Slow query",
        json!({
            "type": "update",
            "ns": "my_db.my_coll",
            "command": {
                "q": {"_id": {"$in": ["a", "b"]}},
                "u": {"$set": {"foo": 5, "bar": "text"}},
                "multi": false,
                "upsert": false
            }
        }),
    )
}

#[test]
fn test_update_one_statement() {
    let out = redact(&engine(all()), &update_one());
    assert_eq!(at(&out, "/command/q/_id/$in/0"), json!("REDACTED"));
    assert_eq!(at(&out, "/command/u/$set/foo"), json!(0));
    assert_eq!(at(&out, "/command/u/$set/bar"), json!("REDACTED"));
}

#[test]
fn test_update_one_statement_eager() {
    let out = redact(&engine(eager()), &update_one());
    assert_eq!(
        at(&out, &format!("/command/q/{}/$in/0", h("_id"))),
        json!("REDACTED")
    );
    assert_eq!(
        at(&out, &format!("/command/u/$set/{}", h("bar"))),
        json!("REDACTED")
    );
    assert_eq!(at(&out, "/command/u/$set/bar"), Value::Null);
}

#[test]
fn test_inserts() {
    let line = entry(
        "WRITE",
        "Slow query",
        json!({
            "ns": "my_db.my_coll",
            "command": {
                "insert": "my_coll",
                "documents": [{
                    "foo": "a",
                    "bar": true,
                    "timestamp": {"$date": "2024-05-01T00:00:00Z"},
                    "val_arr": ["x", "y"],
                    "emb_doc_arr": [{"foo": "b", "bar": true, "timestamp": {"$date": "2024-05-01T00:00:00Z"}}]
                }],
                "ordered": true,
                "$db": "my_db"
            }
        }),
    );
    let out = redact(&engine(all()), &line);
    assert_eq!(at(&out, "/command/documents/0/foo"), json!("REDACTED"));
    assert_eq!(at(&out, "/command/documents/0/bar"), json!(false));
    assert_eq!(at(&out, "/command/documents/0/timestamp/$date"), json!(EPOCH));
    assert_eq!(at(&out, "/command/documents/0/val_arr/0"), json!("REDACTED"));
    assert_eq!(at(&out, "/command/documents/0/emb_doc_arr/0/foo"), json!("REDACTED"));
    assert_eq!(at(&out, "/command/documents/0/emb_doc_arr/0/bar"), json!(false));
    assert_eq!(
        at(&out, "/command/documents/0/emb_doc_arr/0/timestamp/$date"),
        json!(EPOCH)
    );
}

#[test]
fn test_unrelated_log_unchanged() {
    let line = entry(
        "NETWORK",
        "Successfully connected to host",
        json!({
            "hostAndPort": "atlas-okh9ti-shard-00-01.y13gh.mongodb.net:27017",
            "dnsResolutionTimeMillis": 7,
            "tcpConnectionTimeMillis": 2043,
            "tlsHandshakeTimeMillis": 11,
            "authTimeMillis": 0,
            "hookTime": null,
            "totalTimeMillis": 2061
        }),
    );
    let text = line.to_string();
    assert_eq!(engine(all()).redact_line(&text).unwrap(), text);
}

#[test]
fn test_nested_logical_query_with_override() {
    let line = slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "findAndModify": "my_coll",
            "query": {"$and": [
                {"name": "alice", "active": {"$ne": true}},
                {"$or": [
                    {"cAt": {"$lte": {"$date": "2024-05-01T00:00:00Z"}}},
                    {"uAt": {"$lte": {"$date": "2024-05-01T00:00:00Z"}}}
                ]}
            ]},
            "update": {"$set": {"uAt": {"$date": "2024-05-02T00:00:00Z"}}},
            "$db": "my_db"
        }
    }));
    let config = all().with_placeholder("<VALUE REDACTED>");
    let out = redact(&engine(config), &line);
    assert_eq!(at(&out, "/command/query/$and/0/name"), json!("<VALUE REDACTED>"));
    assert_eq!(at(&out, "/command/query/$and/0/active/$ne"), json!(false));
    assert_eq!(at(&out, "/command/query/$and/1/$or/0/cAt/$lte/$date"), json!(EPOCH));
    assert_eq!(at(&out, "/command/query/$and/1/$or/1/uAt/$lte/$date"), json!(EPOCH));
    assert_eq!(at(&out, "/command/update/$set/uAt/$date"), json!(EPOCH));
}

#[test]
fn test_in_and_elem_match() {
    let line = slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "find": "my_coll",
            "filter": {
                "foo": {"$in": ["a", "b"]},
                "transactions": {"$elemMatch": {"merchantId": 1234, "location": "Paris"}}
            },
            "$db": "my_db"
        }
    }));
    let out = redact(&engine(all()), &line);
    assert_eq!(at(&out, "/command/filter/foo/$in/0"), json!("REDACTED"));
    assert_eq!(at(&out, "/command/filter/foo/$in/1"), json!("REDACTED"));
    assert_eq!(
        at(&out, "/command/filter/transactions/$elemMatch/merchantId"),
        json!(0)
    );
    assert_eq!(
        at(&out, "/command/filter/transactions/$elemMatch/location"),
        json!("REDACTED")
    );
}

#[test]
fn test_get_more_originating_find() {
    let line = slow_query(json!({
        "type": "command",
        "ns": "my_db.my_coll",
        "command": {"getMore": 4812730213u64, "collection": "my_coll", "$db": "my_db"},
        "originatingCommand": {
            "find": "my_coll",
            "filter": {
                "foo": "a",
                "bar": "b",
                "$or": [
                    {"status": {"$nin": ["x", "y", "z"]}},
                    {"status": "q", "nested.stringAttribute": "s", "nested.numericAttribute": {"$ne": 5}}
                ]
            },
            "$db": "my_db"
        }
    }));
    let out = redact(&engine(all()), &line);
    assert_eq!(at(&out, "/command/getMore"), json!(4812730213u64));
    assert_eq!(at(&out, "/originatingCommand/filter/foo"), json!("REDACTED"));
    assert_eq!(at(&out, "/originatingCommand/filter/bar"), json!("REDACTED"));
    for i in 0..3 {
        assert_eq!(
            at(&out, &format!("/originatingCommand/filter/$or/0/status/$nin/{}", i)),
            json!("REDACTED")
        );
    }
    assert_eq!(at(&out, "/originatingCommand/filter/$or/1/status"), json!("REDACTED"));
    assert_eq!(
        at(&out, "/originatingCommand/filter/$or/1/nested.stringAttribute"),
        json!("REDACTED")
    );
    assert_eq!(
        at(&out, "/originatingCommand/filter/$or/1/nested.numericAttribute/$ne"),
        json!(0)
    );
}

#[test]
fn test_get_more_originating_aggregate() {
    let line = slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {"getMore": 1, "collection": "my_coll", "$db": "my_db"},
        "originatingCommand": {
            "aggregate": "my_coll",
            "pipeline": [
                {"$match": {
                    "str1": "a",
                    "str2": "b",
                    "cAt": {"$gte": {"$date": "2024-01-01T00:00:00Z"}, "$lte": {"$date": "2024-02-01T00:00:00Z"}}
                }},
                {"$lookup": {"from": "other_coll", "localField": "x", "foreignField": "y", "as": "joined"}},
                {"$project": {"other_docs": 0, "str1": 1}}
            ],
            "$db": "my_db"
        }
    }));
    let out = redact(&engine(all()), &line);
    let p = "/originatingCommand/pipeline";
    assert_eq!(at(&out, &format!("{}/0/$match/str1", p)), json!("REDACTED"));
    assert_eq!(at(&out, &format!("{}/0/$match/str2", p)), json!("REDACTED"));
    assert_eq!(at(&out, &format!("{}/0/$match/cAt/$gte/$date", p)), json!(EPOCH));
    assert_eq!(at(&out, &format!("{}/0/$match/cAt/$lte/$date", p)), json!(EPOCH));
    assert_eq!(at(&out, &format!("{}/1/$lookup/from", p)), json!("other_coll"));
    assert_eq!(at(&out, &format!("{}/1/$lookup/localField", p)), json!("x"));
    assert_eq!(at(&out, &format!("{}/2/$project/other_docs", p)), json!(0));
    assert_eq!(at(&out, &format!("{}/2/$project/str1", p)), json!(1));
}

#[test]
fn test_binary_data() {
    let line = slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "find": "my_coll",
            "filter": {"uuid": {"$binary": {"base64": "3Bo9kbFkRGePMeQh7ydlLQ==", "subType": "04"}}},
            "$db": "my_db"
        },
        "planningTimeMicros": 43226,
        "keysExamined": 1,
        "hasSortStage": false,
        "fromPlanCache": true
    }));
    let out = redact(&engine(strings()), &line);
    assert_eq!(at(&out, "/command/filter/uuid/$binary/subType"), json!("04"));
    assert_eq!(at(&out, "/command/filter/uuid/$binary/base64"), json!("REDACTED"));
    assert_eq!(at(&out, "/planningTimeMicros"), json!(43226));
    assert_eq!(at(&out, "/hasSortStage"), json!(false));
    assert_eq!(at(&out, "/fromPlanCache"), json!(true));

    let out = redact(&engine(eager()), &line);
    let uuid = h("uuid");
    assert_eq!(
        at(&out, &format!("/command/filter/{}/$binary/subType", uuid)),
        json!("04")
    );
    assert_eq!(
        at(&out, &format!("/command/filter/{}/$binary/base64", uuid)),
        json!("REDACTED")
    );
}

#[test]
fn test_emails() {
    let line = slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "find": "my_coll",
            "filter": {"$or": [
                {"username": "john.doe@example.com"},
                {"username": "jane+tag@mail.example.org"},
                {"username": "a.b-c@sub.domain.io"},
                {"username": "x@y.co"}
            ]},
            "$db": "my_db"
        }
    }));
    let out = redact(&engine(strings()), &line);
    for i in 0..4 {
        assert_eq!(
            at(&out, &format!("/command/filter/$or/{}/username", i)),
            json!("redacted@redacted.com")
        );
    }
}

#[test]
fn test_error_query_cmd() {
    let line = entry(
        "QUERY",
        "Plan executor error during find command",
        json!({
            "error": {"code": 292, "codeName": "QueryExceededMemoryLimitNoDiskUseAllowed"},
            "cmd": {"aggregate": "my_coll", "pipeline": [{"$match": {"foo": "bar"}}], "$db": "my_db"}
        }),
    );
    let out = redact(&engine(strings()), &line);
    assert_eq!(at(&out, "/cmd/pipeline/0/$match/foo"), json!("REDACTED"));
    assert_eq!(at(&out, "/error/codeName"), json!("QueryExceededMemoryLimitNoDiskUseAllowed"));
}

#[test]
fn test_canonical_date_and_nested_projection() {
    let line = slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "find": "my_coll",
            "filter": {"dob": {"$lt": {"$date": {"$numberLong": "-631152000000"}}}},
            "projection": {"address": {"city": 1}, "tags": {"$slice": 5}, "_id": 0},
            "$db": "my_db"
        }
    }));
    let out = redact(&engine(strings()), &line);
    assert_eq!(at(&out, "/command/filter/dob/$lt"), json!({"$date": EPOCH}));

    let out = redact(&engine(all()), &line);
    assert_eq!(at(&out, "/command/filter/dob/$lt/$date"), json!(EPOCH));
    assert_eq!(
        at(&out, "/command/projection"),
        json!({"address": {"city": 1}, "tags": {"$slice": 5}, "_id": 0})
    );
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_simple_aggregation() {
    let out = redact(&engine(strings()), &simple_aggregation());
    assert_eq!(at(&out, "/command/pipeline/0/$match/status"), json!("REDACTED"));
    assert_eq!(
        at(&out, "/command/pipeline/0/$match/createdAt/$lt/$date"),
        json!(EPOCH)
    );
    assert_eq!(at(&out, "/command/cursor"), json!({}));
}

#[test]
fn test_complex_aggregation() {
    let out = redact(&engine(all()), &complex_aggregation());
    let p = "/command/pipeline";
    assert_eq!(at(&out, &format!("{}/0/$match/$expr/$and/0/$ne/1", p)), json!("REDACTED"));
    assert_eq!(at(&out, &format!("{}/0/$match/$expr/$and/1/$lt/1/$date", p)), json!(EPOCH));
    assert_eq!(
        at(&out, &format!("{}/1/$lookup/pipeline/0/$match/organizationId/$oid", p)),
        json!(ZERO_OID)
    );
    assert_eq!(at(&out, &format!("{}/1/$lookup/from", p)), json!("another_coll"));
    assert_eq!(at(&out, &format!("{}/1/$lookup/as", p)), json!("organization"));
    assert_eq!(
        at(&out, &format!("{}/2/$project/numericStatus/$cond/if/$eq/1", p)),
        json!("REDACTED")
    );
    assert_eq!(at(&out, &format!("{}/2/$project/numericStatus/$cond/then", p)), json!(0));
    assert_eq!(at(&out, &format!("{}/2/$project/numericStatus/$cond/else", p)), json!(0));
}

#[test]
fn test_nested_project_inclusion() {
    let line = slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "aggregate": "my_coll",
            "pipeline": [
                {"$match": {"age": {"$gte": 21}}},
                {"$project": {"address": {"city": 1, "zip": 1}, "name": 1, "bonus": {"$add": ["$base", 100]}}}
            ],
            "$db": "my_db"
        }
    }));
    let out = redact(&engine(all()), &line);
    let p = "/command/pipeline";
    assert_eq!(at(&out, &format!("{}/0/$match/age/$gte", p)), json!(0));
    assert_eq!(
        at(&out, &format!("{}/1/$project/address", p)),
        json!({"city": 1, "zip": 1})
    );
    assert_eq!(at(&out, &format!("{}/1/$project/name", p)), json!(1));
    assert_eq!(at(&out, &format!("{}/1/$project/bonus/$add", p)), json!(["$base", 0]));
}

#[test]
fn test_complex_aggregation_eager() {
    let out = redact(&engine(eager()), &complex_aggregation());
    let p = "/command/pipeline";
    assert_eq!(at(&out, &format!("{}/0/$match/$expr/$and/0/$ne/0", p)), json!(h("status")));
    assert_eq!(at(&out, &format!("{}/0/$match/$expr/$and/0/$ne/1", p)), json!("REDACTED"));
    assert_eq!(at(&out, &format!("{}/0/$match/$expr/$and/1/$lt/0", p)), json!(h("createdAt")));
    assert_eq!(at(&out, &format!("{}/0/$match/$expr/$and/1/$lt/1/$date", p)), json!(EPOCH));
    assert_eq!(
        at(
            &out,
            &format!("{}/1/$lookup/pipeline/0/$match/{}/$oid", p, h("organizationId"))
        ),
        json!(ZERO_OID)
    );
    for (field, flag) in [("_id", 0), ("name", 1), ("createdAt", 1)] {
        assert_eq!(
            at(&out, &format!("{}/1/$lookup/pipeline/1/$project/{}", p, h(field))),
            json!(flag)
        );
    }
    let status = h("numericStatus");
    assert_eq!(
        at(&out, &format!("{}/2/$project/{}/$cond/if/$eq/1", p, status)),
        json!("REDACTED")
    );
    assert_eq!(at(&out, &format!("{}/2/$project/{}/$cond/then", p, status)), json!(-1));
    assert_eq!(at(&out, &format!("{}/2/$project/{}/$cond/else", p, status)), json!(1));
}

#[test]
fn test_aggregation_stage_edge_cases() {
    let out = redact(&engine(strings()), &aggregation_edge_cases());
    let p = "/command/pipeline";
    assert_eq!(
        at(&out, &format!("{}/0/$bucket/boundaries", p)),
        json!([1840, 1850, 1860, 1870, 1880])
    );
    assert_eq!(at(&out, &format!("{}/0/$bucket/groupBy", p)), json!("$year_born"));
    assert_eq!(at(&out, &format!("{}/0/$bucket/default", p)), json!("REDACTED"));
    assert_eq!(at(&out, &format!("{}/0/$bucket/output/count/$sum", p)), json!(1));
    assert_eq!(at(&out, &format!("{}/1/$count", p)), json!("totalArtists"));
    assert_eq!(at(&out, &format!("{}/2/$densify/field", p)), json!("timestamp"));
    assert_eq!(at(&out, &format!("{}/2/$densify/range/step", p)), json!(1));
    assert_eq!(at(&out, &format!("{}/2/$densify/range/bounds/0/$date", p)), json!(EPOCH));
    assert_eq!(at(&out, &format!("{}/2/$densify/range/bounds/1/$date", p)), json!(EPOCH));
    assert_eq!(at(&out, &format!("{}/3/$facet/meta/0/$count", p)), json!("total"));
    assert_eq!(at(&out, &format!("{}/3/$facet/docs/0/$limit", p)), json!(10));
    assert_eq!(at(&out, &format!("{}/3/$facet/docs/1/$skip", p)), json!(0));
}

#[test]
fn test_aggregation_stage_edge_cases_eager() {
    let out = redact(&engine(eager()), &aggregation_edge_cases());
    let p = "/command/pipeline";
    assert_eq!(at(&out, &format!("{}/0/$bucket/groupBy", p)), json!(h("$year_born")));
    assert_eq!(at(&out, &format!("{}/1/$count", p)), json!(h("totalArtists")));
    assert_eq!(at(&out, &format!("{}/2/$densify/field", p)), json!(h("timestamp")));
}

#[test]
fn test_exempt_stage_options_byte_identical() {
    let out = redact(&engine(strings()), &complex_aggregation());
    let input = complex_aggregation();
    assert_eq!(
        out.pointer("/attr/command/pipeline/1/$lookup/from"),
        input.pointer("/attr/command/pipeline/1/$lookup/from")
    );
    let out = redact(&engine(strings()), &aggregation_edge_cases());
    assert_eq!(
        out.pointer("/attr/command/pipeline/3/$facet/docs"),
        Some(&json!([{"$limit": 10}, {"$skip": 0}]))
    );
}

// ============================================================================
// Eager field-name hashing
// ============================================================================

#[test]
fn test_simple_find_eager() {
    let out = redact(&engine(eager()), &simple_find());
    assert_eq!(at(&out, "/command/filter/foo"), Value::Null);
    assert_eq!(at(&out, "/command/filter/bar"), Value::Null);
    assert_eq!(at(&out, &format!("/command/filter/{}", h("foo"))), json!("REDACTED"));
    assert_eq!(at(&out, &format!("/command/filter/{}", h("bar"))), json!("REDACTED"));
}

#[test]
fn test_eager_plan_summary_matches_command() {
    let out = redact(&engine(eager()), &find_with_expr());
    assert_eq!(at(&out, "/command/filter/$expr/$and/0/$eq/0"), json!(h("foo")));
    assert_eq!(at(&out, "/command/filter/$expr/$and/0/$eq/1"), json!("REDACTED"));
    assert_eq!(at(&out, "/command/filter/$expr/$and/1/$eq/0"), json!(h("bar")));
    assert_eq!(at(&out, "/command/sort/_id"), Value::Null);
    assert_eq!(at(&out, &format!("/command/sort/{}", h("_id"))), json!(-1));
    assert_eq!(
        at(&out, "/planSummary"),
        json!(format!(
            "IXSCAN {{ {}: 1, {}: 1, {}: -1 }}",
            h("foo"),
            h("bar"),
            h("_id")
        ))
    );
}

#[test]
fn test_simple_aggregation_eager() {
    let out = redact(&engine(eager()), &simple_aggregation());
    assert_eq!(at(&out, "/command/pipeline/0/$match/status"), Value::Null);
    assert_eq!(
        at(&out, &format!("/command/pipeline/0/$match/{}", h("status"))),
        json!("REDACTED")
    );
    assert_eq!(
        at(&out, &format!("/command/pipeline/0/$match/{}/$lt/$date", h("createdAt"))),
        json!(EPOCH)
    );
}

#[test]
fn test_eager_only_for_matching_namespace() {
    let config = RedactionConfig::default().with_eager_namespace("other_db.");
    let out = redact(&engine(config), &simple_find());
    assert_eq!(at(&out, "/command/filter/foo"), json!("REDACTED"));
    assert_eq!(at(&out, "/planSummary"), json!("IXSCAN { foo: 1, bar: 1, _id: -1 }"));
}

#[test]
fn test_mapping_records_pseudonyms() {
    let engine = engine(eager());
    redact(&engine, &simple_find());
    let mapping = engine.mapping().snapshot();
    assert_eq!(mapping.get("foo"), Some(&h("foo")));
    assert_eq!(mapping.get("_id"), Some(&h("_id")));
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn test_simple_search() {
    let line = slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "aggregate": "my_coll",
            "pipeline": [{"$search": {"index": "default", "text": {"query": "baseball", "path": "title"}}}],
            "$db": "my_db"
        }
    }));
    let out = redact(&engine(strings()), &line);
    assert_eq!(at(&out, "/command/pipeline/0/$search/index"), json!("default"));
    assert_eq!(at(&out, "/command/pipeline/0/$search/text/query"), json!("REDACTED"));
    assert_eq!(at(&out, "/command/pipeline/0/$search/text/path"), json!("title"));
}

#[test]
fn test_search_path_object_form() {
    let line = slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "aggregate": "my_coll",
            "pipeline": [{"$search": {"text": {
                "query": "baseball",
                "path": {"value": "title", "multi": "english"}
            }}}],
            "$db": "my_db"
        }
    }));
    let path = "/command/pipeline/0/$search/text/path";
    let out = redact(&engine(strings()), &line);
    assert_eq!(at(&out, path), json!({"value": "title", "multi": "english"}));
    assert_eq!(at(&out, "/command/pipeline/0/$search/text/query"), json!("REDACTED"));

    let out = redact(&engine(eager()), &line);
    assert_eq!(at(&out, path), json!({"value": h("title"), "multi": "english"}));
}

#[test]
fn test_compound_search() {
    let out = redact(&engine(strings()), &compound_search());
    let s = "/command/pipeline/0/$search/compound";
    let cases = [
        ("/should/0/text/path", json!("type")),
        ("/should/0/text/query", json!("REDACTED")),
        ("/should/1/compound/must/0/text/path", json!("category")),
        ("/should/1/compound/must/0/text/query", json!("REDACTED")),
        ("/should/1/compound/must/1/equals/value", json!(true)),
        ("/should/1/compound/must/1/equals/path", json!("in_stock")),
        ("/should/1/compound/must/2/embeddedDocument/path", json!("items")),
        (
            "/should/1/compound/must/2/embeddedDocument/operator/compound/must/0/text/query",
            json!("REDACTED"),
        ),
        (
            "/should/1/compound/must/2/embeddedDocument/operator/compound/must/0/text/path",
            json!("items.tags"),
        ),
        (
            "/should/1/compound/must/2/embeddedDocument/operator/compound/should/0/text/query",
            json!("REDACTED"),
        ),
        (
            "/should/1/compound/must/2/embeddedDocument/operator/compound/should/0/text/path",
            json!("items.name"),
        ),
        (
            "/should/1/compound/must/2/embeddedDocument/score/embedded/aggregate",
            json!("mean"),
        ),
        ("/should/2/exists/path", json!("quantities.lemons")),
        ("/should/3/geoShape/relation", json!("disjoint")),
        ("/should/3/geoShape/geometry/type", json!("Polygon")),
        ("/should/3/geoShape/path", json!("address.location")),
        ("/minimumShouldMatch", json!(1)),
    ];
    for (path, expected) in cases {
        assert_eq!(at(&out, &format!("{}{}", s, path)), expected, "{}", path);
    }
}

#[test]
fn test_compound_search_eager() {
    let out = redact(&engine(eager()), &compound_search());
    let s = "/command/pipeline/0/$search/compound";
    let cases = [
        ("/should/0/text/path", json!(h("type"))),
        ("/should/0/text/query", json!("REDACTED")),
        ("/should/1/compound/must/1/equals/value", json!(true)),
        ("/should/1/compound/must/1/equals/path", json!(h("in_stock"))),
        ("/should/1/compound/must/2/embeddedDocument/path", json!(h("items"))),
        (
            "/should/1/compound/must/2/embeddedDocument/operator/compound/must/0/text/path",
            json!(h("items.tags")),
        ),
        (
            "/should/1/compound/must/2/embeddedDocument/score/embedded/aggregate",
            json!("mean"),
        ),
        ("/should/2/exists/path", json!(h("quantities.lemons"))),
        ("/should/3/geoShape/relation", json!("disjoint")),
        ("/should/3/geoShape/path", json!(h("address.location"))),
        ("/minimumShouldMatch", json!(1)),
    ];
    for (path, expected) in cases {
        assert_eq!(at(&out, &format!("{}{}", s, path)), expected, "{}", path);
    }
}

#[test]
fn test_search_meta_facets() {
    let out = redact(&engine(strings()), &search_meta_facets());
    let f = "/command/pipeline/0/$searchMeta/facet";
    assert_eq!(at(&out, &format!("{}/operator/range/gte/$date", f)), json!(EPOCH));
    assert_eq!(at(&out, &format!("{}/operator/range/lte/$date", f)), json!(EPOCH));
    assert_eq!(at(&out, &format!("{}/operator/range/path", f)), json!("released"));
    assert_eq!(at(&out, &format!("{}/facets/directorsFacet/type", f)), json!("string"));
    assert_eq!(at(&out, &format!("{}/facets/directorsFacet/path", f)), json!("directors"));
    assert_eq!(at(&out, &format!("{}/facets/directorsFacet/numBuckets", f)), json!(7));
    assert_eq!(at(&out, &format!("{}/facets/yearFacet/type", f)), json!("number"));
    assert_eq!(at(&out, &format!("{}/facets/yearFacet/path", f)), json!("year"));
}

#[test]
fn test_search_meta_facets_eager() {
    let out = redact(&engine(eager()), &search_meta_facets());
    let f = "/command/pipeline/0/$searchMeta/facet/facets";
    let year = h("yearFacet");
    assert_eq!(at(&out, &format!("{}/yearFacet", f)), Value::Null);
    assert_eq!(at(&out, &format!("{}/{}/type", f, year)), json!("number"));
    assert_eq!(at(&out, &format!("{}/{}/path", f, year)), json!(h("year")));
}

#[test]
fn test_vector_search() {
    let line = slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "aggregate": "my_coll",
            "pipeline": [{"$vectorSearch": {
                "index": "vector_index",
                "path": "plot_embedding",
                "queryVector": [-0.0016261312, -0.028070757, -0.011342932],
                "numCandidates": 150,
                "limit": 10
            }}],
            "$db": "my_db"
        }
    }));
    let out = redact(&engine(all()), &line);
    let v = "/command/pipeline/0/$vectorSearch";
    assert_eq!(at(&out, &format!("{}/index", v)), json!("vector_index"));
    assert_eq!(at(&out, &format!("{}/path", v)), json!("plot_embedding"));
    assert_eq!(at(&out, &format!("{}/queryVector/0", v)), json!(0));
    assert_eq!(at(&out, &format!("{}/numCandidates", v)), json!(150));
    assert_eq!(at(&out, &format!("{}/limit", v)), json!(10));
}

#[test]
fn test_search_allowlist() {
    let line = slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "aggregate": "my_coll",
            "pipeline": [{"$search": {"compound": {"should": [
                {"text": {"query": "secret plot", "path": "plot"}},
                {"text": {"query": "secret title", "path": "title"}}
            ]}}}],
            "$db": "my_db"
        }
    }));
    let config = RedactionConfig::default().with_field_regex("^title$");
    let out = redact(&engine(config), &line);
    let s = "/command/pipeline/0/$search/compound/should";
    assert_eq!(at(&out, &format!("{}/0/text/query", s)), json!("secret plot"));
    assert_eq!(at(&out, &format!("{}/1/text/query", s)), json!("REDACTED"));
}

// ============================================================================
// Allowlist, namespaces and endpoints
// ============================================================================

#[test]
fn test_field_regex_allowlist() {
    let config = RedactionConfig::default().with_field_regex("^foo$");
    let out = redact(&engine(config), &simple_find());
    assert_eq!(at(&out, "/command/filter/foo"), json!("REDACTED"));
    assert_eq!(at(&out, "/command/filter/bar"), json!("another simple string"));
}

#[test]
fn test_simple_find_namespaces() {
    let out = redact(&engine(namespaces()), &simple_find());
    assert_eq!(at(&out, "/ns"), json!(h("my_db.my_coll")));
    assert_eq!(at(&out, "/command/find"), json!(h("my_coll")));
    assert_eq!(at(&out, "/command/$db"), json!(h("my_db")));
    assert_eq!(at(&out, "/command/filter/foo"), json!("REDACTED"));
    assert_eq!(at(&out, "/nreturned"), json!(1));
}

#[test]
fn test_aggregation_namespaces() {
    let out = redact(&engine(namespaces()), &complex_aggregation());
    assert_eq!(at(&out, "/ns"), json!(h("my_db.my_coll")));
    assert_eq!(at(&out, "/command/$db"), json!(h("my_db")));
    assert_eq!(at(&out, "/command/aggregate"), json!(h("my_coll")));
    assert_eq!(at(&out, "/command/pipeline/1/$lookup/from"), json!(h("another_coll")));
    assert_eq!(
        at(&out, "/command/pipeline/0/$match/$expr/$and/0/$ne/1"),
        json!("REDACTED")
    );
}

#[test]
fn test_find_and_modify_namespaces() {
    let line = slow_query(json!({
        "ns": "my_db.my_coll",
        "command": {
            "findAndModify": "my_coll",
            "query": {"_id": {"$oid": "65f0a1b2c3d4e5f6a7b8c9d0"}},
            "update": {
                "$set": {
                    "updatedAt": {"$date": "2024-05-01T00:00:00Z"},
                    "updatedBy": {"$oid": "65f0a1b2c3d4e5f6a7b8c9d1"},
                    "status": "done"
                },
                "$addToSet": {"tags": {"$each": ["a", "b", "c"]}}
            },
            "$db": "my_db"
        }
    }));
    let out = redact(&engine(namespaces()), &line);
    assert_eq!(at(&out, "/command/$db"), json!(h("my_db")));
    assert_eq!(at(&out, "/command/findAndModify"), json!(h("my_coll")));
    assert_eq!(at(&out, "/ns"), json!(h("my_db.my_coll")));
    assert_eq!(at(&out, "/command/update/$set/updatedAt/$date"), json!(EPOCH));
    assert_eq!(at(&out, "/command/update/$set/updatedBy/$oid"), json!(ZERO_OID));
    assert_eq!(at(&out, "/command/update/$set/status"), json!("REDACTED"));
    for i in 0..3 {
        assert_eq!(
            at(&out, &format!("/command/update/$addToSet/tags/$each/{}", i)),
            json!("REDACTED")
        );
    }
}

#[test]
fn test_connection_accepted_ip() {
    let line = entry(
        "NETWORK",
        "Connection accepted",
        json!({
            "remote": "192.168.1.15:54321",
            "uuid": {"uuid": {"$uuid": "0c1f4f4e-3c1f-4f4e-8c1f-4f4e3c1f4f4e"}},
            "connectionId": 87195,
            "connectionCount": 12
        }),
    );
    let config = RedactionConfig::default().with_redact_ips(true);
    let out = redact(&engine(config), &line);
    assert_eq!(at(&out, "/remote"), json!("255.255.255.255:65535"));
    assert_eq!(at(&out, "/connectionId"), json!(87195));
}

#[test]
fn test_authentication_client_ip() {
    let line = entry(
        "ACCESS",
        "Successfully authenticated",
        json!({
            "client": "10.1.2.3:40000",
            "isSpeculative": true,
            "mechanism": "SCRAM-SHA-256",
            "user": "app",
            "db": "admin"
        }),
    );
    let out = redact(&engine(all()), &line);
    assert_eq!(at(&out, "/client"), json!("255.255.255.255:65535"));
    assert_eq!(at(&out, "/mechanism"), json!("SCRAM-SHA-256"));
    assert_eq!(at(&out, "/isSpeculative"), json!(true));
}

#[test]
fn test_output_key_order_and_number_text() {
    let line = r#"{"t":{"$date":"2025-05-30T09:47:39.001+00:00"},"s":"I","c":"COMMAND","id":51803,"ctx":"conn1","msg":"Slow query","attr":{"ns":"d.c","command":{"find":"c","filter":{"z":"a","a":"b"},"$db":"d"},"cpuNanos":24778600,"ratio":1.50,"keyId":7469113720208097000}}"#;
    let out = engine(strings()).redact_line(line).unwrap();
    assert_eq!(
        out,
        r#"{"t":{"$date":"2025-05-30T09:47:39.001+00:00"},"s":"I","c":"COMMAND","id":51803,"ctx":"conn1","msg":"Slow query","attr":{"ns":"d.c","command":{"find":"c","filter":{"z":"REDACTED","a":"REDACTED"},"$db":"d"},"cpuNanos":24778600,"ratio":1.50,"keyId":7469113720208097000}}"#
    );
}
