//! Static taxonomy of MongoDB query, aggregation and search keywords.
//!
//! Every table maps a keyword to either a leaf [`OperatorClassification`] or
//! a nested table describing the keyword's sub-keys. The tables are built
//! once on first use and shared read-only for the life of the process.

use crate::classification::OperatorClassification;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Which keyword language governs a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Filter, update, expression and aggregation-stage language.
    Core,
    /// Atlas Search clauses under `$search`, `$searchMeta`, `$vectorSearch`.
    Search,
}

/// One entry of an [`OperatorTable`].
#[derive(Debug, Clone)]
pub enum OperatorNode {
    Leaf(OperatorClassification),
    Table(OperatorTable),
}

/// Keyword table for one level of the taxonomy.
#[derive(Debug, Clone)]
pub struct OperatorTable {
    /// Applies when the keyword owning this table holds a scalar instead of
    /// a document (`{"$out": "coll"}`, `{"$unwind": "$items"}`).
    scalar: OperatorClassification,
    entries: HashMap<&'static str, OperatorNode>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self {
            scalar: OperatorClassification::Redactable,
            entries: HashMap::new(),
        }
    }
}

impl OperatorTable {
    /// Create a table from keyword entries.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, OperatorNode)>,
    {
        Self {
            scalar: OperatorClassification::Redactable,
            entries: entries.into_iter().collect(),
        }
    }

    /// Set the classification used when the owning keyword holds a scalar.
    pub fn with_scalar(mut self, classification: OperatorClassification) -> Self {
        self.scalar = classification;
        self
    }

    pub fn scalar_classification(&self) -> OperatorClassification {
        self.scalar
    }

    pub fn get(&self, keyword: &str) -> Option<&OperatorNode> {
        self.entries.get(keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.entries.contains_key(keyword)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every entry of `other` into this table, replacing duplicates.
    pub fn merge(&mut self, other: &OperatorTable) {
        for (keyword, node) in &other.entries {
            self.entries.insert(keyword, node.clone());
        }
    }

    /// Keywords of this table whose values name fields.
    pub fn field_name_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().filter_map(|(keyword, node)| match node {
            OperatorNode::Leaf(OperatorClassification::FieldName) => Some(*keyword),
            _ => None,
        })
    }

    /// Returns true if this table pairs a field-name entry with at least one
    /// redactable entry, like `{"path": .., "query": ..}` search clauses.
    pub fn pairs_field_with_values(&self) -> bool {
        let has_redactable = self
            .entries
            .values()
            .any(|node| matches!(node, OperatorNode::Leaf(OperatorClassification::Redactable)));
        has_redactable && self.field_name_keys().next().is_some()
    }

    /// Shallow copy of this table with every redactable leaf turned exempt.
    ///
    /// The shared static tables are never mutated; the copy only lives for
    /// the evaluation of one clause.
    pub fn exempting_values(&self) -> OperatorTable {
        let entries = self
            .entries
            .iter()
            .map(|(keyword, node)| {
                let node = match node {
                    OperatorNode::Leaf(OperatorClassification::Redactable) => {
                        OperatorNode::Leaf(OperatorClassification::Exempt)
                    }
                    other => other.clone(),
                };
                (*keyword, node)
            })
            .collect();
        OperatorTable {
            scalar: self.scalar,
            entries,
        }
    }
}

const R: OperatorNode = OperatorNode::Leaf(OperatorClassification::Redactable);
const E: OperatorNode = OperatorNode::Leaf(OperatorClassification::Exempt);
const F: OperatorNode = OperatorNode::Leaf(OperatorClassification::FieldName);
const NS: OperatorNode = OperatorNode::Leaf(OperatorClassification::Namespace);
const P: OperatorNode = OperatorNode::Leaf(OperatorClassification::Pipeline);
const ARR: OperatorNode = OperatorNode::Leaf(OperatorClassification::OperatorArray);
const MAP: OperatorNode = OperatorNode::Leaf(OperatorClassification::OperatorMap);

fn table<const K: usize>(entries: [(&'static str, OperatorNode); K]) -> OperatorNode {
    OperatorNode::Table(OperatorTable::new(entries))
}

fn scalar_table<const K: usize>(
    scalar: OperatorClassification,
    entries: [(&'static str, OperatorNode); K],
) -> OperatorNode {
    OperatorNode::Table(OperatorTable::new(entries).with_scalar(scalar))
}

fn geo_json() -> OperatorNode {
    table([("type", E), ("coordinates", R)])
}

/// Aggregation pipeline stages.
pub static AGGREGATION_OPERATORS: Lazy<OperatorTable> = Lazy::new(|| {
    OperatorTable::new([
        ("$addFields", R),
        (
            "$bucket",
            table([
                ("boundaries", R),
                ("default", R),
                ("output", R),
                ("groupBy", F),
            ]),
        ),
        (
            "$bucketAuto",
            table([
                ("granularity", E),
                ("output", R),
                ("buckets", E),
                ("groupBy", F),
            ]),
        ),
        (
            "$changeStream",
            table([
                ("allChangesForCluster", E),
                ("fullDocument", E),
                ("fullDocumentBeforeChange", E),
                ("resumeAfter", R),
                ("showExpandedEvents", E),
                ("startAfter", R),
                ("startAtOperationTime", R),
            ]),
        ),
        ("$changeStreamSplitLargeEvent", E),
        (
            "$collStats",
            table([
                ("latencyStats", E),
                ("storageStats", E),
                ("count", E),
                ("queryExecStats", E),
            ]),
        ),
        ("$count", F),
        (
            "$currentOp",
            table([
                ("allUsers", E),
                ("idleConnections", E),
                ("idleCursors", E),
                ("idleSessions", E),
                ("localOps", E),
            ]),
        ),
        (
            "$densify",
            table([
                ("field", F),
                ("partitionByFields", F),
                (
                    "range",
                    table([("step", E), ("units", E), ("bounds", R)]),
                ),
            ]),
        ),
        ("$documents", R),
        ("$facet", P),
        (
            "$fill",
            table([
                ("partitionByFields", F),
                ("partitionBy", R),
                ("sortBy", F),
                ("output", R),
            ]),
        ),
        (
            "$geoNear",
            table([
                ("distanceField", F),
                ("distanceMultiplier", R),
                ("includeLocs", F),
                ("key", F),
                ("maxDistance", R),
                ("minDistance", R),
                ("near", R),
                ("query", R),
                ("spherical", E),
            ]),
        ),
        (
            "$graphLookup",
            table([
                ("from", NS),
                ("startWith", R),
                ("connectFromField", F),
                ("connectToField", F),
                ("as", E),
                ("maxDepth", E),
                ("depthField", F),
                ("restrictSearchWithMatch", R),
            ]),
        ),
        ("$group", table([("_id", R)])),
        ("$indexStats", E),
        ("$limit", E),
        (
            "$listLocalSessions",
            table([("users", R), ("allUsers", E)]),
        ),
        ("$listSampledQueries", table([("namespace", NS)])),
        ("$listSearchIndexes", table([("id", R), ("name", R)])),
        ("$listSessions", table([("users", R), ("allUsers", E)])),
        (
            "$lookup",
            table([
                ("from", NS),
                ("localField", F),
                ("foreignField", F),
                ("let", R),
                ("pipeline", P),
                ("as", E),
            ]),
        ),
        ("$match", R),
        (
            "$merge",
            scalar_table(
                OperatorClassification::Namespace,
                [
                    ("into", NS),
                    ("db", NS),
                    ("coll", NS),
                    ("on", F),
                    ("let", R),
                    ("whenMatched", P),
                    ("whenNotMatched", E),
                ],
            ),
        ),
        (
            "$out",
            scalar_table(
                OperatorClassification::Namespace,
                [("db", NS), ("coll", NS), ("timeseries", E)],
            ),
        ),
        ("$planCacheStats", E),
        ("$project", R),
        ("$querySettings", E),
        ("$queryStats", E),
        ("$redact", R),
        ("$replaceRoot", table([("newRoot", F)])),
        ("$replaceWith", R),
        ("$sample", E),
        ("$set", R),
        (
            "$setWindowFields",
            table([
                ("partitionBy", R),
                ("sortBy", F),
                ("output", R),
                ("window", R),
            ]),
        ),
        ("$shardedDataDistribution", E),
        ("$skip", E),
        ("$sort", R),
        ("$sortByCount", F),
        (
            "$unionWith",
            scalar_table(
                OperatorClassification::Namespace,
                [("coll", NS), ("pipeline", P)],
            ),
        ),
        ("$unset", F),
        (
            "$unwind",
            scalar_table(
                OperatorClassification::FieldName,
                [
                    ("path", F),
                    ("includeArrayIndex", F),
                    ("preserveNullAndEmptyArrays", E),
                ],
            ),
        ),
    ])
});

/// Query, update and expression operators, plus every aggregation stage.
pub static CORE_OPERATORS: Lazy<OperatorTable> = Lazy::new(|| {
    let mut core = OperatorTable::new([
        // Comparison and logical query operators
        ("$eq", R),
        ("$gt", R),
        ("$gte", R),
        ("$in", R),
        ("$lt", R),
        ("$lte", R),
        ("$ne", R),
        ("$nin", R),
        ("$and", ARR),
        ("$not", R),
        ("$nor", ARR),
        ("$or", ARR),
        ("$exists", E),
        ("$type", E),
        ("$expr", R),
        ("$jsonSchema", R),
        ("$mod", R),
        ("$regex", R),
        ("$options", E),
        (
            "$text",
            table([
                ("$search", R),
                ("$language", E),
                ("$caseSensitive", E),
                ("$diacriticSensitive", E),
            ]),
        ),
        ("$where", R),
        ("$comment", R),
        // Geospatial
        ("$geoIntersects", R),
        ("$geoWithin", R),
        ("$near", R),
        ("$nearSphere", R),
        ("$geometry", geo_json()),
        ("$maxDistance", R),
        ("$minDistance", R),
        ("$box", R),
        ("$center", R),
        ("$centerSphere", R),
        ("$polygon", R),
        // Arrays and projection
        ("$all", R),
        ("$elemMatch", R),
        ("$size", R),
        ("$slice", R),
        ("$meta", E),
        ("$natural", E),
        // Bitwise
        ("$bitsAllClear", R),
        ("$bitsAllSet", R),
        ("$bitsAnyClear", R),
        ("$bitsAnySet", R),
        ("$rand", R),
        // Update operators
        ("$currentDate", R),
        ("$inc", R),
        ("$min", R),
        ("$max", R),
        ("$mul", R),
        ("$rename", R),
        ("$setOnInsert", R),
        ("$addToSet", R),
        ("$pop", R),
        ("$pull", R),
        ("$push", R),
        ("$pullAll", R),
        ("$each", R),
        ("$position", R),
        ("$bit", R),
        // Arithmetic expressions
        ("$abs", R),
        ("$add", R),
        ("$ceil", R),
        ("$divide", R),
        ("$exp", R),
        ("$floor", R),
        ("$ln", R),
        ("$log", R),
        ("$log10", R),
        ("$multiply", R),
        ("$pow", R),
        ("$round", R),
        ("$sqrt", R),
        ("$subtract", R),
        ("$trunc", R),
        // Array expressions
        ("$arrayElemAt", R),
        ("$arrayToObject", R),
        ("$concatArrays", R),
        (
            "$filter",
            table([("input", R), ("as", E), ("cond", R), ("limit", R)]),
        ),
        ("$firstN", R),
        ("$indexOfArray", R),
        ("$isArray", R),
        ("$lastN", R),
        ("$map", table([("input", R), ("as", E), ("in", R)])),
        ("$maxN", R),
        ("$minN", R),
        ("$objectToArray", R),
        ("$range", R),
        (
            "$reduce",
            table([("input", R), ("initialValue", R), ("in", R)]),
        ),
        ("$reverseArray", R),
        ("$sortArray", table([("input", R), ("sortBy", F)])),
        ("$zip", R),
        // Comparison, set and boolean expressions
        ("$cmp", R),
        ("$setUnion", R),
        ("$setIntersection", R),
        ("$setDifference", R),
        ("$setEquals", R),
        ("$setIsSubset", R),
        ("$allElementsTrue", R),
        ("$anyElementTrue", R),
        // String expressions
        ("$concat", R),
        ("$toUpper", R),
        ("$toLower", R),
        ("$substr", R),
        ("$substrBytes", R),
        ("$substrCP", R),
        ("$strLenCP", R),
        ("$strLenBytes", R),
        ("$strcasecmp", R),
        ("$split", R),
        ("$trim", R),
        ("$ltrim", R),
        ("$rtrim", R),
        ("$indexOfBytes", R),
        ("$indexOfCP", R),
        ("$replaceOne", R),
        ("$replaceAll", R),
        (
            "$regexMatch",
            table([("input", R), ("regex", R), ("options", E)]),
        ),
        (
            "$regexFind",
            table([("input", R), ("regex", R), ("options", E)]),
        ),
        (
            "$regexFindAll",
            table([("input", R), ("regex", R), ("options", E)]),
        ),
        // Type conversion
        (
            "$convert",
            table([("input", R), ("to", E), ("onError", R), ("onNull", R)]),
        ),
        ("$toString", R),
        ("$toInt", R),
        ("$toLong", R),
        ("$toDouble", R),
        ("$toDecimal", R),
        ("$toDate", R),
        ("$toObjectId", R),
        ("$toBool", R),
        ("$isNumber", R),
        // Dates
        (
            "$dateToString",
            table([
                ("format", E),
                ("date", R),
                ("timezone", E),
                ("onNull", R),
            ]),
        ),
        ("$dateFromString", R),
        ("$dateAdd", R),
        ("$dateDiff", R),
        ("$dateTrunc", R),
        ("$year", R),
        ("$month", R),
        ("$dayOfMonth", R),
        ("$hour", R),
        ("$minute", R),
        ("$second", R),
        // Conditionals and variables
        (
            "$cond",
            table([("if", R), ("then", R), ("else", R)]),
        ),
        ("if", R),
        ("then", R),
        ("else", R),
        ("$ifNull", R),
        ("$switch", R),
        ("branches", ARR),
        ("case", R),
        ("$let", table([("vars", R), ("in", R)])),
        ("$literal", R),
        ("$getField", table([("field", F), ("input", R)])),
        ("$setField", table([("field", F), ("input", R), ("value", R)])),
        ("$mergeObjects", R),
        // Accumulators
        ("$sum", R),
        ("$avg", R),
        ("$first", R),
        ("$last", R),
        ("$stdDevPop", R),
        ("$stdDevSamp", R),
        ("$top", R),
        ("$bottom", R),
        ("$topN", R),
        ("$bottomN", R),
        // Extended JSON wrappers
        ("$oid", R),
        ("$date", R),
        ("$numberLong", R),
        ("$numberInt", R),
        ("$numberDouble", R),
        ("$numberDecimal", R),
        ("$uuid", R),
        ("$symbol", R),
        ("$code", R),
        ("$binary", table([("base64", R), ("subType", E)])),
        ("$timestamp", table([("t", R), ("i", R)])),
        (
            "$regularExpression",
            table([("pattern", R), ("options", E)]),
        ),
        ("$minKey", E),
        ("$maxKey", E),
        ("$undefined", E),
    ]);
    core.merge(&AGGREGATION_OPERATORS);
    core
});

/// Side tables for [`OperatorClassification::OperatorMap`] containers, keyed
/// by the keyword that owns the map.
pub static OPERATOR_MAP_DEFS: Lazy<HashMap<&'static str, OperatorTable>> = Lazy::new(|| {
    let mut defs = HashMap::new();
    defs.insert(
        "facets",
        OperatorTable::new([
            ("numBuckets", E),
            ("type", E),
            ("path", F),
            ("boundaries", R),
            ("default", R),
        ]),
    );
    defs
});

/// Atlas Search clause operators.
pub static SEARCH_OPERATORS: Lazy<OperatorTable> = Lazy::new(|| {
    OperatorTable::new([
        (
            "autocomplete",
            table([
                ("query", R),
                ("path", F),
                ("tokenOrder", E),
                ("fuzzy", E),
                ("score", E),
            ]),
        ),
        (
            "compound",
            table([
                ("must", ARR),
                ("mustNot", ARR),
                ("should", ARR),
                ("filter", R),
                ("score", E),
                ("minimumShouldMatch", E),
            ]),
        ),
        (
            "embeddedDocument",
            table([("path", F), ("operator", R), ("score", E)]),
        ),
        (
            "equals",
            table([("path", F), ("value", R), ("score", E)]),
        ),
        ("exists", table([("path", F), ("score", E)])),
        ("facet", table([("operator", R), ("facets", MAP)])),
        (
            "geoShape",
            table([
                ("path", F),
                ("relation", E),
                ("geometry", geo_json()),
                ("score", E),
            ]),
        ),
        (
            "geoWithin",
            table([
                ("path", F),
                (
                    "box",
                    table([("bottomLeft", geo_json()), ("topRight", geo_json())]),
                ),
                (
                    "circle",
                    table([("center", geo_json()), ("radius", R)]),
                ),
                ("geometry", geo_json()),
                ("score", E),
            ]),
        ),
        (
            "in",
            table([("path", F), ("score", E), ("value", R)]),
        ),
        ("moreLikeThis", table([("like", R), ("score", E)])),
        (
            "near",
            table([("path", F), ("origin", R), ("pivot", R), ("score", E)]),
        ),
        (
            "phrase",
            table([
                ("query", R),
                ("path", F),
                ("score", E),
                ("slop", E),
                ("synonyms", R),
            ]),
        ),
        (
            "queryString",
            table([("defaultPath", F), ("query", R)]),
        ),
        (
            "range",
            table([
                ("path", F),
                ("gte", R),
                ("gt", R),
                ("lte", R),
                ("lt", R),
                ("score", E),
            ]),
        ),
        (
            "regex",
            table([
                ("query", R),
                ("path", F),
                ("allowAnalyzedField", E),
                ("score", E),
            ]),
        ),
        (
            "span",
            table([
                ("term", table([("path", F), ("query", R)])),
                (
                    "contains",
                    table([
                        ("spanToReturn", E),
                        ("little", R),
                        ("big", R),
                        ("score", E),
                    ]),
                ),
                (
                    "first",
                    table([("endPositionLte", R), ("operator", R), ("score", E)]),
                ),
                (
                    "near",
                    table([
                        ("clauses", R),
                        ("slop", R),
                        ("inOrder", E),
                        ("score", E),
                    ]),
                ),
                ("or", table([("clauses", R), ("score", E)])),
                (
                    "subtract",
                    table([("include", R), ("exclude", R), ("score", E)]),
                ),
            ]),
        ),
        (
            "text",
            table([
                ("query", R),
                ("path", F),
                ("fuzzy", E),
                ("matchCriteria", E),
                ("score", E),
                ("synonyms", R),
            ]),
        ),
        (
            "wildcard",
            table([
                ("query", R),
                ("path", F),
                ("allowAnalyzedField", E),
                ("score", E),
            ]),
        ),
        ("numBuckets", E),
    ])
});

/// Search stages and the options they accept around their clause.
pub static SEARCH_AGGREGATION_OPERATORS: Lazy<OperatorTable> = Lazy::new(|| {
    let mut search = OperatorTable::new([
        ("index", E),
        (
            "highlight",
            table([
                ("path", F),
                ("maxCharsToExamine", E),
                ("maxNumPassages", E),
            ]),
        ),
        ("concurrent", E),
        ("count", table([("type", E), ("threshold", E)])),
        ("searchAfter", R),
        ("searchBefore", R),
        ("scoreDetails", E),
        ("sort", F),
        ("returnStoredSource", E),
        ("tracking", table([])),
    ]);
    search.merge(&SEARCH_OPERATORS);

    let vector_search = table([
        ("exact", E),
        ("filter", R),
        ("index", E),
        ("limit", E),
        ("numCandidates", E),
        ("path", F),
        ("queryVector", R),
    ]);

    OperatorTable::new([
        ("$search", OperatorNode::Table(search.clone())),
        ("$searchMeta", OperatorNode::Table(search)),
        ("$vectorSearch", vector_search),
    ])
});

/// Returns true if `key` is a pipeline stage that switches its subtree to
/// the search language.
pub fn is_search_stage(key: &str) -> bool {
    SEARCH_AGGREGATION_OPERATORS.contains(key)
}

/// Returns true if `word` is a recognized operator keyword.
///
/// Field references and key names that collide with a keyword are left
/// unhashed, so `"$sum"` stays readable while `"$amount"` does not.
pub fn is_operator_keyword(word: &str) -> bool {
    CORE_OPERATORS.contains(word) || SEARCH_AGGREGATION_OPERATORS.contains(word)
}
