//! Three-way consistency check
//!
//! Each comparison is `(source_a - exceptions) - source_b`. Set members on
//! either side may be groups; a group on the declared side is observed as
//! soon as any sample path falls inside it.

use std::collections::BTreeSet;

use super::report::ConsistencyReport;
use crate::fields::{FieldCatalog, FieldPath, Member, NamedSet};

/// Documented exceptions, one set per comparison
#[derive(Debug, Clone, Default)]
pub struct ConsistencyExceptions {
    /// Sample paths the catalog deliberately does not expose
    pub payload_not_in_fields: NamedSet,
    /// Catalog fields filled by server-side enrichment
    pub fields_not_in_payload: NamedSet,
    /// Free-form substructures the schema does not describe
    pub payload_not_in_schema: NamedSet,
    /// Optional schema properties the samples leave out
    pub schema_not_in_payload: NamedSet,
}

/// Cross-references catalog, schema and samples.
pub fn check_consistency(
    catalog: &FieldCatalog,
    schema_paths: &[FieldPath],
    payload_paths: &BTreeSet<FieldPath>,
    exceptions: &ConsistencyExceptions,
) -> ConsistencyReport {
    let fields = catalog.as_named_set("fields");
    let schema = NamedSet::from_paths("schema", schema_paths);

    ConsistencyReport {
        payload_not_in_fields: observed_not_declared(
            payload_paths,
            &exceptions.payload_not_in_fields,
            &fields,
        ),
        fields_not_in_payload: declared_not_observed(
            &fields,
            &exceptions.fields_not_in_payload,
            payload_paths,
        ),
        payload_not_in_schema: observed_not_declared(
            payload_paths,
            &exceptions.payload_not_in_schema,
            &schema,
        ),
        schema_not_in_payload: declared_not_observed(
            &schema,
            &exceptions.schema_not_in_payload,
            payload_paths,
        ),
    }
}

fn observed_not_declared(
    observed: &BTreeSet<FieldPath>,
    allowed: &NamedSet,
    declared: &NamedSet,
) -> Vec<FieldPath> {
    let remaining = allowed.difference(observed);
    declared.difference(&remaining)
}

fn declared_not_observed(
    declared: &NamedSet,
    allowed: &NamedSet,
    observed: &BTreeSet<FieldPath>,
) -> Vec<FieldPath> {
    let mut missing: Vec<FieldPath> = declared
        .members()
        .iter()
        .filter(|member| !allowed.contains(member.path().as_str()))
        .filter(|member| !is_observed(member, observed))
        .map(|member| member.path().clone())
        .collect();
    missing.sort();
    missing.dedup();
    missing
}

fn is_observed(member: &Member, observed: &BTreeSet<FieldPath>) -> bool {
    match member {
        Member::Literal(path) => observed.contains(path),
        Member::Group { group } => observed
            .range(group.clone()..)
            .take_while(|path| path.as_str().starts_with(group.as_str()))
            .any(|path| member.matches(path.as_str())),
    }
}
