//! Structural comparison of two GraphQL schemas.
//!
//! Schemas are compared definition by definition, by name, so reordering definitions, fields or
//! arguments is never reported. Directive applications are compared as multisets: a type that
//! loses one of its two `@key` applications is reported.
use std::fmt;
use std::time::Duration;

use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::schema::ExtendedType;
use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::error::NormalizeError;

mod change;
mod traverse;

pub use change::Change;
pub use change::ChangeKind;

/// Options for [`diff`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct DiffOptions {
    /// Sort definitions, fields, arguments and enum values before printing the schemas for the
    /// text diff. Enabled by default.
    pub sort_schema: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { sort_schema: true }
    }
}

/// The differences found between an expected and an actual schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Every change from the expected schema to the actual one, sorted by path then kind.
    pub changes: Vec<Change>,
    /// A unified diff of the two printed schemas.
    pub text: String,
}

impl SchemaDiff {
    /// Whether any change happened at `path` or below it.
    pub fn touches(&self, path: &str) -> bool {
        self.changes.iter().any(|change| {
            change.path == path
                || change
                    .path
                    .strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for change in &self.changes {
            writeln!(f, "{change}")?;
        }
        if !self.text.is_empty() {
            writeln!(f)?;
            f.write_str(&self.text)?;
        }
        Ok(())
    }
}

/// Compare two SDL strings. Returns `None` when they describe the same schema.
pub fn diff(
    expected: &str,
    actual: &str,
    options: &DiffOptions,
) -> Result<Option<SchemaDiff>, NormalizeError> {
    let expected = parse_schema(expected, "expected.graphql")?;
    let actual = parse_schema(actual, "actual.graphql")?;
    Ok(diff_schemas(&expected, &actual, options))
}

/// Same as [`diff`], for schemas that are already built.
pub fn diff_schemas(expected: &Schema, actual: &Schema, options: &DiffOptions) -> Option<SchemaDiff> {
    let mut changes = traverse::traverse_schemas(expected, actual);
    if changes.is_empty() {
        debug!("schemas are equivalent");
        return None;
    }
    changes.sort();
    debug!(changes = changes.len(), "schemas differ");

    let (expected_sdl, actual_sdl) = if options.sort_schema {
        (
            sorted(expected.clone()).to_string(),
            sorted(actual.clone()).to_string(),
        )
    } else {
        (expected.to_string(), actual.to_string())
    };
    let text = similar::TextDiff::configure()
        .algorithm(similar::Algorithm::Patience)
        .timeout(Duration::from_millis(500))
        .diff_lines(&expected_sdl, &actual_sdl)
        .unified_diff()
        .context_radius(3)
        .header("expected", "actual")
        .to_string();

    Some(SchemaDiff { changes, text })
}

fn parse_schema(sdl: &str, path: &str) -> Result<Schema, NormalizeError> {
    let document = ast::Document::parse(sdl, path)?;
    Ok(Schema::builder()
        .adopt_orphan_extensions()
        .add_ast(&document)
        .build()?)
}

/// Returns `schema` with definitions, fields, arguments, enum values, interfaces and union
/// members in lexicographic order.
pub fn sorted(mut schema: Schema) -> Schema {
    schema
        .types
        .sort_by(|k1, _, k2, _| k1.as_str().cmp(k2.as_str()));
    schema
        .directive_definitions
        .sort_by(|k1, _, k2, _| k1.as_str().cmp(k2.as_str()));

    for definition in schema.directive_definitions.values_mut() {
        definition
            .make_mut()
            .arguments
            .sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
    }

    for ty in schema.types.values_mut() {
        if ty.is_built_in() {
            continue;
        }
        match ty {
            ExtendedType::Object(object) => {
                let object = object.make_mut();
                object
                    .implements_interfaces
                    .sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
                object
                    .fields
                    .sort_by(|k1, _, k2, _| k1.as_str().cmp(k2.as_str()));
                for field in object.fields.values_mut() {
                    field
                        .make_mut()
                        .arguments
                        .sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
                }
            }
            ExtendedType::Interface(interface) => {
                let interface = interface.make_mut();
                interface
                    .implements_interfaces
                    .sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
                interface
                    .fields
                    .sort_by(|k1, _, k2, _| k1.as_str().cmp(k2.as_str()));
                for field in interface.fields.values_mut() {
                    field
                        .make_mut()
                        .arguments
                        .sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
                }
            }
            ExtendedType::Union(union_) => {
                union_
                    .make_mut()
                    .members
                    .sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
            }
            ExtendedType::Enum(enum_) => {
                enum_
                    .make_mut()
                    .values
                    .sort_by(|k1, _, k2, _| k1.as_str().cmp(k2.as_str()));
            }
            ExtendedType::InputObject(input_object) => {
                input_object
                    .make_mut()
                    .fields
                    .sort_by(|k1, _, k2, _| k1.as_str().cmp(k2.as_str()));
            }
            ExtendedType::Scalar(_) => {}
        }
    }
    schema
}

/// One line per change, for logs where the text diff would be too noisy.
pub fn summary(diff: &SchemaDiff) -> String {
    diff.changes.iter().map(|change| change.to_string()).join("\n")
}
