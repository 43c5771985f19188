//! Canonical SDL for federated subgraph schemas.
//!
//! A subgraph's `_service { sdl }` output and a reference SDL file rarely agree byte for byte:
//! definition order, comments, `extend type` blocks and the federation definitions a subgraph
//! library chooses to print all vary. [`normalize`] rebuilds both into the same shape so that a
//! structural diff only reports differences in what the schemas say.
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::schema::Component;
use apollo_compiler::schema::ComponentOrigin;
use apollo_compiler::schema::ExtendedType;
use tracing::debug;

use crate::error::NormalizeError;
use crate::subgraph::SubgraphSchema;

/// Parse `sdl` and print it back as canonical subgraph SDL.
///
/// Fails with [`NormalizeError::Parse`] when `sdl` is not syntactically valid GraphQL.
pub fn normalize(sdl: &str) -> Result<String, NormalizeError> {
    let document = ast::Document::parse(sdl, "subgraph.graphql")?;
    normalize_document(&document)
}

/// Same as [`normalize`], for a document that is already parsed.
pub fn normalize_document(document: &ast::Document) -> Result<String, NormalizeError> {
    let subgraph = SubgraphSchema::build(document)?;
    let key_directive_name = subgraph.key_directive_name();

    let schema = with_repeatable_key(subgraph.into_schema(), &key_directive_name);
    let schema = with_schema_directives(schema, document);
    let schema = canonicalize(schema);
    Ok(schema.to_string())
}

/// Returns `schema` with its `@key` definition marked repeatable.
///
/// Federation 1 definitions of `@key` are not repeatable, which would make every entity with
/// several keys differ from a reference declaring it properly. Federation 2 definitions already
/// are, in which case the schema is returned untouched.
pub fn with_repeatable_key(mut schema: Schema, key_directive_name: &Name) -> Schema {
    match schema.directive_definitions.get_mut(key_directive_name) {
        Some(definition) if definition.repeatable => {
            debug!(directive = %key_directive_name, "key directive already repeatable, nothing to patch");
        }
        Some(definition) => {
            definition.make_mut().repeatable = true;
            debug!(directive = %key_directive_name, "marked key directive repeatable");
        }
        None => {
            debug!(directive = %key_directive_name, "schema has no key directive definition");
        }
    }
    schema
}

/// Returns `schema` with the directives applied to the schema definition (and `extend schema`
/// blocks) of `document` appended to its own schema definition directives.
pub fn with_schema_directives(mut schema: Schema, document: &ast::Document) -> Schema {
    let applied: Vec<&Node<ast::Directive>> = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            ast::Definition::SchemaDefinition(def) => Some(&def.directives),
            ast::Definition::SchemaExtension(ext) => Some(&ext.directives),
            _ => None,
        })
        .flat_map(|directives| directives.iter())
        .collect();
    if applied.is_empty() {
        return schema;
    }

    debug!(count = applied.len(), "restoring schema directives");
    let definition = schema.schema_definition.make_mut();
    for directive in applied {
        definition
            .directives
            .push(Component::new((**directive).clone()));
    }
    schema
}

/// Folds `extend` blocks into the definitions they extend, so that a type printed from an
/// extension and the same type printed from a definition are identical.
pub fn canonicalize(mut schema: Schema) -> Schema {
    let definition = schema.schema_definition.make_mut();
    for directive in definition.directives.iter_mut() {
        directive.origin = ComponentOrigin::Definition;
    }

    for extended_type in schema.types.values_mut() {
        if extended_type.is_built_in() {
            continue;
        }
        match extended_type {
            ExtendedType::Scalar(scalar) => {
                let scalar = scalar.make_mut();
                for directive in scalar.directives.iter_mut() {
                    directive.origin = ComponentOrigin::Definition;
                }
            }
            ExtendedType::Object(object) => {
                let object = object.make_mut();
                for directive in object.directives.iter_mut() {
                    directive.origin = ComponentOrigin::Definition;
                }
                object.implements_interfaces = object
                    .implements_interfaces
                    .iter()
                    .map(|i| {
                        let mut i = i.clone();
                        i.origin = ComponentOrigin::Definition;
                        i
                    })
                    .collect();
                for field in object.fields.values_mut() {
                    field.origin = ComponentOrigin::Definition;
                }
            }
            ExtendedType::Interface(interface) => {
                let interface = interface.make_mut();
                for directive in interface.directives.iter_mut() {
                    directive.origin = ComponentOrigin::Definition;
                }
                interface.implements_interfaces = interface
                    .implements_interfaces
                    .iter()
                    .map(|i| {
                        let mut i = i.clone();
                        i.origin = ComponentOrigin::Definition;
                        i
                    })
                    .collect();
                for field in interface.fields.values_mut() {
                    field.origin = ComponentOrigin::Definition;
                }
            }
            ExtendedType::Union(union_) => {
                let union_ = union_.make_mut();
                for directive in union_.directives.iter_mut() {
                    directive.origin = ComponentOrigin::Definition;
                }
                union_.members = union_
                    .members
                    .iter()
                    .map(|m| {
                        let mut m = m.clone();
                        m.origin = ComponentOrigin::Definition;
                        m
                    })
                    .collect();
            }
            ExtendedType::Enum(enum_) => {
                let enum_ = enum_.make_mut();
                for directive in enum_.directives.iter_mut() {
                    directive.origin = ComponentOrigin::Definition;
                }
                for value in enum_.values.values_mut() {
                    value.origin = ComponentOrigin::Definition;
                }
            }
            ExtendedType::InputObject(input_object) => {
                let input_object = input_object.make_mut();
                for directive in input_object.directives.iter_mut() {
                    directive.origin = ComponentOrigin::Definition;
                }
                for field in input_object.fields.values_mut() {
                    field.origin = ComponentOrigin::Definition;
                }
            }
        }
    }
    schema
}
