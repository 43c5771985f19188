//! Building a federation subgraph schema out of the SDL a subgraph reports.
//!
//! A subgraph's `_service { sdl }` only carries the subgraph's own definitions. The builder adds
//! what federation implies on top of them: the federation directive definitions (named the way
//! the subgraph's `@link` imports them), the `_Any`, `_Entity` and `_Service` types, and the
//! `_service` / `_entities` root fields. Definitions the subgraph already provides are kept as-is.
use apollo_compiler::Name;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::name;
use apollo_compiler::schema::ComponentName;
use apollo_compiler::schema::ExtendedType;
use itertools::Itertools;
use tracing::debug;

use crate::error::NormalizeError;
use crate::link::DEFAULT_LINK_NAME;
use crate::link::Link;
use crate::link::LinkError;
use crate::subgraph::spec::ANY_SCALAR_NAME;
use crate::subgraph::spec::ENTITIES_FIELD;
use crate::subgraph::spec::ENTITIES_QUERY;
use crate::subgraph::spec::ENTITY_UNION_NAME;
use crate::subgraph::spec::FederationSpecDefinitions;
use crate::subgraph::spec::LinkSpecDefinitions;
use crate::subgraph::spec::SERVICE_SDL_FIELD;
use crate::subgraph::spec::SERVICE_SDL_QUERY;
use crate::subgraph::spec::SERVICE_TYPE;
use crate::subgraph::spec::SERVICE_TYPE_SDL;

pub mod spec;

/// Source path reported for definitions the builder adds.
const FEDERATION_DEFINITIONS_PATH: &str = "federation_definitions.graphql";

/// A subgraph schema with its federation definitions filled in.
///
/// The schema definition only carries root operation types: applied schema directives of the
/// input are not part of the built schema.
#[derive(Debug)]
pub struct SubgraphSchema {
    schema: Schema,
    federation: FederationSpecDefinitions,
}

impl SubgraphSchema {
    pub fn parse(sdl: &str) -> Result<Self, NormalizeError> {
        let document = ast::Document::parse(sdl, "subgraph.graphql")?;
        Self::build(&document)
    }

    pub fn build(document: &ast::Document) -> Result<Self, NormalizeError> {
        let base = Schema::builder()
            .adopt_orphan_extensions()
            .add_ast(document)
            .build()?;

        let (federation, link_definitions) = Self::collect_links(&base)?;
        let missing = Self::missing_definitions(&base, &federation, link_definitions.as_ref());
        let mut schema = if missing.is_empty() {
            base
        } else {
            Schema::builder()
                .adopt_orphan_extensions()
                .add_ast(document)
                .parse(missing, FEDERATION_DEFINITIONS_PATH)
                .build()?
        };
        Self::rebuild_schema_definition(&mut schema);

        debug!(
            federation_version = ?federation.version(),
            key_directive = %federation.key_directive_name(),
            "built subgraph schema"
        );
        Ok(Self { schema, federation })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn federation(&self) -> &FederationSpecDefinitions {
        &self.federation
    }

    /// The name `@key` has in this subgraph (`key` unless renamed through `@link`).
    pub fn key_directive_name(&self) -> Name {
        self.federation.key_directive_name()
    }

    pub fn into_schema(self) -> Schema {
        self.schema
    }

    fn collect_links(
        schema: &Schema,
    ) -> Result<(FederationSpecDefinitions, Option<LinkSpecDefinitions>), NormalizeError> {
        let mut federation: Option<FederationSpecDefinitions> = None;
        let mut link_definitions: Option<LinkSpecDefinitions> = None;
        let mut has_links = false;

        for directive in schema
            .schema_definition
            .directives
            .get_all(DEFAULT_LINK_NAME.as_str())
        {
            has_links = true;
            let link = Link::from_directive_application(directive)?;
            if link.is_federation() {
                if federation.is_some() {
                    let msg = "invalid graphql schema - multiple @link imports for the federation specification are not supported";
                    return Err(LinkError::BootstrapError(msg.to_owned()).into());
                }
                federation = Some(FederationSpecDefinitions::from_link(link)?);
            } else if link.is_link() {
                if link_definitions.is_some() {
                    let msg = "invalid graphql schema - multiple @link imports for the link specification are not supported";
                    return Err(LinkError::BootstrapError(msg.to_owned()).into());
                }
                link_definitions = Some(LinkSpecDefinitions::new(&link));
            }
        }

        if has_links && link_definitions.is_none() {
            link_definitions = Some(LinkSpecDefinitions::default());
        }
        Ok((
            federation.unwrap_or_else(FederationSpecDefinitions::fed1),
            link_definitions,
        ))
    }

    /// SDL for every federation definition `schema` lacks. Empty when nothing is missing.
    fn missing_definitions(
        schema: &Schema,
        federation: &FederationSpecDefinitions,
        link_definitions: Option<&LinkSpecDefinitions>,
    ) -> String {
        let mut sdl: Vec<String> = Vec::new();

        if let Some(link_definitions) = link_definitions {
            if !schema.directive_definitions.contains_key(&DEFAULT_LINK_NAME) {
                sdl.push(link_definitions.link_directive_definition());
            }
            if !schema.types.contains_key(link_definitions.import_scalar_name()) {
                sdl.push(format!("scalar {}", link_definitions.import_scalar_name()));
            }
            if !schema.types.contains_key(link_definitions.purpose_enum_name()) {
                sdl.push(link_definitions.purpose_enum_definition());
            }
        }

        for (name, definition) in federation.directive_definitions() {
            if !schema.directive_definitions.contains_key(&name) {
                sdl.push(definition);
            }
        }
        for name in federation.scalar_names() {
            if !schema.types.contains_key(&name) {
                sdl.push(format!("scalar {name}"));
            }
        }

        if !schema.types.contains_key(&SERVICE_TYPE) {
            sdl.push(SERVICE_TYPE_SDL.to_owned());
        }

        let entities = Self::locate_entities(schema, &federation.key_directive_name());
        if !entities.is_empty() {
            if !schema.types.contains_key(&ANY_SCALAR_NAME) {
                sdl.push(format!("scalar {ANY_SCALAR_NAME}"));
            }
            if !schema.types.contains_key(&ENTITY_UNION_NAME) {
                sdl.push(format!(
                    "union {ENTITY_UNION_NAME} = {}",
                    entities.iter().join(" | ")
                ));
            }
        }

        let query_type_name = schema
            .schema_definition
            .query
            .as_ref()
            .map(|root| root.name.clone())
            .unwrap_or(name!("Query"));
        match schema.types.get(&query_type_name) {
            Some(ExtendedType::Object(query_type)) => {
                let mut root_fields = Vec::new();
                if !query_type.fields.contains_key(&SERVICE_SDL_QUERY) {
                    root_fields.push(SERVICE_SDL_FIELD);
                }
                if !entities.is_empty() && !query_type.fields.contains_key(&ENTITIES_QUERY) {
                    root_fields.push(ENTITIES_FIELD);
                }
                if !root_fields.is_empty() {
                    sdl.push(format!(
                        "extend type {query_type_name} {{\n  {}\n}}",
                        root_fields.join("\n  ")
                    ));
                }
            }
            Some(_) => {
                debug!(%query_type_name, "query root is not an object type, skipping federation root fields");
            }
            None => {
                let mut root_fields = vec![SERVICE_SDL_FIELD];
                if !entities.is_empty() {
                    root_fields.push(ENTITIES_FIELD);
                }
                sdl.push(format!(
                    "type {query_type_name} {{\n  {}\n}}",
                    root_fields.join("\n  ")
                ));
            }
        }

        sdl.join("\n\n")
    }

    /// Object types carrying `@key`, which make up the `_Entity` union.
    fn locate_entities(schema: &Schema, key_directive_name: &Name) -> Vec<Name> {
        schema
            .types
            .iter()
            .filter(|(_, extended_type)| {
                matches!(extended_type, ExtendedType::Object(_))
                    && extended_type
                        .directives()
                        .get(key_directive_name.as_str())
                        .is_some()
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Reduce the schema definition to its root operation types, filling in the conventional
    /// root names when a type by that name exists.
    fn rebuild_schema_definition(schema: &mut Schema) {
        let types = &schema.types;
        let is_object = |name: &Name| matches!(types.get(name), Some(ExtendedType::Object(_)));
        let definition = schema.schema_definition.make_mut();
        definition.directives = Default::default();

        for (root, default_name) in [
            (&mut definition.query, name!("Query")),
            (&mut definition.mutation, name!("Mutation")),
            (&mut definition.subscription, name!("Subscription")),
        ] {
            let name = match root.take() {
                Some(existing) => Some(existing.name.clone()),
                None if is_object(&default_name) => Some(default_name),
                None => None,
            };
            *root = name.map(ComponentName::from);
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn build(sdl: &str) -> SubgraphSchema {
        SubgraphSchema::parse(sdl).expect("valid subgraph")
    }

    #[test]
    fn fed1_subgraph_gets_entity_plumbing() {
        let subgraph = build(
            r#"
            type Product @key(fields: "id") {
                id: ID!
            }
            extend type Query {
                product(id: ID!): Product
            }
            "#,
        );
        let schema = subgraph.schema();
        assert!(!subgraph.federation().is_fed2());

        let key = schema.directive_definitions.get("key").unwrap();
        assert!(!key.repeatable);
        assert!(schema.types.contains_key("_FieldSet"));
        assert!(schema.types.contains_key("_Any"));
        assert!(schema.types.contains_key("_Service"));

        let Some(ExtendedType::Union(entity)) = schema.types.get("_Entity") else {
            panic!("expected an _Entity union");
        };
        assert_eq!(
            entity.members.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            ["Product"]
        );

        let Some(ExtendedType::Object(query)) = schema.types.get("Query") else {
            panic!("expected a Query object");
        };
        assert!(query.fields.contains_key("product"));
        assert_eq!(query.fields["_service"].ty.to_string(), "_Service!");
        assert_eq!(query.fields["_entities"].ty.to_string(), "[_Entity]!");
        assert_eq!(
            schema.schema_definition.query.as_ref().map(|q| q.name.as_str()),
            Some("Query")
        );
    }

    #[test]
    fn subgraph_without_entities_has_no_entity_union() {
        let subgraph = build("type Query { hello: String }");
        let schema = subgraph.schema();
        assert!(!schema.types.contains_key("_Entity"));
        assert!(!schema.types.contains_key("_Any"));
        let Some(ExtendedType::Object(query)) = schema.types.get("Query") else {
            panic!("expected a Query object");
        };
        assert!(query.fields.contains_key("_service"));
        assert!(!query.fields.contains_key("_entities"));
    }

    #[test]
    fn missing_query_type_is_created() {
        let subgraph = build(
            r#"
            type User @key(fields: "email") {
                email: ID!
            }
            "#,
        );
        let Some(ExtendedType::Object(query)) = subgraph.schema().types.get("Query") else {
            panic!("expected a Query object");
        };
        assert!(query.fields.contains_key("_service"));
        assert!(query.fields.contains_key("_entities"));
    }

    #[test]
    fn fed2_subgraph_uses_imported_names() {
        let subgraph = build(
            r#"
            extend schema @link(url: "https://specs.apollo.dev/federation/v2.3", import: ["@key", "@shareable"])

            type Product @key(fields: "id") @key(fields: "sku") {
                id: ID!
                sku: String @shareable
            }
            type Query {
                product: Product
            }
            "#,
        );
        let schema = subgraph.schema();
        assert_eq!(subgraph.key_directive_name().as_str(), "key");
        assert!(schema.directive_definitions["key"].repeatable);
        assert!(schema.directive_definitions.contains_key("shareable"));
        assert!(schema.directive_definitions.contains_key("federation__requires"));
        assert!(schema.directive_definitions.contains_key("federation__interfaceObject"));
        assert!(schema.directive_definitions.contains_key("link"));
        assert!(schema.types.contains_key("federation__FieldSet"));
        assert!(schema.types.contains_key("link__Import"));
        assert!(schema.types.contains_key("link__Purpose"));
        assert!(schema.schema_definition.directives.is_empty());
    }

    #[test]
    fn subgraph_definitions_take_precedence() {
        let subgraph = build(
            r#"
            directive @key(fields: String!) repeatable on OBJECT
            type Product @key(fields: "id") { id: ID! }
            type Query { product: Product }
            "#,
        );
        let key = &subgraph.schema().directive_definitions["key"];
        assert!(key.repeatable);
        assert_eq!(key.arguments[0].ty.to_string(), "String!");
    }

    #[test]
    fn multiple_federation_links_are_rejected() {
        let err = SubgraphSchema::parse(
            r#"
            extend schema
                @link(url: "https://specs.apollo.dev/federation/v2.0")
                @link(url: "https://specs.apollo.dev/federation/v2.3")
            type Query { a: Int }
            "#,
        )
        .unwrap_err();
        assert!(
            err.to_string()
                .contains("multiple @link imports for the federation specification")
        );
    }

    #[test]
    fn existing_root_fields_are_not_redefined() {
        let subgraph = build(
            r#"
            type Product @key(fields: "id") { id: ID! }
            type _Service { sdl: String }
            type Query { _service: _Service! product: Product }
            "#,
        );
        let query = subgraph.schema().get_object("Query").expect("query root");
        assert_eq!(
            query.fields.keys().map(|name| name.as_str()).collect::<Vec<_>>(),
            ["_service", "product", "_entities"]
        );
    }

    #[test]
    fn missing_query_root_is_created() {
        let subgraph = build("type Product @key(fields: \"id\") { id: ID! }");
        let query = subgraph.schema().get_object("Query").expect("query root");
        assert!(query.fields.contains_key("_service"));
        assert!(query.fields.contains_key("_entities"));
        assert_eq!(
            subgraph.schema().schema_definition.query.as_ref().map(|q| q.name.as_str()),
            Some("Query")
        );
    }

    #[rstest]
    #[case::fed1_link("https://specs.apollo.dev/federation/v1.0")]
    #[case::future_major("https://specs.apollo.dev/federation/v3.0")]
    fn unsupported_federation_versions_are_rejected(#[case] url: &str) {
        let err = SubgraphSchema::parse(&format!(
            r#"
            extend schema @link(url: "{url}")
            type Product @key(fields: "id") @key(fields: "sku") {{ id: ID! sku: String }}
            type Query {{ p: Product }}
            "#
        ))
        .unwrap_err();
        assert!(matches!(err, NormalizeError::Link(LinkError::BootstrapError(_))));
        assert!(
            err.to_string()
                .ends_with(&format!("{url} does not use a supported federation spec version")),
            "{err}"
        );
    }

    #[test]
    fn duplicate_types_fail_to_build() {
        let err = SubgraphSchema::parse("type Query { a: Int }\ntype Query { b: Int }").unwrap_err();
        assert!(matches!(err, NormalizeError::Build { .. }));
    }
}
