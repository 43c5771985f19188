use apollo_compiler::Schema;
use apollo_compiler::schema::ExtendedType;
use pretty_assertions::assert_eq;
use rstest::rstest;
use subgraph_compatibility::DiffOptions;
use subgraph_compatibility::NormalizeError;
use subgraph_compatibility::PRODUCTS_SCHEMA;
use subgraph_compatibility::diff;
use subgraph_compatibility::normalize;

const FED2_EXTEND_SCHEMA: &str = r#"
    extend schema
      @link(url: "https://specs.apollo.dev/federation/v2.3", import: ["@key", "@shareable"])

    type Product @key(fields: "id") @key(fields: "sku package") {
      id: ID!
      sku: String @shareable
      package: String
    }

    type Query {
      product(id: ID!): Product
    }
"#;

const FED2_SCHEMA_BLOCK: &str = r#"
    schema
      @link(url: "https://specs.apollo.dev/link/v1.0")
      @link(url: "https://specs.apollo.dev/federation/v2.0", import: [{ name: "@key", as: "@id" }]) {
      query: RootQuery
    }

    type Product @id(fields: "id") {
      id: ID!
    }

    type RootQuery {
      product(id: ID!): Product
    }
"#;

fn parse(sdl: &str) -> Schema {
    Schema::builder()
        .adopt_orphan_extensions()
        .parse(sdl, "normalized.graphql")
        .build()
        .expect("normalized SDL builds")
}

#[rstest]
#[case::fed1_products(PRODUCTS_SCHEMA)]
#[case::fed2_extend_schema(FED2_EXTEND_SCHEMA)]
#[case::fed2_schema_block(FED2_SCHEMA_BLOCK)]
#[case::no_entities("type Query { hello: String }")]
fn normalization_is_idempotent(#[case] sdl: &str) {
    let once = normalize(sdl).unwrap();
    let twice = normalize(&once).unwrap();
    assert_eq!(diff(&once, &twice, &DiffOptions::default()).unwrap(), None);
}

#[test]
fn repeated_keys_are_preserved() {
    let schema = parse(&normalize(PRODUCTS_SCHEMA).unwrap());
    let keys = schema.types["Product"]
        .directives()
        .get_all("key")
        .map(|key| key.node.to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        keys,
        [
            r#"@key(fields: "id")"#,
            r#"@key(fields: "sku package")"#,
            r#"@key(fields: "sku variation { id }")"#,
        ]
    );
    assert!(schema.directive_definitions["key"].repeatable);
}

#[test]
fn schema_directives_survive() {
    let schema = parse(&normalize(FED2_SCHEMA_BLOCK).unwrap());
    let links = schema
        .schema_definition
        .directives
        .get_all("link")
        .map(|link| link.node.to_string())
        .collect::<Vec<_>>();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0], r#"@link(url: "https://specs.apollo.dev/link/v1.0")"#);
    assert!(links[1].starts_with(r#"@link(url: "https://specs.apollo.dev/federation/v2.0", import: ["#));
    assert_eq!(
        schema.schema_definition.query.as_ref().map(|q| q.name.as_str()),
        Some("RootQuery")
    );
    assert!(schema.directive_definitions["id"].repeatable);
}

#[test]
fn no_schema_block_has_no_schema_directives() {
    let schema = parse(&normalize(PRODUCTS_SCHEMA).unwrap());
    assert!(schema.schema_definition.directives.is_empty());
}

#[test]
fn unterminated_brace_is_a_parse_error() {
    let err = normalize("type Product { id: ID!").unwrap_err();
    assert!(matches!(err, NormalizeError::Parse { .. }));
}

#[test]
fn federation_link_below_v2_is_an_error() {
    let err = normalize(
        r#"
        extend schema @link(url: "https://specs.apollo.dev/federation/v1.0")
        type Product @key(fields: "id") @key(fields: "sku") { id: ID! sku: String }
        type Query { p: Product }
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, NormalizeError::Link(_)), "{err}");
}

#[test]
fn fed1_gains_federation_plumbing() {
    let schema = parse(&normalize(PRODUCTS_SCHEMA).unwrap());
    let Some(ExtendedType::Union(entity)) = schema.types.get("_Entity") else {
        panic!("expected an _Entity union");
    };
    let mut members = entity
        .members
        .iter()
        .map(|member| member.name.as_str())
        .collect::<Vec<_>>();
    members.sort();
    assert_eq!(members, ["Product", "User"]);
    assert!(schema.types.contains_key("_Any"));
    assert!(schema.types.contains_key("_Service"));
    let Some(ExtendedType::Object(query)) = schema.types.get("Query") else {
        panic!("expected a Query type");
    };
    assert!(query.fields.contains_key("_service"));
    assert!(query.fields.contains_key("_entities"));
}

#[test]
fn fed2_gets_imported_and_qualified_definitions() {
    let schema = parse(&normalize(FED2_EXTEND_SCHEMA).unwrap());
    assert!(schema.directive_definitions["key"].repeatable);
    assert!(schema.directive_definitions.contains_key("shareable"));
    assert!(schema.directive_definitions.contains_key("federation__requires"));
    assert!(schema.directive_definitions.contains_key("federation__interfaceObject"));
    assert!(!schema.directive_definitions.contains_key("federation__policy"));
    assert_eq!(schema.schema_definition.directives.get_all("link").count(), 1);
}

#[test]
fn formatting_and_order_do_not_matter() {
    let reordered = r#"
        # users are owned by the accounts subgraph
        extend type User @key(fields: "email") {
          totalProductsCreated: Int @external
          email: ID! @external
        }

        extend type Query {
          product(id: ID!): Product
        }

        type ProductDimension { weight: Float, size: String }
        type ProductVariation { id: ID! }

        type Product
          @key(fields: "sku variation { id }")
          @key(fields: "id")
          @key(fields: "sku package")
        {
          createdBy: User @provides(fields: "totalProductsCreated")
          dimensions: ProductDimension
          variation: ProductVariation
          package: String
          sku: String
          id: ID!
        }
    "#;
    let expected = normalize(PRODUCTS_SCHEMA).unwrap();
    let actual = normalize(reordered).unwrap();
    assert_eq!(diff(&expected, &actual, &DiffOptions::default()).unwrap(), None);
}
