//! Definitions injected into subgraph schemas by the federation spec.
//!
//! Directive signatures are kept as SDL fragments; the type placeholders (`$FieldSet`, `$Scope`,
//! `$Policy`, `$ContextFieldValue`) are substituted with the names those types have in the
//! subgraph before the fragments are parsed.
use apollo_compiler::Name;
use apollo_compiler::name;

use crate::link::DEFAULT_IMPORT_SCALAR_NAME;
use crate::link::DEFAULT_LINK_NAME;
use crate::link::DEFAULT_PURPOSE_ENUM_NAME;
use crate::link::Link;
use crate::link::LinkError;
use crate::link::spec::Version;

pub const KEY_DIRECTIVE_NAME: Name = name!("key");
pub const FIELDSET_SCALAR_NAME: Name = name!("FieldSet");
pub const FED1_FIELDSET_SCALAR_NAME: Name = name!("_FieldSet");
pub const SCOPE_SCALAR_NAME: Name = name!("Scope");
pub const POLICY_SCALAR_NAME: Name = name!("Policy");
pub const CONTEXTFIELDVALUE_SCALAR_NAME: Name = name!("ContextFieldValue");

pub const ANY_SCALAR_NAME: Name = name!("_Any");
pub const ENTITY_UNION_NAME: Name = name!("_Entity");
pub const SERVICE_TYPE: Name = name!("_Service");

pub const SERVICE_SDL_QUERY: Name = name!("_service");
pub const ENTITIES_QUERY: Name = name!("_entities");

pub const SERVICE_TYPE_SDL: &str = "type _Service {\n  sdl: String\n}";
pub const SERVICE_SDL_FIELD: &str = "_service: _Service!";
pub const ENTITIES_FIELD: &str = "_entities(representations: [_Any!]!): [_Entity]!";

const MIN_FEDERATION_VERSION: Version = v(0);

const fn v(minor: u32) -> Version {
    Version { major: 2, minor }
}

/// A federation directive, available from `since` (inclusive) until `until` (exclusive) when the
/// signature changed in a later version.
struct DirectiveSpec {
    name: Name,
    since: Version,
    until: Option<Version>,
    signature: &'static str,
}

const ALL_LOCATIONS: &str = "FIELD_DEFINITION | OBJECT | INTERFACE | UNION | ARGUMENT_DEFINITION | SCALAR | ENUM | ENUM_VALUE | INPUT_OBJECT | INPUT_FIELD_DEFINITION";
const AUTH_LOCATIONS: &str = "FIELD_DEFINITION | OBJECT | INTERFACE | SCALAR | ENUM";

// Federation 1 subgraph libraries never declared `@key` repeatable, even though entities
// routinely carry several keys.
const FEDERATION_V1_DIRECTIVES: [(Name, &str); 6] = [
    (name!("external"), "on FIELD_DEFINITION"),
    (name!("requires"), "(fields: $FieldSet!) on FIELD_DEFINITION"),
    (name!("provides"), "(fields: $FieldSet!) on FIELD_DEFINITION"),
    (name!("key"), "(fields: $FieldSet!) on OBJECT | INTERFACE"),
    (name!("extends"), "on OBJECT | INTERFACE"),
    (
        name!("tag"),
        "(name: String!) repeatable on FIELD_DEFINITION | OBJECT | INTERFACE | UNION",
    ),
];

fn federation_v2_directives() -> Vec<DirectiveSpec> {
    let spec = |name: Name, since: Version, until: Option<Version>, signature: &'static str| {
        DirectiveSpec {
            name,
            since,
            until,
            signature,
        }
    };
    vec![
        spec(
            name!("key"),
            v(0),
            None,
            "(fields: $FieldSet!, resolvable: Boolean = true) repeatable on OBJECT | INTERFACE",
        ),
        spec(name!("requires"), v(0), None, "(fields: $FieldSet!) on FIELD_DEFINITION"),
        spec(name!("provides"), v(0), None, "(fields: $FieldSet!) on FIELD_DEFINITION"),
        spec(
            name!("external"),
            v(0),
            None,
            "(reason: String) on OBJECT | FIELD_DEFINITION",
        ),
        spec(
            name!("tag"),
            v(0),
            Some(v(3)),
            "(name: String!) repeatable on $ALL_LOCATIONS",
        ),
        spec(
            name!("tag"),
            v(3),
            None,
            "(name: String!) repeatable on $ALL_LOCATIONS | SCHEMA",
        ),
        spec(name!("extends"), v(0), None, "on OBJECT | INTERFACE"),
        spec(
            name!("shareable"),
            v(0),
            Some(v(2)),
            "on OBJECT | FIELD_DEFINITION",
        ),
        spec(
            name!("shareable"),
            v(2),
            None,
            "repeatable on OBJECT | FIELD_DEFINITION",
        ),
        spec(name!("inaccessible"), v(0), None, "on $ALL_LOCATIONS"),
        spec(
            name!("override"),
            v(0),
            Some(v(7)),
            "(from: String!) on FIELD_DEFINITION",
        ),
        spec(
            name!("override"),
            v(7),
            None,
            "(from: String!, label: String) on FIELD_DEFINITION",
        ),
        spec(
            name!("composeDirective"),
            v(1),
            None,
            "(name: String) repeatable on SCHEMA",
        ),
        spec(name!("interfaceObject"), v(3), None, "on OBJECT"),
        spec(name!("authenticated"), v(5), None, "on $AUTH_LOCATIONS"),
        spec(
            name!("requiresScopes"),
            v(5),
            None,
            "(scopes: [[$Scope!]!]!) on $AUTH_LOCATIONS",
        ),
        spec(
            name!("policy"),
            v(6),
            None,
            "(policies: [[$Policy!]!]!) on $AUTH_LOCATIONS",
        ),
        spec(
            name!("context"),
            v(8),
            None,
            "(name: String!) repeatable on INTERFACE | OBJECT | UNION",
        ),
        spec(
            name!("fromContext"),
            v(8),
            None,
            "(field: $ContextFieldValue) on ARGUMENT_DEFINITION",
        ),
        spec(
            name!("cost"),
            v(9),
            None,
            "(weight: Int!) on ARGUMENT_DEFINITION | ENUM | FIELD_DEFINITION | INPUT_FIELD_DEFINITION | OBJECT | SCALAR",
        ),
        spec(
            name!("listSize"),
            v(9),
            None,
            "(assumedSize: Int, slicingArguments: [String!], sizedFields: [String!], requireOneSlicingArgument: Boolean = true) on FIELD_DEFINITION",
        ),
    ]
}

/// Scalars of the federation spec, with the version introducing them.
const FEDERATION_V2_SCALARS: [(Name, Version); 4] = [
    (FIELDSET_SCALAR_NAME, v(0)),
    (SCOPE_SCALAR_NAME, v(5)),
    (POLICY_SCALAR_NAME, v(6)),
    (CONTEXTFIELDVALUE_SCALAR_NAME, v(8)),
];

/// The federation definitions a subgraph is expected to have, named the way the subgraph
/// refers to them.
#[derive(Debug)]
pub struct FederationSpecDefinitions {
    /// `None` for federation 1 subgraphs, which do not `@link` the federation spec.
    link: Option<Link>,
}

impl FederationSpecDefinitions {
    pub fn fed1() -> Self {
        Self { link: None }
    }

    /// Definitions for a federation `@link`, which must be a 2.x version.
    pub fn from_link(link: Link) -> Result<Self, LinkError> {
        if !link.url.version.satisfies(&MIN_FEDERATION_VERSION) {
            return Err(LinkError::BootstrapError(format!(
                "{} does not use a supported federation spec version",
                link.url
            )));
        }
        Ok(Self { link: Some(link) })
    }

    pub fn version(&self) -> Option<&Version> {
        self.link.as_ref().map(|link| &link.url.version)
    }

    pub fn is_fed2(&self) -> bool {
        self.link.is_some()
    }

    pub fn directive_name_in_schema(&self, name: &Name) -> Name {
        match &self.link {
            Some(link) => link.directive_name_in_schema(name),
            None => name.clone(),
        }
    }

    pub fn type_name_in_schema(&self, name: &Name) -> Name {
        match &self.link {
            Some(link) => link.type_name_in_schema(name),
            None if *name == FIELDSET_SCALAR_NAME => FED1_FIELDSET_SCALAR_NAME,
            None => name.clone(),
        }
    }

    pub fn key_directive_name(&self) -> Name {
        self.directive_name_in_schema(&KEY_DIRECTIVE_NAME)
    }

    /// Scalar names defined by this version of the spec, as named in the subgraph.
    pub fn scalar_names(&self) -> Vec<Name> {
        match self.version() {
            Some(version) => FEDERATION_V2_SCALARS
                .iter()
                .filter(|(_, since)| version >= since)
                .map(|(name, _)| self.type_name_in_schema(name))
                .collect(),
            None => vec![FED1_FIELDSET_SCALAR_NAME],
        }
    }

    /// Directive definitions of this version of the spec as `(name in schema, SDL)` pairs.
    pub fn directive_definitions(&self) -> Vec<(Name, String)> {
        let signatures: Vec<(Name, &str)> = match self.version() {
            Some(version) => federation_v2_directives()
                .into_iter()
                .filter(|spec| {
                    *version >= spec.since && spec.until.is_none_or(|until| *version < until)
                })
                .map(|spec| (spec.name, spec.signature))
                .collect(),
            None => FEDERATION_V1_DIRECTIVES.to_vec(),
        };
        signatures
            .into_iter()
            .map(|(name, signature)| {
                let name_in_schema = self.directive_name_in_schema(&name);
                let sdl = format!(
                    "directive @{name_in_schema}{}{}",
                    if signature.starts_with('(') { "" } else { " " },
                    self.substitute(signature)
                );
                (name_in_schema, sdl)
            })
            .collect()
    }

    fn substitute(&self, signature: &str) -> String {
        signature
            .replace("$ALL_LOCATIONS", ALL_LOCATIONS)
            .replace("$AUTH_LOCATIONS", AUTH_LOCATIONS)
            .replace("$FieldSet", &self.type_name_in_schema(&FIELDSET_SCALAR_NAME))
            .replace("$Scope", &self.type_name_in_schema(&SCOPE_SCALAR_NAME))
            .replace("$Policy", &self.type_name_in_schema(&POLICY_SCALAR_NAME))
            .replace(
                "$ContextFieldValue",
                &self.type_name_in_schema(&CONTEXTFIELDVALUE_SCALAR_NAME),
            )
    }
}

/// Definitions of the `@link` spec itself, needed once a subgraph uses `@link`.
#[derive(Debug)]
pub struct LinkSpecDefinitions {
    import_scalar_name: Name,
    purpose_enum_name: Name,
}

impl Default for LinkSpecDefinitions {
    fn default() -> Self {
        Self {
            import_scalar_name: Name::new_unchecked(&format!(
                "{DEFAULT_LINK_NAME}__{DEFAULT_IMPORT_SCALAR_NAME}"
            )),
            purpose_enum_name: Name::new_unchecked(&format!(
                "{DEFAULT_LINK_NAME}__{DEFAULT_PURPOSE_ENUM_NAME}"
            )),
        }
    }
}

impl LinkSpecDefinitions {
    /// Names as imported by an explicit `@link` to the link spec.
    pub fn new(link: &Link) -> Self {
        Self {
            import_scalar_name: link.type_name_in_schema(&DEFAULT_IMPORT_SCALAR_NAME),
            purpose_enum_name: link.type_name_in_schema(&DEFAULT_PURPOSE_ENUM_NAME),
        }
    }

    pub fn import_scalar_name(&self) -> &Name {
        &self.import_scalar_name
    }

    pub fn purpose_enum_name(&self) -> &Name {
        &self.purpose_enum_name
    }

    pub fn link_directive_definition(&self) -> String {
        format!(
            "directive @{DEFAULT_LINK_NAME}(url: String, as: String, for: {}, import: [{}]) repeatable on SCHEMA",
            self.purpose_enum_name, self.import_scalar_name
        )
    }

    pub fn purpose_enum_definition(&self) -> String {
        format!(
            r#"enum {} {{
  """
  `SECURITY` features provide metadata necessary to securely resolve fields.
  """
  SECURITY
  """
  `EXECUTION` features provide metadata necessary for operation execution.
  """
  EXECUTION
}}"#,
            self.purpose_enum_name
        )
    }
}
