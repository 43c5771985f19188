//! `@link` applications on a subgraph's schema definition.
//!
//! Only the parts needed to name federation definitions are modeled: the linked spec url, the
//! spec alias (`as:`), the imported elements (`import:`) and the purpose (`for:`).
use std::str;
use std::sync::Arc;

use apollo_compiler::InvalidNameError;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast::Directive;
use apollo_compiler::ast::Value;
use apollo_compiler::name;
use thiserror::Error;

use crate::link::spec::Identity;
use crate::link::spec::Url;

pub mod spec;

pub const DEFAULT_LINK_NAME: Name = name!("link");
pub const DEFAULT_IMPORT_SCALAR_NAME: Name = name!("Import");
pub const DEFAULT_PURPOSE_ENUM_NAME: Name = name!("Purpose");

#[derive(Error, Debug, PartialEq)]
pub enum LinkError {
    #[error(transparent)]
    InvalidName(#[from] InvalidNameError),
    #[error("Invalid use of @link in schema: {0}")]
    BootstrapError(String),
}

#[derive(Eq, PartialEq, Debug)]
pub enum Purpose {
    SECURITY,
    EXECUTION,
}

impl Purpose {
    pub fn from_value(value: &Value) -> Result<Purpose, LinkError> {
        if let Value::Enum(value) = value {
            value.parse::<Purpose>()
        } else {
            Err(LinkError::BootstrapError(
                "invalid `purpose` value, should be an enum".to_string(),
            ))
        }
    }
}

impl str::FromStr for Purpose {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SECURITY" => Ok(Purpose::SECURITY),
            "EXECUTION" => Ok(Purpose::EXECUTION),
            _ => Err(LinkError::BootstrapError(format!(
                "invalid/unrecognized `purpose` value '{s}'"
            ))),
        }
    }
}

#[derive(Eq, PartialEq, Debug)]
pub struct Import {
    /// The name of the imported element, never starting with '@': whether it is a directive is
    /// reflected by `is_directive`.
    pub element: Name,

    pub is_directive: bool,

    /// The optional alias under which the element is imported.
    pub alias: Option<Name>,
}

impl Import {
    pub fn from_value(value: &Value) -> Result<Import, LinkError> {
        match value {
            Value::String(str) => {
                if let Some(directive_name) = str.strip_prefix('@') {
                    Ok(Import {
                        element: Name::new(directive_name)?,
                        is_directive: true,
                        alias: None,
                    })
                } else {
                    Ok(Import {
                        element: Name::new(str)?,
                        is_directive: false,
                        alias: None,
                    })
                }
            }
            Value::Object(fields) => {
                let mut name: Option<&str> = None;
                let mut alias: Option<&str> = None;
                for (k, v) in fields {
                    match k.as_str() {
                        "name" => {
                            name = Some(v.as_str().ok_or_else(|| {
                                LinkError::BootstrapError("invalid value for `name` field in @link(import:) argument: must be a string".to_string())
                            })?)
                        }
                        "as" => {
                            alias = Some(v.as_str().ok_or_else(|| {
                                LinkError::BootstrapError("invalid value for `as` field in @link(import:) argument: must be a string".to_string())
                            })?)
                        }
                        _ => {
                            return Err(LinkError::BootstrapError(format!(
                                "unknown field `{k}` in @link(import:) argument"
                            )));
                        }
                    }
                }
                let Some(element) = name else {
                    return Err(LinkError::BootstrapError(
                        "invalid entry in @link(import:) argument, missing mandatory `name` field"
                            .to_string(),
                    ));
                };
                if let Some(directive_name) = element.strip_prefix('@') {
                    let alias = match alias {
                        Some(alias_str) => {
                            let Some(alias_str) = alias_str.strip_prefix('@') else {
                                return Err(LinkError::BootstrapError(format!(
                                    "invalid alias '{alias_str}' for import name '{element}': should start with '@' since the imported name does"
                                )));
                            };
                            Some(Name::new(alias_str)?)
                        }
                        None => None,
                    };
                    Ok(Import {
                        element: Name::new(directive_name)?,
                        is_directive: true,
                        alias,
                    })
                } else {
                    if let Some(alias) = alias {
                        if alias.starts_with('@') {
                            return Err(LinkError::BootstrapError(format!(
                                "invalid alias '{alias}' for import name '{element}': should not start with '@' (or, if {element} is a directive, then the name should start with '@')"
                            )));
                        }
                    }
                    Ok(Import {
                        element: Name::new(element)?,
                        is_directive: false,
                        alias: alias.map(Name::new).transpose()?,
                    })
                }
            }
            _ => Err(LinkError::BootstrapError(
                "invalid sub-value for @link(import:) argument: values should be either strings or input object values of the form { name: \"<importedElement>\", as: \"<alias>\" }.".to_string(),
            )),
        }
    }

    pub fn imported_name(&self) -> &Name {
        self.alias.as_ref().unwrap_or(&self.element)
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct Link {
    pub url: Url,
    pub spec_alias: Option<Name>,
    pub imports: Vec<Arc<Import>>,
    pub purpose: Option<Purpose>,
}

impl Link {
    pub fn spec_name_in_schema(&self) -> &Name {
        self.spec_alias.as_ref().unwrap_or(&self.url.identity.name)
    }

    pub fn directive_name_in_schema(&self, name: &Name) -> Name {
        // Imported directives keep their (possibly aliased) imported name. Others are qualified
        // by the spec name, except a directive named like the spec itself.
        if let Some(import) = self
            .imports
            .iter()
            .find(|i| i.is_directive && i.element == *name)
        {
            import.imported_name().clone()
        } else if name == self.url.identity.name.as_str() {
            self.spec_name_in_schema().clone()
        } else {
            Name::new_unchecked(&format!("{}__{}", self.spec_name_in_schema(), name))
        }
    }

    pub fn type_name_in_schema(&self, name: &Name) -> Name {
        if let Some(import) = self
            .imports
            .iter()
            .find(|i| !i.is_directive && i.element == *name)
        {
            import.imported_name().clone()
        } else {
            Name::new_unchecked(&format!("{}__{}", self.spec_name_in_schema(), name))
        }
    }

    pub fn is_federation(&self) -> bool {
        self.url.identity == Identity::federation_identity()
    }

    pub fn is_link(&self) -> bool {
        self.url.identity == Identity::link_identity()
    }

    pub fn from_directive_application(directive: &Node<Directive>) -> Result<Link, LinkError> {
        let Some(url) = directive.specified_argument_by_name("url") else {
            return Err(LinkError::BootstrapError(
                "the `url` argument for @link is mandatory".to_string(),
            ));
        };
        let url = url.as_str().ok_or_else(|| {
            LinkError::BootstrapError("the `url` argument for @link must be a String".to_string())
        })?;
        let url: Url = url.parse::<Url>().map_err(|e| {
            LinkError::BootstrapError(format!("invalid `url` argument (reason: {e})"))
        })?;

        let spec_alias = directive
            .specified_argument_by_name("as")
            .and_then(|arg| arg.as_str())
            .map(Name::new)
            .transpose()?;
        let purpose = directive
            .specified_argument_by_name("for")
            .map(|value| Purpose::from_value(value))
            .transpose()?;
        let imports = directive
            .specified_argument_by_name("import")
            .and_then(|arg| arg.as_list())
            .unwrap_or(&[])
            .iter()
            .map(|value| Ok(Arc::new(Import::from_value(value)?)))
            .collect::<Result<Vec<Arc<Import>>, LinkError>>()?;

        Ok(Link {
            url,
            spec_alias,
            imports,
            purpose,
        })
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::Schema;
    use apollo_compiler::name;

    use super::*;

    fn first_link(sdl: &str) -> Result<Link, LinkError> {
        let schema = Schema::builder()
            .adopt_orphan_extensions()
            .parse(sdl, "link.graphql")
            .build()
            .unwrap();
        let directive = schema
            .schema_definition
            .directives
            .get(DEFAULT_LINK_NAME.as_str())
            .unwrap();
        Link::from_directive_application(directive)
    }

    #[test]
    fn imported_directives_keep_their_name() {
        let link = first_link(
            r#"
            extend schema @link(url: "https://specs.apollo.dev/federation/v2.3", import: ["@key", { name: "@shareable", as: "@share" }, "FieldSet"])
            type Query { a: Int }
            "#,
        )
        .unwrap();
        assert!(link.is_federation());
        assert_eq!(link.directive_name_in_schema(&name!("key")).as_str(), "key");
        assert_eq!(link.directive_name_in_schema(&name!("shareable")).as_str(), "share");
        assert_eq!(
            link.directive_name_in_schema(&name!("requires")).as_str(),
            "federation__requires"
        );
        assert_eq!(link.type_name_in_schema(&name!("FieldSet")).as_str(), "FieldSet");
        assert_eq!(link.type_name_in_schema(&name!("Scope")).as_str(), "federation__Scope");
    }

    #[test]
    fn spec_alias_renames_qualified_elements() {
        let link = first_link(
            r#"
            extend schema @link(url: "https://specs.apollo.dev/federation/v2.0", as: "fed")
            type Query { a: Int }
            "#,
        )
        .unwrap();
        assert_eq!(link.directive_name_in_schema(&name!("key")).as_str(), "fed__key");
        assert_eq!(link.type_name_in_schema(&name!("FieldSet")).as_str(), "fed__FieldSet");
    }

    #[test]
    fn invalid_imports_are_rejected() {
        let err = first_link(
            r#"
            extend schema @link(url: "https://specs.apollo.dev/federation/v2.0", import: [{ name: "@key", as: "k" }])
            type Query { a: Int }
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid use of @link in schema: invalid alias 'k' for import name '@key': should start with '@' since the imported name does"
        );
    }

    #[test]
    fn missing_url_is_rejected() {
        let err = first_link(
            r#"
            extend schema @link(as: "fed")
            type Query { a: Int }
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            LinkError::BootstrapError("the `url` argument for @link is mandatory".to_string())
        );
    }
}
