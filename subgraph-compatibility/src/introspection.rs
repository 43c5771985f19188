//! The federated introspection check: the subgraph's `_service { sdl }` must describe the same
//! schema as a reference SDL.
use std::path::Path;

use serde_json::Value;
use tracing::debug;
use tracing::error;

use crate::context::GraphQLRequest;
use crate::context::TestContext;
use crate::diff::DiffOptions;
use crate::diff::diff;
use crate::diff::summary;
use crate::error::CheckError;
use crate::error::LoadError;
use crate::error::NormalizeError;
use crate::normalize::normalize;

/// Reference schema of the products subgraph every implementation under test exposes.
pub const PRODUCTS_SCHEMA: &str = include_str!("../fixtures/products.graphql");

const SERVICE_SDL_QUERY: &str = "{ _service { sdl } }";

/// Compares a subgraph's reported SDL with a reference schema.
#[derive(Clone, Debug)]
pub struct IntrospectionCheck {
    /// Normalized reference SDL.
    expected: String,
    options: DiffOptions,
}

impl IntrospectionCheck {
    pub const NAME: &'static str = "Federated Introspection";
    pub const DESCRIPTION: &'static str =
        "Checks the subgraph schema returned from the _Service.sdl field.";

    /// A check against `expected_sdl`, which is normalized right away.
    pub fn new(expected_sdl: &str) -> Result<Self, NormalizeError> {
        Ok(Self {
            expected: normalize(expected_sdl)?,
            options: DiffOptions::default(),
        })
    }

    /// A check against the bundled products subgraph schema.
    pub fn products() -> Result<Self, NormalizeError> {
        Self::new(PRODUCTS_SCHEMA)
    }

    /// A check against the SDL file at `path`.
    pub fn from_fixture(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let sdl = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded reference schema");
        Ok(Self::new(&sdl)?)
    }

    pub fn with_options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    /// The normalized reference SDL.
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Fetch the subgraph's SDL through `context` and compare it with the reference.
    pub async fn run(&self, context: &dyn TestContext) -> Result<(), CheckError> {
        let response = context
            .send(GraphQLRequest::new(SERVICE_SDL_QUERY), None)
            .await?;
        let Some(sdl) = response
            .pointer("/data/_service/sdl")
            .and_then(Value::as_str)
        else {
            return Err(CheckError::Shape(
                "`data._service.sdl` is missing or not a string".to_string(),
            ));
        };

        let actual = normalize(sdl)?;
        match diff(&self.expected, &actual, &self.options)? {
            None => Ok(()),
            Some(schema_diff) => Err(CheckError::Mismatch(schema_diff)),
        }
    }

    /// Same as [`Self::run`], reporting failures on the console instead of returning them.
    pub async fn test(&self, context: &dyn TestContext) -> bool {
        match self.run(context).await {
            Ok(()) => {
                debug!(check = Self::NAME, "passed");
                true
            }
            Err(CheckError::Mismatch(schema_diff)) => {
                debug!(
                    check = Self::NAME,
                    changes = %summary(&schema_diff),
                    "subgraph schema does not match"
                );
                println!("{schema_diff}");
                false
            }
            Err(err) => {
                error!(check = Self::NAME, %err, "check failed");
                println!("{err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use http::HeaderMap;
    use serde_json::json;

    use super::*;
    use crate::error::TransportError;

    struct StaticContext(Value);

    #[async_trait]
    impl TestContext for StaticContext {
        async fn send(
            &self,
            request: GraphQLRequest,
            _headers: Option<HeaderMap>,
        ) -> Result<Value, TransportError> {
            assert_eq!(request.query, "{ _service { sdl } }");
            Ok(self.0.clone())
        }
    }

    fn sdl_response(sdl: &str) -> StaticContext {
        StaticContext(json!({ "data": { "_service": { "sdl": sdl } } }))
    }

    #[test]
    fn reference_schema_is_normalized_on_load() {
        let check = IntrospectionCheck::products().unwrap();
        assert!(check.expected().contains("_entities(representations: [_Any!]!): [_Entity]!"));
        assert!(IntrospectionCheck::new("type Product {").is_err());
    }

    #[test]
    fn missing_fixture_is_an_io_error() {
        let err = IntrospectionCheck::from_fixture("does/not/exist.graphql").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().starts_with("Could not read does/not/exist.graphql"));
    }

    #[tokio::test]
    async fn identical_schema_passes() {
        let check = IntrospectionCheck::products().unwrap();
        assert!(check.test(&sdl_response(PRODUCTS_SCHEMA)).await);
    }

    #[tokio::test]
    async fn non_string_sdl_is_a_shape_error() {
        let check = IntrospectionCheck::products().unwrap();
        let context = StaticContext(json!({ "data": { "_service": { "sdl": 42 } } }));
        assert!(matches!(
            check.run(&context).await,
            Err(CheckError::Shape(_))
        ));
        assert!(!check.test(&context).await);
    }

    #[tokio::test]
    async fn invalid_sdl_fails_the_check() {
        let check = IntrospectionCheck::products().unwrap();
        let context = sdl_response("type Product {");
        assert!(matches!(
            check.run(&context).await,
            Err(CheckError::Normalize(NormalizeError::Parse { .. }))
        ));
        assert!(!check.test(&context).await);
    }
}
