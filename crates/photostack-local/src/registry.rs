//! Function handlers the local cloud can run.
//!
//! A deployed function names its handler; the handler must be registered
//! here before the function can be provisioned.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use photostack_function::{ApiGatewayResponse, FunctionEnv, PhotoSource, handle};

/// What a handler sees for one invocation.
pub struct InvocationContext<'a> {
    /// Name of the function being invoked.
    pub function_name: &'a str,
    /// The function's environment.
    pub env: &'a BTreeMap<String, String>,
    /// Object access scoped to the function's role.
    pub source: &'a dyn PhotoSource,
}

impl fmt::Debug for InvocationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("function_name", &self.function_name)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

/// A function body.
#[async_trait]
pub trait FunctionHandler: Send + Sync {
    /// Run one invocation.
    async fn invoke(&self, ctx: &InvocationContext<'_>) -> ApiGatewayResponse;
}

/// The photo listing handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetPhotosHandler;

#[async_trait]
impl FunctionHandler for GetPhotosHandler {
    async fn invoke(&self, ctx: &InvocationContext<'_>) -> ApiGatewayResponse {
        let env = FunctionEnv::from_lookup(|key| ctx.env.get(key).cloned());
        handle(env, ctx.source).await
    }
}

/// Handlers by name.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn FunctionHandler>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}

impl HandlerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `getPhotos` handler.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(photostack_stack::topology::GET_PHOTOS_HANDLER, GetPhotosHandler);
        registry
    }

    /// Register (or replace) a handler.
    pub fn register(&mut self, name: impl Into<String>, handler: impl FunctionHandler + 'static) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Look up a handler.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn FunctionHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Whether a handler is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use photostack_function::SourceError;

    use super::*;

    struct OnePhoto;

    #[async_trait]
    impl PhotoSource for OnePhoto {
        async fn list_keys(&self, _bucket: &str) -> Result<Vec<String>, SourceError> {
            Ok(vec!["a.jpg".to_owned()])
        }

        async fn object_url(&self, bucket: &str, key: &str) -> Result<String, SourceError> {
            Ok(format!("http://local/{bucket}/{key}"))
        }
    }

    #[test]
    fn test_should_register_get_photos_by_default() {
        let registry = HandlerRegistry::with_defaults();
        assert!(registry.contains("getPhotos"));
        assert!(registry.get("listPhotos").is_none());
    }

    #[tokio::test]
    async fn test_should_run_get_photos_with_function_env() {
        let handler = HandlerRegistry::with_defaults().get("getPhotos").unwrap();
        let env = BTreeMap::from([("PHOTO_BUCKET_NAME".to_owned(), "photos".to_owned())]);
        let ctx = InvocationContext {
            function_name: "GetPhotos",
            env: &env,
            source: &OnePhoto,
        };
        let response = handler.invoke(&ctx).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body.contains("http://local/photos/a.jpg"));
    }

    #[tokio::test]
    async fn test_should_fail_without_bucket_env() {
        let handler = HandlerRegistry::with_defaults().get("getPhotos").unwrap();
        let env = BTreeMap::new();
        let ctx = InvocationContext {
            function_name: "GetPhotos",
            env: &env,
            source: &OnePhoto,
        };
        assert_eq!(
            handler.invoke(&ctx).await.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
