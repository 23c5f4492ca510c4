//! Protocol-facing surface over a compiled registry.
//!
//! `CapabilityService` is what the surrounding protocol layer talks to:
//! it lists compiled capabilities and runs invocations — lookup, argument
//! validation, binding, then the transport call. Unknown and excluded
//! identifiers are indistinguishable by design; callers cannot tell which
//! routes were deliberately hidden.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::binding::binder::bind;
use crate::capabilities::capability::CapabilitySummary;
use crate::capabilities::registry::CapabilityRegistry;
use crate::errors::InvokeError;
use crate::transport::Transport;

/// Listing and invocation over one compiled registry.
pub struct CapabilityService {
    registry: Arc<CapabilityRegistry>,
    transport: Arc<dyn Transport>,
}

impl CapabilityService {
    /// Create a service over a compiled registry and a transport.
    pub fn new(registry: CapabilityRegistry, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry: Arc::new(registry),
            transport,
        }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Enumerate compiled capabilities, in compilation order.
    pub fn list(&self) -> Vec<CapabilitySummary> {
        self.registry.list()
    }

    /// Invoke a capability by identifier.
    ///
    /// Arguments are validated against the capability's input schema,
    /// bound to a concrete request, and handed to the transport. Each
    /// invocation is independent and safe to run concurrently with any
    /// others; the bound descriptor stays valid even if the capability is
    /// removed mid-flight.
    ///
    /// # Errors
    ///
    /// `InvokeError::NotFound` for unknown identifiers (excluded routes
    /// look exactly the same), otherwise the first validation, binding,
    /// or transport failure.
    pub async fn invoke(
        &self,
        identifier: &str,
        arguments: HashMap<String, Value>,
    ) -> Result<Value, InvokeError> {
        let capability =
            self.registry
                .get(identifier)
                .cloned()
                .ok_or_else(|| InvokeError::NotFound {
                    identifier: identifier.to_string(),
                })?;

        let arguments_value = Value::Object(arguments.clone().into_iter().collect());
        self.registry.validate(identifier, &arguments_value)?;

        let request = bind(&capability.descriptor, &arguments)?;
        log::debug!(
            "invoking '{}': {} {}",
            identifier,
            request.method,
            request.path
        );

        let result = self.transport.execute(&request).await?;
        log::debug!("invocation of '{}' completed", identifier);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::binding::binder::ResolvedRequest;
    use crate::compiler::pipeline::{compile, CompileOptions};
    use crate::compiler::rules::{CapabilityKind, MappingRule};
    use crate::errors::TransportError;
    use crate::openapi::route::{HttpMethod, ParameterSpec, RouteDescriptor};
    use crate::openapi::schema::SchemaObject;

    /// Records every executed request and echoes its resolved parts.
    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<ResolvedRequest>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn execute(&self, request: &ResolvedRequest) -> Result<Value, TransportError> {
            self.requests
                .lock()
                .map_err(|e| TransportError::Other(e.to_string()))?
                .push(request.clone());
            Ok(json!({ "path": request.path }))
        }
    }

    fn routes() -> Vec<RouteDescriptor> {
        vec![
            RouteDescriptor::new(HttpMethod::Get, "/users/{id}")
                .with_operation_id("get_user")
                .with_parameter(ParameterSpec::path("id", SchemaObject::integer())),
            RouteDescriptor::new(HttpMethod::Get, "/internal/metrics")
                .with_operation_id("read_metrics")
                .with_tag("internal"),
        ]
    }

    fn service_excluding_internal() -> (CapabilityService, Arc<RecordingTransport>) {
        let options = CompileOptions::new().with_rule(
            MappingRule::new(CapabilityKind::Excluded).with_required_tag("internal"),
        );
        let registry = compile(routes(), &options).unwrap();
        let transport = Arc::new(RecordingTransport::default());
        (
            CapabilityService::new(registry, transport.clone()),
            transport,
        )
    }

    #[tokio::test]
    async fn test_invoke_binds_and_delegates() {
        let (service, transport) = service_excluding_internal();
        let result = service
            .invoke("get_user", HashMap::from([("id".to_string(), json!(123))]))
            .await
            .unwrap();
        assert_eq!(result, json!({ "path": "/users/123" }));

        let recorded = transport.requests.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, HttpMethod::Get);
        assert_eq!(recorded[0].path, "/users/123");
    }

    #[tokio::test]
    async fn test_excluded_and_unknown_are_the_same_not_found() {
        let (service, _) = service_excluding_internal();

        let excluded = service.invoke("read_metrics", HashMap::new()).await;
        let unknown = service.invoke("never_existed", HashMap::new()).await;

        let shape = |r: Result<Value, InvokeError>| match r {
            Err(InvokeError::NotFound { .. }) => "not_found",
            _ => "other",
        };
        assert_eq!(shape(excluded), "not_found");
        assert_eq!(shape(unknown), "not_found");
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_rejected_before_binding() {
        let (service, transport) = service_excluding_internal();
        let err = service
            .invoke(
                "get_user",
                HashMap::from([("id".to_string(), json!("not-a-number"))]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Validation(_)));
        // The transport never saw the call.
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_required_argument_is_rejected_by_validator() {
        let (service, _) = service_excluding_internal();
        let err = service
            .invoke("get_user", HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_path_segment_surfaces_bind_error() {
        // A string path parameter passes validation with "" but can never
        // produce an empty segment; the binder rejects it.
        let routes = vec![RouteDescriptor::new(HttpMethod::Get, "/files/{name}")
            .with_operation_id("get_file")
            .with_parameter(ParameterSpec::path("name", SchemaObject::string()))];
        let registry = compile(routes, &CompileOptions::new()).unwrap();
        let service =
            CapabilityService::new(registry, Arc::new(RecordingTransport::default()));

        let err = service
            .invoke("get_file", HashMap::from([("name".to_string(), json!(""))]))
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Bind(_)));
    }

    #[tokio::test]
    async fn test_list_reflects_only_compiled_capabilities() {
        let (service, _) = service_excluding_internal();
        let listed: Vec<_> = service.list().into_iter().map(|s| s.identifier).collect();
        assert_eq!(listed, vec!["get_user"]);
    }
}
