use std::fmt;

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::{ErrorCode, RPC_HTTP_METHOD};

// ── Identity ─────────────────────────────────────────────────────────────────

/// Who this process is, as far as the gateway is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    name: String,
    address: String,
    protocol: String,
}

impl ServiceIdentity {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            protocol: protocol.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Routing prefix the gateway mounts this service under.
    pub fn prefix(&self) -> String {
        format!("/{}", self.name)
    }
}

// ── Requests ─────────────────────────────────────────────────────────────────

/// Body of `POST /gateway/service`.
#[derive(Clone, Serialize)]
pub struct RegisterServiceRequest<'a> {
    pub name: &'a str,
    pub prefix: String,
    pub protocol: &'a str,
    pub address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
}

impl<'a> RegisterServiceRequest<'a> {
    pub fn new(identity: &'a ServiceIdentity, password: Option<&'a str>) -> Self {
        Self {
            name: identity.name(),
            prefix: identity.prefix(),
            protocol: identity.protocol(),
            address: identity.address(),
            password,
        }
    }
}

impl fmt::Debug for RegisterServiceRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterServiceRequest")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("protocol", &self.protocol)
            .field("address", &self.address)
            .field("password", &self.password.map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Body of `POST /gateway/service/beat`.
#[derive(Debug, Clone, Serialize)]
pub struct BeatRequest<'a> {
    pub service_name: &'a str,
    pub address: &'a str,
}

impl<'a> BeatRequest<'a> {
    pub fn new(identity: &'a ServiceIdentity) -> Self {
        Self {
            service_name: identity.name(),
            address: identity.address(),
        }
    }
}

/// One invocable operation, as submitted to `POST /gateway/api`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub service_name: String,
    pub path: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_method: Option<String>,
}

impl RouteDescriptor {
    pub fn http(
        service_name: impl Into<String>,
        path: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            path: path.into(),
            method: method.into(),
            grpc_service: None,
            grpc_method: None,
        }
    }

    /// RPC routes are always exposed as `POST`.
    pub fn rpc(
        service_name: impl Into<String>,
        path: impl Into<String>,
        grpc_service: impl Into<String>,
        grpc_method: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            path: path.into(),
            method: RPC_HTTP_METHOD.to_string(),
            grpc_service: Some(grpc_service.into()),
            grpc_method: Some(grpc_method.into()),
        }
    }

    pub fn is_rpc(&self) -> bool {
        self.grpc_service.is_some()
    }
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if let (Some(svc), Some(method)) = (&self.grpc_service, &self.grpc_method) {
            write!(f, " -> {svc}/{method}")?;
        }
        Ok(())
    }
}

// ── Responses ────────────────────────────────────────────────────────────────

/// Structured body of every gateway reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GatewayResponse {
    pub err_code: Option<ErrorCode>,
    pub message: String,
    pub data: Value,
}

impl GatewayResponse {
    /// Decode a reply body. Bodies that are not a JSON object yield `None`;
    /// the caller still has the HTTP status.
    ///
    /// Fields decode independently: a null or mistyped `message` or `data`
    /// never hides `err_code`.
    pub fn parse(body: &str) -> Option<Self> {
        let Value::Object(mut fields) = serde_json::from_str::<Value>(body).ok()? else {
            return None;
        };

        let err_code = fields
            .remove("err_code")
            .and_then(|code| serde_json::from_value(code).ok());
        let message = match fields.remove("message") {
            Some(Value::String(message)) => message,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Some(Self {
            err_code,
            message,
            data: fields.remove("data").unwrap_or_default(),
        })
    }

    pub fn has_code(&self, code: &ErrorCode) -> bool {
        self.err_code.as_ref() == Some(code)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn identity() -> ServiceIdentity {
        ServiceIdentity::new("user", "10.0.0.7:50051", "grpc")
    }

    #[test]
    fn prefix_is_slash_name() {
        assert_eq!(identity().prefix(), "/user");
    }

    #[test]
    fn register_body_shape() {
        let id = identity();
        let body = serde_json::to_value(RegisterServiceRequest::new(&id, Some("s3cret"))).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "user",
                "prefix": "/user",
                "protocol": "grpc",
                "address": "10.0.0.7:50051",
                "password": "s3cret",
            })
        );
    }

    #[test]
    fn register_body_without_password() {
        let id = identity();
        let body = serde_json::to_value(RegisterServiceRequest::new(&id, None)).unwrap();
        assert!(body.get("password").is_none());
    }

    #[test]
    fn register_debug_redacts_password() {
        let id = identity();
        let out = format!("{:?}", RegisterServiceRequest::new(&id, Some("s3cret")));
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("s3cret"));
    }

    #[test]
    fn beat_body_shape() {
        let id = identity();
        let body = serde_json::to_value(BeatRequest::new(&id)).unwrap();
        assert_eq!(
            body,
            json!({"service_name": "user", "address": "10.0.0.7:50051"})
        );
    }

    #[test]
    fn http_route_omits_rpc_fields() {
        let route = RouteDescriptor::http("user", "/users/:id", "GET");
        let body = serde_json::to_value(&route).unwrap();
        assert_eq!(
            body,
            json!({"service_name": "user", "path": "/users/:id", "method": "GET"})
        );
        assert!(!route.is_rpc());
    }

    #[test]
    fn rpc_route_is_post_with_targets() {
        let route = RouteDescriptor::rpc("user", "/say/hello", "greeter.Greeter", "SayHello");
        assert_eq!(route.method, "POST");
        assert!(route.is_rpc());
        assert_eq!(
            route.to_string(),
            "POST /say/hello -> greeter.Greeter/SayHello"
        );
    }

    #[test]
    fn parses_numeric_sentinel_reply() {
        let resp =
            GatewayResponse::parse(r#"{"err_code":410100,"message":"api exists","data":[]}"#)
                .unwrap();
        assert!(resp.has_code(&ErrorCode::Numeric(410_100)));
        assert_eq!(resp.message, "api exists");
    }

    #[test]
    fn parses_partial_reply() {
        let resp = GatewayResponse::parse(r#"{"err_code":"Error.RedisDynamicPassword"}"#).unwrap();
        assert!(resp.has_code(&ErrorCode::from("Error.RedisDynamicPassword")));
        assert!(resp.message.is_empty());
        assert!(resp.data.is_null());
    }

    #[test]
    fn null_message_keeps_code() {
        let resp =
            GatewayResponse::parse(r#"{"err_code":410100,"message":null,"data":null}"#).unwrap();
        assert!(resp.has_code(&ErrorCode::Numeric(410_100)));
        assert!(resp.message.is_empty());
        assert!(resp.data.is_null());
    }

    #[test]
    fn mistyped_fields_keep_code() {
        let resp = GatewayResponse::parse(
            r#"{"err_code":"Error.RedisDynamicPassword","message":{"zh":"x"},"data":7}"#,
        )
        .unwrap();
        assert!(resp.has_code(&ErrorCode::from("Error.RedisDynamicPassword")));
        assert_eq!(resp.message, r#"{"zh":"x"}"#);
        assert_eq!(resp.data, json!(7));
    }

    #[test]
    fn null_or_mistyped_code_is_absent() {
        assert!(GatewayResponse::parse(r#"{"err_code":null}"#).unwrap().err_code.is_none());
        assert!(GatewayResponse::parse(r#"{"err_code":[1]}"#).unwrap().err_code.is_none());
    }

    #[test]
    fn non_envelope_body_is_none() {
        assert!(GatewayResponse::parse("[410100]").is_none());
        assert!(GatewayResponse::parse("502 Bad Gateway").is_none());
    }
}
