//! API request middleware.

use actix_web::body::MessageBody;
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{Error, HttpMessage, web};
use log::info;
use serde_json::{Map, Value, json};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Parses a URL-encoded body into a JSON object. Repeated keys collect into
/// an array. Other content types, and malformed bodies, yield `{}`.
pub fn parse_form_body(content_type: &str, body: &[u8]) -> Value {
    let mut fields = Map::new();
    if content_type != FORM_CONTENT_TYPE {
        return Value::Object(fields);
    }

    let pairs = serde_html_form::from_bytes::<Vec<(String, String)>>(body).unwrap_or_default();
    for (key, value) in pairs {
        match fields.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                fields.insert(key, Value::String(value));
            }
        }
    }
    Value::Object(fields)
}

/// Logs method, original URL and parsed body of every request, then hands
/// the body back to the request so handlers can still extract it.
pub async fn log_request(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let bytes = req.extract::<web::Bytes>().await?;
    let body = parse_form_body(&req.content_type().to_string(), &bytes);

    info!(
        "{}",
        json!({
            "originalUrl": req.uri().to_string(),
            "method": req.method().as_str(),
            "body": body,
        })
    );

    req.set_payload(Payload::from(bytes));
    next.call(req).await
}
