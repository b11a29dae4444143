//! Request handling for the HTTP render endpoint.
//!
//! The transport lives in the binary; everything here works on parsed
//! method and body bytes so it can be exercised without a socket.

use serde::{Deserialize, Serialize};

use crate::{
    assets::parse_svg,
    config::SourceConfig,
    render::{synthesize_frame, SynthParams, DEFAULT_TRANSIT_SPEED},
    Result, ScopeError,
};

/// The endpoint always renders at this rate.
pub const SERVICE_SAMPLE_RATE: u32 = 48_000;

pub const DEFAULT_PORT: u16 = 5328;

const HEALTH_MESSAGE: &str = "scopewave render service is running";

/// Body of a render request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// The SVG document itself, not a path.
    pub svg: String,
    #[serde(default)]
    pub refresh_rate: Option<f64>,
    #[serde(default)]
    pub transit_speed: Option<f64>,
}

/// One refresh cycle split into channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub signal_left: Vec<f32>,
    pub signal_right: Vec<f32>,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Renders the single frame described by `request`.
pub fn render_request(request: &RenderRequest, source: &SourceConfig) -> Result<RenderResponse> {
    let params = SynthParams {
        sample_rate: SERVICE_SAMPLE_RATE,
        refresh_rate: request.refresh_rate.unwrap_or(60.0),
        transit_speed: request.transit_speed.unwrap_or(DEFAULT_TRANSIT_SPEED),
    };
    if params.refresh_rate.is_nan() || params.refresh_rate <= 0.0 {
        return Err(ScopeError::Config(format!(
            "refresh_rate must be positive, got {}",
            params.refresh_rate
        )));
    }

    let paths = parse_svg(request.svg.as_bytes(), source.points_per_unit)?;
    let signal = synthesize_frame(&paths, &params);
    Ok(RenderResponse {
        signal_left: signal.left(),
        signal_right: signal.right(),
        sample_rate: SERVICE_SAMPLE_RATE,
    })
}

/// A finished HTTP reply, minus transport framing.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl ServiceReply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(err) => {
                tracing::error!(error = %err, "could not encode reply");
                Self {
                    status: 500,
                    content_type: "application/json",
                    body: br#"{"error":"could not encode reply"}"#.to_vec(),
                }
            }
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(
            status,
            &ErrorResponse {
                error: message.into(),
            },
        )
    }

    fn text(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: message.as_bytes().to_vec(),
        }
    }

    pub fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            413 => "Payload Too Large",
            _ => "Internal Server Error",
        }
    }
}

/// Routes one request.
///
/// `GET` answers a health message and `OPTIONS` an empty CORS preflight.
/// `POST` renders: malformed requests get 400, render failures 500.
pub fn handle(method: &str, body: &[u8], source: &SourceConfig) -> ServiceReply {
    match method {
        "GET" => ServiceReply::text(200, HEALTH_MESSAGE),
        "OPTIONS" => ServiceReply::text(200, ""),
        "POST" => handle_render(body, source),
        other => ServiceReply::error(405, format!("method {other} not allowed")),
    }
}

fn handle_render(body: &[u8], source: &SourceConfig) -> ServiceReply {
    if body.is_empty() {
        return ServiceReply::error(400, "request body missing");
    }
    let request: RenderRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(err) => return ServiceReply::error(400, format!("malformed request: {err}")),
    };
    if request.svg.trim().is_empty() {
        return ServiceReply::error(400, "no svg provided");
    }

    match render_request(&request, source) {
        Ok(response) => {
            tracing::info!(samples = response.signal_left.len(), "rendered request");
            ServiceReply::json(200, &response)
        }
        Err(err) => {
            tracing::warn!(error = %err, "render request failed");
            ServiceReply::error(500, err.to_string())
        }
    }
}
