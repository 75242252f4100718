use crate::errors::AlertRouterError;
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::Response;
use hyper::Uri;
use hyper::body::{Body, Bytes};
use shared::http::make_text_response;
use std::fmt::Display;

pub type HandlerBody = BoxBody<Bytes, AlertRouterError>;

const CONFIG_PARAM: &str = "config";

/// First value of the `config` query parameter.
pub fn config_param(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == CONFIG_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Collects a request body into bytes.
pub async fn read_body<B>(body: B) -> Result<Bytes, AlertRouterError>
where
    B: Body,
    B::Error: Display,
{
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| AlertRouterError::RequestBodyError(e.to_string()))
}

pub fn ok_response(text: &'static str) -> Response<HandlerBody> {
    make_text_response(hyper::StatusCode::OK, text)
}

/// Maps a handler error to its status and public message, logging the cause.
pub fn error_response(error: AlertRouterError) -> Response<HandlerBody> {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(error = %error, status = status.as_u16(), "Request failed");
    } else {
        tracing::warn!(error = %error, status = status.as_u16(), "Request rejected");
    }

    make_text_response(status, format!("{}\n", error.public_message()))
}
