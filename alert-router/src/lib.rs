pub mod config;
pub mod config_store;
pub mod errors;
pub mod forwarder;
pub mod http;
pub mod relay;
pub mod reload;
pub mod splitter;

#[cfg(test)]
mod testutils;

use crate::config::Listener;
use crate::config_store::ConfigStore;
use crate::errors::AlertRouterError;
use crate::forwarder::{Forwarder, HttpForwarder};
use crate::http::{HandlerBody, config_param, error_response, ok_response};
use crate::relay::RelayHandler;
use crate::reload::ReloadHandler;
use hyper::body::{Body, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::{make_error_response, run_http_service};
use std::fmt::Display;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

const ALERT_PATH: &str = "/alert";
const RELOAD_PATH: &str = "/reload";

/// Serves the relay on `listener` until the listener fails.
///
/// `store` must already hold the startup config; `config_path` is re-read on
/// every `/reload`.
pub async fn run(
    listener: Listener,
    store: Arc<ConfigStore>,
    config_path: PathBuf,
) -> Result<(), AlertRouterError> {
    listener.validate()?;

    let service = AlertRouterService::new(store, Arc::new(HttpForwarder::new()), config_path);
    run_http_service(&listener.host, listener.port, service).await
}

pub struct AlertRouterService {
    relay: Arc<RelayHandler>,
    reload: Arc<ReloadHandler>,
}

impl AlertRouterService {
    pub fn new(
        store: Arc<ConfigStore>,
        forwarder: Arc<dyn Forwarder>,
        config_path: PathBuf,
    ) -> Self {
        AlertRouterService {
            relay: Arc::new(RelayHandler::new(store.clone(), forwarder)),
            reload: Arc::new(ReloadHandler::new(store, config_path)),
        }
    }

    /// Dispatches a request to the matching handler. Handler errors become
    /// error responses, so this never fails.
    async fn route<B>(
        relay: Arc<RelayHandler>,
        reload: Arc<ReloadHandler>,
        req: Request<B>,
    ) -> Response<HandlerBody>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Display + Send,
    {
        match (req.method(), req.uri().path()) {
            (&Method::POST, ALERT_PATH) => {
                let config_name = config_param(req.uri());

                // Forwarding runs to completion even if the client goes away.
                let task = tokio::spawn(async move {
                    relay
                        .handle(config_name.as_deref(), req.into_body())
                        .await
                });

                match task.await {
                    Ok(Ok(_)) => ok_response("OK"),
                    Ok(Err(e)) => error_response(e),
                    Err(e) => error_response(e.into()),
                }
            }
            (_, ALERT_PATH) => make_error_response(StatusCode::METHOD_NOT_ALLOWED),
            (_, RELOAD_PATH) => match reload.reload().await {
                Ok(_) => ok_response("Config reloaded"),
                Err(e) => error_response(e.into()),
            },
            (method, path) => {
                tracing::warn!(method = %method, path, "No route matched");
                make_error_response(StatusCode::NOT_FOUND)
            }
        }
    }
}

impl Service<Request<Incoming>> for AlertRouterService {
    type Response = Response<HandlerBody>;
    type Error = AlertRouterError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let relay = self.relay.clone();
        let reload = self.reload.clone();

        Box::pin(async move { Ok(Self::route(relay, reload, req).await) })
    }
}
