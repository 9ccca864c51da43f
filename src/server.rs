use std::sync::Arc;

use axum::{
    async_trait,
    body::HttpBody,
    extract::{FromRequest, State},
    http::{header, Request},
    response::{IntoResponse, Response},
    routing::{get, post},
    BoxError, Form, Json, Router,
};

use crate::{
    pipeline::Resolver,
    server_types::{ApiError, MoveRequest, ResolvedMove, ServiceInfo},
    session::Launcher,
};

pub fn serve_resolver<L: Launcher + 'static>(resolver: Resolver<L>) -> Router {
    Router::new()
        .route("/", get(get_info::<L>))
        .route("/make_move", post(make_move::<L>))
        .with_state(Arc::new(resolver))
}

async fn get_info<L: Launcher + 'static>(State(r): State<Arc<Resolver<L>>>) -> Json<ServiceInfo> {
    Json(r.info())
}

async fn make_move<L: Launcher + 'static>(
    State(r): State<Arc<Resolver<L>>>,
    MoveForm(request): MoveForm,
) -> Result<Json<ResolvedMove>, ApiError> {
    // A client hanging up must not abandon a search that holds the engine.
    let resolved = tokio::spawn(async move { r.resolve(&request).await }).await?;
    Ok(Json(resolved))
}

/// A [`MoveRequest`] sent either urlencoded or as JSON, chosen by `Content-Type`.
pub struct MoveForm(pub MoveRequest);

#[async_trait]
impl<S, B> FromRequest<S, B> for MoveForm
where
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            let Json(request) = Json::<MoveRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(request))
        } else {
            let Form(request) = Form::<MoveRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(request))
        }
    }
}
