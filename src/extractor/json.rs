use axum::{
    async_trait,
    body::{Body, Bytes},
    extract::{FromRequest, Json as AxumJson, Request},
    http::{header, HeaderMap},
};
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use std::fmt::Debug;

use crate::error::{ApiError, BodyError, ErrorVerbosityProvider, InternalServerError};

/// A Wrapper around [`axum::extract::Json`] that rejects with an [`ApiError`].
///
/// Extracts the request body as JSON consuming the request.
/// With [`ErrorVerbosity::Full`](crate::error::ErrorVerbosity::Full) the rejection carries the
/// expected schema of `T` as YAML.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + JsonSchema + Debug + Send,
    S: Send + Sync + ErrorVerbosityProvider,
{
    type Rejection = ApiError;

    #[tracing::instrument(name = "json_extractor", skip_all)]
    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = AxumJson::<T>::from_request(req, state).await;

        match json {
            Ok(json) => {
                tracing::trace!(json=?json.0, "Extracted");

                Ok(ApiJson(json.0))
            }
            Err(json_rejection) => {
                tracing::warn!(rejection=?json_rejection, "Rejection");

                let verbosity = state.error_verbosity();

                let body_expected_schema = match verbosity.should_generate_error_reason() {
                    true => serde_yaml::to_string(&schema_for!(T))
                        .map_err(|err| InternalServerError::from_generic_error(verbosity, err))?,
                    false => String::new(),
                };

                Err(BodyError::from_json_rejection(verbosity, json_rejection, body_expected_schema).into())
            }
        }
    }
}

/// Like [`ApiJson`], but a request without a JSON content type or with an empty body
/// extracts `T::default()`.
///
/// Malformed JSON sent as JSON is still rejected.
pub struct ApiJsonOrDefault<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJsonOrDefault<T>
where
    T: DeserializeOwned + JsonSchema + Debug + Default + Send,
    S: Send + Sync + ErrorVerbosityProvider,
{
    type Rejection = ApiError;

    #[tracing::instrument(name = "json_or_default_extractor", skip_all)]
    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !has_json_content_type(req.headers()) {
            tracing::trace!("No JSON content type, using default");

            return Ok(ApiJsonOrDefault(T::default()));
        }

        let (parts, body) = req.into_parts();

        let bytes = Bytes::from_request(Request::new(body), state)
            .await
            .map_err(|bytes_rejection| {
                tracing::warn!(rejection=?bytes_rejection, "Rejection");

                BodyError::new(
                    state.error_verbosity(),
                    bytes_rejection.status(),
                    bytes_rejection.body_text(),
                    String::new(),
                )
            })?;

        if bytes.is_empty() {
            tracing::trace!("Empty body, using default");

            return Ok(ApiJsonOrDefault(T::default()));
        }

        let req = Request::from_parts(parts, Body::from(bytes));
        let ApiJson(json) = ApiJson::<T>::from_request(req, state).await?;

        Ok(ApiJsonOrDefault(json))
    }
}

/// `application/json` or any `application/*+json` type.
fn has_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .and_then(|content_type| content_type.split(';').next())
        .map(|essence| {
            let essence = essence.trim().to_ascii_lowercase();

            essence == "application/json"
                || (essence.starts_with("application/") && essence.ends_with("+json"))
        })
        .unwrap_or(false)
}
