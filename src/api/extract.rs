/// Path and query extractors that reject with the JSON error envelope

use crate::error::ApiError;
use axum::{
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

/// `Path<T>` whose rejection is a `400 {success:false,error}`
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|rejection| ApiError::bad_request(format!("Invalid path: {}", rejection.body_text())))
    }
}

/// `Query<T>` whose rejection is a `400 {success:false,error}`
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection| ApiError::bad_request(format!("Invalid query string: {}", rejection.body_text())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Days {
        days: Option<u32>,
    }

    #[tokio::test]
    async fn malformed_query_is_a_bad_request() {
        let (mut parts, _) = Request::builder()
            .uri("/api/projects/p1/usage?days=abc")
            .body(())
            .map(|request| request.into_parts())
            .unwrap();

        let result = ApiQuery::<Days>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn valid_query_is_extracted() {
        let (mut parts, _) = Request::builder()
            .uri("/api/projects/p1/usage?days=7")
            .body(())
            .map(|request| request.into_parts())
            .unwrap();

        let ApiQuery(query) = ApiQuery::<Days>::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(query.days, Some(7));
    }
}
