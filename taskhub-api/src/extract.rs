/// Request extractors shared by the route handlers

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use taskhub_shared::ids::parse_id;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};

/// JSON body that has passed its `validator` rules
///
/// Malformed JSON is a `400 bad_request`; a rule violation is a
/// `400 validation_error` carrying the first failing message.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate().map_err(ApiError::from_validation_errors)?;
        Ok(Self(value))
    }
}

/// Parses a path segment as an id; malformed ids read as "not found"
pub fn path_id(raw: &str, what: &str) -> ApiResult<Uuid> {
    Ok(parse_id(raw, what)?)
}

/// Distinguishes an absent field from an explicit `null`
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent gives `None`, `null` gives `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        due_date: Option<Option<String>>,
    }

    #[test]
    fn test_double_option() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.due_date, None);

        let null: Patch = serde_json::from_str(r#"{"due_date": null}"#).unwrap();
        assert_eq!(null.due_date, Some(None));

        let set: Patch = serde_json::from_str(r#"{"due_date": "2030-01-01"}"#).unwrap();
        assert_eq!(set.due_date, Some(Some("2030-01-01".to_string())));
    }

    #[test]
    fn test_path_id_rejects_malformed_ids() {
        let err = path_id("not-an-id", "Task").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let id = Uuid::new_v4();
        assert_eq!(path_id(&id.to_string(), "Task").unwrap(), id);
    }
}
