/// Identifier parsing at the service boundary
///
/// Path and body identifiers arrive as strings. Anything that is not a
/// canonical hyphenated UUID is reported as `NotFound` without querying the
/// store, exactly like a well-formed id that matches nothing.

use uuid::Uuid;

use crate::error::ServiceError;

/// Parses `raw` as a UUID, or fails with "`what` not found"
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ServiceError> {
    let raw = raw.trim();
    if raw.len() != 36 {
        return Err(ServiceError::not_found(what));
    }

    Uuid::parse_str(raw).map_err(|_| ServiceError::not_found(what))
}
