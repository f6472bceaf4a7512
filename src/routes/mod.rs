use std::str::FromStr;

use log::debug;

pub mod admin_api;
pub mod api;
pub mod auth;

/// Parse an optional `?status=` query value. `Err` means the value names no
/// known status; list routes answer those with an empty array.
pub(crate) fn status_param<T: FromStr<Err = String>>(raw: Option<&str>) -> Result<Option<T>, ()> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(|e| debug!("Ignoring status filter: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostStatus, VisibilityStatus};

    #[test]
    fn test_status_param() {
        assert_eq!(status_param::<PostStatus>(None), Ok(None));
        assert_eq!(status_param::<PostStatus>(Some("")), Ok(None));
        assert_eq!(status_param::<PostStatus>(Some("draft")), Ok(Some(PostStatus::Draft)));
        assert_eq!(status_param::<VisibilityStatus>(Some("deleted")), Err(()));
    }
}
