use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;

use crate::config::Config;

/// Guard: requires `Authorization: Bearer <token>` matching
/// `[admin] api_token`. With no token configured every request is refused.
pub struct AdminToken;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminToken {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let expected = match request.guard::<&State<Config>>().await.succeeded() {
            Some(config) => config.admin.api_token.clone(),
            None => None,
        };
        let Some(expected) = expected.filter(|t| !t.is_empty()) else {
            return Outcome::Forward(Status::Unauthorized);
        };

        let presented = request
            .headers()
            .get_one("Authorization")
            .and_then(bearer_token);
        match presented {
            Some(token) if tokens_match(token, &expected) => Outcome::Success(AdminToken),
            _ => Outcome::Forward(Status::Unauthorized),
        }
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer  "), None);
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("s3cret", "s3cret"));
        assert!(!tokens_match("s3cres", "s3cret"));
        assert!(!tokens_match("s3cre", "s3cret"));
    }
}
