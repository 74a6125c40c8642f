//! Session-cookie authentication.
//!
//! Sign-in itself is delegated to the hosted identity provider; requests
//! arrive with a `session` cookie whose signature is checked against the
//! configured secret. Handlers take `AuthedUser` to get the verified user id.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, web::Data, FromRequest, HttpRequest};
use chat_core::session::verify_session_cookie;

use crate::error::AppError;
use crate::server::AppState;

pub const SESSION_COOKIE: &str = "session";

/// The authenticated user id extracted from the session cookie.
#[derive(Debug, Clone)]
pub struct AuthedUser(pub String);

impl FromRequest for AuthedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, AppError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_id = req.cookie(SESSION_COOKIE).and_then(|cookie| {
            let state = req.app_data::<Data<AppState>>()?;
            verify_session_cookie(cookie.value(), &state.config.session_secret)
        });

        ready(match user_id {
            Some(user_id) => Ok(AuthedUser(user_id)),
            None => {
                log::debug!("request rejected: missing or invalid session cookie");
                Err(AppError::AuthRequired)
            }
        })
    }
}
