use rocket::Request;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde_json::{Value, json};
use tracing::warn;

use super::{Claims, TokenIssuer};

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Claims {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("bearer_auth_guard");
        let _guard = auth_span.enter();

        let header = request.headers().get_one("Authorization");

        let token = match header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) => token,
            _ => {
                warn!("Missing bearer token");
                return Outcome::Error((Status::Forbidden, ()));
            }
        };

        let issuer = match request.rocket().state::<TokenIssuer>() {
            Some(issuer) => issuer,
            _ => {
                tracing::error!("Token issuer not found in managed state");
                return Outcome::Error((Status::InternalServerError, ()));
            }
        };

        match issuer.verify(token) {
            Ok(claims) => {
                tracing::info!(user_id = %claims.sub, role = %claims.role.as_str(), "Request authenticated via bearer token");
                Outcome::Success(claims)
            }
            Err(err) => {
                warn!(error = ?err, "Invalid bearer token");
                Outcome::Error((Status::Forbidden, ()))
            }
        }
    }
}

#[catch(403)]
pub fn forbidden_api(_req: &Request) -> Custom<Json<Value>> {
    let error_json = json!({
        "error": "Forbidden",
        "message": "A valid bearer token with the required role is needed"
    });

    Custom(Status::Forbidden, Json(error_json))
}

#[catch(401)]
pub fn unauthorized_api(_req: &Request) -> Custom<Json<Value>> {
    let error_json = json!({
        "error": "Unauthorized",
        "message": "Authentication required"
    });

    Custom(Status::Unauthorized, Json(error_json))
}

// Clients of the original service expect a 400, not Rocket's 422, when a
// body fails to parse.
#[catch(422)]
pub fn unprocessable_api(_req: &Request) -> Custom<Json<Value>> {
    let error_json = json!({
        "error": "Bad request",
        "message": "Request body could not be parsed"
    });

    Custom(Status::BadRequest, Json(error_json))
}
