#![allow(clippy::needless_for_each)]

use crate::{
    api::handlers::{
        health::{self, __path_health},
        reset_password::{self, __path_reset_password},
    },
    reset::ResetOutcome,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(health, reset_password),
    components(schemas(health::Health, reset_password::ResetRequest, ResetOutcome)),
    tags(
        (name = "health", description = "Service status"),
        (name = "reset", description = "Mandatory password reset")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = env!("CARGO_PKG_NAME").to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc.info.description = Some(env!("CARGO_PKG_DESCRIPTION").to_string());
    doc
}
