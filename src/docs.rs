use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::admin_auth::login,
        crate::api::orders::skip_ambassador_confirmation,
        crate::api::subscribe::subscribe_phone
    ),
    components(
        schemas(
            crate::api::admin_auth::AdminLoginRequest,
            crate::api::orders::SkipConfirmationRequest,
            crate::api::orders::UpdateOrderEmailRequest,
            crate::api::subscribe::SubscribeRequest
        )
    ),
    tags(
        (name = "admin", description = "Admin dashboard operations"),
        (name = "public", description = "Public endpoints")
    )
)]
pub struct ApiDoc;
