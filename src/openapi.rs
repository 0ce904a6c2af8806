use crate::media::ResolvedMedia;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::login,
        crate::routes::logout,
        crate::routes::list_leads,
        crate::routes::get_page,
        crate::routes::update_page,
        crate::routes::upload_file,
    ),
    components(schemas(ResolvedMedia)),
    tags(
        (name = "auth", description = "Session cookie management"),
        (name = "admin", description = "Authenticated proxy to the content backend"),
    )
)]
pub struct ApiDoc;
