#![allow(clippy::needless_for_each)]

use ephemera_core::{ContentId, ContentKind, EntryView, LinkMetadata};

use super::schemas::{
    ErrorResponse, HealthResponse, LimitsResponse, MetricsResponse, ShareTextRequest,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Ephemera API",
        version = "0.1.0",
        description = "HTTP API for Ephemera. Share files and text with devices on the local network; everything expires after a fixed time.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health and metrics"),
        (name = "Content", description = "Sharing, listing and downloading content"),
        (name = "Events", description = "Live content events over Server-Sent Events")
    ),
    paths(
        super::health::health,
        super::health::metrics,
        super::config::get_config,
        super::content::list_content,
        super::content::get_content,
        super::content::share_text,
        super::content::upload_file,
        super::content::download_file,
        super::stream::events,
    ),
    components(schemas(
        ContentId,
        ContentKind,
        EntryView,
        LinkMetadata,
        ErrorResponse,
        HealthResponse,
        LimitsResponse,
        MetricsResponse,
        ShareTextRequest,
    ))
)]
pub struct ApiDoc;
