use std::convert::Infallible;
use std::sync::Arc;

use bytes::BufMut;
use futures_util::TryStreamExt;
use snapcode_core::ValidationError;
use snapcode_engine::{
    ArtifactGateway, GatewayError, ProcessImageResponse, IMAGE_FIELD, INTERNAL_MESSAGE,
};
use snapcode_logging::{snap_debug, snap_error, snap_info, snap_warn};
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

pub const NO_IMAGE: &str = "No image file provided";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const INVALID_FORM: &str = "Invalid form data";

/// Room for multipart boundaries and part headers on top of the file ceiling.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// The uploaded image field.
#[derive(Debug)]
struct Upload {
    file_name: Option<String>,
    media_type: String,
    bytes: Vec<u8>,
}

/// `POST /api/process-image` plus envelope replies for every rejection.
pub fn routes(
    gateway: Arc<ArtifactGateway>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let max_upload_bytes = gateway.config().max_upload_bytes;
    let body_limit = max_upload_bytes + MULTIPART_OVERHEAD;

    warp::path!("api" / "process-image")
        .and(warp::post())
        .and(warp::body::content_length_limit(body_limit))
        .and(warp::multipart::form().max_length(body_limit))
        .and(with_gateway(gateway))
        .and_then(handle_process_image)
        .recover(move |err| handle_rejection(err, max_upload_bytes))
}

fn with_gateway(
    gateway: Arc<ArtifactGateway>,
) -> impl Filter<Extract = (Arc<ArtifactGateway>,), Error = Infallible> + Clone {
    warp::any().map(move || gateway.clone())
}

async fn handle_process_image(
    form: FormData,
    gateway: Arc<ArtifactGateway>,
) -> Result<Response, Rejection> {
    let upload = match read_image_field(form).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            snap_info!("Request without an image field");
            return Ok(envelope(StatusCode::BAD_REQUEST, ProcessImageResponse::failure(NO_IMAGE)));
        }
        Err(err) => {
            snap_warn!("Unreadable multipart body: {}", err);
            return Ok(envelope(
                StatusCode::BAD_REQUEST,
                ProcessImageResponse::failure(INVALID_FORM),
            ));
        }
    };

    snap_info!(
        "Processing {:?} ({}, {} bytes)",
        upload.file_name.as_deref().unwrap_or("unnamed"),
        upload.media_type,
        upload.bytes.len()
    );

    match gateway.process(&upload.bytes, &upload.media_type).await {
        Ok(artifact) => {
            snap_debug!("Returning {} bytes of markup", artifact.markup.len());
            Ok(envelope(StatusCode::OK, ProcessImageResponse::ok(&artifact)))
        }
        Err(err) => {
            let status = StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                snap_error!("Conversion failed ({}): {:?}", err.kind(), err);
            }
            Ok(envelope(status, ProcessImageResponse::failure(err.to_string())))
        }
    }
}

/// Finds the image field; other fields are skipped.
async fn read_image_field(mut form: FormData) -> Result<Option<Upload>, warp::Error> {
    while let Some(part) = form.try_next().await? {
        if part.name() != IMAGE_FIELD {
            continue;
        }
        return collect_part(part).await.map(Some);
    }
    Ok(None)
}

async fn collect_part(part: Part) -> Result<Upload, warp::Error> {
    let file_name = part.filename().map(str::to_string);
    let media_type = part
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = part
        .stream()
        .try_fold(Vec::new(), |mut acc, chunk| {
            acc.put(chunk);
            async move { Ok(acc) }
        })
        .await?;
    Ok(Upload {
        file_name,
        media_type,
        bytes,
    })
}

fn envelope(status: StatusCode, body: ProcessImageResponse) -> Response {
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

async fn handle_rejection(err: Rejection, max_upload_bytes: u64) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        let too_large = ValidationError::TooLarge {
            max_bytes: max_upload_bytes,
            actual: 0,
        };
        (
            StatusCode::BAD_REQUEST,
            GatewayError::from_validation(&too_large).to_string(),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some()
        || err.find::<warp::reject::MissingHeader>().is_some()
        || err.find::<warp::reject::InvalidHeader>().is_some()
    {
        (StatusCode::BAD_REQUEST, INVALID_FORM.to_string())
    } else {
        snap_error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
    };
    Ok(envelope(status, ProcessImageResponse::failure(message)))
}
