//! Static serving of stored assets and cover files.

use actix_files::NamedFile;
use actix_web::{get, web, HttpRequest, HttpResponse};

use crate::error::AssetError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/uploads/{name}",
    params(
        ("name" = String, Path, description = "Asset or cover file name")
    ),
    responses(
        (status = 200, description = "File bytes"),
        (status = 403, description = "File type or path not allowed", body = audio_locker_types::ErrorResponse),
        (status = 404, description = "File not found", body = audio_locker_types::ErrorResponse)
    )
)]
#[get("/uploads/{name:.*}")]
/// Serve an asset or cached cover from the storage root.
pub async fn serve_upload(
    state: web::Data<AppState>,
    name: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let library = state.library.clone();
    let name = name.into_inner();
    let path = match web::block(move || library.serve_path(&name)).await {
        Ok(Ok(path)) => path,
        Ok(Err(err)) => return err.into_response(),
        Err(err) => return super::blocking_failed(err),
    };
    match NamedFile::open(&path) {
        Ok(file) => file.into_response(&req),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            AssetError::NotFound("file not found".to_string()).into_response()
        }
        Err(err) => AssetError::Storage(
            anyhow::Error::new(err).context(format!("open {:?}", path)),
        )
        .into_response(),
    }
}
