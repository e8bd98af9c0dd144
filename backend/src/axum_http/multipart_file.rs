use axum::extract::Multipart;
use tracing::warn;

use crate::axum_http::error_responses::AppError;

/// First file in the multipart field `name`: its client-side file name and bytes.
/// Other fields are skipped.
pub async fn read_file_field(
    mut multipart: Multipart,
    name: &str,
) -> Result<(Option<String>, Vec<u8>), AppError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                return Err(AppError::BadRequest(format!(
                    "multipart field '{}' is required",
                    name
                )));
            }
            Err(err) => {
                warn!(error = %err, field = name, "http: malformed multipart body");
                return Err(AppError::BadRequest("malformed multipart body".to_string()));
            }
        };

        if field.name() != Some(name) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(format!("failed to read {}: {}", name, err)))?;
        return Ok((file_name, bytes.to_vec()));
    }
}
