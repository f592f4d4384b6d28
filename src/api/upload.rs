// multipart/form-data CSV extraction shared by the three upload endpoints

use crate::api::error::ApiError;
use actix_multipart::{Field, Multipart};
use futures::TryStreamExt;

/// Preferred form field for the uploaded file.
pub const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub struct CsvUpload {
    pub filename: String,
    pub text: String,
}

fn bad_multipart(err: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(format!("Invalid multipart body: {err}"))
}

async fn read_field(field: &mut Field, max_bytes: usize) -> Result<Vec<u8>, ApiError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(bad_multipart)? {
        if buf.len() + chunk.len() > max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "Uploaded file exceeds the {max_bytes} byte limit."
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

fn has_csv_extension(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".csv")
}

/// Pull the uploaded CSV out of a multipart body.
///
/// Takes the part named `file`, else the first part that carries a filename.
/// Rejects non-`.csv` filenames and non-UTF-8 content with 400.
pub async fn read_csv_upload(mut payload: Multipart, max_bytes: usize) -> Result<CsvUpload, ApiError> {
    let mut chosen: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = payload.try_next().await.map_err(bad_multipart)? {
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_owned),
                cd.get_filename().map(str::to_owned),
            ),
            None => (None, None),
        };
        let bytes = read_field(&mut field, max_bytes).await?;
        let Some(filename) = filename else {
            continue;
        };

        let is_file_field = name.as_deref() == Some(FILE_FIELD);
        if is_file_field || chosen.is_none() {
            chosen = Some((filename, bytes));
        }
        if is_file_field {
            break;
        }
    }

    let (filename, bytes) = chosen.ok_or_else(|| {
        ApiError::BadRequest(format!(
            "No file uploaded. Send the CSV as multipart field `{FILE_FIELD}`."
        ))
    })?;
    if !has_csv_extension(&filename) {
        return Err(ApiError::BadRequest(
            "Invalid file format. Please upload a CSV file.".to_string(),
        ));
    }
    let text = String::from_utf8(bytes)
        .map_err(|_| ApiError::BadRequest("Uploaded file is not valid UTF-8.".to_string()))?;

    tracing::debug!(filename = %filename, bytes = text.len(), "csv upload received");
    Ok(CsvUpload { filename, text })
}
