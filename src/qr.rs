// src/qr.rs
//
// Per-ticket QR images: encode the secure token as a PNG and push it to the
// object store under a key derived from the order.

use aws_sdk_s3::primitives::ByteStream;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

use crate::AppState;

pub fn encode_png(payload: &str) -> Result<Vec<u8>, String> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| format!("qr encode: {e}"))?;
    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(240, 240)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| format!("qr render: {e}"))?;

    Ok(png)
}

pub fn ticket_key(order_id: i32, secure_token: &str) -> String {
    format!("tickets/{order_id}/{secure_token}.png")
}

/// Public URL for a stored object. Supports `{bucket}`/`{key}` templating and
/// bases that already carry the bucket (virtual-hosted style).
pub fn build_public_url(base: &str, bucket: &str, key: &str) -> String {
    let trimmed = base.trim_end_matches('/');

    if trimmed.contains("{bucket}") || trimmed.contains("{key}") {
        return trimmed.replace("{bucket}", bucket).replace("{key}", key);
    }

    if trimmed.contains(bucket) {
        format!("{trimmed}/{key}")
    } else {
        format!("{trimmed}/{bucket}/{key}")
    }
}

/// Uploads one ticket QR image and returns its public URL. With mock storage
/// enabled the upload is skipped and only the URL is produced.
pub async fn upload_ticket_image(
    state: &AppState,
    key: &str,
    png: Vec<u8>,
) -> Result<String, String> {
    if !state.config.mock_storage {
        state
            .s3_client
            .put_object()
            .bucket(&state.config.s3_bucket)
            .key(key)
            .content_type("image/png")
            .body(ByteStream::from(png))
            .send()
            .await
            .map_err(|e| format!("s3 upload: {e}"))?;
    }

    Ok(build_public_url(
        &state.config.s3_public_base_url,
        &state.config.s3_bucket,
        key,
    ))
}
