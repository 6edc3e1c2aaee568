use anyhow::Context;
use bytes::Bytes;
use time::Date;
use tracing::{debug, info};
use uuid::Uuid;

use super::normalize::{normalize_image, ImageError, NormalizeOptions, NormalizedImage};
use crate::storage::{StorageClient, UPLOAD_NAMESPACE};

pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// A file part taken off the add-metrics form.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub filename: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Size and type checks applied before any decoding happens. Returns the
/// user-facing message on rejection.
pub fn validate_upload(item: &UploadItem, max_bytes: usize) -> Result<(), String> {
    if item.body.len() > max_bytes {
        return Err(format!(
            "Image file too large. Maximum size is {}MB. Your file is {:.1}MB.",
            max_bytes / (1024 * 1024),
            item.body.len() as f64 / (1024.0 * 1024.0)
        ));
    }
    // a part without a Content-Type is treated as an unknown format
    let ct = item.content_type.as_deref().unwrap_or_default();
    if !ALLOWED_CONTENT_TYPES.contains(&ct) {
        return Err(
            "Invalid image format. Please upload JPEG, PNG, GIF, or WebP images only.".to_string(),
        );
    }
    Ok(())
}

/// Runs [`normalize_image`] off the async workers.
pub async fn normalize_upload(
    item: UploadItem,
    opts: NormalizeOptions,
) -> anyhow::Result<Result<NormalizedImage, ImageError>> {
    let size_in = item.body.len();
    let res = tokio::task::spawn_blocking(move || normalize_image(&item.body, &item.filename, &opts))
        .await
        .context("image normalization task")?;
    if let Ok(img) = &res {
        debug!(size_in, size_out = img.body.len(), width = img.width, height = img.height, "image normalized");
    }
    Ok(res)
}

/// Every upload gets its own `upload_id`, so a new photo never lands on the
/// key an existing record points to.
pub fn object_key(user_id: Uuid, date: Date, upload_id: Uuid, filename: &str) -> String {
    format!("{}/{}/{}/{}-{}", UPLOAD_NAMESPACE, user_id, date, upload_id, filename)
}

/// Uploads a normalized image and returns its storage key.
pub async fn store_image(
    storage: &dyn StorageClient,
    user_id: Uuid,
    date: Date,
    img: NormalizedImage,
) -> anyhow::Result<String> {
    let key = object_key(user_id, date, Uuid::new_v4(), &img.filename);
    storage
        .put_object(&key, img.body, img.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    info!(%user_id, %key, "progress photo stored");
    Ok(key)
}

#[cfg(test)]
mod image_tests {
    use super::*;
    use crate::storage::LocalStorage;
    use time::macros::date;

    fn item(len: usize, ct: Option<&str>) -> UploadItem {
        UploadItem {
            filename: "p.jpg".into(),
            content_type: ct.map(str::to_string),
            body: Bytes::from(vec![0u8; len]),
        }
    }

    #[test]
    fn oversized_upload_reports_limit_and_actual_size() {
        let msg = validate_upload(&item(6 * 1024 * 1024 + 1024 * 103, Some("image/png")), 5 * 1024 * 1024)
            .unwrap_err();
        assert_eq!(msg, "Image file too large. Maximum size is 5MB. Your file is 6.1MB.");
    }

    #[test]
    fn content_type_allow_list() {
        let max = 5 * 1024 * 1024;
        for ct in ALLOWED_CONTENT_TYPES {
            assert!(validate_upload(&item(10, Some(ct)), max).is_ok());
        }
        let msg = validate_upload(&item(10, Some("image/heic")), max).unwrap_err();
        assert!(msg.starts_with("Invalid image format"));
        assert!(validate_upload(&item(10, Some("application/pdf")), max).is_err());
        // limit is inclusive
        assert!(validate_upload(&item(max, Some("image/gif")), max).is_ok());
    }

    #[test]
    fn missing_content_type_is_rejected() {
        let bmp = UploadItem {
            filename: "front.bmp".into(),
            content_type: None,
            body: Bytes::from_static(b"BM\x3a\x00\x00\x00"),
        };
        let msg = validate_upload(&bmp, 5 * 1024 * 1024).unwrap_err();
        assert_eq!(
            msg,
            "Invalid image format. Please upload JPEG, PNG, GIF, or WebP images only."
        );
        assert!(validate_upload(&item(10, Some("")), 5 * 1024 * 1024).is_err());
    }

    #[test]
    fn keys_live_under_the_upload_namespace() {
        let uid = Uuid::nil();
        let upload = Uuid::from_u128(1);
        assert_eq!(
            object_key(uid, date!(2025-10-15), upload, "a_compressed.jpg"),
            "health_metrics/00000000-0000-0000-0000-000000000000/2025-10-15/\
             00000000-0000-0000-0000-000000000001-a_compressed.jpg"
        );
        assert_ne!(
            object_key(uid, date!(2025-10-15), Uuid::new_v4(), "a_compressed.jpg"),
            object_key(uid, date!(2025-10-15), Uuid::new_v4(), "a_compressed.jpg")
        );
    }

    #[tokio::test]
    async fn normalize_then_store() {
        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(1000, 500)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let upload = UploadItem {
            filename: "run.png".into(),
            content_type: Some("image/png".into()),
            body: Bytes::from(png.into_inner()),
        };

        let img = normalize_upload(upload, NormalizeOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!((img.width, img.height), (800, 400));

        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "/media");
        let key = store_image(&storage, Uuid::nil(), date!(2025-10-15), img).await.unwrap();
        assert!(key.contains("/2025-10-15/"));
        assert!(key.ends_with("-run_compressed.jpg"));
        assert!(dir.path().join(&key).is_file());
    }
}
