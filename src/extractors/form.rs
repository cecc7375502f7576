//! Multipart form bodies used by product and package writes: text fields plus `images` files.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
};

/// Upload field name for gallery images.
pub const IMAGES_FIELD: &str = "images";

const ACCEPTED_IMAGE_SUBTYPES: &[&str] = &["jpeg", "jpg", "png"];
const DEFAULT_EXTENSION: &str = "jpg";
const MAX_EXTENSION_LEN: usize = 5;

#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Extension of the client file name, lowercased. Anything that is not a
    /// short ASCII alphanumeric suffix becomes `jpg`.
    pub fn extension(&self) -> String {
        self.original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| {
                !ext.is_empty()
                    && ext.len() <= MAX_EXTENSION_LEN
                    && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .unwrap_or_else(|| DEFAULT_EXTENSION.into())
    }
}

/// Only jpeg/jpg/png uploads are kept; anything else is dropped.
pub fn is_accepted_image(content_type: &str) -> bool {
    content_type
        .split('/')
        .nth(1)
        .map(|sub| sub.split(';').next().unwrap_or(sub).trim().to_lowercase())
        .is_some_and(|sub| ACCEPTED_IMAGE_SUBTYPES.contains(&sub.as_str()))
}

#[derive(Clone, Debug, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
}

impl FormData {
    pub fn from_parts(fields: Vec<(String, String)>, files: Vec<UploadedFile>) -> Self {
        FormData { fields, files }
    }

    /// First value of a text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value sent under `name`, `name[]` or `name[N]`.
    pub fn all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| field_matches(k, name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| field_matches(k, name))
    }
}

fn field_matches(key: &str, name: &str) -> bool {
    key == name
        || key
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('['))
            .is_some_and(|rest| rest.ends_with(']'))
}

#[async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::rejected(e.status(), e.body_text()))?;

        let mut form = FormData::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::rejected(e.status(), e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(original_name) => {
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::rejected(e.status(), e.body_text()))?;
                    if !field_matches(&name, IMAGES_FIELD) || !is_accepted_image(&content_type) {
                        tracing::debug!(
                            field = %name,
                            file = %original_name,
                            content_type = %content_type,
                            "skipping upload"
                        );
                        continue;
                    }
                    form.files.push(UploadedFile {
                        original_name,
                        content_type,
                        bytes,
                    });
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::rejected(e.status(), e.body_text()))?;
                    form.fields.push((name, value));
                }
            }
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_jpeg_and_png() {
        assert!(is_accepted_image("image/jpeg"));
        assert!(is_accepted_image("image/png"));
        assert!(is_accepted_image("image/JPG; charset=binary"));
        assert!(!is_accepted_image("image/gif"));
        assert!(!is_accepted_image("application/pdf"));
        assert!(!is_accepted_image(""));
    }

    #[test]
    fn collects_array_fields() {
        let form = FormData::from_parts(
            vec![
                ("categories[]".into(), "1".into()),
                ("categories[1]".into(), "2".into()),
                ("categoriesX".into(), "9".into()),
                ("name".into(), "Orc".into()),
            ],
            Vec::new(),
        );
        assert_eq!(form.all("categories"), vec!["1", "2"]);
        assert_eq!(form.text("name"), Some("Orc"));
        assert!(form.has("categories"));
        assert!(!form.has("products"));
    }

    #[test]
    fn extension_from_original_name() {
        let file = |name: &str| UploadedFile {
            original_name: name.into(),
            content_type: "image/png".into(),
            bytes: Bytes::new(),
        };
        assert_eq!(file("front.PNG").extension(), "png");
        assert_eq!(file("archive.tar.jpg").extension(), "jpg");
        assert_eq!(file("noext").extension(), "jpg");
    }

    #[test]
    fn unsafe_extensions_fall_back_to_jpg() {
        let file = |name: &str| UploadedFile {
            original_name: name.into(),
            content_type: "image/jpeg".into(),
            bytes: Bytes::new(),
        };
        assert_eq!(file(&format!("photo.{}", "j".repeat(160))).extension(), "jpg");
        assert_eq!(file("front.jpg/x").extension(), "jpg");
        assert_eq!(file("front.").extension(), "jpg");
        assert_eq!(file("scan.jp-g").extension(), "jpg");
        assert_eq!(file("scan.JPEG").extension(), "jpeg");
    }
}
