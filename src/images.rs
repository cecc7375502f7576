//! Image storage on disk: a re-encoded original plus a square thumbnail.

use crate::error::AppError;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const THUMBNAIL_SIZE: u32 = 250;
pub const JPEG_QUALITY: u8 = 75;
pub const THUMBNAIL_PREFIX: &str = "thumbnail_";
const HASH_LEN: usize = 6;
const HASH_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Which gallery an image belongs to; selects the folder under the uploads root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gallery {
    Products,
    Packages,
}

impl Gallery {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Gallery::Products => "products",
            Gallery::Packages => "packages",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ImageStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<gallery>/<owner id>`.
    pub fn folder(&self, gallery: Gallery, owner_id: i32) -> PathBuf {
        self.root.join(gallery.dir_name()).join(owner_id.to_string())
    }

    /// Decode `bytes`, write it as JPEG to `folder/filename` and a cover-cropped
    /// thumbnail to `folder/thumbnail_<filename>`. Runs on the blocking pool.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        folder: &Path,
        filename: &str,
    ) -> Result<(), AppError> {
        tokio::fs::create_dir_all(folder).await?;
        let original = folder.join(filename);
        let thumbnail = folder.join(thumbnail_name(filename));
        tokio::task::spawn_blocking(move || write_derivatives(&bytes, &original, &thumbnail))
            .await
            .map_err(|e| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
        tracing::debug!(folder = %folder.display(), filename, "image stored");
        Ok(())
    }

    /// A stored name with `extension` that no file in `folder` uses yet.
    pub async fn unused_filename(
        &self,
        folder: &Path,
        extension: &str,
    ) -> Result<String, AppError> {
        loop {
            let filename = stored_filename(extension);
            if !tokio::fs::try_exists(folder.join(&filename)).await? {
                return Ok(filename);
            }
            tracing::debug!(folder = %folder.display(), filename, "stored name taken");
        }
    }

    /// Remove an image and its thumbnail; files already gone are ignored.
    pub async fn remove(&self, folder: &Path, filename: &str) -> Result<(), AppError> {
        for path in [folder.join(filename), folder.join(thumbnail_name(filename))] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Remove a whole gallery folder.
    pub async fn remove_folder(&self, folder: &Path) -> Result<(), AppError> {
        match tokio::fs::remove_dir_all(folder).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn thumbnail_name(filename: &str) -> String {
    format!("{}{}", THUMBNAIL_PREFIX, filename)
}

/// Random alphanumeric stem plus the client's extension, e.g. `aZ3k9Q.png`.
pub fn stored_filename(extension: &str) -> String {
    // the leading bytes of a v4 uuid carry no version bits
    let hash: String = Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(HASH_LEN)
        .map(|b| char::from(HASH_ALPHABET[usize::from(*b) % HASH_ALPHABET.len()]))
        .collect();
    format!("{}.{}", hash, extension)
}

fn write_derivatives(bytes: &[u8], original: &Path, thumbnail: &Path) -> Result<(), AppError> {
    let img = image::load_from_memory(bytes)?;
    write_jpeg(&img, original)?;
    let thumb = img.resize_to_fill(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3);
    write_jpeg(&thumb, thumbnail)?;
    Ok(())
}

fn write_jpeg(img: &DynamicImage, path: &Path) -> Result<(), AppError> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
    // JPEG has no alpha channel
    img.to_rgb8().write_with_encoder(encoder)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x % 255) as u8, (y % 255) as u8, 90])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn open_guessed(path: &Path) -> DynamicImage {
        image::ImageReader::open(path)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
    }

    #[test]
    fn stored_name_keeps_extension() {
        let name = stored_filename("png");
        let (stem, ext) = name.split_once('.').unwrap();
        assert_eq!(stem.len(), 6);
        assert!(stem.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(ext, "png");
    }

    #[test]
    fn stored_names_use_mixed_case_letters_and_digits() {
        let stems: Vec<String> = (0..200)
            .map(|_| stored_filename("jpg").trim_end_matches(".jpg").to_string())
            .collect();
        let all: String = stems.concat();
        assert!(all.chars().any(|c| c.is_ascii_uppercase()));
        assert!(all.chars().any(|c| ('g'..='z').contains(&c)));
        let distinct: std::collections::HashSet<&String> = stems.iter().collect();
        assert!(distinct.len() > 190);
    }

    #[tokio::test]
    async fn unused_filename_skips_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let name = store.unused_filename(dir.path(), "png").await.unwrap();
        assert!(name.ends_with(".png"));
        assert!(!dir.path().join(&name).exists());
    }

    #[test]
    fn folder_layout() {
        let store = ImageStore::new("/srv/uploads");
        assert_eq!(store.folder(Gallery::Packages, 12), PathBuf::from("/srv/uploads/packages/12"));
        assert_eq!(thumbnail_name("abc.jpg"), "thumbnail_abc.jpg");
    }

    #[tokio::test]
    async fn upload_writes_original_and_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let folder = store.folder(Gallery::Products, 3);

        store.upload(png_bytes(640, 320), &folder, "x1y2z3.png").await.unwrap();

        let thumb = open_guessed(&folder.join("thumbnail_x1y2z3.png"));
        assert_eq!((thumb.width(), thumb.height()), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
        let full = open_guessed(&folder.join("x1y2z3.png"));
        assert_eq!((full.width(), full.height()), (640, 320));

        store.remove(&folder, "x1y2z3.png").await.unwrap();
        assert!(!folder.join("x1y2z3.png").exists());
        assert!(!folder.join("thumbnail_x1y2z3.png").exists());
        store.remove(&folder, "x1y2z3.png").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_undecodable_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let folder = store.folder(Gallery::Products, 1);
        let err = store.upload(b"not an image".to_vec(), &folder, "a.jpg").await.unwrap_err();
        assert!(matches!(err, AppError::Image(_)));
    }
}
