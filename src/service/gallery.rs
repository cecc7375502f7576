//! Image rows of product and package galleries, kept in step with the files on disk.

use crate::catalog::ordering::sort_by_position;
use crate::catalog::{compact_after_removal, positions_for_uploads, reorder_existing, ImagesOrder};
use crate::error::AppError;
use crate::extractors::UploadedFile;
use crate::images::{Gallery, ImageStore};
use crate::models::Image;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use std::path::PathBuf;

pub const INVALID_REQUEST_MSG: &str = "Invalid request!";

/// `(image table, owner column)`.
fn table(gallery: Gallery) -> (&'static str, &'static str) {
    match gallery {
        Gallery::Products => ("product_images", "product_id"),
        Gallery::Packages => ("package_images", "package_id"),
    }
}

/// Images of every owner in `owner_ids`, each list sorted by position.
pub async fn load(
    conn: &mut PgConnection,
    gallery: Gallery,
    owner_ids: &[i32],
) -> Result<HashMap<i32, Vec<Image>>, AppError> {
    if owner_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let (table, owner) = table(gallery);
    let sql = format!(
        "SELECT id, {owner} AS owner_id, filename, position FROM {table} \
         WHERE {owner} = ANY($1) ORDER BY position, id"
    );
    let rows: Vec<Image> = sqlx::query_as(&sql)
        .bind(owner_ids)
        .fetch_all(&mut *conn)
        .await?;
    let mut out: HashMap<i32, Vec<Image>> = HashMap::new();
    for image in rows {
        out.entry(image.owner_id).or_default().push(image);
    }
    for images in out.values_mut() {
        sort_by_position(images);
    }
    Ok(out)
}

/// Files written by [`save`] whose rows are not committed yet.
#[must_use = "discard the files when the transaction does not commit"]
#[derive(Debug, Default)]
pub struct StoredUploads {
    folder: PathBuf,
    filenames: Vec<String>,
    /// The owner folder did not exist before the upload.
    new_folder: bool,
}

impl StoredUploads {
    /// Removes every written file, and the folder when the upload created it.
    pub async fn discard(self, store: &ImageStore) {
        let result = if self.new_folder {
            store.remove_folder(&self.folder).await
        } else {
            let mut result = Ok(());
            for filename in &self.filenames {
                if let Err(e) = store.remove(&self.folder, filename).await {
                    result = Err(e);
                }
            }
            result
        };
        match result {
            Ok(()) => tracing::info!(
                folder = %self.folder.display(),
                files = self.filenames.len(),
                "discarded uncommitted images"
            ),
            Err(e) => tracing::warn!(
                folder = %self.folder.display(),
                error = %e,
                "could not discard uncommitted images"
            ),
        }
    }
}

/// Commits `tx`; when that fails the files in `stored` are removed again.
pub async fn commit_with(
    tx: sqlx::Transaction<'_, sqlx::Postgres>,
    store: &ImageStore,
    stored: StoredUploads,
) -> Result<(), AppError> {
    if let Err(e) = tx.commit().await {
        stored.discard(store).await;
        return Err(e.into());
    }
    Ok(())
}

/// Moves existing images to the positions named in `order`, then stores
/// `files` and inserts their rows. Must run inside the owner's write
/// transaction; pass the result to [`commit_with`]. Files of a failed call
/// are removed before the error is returned.
pub async fn save(
    conn: &mut PgConnection,
    store: &ImageStore,
    gallery: Gallery,
    owner_id: i32,
    files: &[UploadedFile],
    order: &ImagesOrder,
) -> Result<StoredUploads, AppError> {
    let (table, owner) = table(gallery);
    let current = load(conn, gallery, &[owner_id])
        .await?
        .remove(&owner_id)
        .unwrap_or_default();

    let update = format!("UPDATE {table} SET position = $1, updated = NOW() WHERE id = $2");
    for (id, position) in reorder_existing(&current, order) {
        sqlx::query(&update)
            .bind(position)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }

    if files.is_empty() {
        return Ok(StoredUploads::default());
    }

    let in_use: Vec<i32> = current
        .iter()
        .map(|img| order.get(&img.filename).copied().unwrap_or(img.position))
        .collect();
    let names: Vec<String> = files.iter().map(|f| f.original_name.clone()).collect();
    let positions = positions_for_uploads(&names, order, &in_use);

    let folder = store.folder(gallery, owner_id);
    let mut stored = StoredUploads {
        new_folder: !tokio::fs::try_exists(&folder).await?,
        folder,
        filenames: Vec::with_capacity(files.len()),
    };
    let insert = format!("INSERT INTO {table} ({owner}, filename, position) VALUES ($1, $2, $3)");
    for (file, position) in files.iter().zip(positions) {
        let written = store_one(conn, store, &insert, owner_id, file, position, &mut stored).await;
        if let Err(e) = written {
            stored.discard(store).await;
            return Err(e);
        }
    }
    tracing::info!(gallery = gallery.dir_name(), owner_id, uploaded = files.len(), "images stored");
    Ok(stored)
}

async fn store_one(
    conn: &mut PgConnection,
    store: &ImageStore,
    insert: &str,
    owner_id: i32,
    file: &UploadedFile,
    position: i32,
    stored: &mut StoredUploads,
) -> Result<(), AppError> {
    let filename = store.unused_filename(&stored.folder, &file.extension()).await?;
    // recorded before writing so a half-written pair is removed too
    stored.filenames.push(filename.clone());
    store.upload(file.bytes.to_vec(), &stored.folder, &filename).await?;
    sqlx::query(insert)
        .bind(owner_id)
        .bind(&filename)
        .bind(position)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Deletes one image of `owner_id` and closes the gap it leaves.
/// An image that belongs to another owner is rejected with 400.
pub async fn remove_image(
    pool: &PgPool,
    store: &ImageStore,
    gallery: Gallery,
    owner_id: i32,
    image_id: i32,
) -> Result<(), AppError> {
    let (table, _) = table(gallery);
    let mut tx = pool.begin().await?;
    let images = load(&mut tx, gallery, &[owner_id])
        .await?
        .remove(&owner_id)
        .unwrap_or_default();
    let removed = images
        .iter()
        .find(|img| img.id == image_id)
        .cloned()
        .ok_or_else(|| AppError::BadRequest(INVALID_REQUEST_MSG.into()))?;

    sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(removed.id)
        .execute(&mut *tx)
        .await?;
    let update = format!("UPDATE {table} SET position = $1, updated = NOW() WHERE id = $2");
    for (id, position) in compact_after_removal(&images, &removed) {
        sqlx::query(&update)
            .bind(position)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    store
        .remove(&store.folder(gallery, owner_id), &removed.filename)
        .await?;
    tracing::info!(gallery = gallery.dir_name(), owner_id, image_id, "image removed");
    Ok(())
}

/// Removes the owner's folder once its rows are gone.
pub async fn remove_all(
    store: &ImageStore,
    gallery: Gallery,
    owner_id: i32,
) -> Result<(), AppError> {
    store.remove_folder(&store.folder(gallery, owner_id)).await
}
