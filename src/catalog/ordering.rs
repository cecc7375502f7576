//! Image position bookkeeping for product and package galleries.

use crate::error::AppError;
use crate::models::Image;
use std::collections::{HashMap, HashSet};

/// `imagesOrder` form field: file name (original name for uploads, stored name
/// for existing images) mapped to its position.
pub type ImagesOrder = HashMap<String, i32>;

pub fn parse_images_order(raw: Option<&str>) -> Result<ImagesOrder, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(ImagesOrder::new()),
        Some(s) => serde_json::from_str(s).map_err(|_| {
            AppError::BadRequest("imagesOrder must be a JSON object of name to position".into())
        }),
    }
}

/// Existing images whose position changes according to `order`, as `(image id, new position)`.
pub fn reorder_existing(images: &[Image], order: &ImagesOrder) -> Vec<(i32, i32)> {
    images
        .iter()
        .filter_map(|img| match order.get(&img.filename) {
            Some(&pos) if pos != img.position => Some((img.id, pos)),
            _ => None,
        })
        .collect()
}

/// Positions for newly uploaded files, in upload order. A file listed in
/// `order` takes that position unless an earlier image already holds it, in
/// which case it moves to the next free slot above. Unlisted files go after
/// the highest position in use.
pub fn positions_for_uploads(
    original_names: &[String],
    order: &ImagesOrder,
    existing: &[i32],
) -> Vec<i32> {
    let mut taken: HashSet<i32> = existing.iter().copied().collect();
    let after_last = existing
        .iter()
        .chain(original_names.iter().filter_map(|n| order.get(n)))
        .max()
        .map_or(0, |m| m + 1);
    original_names
        .iter()
        .map(|name| {
            let mut pos = order.get(name).copied().unwrap_or(after_last);
            while !taken.insert(pos) {
                pos += 1;
            }
            pos
        })
        .collect()
}

/// After removing `removed`, every image positioned after it moves up one slot.
pub fn compact_after_removal(images: &[Image], removed: &Image) -> Vec<(i32, i32)> {
    images
        .iter()
        .filter(|img| img.id != removed.id && img.position > removed.position)
        .map(|img| (img.id, img.position - 1))
        .collect()
}

/// Sorts a gallery by position for display.
pub fn sort_by_position(images: &mut [Image]) {
    images.sort_by_key(|img| (img.position, img.id));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(id: i32, filename: &str, position: i32) -> Image {
        Image {
            id,
            owner_id: 1,
            filename: filename.into(),
            position,
        }
    }

    #[test]
    fn parses_order_map() {
        let order = parse_images_order(Some(r#"{"a.jpg": 0, "b.png": 2}"#)).unwrap();
        assert_eq!(order.get("b.png"), Some(&2));
        assert!(parse_images_order(None).unwrap().is_empty());
        assert!(parse_images_order(Some("  ")).unwrap().is_empty());
        assert!(parse_images_order(Some("[1,2]")).is_err());
    }

    #[test]
    fn reorders_only_changed_images() {
        let images = vec![img(1, "aaa.jpg", 0), img(2, "bbb.jpg", 1), img(3, "ccc.jpg", 2)];
        let order: ImagesOrder = [
            ("aaa.jpg".to_string(), 1),
            ("bbb.jpg".to_string(), 0),
            ("ccc.jpg".to_string(), 2),
        ]
        .into_iter()
        .collect();
        assert_eq!(reorder_existing(&images, &order), vec![(1, 1), (2, 0)]);
    }

    #[test]
    fn uploads_take_listed_or_next_free_position() {
        let order: ImagesOrder = [("front.jpg".to_string(), 3)].into_iter().collect();
        let names = vec!["side.png".to_string(), "front.jpg".to_string(), "back.jpg".to_string()];
        assert_eq!(positions_for_uploads(&names, &order, &[0, 1]), vec![4, 3, 5]);
        let single = positions_for_uploads(&["x.jpg".to_string()], &ImagesOrder::new(), &[]);
        assert_eq!(single, vec![0]);
    }

    #[test]
    fn uploads_sharing_a_name_get_distinct_positions() {
        let order: ImagesOrder = [("front.jpg".to_string(), 0)].into_iter().collect();
        let names = vec!["front.jpg".to_string(), "front.jpg".to_string()];
        assert_eq!(positions_for_uploads(&names, &order, &[]), vec![0, 1]);

        let names = vec!["front.jpg".to_string(), "front.jpg".to_string(), "side.jpg".to_string()];
        assert_eq!(positions_for_uploads(&names, &order, &[0, 1]), vec![2, 3, 4]);
    }

    #[test]
    fn listed_upload_clashing_with_existing_image_moves_up() {
        let order: ImagesOrder = [("new.jpg".to_string(), 1)].into_iter().collect();
        assert_eq!(positions_for_uploads(&["new.jpg".to_string()], &order, &[0, 1, 3]), vec![2]);
    }

    #[test]
    fn compaction_shifts_later_images_down() {
        let images = vec![img(1, "a", 0), img(2, "b", 1), img(3, "c", 2), img(4, "d", 3)];
        assert_eq!(compact_after_removal(&images, &images[1]), vec![(3, 1), (4, 2)]);
        assert!(compact_after_removal(&images, &images[3]).is_empty());
    }

    #[test]
    fn sorts_gallery() {
        let mut images = vec![img(1, "a", 2), img(2, "b", 0), img(3, "c", 1)];
        sort_by_position(&mut images);
        let ids: Vec<i32> = images.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
