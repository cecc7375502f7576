//! Standard response bodies: paginated lists, plain messages, data envelopes.

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// One page of a listing: `{items, count, pages}`.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Total matching rows before slicing.
    pub count: u64,
    pub pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, count: u64, per_page: u32) -> Self {
        Paginated {
            items,
            count,
            pages: page_count(count, per_page),
        }
    }
}

/// Number of pages needed for `count` items at `per_page` each.
pub fn page_count(count: u64, per_page: u32) -> u64 {
    let per_page = u64::from(per_page.max(1));
    count.div_ceil(per_page)
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

pub fn created(message: &'static str) -> (StatusCode, Json<Message>) {
    (StatusCode::CREATED, Json(Message { message }))
}

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::CREATED, Json(SuccessOne { data }))
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(3, 0), 3);
    }
}
