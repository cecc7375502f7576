//! Request validation: raw JSON bodies and multipart forms into checked inputs.
//!
//! `RequestValidator` records every failing field instead of stopping at the
//! first one; accessors return a placeholder for invalid fields, and
//! [`RequestValidator::finish`] turns any recorded failure into
//! [`AppError::InvalidFields`].

use crate::catalog::{parse_images_order, ImagesOrder};
use crate::error::{AppError, FieldError};
use crate::extractors::FormData;
use crate::models::{ITEM_STATUSES, ORDER_STATUSES};
use regex::Regex;
use serde::Deserialize;

pub const PASSWORD_MIN_LENGTH: usize = 6;
/// NUMERIC(4,1) upper bound.
pub const MAX_DIMENSION: f64 = 999.9;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

#[derive(Default)]
pub struct RequestValidator {
    errors: Vec<FieldError>,
}

impl RequestValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Trimmed, non-empty text.
    pub fn required_text(&mut self, field: &str, label: &str, value: Option<&str>) -> String {
        match value.map(str::trim) {
            None => {
                self.reject(field, format!("{} is required.", label));
                String::new()
            }
            Some("") => {
                self.reject(field, format!("{} cannot be empty.", label));
                String::new()
            }
            Some(s) => s.to_string(),
        }
    }

    pub fn one_of(
        &mut self,
        field: &str,
        label: &str,
        value: Option<&str>,
        allowed: &[&str],
    ) -> String {
        match value.map(str::trim) {
            None => {
                self.reject(field, format!("{} is required.", label));
                String::new()
            }
            Some(s) if allowed.contains(&s) => s.to_string(),
            Some(_) => {
                self.reject(field, format!("{} is invalid.", label));
                String::new()
            }
        }
    }

    /// Required integer, at least `min`.
    pub fn integer(&mut self, field: &str, label: &str, value: Option<&str>, min: i32) -> i32 {
        match value.map(str::trim).filter(|s| !s.is_empty()) {
            None => {
                self.reject(field, format!("{} is required.", label));
                0
            }
            Some(s) => self.check_integer(field, label, s, min).unwrap_or(0),
        }
    }

    /// Optional integer; empty string counts as absent.
    pub fn optional_integer(
        &mut self,
        field: &str,
        label: &str,
        value: Option<&str>,
        min: i32,
    ) -> Option<i32> {
        let s = value.map(str::trim).filter(|s| !s.is_empty())?;
        self.check_integer(field, label, s, min)
    }

    fn check_integer(&mut self, field: &str, label: &str, s: &str, min: i32) -> Option<i32> {
        match s.parse::<i32>() {
            Ok(n) if n >= min => Some(n),
            Ok(_) => {
                self.reject(field, format!("{} must be at least {}.", label, min));
                None
            }
            Err(_) => {
                self.reject(field, format!("{} must be a number.", label));
                None
            }
        }
    }

    /// Required positive decimal no larger than [`MAX_DIMENSION`].
    pub fn dimension(&mut self, field: &str, label: &str, value: Option<&str>) -> f64 {
        match value.map(str::trim).filter(|s| !s.is_empty()) {
            None => {
                self.reject(field, format!("{} is required.", label));
                0.0
            }
            Some(s) => match s.parse::<f64>() {
                Ok(n) if n.is_finite() && n > 0.0 && n <= MAX_DIMENSION => n,
                Ok(_) => {
                    let message = format!("{} must be between 0 and {}.", label, MAX_DIMENSION);
                    self.reject(field, message);
                    0.0
                }
                Err(_) => {
                    self.reject(field, format!("{} must be a number.", label));
                    0.0
                }
            },
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) -> String {
        let email = self.required_text(field, "Email", value);
        if email.is_empty() {
            return email;
        }
        match Regex::new(EMAIL_PATTERN) {
            Ok(re) if re.is_match(&email) => {}
            _ => self.reject(field, "Email invalid format."),
        }
        email
    }

    pub fn password(&mut self, field: &str, value: Option<&str>) -> String {
        let password = self.required_text(field, "Password", value);
        if !password.is_empty() && password.chars().count() < PASSWORD_MIN_LENGTH {
            self.reject(
                field,
                format!("Password must be at least {} characters.", PASSWORD_MIN_LENGTH),
            );
        }
        password
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(self.errors))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryBody {
    pub name: Option<String>,
    pub status: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryInput {
    pub name: String,
    pub status: String,
}

impl CategoryBody {
    pub fn validate(self) -> Result<CategoryInput, AppError> {
        let mut v = RequestValidator::new();
        let name = v.required_text("name", "Name", self.name.as_deref());
        let status = v.one_of("status", "Status", self.status.as_deref(), ITEM_STATUSES);
        v.finish()?;
        Ok(CategoryInput { name, status })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl CredentialsBody {
    pub fn validate(self) -> Result<Credentials, AppError> {
        let mut v = RequestValidator::new();
        let email = v.email("email", self.email.as_deref());
        let password = v.password("password", self.password.as_deref());
        v.finish()?;
        Ok(Credentials { email, password })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub stock: i32,
    pub price: i32,
    pub old_price: Option<i32>,
    pub status: String,
    pub categories: Vec<i32>,
    pub images_order: ImagesOrder,
}

impl ProductInput {
    /// Categories are mandatory when creating; on update an absent list clears them.
    pub fn from_form(form: &FormData, require_categories: bool) -> Result<Self, AppError> {
        let mut v = RequestValidator::new();
        let name = v.required_text("name", "Name", form.text("name"));
        let width = v.dimension("width", "Width", form.text("width"));
        let height = v.dimension("height", "Height", form.text("height"));
        let depth = v.dimension("depth", "Depth", form.text("depth"));
        let stock = v.integer("stock", "Stock", form.text("stock"), 0);
        let price = v.integer("price", "Price", form.text("price"), 0);
        let old_price = v.optional_integer("oldPrice", "Old price", form.text("oldPrice"), 0);
        let status = v.one_of("status", "Status", form.text("status"), ITEM_STATUSES);

        let mut categories = Vec::new();
        for raw in form.all("categories") {
            for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                match part.parse::<i32>() {
                    Ok(id) => categories.push(id),
                    Err(_) => v.reject("categories", "Categories must be numeric ids."),
                }
            }
        }
        if require_categories && !form.has("categories") {
            v.reject("categories", "Categories are required.");
        }

        let images_order = match parse_images_order(form.text("imagesOrder")) {
            Ok(order) => order,
            Err(_) => {
                v.reject("imagesOrder", "imagesOrder must be a JSON object.");
                ImagesOrder::new()
            }
        };

        v.finish()?;
        categories.sort_unstable();
        categories.dedup();
        Ok(ProductInput {
            name,
            width,
            height,
            depth,
            stock,
            price,
            old_price,
            status,
            categories,
            images_order,
        })
    }
}

/// One `products` entry of a package form. `name` is sent by the admin panel and ignored.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageProductInput {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PackageInput {
    pub name: String,
    pub stock: i32,
    pub price: i32,
    pub old_price: Option<i32>,
    pub status: String,
    pub category_id: i32,
    pub products: Vec<PackageProductInput>,
    pub images_order: ImagesOrder,
}

impl PackageInput {
    pub fn from_form(form: &FormData) -> Result<Self, AppError> {
        let mut v = RequestValidator::new();
        let name = v.required_text("name", "Name", form.text("name"));
        let status = v.one_of("status", "Status", form.text("status"), ITEM_STATUSES);
        let category_id = v.integer("category", "Category", form.text("category"), 1);
        let price = v.integer("price", "Price", form.text("price"), 0);
        let old_price = v.optional_integer("oldPrice", "Old price", form.text("oldPrice"), 0);
        let stock = v.integer("stock", "Stock", form.text("stock"), 0);

        let products = match form.text("products").map(str::trim) {
            None | Some("") => {
                v.reject("products", "Products are required.");
                Vec::new()
            }
            Some(raw) => match serde_json::from_str::<Vec<PackageProductInput>>(raw) {
                Ok(items) => {
                    if items.iter().any(|i| i.quantity < 1) {
                        v.reject("products", "Quantity must be at least 1.");
                    }
                    items
                }
                Err(_) => {
                    v.reject("products", "Products must be a JSON list of {productId, quantity}.");
                    Vec::new()
                }
            },
        };

        let images_order = match parse_images_order(form.text("imagesOrder")) {
            Ok(order) => order,
            Err(_) => {
                v.reject("imagesOrder", "imagesOrder must be a JSON object.");
                ImagesOrder::new()
            }
        };

        v.finish()?;
        Ok(PackageInput {
            name,
            stock,
            price,
            old_price,
            status,
            category_id,
            products: dedup_items(products),
            images_order,
        })
    }
}

/// Later entries for the same product replace earlier ones.
fn dedup_items(items: Vec<PackageProductInput>) -> Vec<PackageProductInput> {
    let mut out: Vec<PackageProductInput> = Vec::with_capacity(items.len());
    for item in items {
        match out.iter_mut().find(|o| o.product_id == item.product_id) {
            Some(existing) => existing.quantity = item.quantity,
            None => out.push(item),
        }
    }
    out
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrderLineBody {
    pub id: Option<i32>,
    pub quantity: Option<i32>,
    pub price: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderBody {
    pub date: Option<String>,
    pub status: Option<String>,
    pub products: Option<Vec<OrderLineBody>>,
    pub packages: Option<Vec<OrderLineBody>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderLineInput {
    pub id: i32,
    pub quantity: i32,
    pub price: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderInput {
    pub date: String,
    pub status: String,
    pub products: Vec<OrderLineInput>,
    pub packages: Vec<OrderLineInput>,
}

impl OrderBody {
    pub fn validate(self) -> Result<OrderInput, AppError> {
        let mut v = RequestValidator::new();
        let date = v.required_text("date", "Date", self.date.as_deref());
        let status = v.one_of("status", "Status", self.status.as_deref(), ORDER_STATUSES);
        let products = order_lines(&mut v, "products", self.products.unwrap_or_default());
        let packages = order_lines(&mut v, "packages", self.packages.unwrap_or_default());
        if products.is_empty() && packages.is_empty() {
            v.reject("products", "Order must contain at least one item");
        }
        v.finish()?;
        Ok(OrderInput {
            date,
            status,
            products,
            packages,
        })
    }
}

fn order_lines(
    v: &mut RequestValidator,
    field: &str,
    lines: Vec<OrderLineBody>,
) -> Vec<OrderLineInput> {
    let mut out = Vec::with_capacity(lines.len());
    for (i, line) in lines.into_iter().enumerate() {
        match (line.id, line.quantity, line.price) {
            (Some(id), Some(quantity), Some(price)) if quantity >= 1 && price >= 0 => {
                out.push(OrderLineInput { id, quantity, price })
            }
            (Some(_), Some(_), Some(_)) => v.reject(
                &format!("{}[{}]", field, i),
                "Quantity must be at least 1 and price not negative.",
            ),
            _ => v.reject(&format!("{}[{}]", field, i), "id, quantity and price are required."),
        }
    }
    out
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderStatusBody {
    pub status: Option<String>,
}

impl OrderStatusBody {
    pub fn validate(self) -> Result<String, AppError> {
        let mut v = RequestValidator::new();
        let status = v.one_of("status", "Status", self.status.as_deref(), ORDER_STATUSES);
        v.finish()?;
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)]) -> FormData {
        FormData::from_parts(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            Vec::new(),
        )
    }

    fn fields(err: AppError) -> Vec<String> {
        match err {
            AppError::InvalidFields(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn category_requires_name_and_known_status() {
        let ok = CategoryBody {
            name: Some("  Dragons ".into()),
            status: Some("active".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.name, "Dragons");

        let err = CategoryBody {
            name: Some("   ".into()),
            status: Some("archived".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(fields(err), vec!["name", "status"]);
    }

    #[test]
    fn credentials_check_email_and_length() {
        let err = CredentialsBody {
            email: Some("nope".into()),
            password: Some("123".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(fields(err), vec!["email", "password"]);

        let ok = CredentialsBody {
            email: Some("admin@creations.com".into()),
            password: Some("panseluta".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.email, "admin@creations.com");
    }

    #[test]
    fn product_form_parses_numbers_and_categories() {
        let input = ProductInput::from_form(
            &form(&[
                ("name", "Knight"),
                ("width", "10.5"),
                ("height", "20"),
                ("depth", "5"),
                ("stock", "3"),
                ("price", "120"),
                ("oldPrice", ""),
                ("status", "active"),
                ("categories[]", "2"),
                ("categories[]", "1"),
                ("categories[]", "2"),
                ("imagesOrder", r#"{"a.jpg": 0}"#),
            ]),
            true,
        )
        .unwrap();
        assert_eq!(input.width, 10.5);
        assert_eq!(input.old_price, None);
        assert_eq!(input.categories, vec![1, 2]);
        assert_eq!(input.images_order.get("a.jpg"), Some(&0));
    }

    #[test]
    fn product_form_reports_every_bad_field() {
        let err = ProductInput::from_form(
            &form(&[("name", "Knight"), ("width", "wide"), ("stock", "-1"), ("status", "active")]),
            true,
        )
        .unwrap_err();
        assert_eq!(
            fields(err),
            vec!["width", "height", "depth", "stock", "price", "categories"]
        );

        let update = ProductInput::from_form(
            &form(&[
                ("name", "Knight"),
                ("width", "1"),
                ("height", "1"),
                ("depth", "1"),
                ("stock", "0"),
                ("price", "1"),
                ("status", "inactive"),
            ]),
            false,
        )
        .unwrap();
        assert!(update.categories.is_empty());
    }

    #[test]
    fn package_form_requires_products_json() {
        let base = [
            ("name", "Army"),
            ("status", "active"),
            ("category", "3"),
            ("price", "300"),
            ("stock", "2"),
        ];
        let mut with_products = base.to_vec();
        let products = r#"[{"productId": 1, "name": "Elf", "quantity": 2},
            {"productId": 1, "quantity": 4}]"#;
        with_products.push(("products", products));
        let input = PackageInput::from_form(&form(&with_products)).unwrap();
        assert_eq!(input.category_id, 3);
        assert_eq!(input.products, vec![PackageProductInput { product_id: 1, quantity: 4 }]);

        let mut broken = base.to_vec();
        broken.push(("products", "not json"));
        assert_eq!(fields(PackageInput::from_form(&form(&broken)).unwrap_err()), vec!["products"]);
    }

    #[test]
    fn order_needs_at_least_one_line() {
        let err = OrderBody {
            date: Some("2024-05-01".into()),
            status: Some("pending".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(fields(err), vec!["products"]);

        let ok = OrderBody {
            date: Some("2024-05-01".into()),
            status: Some("working".into()),
            products: None,
            packages: Some(vec![OrderLineBody {
                id: Some(4),
                quantity: Some(1),
                price: Some(250),
            }]),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.packages.len(), 1);

        let err = OrderBody {
            date: Some("2024-05-01".into()),
            status: Some("lost".into()),
            products: Some(vec![OrderLineBody {
                id: Some(1),
                quantity: None,
                price: Some(1),
            }]),
            packages: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(fields(err), vec!["status", "products[0]", "products"]);
    }
}
