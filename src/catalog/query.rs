//! Listing query parameters shared by the admin lists and the storefront feed.
//!
//! Built from raw `(key, value)` pairs so repeated keys (`categories=1&categories=2`)
//! and bracket keys (`categories[]=1`, `categories[0]=1`) both work.

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Page {
    /// Non-numeric or non-positive values fall back to the defaults.
    pub fn parse(page: Option<&str>, per_page: Option<&str>) -> Self {
        Page {
            page: page.and_then(positive).unwrap_or(DEFAULT_PAGE),
            per_page: per_page.and_then(positive).unwrap_or(DEFAULT_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.per_page) * u64::from(self.page.saturating_sub(1))
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

fn positive(s: &str) -> Option<u32> {
    s.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    InStock,
    OutOfStock,
}

impl Availability {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yes" => Some(Availability::InStock),
            "no" => Some(Availability::OutOfStock),
            _ => None,
        }
    }
}

/// Restricts the feed to one item type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemType {
    Product,
    Package,
}

impl ItemType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "product" => Some(ItemType::Product),
            "package" => Some(ItemType::Package),
            _ => None,
        }
    }
}

/// Storefront ordering (`orderBy`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeedOrder {
    #[default]
    Recent,
    Name,
    PriceAsc,
    PriceDesc,
}

impl FeedOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recent" => Some(FeedOrder::Recent),
            "name" => Some(FeedOrder::Name),
            "priceAsc" => Some(FeedOrder::PriceAsc),
            "priceDesc" => Some(FeedOrder::PriceDesc),
            _ => None,
        }
    }

    /// SQL ORDER BY fragment; column names are fixed, never user input.
    pub fn sql(&self) -> &'static str {
        match self {
            FeedOrder::Recent => "id DESC",
            FeedOrder::Name => "name ASC",
            FeedOrder::PriceAsc => "price ASC",
            FeedOrder::PriceDesc => "price DESC",
        }
    }
}

/// Admin product list ordering (`sortBy` + `order`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    Stock,
    Price,
}

impl SortColumn {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(SortColumn::Id),
            "name" => Some(SortColumn::Name),
            "stock" => Some(SortColumn::Stock),
            "price" => Some(SortColumn::Price),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Name => "name",
            SortColumn::Stock => "stock",
            SortColumn::Price => "price",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListQuery {
    pub page: Page,
    pub search: Option<String>,
    /// Category ids; `None` means no category filter.
    pub categories: Option<Vec<i32>>,
    pub availability: Option<Availability>,
    pub item_type: Option<ItemType>,
    pub order_by: Option<FeedOrder>,
    pub sort: Option<(SortColumn, SortDirection)>,
}

impl ListQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let first = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        let categories: Vec<i32> = pairs
            .iter()
            .filter(|(k, _)| is_categories_key(k))
            .flat_map(|(_, v)| v.split(','))
            .filter_map(|v| v.trim().parse::<i32>().ok())
            .collect();

        let sort = match (
            first("sortBy").and_then(SortColumn::parse),
            first("order").and_then(SortDirection::parse),
        ) {
            (Some(col), Some(dir)) => Some((col, dir)),
            _ => None,
        };

        ListQuery {
            page: Page::parse(first("page"), first("perPage")),
            search: first("search")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            categories: if categories.is_empty() {
                None
            } else {
                Some(categories)
            },
            availability: first("availability").and_then(Availability::parse),
            item_type: first("type").and_then(ItemType::parse),
            order_by: first("orderBy").and_then(FeedOrder::parse),
            sort,
        }
    }

    pub fn includes(&self, item_type: ItemType) -> bool {
        self.item_type.map_or(true, |t| t == item_type)
    }
}

fn is_categories_key(key: &str) -> bool {
    key == "categories"
        || key
            .strip_prefix("categories[")
            .is_some_and(|rest| rest.ends_with(']'))
}
