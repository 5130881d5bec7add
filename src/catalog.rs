//! # Catalog Module
//!
//! The fixed product list the bot sells. A [`Catalog`] is built once at startup,
//! either from the built-in coffee menu or from a JSON file, and then shared
//! read-only behind an `Arc`. There is no way to mutate it afterwards.
//!
//! ```rust
//! use coffee_bot::catalog::Catalog;
//!
//! let catalog = Catalog::coffee_menu();
//! assert_eq!(catalog.get("espresso").map(|item| item.unit_price), Some(150));
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Longest item id accepted; keeps every navigation token under Telegram's 64-byte limit
pub const MAX_ITEM_ID_LEN: usize = 32;

lazy_static! {
    static ref ITEM_ID_PATTERN: Regex =
        Regex::new(r"^[a-z0-9_-]{1,32}$").expect("valid item id pattern");
}

/// Errors raised while building a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid item id {0:?}: expected lowercase letters, digits, '-' or '_' (max {MAX_ITEM_ID_LEN})")]
    InvalidId(String),
    #[error("Duplicate item id: {0}")]
    DuplicateId(String),
    #[error("Item {0} must have a positive price")]
    InvalidPrice(String),
    #[error("Item {0} has an empty name")]
    EmptyName(String),
    #[error("Catalog has no items")]
    Empty,
}

/// A product the bot sells
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogItem {
    /// Stable key used in cart rows, order snapshots and navigation tokens
    pub id: String,
    pub name: String,
    pub description: String,
    /// Price per unit in the smallest priced currency unit
    pub unit_price: i64,
    /// Optional photo shown on the item screen
    #[serde(default)]
    pub image: Option<PathBuf>,
}

impl CatalogItem {
    pub fn new(id: &str, name: &str, description: &str, unit_price: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            unit_price,
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<PathBuf>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Ordered, id-indexed list of catalog items
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, validating ids, names and prices
    pub fn new(items: Vec<CatalogItem>) -> Result<Self, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if !is_valid_item_id(&item.id) {
                return Err(CatalogError::InvalidId(item.id.clone()));
            }
            if item.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(item.id.clone()));
            }
            if item.unit_price <= 0 {
                return Err(CatalogError::InvalidPrice(item.id.clone()));
            }
            if index.insert(item.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(item.id.clone()));
            }
        }

        Ok(Self { items, index })
    }

    /// The built-in coffee menu
    pub fn coffee_menu() -> Self {
        let items = vec![
            CatalogItem::new(
                "espresso",
                "Espresso",
                "Classic Italian coffee, strong and rich.",
                150,
            ),
            CatalogItem::new(
                "americano",
                "Americano with milk",
                "Strong black coffee with a splash of milk.",
                180,
            ),
            CatalogItem::new(
                "cappuccino",
                "Cappuccino",
                "Coffee with velvety milk foam, a true classic.",
                220,
            ),
            CatalogItem::new(
                "latte",
                "Latte",
                "Mild coffee with plenty of milk, perfect for a slow morning.",
                200,
            ),
            CatalogItem::new(
                "raf",
                "Raf",
                "Espresso whipped with cream and vanilla sugar into a smooth, silky drink.",
                350,
            ),
        ];

        Self {
            index: items
                .iter()
                .enumerate()
                .map(|(position, item)| (item.id.clone(), position))
                .collect(),
            items,
        }
    }

    /// Load and validate a catalog from a JSON array of items.
    /// Relative image paths are resolved against the file's directory.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut items: Vec<CatalogItem> = serde_json::from_str(&content)?;
        if let Some(base) = path.parent() {
            for image in items.iter_mut().filter_map(|item| item.image.as_mut()) {
                if image.is_relative() {
                    *image = base.join(&*image);
                }
            }
        }
        let catalog = Self::new(items)?;
        info!(path = %path.display(), items = catalog.len(), "Catalog loaded from file");
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let items: Vec<CatalogItem> = serde_json::from_str(content)?;
        Self::new(items)
    }

    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Items in their defined order
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Whether `id` can be used as a catalog key inside navigation tokens
pub fn is_valid_item_id(id: &str) -> bool {
    ITEM_ID_PATTERN.is_match(id)
}
