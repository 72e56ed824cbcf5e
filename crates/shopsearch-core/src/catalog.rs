//! In-memory catalog store.
//!
//! The catalog is loaded once at startup and never mutated. Item order is
//! significant: the document at position `i` of [`Catalog::documents`] is the
//! text of the item at position `i`, and both indexes rely on that alignment.
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::CatalogItem;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Arc<CatalogItem>>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    pub fn from_items(items: Vec<CatalogItem>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if item.id.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("catalog item '{}' has an empty id", item.title)));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(Error::InvalidConfig(format!("duplicate catalog id '{}'", item.id)));
            }
        }
        let by_id = items.iter().enumerate().map(|(pos, item)| (item.id.clone(), pos)).collect();
        Ok(Self { items: items.into_iter().map(Arc::new).collect(), by_id })
    }

    /// Load a JSON array of items.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("catalog file {}", path.display())))
            }
            Err(e) => return Err(Error::Operation(format!("reading {}: {}", path.display(), e))),
        };
        let items: Vec<CatalogItem> = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidConfig(format!("catalog file {}: {}", path.display(), e)))?;
        let catalog = Self::from_items(items)?;
        tracing::info!(items = catalog.len(), path = %path.display(), "loaded catalog");
        Ok(catalog)
    }

    /// The built-in demo catalog.
    pub fn seed() -> Self {
        let items = seed_items();
        let by_id = items.iter().enumerate().map(|(pos, item)| (item.id.clone(), pos)).collect();
        Self { items: items.into_iter().map(Arc::new).collect(), by_id }
    }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn get(&self, position: usize) -> Option<Arc<CatalogItem>> { self.items.get(position).cloned() }

    pub fn find(&self, id: &str) -> Option<Arc<CatalogItem>> {
        self.by_id.get(id).and_then(|&pos| self.get(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CatalogItem>> { self.items.iter() }

    /// One text document per item, in catalog order.
    pub fn documents(&self) -> Vec<String> {
        self.items.iter().map(|item| item.document()).collect()
    }
}

fn seed_items() -> Vec<CatalogItem> {
    let item = |id: &str, title: &str, description: &str, price: f64, image: &str| CatalogItem {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        price,
        image_url: format!("https://example.com/images/{image}.jpg"),
    };
    vec![
        item(
            "p1",
            "Wireless Bluetooth Earbuds",
            "Compact true wireless earbuds with noise reduction and 24h case battery.",
            49.99,
            "earbuds",
        ),
        item(
            "p2",
            "Gaming Mechanical Keyboard",
            "RGB mechanical keyboard with hot-swappable switches and compact layout.",
            89.0,
            "keyboard",
        ),
        item(
            "p3",
            "Stainless Steel Water Bottle",
            "Insulated bottle keeps drinks cold 24h and hot 12h. BPA-free.",
            19.5,
            "bottle",
        ),
        item(
            "p4",
            "Dancing Image Mug",
            "Heat-sensitive mug reveals dancing figures when hot liquid is poured.",
            14.99,
            "mug",
        ),
        item(
            "p5",
            "Portable Bluetooth Speaker",
            "Waterproof speaker with deep bass and 12-hour playtime.",
            39.99,
            "speaker",
        ),
    ]
}
