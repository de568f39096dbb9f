use crate::storage::ItemDetails;
use std::collections::BTreeSet;

/// One fully normalized item, ready for the upsert gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub brand: String,
    pub brand_homepage: Option<String>,
    pub type_name: String,
    pub size_label: String,
    pub product_code: String,
    pub name: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub source_url: String,
    pub colors: BTreeSet<String>,
    pub finishes: BTreeSet<String>,
    pub details: ItemDetails,
}
