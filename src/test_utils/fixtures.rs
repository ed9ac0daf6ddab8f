use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use crate::search::embeddings::HashEmbedder;
use crate::storage::{CatalogDb, ProductRecord};

/// Temp directory holding a migrated catalog.
///
/// `root` doubles as `VIBE_ROOT` for binary tests; the catalog lives at
/// `<root>/catalog.db`, the default location.
pub struct CatalogFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub db: CatalogDb,
}

impl CatalogFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let db_path = root.join("catalog.db");
        let db = CatalogDb::open(&db_path, Duration::from_secs(5)).expect("Failed to open catalog");

        println!("[FIXTURE] Created catalog: {:?}", db_path);

        Self {
            temp_dir,
            root,
            db_path,
            db,
        }
    }

    pub fn insert(&self, product: &ProductRecord) -> i64 {
        self.db.upsert_product(product).expect("Failed to insert product")
    }

    /// Seed [`sample_products`] with hash embeddings at the given sizes.
    pub fn seed_sample_catalog(&self, text_dims: usize, image_dims: usize) -> usize {
        let products = sample_products(text_dims, image_dims);
        for product in &products {
            self.insert(product);
        }
        println!("[FIXTURE] Seeded {} products", products.len());
        products.len()
    }
}

impl Default for CatalogFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CatalogFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up catalog: {:?}", self.root);
    }
}

/// Minimal active product with no embeddings.
pub fn product(product_id: &str, title: &str) -> ProductRecord {
    ProductRecord {
        product_id: product_id.to_string(),
        title: title.to_string(),
        is_active: true,
        ..ProductRecord::default()
    }
}

/// A small fashion catalog embedded with the hash backend.
///
/// Text vectors come from title + category; image vectors from the image
/// URL, the same way the hash backend embeds a query URL.
pub fn sample_products(text_dims: usize, image_dims: usize) -> Vec<ProductRecord> {
    let text = HashEmbedder::new(text_dims);
    let image = HashEmbedder::new(image_dims);

    let rows: [(&str, &str, &str, &str, &str, &str, f64, &[&str]); 6] = [
        ("sku-001", "Black Canvas Sneakers", "shoes", "sneakers", "Converse", "unisex", 60.0, &["Black"]),
        ("sku-002", "White Leather Sneakers", "shoes", "sneakers", "Nike", "men", 95.0, &["White"]),
        ("sku-003", "Black Chelsea Boots", "shoes", "boots", "Dr. Martens", "women", 140.0, &["Black"]),
        ("sku-004", "Red Floral Midi Dress", "dresses", "midi", "Zara", "women", 49.5, &["Red", "Green"]),
        ("sku-005", "Denim Trucker Jacket", "outerwear", "jackets", "Levi's", "men", 89.0, &["Blue"]),
        ("sku-006", "Striped Cotton Tee", "tops", "t-shirts", "Uniqlo", "unisex", 19.9, &["White", "Navy"]),
    ];

    rows.iter()
        .map(|(id, title, category, sub_category, brand, gender, price, colors)| {
            let image_url = format!(
                "https://cdn.example.com/{}.jpg",
                title.to_lowercase().replace(' ', "-")
            );
            ProductRecord {
                product_id: (*id).to_string(),
                title: (*title).to_string(),
                category: Some((*category).to_string()),
                sub_category: Some((*sub_category).to_string()),
                brand_name: Some((*brand).to_string()),
                gender: Some((*gender).to_string()),
                lowest_price: Some(*price),
                featured_image: Some(image_url.clone()),
                pdp_url: Some(format!("https://shop.example.com/p/{id}")),
                extracted_colors: colors.iter().map(|c| (*c).to_string()).collect(),
                is_active: true,
                image_embedding: Some(image.embed(&image_url)),
                text_embedding: Some(text.embed(&format!("{title} {category}"))),
            }
        })
        .collect()
}
