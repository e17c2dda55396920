// storefront/src/services/seed.rs

use emporium::models::NewProduct;
use emporium::Catalog;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::errors::Result;

const DEMO_CATALOG: &[(&str, &str, i64, i32)] = &[
  ("Ceramic Mug", "12oz stoneware mug, dishwasher safe.", 1250, 40),
  ("Cotton Tote Bag", "Heavy canvas tote with inner pocket.", 1800, 25),
  ("Desk Lamp", "Adjustable LED lamp with dimmer.", 3999, 10),
  ("Notebook A5", "Dotted pages, lay-flat binding.", 899, 60),
  ("Pour-over Kettle", "Gooseneck kettle, 1 litre.", 4500, 5),
];

/// Fills an empty catalog with a few demo products. Returns how many were inserted.
#[instrument(name = "seed::demo_catalog", skip(catalog), err(Display))]
pub async fn seed_demo_catalog(catalog: &Catalog) -> Result<usize> {
  if !catalog.list_products().await?.is_empty() {
    info!("Catalog already has products; skipping seed.");
    return Ok(0);
  }
  for (name, description, cents, stock) in DEMO_CATALOG {
    catalog
      .create_product(NewProduct {
        name: name.to_string(),
        description: description.to_string(),
        price: Decimal::new(*cents, 2),
        stock: *stock,
      })
      .await?;
  }
  info!(count = DEMO_CATALOG.len(), "Demo catalog seeded.");
  Ok(DEMO_CATALOG.len())
}
