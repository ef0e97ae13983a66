//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! categories:
//!   - name: Tea
//!     products:
//!       - name: Green tea
//!         description: Sencha from Shizuoka
//!         price: "12.50"
//!         stock: 40
//!       - name: Matcha
//!         slug: matcha-ceremonial
//!         price: "29.00"
//!         available: false
//! ```
//!
//! Slugs default to the slugified name. Prices must be quoted so they are
//! read exactly. Seeding is idempotent: categories are upserted by slug and
//! products that already exist in their category are skipped.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use pbeshop_core::{Price, Slug};
use pbeshop_storefront::db::{self, CatalogRepository, catalog::NewProduct};

use super::database_url;

/// Root of the catalog seed file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSeed {
    pub categories: Vec<CategorySeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySeed {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

fn resolve_slug(name: &str, explicit: Option<&str>) -> Result<Slug, String> {
    match explicit {
        Some(slug) => Slug::parse(slug).map_err(|e| format!("slug {slug:?}: {e}")),
        None => Slug::slugify(name).map_err(|e| format!("cannot derive slug from {name:?}: {e}")),
    }
}

/// Validated category with its products, ready to insert.
#[derive(Debug)]
pub struct SeedCategory {
    pub name: String,
    pub slug: Slug,
    pub products: Vec<SeedProduct>,
}

#[derive(Debug)]
pub struct SeedProduct {
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub price: Price,
    pub stock: u32,
    pub available: bool,
}

impl CatalogSeed {
    /// Validate every entry, collecting all problems.
    ///
    /// # Errors
    ///
    /// Returns one message per invalid name, slug or price.
    pub fn validate(self) -> Result<Vec<SeedCategory>, Vec<String>> {
        let mut errors = Vec::new();
        let mut categories = Vec::with_capacity(self.categories.len());

        for category in self.categories {
            let context = format!("category {:?}", category.name);
            if category.name.trim().is_empty() {
                errors.push(format!("{context}: name is empty"));
            }
            let slug = resolve_slug(&category.name, category.slug.as_deref())
                .map_err(|e| errors.push(format!("{context}: {e}")))
                .ok();

            let mut products = Vec::with_capacity(category.products.len());
            for product in category.products {
                let context = format!("{context}, product {:?}", product.name);
                if product.name.trim().is_empty() {
                    errors.push(format!("{context}: name is empty"));
                }
                let slug = resolve_slug(&product.name, product.slug.as_deref())
                    .map_err(|e| errors.push(format!("{context}: {e}")));
                let price = product
                    .price
                    .parse::<Price>()
                    .map_err(|e| errors.push(format!("{context}: price {:?}: {e}", product.price)));

                if let (Ok(slug), Ok(price)) = (slug, price) {
                    products.push(SeedProduct {
                        name: product.name.trim().to_owned(),
                        slug,
                        description: product.description,
                        price,
                        stock: product.stock,
                        available: product.available,
                    });
                }
            }

            if let Some(slug) = slug {
                categories.push(SeedCategory {
                    name: category.name.trim().to_owned(),
                    slug,
                    products,
                });
            }
        }

        if errors.is_empty() {
            Ok(categories)
        } else {
            Err(errors)
        }
    }
}

/// Seed categories and products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, validation fails,
/// the database URL is missing, or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let categories = match seed.validate() {
        Ok(categories) => categories,
        Err(errors) => {
            error!("Catalog validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };

    info!(categories = categories.len(), "Catalog validated successfully");

    let pool = db::create_pool(&database_url()?).await?;
    let repo = CatalogRepository::new(&pool);

    let mut inserted = 0_usize;
    let mut skipped = 0_usize;

    for category in categories {
        let stored = repo.upsert_category(&category.name, &category.slug).await?;

        for product in category.products {
            let new_product = NewProduct {
                category_id: stored.id,
                name: product.name,
                slug: product.slug,
                description: product.description,
                price: product.price,
                stock: product.stock,
                available: product.available,
            };

            if repo.insert_product_if_missing(&new_product).await?.is_some() {
                inserted += 1;
            } else {
                skipped += 1;
            }
        }
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    info!("  Products skipped (already exist): {skipped}");

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const YAML: &str = r#"
categories:
  - name: Tea
    products:
      - name: Green Tea
        description: Sencha
        price: "12.50"
        stock: 40
      - name: Matcha
        slug: matcha-ceremonial
        price: "29.00"
        available: false
  - name: Coffee Beans
"#;

    #[test]
    fn test_parse_and_validate() {
        let seed: CatalogSeed = serde_yaml::from_str(YAML).unwrap();
        let categories = seed.validate().unwrap();

        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].slug.as_str(), "tea");
        assert_eq!(categories[1].slug.as_str(), "coffee-beans");
        assert!(categories[1].products.is_empty());

        let products = &categories[0].products;
        assert_eq!(products[0].slug.as_str(), "green-tea");
        assert_eq!(products[0].price.to_string(), "12.50");
        assert!(products[0].available);
        assert_eq!(products[1].slug.as_str(), "matcha-ceremonial");
        assert_eq!(products[1].stock, 0);
        assert!(!products[1].available);
    }

    #[test]
    fn test_validation_collects_every_error() {
        let seed: CatalogSeed = serde_yaml::from_str(
            r#"
categories:
  - name: Tea
    slug: "Not A Slug"
    products:
      - name: Green tea
        price: "-1.00"
      - name: Oolong
        price: "abc"
"#,
        )
        .unwrap();

        let errors = seed.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("Not A Slug"));
        assert!(errors[1].contains("Green tea"));
        assert!(errors[2].contains("Oolong"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<CatalogSeed, _> =
            serde_yaml::from_str("categories:\n  - name: Tea\n    colour: green\n");
        assert!(result.is_err());
    }
}
