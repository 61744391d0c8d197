//! Read-only product catalogue
//!
//! The catalogue is generated offline from the asset directory and shipped
//! as JSON. Lookups are pure and total: absence is `None`, never an error.
//! The worker uses it to derive the page route manifest so the routes it
//! caches track the real category slugs.

mod types;

pub use types::{Category, Design, PriceRange, Subcategory};

use crate::error::{KioskError, KioskResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The full catalogue: categories and the designs that belong to them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalogue {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub designs: Vec<Design>,
}

impl Catalogue {
    /// Parse catalogue JSON
    pub fn parse(content: &str) -> KioskResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load catalogue JSON from disk
    pub async fn load(path: &Path) -> KioskResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| KioskError::CatalogueRead {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        serde_json::from_str(&content).map_err(|e| KioskError::CatalogueRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn list_categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn find_category_by_slug(&self, slug: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.slug == slug)
    }

    /// Subcategory of `category` with the given slug
    pub fn find_subcategory_by_slug<'a>(
        &self,
        category: &'a Category,
        slug: &str,
    ) -> Option<&'a Subcategory> {
        category.subcategories.iter().find(|s| s.slug == slug)
    }

    /// Designs in a category, optionally narrowed to one subcategory
    pub fn list_designs(&self, category_id: &str, subcategory_id: Option<&str>) -> Vec<&Design> {
        self.designs
            .iter()
            .filter(|d| d.category_id == category_id)
            .filter(|d| match subcategory_id {
                Some(sub) => d.subcategory_id.as_deref() == Some(sub),
                None => true,
            })
            .collect()
    }

    pub fn find_design_by_id(&self, id: &str) -> Option<&Design> {
        self.designs.iter().find(|d| d.id == id)
    }

    /// Image of the first design in a category (or subcategory)
    pub fn first_image_of_category(
        &self,
        category_id: &str,
        subcategory_id: Option<&str>,
    ) -> Option<&str> {
        self.list_designs(category_id, subcategory_id)
            .first()
            .map(|d| d.image.as_str())
    }

    /// Navigable routes: home, every category root and every
    /// category/subcategory pair, in catalogue order
    pub fn page_routes(&self) -> Vec<String> {
        let mut routes = vec!["/".to_string()];
        for category in &self.categories {
            routes.push(format!("/{}", category.slug));
            for sub in &category.subcategories {
                routes.push(format!("/{}/{}", category.slug, sub.slug));
            }
        }
        routes
    }

    /// First image of every category, used as warm-up assets
    pub fn cover_images(&self) -> Vec<String> {
        self.categories
            .iter()
            .filter_map(|c| self.first_image_of_category(&c.id, None))
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "categories": [
            {
                "id": "tricouri",
                "name": "Tricouri",
                "slug": "tricouri",
                "subcategories": [
                    { "id": "tricouri-aniversari", "name": "Aniversari", "slug": "aniversari" }
                ]
            },
            { "id": "mugs", "name": "Căni Personalizate", "slug": "mugs", "subcategories": [] },
            { "id": "ceasuri", "name": "Ceasuri", "slug": "ceasuri" }
        ],
        "designs": [
            {
                "id": "tricouri-tricouri-aniversari-t1-jpg",
                "categoryId": "tricouri",
                "subcategoryId": "tricouri-aniversari",
                "name": "T1",
                "image": "/assets/tricouri/tricouri-aniversari/t1.jpg",
                "price": 75,
                "tags": []
            },
            {
                "id": "tricouri-t2-jpg",
                "categoryId": "tricouri",
                "subcategoryId": null,
                "name": "T2",
                "image": "/assets/tricouri/t2.jpg"
            },
            {
                "id": "mugs-mug-1-jpg",
                "categoryId": "mugs",
                "name": "Mug 1",
                "image": "/assets/mugs/mug 1.jpg",
                "pricing": { "standard": 45 },
                "featured": true
            }
        ]
    }"#;

    fn sample() -> Catalogue {
        Catalogue::parse(SAMPLE).unwrap()
    }

    #[test]
    fn category_lookup() {
        let catalogue = sample();
        assert_eq!(catalogue.list_categories().len(), 3);
        assert_eq!(catalogue.find_category_by_slug("mugs").unwrap().name, "Căni Personalizate");
        assert!(catalogue.find_category_by_slug("pahare").is_none());
    }

    #[test]
    fn designs_by_category_and_subcategory() {
        let catalogue = sample();
        assert_eq!(catalogue.list_designs("tricouri", None).len(), 2);
        let sub = catalogue.list_designs("tricouri", Some("tricouri-aniversari"));
        assert_eq!(sub.len(), 1);
        assert_eq!(sub[0].name, "T1");
        assert!(catalogue.list_designs("ceasuri", None).is_empty());
    }

    #[test]
    fn design_lookup() {
        let catalogue = sample();
        let mug = catalogue.find_design_by_id("mugs-mug-1-jpg").unwrap();
        assert!(mug.featured);
        assert_eq!(mug.pricing.get("standard"), Some(&45.0));
        assert!(catalogue.find_design_by_id("missing").is_none());
    }

    #[test]
    fn first_image() {
        let catalogue = sample();
        assert_eq!(
            catalogue.first_image_of_category("mugs", None),
            Some("/assets/mugs/mug 1.jpg")
        );
        assert_eq!(catalogue.first_image_of_category("ceasuri", None), None);
    }

    #[test]
    fn subcategory_lookup() {
        let catalogue = sample();
        let tricouri = catalogue.find_category_by_slug("tricouri").unwrap();
        let sub = catalogue.find_subcategory_by_slug(tricouri, "aniversari").unwrap();
        assert_eq!(sub.id, "tricouri-aniversari");
        assert!(catalogue.find_subcategory_by_slug(tricouri, "nunti").is_none());
    }

    #[test]
    fn routes_follow_slugs() {
        let routes = sample().page_routes();
        assert_eq!(
            routes,
            vec!["/", "/tricouri", "/tricouri/aniversari", "/mugs", "/ceasuri"]
        );
    }

    #[test]
    fn cover_images_skip_empty_categories() {
        assert_eq!(
            sample().cover_images(),
            vec!["/assets/tricouri/tricouri-aniversari/t1.jpg", "/assets/mugs/mug 1.jpg"]
        );
    }

    #[tokio::test]
    async fn load_missing_file() {
        let err = Catalogue::load(Path::new("/nonexistent/catalogue.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, KioskError::CatalogueRead { .. }));
    }
}
