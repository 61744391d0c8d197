//! Catalogue command - browse categories and designs

use crate::catalogue::{Catalogue, Design};
use crate::cli::args::{CatalogueAction, CatalogueArgs};
use crate::cli::HostContext;
use crate::error::{KioskError, KioskResult};
use console::style;

/// Execute the catalogue command
pub async fn execute(args: CatalogueArgs, host: &HostContext) -> KioskResult<()> {
    let catalogue = host.require_catalogue().await?;

    match args.action {
        CatalogueAction::Categories => show_categories(&catalogue),
        CatalogueAction::Designs {
            category,
            subcategory,
        } => show_designs(&catalogue, &category, subcategory.as_deref())?,
        CatalogueAction::Design { id } => show_design(&catalogue, &id)?,
        CatalogueAction::Routes => {
            for route in catalogue.page_routes() {
                println!("{}", route);
            }
        }
    }

    Ok(())
}

fn show_categories(catalogue: &Catalogue) {
    for category in catalogue.list_categories() {
        let count = catalogue.list_designs(&category.id, None).len();
        println!(
            "{} {} {}",
            style(&category.slug).bold(),
            category.name,
            style(format!("({} designs)", count)).dim()
        );
        for sub in &category.subcategories {
            let count = catalogue.list_designs(&category.id, Some(&sub.id)).len();
            println!(
                "  {}/{} {} {}",
                category.slug,
                sub.slug,
                sub.name,
                style(format!("({} designs)", count)).dim()
            );
        }
    }
}

/// Designs of a category (and subcategory), both given by slug
fn designs_for<'a>(
    catalogue: &'a Catalogue,
    category: &str,
    subcategory: Option<&str>,
) -> KioskResult<Vec<&'a Design>> {
    let found = catalogue
        .find_category_by_slug(category)
        .ok_or_else(|| KioskError::CategoryNotFound(category.to_string()))?;

    let sub_id = match subcategory {
        Some(slug) => {
            let sub = catalogue
                .find_subcategory_by_slug(found, slug)
                .ok_or_else(|| KioskError::CategoryNotFound(format!("{}/{}", category, slug)))?;
            Some(sub.id.as_str())
        }
        None => None,
    };

    Ok(catalogue.list_designs(&found.id, sub_id))
}

fn show_designs(
    catalogue: &Catalogue,
    category: &str,
    subcategory: Option<&str>,
) -> KioskResult<()> {
    let designs = designs_for(catalogue, category, subcategory)?;
    if designs.is_empty() {
        println!("No designs found.");
        return Ok(());
    }

    println!("{:<28} {:<36} {:>10}", "ID", "NAME", "PRICE");
    println!("{}", "-".repeat(76));
    for design in &designs {
        println!(
            "{:<28} {:<36} {:>10}",
            design.id,
            design.name,
            price_label(design)
        );
    }
    println!();
    println!("Total: {} design(s)", designs.len());
    Ok(())
}

fn show_design(catalogue: &Catalogue, id: &str) -> KioskResult<()> {
    let design = catalogue
        .find_design_by_id(id)
        .ok_or_else(|| KioskError::DesignNotFound(id.to_string()))?;

    println!("{}", style(&design.name).bold());
    println!("  id: {}", design.id);
    match &design.subcategory_id {
        Some(sub) => println!("  category: {} / {}", design.category_id, sub),
        None => println!("  category: {}", design.category_id),
    }
    println!("  image: {}", design.image);
    println!("  price: {}", price_label(design));
    if let Some(description) = &design.description {
        println!("  description: {}", description);
    }
    if !design.tags.is_empty() {
        println!("  tags: {}", design.tags.join(", "));
    }
    if !design.sizes.is_empty() {
        println!("  sizes: {}", design.sizes.join(", "));
    }
    if !design.materials.is_empty() {
        println!("  materials: {}", design.materials.join(", "));
    }
    if let Some(turnaround) = &design.turnaround_time {
        println!("  turnaround: {}", turnaround);
    }
    for (variant, price) in &design.pricing {
        println!("  {}: {:.2} lei", variant, price);
    }
    Ok(())
}

fn price_label(design: &Design) -> String {
    if let Some(range) = design.price_range {
        if range.min < range.max {
            return format!("{:.0}-{:.0} lei", range.min, range.max);
        }
        return format!("{:.0} lei", range.min);
    }
    if let Some(price) = design.price {
        return format!("{:.0} lei", price);
    }
    match design.pricing.values().copied().reduce(f64::min) {
        Some(min) => format!("from {:.0} lei", min),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "categories": [
            {
                "id": "mugs",
                "name": "Căni",
                "slug": "mugs",
                "subcategories": [{ "id": "mugs-nunta", "name": "Nuntă", "slug": "nunta" }]
            }
        ],
        "designs": [
            { "id": "mug-1", "categoryId": "mugs", "subcategoryId": "mugs-nunta", "name": "Inimi", "image": "/assets/mugs/nunta/inimi.jpg", "price": 45 },
            { "id": "mug-2", "categoryId": "mugs", "name": "Logo", "image": "/assets/mugs/logo.jpg", "pricing": { "alb": 40, "magic": 55 } }
        ]
    }"#;

    #[test]
    fn designs_by_slug() {
        let catalogue = Catalogue::parse(SAMPLE).unwrap();

        assert_eq!(designs_for(&catalogue, "mugs", None).unwrap().len(), 2);
        let nunta = designs_for(&catalogue, "mugs", Some("nunta")).unwrap();
        assert_eq!(nunta.len(), 1);
        assert_eq!(nunta[0].id, "mug-1");
    }

    #[test]
    fn unknown_slugs_are_errors() {
        let catalogue = Catalogue::parse(SAMPLE).unwrap();

        let err = designs_for(&catalogue, "ceasuri", None).unwrap_err();
        assert!(matches!(err, KioskError::CategoryNotFound(ref s) if s == "ceasuri"));

        let err = designs_for(&catalogue, "mugs", Some("botez")).unwrap_err();
        assert!(matches!(err, KioskError::CategoryNotFound(ref s) if s == "mugs/botez"));

        assert!(matches!(
            show_design(&catalogue, "mug-9"),
            Err(KioskError::DesignNotFound(_))
        ));
    }

    #[test]
    fn price_labels() {
        let catalogue = Catalogue::parse(SAMPLE).unwrap();
        let fixed = catalogue.find_design_by_id("mug-1").unwrap();
        let variants = catalogue.find_design_by_id("mug-2").unwrap();

        assert_eq!(price_label(fixed), "45 lei");
        assert_eq!(price_label(variants), "from 40 lei");
    }
}
