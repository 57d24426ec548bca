//! Catalog browsing commands.

#![allow(clippy::print_stdout)]

use woala_core::ProductId;
use woala_storefront::catalog::StarRating;
use woala_storefront::{AppError, Product, Shop};

/// Print every product, one per line.
pub fn list(shop: &Shop) {
    let products = shop.list_products();
    if products.is_empty() {
        println!("The catalog is empty.");
        return;
    }
    for product in &products {
        println!("{}", summary_line(product));
    }
}

/// Print one product's detail page.
pub fn show(shop: &Shop, id: ProductId) -> Result<(), AppError> {
    let Some(product) = shop.open_product(&format!("?id={id}")) else {
        return Err(AppError::NotFound(format!("product {id}")));
    };

    println!("{}", product.name);
    println!(
        "{}  {} ({} reviews)",
        stars(product.star_rating()),
        product.rating,
        product.reviews
    );
    println!("{}", price_line(&product));
    println!("{}", if product.in_stock { "In stock" } else { "Out of stock" });
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
    for feature in &product.features {
        println!("  • {feature}");
    }
    Ok(())
}

fn summary_line(product: &Product) -> String {
    let stock = if product.in_stock { "" } else { "  [out of stock]" };
    format!(
        "{:>4}  {:<40} {}{stock}",
        product.id,
        product.name,
        price_line(product)
    )
}

fn price_line(product: &Product) -> String {
    let discount = product.discount_percent();
    if discount > 0 {
        format!(
            "{} (was {}, -{discount}%)",
            product.price.display(),
            product.original_price.display()
        )
    } else {
        product.price.display()
    }
}

fn stars(rating: StarRating) -> String {
    let mut out = "★".repeat(usize::from(rating.full));
    out.push_str(&"½".repeat(usize::from(rating.half)));
    out.push_str(&"☆".repeat(usize::from(rating.empty)));
    out
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use woala_core::Price;

    use super::*;

    #[test]
    fn test_stars() {
        assert_eq!(stars(StarRating::from_rating(Decimal::new(35, 1))), "★★★½☆");
        assert_eq!(stars(StarRating::from_rating(Decimal::from(5))), "★★★★★");
    }

    #[test]
    fn test_price_line_shows_discount() {
        let product = Product {
            id: ProductId::new(1),
            name: "Lamp".to_owned(),
            price: Price::from_cents(7_500),
            original_price: Price::from_cents(10_000),
            image: String::new(),
            rating: Decimal::from(4),
            reviews: 0,
            in_stock: true,
            images: Vec::new(),
            description: String::new(),
            features: Vec::new(),
        };
        assert_eq!(price_line(&product), "75.00 TL (was 100.00 TL, -25%)");
    }
}
