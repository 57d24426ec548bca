//! Cart commands.

#![allow(clippy::print_stdout)]

use woala_core::ProductId;
use woala_storefront::{AddOutcome, AppError, Cart, OrderSummary, Shop};

/// Add units of a product.
pub fn add(shop: &Shop, id: ProductId, quantity: u32) -> Result<(), AppError> {
    let outcome = shop.add_to_cart(id, quantity)?;
    report(shop, id, outcome)
}

/// Add units of a product and head to checkout.
pub fn buy(shop: &Shop, id: ProductId, quantity: u32) -> Result<(), AppError> {
    let outcome = shop.buy_now(id, quantity)?;
    report(shop, id, outcome)
}

/// Set a line's quantity.
pub fn set(shop: &Shop, id: ProductId, quantity: u32) -> Result<(), AppError> {
    match shop.cart().set_quantity(id, quantity)? {
        Some(stored) => println!("Quantity set to {stored}."),
        None => return Err(AppError::NotFound(format!("product {id} in cart"))),
    }
    print_badge(shop)
}

/// Remove a line.
pub fn remove(shop: &Shop, id: ProductId) -> Result<(), AppError> {
    if !shop.cart().remove_item(id)? {
        return Err(AppError::NotFound(format!("product {id} in cart")));
    }
    println!("Removed.");
    print_badge(shop)
}

/// Print the cart and its summary.
pub fn show(shop: &Shop) -> Result<(), AppError> {
    let cart = shop.cart().snapshot()?;
    if cart.is_empty() {
        println!("Your cart is empty.");
        return Ok(());
    }
    print_cart(&cart, &shop.order_summary()?);
    Ok(())
}

/// Print cart lines followed by the order summary.
pub fn print_cart(cart: &Cart, summary: &OrderSummary) {
    for item in cart {
        println!(
            "{:>4}  {:<32} {:>2} x {:>12} = {:>12}",
            item.product_id,
            item.name,
            item.quantity,
            item.unit_price.display(),
            item.line_total().display()
        );
    }
    println!();
    println!("{:<12}{:>14}", "Subtotal", summary.subtotal.display());
    println!("{:<12}{:>14}", "Shipping", summary.shipping.display());
    println!("{:<12}{:>14}", "Tax", summary.tax.display());
    println!("{:<12}{:>14}", "Total", summary.total.display());
}

fn report(shop: &Shop, id: ProductId, outcome: AddOutcome) -> Result<(), AppError> {
    if let AddOutcome::Unavailable { .. } = outcome {
        return match shop.list_products().iter().find(|p| p.id == id) {
            Some(product) => {
                println!("{} is out of stock.", product.name);
                Ok(())
            }
            None => Err(AppError::NotFound(format!("product {id}"))),
        };
    }
    println!("Cart: {} item(s)", outcome.item_count());
    Ok(())
}

fn print_badge(shop: &Shop) -> Result<(), AppError> {
    println!("Cart: {} item(s)", shop.item_count()?);
    Ok(())
}
