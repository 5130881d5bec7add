//! # Navigation Tokens
//!
//! Every inline button carries a colon-delimited token such as
//! `cart:add:latte:catalog`. Tokens are parsed once into a [`Route`] when a
//! callback query arrives and rendered back with `Display` when buttons are
//! built, so both directions share one grammar.
//!
//! ```text
//! menu | help | catalog | catalog:<item> | cart | cart:order
//! cart:add:<item>:<cart|catalog> | cart:remove:<item>:<cart|catalog>
//! orders | order:<id>
//! ```

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::catalog::is_valid_item_id;
use crate::model::OrderId;

/// Maximum callback data size accepted by Telegram
pub const MAX_TOKEN_LEN: usize = 64;

/// Screen to show after a cart mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnTo {
    Cart,
    Catalog,
}

impl ReturnTo {
    fn as_str(self) -> &'static str {
        match self {
            ReturnTo::Cart => "cart",
            ReturnTo::Catalog => "catalog",
        }
    }
}

/// A parsed navigation token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Menu,
    Catalog,
    CatalogItem(String),
    Cart,
    CartAdd { item_id: String, return_to: ReturnTo },
    CartRemove { item_id: String, return_to: ReturnTo },
    Checkout,
    Order(OrderId),
    OrderList,
    Help,
}

/// Token that does not match the grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized navigation token: {0:?}")]
pub struct RouteError(pub String);

impl Route {
    /// Parse callback data, treating anything unrecognized as the menu
    pub fn parse_or_menu(data: Option<&str>) -> Route {
        data.and_then(|token| token.parse().ok()).unwrap_or(Route::Menu)
    }
}

fn parse_item(id: &str) -> Option<String> {
    is_valid_item_id(id).then(|| id.to_string())
}

fn parse_return_to(target: &str) -> Option<ReturnTo> {
    match target {
        "cart" => Some(ReturnTo::Cart),
        "catalog" => Some(ReturnTo::Catalog),
        _ => None,
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = token.split(':').collect();

        let route = match parts.as_slice() {
            ["menu"] => Some(Route::Menu),
            ["help"] => Some(Route::Help),
            ["catalog"] => Some(Route::Catalog),
            ["catalog", item] => parse_item(item).map(Route::CatalogItem),
            ["cart"] => Some(Route::Cart),
            ["cart", "order"] => Some(Route::Checkout),
            ["cart", "add", item, target] => parse_item(item)
                .zip(parse_return_to(target))
                .map(|(item_id, return_to)| Route::CartAdd { item_id, return_to }),
            ["cart", "remove", item, target] => parse_item(item)
                .zip(parse_return_to(target))
                .map(|(item_id, return_to)| Route::CartRemove { item_id, return_to }),
            ["orders"] => Some(Route::OrderList),
            ["order", id] => id.parse::<i64>().ok().map(|id| Route::Order(OrderId(id))),
            _ => None,
        };

        route.ok_or_else(|| RouteError(token.to_string()))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Menu => write!(f, "menu"),
            Route::Catalog => write!(f, "catalog"),
            Route::CatalogItem(item_id) => write!(f, "catalog:{item_id}"),
            Route::Cart => write!(f, "cart"),
            Route::CartAdd { item_id, return_to } => {
                write!(f, "cart:add:{item_id}:{}", return_to.as_str())
            }
            Route::CartRemove { item_id, return_to } => {
                write!(f, "cart:remove:{item_id}:{}", return_to.as_str())
            }
            Route::Checkout => write!(f, "cart:order"),
            Route::Order(id) => write!(f, "order:{id}"),
            Route::OrderList => write!(f, "orders"),
            Route::Help => write!(f, "help"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tokens() {
        assert_eq!("menu".parse::<Route>(), Ok(Route::Menu));
        assert_eq!("help".parse::<Route>(), Ok(Route::Help));
        assert_eq!("catalog".parse::<Route>(), Ok(Route::Catalog));
        assert_eq!("cart".parse::<Route>(), Ok(Route::Cart));
        assert_eq!("cart:order".parse::<Route>(), Ok(Route::Checkout));
        assert_eq!("orders".parse::<Route>(), Ok(Route::OrderList));
    }

    #[test]
    fn test_parse_tokens_with_arguments() {
        assert_eq!(
            "catalog:espresso".parse::<Route>(),
            Ok(Route::CatalogItem("espresso".to_string()))
        );
        assert_eq!(
            "cart:add:latte:catalog".parse::<Route>(),
            Ok(Route::CartAdd {
                item_id: "latte".to_string(),
                return_to: ReturnTo::Catalog
            })
        );
        assert_eq!(
            "cart:remove:raf:cart".parse::<Route>(),
            Ok(Route::CartRemove {
                item_id: "raf".to_string(),
                return_to: ReturnTo::Cart
            })
        );
        assert_eq!("order:17".parse::<Route>(), Ok(Route::Order(OrderId(17))));
    }

    #[test]
    fn test_cart_prefix_does_not_shadow_checkout() {
        // "cart" is a prefix of every cart token; each must still parse to its own route
        assert_ne!("cart:order".parse::<Route>(), Ok(Route::Cart));
        assert!(matches!(
            "cart:add:latte:cart".parse::<Route>(),
            Ok(Route::CartAdd { .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        for token in [
            "",
            "coffee",
            "cart:add:latte",
            "cart:add:latte:orders",
            "cart:remove::cart",
            "catalog:",
            "catalog:a:b",
            "order:abc",
            "menu:extra",
            "cart:add:Latte:cart",
        ] {
            assert!(token.parse::<Route>().is_err(), "token {token:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_or_menu_falls_back() {
        assert_eq!(Route::parse_or_menu(None), Route::Menu);
        assert_eq!(Route::parse_or_menu(Some("bogus:token")), Route::Menu);
        assert_eq!(Route::parse_or_menu(Some("help")), Route::Help);
    }

    #[test]
    fn test_display_matches_grammar() {
        let route = Route::CartRemove {
            item_id: "cappuccino".to_string(),
            return_to: ReturnTo::Catalog,
        };
        assert_eq!(route.to_string(), "cart:remove:cappuccino:catalog");
        assert_eq!(Route::Order(OrderId(5)).to_string(), "order:5");
        assert_eq!(Route::Checkout.to_string(), "cart:order");
    }

    #[test]
    fn test_longest_token_fits_callback_limit() {
        let route = Route::CartRemove {
            item_id: "x".repeat(crate::catalog::MAX_ITEM_ID_LEN),
            return_to: ReturnTo::Catalog,
        };
        assert!(route.to_string().len() <= MAX_TOKEN_LEN);
        assert_eq!(route.to_string().parse::<Route>(), Ok(route));
    }
}
