//! # Navigation State Machine
//!
//! [`Navigator::dispatch`] takes a parsed [`Route`], performs the cart or order
//! mutation the route implies and returns a [`Transition`]: an optional
//! transient notice for the callback answer plus the screen to show next.
//! Mutating routes (add, remove, checkout) name their follow-up screen
//! directly, so a single press can change data and land on a different screen.
//!
//! Domain failures (unknown item, foreign order, empty cart) are turned into
//! notices here. Storage failures are returned to the caller untouched.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogItem};
use crate::error::ShopError;
use crate::model::{CartLine, Order, OrderId, UserId};
use crate::route::{ReturnTo, Route};
use crate::store::{CartStore, OrderStore};

/// Most recent orders listed on the order list screen
pub const MAX_LISTED_ORDERS: usize = 20;

/// Short message shown in the callback answer popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    OrderPlaced,
    ItemNotFound,
    ItemUnavailable,
    OrderNotFound,
    EmptyCart,
    Failure,
}

impl Notice {
    /// Localization key of the notice text
    pub fn message_key(self) -> &'static str {
        match self {
            Notice::OrderPlaced => "notice-order-placed",
            Notice::ItemNotFound => "notice-item-not-found",
            Notice::ItemUnavailable => "notice-item-unavailable",
            Notice::OrderNotFound => "notice-order-not-found",
            Notice::EmptyCart => "notice-empty-cart",
            Notice::Failure => "notice-failure",
        }
    }
}

/// A cart line joined with its catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub item: CatalogItem,
    pub quantity: u32,
}

impl PricedLine {
    pub fn subtotal(&self) -> i64 {
        i64::from(self.quantity) * self.item.unit_price
    }
}

/// Screen content, ready to be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Catalog,
    CatalogItem { item: CatalogItem, in_cart: u32 },
    Cart {
        lines: Vec<PricedLine>,
        /// Lines whose item left the catalog; they can only be removed
        unavailable: Vec<CartLine>,
        total: i64,
    },
    OrderDetail(Order),
    OrderList(Vec<Order>),
    Help,
}

/// Outcome of one dispatched action
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transition {
    pub notice: Option<Notice>,
    /// `None` leaves the current screen as it is
    pub screen: Option<Screen>,
}

impl Transition {
    pub fn show(screen: Screen) -> Self {
        Self {
            notice: None,
            screen: Some(screen),
        }
    }

    pub fn notice(notice: Notice) -> Self {
        Self {
            notice: Some(notice),
            screen: None,
        }
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// Behaviour switches for the navigator
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigatorOptions {
    /// Empty the cart after a successful checkout
    pub clear_cart_on_checkout: bool,
}

/// Interprets routes against the catalog and the stores
pub struct Navigator {
    catalog: Arc<Catalog>,
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    options: NavigatorOptions,
}

impl Navigator {
    pub fn new(
        catalog: Arc<Catalog>,
        carts: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        options: NavigatorOptions,
    ) -> Self {
        Self {
            catalog,
            carts,
            orders,
            options,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Apply `route` for `user` and decide what to show next
    pub async fn dispatch(&self, user: UserId, route: &Route) -> Result<Transition, ShopError> {
        debug!(user_id = %user, route = %route, "Dispatching route");

        match route {
            Route::Checkout => self.checkout(user).await,
            Route::CartAdd { item_id, return_to } => {
                match self.carts.add_one(user, item_id).await {
                    Ok(()) => {}
                    Err(ShopError::UnknownItem(id)) => {
                        warn!(user_id = %user, item_id = %id, "Add requested for unknown item");
                        return Ok(Transition::notice(Notice::ItemNotFound));
                    }
                    Err(e) => return Err(e),
                }
                self.after_cart_change(user, item_id, *return_to).await
            }
            Route::CartRemove { item_id, return_to } => {
                self.carts.remove_one(user, item_id).await?;
                self.after_cart_change(user, item_id, *return_to).await
            }
            Route::Cart => Ok(Transition::show(self.cart_screen(user).await?)),
            Route::CatalogItem(item_id) => self.catalog_item(user, item_id).await,
            Route::Catalog => Ok(Transition::show(Screen::Catalog)),
            Route::Order(order_id) => self.order_detail(user, *order_id).await,
            Route::OrderList => Ok(Transition::show(self.order_list(user).await?)),
            Route::Help => Ok(Transition::show(Screen::Help)),
            Route::Menu => Ok(Transition::show(Screen::Menu)),
        }
    }

    async fn checkout(&self, user: UserId) -> Result<Transition, ShopError> {
        let clear_cart = self.options.clear_cart_on_checkout;
        let order = match self.orders.create(user, clear_cart).await {
            Ok(order) => order,
            Err(ShopError::EmptyCart) => {
                debug!(user_id = %user, "Checkout requested with an empty cart");
                let screen = self.cart_screen(user).await?;
                return Ok(Transition::show(screen).with_notice(Notice::EmptyCart));
            }
            Err(ShopError::UnknownItem(id)) => {
                warn!(user_id = %user, item_id = %id, "Checkout blocked by a retired catalog item");
                let screen = self.cart_screen(user).await?;
                return Ok(Transition::show(screen).with_notice(Notice::ItemUnavailable));
            }
            Err(e) => return Err(e),
        };

        info!(user_id = %user, order_id = %order.id, "Order placed");
        Ok(Transition::show(Screen::OrderDetail(order)).with_notice(Notice::OrderPlaced))
    }

    async fn after_cart_change(
        &self,
        user: UserId,
        item_id: &str,
        return_to: ReturnTo,
    ) -> Result<Transition, ShopError> {
        match return_to {
            ReturnTo::Cart => Ok(Transition::show(self.cart_screen(user).await?)),
            ReturnTo::Catalog => self.catalog_item(user, item_id).await,
        }
    }

    async fn catalog_item(&self, user: UserId, item_id: &str) -> Result<Transition, ShopError> {
        let Some(item) = self.catalog.get(item_id) else {
            warn!(user_id = %user, item_id = %item_id, "Catalog item not found");
            return Ok(Transition::notice(Notice::ItemNotFound));
        };

        let in_cart = self.carts.get_quantity(user, item_id).await?;
        Ok(Transition::show(Screen::CatalogItem {
            item: item.clone(),
            in_cart,
        }))
    }

    /// Cart lines priced against the live catalog
    async fn cart_screen(&self, user: UserId) -> Result<Screen, ShopError> {
        let mut lines = Vec::new();
        let mut unavailable = Vec::new();

        for line in self.carts.list_items(user).await? {
            match self.catalog.get(&line.item_id) {
                Some(item) => lines.push(PricedLine {
                    item: item.clone(),
                    quantity: line.quantity,
                }),
                None => {
                    warn!(user_id = %user, item_id = %line.item_id, "Retired item in cart");
                    unavailable.push(line);
                }
            }
        }
        let total = lines.iter().map(PricedLine::subtotal).sum();

        Ok(Screen::Cart {
            lines,
            unavailable,
            total,
        })
    }

    async fn order_detail(&self, user: UserId, order_id: OrderId) -> Result<Transition, ShopError> {
        match self.orders.get_by_id(user, order_id).await {
            Ok(order) => Ok(Transition::show(Screen::OrderDetail(order))),
            Err(ShopError::NotFound(_)) => {
                warn!(user_id = %user, order_id = %order_id, "Order not found for user");
                let screen = self.order_list(user).await?;
                Ok(Transition::show(screen).with_notice(Notice::OrderNotFound))
            }
            Err(e) => Err(e),
        }
    }

    async fn order_list(&self, user: UserId) -> Result<Screen, ShopError> {
        let mut orders = self.orders.list_for_user(user).await?;
        orders.truncate(MAX_LISTED_ORDERS);
        Ok(Screen::OrderList(orders))
    }
}
