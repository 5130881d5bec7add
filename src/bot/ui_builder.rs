//! UI Builder module for turning screens into message text and keyboards
//!
//! Rendering is a pure function of the [`Screen`] and the [`RenderContext`]:
//! it never touches the stores or the Telegram API.

use chrono::{DateTime, FixedOffset, Utc};
use std::path::PathBuf;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html::escape;

use crate::catalog::{Catalog, CatalogItem};
use crate::localization::{t_args_lang, t_lang};
use crate::model::{CartLine, Order};
use crate::navigation::{PricedLine, Screen};
use crate::route::{ReturnTo, Route};

/// Everything a screen needs besides its own data
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub catalog: &'a Catalog,
    pub language: &'a str,
    /// Offset used when printing order timestamps
    pub utc_offset: FixedOffset,
}

/// A rendered screen: HTML text, inline keyboard and optional photo
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
    pub image: Option<PathBuf>,
}

fn button(label: impl Into<String>, route: &Route) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, route.to_string())
}

fn back_button(route: Route, language: &str) -> Vec<InlineKeyboardButton> {
    vec![button(t_lang("back", language), &route)]
}

/// Format an amount with the currency sign
pub fn format_price(amount: i64, language: &str) -> String {
    t_args_lang("price", &[("amount", amount.to_string().as_str())], language)
}

/// Format an order timestamp as `HH:MM DD.MM[.YYYY]`
pub fn format_order_date(date: DateTime<Utc>, offset: FixedOffset, with_year: bool) -> String {
    let local = date.with_timezone(&offset);
    if with_year {
        local.format("%H:%M %d.%m.%Y").to_string()
    } else {
        local.format("%H:%M %d.%m").to_string()
    }
}

/// Render a screen for display
pub fn render(screen: &Screen, ctx: &RenderContext<'_>) -> View {
    match screen {
        Screen::Menu => render_menu(ctx),
        Screen::Catalog => render_catalog(ctx),
        Screen::CatalogItem { item, in_cart } => render_catalog_item(item, *in_cart, ctx),
        Screen::Cart {
            lines,
            unavailable,
            total,
        } => render_cart(lines, unavailable, *total, ctx),
        Screen::OrderDetail(order) => render_order_detail(order, ctx),
        Screen::OrderList(orders) => render_order_list(orders, ctx),
        Screen::Help => render_help(ctx),
    }
}

fn text_view(text: String, rows: Vec<Vec<InlineKeyboardButton>>) -> View {
    View {
        text,
        keyboard: InlineKeyboardMarkup::new(rows),
        image: None,
    }
}

fn render_menu(ctx: &RenderContext<'_>) -> View {
    let lang = ctx.language;
    let text = format!(
        "<b>☕️ {}</b> – {}\n\n{}",
        t_lang("menu-title", lang),
        t_lang("menu-description", lang),
        t_lang("menu-pitch", lang)
    );

    let rows = vec![
        vec![button(t_lang("menu-catalog", lang), &Route::Catalog)],
        vec![button(t_lang("menu-cart", lang), &Route::Cart)],
        vec![button(t_lang("menu-orders", lang), &Route::OrderList)],
        vec![button(t_lang("menu-help", lang), &Route::Help)],
    ];

    text_view(text, rows)
}

fn render_catalog(ctx: &RenderContext<'_>) -> View {
    let lang = ctx.language;
    let text = format!(
        "<b>☕️ {}</b>\n\n{}",
        t_lang("catalog-title", lang),
        t_lang("catalog-description", lang)
    );

    let mut rows: Vec<Vec<InlineKeyboardButton>> = ctx
        .catalog
        .items()
        .iter()
        .map(|item| {
            vec![button(
                format!("{} · {}", item.name, format_price(item.unit_price, lang)),
                &Route::CatalogItem(item.id.clone()),
            )]
        })
        .collect();
    rows.push(back_button(Route::Menu, lang));

    text_view(text, rows)
}

fn render_catalog_item(item: &CatalogItem, in_cart: u32, ctx: &RenderContext<'_>) -> View {
    let lang = ctx.language;
    let price = format_price(item.unit_price, lang);
    let text = format!(
        "☕️ <b>{}</b>\n\n💬 {}\n\n{}",
        escape(&item.name),
        escape(&item.description),
        t_args_lang("item-price", &[("price", price.as_str())], lang)
    );

    let cart_button = if in_cart >= 1 {
        button(
            format!(
                "🛒 {}",
                t_args_lang("item-in-cart", &[("count", in_cart.to_string().as_str())], lang)
            ),
            &Route::Cart,
        )
    } else {
        button(
            format!("🛒 {}", t_lang("item-add-to-cart", lang)),
            &Route::CartAdd {
                item_id: item.id.clone(),
                return_to: ReturnTo::Catalog,
            },
        )
    };

    View {
        text,
        keyboard: InlineKeyboardMarkup::new(vec![
            vec![cart_button],
            back_button(Route::Catalog, lang),
        ]),
        image: item.image.clone(),
    }
}

fn render_cart(
    lines: &[PricedLine],
    unavailable: &[CartLine],
    total: i64,
    ctx: &RenderContext<'_>,
) -> View {
    let lang = ctx.language;
    let summary = if lines.is_empty() && unavailable.is_empty() {
        t_lang("cart-empty", lang)
    } else {
        t_lang("cart-review", lang)
    };
    let mut text = format!("<b>🛒 {}</b>\n\n{}", t_lang("cart-title", lang), summary);
    if !unavailable.is_empty() {
        text.push_str("\n\n⚠️ ");
        text.push_str(&t_lang("cart-unavailable", lang));
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = lines
        .iter()
        .map(|line| {
            let item_id = &line.item.id;
            vec![
                button(
                    "-",
                    &Route::CartRemove {
                        item_id: item_id.clone(),
                        return_to: ReturnTo::Cart,
                    },
                ),
                button(
                    format!("{} · {}", line.item.name, line.quantity),
                    &Route::CatalogItem(item_id.clone()),
                ),
                button(
                    "+",
                    &Route::CartAdd {
                        item_id: item_id.clone(),
                        return_to: ReturnTo::Cart,
                    },
                ),
            ]
        })
        .collect();

    // Retired items are shown by id with a single remove button
    rows.extend(unavailable.iter().map(|line| {
        vec![button(
            t_args_lang(
                "cart-remove-unavailable",
                &[
                    ("name", line.item_id.as_str()),
                    ("count", line.quantity.to_string().as_str()),
                ],
                lang,
            ),
            &Route::CartRemove {
                item_id: line.item_id.clone(),
                return_to: ReturnTo::Cart,
            },
        )]
    }));

    if lines.is_empty() {
        rows.push(vec![button(
            t_lang("cart-go-to-catalog", lang),
            &Route::Catalog,
        )]);
    } else if unavailable.is_empty() {
        let total = format_price(total, lang);
        rows.push(vec![button(
            t_args_lang("cart-checkout", &[("total", total.as_str())], lang),
            &Route::Checkout,
        )]);
    }
    rows.push(back_button(Route::Menu, lang));

    text_view(text, rows)
}

fn render_order_detail(order: &Order, ctx: &RenderContext<'_>) -> View {
    let lang = ctx.language;
    let date = format_order_date(order.created_at, ctx.utc_offset, true);

    let lines: Vec<String> = order
        .lines
        .iter()
        .map(|line| {
            // Retired items keep showing under their id
            let name = ctx
                .catalog
                .get(&line.item_id)
                .map_or(line.item_id.as_str(), |item| item.name.as_str());
            t_args_lang(
                "order-line",
                &[
                    ("name", escape(name).as_str()),
                    ("count", line.quantity.to_string().as_str()),
                    ("price", format_price(line.unit_price, lang).as_str()),
                ],
                lang,
            )
        })
        .collect();

    let text = format!(
        "<b>{}</b>\n\n{}\n\n{}: <b>{}</b>",
        t_args_lang("order-title", &[("date", date.as_str())], lang),
        lines.join("\n"),
        t_lang("order-total", lang),
        format_price(order.total_amount, lang)
    );

    text_view(text, vec![back_button(Route::OrderList, lang)])
}

fn render_order_list(orders: &[Order], ctx: &RenderContext<'_>) -> View {
    let lang = ctx.language;
    let mut text = format!("<b>{}</b>", t_lang("orders-title", lang));
    if orders.is_empty() {
        text.push_str("\n\n");
        text.push_str(&t_lang("orders-empty", lang));
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = orders
        .iter()
        .map(|order| {
            let date = format_order_date(order.created_at, ctx.utc_offset, false);
            vec![button(
                t_args_lang("orders-entry", &[("date", date.as_str())], lang),
                &Route::Order(order.id),
            )]
        })
        .collect();
    rows.push(back_button(Route::Menu, lang));

    text_view(text, rows)
}

fn render_help(ctx: &RenderContext<'_>) -> View {
    let lang = ctx.language;
    let text = format!(
        "<b>ℹ️ {}</b>\n\n{}",
        t_lang("help-title", lang),
        t_lang("help-body", lang)
    );

    text_view(text, vec![back_button(Route::Menu, lang)])
}
