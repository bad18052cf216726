//! Field extraction from rendered Tayara pages.
//!
//! Each lookup is independent and returns `None` when its node is missing, so
//! one broken field never takes the rest of the record down with it.

use crate::error::{Result, ScrapeError};
use crate::models::{Product, ProductBuilder};
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Currency suffix appended to machine-readable prices
const CURRENCY: &str = "DT";
const CONTACT_MARKER: &str = "Tel:";

pub const LISTING_CARD: &str = "article";
pub const DETAIL_BODY: &str = "body";
pub const PHONE_BUTTON: &str = r#"button[aria-label="Afficher numéro"]"#;
pub const PHONE_LINK: &str = r#"a[href^="tel:"]"#;

struct Selectors {
    card: Selector,
    card_title: Selector,
    card_location: Selector,
    price: Selector,
    image: Selector,
    link: Selector,
    detail_title: Selector,
    detail_seller: Selector,
    detail_description: Selector,
    detail_location: Selector,
    delivery_container: Selector,
    delivery_status: Selector,
    document_title: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |css: &str| Selector::parse(css).expect("static selector must parse");
        Selectors {
            card: parse(LISTING_CARD),
            card_title: parse("h2.card-title"),
            card_location: parse(r#"svg[viewBox="0 0 20 20"] + span"#),
            price: parse("data"),
            image: parse("img"),
            link: parse("a"),
            detail_title: parse("li.p-2.my-1.text-xs.text-gray-600 span"),
            detail_seller: parse("span.text-sm.font-semibold.text-gray-700.capitalize"),
            detail_description: parse("p.text-sm.text-start.text-gray-700"),
            detail_location: parse("div.flex.items-center.space-x-2.mb-1 span"),
            delivery_container: parse("span.flex.flex-col.py-1"),
            delivery_status: parse("span:nth-child(2)"),
            document_title: parse("title"),
        }
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

fn non_blank(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(text_of).and_then(non_blank)
}

fn first_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Price from the first `<data>` element: its `value` attribute with a
/// currency suffix, else its visible text.
fn price_in(scope: ElementRef<'_>) -> Option<String> {
    let data = scope.select(&selectors().price).next()?;
    format_price(data.value().attr("value"), &text_of(data))
}

pub fn format_price(value: Option<&str>, text: &str) -> Option<String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => Some(format!("{} {}", value, CURRENCY)),
        None => non_blank(text.to_string()),
    }
}

/// Split "Tunis, 2 days ago" on the first comma into location and date
pub fn split_location_date(text: &str) -> Option<(String, Option<String>)> {
    let (location, date) = match text.split_once(',') {
        Some((location, date)) => (location.trim(), non_blank(date.to_string())),
        None => (text.trim(), None),
    };
    if location.is_empty() {
        return None;
    }
    Some((location.to_string(), date))
}

/// Description text before the first "Tel:" marker, whitespace collapsed
pub fn clean_description(text: &str) -> Option<String> {
    let cleaned = match text.find(CONTACT_MARKER) {
        Some(idx) => text[..idx].split_whitespace().collect::<Vec<_>>().join(" "),
        None => text.trim().to_string(),
    };
    non_blank(cleaned)
}

/// The revealed number is rendered with a fixed four-character prefix
pub fn strip_contact_prefix(text: &str) -> Option<String> {
    non_blank(text.chars().skip(4).collect())
}

/// Absolute URLs pass through, protocol-relative ones take the origin's
/// scheme, anything else is prefixed with `origin`
pub fn absolutize(href: &str, origin: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with("//") {
        let scheme = origin.split_once("://").map(|(scheme, _)| scheme).unwrap_or("https");
        format!("{}:{}", scheme, href)
    } else if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        format!("{}/{}", origin, href)
    }
}

/// Map every listing card on a search results page to a `Product`
pub fn parse_listing_page(html: &str, origin: &str) -> Vec<Product> {
    let document = Html::parse_document(html);
    let cards: Vec<_> = document.select(&selectors().card).collect();
    debug!("Found {} listing cards", cards.len());

    let mut products = Vec::with_capacity(cards.len());
    for (idx, card) in cards.into_iter().enumerate() {
        match parse_listing_card(card, origin) {
            Ok(product) => products.push(product),
            Err(reason) => debug!("Skipped card {}: {}", idx, reason),
        }
    }

    info!("Extracted {} products from page", products.len());
    products
}

fn parse_listing_card(card: ElementRef<'_>, origin: &str) -> std::result::Result<Product, String> {
    let sel = selectors();

    let product_url = first_attr(card, &sel.link, "href").map(|href| absolutize(&href, origin));
    let title = first_text(card, &sel.card_title);
    if title.is_some() && product_url.is_none() {
        warn!("Listing card {:?} has no link, dropping it", title);
    }

    ProductBuilder::new()
        .title(title)
        .product_url(product_url)
        .price(price_in(card))
        .location_and_date(
            card.select(&sel.card_location)
                .next()
                .and_then(|el| split_location_date(&text_of(el))),
        )
        .image_url(first_attr(card, &sel.image, "src"))
        .build()
        .map_err(|missing| format!("missing {}", missing))
}

/// Extract a detail page snapshot. The contact comes from the live phone
/// reveal, which cannot be read from static HTML.
///
/// The title is read from the breadcrumb label, falling back to the document
/// `<title>`; if both are blank the page is an `ExtractionFailed`.
pub fn parse_product_page(html: &str, url: &str, seller_contact: Option<String>) -> Result<Product> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let sel = selectors();

    let title = first_text(root, &sel.detail_title).or_else(|| first_text(root, &sel.document_title));

    let location = root
        .select(&sel.detail_location)
        .next()
        .and_then(|el| split_location_date(&text_of(el)));

    let description = root
        .select(&sel.detail_description)
        .next()
        .and_then(|el| clean_description(&text_of(el)));

    ProductBuilder::new()
        .title(title)
        .product_url(Some(url.to_string()))
        .seller_name(first_text(root, &sel.detail_seller))
        .seller_contact(seller_contact)
        .price(price_in(root))
        .description(description)
        .location_and_date(location)
        .delivery_available(delivery_available(root))
        .image_url(first_attr(root, &sel.image, "src"))
        .build()
        .map_err(|missing| ScrapeError::extraction(url, format!("missing {}", missing)))
}

fn delivery_available(root: ElementRef<'_>) -> bool {
    let sel = selectors();
    root.select(&sel.delivery_container)
        .next()
        .and_then(|container| container.select(&sel.delivery_status).next())
        .map(|status| text_of(status).trim().to_lowercase() == "oui")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://www.tayara.tn";

    fn card(title: &str, href: Option<&str>, extra: &str) -> String {
        let link = href
            .map(|h| format!(r#"<a href="{}">link</a>"#, h))
            .unwrap_or_default();
        format!(
            r#"<article>{link}<h2 class="card-title">{title}</h2>{extra}</article>"#,
            link = link,
            title = title,
            extra = extra
        )
    }

    fn page(cards: &[String]) -> String {
        format!("<html><body><main>{}</main></body></html>", cards.concat())
    }

    #[test]
    fn price_prefers_value_attribute() {
        assert_eq!(format_price(Some("150"), "150,000 DT"), Some("150 DT".to_string()));
        assert_eq!(format_price(None, "  1 200 DT \n"), Some("1 200 DT".to_string()));
        assert_eq!(format_price(Some(""), "  "), None);
    }

    #[test]
    fn location_splits_on_first_comma() {
        assert_eq!(
            split_location_date("Tunis, 2 days ago"),
            Some(("Tunis".to_string(), Some("2 days ago".to_string())))
        );
        assert_eq!(split_location_date("Tunis"), Some(("Tunis".to_string(), None)));
        assert_eq!(
            split_location_date(" La Marsa , il y a 3 heures, hier "),
            Some(("La Marsa".to_string(), Some("il y a 3 heures, hier".to_string())))
        );
        assert_eq!(split_location_date("   "), None);
    }

    #[test]
    fn description_cut_at_phone_marker() {
        assert_eq!(
            clean_description("Great phone. Tel: 12345678 extra"),
            Some("Great phone.".to_string())
        );
        assert_eq!(
            clean_description("Très bon état\n\n  batterie   neuve\nTel: 22 000 000"),
            Some("Très bon état batterie neuve".to_string())
        );
        assert_eq!(clean_description("  No marker here  "), Some("No marker here".to_string()));
        assert_eq!(clean_description("Tel: 99 999 999"), None);
    }

    #[test]
    fn contact_prefix_is_stripped() {
        assert_eq!(strip_contact_prefix("Tél 22 333 444"), Some("22 333 444".to_string()));
        assert_eq!(strip_contact_prefix("abc"), None);
    }

    #[test]
    fn relative_links_get_origin() {
        assert_eq!(absolutize("/item/123/phone", ORIGIN), "https://www.tayara.tn/item/123/phone");
        assert_eq!(absolutize("item/1", ORIGIN), "https://www.tayara.tn/item/1");
        assert_eq!(absolutize("https://cdn.example/x", ORIGIN), "https://cdn.example/x");
    }

    #[test]
    fn protocol_relative_links_take_origin_scheme() {
        assert_eq!(
            absolutize("//cdn.tayara.tn/item/7", ORIGIN),
            "https://cdn.tayara.tn/item/7"
        );
        assert_eq!(
            absolutize("//cdn.local/x", "http://localhost:3000"),
            "http://cdn.local/x"
        );

        let html = page(&[card("Frigo", Some("//www.tayara.tn/item/8/frigo"), "")]);
        let products = parse_listing_page(&html, ORIGIN);
        assert_eq!(products[0].product_url, "https://www.tayara.tn/item/8/frigo");
    }

    #[test]
    fn listing_card_fields() {
        let extra = r#"
            <data value="150">150 DT</data>
            <div><svg viewBox="0 0 20 20"><path d=""></path></svg><span>Tunis, 2 days ago</span></div>
            <img src="https://cdn.tayara.tn/img/1.jpg">
        "#;
        let html = page(&[card("  iPhone 12 Pro ", Some("/item/42/iphone"), extra)]);

        let products = parse_listing_page(&html, ORIGIN);
        assert_eq!(products.len(), 1);
        let product = &products[0];
        assert_eq!(product.title, "iPhone 12 Pro");
        assert_eq!(product.price.as_deref(), Some("150 DT"));
        assert_eq!(product.location.as_deref(), Some("Tunis"));
        assert_eq!(product.date_posted.as_deref(), Some("2 days ago"));
        assert_eq!(product.image_url.as_deref(), Some("https://cdn.tayara.tn/img/1.jpg"));
        assert_eq!(product.product_url, "https://www.tayara.tn/item/42/iphone");
        assert!(product.description.is_none());
    }

    #[test]
    fn price_falls_back_to_visible_text() {
        let html = page(&[card("Vélo", Some("/item/7"), "<data> Prix à discuter </data>")]);
        let products = parse_listing_page(&html, ORIGIN);
        assert_eq!(products[0].price.as_deref(), Some("Prix à discuter"));
    }

    #[test]
    fn invalid_cards_are_dropped_in_order() {
        let html = page(&[
            card("First", Some("/item/1"), ""),
            card("   ", Some("/item/2"), ""),
            card("Third", Some("https://www.tayara.tn/item/3"), ""),
            "<article><a href=\"/item/4\">no heading</a></article>".to_string(),
            card("No link", None, ""),
            card("Sixth", Some("/item/6"), ""),
        ]);

        let titles: Vec<_> = parse_listing_page(&html, ORIGIN)
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["First", "Third", "Sixth"]);
    }

    #[test]
    fn page_without_cards_is_empty() {
        assert!(parse_listing_page("<html><body><p>Aucun résultat</p></body></html>", ORIGIN).is_empty());
    }

    const DETAIL: &str = r#"
        <html><head><title>Samsung S20 | Tayara</title></head><body>
          <ul><li class="p-2 my-1 text-xs text-gray-600"><span>Samsung Galaxy S20</span></li></ul>
          <img src="https://cdn.tayara.tn/img/s20.jpg">
          <span class="text-sm font-semibold text-gray-700 capitalize"> ahmed </span>
          <data value="1800">1 800 DT</data>
          <p class="text-sm text-start text-gray-700">Great phone. Tel: 12345678 extra</p>
          <div class="flex items-center space-x-2 mb-1"><span>Sfax, il y a 2 jours</span></div>
          <span class="flex flex-col py-1"><span>Livraison</span><span> Oui </span></span>
        </body></html>
    "#;

    #[test]
    fn detail_page_fields() {
        let url = "https://www.tayara.tn/item/99/samsung";
        let product = parse_product_page(DETAIL, url, Some("22 333 444".to_string())).unwrap();

        assert_eq!(product.title, "Samsung Galaxy S20");
        assert_eq!(product.seller_name.as_deref(), Some("ahmed"));
        assert_eq!(product.price.as_deref(), Some("1800 DT"));
        assert_eq!(product.description.as_deref(), Some("Great phone."));
        assert_eq!(product.location.as_deref(), Some("Sfax"));
        assert_eq!(product.date_posted.as_deref(), Some("il y a 2 jours"));
        assert!(product.is_delivery_available);
        assert_eq!(product.image_url.as_deref(), Some("https://cdn.tayara.tn/img/s20.jpg"));
        assert_eq!(product.product_url, url);
        assert_eq!(product.seller_contact.as_deref(), Some("22 333 444"));
    }

    #[test]
    fn delivery_requires_oui() {
        let html = r#"<html><head><title>Ad</title></head><body>
            <span class="flex flex-col py-1"><span>Livraison</span><span>Non</span></span>
        </body></html>"#;
        let product = parse_product_page(html, "https://www.tayara.tn/item/1", None).unwrap();
        assert!(!product.is_delivery_available);
    }

    #[test]
    fn sparse_detail_page_falls_back_to_document_title() {
        let html = "<html><head><title> Canapé 3 places </title></head><body></body></html>";
        let product = parse_product_page(html, "https://www.tayara.tn/item/5", None).unwrap();
        assert_eq!(product.title, "Canapé 3 places");
        assert!(product.price.is_none());
        assert!(product.location.is_none());
        assert!(!product.is_delivery_available);
    }

    #[test]
    fn detail_page_without_any_title_fails() {
        let err = parse_product_page("<html><body></body></html>", "https://www.tayara.tn/item/5", None).unwrap_err();
        assert!(matches!(err, ScrapeError::ExtractionFailed { .. }));
    }
}
