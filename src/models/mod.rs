use serde::{Deserialize, Serialize};

/// A single classified ad, as scraped from a listing card or a detail page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Product {
    pub title: String,
    pub price: Option<String>,
    pub location: Option<String>,
    pub date_posted: Option<String>,
    pub image_url: Option<String>,
    pub product_url: String,
    pub description: Option<String>,
    pub seller_name: Option<String>,
    pub seller_contact: Option<String>,
    #[serde(default)]
    pub is_delivery_available: bool,
}

impl Product {
    /// Placeholder returned alongside a failed detail extraction
    pub fn placeholder(url: &str) -> Self {
        Self {
            title: "Error".to_string(),
            product_url: url.to_string(),
            ..Default::default()
        }
    }
}

/// Collects independently extracted fields; `build` enforces the required ones
#[derive(Debug, Default)]
pub struct ProductBuilder {
    title: Option<String>,
    product_url: Option<String>,
    price: Option<String>,
    location: Option<String>,
    date_posted: Option<String>,
    image_url: Option<String>,
    description: Option<String>,
    seller_name: Option<String>,
    seller_contact: Option<String>,
    is_delivery_available: bool,
}

/// Why a record could not be built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Title,
    ProductUrl,
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingField::Title => write!(f, "title"),
            MissingField::ProductUrl => write!(f, "product_url"),
        }
    }
}

impl ProductBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn product_url(mut self, url: Option<String>) -> Self {
        self.product_url = url;
        self
    }

    pub fn price(mut self, price: Option<String>) -> Self {
        self.price = price;
        self
    }

    /// Sets both halves of a "location, date" pair
    pub fn location_and_date(mut self, pair: Option<(String, Option<String>)>) -> Self {
        if let Some((location, date)) = pair {
            self.location = Some(location);
            self.date_posted = date;
        }
        self
    }

    pub fn image_url(mut self, url: Option<String>) -> Self {
        self.image_url = url;
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn seller_name(mut self, name: Option<String>) -> Self {
        self.seller_name = name;
        self
    }

    pub fn seller_contact(mut self, contact: Option<String>) -> Self {
        self.seller_contact = contact;
        self
    }

    pub fn delivery_available(mut self, available: bool) -> Self {
        self.is_delivery_available = available;
        self
    }

    pub fn build(self) -> Result<Product, MissingField> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(MissingField::Title)?;
        let product_url = self
            .product_url
            .filter(|u| !u.trim().is_empty())
            .ok_or(MissingField::ProductUrl)?;

        Ok(Product {
            title,
            price: self.price,
            location: self.location,
            date_posted: self.date_posted,
            image_url: self.image_url,
            product_url,
            description: self.description,
            seller_name: self.seller_name,
            seller_contact: self.seller_contact,
            is_delivery_available: self.is_delivery_available,
        })
    }
}

/// Body of `GET /search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub total_products: usize,
    pub products: Vec<Product>,
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn from_products(products: Vec<Product>) -> Self {
        Self {
            success: true,
            total_products: products.len(),
            products,
            error: None,
        }
    }
}

/// Body of `GET /product`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: Product,
    pub error: Option<String>,
}
