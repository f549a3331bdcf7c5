//! Static product catalog and flow configuration.
//!
//! The catalog is built once at startup and never mutated. Every price shown
//! to a customer is snapshotted into the order at confirmation time, so later
//! catalog edits never rewrite existing orders.

/// What extra input a product needs before an order can be confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Account-type choice; "use my account" additionally collects
    /// `email,password` credentials.
    Login,
    /// A free-form fulfillment detail (text or photo).
    Detail,
    /// Nothing beyond product and duration.
    None,
}

/// One purchasable duration of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub duration: String,
    /// Whole-rupee price.
    pub price: i64,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub name: String,
    pub plans: Vec<Plan>,
    pub capture: Capture,
}

impl Product {
    pub fn new(name: &str, plans: &[(&str, i64)], capture: Capture) -> Self {
        Self {
            name: name.to_string(),
            plans: plans
                .iter()
                .map(|(duration, price)| Plan {
                    duration: duration.to_string(),
                    price: *price,
                })
                .collect(),
            capture,
        }
    }
}

/// The full product catalog, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The production storefront catalog.
    pub fn storefront() -> Self {
        Self::new(vec![
            Product::new("YT", &[("1M", 25), ("3M", 149)], Capture::None),
            Product::new("Gemini", &[("12M", 159)], Capture::None),
            Product::new("Spotify", &[("2M", 49), ("3M", 89)], Capture::Login),
            Product::new("Crunchyroll", &[("1M", 39)], Capture::Login),
        ])
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by name. Stale inline-keyboard tokens resolve to
    /// `None` here and are treated as validation failures upstream.
    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Price for a (product, duration) pair, if both still exist.
    pub fn price(&self, product: &str, duration: &str) -> Option<i64> {
        self.product(product)?
            .plans
            .iter()
            .find(|plan| plan.duration == duration)
            .map(|plan| plan.price)
    }

    /// Capture policy for a product; `Capture::None` for unknown products.
    pub fn capture(&self, product: &str) -> Capture {
        self.product(product)
            .map(|p| p.capture)
            .unwrap_or(Capture::None)
    }
}

/// Flow-variant switches. One parameterized state machine covers all
/// deployed storefront variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowConfig {
    /// When true, confirmation shows payment instructions and the admin is
    /// notified only once payment evidence is attached. When false, the admin
    /// is notified immediately on confirmation.
    pub collect_payment_evidence: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            collect_payment_evidence: true,
        }
    }
}
