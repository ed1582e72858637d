use serde::{Deserialize, Serialize};

/// Catalog used when the caller does not configure one.
pub const DEFAULT_PAYMENT_METHODS: &[&str] = &["cash", "transfer"];

/// A named entry of the fixed payment-method catalog.
///
/// Participants reference a method by value; the catalog owns it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethod(String);

impl PaymentMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds a catalog from plain names, dropping blanks and repeats.
pub fn catalog<I, S>(names: I) -> Vec<PaymentMethod>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut methods: Vec<PaymentMethod> = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if !name.is_empty() && !methods.iter().any(|m| m.name() == name) {
            methods.push(PaymentMethod::new(name));
        }
    }
    methods
}
