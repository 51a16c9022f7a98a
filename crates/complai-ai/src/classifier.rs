//! Coarse complaint classification for hybrid retrieval.
//!
//! The pipeline needs a product type and thematic tags to narrow the
//! precedent search. The default implementation is a keyword matcher —
//! deliberately simple, always succeeds, and can be swapped for a trained
//! model without touching the orchestrator.

use complai_core::CaseFilters;

/// Derives coarse categorical filters from complaint text.
///
/// Best-effort: implementations must always return something usable, falling
/// back to defaults rather than failing.
pub trait Classifier: Send + Sync {
    fn classify(&self, complaint_text: &str) -> CaseFilters;
}

const PRODUCT_KEYWORDS: &[(&str, &[&str])] = &[
    ("Credit Card", &["credit card", "card provider", "chargeback"]),
    ("Mortgage", &["mortgage", "remortgage", "repossession"]),
    (
        "Current Account",
        &["current account", "overdraft", "direct debit"],
    ),
    (
        "Motor Insurance",
        &["motor insurance", "car insurance", "vehicle claim"],
    ),
    ("Personal Loan", &["personal loan", "loan agreement", "loan"]),
];

const THEME_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Affordability",
        &["afford", "income", "repayment", "creditworthiness"],
    ),
    ("Fees & Charges", &["fee", "charge", "interest rate"]),
    (
        "Customer Service",
        &["rude", "unhelpful", "ignored", "no response"],
    ),
    ("Fraud & Scams", &["fraud", "scam", "unauthorised"]),
    (
        "Arrears & Collections",
        &["arrears", "default notice", "debt collect"],
    ),
];

const DEFAULT_PRODUCT: &str = "Personal Loan";
const DEFAULT_THEME: &str = "Affordability";

/// Keyword-table classifier. The stated defaults make the output a usable
/// placeholder even for text that matches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl Classifier for KeywordClassifier {
    fn classify(&self, complaint_text: &str) -> CaseFilters {
        let haystack = complaint_text.to_lowercase();

        let product_type = PRODUCT_KEYWORDS
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| haystack.contains(n)))
            .map(|(label, _)| (*label).to_string())
            .unwrap_or_else(|| DEFAULT_PRODUCT.to_string());

        let mut key_themes: Vec<String> = THEME_KEYWORDS
            .iter()
            .filter(|(_, needles)| needles.iter().any(|n| haystack.contains(n)))
            .map(|(label, _)| (*label).to_string())
            .collect();
        if key_themes.is_empty() {
            key_themes.push(DEFAULT_THEME.to_string());
        }

        CaseFilters {
            product_type: Some(product_type),
            key_themes,
        }
    }
}
