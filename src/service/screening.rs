use serde::Serialize;

const UNETHICAL_TERMS: &[&str] = &[
    "hidden fees",
    "predatory interest rates",
    "undisclosed penalties",
];

const SUSPICIOUS_TERMS: &[&str] = &[
    "unexpected large withdrawal",
    "account drained",
    "unauthorized payment",
];

/// Screens free text against a phrase list.
pub trait TextScreen: Send + Sync {
    /// First listed phrase contained in `text`, case-insensitively.
    fn first_hit(&self, text: &str) -> Option<&str>;
}

/// Case-insensitive substring screen built from a static phrase list.
pub struct KeywordScreen {
    phrases: Vec<String>,
}

impl KeywordScreen {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn unethical_terms() -> Self {
        Self::new(UNETHICAL_TERMS)
    }

    pub fn suspicious_terms() -> Self {
        Self::new(SUSPICIOUS_TERMS)
    }
}

impl TextScreen for KeywordScreen {
    fn first_hit(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.phrases
            .iter()
            .find(|p| haystack.contains(p.as_str()))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ComplianceVerdict {
    Flagged { reason: String },
    Approved,
}

impl ComplianceVerdict {
    pub fn is_flagged(&self) -> bool {
        matches!(self, ComplianceVerdict::Flagged { .. })
    }
}

/// Compliance and fraud checks over loan terms and transaction descriptions.
pub struct Screening {
    agreements: Box<dyn TextScreen>,
    transactions: Box<dyn TextScreen>,
    fraud_amount_threshold: f64,
}

impl Screening {
    pub fn new(fraud_amount_threshold: f64) -> Self {
        Self {
            agreements: Box::new(KeywordScreen::unethical_terms()),
            transactions: Box::new(KeywordScreen::suspicious_terms()),
            fraud_amount_threshold,
        }
    }

    pub fn analyze_loan_agreement(&self, terms: &str) -> ComplianceVerdict {
        match self.agreements.first_hit(terms) {
            Some(term) => ComplianceVerdict::Flagged {
                reason: format!("Contains unethical term: {term}"),
            },
            None => ComplianceVerdict::Approved,
        }
    }

    pub fn detect_fraudulent_transaction(&self, description: &str, amount: f64) -> bool {
        amount > self.fraud_amount_threshold || self.transactions.first_hit(description).is_some()
    }
}
