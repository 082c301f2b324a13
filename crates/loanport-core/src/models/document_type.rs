use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Document tags accepted by the application backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    AccountsPayable,
    AccountsReceivable,
    AccountantFinancials,
    ArticlesOfIncorporation,
    BalanceSheet,
    BankStatements,
    BusinessLicense,
    BusinessPlan,
    CashFlowStatement,
    CollateralDocs,
    DriversLicenseFrontBack,
    EquipmentQuote,
    InvoiceSamples,
    Other,
    PersonalFinancials,
    PersonalGuarantee,
    ProfitAndLoss,
    ProofOfIdentity,
    SignedApplication,
    SupplierAgreement,
    TaxReturns,
    VoidCheque,
}

/// Human labels and legacy tags seen in lender requirement lists.
const ALIASES: &[(&str, DocumentType)] = &[
    ("bank statements (6 months)", DocumentType::BankStatements),
    ("banking statements", DocumentType::BankStatements),
    ("bank account statements", DocumentType::BankStatements),
    ("bank_statement", DocumentType::BankStatements),
    ("business tax returns", DocumentType::TaxReturns),
    ("tax returns (2-3 years)", DocumentType::TaxReturns),
    ("corporate tax returns", DocumentType::TaxReturns),
    ("tax_return", DocumentType::TaxReturns),
    ("accountant prepared financial statements", DocumentType::AccountantFinancials),
    ("audited financial statements", DocumentType::AccountantFinancials),
    ("financial statements", DocumentType::AccountantFinancials),
    ("financial_statements", DocumentType::AccountantFinancials),
    ("accountant_prepared_statements", DocumentType::AccountantFinancials),
    ("personal financial statement", DocumentType::PersonalFinancials),
    ("personal financial statements", DocumentType::PersonalFinancials),
    ("personal balance sheet", DocumentType::PersonalFinancials),
    ("personal_financial_statement", DocumentType::PersonalFinancials),
    ("voided check", DocumentType::VoidCheque),
    ("void check", DocumentType::VoidCheque),
    ("cancelled check", DocumentType::VoidCheque),
    ("bank verification", DocumentType::VoidCheque),
    ("void_pad", DocumentType::VoidCheque),
    ("equipment quote or invoice", DocumentType::EquipmentQuote),
    ("equipment invoice", DocumentType::EquipmentQuote),
    ("equipment specifications", DocumentType::EquipmentQuote),
    ("personal guaranty", DocumentType::PersonalGuarantee),
    ("guarantee form", DocumentType::PersonalGuarantee),
    ("accounts receivable aging report", DocumentType::AccountsReceivable),
    ("ar aging", DocumentType::AccountsReceivable),
    ("customer receivables", DocumentType::AccountsReceivable),
    ("accounts payable aging", DocumentType::AccountsPayable),
    ("payables report", DocumentType::AccountsPayable),
    ("invoice samples (90 days)", DocumentType::InvoiceSamples),
    ("sample invoices", DocumentType::InvoiceSamples),
    ("customer invoices", DocumentType::InvoiceSamples),
    ("cash flow projections", DocumentType::CashFlowStatement),
    ("business plan with use of funds", DocumentType::BusinessPlan),
    ("collateral documentation", DocumentType::CollateralDocs),
    ("collateral documents", DocumentType::CollateralDocs),
    ("security documents", DocumentType::CollateralDocs),
    ("profit and loss statement", DocumentType::ProfitAndLoss),
    ("p&l statement", DocumentType::ProfitAndLoss),
    ("income statement", DocumentType::ProfitAndLoss),
    ("profit_loss_statement", DocumentType::ProfitAndLoss),
    ("statement of financial position", DocumentType::BalanceSheet),
    ("supplier contracts", DocumentType::SupplierAgreement),
    ("vendor agreements", DocumentType::SupplierAgreement),
    ("driver's license", DocumentType::DriversLicenseFrontBack),
    ("drivers license", DocumentType::DriversLicenseFrontBack),
    ("government id", DocumentType::ProofOfIdentity),
    ("identification documents", DocumentType::ProofOfIdentity),
    ("completed application", DocumentType::SignedApplication),
    ("loan application", DocumentType::SignedApplication),
    ("additional documents", DocumentType::Other),
];

/// Keyword pairs tried in order when no alias matches.
const KEYWORD_FALLBACKS: &[(&str, &str, DocumentType)] = &[
    ("bank", "statement", DocumentType::BankStatements),
    ("tax", "return", DocumentType::TaxReturns),
    ("personal", "financial", DocumentType::PersonalFinancials),
    ("personal", "guarant", DocumentType::PersonalGuarantee),
    ("financial", "statement", DocumentType::AccountantFinancials),
    ("business", "license", DocumentType::BusinessLicense),
    ("article", "incorporation", DocumentType::ArticlesOfIncorporation),
    ("void", "check", DocumentType::VoidCheque),
    ("void", "cheque", DocumentType::VoidCheque),
    ("equipment", "quote", DocumentType::EquipmentQuote),
    ("accounts", "receivable", DocumentType::AccountsReceivable),
    ("accounts", "payable", DocumentType::AccountsPayable),
    ("invoice", "sample", DocumentType::InvoiceSamples),
    ("cash", "flow", DocumentType::CashFlowStatement),
    ("business", "plan", DocumentType::BusinessPlan),
    ("collateral", "", DocumentType::CollateralDocs),
    ("profit", "loss", DocumentType::ProfitAndLoss),
    ("balance", "sheet", DocumentType::BalanceSheet),
    ("supplier", "agreement", DocumentType::SupplierAgreement),
    ("driver", "license", DocumentType::DriversLicenseFrontBack),
    ("proof", "identity", DocumentType::ProofOfIdentity),
    ("signed", "application", DocumentType::SignedApplication),
];

impl DocumentType {
    pub const ALL: [DocumentType; 22] = [
        DocumentType::AccountsPayable,
        DocumentType::AccountsReceivable,
        DocumentType::AccountantFinancials,
        DocumentType::ArticlesOfIncorporation,
        DocumentType::BalanceSheet,
        DocumentType::BankStatements,
        DocumentType::BusinessLicense,
        DocumentType::BusinessPlan,
        DocumentType::CashFlowStatement,
        DocumentType::CollateralDocs,
        DocumentType::DriversLicenseFrontBack,
        DocumentType::EquipmentQuote,
        DocumentType::InvoiceSamples,
        DocumentType::Other,
        DocumentType::PersonalFinancials,
        DocumentType::PersonalGuarantee,
        DocumentType::ProfitAndLoss,
        DocumentType::ProofOfIdentity,
        DocumentType::SignedApplication,
        DocumentType::SupplierAgreement,
        DocumentType::TaxReturns,
        DocumentType::VoidCheque,
    ];

    /// Wire tag sent as `documentType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::AccountsPayable => "accounts_payable",
            DocumentType::AccountsReceivable => "accounts_receivable",
            DocumentType::AccountantFinancials => "accountant_financials",
            DocumentType::ArticlesOfIncorporation => "articles_of_incorporation",
            DocumentType::BalanceSheet => "balance_sheet",
            DocumentType::BankStatements => "bank_statements",
            DocumentType::BusinessLicense => "business_license",
            DocumentType::BusinessPlan => "business_plan",
            DocumentType::CashFlowStatement => "cash_flow_statement",
            DocumentType::CollateralDocs => "collateral_docs",
            DocumentType::DriversLicenseFrontBack => "drivers_license_front_back",
            DocumentType::EquipmentQuote => "equipment_quote",
            DocumentType::InvoiceSamples => "invoice_samples",
            DocumentType::Other => "other",
            DocumentType::PersonalFinancials => "personal_financials",
            DocumentType::PersonalGuarantee => "personal_guarantee",
            DocumentType::ProfitAndLoss => "profit_and_loss",
            DocumentType::ProofOfIdentity => "proof_of_identity",
            DocumentType::SignedApplication => "signed_application",
            DocumentType::SupplierAgreement => "supplier_agreement",
            DocumentType::TaxReturns => "tax_returns",
            DocumentType::VoidCheque => "void_cheque",
        }
    }

    /// Display label, e.g. "Bank Statements".
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::AccountsPayable => "Accounts Payable",
            DocumentType::AccountsReceivable => "Accounts Receivable",
            DocumentType::AccountantFinancials => "Accountant Prepared Financial Statements",
            DocumentType::ArticlesOfIncorporation => "Articles of Incorporation",
            DocumentType::BalanceSheet => "Balance Sheet",
            DocumentType::BankStatements => "Bank Statements",
            DocumentType::BusinessLicense => "Business License",
            DocumentType::BusinessPlan => "Business Plan",
            DocumentType::CashFlowStatement => "Cash Flow Statement",
            DocumentType::CollateralDocs => "Collateral Documents",
            DocumentType::DriversLicenseFrontBack => "Driver's License (Front & Back)",
            DocumentType::EquipmentQuote => "Equipment Quote",
            DocumentType::InvoiceSamples => "Invoice Samples",
            DocumentType::Other => "Other Documents",
            DocumentType::PersonalFinancials => "Personal Financial Statement",
            DocumentType::PersonalGuarantee => "Personal Guarantee",
            DocumentType::ProfitAndLoss => "Profit & Loss Statement",
            DocumentType::ProofOfIdentity => "Proof of Identity",
            DocumentType::SignedApplication => "Signed Application",
            DocumentType::SupplierAgreement => "Supplier Agreement",
            DocumentType::TaxReturns => "Tax Returns",
            DocumentType::VoidCheque => "Void Cheque",
        }
    }

    /// Map a free-text label or legacy tag to a backend tag. Never fails:
    /// anything unrecognised becomes [`DocumentType::Other`].
    pub fn from_label(label: &str) -> DocumentType {
        let normalized = label.trim().to_lowercase();

        if let Ok(exact) = normalized.replace(' ', "_").parse::<DocumentType>() {
            return exact;
        }
        if let Some((_, doc_type)) = ALIASES.iter().find(|(alias, _)| *alias == normalized) {
            return *doc_type;
        }
        if let Some(exact) = DocumentType::ALL
            .iter()
            .find(|t| t.label().to_lowercase() == normalized)
        {
            return *exact;
        }

        KEYWORD_FALLBACKS
            .iter()
            .find(|(first, second, _)| normalized.contains(first) && normalized.contains(second))
            .map(|(_, _, doc_type)| *doc_type)
            .unwrap_or(DocumentType::Other)
    }
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    /// Exact backend tag only; use [`DocumentType::from_label`] for free text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown document type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip_through_from_str() {
        for doc_type in DocumentType::ALL {
            assert_eq!(doc_type.as_str().parse::<DocumentType>(), Ok(doc_type));
        }
        assert!("bank statements".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_tag() {
        let json = serde_json::to_string(&DocumentType::ProfitAndLoss).unwrap();
        assert_eq!(json, "\"profit_and_loss\"");
    }

    #[test]
    fn test_from_label_exact_and_display_labels() {
        assert_eq!(
            DocumentType::from_label("Bank Statements"),
            DocumentType::BankStatements
        );
        assert_eq!(DocumentType::from_label("tax_returns"), DocumentType::TaxReturns);
        assert_eq!(
            DocumentType::from_label("  Void Cheque "),
            DocumentType::VoidCheque
        );
    }

    #[test]
    fn test_from_label_aliases() {
        assert_eq!(
            DocumentType::from_label("Bank Statements (6 months)"),
            DocumentType::BankStatements
        );
        assert_eq!(
            DocumentType::from_label("Financial Statements"),
            DocumentType::AccountantFinancials
        );
        assert_eq!(
            DocumentType::from_label("Income Statement"),
            DocumentType::ProfitAndLoss
        );
        assert_eq!(
            DocumentType::from_label("void_pad"),
            DocumentType::VoidCheque
        );
    }

    #[test]
    fn test_from_label_keyword_fallbacks() {
        assert_eq!(
            DocumentType::from_label("Last 6 months of bank statements"),
            DocumentType::BankStatements
        );
        assert_eq!(
            DocumentType::from_label("Owner personal financial statement 2024"),
            DocumentType::PersonalFinancials
        );
        assert_eq!(
            DocumentType::from_label("Signed copy of the application"),
            DocumentType::SignedApplication
        );
        assert_eq!(DocumentType::from_label("photo of my cat"), DocumentType::Other);
    }
}
