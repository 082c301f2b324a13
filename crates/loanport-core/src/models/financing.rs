use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::document_type::DocumentType;

/// Financing product families offered through the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancingCategory {
    LineOfCredit,
    TermLoan,
    EquipmentFinancing,
    InvoiceFactoring,
    WorkingCapital,
    PurchaseOrderFinancing,
    AssetBasedLending,
    SbaLoan,
}

impl FinancingCategory {
    pub const ALL: [FinancingCategory; 8] = [
        FinancingCategory::LineOfCredit,
        FinancingCategory::TermLoan,
        FinancingCategory::EquipmentFinancing,
        FinancingCategory::InvoiceFactoring,
        FinancingCategory::WorkingCapital,
        FinancingCategory::PurchaseOrderFinancing,
        FinancingCategory::AssetBasedLending,
        FinancingCategory::SbaLoan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FinancingCategory::LineOfCredit => "line_of_credit",
            FinancingCategory::TermLoan => "term_loan",
            FinancingCategory::EquipmentFinancing => "equipment_financing",
            FinancingCategory::InvoiceFactoring => "invoice_factoring",
            FinancingCategory::WorkingCapital => "working_capital",
            FinancingCategory::PurchaseOrderFinancing => "purchase_order_financing",
            FinancingCategory::AssetBasedLending => "asset_based_lending",
            FinancingCategory::SbaLoan => "sba_loan",
        }
    }

    /// Documents a lender expects for this product, in display order.
    pub fn required_documents(&self) -> &'static [DocumentType] {
        use DocumentType::*;

        match self {
            FinancingCategory::LineOfCredit => &[
                BankStatements,
                TaxReturns,
                AccountantFinancials,
                BusinessLicense,
                ArticlesOfIncorporation,
                AccountsReceivable,
                CashFlowStatement,
                PersonalGuarantee,
            ],
            FinancingCategory::TermLoan => &[
                BankStatements,
                TaxReturns,
                AccountantFinancials,
                BusinessLicense,
                ArticlesOfIncorporation,
                BusinessPlan,
                PersonalFinancials,
                CollateralDocs,
            ],
            FinancingCategory::EquipmentFinancing => &[
                BankStatements,
                TaxReturns,
                AccountantFinancials,
                BusinessLicense,
                ArticlesOfIncorporation,
                EquipmentQuote,
                CollateralDocs,
            ],
            FinancingCategory::InvoiceFactoring => &[
                BankStatements,
                TaxReturns,
                AccountantFinancials,
                BusinessLicense,
                ArticlesOfIncorporation,
                InvoiceSamples,
                AccountsReceivable,
            ],
            FinancingCategory::WorkingCapital => &[
                BankStatements,
                TaxReturns,
                AccountantFinancials,
                BusinessLicense,
                ArticlesOfIncorporation,
                AccountsReceivable,
                CashFlowStatement,
            ],
            FinancingCategory::PurchaseOrderFinancing => &[
                BankStatements,
                TaxReturns,
                AccountantFinancials,
                BusinessLicense,
                ArticlesOfIncorporation,
                SupplierAgreement,
            ],
            FinancingCategory::AssetBasedLending => &[
                BankStatements,
                TaxReturns,
                AccountantFinancials,
                BusinessLicense,
                ArticlesOfIncorporation,
                CollateralDocs,
                AccountsReceivable,
            ],
            FinancingCategory::SbaLoan => &[
                BankStatements,
                TaxReturns,
                AccountantFinancials,
                BusinessLicense,
                ArticlesOfIncorporation,
                BusinessPlan,
                PersonalFinancials,
                PersonalGuarantee,
            ],
        }
    }
}

impl Display for FinancingCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FinancingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        FinancingCategory::ALL
            .iter()
            .find(|c| c.as_str() == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown financing category: {}", s))
    }
}
