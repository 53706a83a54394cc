//! Finance records as served by the backend.
//!
//! All amounts are computed server-side (local currency conversion, interest
//! accrual); the client only carries them.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A decimal amount, kept as the backend's textual representation.
///
/// Django serializes decimals as strings in model payloads but aggregate
/// totals can come back as bare numbers (e.g. `0`), so both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Amount(String);

impl Amount {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lossy numeric value for display arithmetic.
    pub fn to_f64(&self) -> Option<f64> {
        self.0.trim().parse().ok()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Amount(s),
            Raw::Number(n) => Amount(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default, skip_serializing)]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub modified_by: Option<String>,
    #[serde(default, skip_serializing)]
    pub modified_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Currency code
    pub currency: String,
    pub rate: Amount,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default, skip_serializing)]
    pub currency_description: Option<String>,
    #[serde(default, skip_serializing)]
    pub currency_is_local: Option<bool>,
    #[serde(default, skip_serializing)]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestType {
    pub code: String,
    pub description: String,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub modified_by: Option<String>,
}

/// An earned, portfolio or passive income line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub income_name: String,
    /// Currency code
    pub currency: String,
    pub amount: Amount,
    #[serde(default)]
    pub notes: Option<String>,
    /// Amount in local currency, formatted by the backend
    #[serde(default, skip_serializing)]
    pub amount_lcy_display: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub modified_by: Option<String>,
    #[serde(default, skip_serializing)]
    pub modified_at: Option<String>,
}

/// A fixed, variable or discretionary expense line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub expense_name: String,
    pub currency: String,
    pub amount: Amount,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, skip_serializing)]
    pub amount_lcy_display: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub modified_by: Option<String>,
    #[serde(default, skip_serializing)]
    pub modified_at: Option<String>,
}

/// A liquid asset, equity, investment account or retirement account.
///
/// The four asset collections share one shape. Liquid assets carry a
/// `source` and `name`, equities a `name` and `ratio`, investment accounts a
/// `name`, and retirement accounts a `name` and `employer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer: Option<String>,
    pub currency: String,
    pub amount: Amount,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, skip_serializing)]
    pub amount_lcy_display: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub modified_by: Option<String>,
    #[serde(default, skip_serializing)]
    pub modified_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub source: String,
    pub loan_date: String,
    pub currency: String,
    pub amount_taken: Amount,
    #[serde(default)]
    pub reason: Option<String>,
    /// Interest type code
    pub interest_type: String,
    #[serde(default)]
    pub compound_frequency: Option<String>,
    pub repayment_date: String,
    pub interest_rate: Amount,
    #[serde(default)]
    pub amount_paid: Option<Amount>,
    #[serde(default, skip_serializing)]
    pub interest: Option<Amount>,
    #[serde(default, skip_serializing)]
    pub amount_repay: Option<Amount>,
    #[serde(default, skip_serializing)]
    pub due_balance: Option<Amount>,
    #[serde(default, skip_serializing)]
    pub in_default: Option<bool>,
    #[serde(default, skip_serializing)]
    pub due_balance_lcy_display: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocalCurrency {
    pub local_currency_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IncomeTotals {
    pub total_income: Amount,
    #[serde(default)]
    pub earned_income: Amount,
    #[serde(default)]
    pub portfolio_income: Amount,
    #[serde(default)]
    pub passive_income: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssetTotals {
    pub total_assets: Amount,
    #[serde(default)]
    pub liquid_assets: Amount,
    #[serde(default)]
    pub equities: Amount,
    #[serde(default)]
    pub investment_accounts: Amount,
    #[serde(default)]
    pub retirement_accounts: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExpenseTotals {
    pub total_expenses: Amount,
    #[serde(default)]
    pub fixed_expenses: Amount,
    #[serde(default)]
    pub variable_expenses: Amount,
    #[serde(default)]
    pub discretionary_expenses: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LiabilityTotals {
    pub total_liabilities: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_accepts_string_and_number() {
        let totals: IncomeTotals = serde_json::from_str(
            r#"{"total_income": "1500.50", "earned_income": 0, "portfolio_income": "1500.50", "passive_income": 0}"#,
        )
        .unwrap();
        assert_eq!(totals.total_income.as_str(), "1500.50");
        assert_eq!(totals.earned_income.as_str(), "0");
        assert_eq!(totals.total_income.to_f64(), Some(1500.5));
    }

    #[test]
    fn test_amount_serializes_as_string() {
        let rate = ExchangeRate {
            id: None,
            currency: "USD".to_string(),
            rate: Amount::new("3.75"),
            is_current: true,
            currency_description: Some("US Dollar".to_string()),
            currency_is_local: None,
            created_by: None,
            created_at: None,
        };
        let value = serde_json::to_value(&rate).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"currency": "USD", "rate": "3.75", "is_current": true})
        );
    }

    #[test]
    fn test_retirement_account_keeps_only_its_fields() {
        let account: Asset = serde_json::from_str(
            r#"{"id": 4, "name": "401k", "employer": "Acme", "currency": "USD", "amount": 2500, "notes": "", "amount_lcy_display": "USD 2,500.00", "created_by": "ada", "modified_at": "2024-01-02T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(account.employer.as_deref(), Some("Acme"));
        assert_eq!(account.amount.as_str(), "2500");
        assert_eq!(account.source, None);

        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 4,
                "name": "401k",
                "employer": "Acme",
                "currency": "USD",
                "amount": "2500",
                "notes": ""
            })
        );
    }

    #[test]
    fn test_equity_ratio_round_trips_as_string() {
        let equity: Asset = serde_json::from_str(
            r#"{"name": "ACME", "ratio": "0.25", "currency": "USD", "amount": "400.00"}"#,
        )
        .unwrap();
        assert_eq!(equity.ratio.as_ref().map(Amount::as_str), Some("0.25"));
        assert_eq!(equity.notes, None);
        assert_eq!(serde_json::to_value(&equity).unwrap()["ratio"], "0.25");
    }

    #[test]
    fn test_income_skips_read_only_fields() {
        let income: Income = serde_json::from_str(
            r#"{"id": 1, "income_name": "Salary", "currency": "USD", "amount": "100.00", "notes": null, "amount_lcy_display": "USD 100.00", "created_by": "ada"}"#,
        )
        .unwrap();
        assert_eq!(income.amount_lcy_display.as_deref(), Some("USD 100.00"));

        let value = serde_json::to_value(&income).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": 1, "income_name": "Salary", "currency": "USD", "amount": "100.00", "notes": null})
        );
    }

    #[test]
    fn test_parse_expense() {
        let expense: Expense = serde_json::from_str(
            r#"{"id": 2, "expense_name": "Rent", "currency": "USD", "amount": 900}"#,
        )
        .unwrap();
        assert_eq!(expense.expense_name, "Rent");
        assert_eq!(expense.amount, Amount::new("900"));
        assert_eq!(expense.notes, None);
    }

    #[test]
    fn test_parse_loan() {
        let json = r#"{
            "source": "Bank", "loan_date": "2024-01-01", "currency": "USD",
            "amount_taken": "1000.00", "reason": "Car", "interest_type": "SIMPLE",
            "compound_frequency": null, "repayment_date": "2025-01-01",
            "interest_rate": "5.00", "interest": "50.00", "in_default": false,
            "created_by": 1, "amount_repay": "1050.00", "amount_paid": "0.00",
            "due_balance": "1050.00", "due_balance_lcy_display": "USD 1050.00"
        }"#;
        let loan: Loan = serde_json::from_str(json).unwrap();
        assert_eq!(loan.due_balance, Some(Amount::new("1050.00")));
        assert_eq!(loan.in_default, Some(false));
    }
}
