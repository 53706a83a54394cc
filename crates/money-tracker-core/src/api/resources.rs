//! Finance resource endpoints.
//!
//! Every collection on the backend is a DRF viewset with the same list /
//! retrieve / create / update / destroy shape, so one set of generic methods
//! covers them all.

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{AssetTotals, ExpenseTotals, IncomeTotals, LiabilityTotals, LocalCurrency};

use super::{ApiError, ApiRequest, SessionClient};

const LOCAL_CURRENCY_PATH: &str = "/api/currencies/get-localcurrency/";
const TOTAL_INCOME_PATH: &str = "/api/income/totalincome/";
const TOTAL_ASSETS_PATH: &str = "/api/assets/totalassets/";
const TOTAL_EXPENSES_PATH: &str = "/api/expenses/totalexpenses/";
const TOTAL_LIABILITIES_PATH: &str = "/api/liabilities/totalliabilities/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    EarnedIncome,
    PortfolioIncome,
    PassiveIncome,
    LiquidAssets,
    Equities,
    InvestmentAccounts,
    RetirementAccounts,
    FixedExpenses,
    VariableExpenses,
    DiscretionaryExpenses,
    Loans,
    InterestTypes,
    Currencies,
    ExchangeRates,
}

impl Resource {
    pub const ALL: [Resource; 14] = [
        Resource::EarnedIncome,
        Resource::PortfolioIncome,
        Resource::PassiveIncome,
        Resource::LiquidAssets,
        Resource::Equities,
        Resource::InvestmentAccounts,
        Resource::RetirementAccounts,
        Resource::FixedExpenses,
        Resource::VariableExpenses,
        Resource::DiscretionaryExpenses,
        Resource::Loans,
        Resource::InterestTypes,
        Resource::Currencies,
        Resource::ExchangeRates,
    ];

    pub fn collection_path(&self) -> &'static str {
        match self {
            Resource::EarnedIncome => "/api/income/earnedincome/",
            Resource::PortfolioIncome => "/api/income/portfolioincome/",
            Resource::PassiveIncome => "/api/income/passiveincome/",
            Resource::LiquidAssets => "/api/assets/liquidassets/",
            Resource::Equities => "/api/assets/equities/",
            Resource::InvestmentAccounts => "/api/assets/investmentaccounts/",
            Resource::RetirementAccounts => "/api/assets/retirementaccounts/",
            Resource::FixedExpenses => "/api/expenses/fixedexpenses/",
            Resource::VariableExpenses => "/api/expenses/variableexpenses/",
            Resource::DiscretionaryExpenses => "/api/expenses/discretionaryexpenses/",
            Resource::Loans => "/api/liabilities/loans/",
            Resource::InterestTypes => "/api/liabilities/interesttypes/",
            Resource::Currencies => "/api/currencies/currencies/",
            Resource::ExchangeRates => "/api/currencies/exchangerates/",
        }
    }

    /// Path of a single record. Currencies and interest types are keyed by
    /// code, everything else by numeric id.
    pub fn detail_path(&self, id: impl fmt::Display) -> String {
        format!("{}{}/", self.collection_path(), id)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Resource::EarnedIncome => "Earned Income",
            Resource::PortfolioIncome => "Portfolio Income",
            Resource::PassiveIncome => "Passive Income",
            Resource::LiquidAssets => "Liquid Assets",
            Resource::Equities => "Equities",
            Resource::InvestmentAccounts => "Investment Accounts",
            Resource::RetirementAccounts => "Retirement Accounts",
            Resource::FixedExpenses => "Fixed Expenses",
            Resource::VariableExpenses => "Variable Expenses",
            Resource::DiscretionaryExpenses => "Discretionary Expenses",
            Resource::Loans => "Loans",
            Resource::InterestTypes => "Interest Types",
            Resource::Currencies => "Currencies",
            Resource::ExchangeRates => "Exchange Rates",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Dashboard aggregates. Each part is fetched independently, so one failing
/// endpoint does not hide the others.
#[derive(Debug)]
pub struct Dashboard {
    pub local_currency: Result<LocalCurrency, ApiError>,
    pub income: Result<IncomeTotals, ApiError>,
    pub assets: Result<AssetTotals, ApiError>,
    pub expenses: Result<ExpenseTotals, ApiError>,
    pub liabilities: Result<LiabilityTotals, ApiError>,
}

impl Dashboard {
    pub fn is_complete(&self) -> bool {
        self.errors().is_empty()
    }

    pub fn errors(&self) -> Vec<&ApiError> {
        [
            self.local_currency.as_ref().err(),
            self.income.as_ref().err(),
            self.assets.as_ref().err(),
            self.expenses.as_ref().err(),
            self.liabilities.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl SessionClient {
    pub async fn list<T: DeserializeOwned>(&self, resource: Resource) -> Result<Vec<T>, ApiError> {
        debug!(resource = %resource, "Listing records");
        self.get(resource.collection_path()).await
    }

    pub async fn retrieve<T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: impl fmt::Display,
    ) -> Result<T, ApiError> {
        self.get(&resource.detail_path(id)).await
    }

    pub async fn create<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        resource: Resource,
        body: &B,
    ) -> Result<T, ApiError> {
        self.post(resource.collection_path(), body).await
    }

    /// Replace a record (PUT).
    pub async fn update<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        resource: Resource,
        id: impl fmt::Display,
        body: &B,
    ) -> Result<T, ApiError> {
        self.put(&resource.detail_path(id), body).await
    }

    pub async fn destroy(&self, resource: Resource, id: impl fmt::Display) -> Result<(), ApiError> {
        self.delete(&resource.detail_path(id)).await
    }

    /// Fetch all dashboard aggregates concurrently.
    pub async fn dashboard(&self) -> Dashboard {
        let (local_currency, income, assets, expenses, liabilities) = tokio::join!(
            self.send_json(ApiRequest::get(LOCAL_CURRENCY_PATH)),
            self.send_json(ApiRequest::get(TOTAL_INCOME_PATH)),
            self.send_json(ApiRequest::get(TOTAL_ASSETS_PATH)),
            self.send_json(ApiRequest::get(TOTAL_EXPENSES_PATH)),
            self.send_json(ApiRequest::get(TOTAL_LIABILITIES_PATH)),
        );

        let dashboard = Dashboard {
            local_currency,
            income,
            assets,
            expenses,
            liabilities,
        };
        if !dashboard.is_complete() {
            warn!(failed = dashboard.errors().len(), "Dashboard partially loaded");
        }
        dashboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_paths_are_unique_and_slash_terminated() {
        let paths: HashSet<&str> = Resource::ALL.iter().map(|r| r.collection_path()).collect();
        assert_eq!(paths.len(), Resource::ALL.len());
        for path in paths {
            assert!(path.starts_with("/api/") && path.ends_with('/'), "{}", path);
        }
    }

    #[test]
    fn test_detail_path() {
        assert_eq!(Resource::Loans.detail_path(12), "/api/liabilities/loans/12/");
        assert_eq!(
            Resource::Currencies.detail_path("USD"),
            "/api/currencies/currencies/USD/"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Resource::DiscretionaryExpenses.to_string(), "Discretionary Expenses");
    }
}
