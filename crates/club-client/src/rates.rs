//! Delivery fee lookup.
//!
//! Rates come from three places, tried in order:
//! 1. rates rendered into the page ([`PageRates`], from the configuration),
//! 2. rates fetched from [`RATES_ENDPOINT`],
//! 3. the static defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ironhtml::typed::Element;
use ironhtml_elements::{Div, Span};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::api::{with_timeout, ApiClient, BoxFuture};
use crate::config::ApiSection;
use crate::error::{ClientError, Result};

/// Endpoint serving the current rates.
pub const RATES_ENDPOINT: &str = "/api/packages/rates/dynamic";
/// Id of the fee display node.
pub const FEE_DISPLAY_ID: &str = "packageTypeFeeDisplay";

/// Kind of package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    /// Up to 30x30x30 cm.
    Normal,
    /// Anything bigger.
    ExtraDimensioned,
}

impl PackageType {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::ExtraDimensioned => "extra_dimensioned",
        }
    }

    /// Label shown next to the fee.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Normal => "Normal (30x30x30cm)",
            Self::ExtraDimensioned => "Extra Dimensionado",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(Self::Normal),
            "extra_dimensioned" => Ok(Self::ExtraDimensioned),
            other => Err(ClientError::UnknownPackageType(other.to_string())),
        }
    }
}

/// A complete rate table, in COP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rates {
    /// Base fee of a normal package.
    pub normal: u64,
    /// Base fee of an extra-dimensioned package.
    pub extra_dimensioned: u64,
    /// Storage fee per day.
    pub storage_per_day: u64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            normal: 1500,
            extra_dimensioned: 2000,
            storage_per_day: 1000,
        }
    }
}

impl Rates {
    /// Base fee of a package type.
    pub const fn base_fee(&self, package_type: PackageType) -> u64 {
        match package_type {
            PackageType::Normal => self.normal,
            PackageType::ExtraDimensioned => self.extra_dimensioned,
        }
    }
}

/// Rates rendered into the page. Any entry may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_dimensioned: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_per_day: Option<u64>,
}

impl PageRates {
    fn base_fee(&self, package_type: PackageType) -> Option<u64> {
        match package_type {
            PackageType::Normal => self.normal,
            PackageType::ExtraDimensioned => self.extra_dimensioned,
        }
    }
}

/// Body of the rates endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatesEnvelope {
    /// Whether the backend could produce rates.
    #[serde(default)]
    pub success: bool,
    /// The rates.
    #[serde(default)]
    pub rates: Option<Rates>,
}

/// Somewhere rates can be fetched from.
pub trait RateSource: Send + Sync {
    /// Fetches the current rates.
    fn fetch(&self) -> BoxFuture<'_, Result<RatesEnvelope>>;
}

/// Fetches rates from [`RATES_ENDPOINT`] through an [`ApiClient`].
///
/// Each attempt is bounded by `api.timeout`; transport failures, timeouts and
/// 5xx answers are retried up to `api.retryAttempts` attempts in total.
pub struct ApiRateSource<'c> {
    client: &'c dyn ApiClient,
    timeout: Duration,
    attempts: u32,
}

impl<'c> ApiRateSource<'c> {
    /// Creates a source backed by `client` with the default API settings.
    pub fn new(client: &'c dyn ApiClient) -> Self {
        Self::from_config(client, &ApiSection::default())
    }

    /// Creates a source backed by `client` using the `api` section.
    pub fn from_config(client: &'c dyn ApiClient, api: &ApiSection) -> Self {
        Self {
            client,
            timeout: api.request_timeout(),
            attempts: api.retry_attempts.max(1),
        }
    }

    async fn fetch_once(&self) -> Result<RatesEnvelope> {
        let response = with_timeout(self.client.get(RATES_ENDPOINT), self.timeout).await?;
        if !response.is_success() {
            return Err(ClientError::Status(response.status));
        }
        let body = response.body.unwrap_or_default();
        Ok(serde_json::from_value(body)?)
    }
}

impl RateSource for ApiRateSource<'_> {
    fn fetch(&self) -> BoxFuture<'_, Result<RatesEnvelope>> {
        Box::pin(async move {
            let mut attempt = 1;
            loop {
                match self.fetch_once().await {
                    Err(e) if attempt < self.attempts && is_transient(&e) => {
                        warn!(attempt, error = %e, "rate fetch failed, retrying");
                        attempt += 1;
                    }
                    result => return result,
                }
            }
        })
    }
}

fn is_transient(error: &ClientError) -> bool {
    match error {
        ClientError::Network(_) | ClientError::Timeout(_) => true,
        ClientError::Status(status) => *status >= 500,
        _ => false,
    }
}

/// Reads a rates envelope from a JSON file.
#[derive(Debug, Clone)]
pub struct FileRateSource {
    path: PathBuf,
}

impl FileRateSource {
    /// Creates a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RateSource for FileRateSource {
    fn fetch(&self) -> BoxFuture<'_, Result<RatesEnvelope>> {
        Box::pin(async move {
            let json = tokio::fs::read_to_string(&self.path).await?;
            Ok(serde_json::from_str(&json)?)
        })
    }
}

/// The rate lookup chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateBook {
    page: Option<PageRates>,
    fetched: Option<Rates>,
    defaults: Rates,
}

impl RateBook {
    /// Creates a book seeded with the page rates, if any.
    pub fn new(page: Option<PageRates>) -> Self {
        Self {
            page,
            fetched: None,
            defaults: Rates::default(),
        }
    }

    /// Returns the page rates.
    pub const fn page(&self) -> Option<&PageRates> {
        self.page.as_ref()
    }

    /// Returns the fetched rates.
    pub const fn fetched(&self) -> Option<&Rates> {
        self.fetched.as_ref()
    }

    /// Records fetched rates directly.
    pub fn set_fetched(&mut self, rates: Rates) {
        self.fetched = Some(rates);
    }

    /// Base fee of a package type.
    ///
    /// Page rates win; a missing or zero page entry falls back to the default
    /// for that type, not to the fetched rates.
    pub fn rate_for(&self, package_type: PackageType) -> u64 {
        if let Some(page) = &self.page {
            return page
                .base_fee(package_type)
                .filter(|fee| *fee > 0)
                .unwrap_or_else(|| self.defaults.base_fee(package_type));
        }

        if let Some(fetched) = &self.fetched {
            return fetched.base_fee(package_type);
        }

        warn!(%package_type, "rates not loaded, using defaults");
        self.defaults.base_fee(package_type)
    }

    /// Storage fee per day: fetched, else page, else default.
    pub fn storage_per_day(&self) -> u64 {
        self.fetched
            .map(|r| r.storage_per_day)
            .or_else(|| self.page.as_ref().and_then(|p| p.storage_per_day))
            .filter(|fee| *fee > 0)
            .unwrap_or(self.defaults.storage_per_day)
    }

    /// Fetches rates from `source`. A failure is logged and leaves the book
    /// unchanged. Returns whether new rates were recorded.
    pub async fn load(&mut self, source: &dyn RateSource) -> bool {
        info!("loading dynamic rates");
        match source.fetch().await {
            Ok(RatesEnvelope {
                success: true,
                rates: Some(rates),
            }) => {
                info!(
                    normal = rates.normal,
                    extra_dimensioned = rates.extra_dimensioned,
                    storage_per_day = rates.storage_per_day,
                    "dynamic rates loaded"
                );
                self.fetched = Some(rates);
                true
            }
            Ok(envelope) => {
                error!(?envelope, "rate endpoint reported a failure");
                false
            }
            Err(e) => {
                error!(error = %e, "cannot fetch dynamic rates");
                false
            }
        }
    }

    /// Builds the fee display for a selected package type, fetching rates
    /// first when none were fetched yet.
    pub async fn fee_display(
        &mut self,
        selected: PackageType,
        source: &dyn RateSource,
    ) -> FeeDisplay {
        if self.fetched.is_none() {
            self.load(source).await;
        }
        let fee = FeeDisplay {
            package_type: selected,
            base_fee: self.rate_for(selected),
            description: selected.description().to_string(),
            storage_per_day: self.storage_per_day(),
        };
        info!(%selected, base_fee = fee.base_fee, "fee selected");
        fee
    }
}

/// What the fee box shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeDisplay {
    pub package_type: PackageType,
    pub base_fee: u64,
    pub description: String,
    pub storage_per_day: u64,
}

impl FeeDisplay {
    /// Renders the fee box. A zero fee renders hidden.
    pub fn render(&self) -> String {
        if self.base_fee == 0 {
            return Element::<Div>::new()
                .id(FEE_DISPLAY_ID)
                .attr("style", "display: none")
                .render();
        }

        let storage = format!(
            "* Se agregarán {}/día de almacenamiento si aplica",
            format_cop(self.storage_per_day)
        );

        Element::<Div>::new()
            .id(FEE_DISPLAY_ID)
            .class("fee-display")
            .attr("data-package-type", self.package_type.as_str())
            .child::<Div, _>(|row| {
                row.class("fee-display-header")
                    .child::<Div, _>(|d| {
                        d.child::<Span, _>(|s| {
                            s.class("fee-display-title").text("Tarifa Base de Entrega")
                        })
                        .child::<Div, _>(|d| {
                            d.class("fee-display-description").text(&self.description)
                        })
                    })
                    .child::<Div, _>(|d| {
                        d.class("fee-display-amount").text(format_cop(self.base_fee))
                    })
            })
            .child::<Div, _>(|d| d.class("fee-display-note").text(storage))
            .render()
    }
}

/// Formats an amount of pesos with `.` thousands separators, e.g. `$1.500`.
pub fn format_cop(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("${grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<RatesEnvelope>);

    impl RateSource for Fixed {
        fn fetch(&self) -> BoxFuture<'_, Result<RatesEnvelope>> {
            let result = match &self.0 {
                Ok(envelope) => Ok(envelope.clone()),
                Err(e) => Err(ClientError::Network(e.to_string())),
            };
            Box::pin(async move { result })
        }
    }

    fn fetched(normal: u64, extra: u64) -> Fixed {
        Fixed(Ok(RatesEnvelope {
            success: true,
            rates: Some(Rates {
                normal,
                extra_dimensioned: extra,
                storage_per_day: 1200,
            }),
        }))
    }

    #[test]
    fn test_parse_package_type() {
        assert_eq!("normal".parse::<PackageType>().unwrap(), PackageType::Normal);
        assert_eq!(
            "extra_dimensioned".parse::<PackageType>().unwrap(),
            PackageType::ExtraDimensioned
        );
        assert!(matches!(
            "huge".parse::<PackageType>(),
            Err(ClientError::UnknownPackageType(_))
        ));
    }

    #[test]
    fn test_defaults_last() {
        let book = RateBook::default();
        assert_eq!(book.rate_for(PackageType::Normal), 1500);
        assert_eq!(book.rate_for(PackageType::ExtraDimensioned), 2000);
        assert_eq!(book.storage_per_day(), 1000);
    }

    #[test]
    fn test_page_rates_win() {
        let mut book = RateBook::new(Some(PageRates {
            normal: Some(1800),
            extra_dimensioned: Some(0),
            storage_per_day: None,
        }));
        book.set_fetched(Rates {
            normal: 1700,
            extra_dimensioned: 2600,
            storage_per_day: 900,
        });
        assert_eq!(book.rate_for(PackageType::Normal), 1800);
        assert_eq!(book.rate_for(PackageType::ExtraDimensioned), 2000);
        assert_eq!(book.storage_per_day(), 900);
    }

    #[tokio::test]
    async fn test_load_fetched_rates() {
        let mut book = RateBook::default();
        assert!(book.load(&fetched(1600, 2400)).await);
        assert_eq!(book.rate_for(PackageType::ExtraDimensioned), 2400);
        assert_eq!(book.storage_per_day(), 1200);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_book_unchanged() {
        let mut book = RateBook::default();
        book.set_fetched(Rates::default());
        let before = book.clone();

        assert!(!book.load(&Fixed(Ok(RatesEnvelope::default()))).await);
        assert!(!book.load(&Fixed(Err(ClientError::Network("offline".into())))).await);
        assert_eq!(book, before);
    }

    #[tokio::test]
    async fn test_fee_display_loads_once() {
        let mut book = RateBook::default();
        let display = book.fee_display(PackageType::Normal, &fetched(1650, 2200)).await;
        assert_eq!(display.base_fee, 1650);
        assert_eq!(display.description, "Normal (30x30x30cm)");

        let again = book.fee_display(PackageType::ExtraDimensioned, &fetched(1, 1)).await;
        assert_eq!(again.base_fee, 2200);
    }

    #[test]
    fn test_render() {
        let display = FeeDisplay {
            package_type: PackageType::ExtraDimensioned,
            base_fee: 12_500,
            description: PackageType::ExtraDimensioned.description().to_string(),
            storage_per_day: 1000,
        };
        let html = display.render();
        assert!(html.contains("$12.500"));
        assert!(html.contains("Extra Dimensionado"));
        assert!(html.contains("$1.000/día"));

        let hidden = FeeDisplay { base_fee: 0, ..display };
        assert!(hidden.render().contains("display: none"));
    }

    #[test]
    fn test_format_cop() {
        assert_eq!(format_cop(0), "$0");
        assert_eq!(format_cop(950), "$950");
        assert_eq!(format_cop(1500), "$1.500");
        assert_eq!(format_cop(1_234_567), "$1.234.567");
    }
}
