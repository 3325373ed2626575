// -----------------------------------------------------------------------------
// Ccy
// -----------------------------------------------------------------------------
/// The fixed set of currency identifiers offered by the selection prompt.
///
/// Upstream quote payloads key currencies in lower case; parsing is
/// case-insensitive so those keys map onto this set directly.
///
/// ```
/// use pxfx::Ccy;
///
/// let ccy: Ccy = "eur".parse().unwrap();
/// assert_eq!(ccy, Ccy::EUR);
/// assert_eq!(ccy.to_string(), "EUR");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(ascii_case_insensitive)]
pub enum Ccy {
    ARS,
    AUD,
    BGN,
    BRL,
    BTC,
    CAD,
    CHF,
    CLP,
    CNY,
    CZK,
    DKK,
    EGP,
    EUR,
    GBP,
    HKD,
    HRK,
    HUF,
    IDR,
    ILS,
    INR,
    ISK,
    JPY,
    KRW,
    MXN,
    MYR,
    NAD,
    NOK,
    NZD,
    PHP,
    PLN,
    RON,
    RUB,
    SEK,
    SGD,
    THB,
    TRY,
    TWD,
    UAH,
    XAG,
    XAU,
    XDR,
    XPD,
    XPT,
    ZAR,
    USD,
}

impl Ccy {
    /// The lower-cased form used in upstream quote URLs and payload keys.
    #[inline]
    pub fn lower(&self) -> String {
        self.to_string().to_ascii_lowercase()
    }
}
