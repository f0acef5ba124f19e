use serde::Deserialize;

/// Wire shape of a single record in vendor T's JSON quote array. Field
/// names follow the vendor's own abbreviations; `Quote` construction in
/// [`super::parser`] is where they get human-readable names.
#[derive(Debug, Clone, Deserialize)]
pub struct TRecord {
    pub code: String,
    pub name: String,
    pub price: f64,
    pub pre_close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    pub amount: f64,
    #[serde(default)]
    pub bid_p: [f64; 5],
    #[serde(default)]
    pub bid_v: [u64; 5],
    #[serde(default)]
    pub ask_p: [f64; 5],
    #[serde(default)]
    pub ask_v: [u64; 5],
    #[serde(default)]
    pub inner_disc: u64,
    #[serde(default)]
    pub outer_disc: u64,
    #[serde(default)]
    pub pe: f64,
    #[serde(default)]
    pub pb: f64,
    #[serde(default)]
    pub turnover_rate: f64,
    #[serde(default)]
    pub circulation: f64,
    #[serde(default)]
    pub market_value: f64,
    #[serde(default)]
    pub limit_up: f64,
    #[serde(default)]
    pub limit_down: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TResponse {
    pub data: Vec<TRecord>,
}
