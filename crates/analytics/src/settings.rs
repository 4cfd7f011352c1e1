use xirr::XirrSolver;

/// Engine-wide knobs the builders are constructed with.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSettings {
    /// Reporting currency; FX pairs are looked up as `CCY-BASE`.
    pub base_currency: String,
    /// Book that trades and positions with an empty `book` belong to.
    pub default_book: String,
    /// Days of slack on either side of a price-series fetch.
    pub price_padding_days: i64,
    pub solver: XirrSolver,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            base_currency: "SGD".to_string(),
            default_book: "Default".to_string(),
            price_padding_days: 5,
            solver: XirrSolver::default(),
        }
    }
}

impl AnalyticsSettings {
    pub fn new(base_currency: impl Into<String>, default_book: impl Into<String>) -> Self {
        Self {
            base_currency: base_currency.into().to_ascii_uppercase(),
            default_book: default_book.into(),
            ..Self::default()
        }
    }

    pub fn with_padding_days(mut self, days: i64) -> Self {
        self.price_padding_days = days;
        self
    }

    pub fn with_solver(mut self, solver: XirrSolver) -> Self {
        self.solver = solver;
        self
    }
}
