use crate::error::XirrError;
use chrono::NaiveDate;

const DAYS_PER_YEAR: f64 = 365.0;

/// Newton steps and bisection brackets narrower than this count as converged.
const STEP_TOLERANCE: f64 = 1e-12;

/// Below this slope a Newton step is meaningless.
const MIN_SLOPE: f64 = 1e-12;

/// Starting points for Newton-Raphson, tried in order.
const INITIAL_GUESSES: [f64; 7] = [0.1, 0.0, -0.5, 0.5, 1.0, 2.0, 5.0];

/// Grid scanned for a sign change before falling back to bisection.
const BRACKET_GRID: [f64; 14] = [
    -0.999_999, -0.99, -0.9, -0.5, 0.0, 0.5, 1.0, 2.0, 5.0, 10.0, 100.0, 1_000.0, 10_000.0,
    1_000_000.0,
];

/// Anything that can be placed on an XIRR timeline.
pub trait DatedAmount {
    fn date(&self) -> NaiveDate;
    fn amount(&self) -> f64;
}

/// A plain dated amount, for callers without their own cash-flow type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flow {
    pub date: NaiveDate,
    pub amount: f64,
}

impl Flow {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

impl DatedAmount for Flow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn amount(&self) -> f64 {
        self.amount
    }
}

impl<T: DatedAmount> DatedAmount for &T {
    fn date(&self) -> NaiveDate {
        (*self).date()
    }

    fn amount(&self) -> f64 {
        (*self).amount()
    }
}

/// Finds the annualized rate `r` for which
/// `Σ amount_i / (1 + r) ^ (days_i / 365) = 0`, where `days_i` counts from the
/// earliest flow.
///
/// Newton-Raphson is tried from several starting points; if none of them
/// settles, the solver scans for a sign change and bisects it. Input order
/// never matters: flows are sorted by date (then amount) before solving.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XirrSolver {
    /// Converged once `|NPV(r)|` drops below this.
    pub tolerance: f64,
    /// Iteration cap per Newton attempt and for the bisection fallback.
    pub max_iterations: usize,
}

impl Default for XirrSolver {
    fn default() -> Self {
        Self {
            tolerance: 1e-7,
            max_iterations: 100,
        }
    }
}

impl XirrSolver {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Solves for the annualized rate as a fraction (0.2 means 20%).
    pub fn solve<T: DatedAmount>(&self, flows: &[T]) -> Result<f64, XirrError> {
        let timeline = Timeline::prepare(flows)?;

        for guess in INITIAL_GUESSES {
            if let Some(rate) = self.newton(&timeline, guess) {
                return Ok(rate);
            }
        }

        self.bisect(&timeline).ok_or(XirrError::DidNotConverge)
    }

    fn newton(&self, timeline: &Timeline, guess: f64) -> Option<f64> {
        let mut rate = guess;

        for _ in 0..self.max_iterations {
            let (value, slope) = timeline.npv_and_slope(rate);
            if !value.is_finite() || !slope.is_finite() {
                return None;
            }
            if value.abs() < self.tolerance {
                return Some(rate);
            }
            if slope.abs() < MIN_SLOPE {
                return None;
            }

            let mut next = rate - value / slope;
            // (1 + r) must stay positive; step halfway towards -1 instead.
            if next <= -1.0 {
                next = (rate - 1.0) / 2.0;
            }
            if (next - rate).abs() < STEP_TOLERANCE {
                return Some(next);
            }
            rate = next;
        }

        None
    }

    fn bisect(&self, timeline: &Timeline) -> Option<f64> {
        let (mut low, mut high) = BRACKET_GRID.windows(2).find_map(|pair| {
            let (a, b) = (timeline.npv(pair[0]), timeline.npv(pair[1]));
            let brackets = a.is_finite() && b.is_finite() && a.signum() != b.signum();
            brackets.then_some((pair[0], pair[1]))
        })?;
        let low_sign = timeline.npv(low).signum();

        for _ in 0..self.max_iterations {
            let mid = (low + high) / 2.0;
            let value = timeline.npv(mid);
            if value.abs() < self.tolerance || (high - low) / 2.0 < STEP_TOLERANCE {
                return Some(mid);
            }
            if value.signum() == low_sign {
                low = mid;
            } else {
                high = mid;
            }
        }

        None
    }
}

/// Solves with the default tolerance and iteration cap.
pub fn solve<T: DatedAmount>(flows: &[T]) -> Result<f64, XirrError> {
    XirrSolver::default().solve(flows)
}

/// Net present value of `flows` at `rate`, discounted to the earliest date.
pub fn npv<T: DatedAmount>(flows: &[T], rate: f64) -> f64 {
    match flows.iter().map(|f| f.date()).min() {
        Some(base) => flows
            .iter()
            .map(|f| f.amount() * (1.0 + rate).powf(-year_fraction(base, f.date())))
            .sum(),
        None => 0.0,
    }
}

fn year_fraction(base: NaiveDate, date: NaiveDate) -> f64 {
    (date - base).num_days() as f64 / DAYS_PER_YEAR
}

/// Flows reduced to `(years since first flow, amount)`, sorted.
struct Timeline {
    points: Vec<(f64, f64)>,
}

impl Timeline {
    fn prepare<T: DatedAmount>(flows: &[T]) -> Result<Self, XirrError> {
        if flows.len() < 2 {
            return Err(XirrError::NoSolution);
        }

        let mut dated: Vec<(NaiveDate, f64)> =
            flows.iter().map(|f| (f.date(), f.amount())).collect();
        if dated.iter().any(|(_, amount)| !amount.is_finite()) {
            return Err(XirrError::NoSolution);
        }
        dated.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

        let has_outflow = dated.iter().any(|(_, amount)| *amount < 0.0);
        let has_inflow = dated.iter().any(|(_, amount)| *amount > 0.0);
        if !has_outflow || !has_inflow {
            return Err(XirrError::NoSolution);
        }

        let base = dated[0].0;
        let points = dated
            .into_iter()
            .map(|(date, amount)| (year_fraction(base, date), amount))
            .collect();
        Ok(Self { points })
    }

    fn npv(&self, rate: f64) -> f64 {
        self.points
            .iter()
            .map(|(years, amount)| amount * (1.0 + rate).powf(-years))
            .sum()
    }

    /// NPV and its derivative: d/dr [a * (1+r)^(-t)] = -t * a * (1+r)^(-t-1).
    fn npv_and_slope(&self, rate: f64) -> (f64, f64) {
        let growth = 1.0 + rate;
        self.points
            .iter()
            .fold((0.0, 0.0), |(value, slope), (years, amount)| {
                let discounted = amount * growth.powf(-years);
                (value + discounted, slope - years * discounted / growth)
            })
    }
}
