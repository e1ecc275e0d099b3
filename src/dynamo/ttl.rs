use crate::builder::Builder;
use crate::error::Result;
use crate::value::Expr;

const SECOND: u64 = 1_000;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// An expiry relative to the time the template is evaluated.
///
/// ```
/// use vtlbuilder::{dynamo::Ttl, Builder, Profile};
///
/// let mut b = Builder::new(Profile::V2018_05_29);
/// let expires = Ttl::hours(1).expr(&mut b).unwrap();
/// assert_eq!(
///     b.render_expr(&expires),
///     "(${util.time.nowEpochMilliSeconds()} + 3600000)"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ttl {
    millis: u64,
}

impl Ttl {
    fn of(amount: u64, unit: u64) -> Self {
        Ttl {
            millis: amount.saturating_mul(unit),
        }
    }

    pub fn seconds(amount: u64) -> Self {
        Self::of(amount, SECOND)
    }

    pub fn minutes(amount: u64) -> Self {
        Self::of(amount, MINUTE)
    }

    pub fn hours(amount: u64) -> Self {
        Self::of(amount, HOUR)
    }

    pub fn days(amount: u64) -> Self {
        Self::of(amount, DAY)
    }

    pub fn weeks(amount: u64) -> Self {
        Self::of(amount, WEEK)
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    pub fn expr(self, b: &mut Builder) -> Result<Expr> {
        let now = b.util().time().now_epoch_milliseconds()?;
        b.add(now, self.millis)
    }
}
