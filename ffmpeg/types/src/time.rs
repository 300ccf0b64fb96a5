/*!
    Timestamp and time base types.
*/

use std::fmt;
use std::time::Duration;

/**
    A rational number, used for time bases and frame rates.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /**
        Returns the value as a float, or 0.0 for a zero denominator.
    */
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }

    /**
        Returns true if both parts are non-zero.
    */
    pub const fn is_valid(self) -> bool {
        self.num != 0 && self.den != 0
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/**
    Presentation timestamp in stream time base units.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

impl Pts {
    /**
        Convert to wall-clock time using the stream time base.

        Returns `None` for negative timestamps or an invalid time base.
    */
    pub fn to_duration(self, time_base: Rational) -> Option<Duration> {
        if self.0 < 0 || !time_base.is_valid() {
            return None;
        }
        let nanos = i128::from(self.0) * i128::from(time_base.num) * 1_000_000_000
            / i128::from(time_base.den);
        u64::try_from(nanos).ok().map(Duration::from_nanos)
    }
}

impl fmt::Display for Pts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
