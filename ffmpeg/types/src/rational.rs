/*!
    Rational numbers for time bases, frame rates, and aspect ratios.
*/

use std::fmt;

/**
    A rational number `num / den`.

    Time bases are rationals: a timestamp `t` in time base `tb` lasts
    `t * tb.num / tb.den` seconds.
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
        Returns `den / num`, e.g. a frame rate from a video time base.
    */
    pub const fn invert(self) -> Self {
        Self {
            num: self.den,
            den: self.num,
        }
    }

    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /**
        True when both terms are positive.
    */
    pub const fn is_positive(self) -> bool {
        self.num > 0 && self.den > 0
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}
