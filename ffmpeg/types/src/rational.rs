/*!
    Rational number type for time bases and frame rates.
*/

use std::fmt;

/**
    A rational number represented as a numerator and denominator.

    Used for time bases (e.g., 1/90000 for MPEG-TS) and frame rates
    (e.g., 24000/1001 for 23.976 fps). Containers regularly report 0/0 or
    0/1 for values they do not know, so construction never panics and
    [`Rational::is_valid`] tells the two apart.
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /**
        Create a new rational number.
    */
    #[inline]
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /**
        Create a rational number, returning `None` if either part is zero.
    */
    #[inline]
    pub const fn non_zero(num: i32, den: i32) -> Option<Self> {
        if num == 0 || den == 0 {
            None
        } else {
            Some(Self { num, den })
        }
    }

    /**
        Returns true if the denominator is non-zero.
    */
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.den != 0
    }

    /**
        Convert to f64.

        Returns 0.0 for a zero denominator.
    */
    #[inline]
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        self.num as f64 / self.den as f64
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self::new(num, den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_to_f64() {
        assert_eq!(Rational::new(1, 2).to_f64(), 0.5);
        assert!((Rational::new(24000, 1001).to_f64() - 23.976).abs() < 0.001);
        assert_eq!(Rational::new(1, 0).to_f64(), 0.0);
    }

    #[test]
    fn rational_non_zero() {
        assert_eq!(Rational::non_zero(25, 1), Some(Rational::new(25, 1)));
        assert_eq!(Rational::non_zero(0, 1), None);
        assert_eq!(Rational::non_zero(0, 0), None);
    }

    #[test]
    fn rational_display() {
        assert_eq!(format!("{}", Rational::new(30000, 1001)), "30000/1001");
        assert_eq!(format!("{:?}", Rational::new(1, 48000)), "1/48000");
    }
}
