/*!
    Timestamp types for media timing.
*/

use crate::Rational;

/**
    Presentation timestamp in time_base units.

    This is the raw timestamp value from the media stream. To convert to
    seconds you need the stream's time base.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

impl Pts {
    /**
        Convert this PTS to seconds using the given time base.
    */
    #[inline]
    pub fn to_seconds(self, time_base: Rational) -> f64 {
        self.0 as f64 * time_base.to_f64()
    }

    /**
        Create a PTS from seconds using the given time base.

        Rounds to the nearest tick. An invalid time base yields zero.
    */
    #[inline]
    pub fn from_seconds(seconds: f64, time_base: Rational) -> Self {
        let unit = time_base.to_f64();
        if unit == 0.0 {
            return Self(0);
        }
        Self((seconds / unit).round() as i64)
    }
}

impl From<i64> for Pts {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Pts> for i64 {
    fn from(pts: Pts) -> Self {
        pts.0
    }
}

/**
    Duration in time_base units.

    Similar to Pts but semantically represents a duration rather than a point in time.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaDuration(pub i64);

impl MediaDuration {
    /**
        Convert this duration to seconds using the given time base.

        Negative values are clamped to zero.
    */
    #[inline]
    pub fn to_seconds(self, time_base: Rational) -> f64 {
        if self.0 <= 0 {
            return 0.0;
        }
        self.0 as f64 * time_base.to_f64()
    }
}
