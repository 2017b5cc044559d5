//! `YieldTermStructure` — discount curves in time.
//!
//! The cube only ever needs discount factors at year fractions, so the trait
//! is expressed in [`Time`] with zero and forward rates derived from
//! [`discount`](YieldTermStructure::discount).

use volcube_core::{DiscountFactor, Rate, Time};

/// A yield (interest-rate) term structure.
pub trait YieldTermStructure: std::fmt::Debug + Send + Sync {
    /// Discount factor `P(0, t)`.
    fn discount(&self, t: Time) -> DiscountFactor;

    /// Continuously-compounded zero rate to `t`.
    ///
    /// Near `t = 0` the rate over a short first interval is returned.
    fn zero_rate(&self, t: Time) -> Rate {
        let t = t.max(1e-4);
        -self.discount(t).ln() / t
    }

    /// Continuously-compounded forward rate between `t1` and `t2`.
    fn forward_rate(&self, t1: Time, t2: Time) -> Rate {
        if (t2 - t1).abs() < 1e-12 {
            let h = 1e-4;
            return (self.discount(t1) / self.discount(t1 + h)).ln() / h;
        }
        (self.discount(t1) / self.discount(t2)).ln() / (t2 - t1)
    }
}
