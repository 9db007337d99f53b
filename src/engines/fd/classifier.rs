//! Contractual feature enforcement and per-node decision codes.
//!
//! The classifier turns an unconstrained continuation value into the
//! constrained node value (free-boundary enforcement) and records which
//! feature binds. The decision tests run in a fixed first-match-wins order —
//! conversion before redemption before put before call — on the value already
//! adjusted for coupon cash, and that precedence is part of the contract.

use crate::core::{Decision, PricingError};
use crate::instruments::ConvertibleBond;
use crate::instruments::schedule::same_date;

/// Applies contractual constraints and classifies mesh nodes.
///
/// Borrows the contract schedule; the schedule is owned by the caller and
/// immutable for the duration of a solve.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    bond: &'a ConvertibleBond,
}

impl<'a> Classifier<'a> {
    pub fn new(bond: &'a ConvertibleBond) -> Self {
        Self { bond }
    }

    /// Constrains and classifies one node.
    ///
    /// `continuation` is the node value including any coupon paid at `t`;
    /// `aux` is the unconstrained PDE continuation value used for the
    /// forced-conversion test. Returns the finalized node value and its
    /// decision code.
    pub fn classify(
        &self,
        t: f64,
        s: f64,
        continuation: f64,
        aux: f64,
    ) -> Result<(f64, Decision), PricingError> {
        let bond = self.bond;
        let at_maturity = same_date(t, bond.maturity);

        // Coupon cash leaks out before any feature test; it is restored on
        // the way out so the stored surface stays cum-coupon.
        let coupon = if bond.is_coupon_date(t) && !at_maturity {
            bond.coupon_amount
        } else {
            0.0
        };
        let mut v = continuation - coupon;

        let convertible = bond.is_conversion_date(t);
        let conversion = bond.conversion_value(s);
        let callable = !at_maturity
            && bond.call.as_ref().is_some_and(|call| call.contains(t));
        let puttable = bond.put.as_ref().is_some_and(|put| put.contains(t));

        // Obstacle enforcement: the issuer caps the value at the call level
        // (cushioned by the conversion value only while the holder can still
        // convert in response), then the holder floors it with conversion and
        // put.
        if callable
            && let Some(call) = &bond.call
        {
            let cap = if convertible {
                call.strike(t)?.max(conversion)
            } else {
                call.strike(t)?
            };
            v = v.min(cap);
        }
        if convertible {
            v = v.max(conversion);
        }
        if puttable
            && let Some(put) = &bond.put
        {
            v = v.max(put.strike(t)?);
        }

        // First-match-wins decision chain; equality against a feature value
        // detects that the corresponding constraint is the binding one.
        let decision = if convertible && v == conversion {
            if callable && aux > conversion {
                Decision::ForcedConversion
            } else {
                Decision::Conversion
            }
        } else if at_maturity {
            Decision::Redemption
        } else if puttable
            && let Some(put) = &bond.put
            && v == put.strike(t)?
        {
            Decision::Put
        } else if callable
            && let Some(call) = &bond.call
            && v == call.strike(t)?
        {
            Decision::Call
        } else {
            Decision::Hold
        };

        Ok((v + coupon, decision))
    }
}
