/// Contractual feature binding at a grid node of the solved surface.
///
/// One code is written per mesh point during the backward sweep and is
/// immutable afterwards. The rendering layer maps each code to a presentation
/// value; only the six distinct codes are part of the solver contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Decision {
    /// No contractual feature binds; the PDE continuation value stands.
    Hold,
    /// Holder puts the bond back at the put strike.
    Put,
    /// Issuer calls the bond at the call strike.
    Call,
    /// Holder converts voluntarily into equity.
    Conversion,
    /// Issuer call makes holding uneconomical; conversion is forced.
    ForcedConversion,
    /// Terminal redemption payoff at maturity.
    Redemption,
}

impl Decision {
    /// Stable numeric code for downstream consumers.
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            Self::Hold => 0,
            Self::Put => 1,
            Self::Call => 2,
            Self::Conversion => 3,
            Self::ForcedConversion => 4,
            Self::Redemption => 5,
        }
    }

    /// Stable label for diagnostics and legends.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::Put => "put",
            Self::Call => "call",
            Self::Conversion => "conversion",
            Self::ForcedConversion => "forced_conversion",
            Self::Redemption => "redemption",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let all = [
            Decision::Hold,
            Decision::Put,
            Decision::Call,
            Decision::Conversion,
            Decision::ForcedConversion,
            Decision::Redemption,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.code(), b.code());
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }
}
