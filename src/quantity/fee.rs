quantity!(
    /// Tax-inclusive yearly subscription fee, as published in the tariff tables.
    AnnualFee, via: f64, suffix: "€/an", precision: 2
);

quantity!(
    /// Tax-inclusive monthly subscription fee.
    MonthlyFee, via: f64, suffix: "€/mois", precision: 2
);

impl From<AnnualFee> for MonthlyFee {
    fn from(fee: AnnualFee) -> Self {
        Self(fee.0 / 12.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_monthly_from_annual() {
        assert_abs_diff_eq!(MonthlyFee::from(AnnualFee(151.20)).0, 12.6, epsilon = 1e-9);
    }

    #[test]
    fn test_display() {
        assert_eq!(AnnualFee(151.2).to_string(), "151.20 €/an");
    }
}
