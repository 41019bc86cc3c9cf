quantity!(
    /// Tax-inclusive euro per kilowatt-hour.
    KilowattHourRate, via: f64, suffix: "€/kWh", precision: 4
);
