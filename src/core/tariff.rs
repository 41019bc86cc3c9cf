//! Regulated tariff tables («tarifs réglementés de vente») published on data.gouv.fr.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        contract::ContractType,
        error::ParseError,
        tempo::TempoColor,
        time::parse_date,
    },
    prelude::*,
    quantity::{
        fee::{AnnualFee, MonthlyFee},
        rate::KilowattHourRate,
    },
};

/// Rates extracted from the currently effective table row.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rates {
    Base(BaseRates),
    Hphc(HphcRates),
    Tempo(TempoRates),
}

impl Rates {
    pub const fn contract_type(&self) -> ContractType {
        match self {
            Self::Base(_) => ContractType::Base,
            Self::Hphc(_) => ContractType::Hphc,
            Self::Tempo(_) => ContractType::Tempo,
        }
    }

    pub const fn subscription(&self) -> MonthlyFee {
        match self {
            Self::Base(rates) => rates.subscription,
            Self::Hphc(rates) => rates.subscription,
            Self::Tempo(rates) => rates.subscription,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRates {
    #[serde(rename = "base_fixe_ttc")]
    pub fixed: AnnualFee,

    #[serde(rename = "base_variable_ttc")]
    pub variable: KilowattHourRate,

    #[serde(rename = "base_abonnement_ttc")]
    pub subscription: MonthlyFee,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HphcRates {
    #[serde(rename = "hphc_fixe_ttc")]
    pub fixed: AnnualFee,

    #[serde(rename = "hphc_variable_hc_ttc")]
    pub off_peak: KilowattHourRate,

    #[serde(rename = "hphc_variable_hp_ttc")]
    pub peak: KilowattHourRate,

    #[serde(rename = "hphc_abonnement_ttc")]
    pub subscription: MonthlyFee,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoRates {
    #[serde(rename = "tempo_fixe_ttc")]
    pub fixed: AnnualFee,

    #[serde(rename = "tempo_variable_hc_bleu_ttc")]
    pub blue_off_peak: KilowattHourRate,

    #[serde(rename = "tempo_variable_hp_bleu_ttc")]
    pub blue_peak: KilowattHourRate,

    #[serde(rename = "tempo_variable_hc_blanc_ttc")]
    pub white_off_peak: KilowattHourRate,

    #[serde(rename = "tempo_variable_hp_blanc_ttc")]
    pub white_peak: KilowattHourRate,

    #[serde(rename = "tempo_variable_hc_rouge_ttc")]
    pub red_off_peak: KilowattHourRate,

    #[serde(rename = "tempo_variable_hp_rouge_ttc")]
    pub red_peak: KilowattHourRate,

    #[serde(rename = "tempo_abonnement_ttc")]
    pub subscription: MonthlyFee,
}

impl TempoRates {
    /// Peak and off-peak rates of a known day color.
    pub const fn for_color(&self, color: TempoColor) -> Option<PeakRates> {
        match color {
            TempoColor::Blue => {
                Some(PeakRates { peak: self.blue_peak, off_peak: self.blue_off_peak })
            }
            TempoColor::White => {
                Some(PeakRates { peak: self.white_peak, off_peak: self.white_off_peak })
            }
            TempoColor::Red => {
                Some(PeakRates { peak: self.red_peak, off_peak: self.red_off_peak })
            }
            TempoColor::Unknown => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PeakRates {
    pub peak: KilowattHourRate,
    pub off_peak: KilowattHourRate,
}

impl ContractType {
    /// Name of the subscribed power column in the contract's table.
    const fn power_column(self) -> &'static str {
        match self {
            Self::Tempo => "P_SOUSCRITE",
            Self::Base | Self::Hphc => "PUISSANCE",
        }
    }

    const fn fallback_power_column(self) -> &'static str {
        match self {
            Self::Tempo => "PUISSANCE",
            Self::Base | Self::Hphc => "P_SOUSCRITE",
        }
    }
}

/// Select the row in effect `today` for the subscribed power, and extract its rates.
///
/// Among the rows in effect, the latest start date wins. Rows starting on the same date are
/// resolved by the file order: the last one wins. Malformed rows are skipped.
///
/// Returns [`None`] when no row is in effect.
#[instrument(skip_all, fields(contract_type = %contract_type, power = power, today = %today))]
pub fn resolve(
    table: &[u8],
    contract_type: ContractType,
    power: &str,
    today: NaiveDate,
) -> Result<Option<Rates>, csv::Error> {
    let mut reader =
        ReaderBuilder::new().delimiter(b';').flexible(true).trim(Trim::All).from_reader(table);
    let headers = reader.headers()?.clone();
    let power_column = if headers.iter().any(|header| header == contract_type.power_column()) {
        contract_type.power_column()
    } else {
        contract_type.fallback_power_column()
    };

    let mut best_match: Option<(NaiveDate, Rates)> = None;
    for (index, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                debug!(index, "skipping unreadable row: {error:#}");
                continue;
            }
        };
        let row = Row { headers: &headers, record: &record };
        match row.evaluate(contract_type, power_column, power, today) {
            Ok(Some((start_date, rates))) => {
                if best_match.as_ref().is_none_or(|(best_date, _)| start_date >= *best_date) {
                    best_match = Some((start_date, rates));
                }
            }
            Ok(None) => {}
            Err(error) => {
                debug!(index, "skipping malformed row: {error:#}");
            }
        }
    }

    match best_match {
        Some((start_date, rates)) => {
            debug!(%start_date, ?rates, "found the effective tariff");
            Ok(Some(rates))
        }
        None => Ok(None),
    }
}

/// Table record along with the header for lookups by column name.
struct Row<'a> {
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl Row<'_> {
    /// Missing columns read as empty fields.
    fn get(&self, column: &str) -> &str {
        self.headers
            .iter()
            .position(|header| header == column)
            .and_then(|index| self.record.get(index))
            .unwrap_or_default()
    }

    fn price(&self, column: &str) -> Result<f64, ParseError> {
        parse_price(self.get(column))
    }

    /// Start date and rates of the row, if it applies to the power on the date.
    fn evaluate(
        &self,
        contract_type: ContractType,
        power_column: &str,
        power: &str,
        today: NaiveDate,
    ) -> Result<Option<(NaiveDate, Rates)>, ParseError> {
        let start = self.get("DATE_DEBUT");
        if start.is_empty() || self.get(power_column) != power {
            return Ok(None);
        }
        let start_date = parse_date(start)?;
        if start_date > today {
            return Ok(None);
        }
        let end = self.get("DATE_FIN");
        if !end.is_empty() && parse_date(end)? < today {
            return Ok(None);
        }
        Ok(Some((start_date, self.rates(contract_type)?)))
    }

    fn rates(&self, contract_type: ContractType) -> Result<Rates, ParseError> {
        let fixed = AnnualFee(self.price("PART_FIXE_TTC")?);
        let subscription = MonthlyFee::from(fixed);
        let rates = match contract_type {
            ContractType::Base => Rates::Base(BaseRates {
                fixed,
                variable: self.price("PART_VARIABLE_TTC")?.into(),
                subscription,
            }),
            ContractType::Hphc => Rates::Hphc(HphcRates {
                fixed,
                off_peak: self.price("PART_VARIABLE_HC_TTC")?.into(),
                peak: self.price("PART_VARIABLE_HP_TTC")?.into(),
                subscription,
            }),
            ContractType::Tempo => Rates::Tempo(TempoRates {
                fixed,
                blue_off_peak: self.price("PART_VARIABLE_HCBleu_TTC")?.into(),
                blue_peak: self.price("PART_VARIABLE_HPBleu_TTC")?.into(),
                white_off_peak: self.price("PART_VARIABLE_HCBlanc_TTC")?.into(),
                white_peak: self.price("PART_VARIABLE_HPBlanc_TTC")?.into(),
                red_off_peak: self.price("PART_VARIABLE_HCRouge_TTC")?.into(),
                red_peak: self.price("PART_VARIABLE_HPRouge_TTC")?.into(),
                subscription,
            }),
        };
        Ok(rates)
    }
}

/// Parse a decimal-comma price, an empty field being zero.
pub fn parse_price(text: &str) -> Result<f64, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    text.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseError::Number(text.to_owned()))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    const BASE_TABLE: &str = "\
DATE_DEBUT;DATE_FIN;PUISSANCE;PART_FIXE_HT;PART_FIXE_TTC;PART_VARIABLE_HT;PART_VARIABLE_TTC
01/02/2023;31/07/2023;6;113,52;151,20;0,1228;0,2062
01/01/2024;;6;115,20;153,60;0,1300;0,1907
01/06/2024;;6;117,00;156,12;0,1350;0,2516
01/06/2024;;9;140,00;187,80;0,1350;0,2516
01/01/2030;;6;200,00;240,00;0,2000;0,3000
";

    const HPHC_TABLE: &str = "\
DATE_DEBUT;DATE_FIN;PUISSANCE;PART_FIXE_TTC;PART_VARIABLE_HC_TTC;PART_VARIABLE_HP_TTC
01/02/2025;;6;157,68;0,2068;0,2700
";

    const TEMPO_TABLE: &str = "\
DATE_DEBUT;DATE_FIN;P_SOUSCRITE;PART_FIXE_TTC;PART_VARIABLE_HCBleu_TTC;PART_VARIABLE_HPBleu_TTC;PART_VARIABLE_HCBlanc_TTC;PART_VARIABLE_HPBlanc_TTC;PART_VARIABLE_HCRouge_TTC;PART_VARIABLE_HPRouge_TTC
01/02/2025;;6;158,16;0,1288;0,1552;0,1447;0,1792;0,1518;0,6586
";

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn resolve_base(table: &str, power: &str, today: NaiveDate) -> Result<Option<BaseRates>> {
        match resolve(table.as_bytes(), ContractType::Base, power, today)? {
            Some(Rates::Base(rates)) => Ok(Some(rates)),
            Some(rates) => bail!("unexpected rates: {rates:?}"),
            None => Ok(None),
        }
    }

    #[test]
    fn test_latest_start_date_wins() -> Result {
        let rates = resolve_base(BASE_TABLE, "6", date(2024, 8, 1))?.context("no match")?;
        assert_eq!(rates.variable, KilowattHourRate(0.2516));
        assert_eq!(rates.fixed, AnnualFee(156.12));
        assert_abs_diff_eq!(rates.subscription.0, 156.12 / 12.0);
        Ok(())
    }

    #[test]
    fn test_earlier_row_before_newer_one_starts() -> Result {
        let rates = resolve_base(BASE_TABLE, "6", date(2024, 3, 1))?.context("no match")?;
        assert_eq!(rates.variable, KilowattHourRate(0.1907));
        Ok(())
    }

    #[test]
    fn test_expired_row_is_never_selected() -> Result {
        let table = "\
DATE_DEBUT;DATE_FIN;PUISSANCE;PART_FIXE_TTC;PART_VARIABLE_TTC
01/01/2024;31/07/2024;6;100,00;0,3000
";
        assert_eq!(resolve_base(table, "6", date(2024, 8, 1))?, None);
        assert!(resolve_base(table, "6", date(2024, 7, 31))?.is_some());
        Ok(())
    }

    #[test]
    fn test_future_rows_and_other_powers_are_ignored() -> Result {
        assert_eq!(resolve_base(BASE_TABLE, "6", date(2022, 1, 1))?, None);
        assert_eq!(resolve_base(BASE_TABLE, "12", date(2024, 8, 1))?, None);
        let rates = resolve_base(BASE_TABLE, "9", date(2024, 8, 1))?.context("no match")?;
        assert_eq!(rates.fixed, AnnualFee(187.8));
        Ok(())
    }

    #[test]
    fn test_same_start_date_last_row_wins() -> Result {
        let table = "\
DATE_DEBUT;DATE_FIN;PUISSANCE;PART_FIXE_TTC;PART_VARIABLE_TTC
01/01/2024;;6;100,00;0,1000
01/01/2024;;6;100,00;0,2000
";
        let rates = resolve_base(table, "6", date(2024, 8, 1))?.context("no match")?;
        assert_eq!(rates.variable, KilowattHourRate(0.2));
        Ok(())
    }

    #[test]
    fn test_malformed_row_is_skipped() -> Result {
        let table = "\
DATE_DEBUT;DATE_FIN;PUISSANCE;PART_FIXE_TTC;PART_VARIABLE_TTC
01/01/2024;;6;100,00;0,1000
2024-06-01;;6;100,00;0,2000
01/07/2024;;6;100,00;n/a
;;6;100,00;0,4000
";
        let rates = resolve_base(table, "6", date(2024, 8, 1))?.context("no match")?;
        assert_eq!(rates.variable, KilowattHourRate(0.1));
        Ok(())
    }

    #[test]
    fn test_empty_price_is_zero() -> Result {
        let table = "\
DATE_DEBUT;DATE_FIN;PUISSANCE;PART_FIXE_TTC;PART_VARIABLE_TTC
01/01/2024;;6;;0,1907
";
        let rates = resolve_base(table, "6", date(2024, 8, 1))?.context("no match")?;
        assert_eq!(rates.fixed, AnnualFee(0.0));
        assert_eq!(rates.subscription, MonthlyFee(0.0));
        Ok(())
    }

    #[test]
    fn test_resolution_is_idempotent() -> Result {
        let today = date(2024, 8, 1);
        assert_eq!(
            resolve(BASE_TABLE.as_bytes(), ContractType::Base, "6", today)?,
            resolve(BASE_TABLE.as_bytes(), ContractType::Base, "6", today)?,
        );
        Ok(())
    }

    #[test]
    fn test_hphc_rates() -> Result {
        let rates = resolve(HPHC_TABLE.as_bytes(), ContractType::Hphc, "6", date(2025, 3, 1))?;
        let Some(Rates::Hphc(rates)) = rates else { bail!("unexpected rates: {rates:?}") };
        assert_eq!(rates.off_peak, KilowattHourRate(0.2068));
        assert_eq!(rates.peak, KilowattHourRate(0.27));
        Ok(())
    }

    #[test]
    fn test_tempo_rates_use_subscribed_power_column() -> Result {
        let rates = resolve(TEMPO_TABLE.as_bytes(), ContractType::Tempo, "6", date(2025, 3, 1))?;
        let Some(Rates::Tempo(rates)) = rates else { bail!("unexpected rates: {rates:?}") };
        assert_eq!(rates.blue_off_peak, KilowattHourRate(0.1288));
        assert_eq!(rates.red_peak, KilowattHourRate(0.6586));
        assert_eq!(
            rates.for_color(TempoColor::White),
            Some(PeakRates { peak: KilowattHourRate(0.1792), off_peak: KilowattHourRate(0.1447) }),
        );
        assert_eq!(rates.for_color(TempoColor::Unknown), None);
        Ok(())
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("0,1907"), Ok(0.1907));
        assert_eq!(parse_price(" 151,20 "), Ok(151.2));
        assert_eq!(parse_price(""), Ok(0.0));
        assert_eq!(parse_price("abc"), Err(ParseError::Number("abc".to_owned())));
        assert!(parse_price("NaN").is_err());
    }
}
