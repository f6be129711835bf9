use chrono::NaiveDate;

/// One daily observation for one station.
///
/// Temperatures are tenths of a degree Celsius, precipitation is tenths of a
/// millimeter. `None` means the instrument reported no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReading {
    pub site_id: String,
    pub date: NaiveDate,
    pub tmax: Option<i32>,
    pub tmin: Option<i32>,
    pub precip: Option<i32>,
}

/// Yearly aggregate for one station-year, already unit-converted.
///
/// `tmax_yearly`/`tmin_yearly` are degrees Celsius and absent when the year had
/// no reported value. `precip_yearly` is centimeters and zero in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyStat {
    pub site_id: String,
    pub year: i32,
    pub tmax_yearly: Option<f64>,
    pub tmin_yearly: Option<f64>,
    pub precip_yearly: f64,
}
