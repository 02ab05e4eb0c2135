//! The immutable description of one station download.

use chrono::NaiveDate;

use crate::error::ConfigError;
use crate::planner::{plan_chunks, Chunk};

/// One station's date range and chunk size. Validated on construction and
/// never mutated during a run. The credential travels with the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub station: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub months: u32,
}

impl FetchRequest {
    pub fn new(
        station: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        months: u32,
    ) -> Result<Self, ConfigError> {
        let station = station.into().trim().to_string();
        validate_station(&station)?;
        if months == 0 {
            return Err(ConfigError::InvalidChunkSize(months));
        }
        if start > end {
            return Err(ConfigError::InvalidRange { start, end });
        }
        if start == end {
            return Err(ConfigError::EmptyRange(start));
        }
        Ok(FetchRequest {
            station,
            start,
            end,
            months,
        })
    }

    /// Full chunk plan for the request.
    pub fn plan(&self) -> Result<Vec<Chunk>, ConfigError> {
        plan_chunks(self.start, self.end, self.months)
    }

    /// File stem shared by the progress file and the final artifact.
    pub fn stem(&self) -> String {
        format!("{}_{}_{}", self.station, self.start, self.end)
    }
}

/// Station ids are used verbatim in URLs and file names.
fn validate_station(station: &str) -> Result<(), ConfigError> {
    if station.is_empty() || !station.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::InvalidStation(station.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn valid_request() {
        let r = FetchRequest::new(" 0200E ", d(1980, 1, 1), d(1980, 7, 1), 3).unwrap();
        assert_eq!(r.station, "0200E");
        assert_eq!(r.plan().unwrap().len(), 2);
        assert_eq!(r.stem(), "0200E_1980-01-01_1980-07-01");
    }

    #[test]
    fn rejects_bad_station_ids() {
        for bad in ["", "02/00", "../x", "0200 E"] {
            assert!(matches!(
                FetchRequest::new(bad, d(1980, 1, 1), d(1980, 7, 1), 3),
                Err(ConfigError::InvalidStation(_))
            ));
        }
    }

    #[test]
    fn rejects_zero_months_and_bad_ranges() {
        assert_eq!(
            FetchRequest::new("0076", d(1980, 1, 1), d(1980, 7, 1), 0),
            Err(ConfigError::InvalidChunkSize(0))
        );
        assert!(matches!(
            FetchRequest::new("0076", d(1980, 7, 1), d(1980, 1, 1), 3),
            Err(ConfigError::InvalidRange { .. })
        ));
        assert_eq!(
            FetchRequest::new("0076", d(1980, 1, 1), d(1980, 1, 1), 3),
            Err(ConfigError::EmptyRange(d(1980, 1, 1)))
        );
    }
}
