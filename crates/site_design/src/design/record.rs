//! Field status of previously designed sites, as read back from a tagged design table.
use std::fmt;

use crate::design::Site;
use crate::error::{Error, Result};
use crate::strata::StratumId;

/// Field status of a site in a prior design.
///
/// Persisted tables store the status as an integer code: `0` not yet sampled,
/// `1` sampled, `2` attempted but inaccessible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u8", into = "u8")
)]
pub enum SiteStatus {
    /// Not visited yet; free to move.
    #[default]
    NotSampled,
    /// Sampled; never moved by an update.
    Sampled,
    /// Could not be reached; may carry an exclusion buffer on update.
    Inaccessible,
}

impl SiteStatus {
    pub const fn code(self) -> u8 {
        match self {
            SiteStatus::NotSampled => 0,
            SiteStatus::Sampled => 1,
            SiteStatus::Inaccessible => 2,
        }
    }
}

impl TryFrom<u8> for SiteStatus {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(SiteStatus::NotSampled),
            1 => Ok(SiteStatus::Sampled),
            2 => Ok(SiteStatus::Inaccessible),
            other => Err(Error::DataInconsistency(format!(
                "unknown site status code {other}"
            ))),
        }
    }
}

impl From<SiteStatus> for u8 {
    fn from(status: SiteStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SiteStatus::NotSampled => "not sampled",
            SiteStatus::Sampled => "sampled",
            SiteStatus::Inaccessible => "inaccessible",
        };
        f.write_str(s)
    }
}

/// A site of a prior design together with its field status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampledSiteRecord {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub site: Site,
    pub status: SiteStatus,
    /// Stratum assigned by a uniform design.
    #[cfg_attr(feature = "serde", serde(default))]
    pub stratum: Option<StratumId>,
}

impl SampledSiteRecord {
    pub fn new(site: Site, status: SiteStatus) -> Self {
        Self {
            site,
            status,
            stratum: None,
        }
    }

    pub fn with_stratum(mut self, stratum: StratumId) -> Self {
        self.stratum = Some(stratum);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_roundtrip() {
        for status in [
            SiteStatus::NotSampled,
            SiteStatus::Sampled,
            SiteStatus::Inaccessible,
        ] {
            assert_eq!(SiteStatus::try_from(status.code()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_code_is_rejected() {
        let err = SiteStatus::try_from(3).unwrap_err();
        assert!(matches!(err, Error::DataInconsistency(_)));
    }

    #[test]
    fn record_builder_sets_stratum() {
        let rec = SampledSiteRecord::new(Site::new(2, 3), SiteStatus::Sampled)
            .with_stratum(StratumId(1));
        assert_eq!(rec.stratum, Some(StratumId(1)));
        assert_eq!(rec.status.to_string(), "sampled");
    }
}
