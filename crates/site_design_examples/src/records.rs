//! CSV persistence of design records.
//!
//! One row per site: `index,row,col,status,stratum`, with `status` as its
//! integer code and `stratum` empty for stratified designs.
use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use site_design::design::{Design, SampledSiteRecord, Site, SiteStatus};
use site_design::strata::StratumId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub status: SiteStatus,
    pub stratum: Option<StratumId>,
}

impl RecordRow {
    fn new(index: usize, record: &SampledSiteRecord) -> Self {
        Self {
            index,
            row: record.site.row,
            col: record.site.col,
            status: record.status,
            stratum: record.stratum,
        }
    }

    fn into_record(self) -> SampledSiteRecord {
        SampledSiteRecord {
            site: Site::new(self.row, self.col),
            status: self.status,
            stratum: self.stratum,
        }
    }
}

/// Write `design` with fixed sites tagged as sampled and the rest as not sampled.
pub fn write_design_csv(design: &Design, path: impl AsRef<Path>) -> anyhow::Result<()> {
    write_records_csv(&design.records(), path)
}

pub fn write_records_csv(records: &[SampledSiteRecord], path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for (index, record) in records.iter().enumerate() {
        writer.serialize(RecordRow::new(index, record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read tagged records back, in index order.
pub fn read_records_csv(path: impl AsRef<Path>) -> anyhow::Result<Vec<SampledSiteRecord>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut records = Vec::new();
    for (expected, row) in reader.deserialize::<RecordRow>().enumerate() {
        let row = row.with_context(|| format!("bad record {expected} in {}", path.display()))?;
        if row.index != expected {
            bail!(
                "record index {} out of order in {}, expected {expected}",
                row.index,
                path.display()
            );
        }
        records.push(row.into_record());
    }
    Ok(records)
}
