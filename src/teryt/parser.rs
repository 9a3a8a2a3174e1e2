//! TERYT administrative table parser.
//!
//! The table is flat; the level of each row is implied by which code columns
//! are empty:
//!
//! ```text
//! WOJ;POW;GMI;RODZ;NAZWA;NAZWA_OBSZARU;STAN_NA
//! 14;;;;MAZOWIECKIE;województwo;2024-01-01
//! 14;65;;;Warszawa;miasto na prawach powiatu;2024-01-01
//! 14;65;01;1;Warszawa;gmina miejska;2024-01-01
//! ```

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use crate::models::{AdminHierarchy, AdminLevel};

/// One table row, already trimmed
#[derive(Debug, Clone, Copy)]
struct TerytRow<'a> {
    voivodeship: &'a str,
    county: &'a str,
    municipality: &'a str,
    kind: &'a str,
    name: &'a str,
    area_name: &'a str,
}

impl<'a> TerytRow<'a> {
    fn from_record(record: &'a StringRecord) -> Option<Self> {
        if record.len() < 6 {
            return None;
        }

        Some(Self {
            voivodeship: record.get(0)?,
            county: record.get(1)?,
            municipality: record.get(2)?,
            kind: record.get(3)?,
            name: record.get(4)?,
            area_name: record.get(5)?,
        })
    }

    fn level(&self) -> AdminLevel {
        if self.county.is_empty() && self.municipality.is_empty() {
            AdminLevel::Voivodeship
        } else if self.municipality.is_empty() {
            AdminLevel::County
        } else {
            AdminLevel::Municipality
        }
    }

    /// Apply the row to the hierarchy. Returns false if the row was skipped.
    fn apply(&self, hierarchy: &mut AdminHierarchy) -> bool {
        match self.level() {
            AdminLevel::Voivodeship => {
                if self.voivodeship.is_empty() {
                    return false;
                }
                hierarchy.insert_voivodeship(self.voivodeship, self.name);
                true
            }
            AdminLevel::County => {
                if self.voivodeship.is_empty() || self.name.is_empty() {
                    return false;
                }
                hierarchy
                    .insert_county(self.voivodeship, self.county, self.name)
                    .is_some()
            }
            AdminLevel::Municipality => {
                if self.voivodeship.is_empty() || self.county.is_empty() || self.name.is_empty()
                {
                    return false;
                }
                hierarchy
                    .push_municipality(
                        self.voivodeship,
                        self.county,
                        self.municipality,
                        self.kind,
                        format!("{} ({})", self.name, self.area_name),
                    )
                    .is_some()
            }
        }
    }
}

/// Parse the semicolon separated administrative table.
///
/// Never fails: short or incomplete rows, and rows whose parent was never
/// declared, are skipped without touching the hierarchy.
pub fn parse_hierarchy(data: &str) -> AdminHierarchy {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b';')
        .quoting(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data.as_bytes());

    let mut hierarchy = AdminHierarchy::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping unreadable row: {}", e);
                skipped += 1;
                continue;
            }
        };

        let applied = TerytRow::from_record(&record)
            .map(|row| row.apply(&mut hierarchy))
            .unwrap_or(false);

        if !applied {
            debug!(
                "Skipping row at line {}: {:?}",
                record.position().map(|p| p.line()).unwrap_or(0),
                record
            );
            skipped += 1;
        }
    }

    info!(
        "Parsed administrative table: {} voivodeships, {} counties, {} municipalities ({} rows skipped)",
        hierarchy.len(AdminLevel::Voivodeship),
        hierarchy.len(AdminLevel::County),
        hierarchy.len(AdminLevel::Municipality),
        skipped
    );

    hierarchy
}
