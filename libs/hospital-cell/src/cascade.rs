//! Division → district → upazila selection chain.
//!
//! Each level's option list is fetched with a ticket. A response is applied
//! only while its ticket is still the newest one issued for that level, so a
//! slow lookup for a selection the user already abandoned cannot overwrite
//! the current options.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::debug;

use shared_models::error::AppError;

use crate::models::{AreaFilter, AreaPreference, District, Division, Upazila};
use crate::services::LocationService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeLevel {
    Division = 0,
    District = 1,
    Upazila = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeTicket {
    level: CascadeLevel,
    serial: u64,
    parent: Option<i64>,
}

impl CascadeTicket {
    /// Id whose children this ticket fetches (none for divisions).
    pub fn parent(&self) -> Option<i64> {
        self.parent
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCascade {
    pub division_id: Option<i64>,
    pub district_id: Option<i64>,
    pub upazila_id: Option<i64>,
    pub divisions: Vec<Division>,
    pub districts: Vec<District>,
    pub upazilas: Vec<Upazila>,
    #[serde(skip)]
    serials: [u64; 3],
}

impl LocationCascade {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&mut self, level: CascadeLevel, parent: Option<i64>) -> CascadeTicket {
        self.invalidate(level);
        CascadeTicket {
            level,
            serial: self.serials[level as usize],
            parent,
        }
    }

    fn invalidate(&mut self, level: CascadeLevel) {
        self.serials[level as usize] += 1;
    }

    pub fn is_current(&self, ticket: &CascadeTicket) -> bool {
        self.serials[ticket.level as usize] == ticket.serial
    }

    pub fn request_divisions(&mut self) -> CascadeTicket {
        self.issue(CascadeLevel::Division, None)
    }

    /// Sets the division and clears everything below it. Returns the ticket
    /// for the district lookup when a division was chosen.
    pub fn select_division(&mut self, id: Option<i64>) -> Option<CascadeTicket> {
        self.division_id = id;
        self.district_id = None;
        self.upazila_id = None;
        self.districts.clear();
        self.upazilas.clear();
        self.invalidate(CascadeLevel::Upazila);

        match id {
            Some(id) => Some(self.issue(CascadeLevel::District, Some(id))),
            None => {
                self.invalidate(CascadeLevel::District);
                None
            }
        }
    }

    pub fn select_district(&mut self, id: Option<i64>) -> Option<CascadeTicket> {
        self.district_id = id;
        self.upazila_id = None;
        self.upazilas.clear();

        match id {
            Some(id) => Some(self.issue(CascadeLevel::Upazila, Some(id))),
            None => {
                self.invalidate(CascadeLevel::Upazila);
                None
            }
        }
    }

    pub fn select_upazila(&mut self, id: Option<i64>) {
        self.upazila_id = id;
    }

    pub fn apply_divisions(&mut self, ticket: CascadeTicket, divisions: Vec<Division>) -> bool {
        if ticket.level != CascadeLevel::Division || !self.is_current(&ticket) {
            return false;
        }
        self.divisions = divisions;
        true
    }

    pub fn apply_districts(&mut self, ticket: CascadeTicket, districts: Vec<District>) -> bool {
        if ticket.level != CascadeLevel::District || !self.is_current(&ticket) {
            return false;
        }
        self.districts = districts;
        true
    }

    pub fn apply_upazilas(&mut self, ticket: CascadeTicket, upazilas: Vec<Upazila>) -> bool {
        if ticket.level != CascadeLevel::Upazila || !self.is_current(&ticket) {
            return false;
        }
        self.upazilas = upazilas;
        true
    }

    pub fn preference(&self) -> AreaPreference {
        AreaPreference {
            division_id: self.division_id,
            district_id: self.district_id,
            upazila_id: self.upazila_id,
        }
    }

    /// The hospital search query, available once a division is chosen.
    pub fn area_filter(&self) -> Option<AreaFilter> {
        self.division_id.map(|division_id| AreaFilter {
            division_id,
            district_id: self.district_id,
            upazila_id: self.upazila_id,
        })
    }
}

/// Owner of a cascade that async lookups can lock briefly between awaits.
pub trait CascadeHost: Send + Sync {
    fn with_cascade<R>(&self, f: impl FnOnce(&mut LocationCascade) -> R) -> R;
}

impl CascadeHost for Mutex<LocationCascade> {
    fn with_cascade<R>(&self, f: impl FnOnce(&mut LocationCascade) -> R) -> R {
        let mut cascade = self.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cascade)
    }
}

pub async fn load_divisions<H: CascadeHost>(host: &H, locations: &LocationService) -> Result<bool, AppError> {
    let ticket = host.with_cascade(|c| c.request_divisions());
    let divisions = locations.divisions().await?;
    Ok(host.with_cascade(|c| c.apply_divisions(ticket, divisions)))
}

/// Selects a division and loads its districts. Returns false when a newer
/// selection superseded this one before the districts arrived.
pub async fn choose_division<H: CascadeHost>(
    host: &H,
    locations: &LocationService,
    id: Option<i64>,
) -> Result<bool, AppError> {
    let Some(ticket) = host.with_cascade(|c| c.select_division(id)) else {
        return Ok(true);
    };
    let division_id = ticket.parent().unwrap_or_default();
    let districts = locations.districts(division_id).await?;

    let applied = host.with_cascade(|c| c.apply_districts(ticket, districts));
    if !applied {
        debug!("Dropped stale district list for division {}", division_id);
    }
    Ok(applied)
}

pub async fn choose_district<H: CascadeHost>(
    host: &H,
    locations: &LocationService,
    id: Option<i64>,
) -> Result<bool, AppError> {
    let Some(ticket) = host.with_cascade(|c| c.select_district(id)) else {
        return Ok(true);
    };
    let district_id = ticket.parent().unwrap_or_default();
    let upazilas = locations.upazilas(district_id).await?;

    let applied = host.with_cascade(|c| c.apply_upazilas(ticket, upazilas));
    if !applied {
        debug!("Dropped stale upazila list for district {}", district_id);
    }
    Ok(applied)
}

/// Replays a saved preference level by level: each child selection is only
/// restored after its parent's options arrived and were still current.
pub async fn restore_area<H: CascadeHost>(
    host: &H,
    locations: &LocationService,
    preference: AreaPreference,
) -> Result<(), AppError> {
    let Some(division_id) = preference.division_id else {
        return Ok(());
    };
    if !choose_division(host, locations, Some(division_id)).await? {
        return Ok(());
    }

    let Some(district_id) = preference.district_id else {
        return Ok(());
    };
    if !choose_district(host, locations, Some(district_id)).await? {
        return Ok(());
    }

    if preference.upazila_id.is_some() {
        host.with_cascade(|c| {
            if c.district_id == Some(district_id) {
                c.select_upazila(preference.upazila_id);
            }
        });
    }
    Ok(())
}
