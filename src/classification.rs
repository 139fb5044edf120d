//! Hazard classification of volumes

use tracing::debug;
use wms_labels_types::{CargoKind, HazardClass, Volume};

/// Hazard attributes applied to a volume as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazardProfile {
    pub class: HazardClass,
    pub un_number: String,
    pub risk_code: String,
}

impl HazardProfile {
    /// Chemical cargo is hazardous and carries exactly the codes supplied.
    /// General cargo is non-hazardous with no codes, whatever was supplied.
    pub fn from_cargo(kind: CargoKind, un_number: Option<&str>, risk_code: Option<&str>) -> Self {
        match kind {
            CargoKind::Chemical => Self {
                class: HazardClass::Hazardous,
                un_number: un_number.map(str::trim).unwrap_or_default().to_string(),
                risk_code: risk_code.map(str::trim).unwrap_or_default().to_string(),
            },
            CargoKind::General => Self::of_class(HazardClass::NonHazardous),
        }
    }

    /// Profile without codes
    pub fn of_class(class: HazardClass) -> Self {
        Self {
            class,
            un_number: String::new(),
            risk_code: String::new(),
        }
    }

    fn apply(self, volume: &mut Volume) {
        volume.hazard_class = self.class;
        if self.class.carries_codes() {
            volume.un_number = self.un_number;
            volume.risk_code = self.risk_code;
        } else {
            volume.un_number.clear();
            volume.risk_code.clear();
        }
    }
}

/// Return an updated copy of `volume`.
///
/// `area` is always set. The hazard profile replaces the previous one
/// wholesale when supplied and is left untouched otherwise.
pub fn classify_volume(volume: &Volume, area: &str, hazard: Option<HazardProfile>) -> Volume {
    let mut updated = volume.clone();
    updated.area = area.to_string();
    if let Some(profile) = hazard {
        debug!(volume_id = %volume.id, class = %profile.class, "reclassifying volume");
        profile.apply(&mut updated);
    }
    updated
}
