use serde::{Deserialize, Serialize};

/// Serial and property numbers travel as strings on the wire (`"42"`) but
/// are `u64` in memory. Accepts either representation when parsing.
pub(crate) mod string_u64 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }
        match Raw::deserialize(d)? {
            Raw::Num(n) => Ok(n),
            Raw::Str(s) => s.trim().parse().map_err(de::Error::custom),
        }
    }
}

/// Remark prefix toggled by the BP flag.
pub const BP_REMARK_PREFIX: &str = "બિ.પ. ";

/// Replace Gujarati digits with their ASCII equivalents. Non-digit
/// characters pass through unchanged.
pub fn normalize_digits(input: &str) -> String {
    const GUJARATI: [char; 10] = ['૦', '૧', '૨', '૩', '૪', '૫', '૬', '૭', '૮', '૯'];
    input
        .chars()
        .map(|c| match GUJARATI.iter().position(|&g| g == c) {
            Some(i) => char::from(b'0' + i as u8),
            None => c,
        })
        .collect()
}

// ============================================================================
// Survey payload
// ============================================================================

/// Surveyor stamp embedded in the saved payload. The wire key keeps the
/// original app's spelling (`survayor`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surveyor {
    pub id: String,
    pub name: String,
    /// ISO-8601 timestamp, caller-provided.
    pub time: String,
}

/// The structured form payload, one property entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormData {
    #[serde(with = "string_u64")]
    pub serial_number: u64,
    pub area_name: String,
    #[serde(with = "string_u64")]
    pub property_number: u64,
    pub owner_name: String,
    #[serde(default)]
    pub old_property_number: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub property_name_on_record: String,
    #[serde(default)]
    pub house_category: String,
    #[serde(default)]
    pub kitchen_count: u32,
    #[serde(default)]
    pub bathroom_count: u32,
    #[serde(default)]
    pub veranda_count: u32,
    #[serde(default)]
    pub tap_count: u32,
    #[serde(default)]
    pub toilet_count: u32,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub bp: bool,
    #[serde(default)]
    pub land_area: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survayor: Option<Surveyor>,
}

impl FormData {
    /// Toggle the BP flag, prefixing or stripping the remark marker.
    pub fn set_bp(&mut self, bp: bool) {
        if bp == self.bp {
            return;
        }
        self.bp = bp;
        if bp {
            self.remarks = format!("{BP_REMARK_PREFIX}{}", self.remarks);
        } else {
            self.remarks = self.remarks.replacen(BP_REMARK_PREFIX, "", 1);
        }
        self.remarks = self.remarks.trim().to_string();
    }

    /// Mandatory-field check applied on save.
    pub fn validate(&self) -> Result<(), String> {
        if self.owner_name.trim().is_empty() {
            return Err("owner name is required".to_string());
        }
        if self.area_name.trim().is_empty() {
            return Err("area name is required".to_string());
        }
        Ok(())
    }
}

/// One room/hall/shop entry within a floor, with per-roof-type counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetail {
    /// Construction type label (pucca / kutcha / plot).
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub room_hall_shop_godown: String,
    #[serde(default)]
    pub slab_rooms: u32,
    #[serde(default)]
    pub tin_rooms: u32,
    #[serde(default)]
    pub wooden_rooms: u32,
    #[serde(default)]
    pub tile_rooms: u32,
}

/// A floor of the property. Owned exclusively by its parent record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    #[serde(default)]
    pub floor_type: String,
    #[serde(default)]
    pub room_details: Vec<RoomDetail>,
}

/// A survey row as stored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyRecord {
    /// Storage-assigned auto-increment key.
    pub id: i64,
    pub form: FormData,
    pub floors: Vec<Floor>,
    /// `false` = pending upload, `true` = confirmed by the server.
    pub is_synced: bool,
    /// ISO-8601, immutable, assigned on insert.
    pub created_at: String,
}

// ============================================================================
// Remote shapes
// ============================================================================

/// One record of the upload batch: the form fields flattened, plus floors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyUpload {
    #[serde(flatten)]
    pub form: FormData,
    pub floors: Vec<Floor>,
}

/// Body of `POST /sheet/sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBatch {
    pub payload: Vec<SurveyUpload>,
    pub work_id: String,
}

/// Village/site descriptor attached to a work assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkSpot {
    #[serde(default)]
    pub gaam: String,
    #[serde(default)]
    pub taluka: String,
    #[serde(default)]
    pub district: String,
}

/// The current work assignment as returned by `GET /work/{userId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkAssignment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub spot: Option<WorkSpot>,
}

/// Work lookup response. `nalla = true` signals "no active assignment" and
/// triggers a full local reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkLookup {
    #[serde(default)]
    pub work: Option<WorkAssignment>,
    #[serde(default)]
    pub nalla: bool,
}

/// Cached area/society reference entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub is_synced: bool,
}

// ============================================================================
// Flow results
// ============================================================================

/// Outcome of a sync run. `uploaded == 0` means there was nothing pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncResult {
    pub uploaded: usize,
}

/// What the startup reconciliation decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Server signalled "no active assignment"; all local state was wiped.
    AssignmentCleared,
    /// First assignment seen on this device; cursor reset for remote sourcing.
    FirstAssignment,
    /// Assignment changed; local records, cache, and cursor were purged.
    WorkChanged,
    /// Stored and fetched ids agree (or offline with a cached id).
    Unchanged,
    /// Neither a stored nor a fetched id exists; entry stays blocked.
    NoWorkId,
}

// ============================================================================
// Tests
// ============================================================================
