//! ORDER BY clauses over a closed set of columns.
//!
//! Column names cannot be bound as parameters, so the allow-list below is
//! the only thing standing between a `sort_by` query argument and the SQL
//! text.

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    // ---
    CreatedAt,
    UpdatedAt,
    DeviceName,
    MacAddress,
    LastSeen,
    DeviceType,
    Manufacturer,
    ExperimentId,
    PacketTimestamp,
    TotalPackets,
    TotalBytes,
    Port,
    Protocol,
    Percentage,
}

pub const DEFAULT_SORT_FIELD: SortField = SortField::CreatedAt;

impl SortField {
    // ---
    pub const ALL: [SortField; 14] = [
        SortField::CreatedAt,
        SortField::UpdatedAt,
        SortField::DeviceName,
        SortField::MacAddress,
        SortField::LastSeen,
        SortField::DeviceType,
        SortField::Manufacturer,
        SortField::ExperimentId,
        SortField::PacketTimestamp,
        SortField::TotalPackets,
        SortField::TotalBytes,
        SortField::Port,
        SortField::Protocol,
        SortField::Percentage,
    ];

    pub fn as_str(self) -> &'static str {
        // ---
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::DeviceName => "device_name",
            SortField::MacAddress => "mac_address",
            SortField::LastSeen => "last_seen",
            SortField::DeviceType => "device_type",
            SortField::Manufacturer => "manufacturer",
            SortField::ExperimentId => "experiment_id",
            SortField::PacketTimestamp => "packet_timestamp",
            SortField::TotalPackets => "total_packets",
            SortField::TotalBytes => "total_bytes",
            SortField::Port => "port",
            SortField::Protocol => "protocol",
            SortField::Percentage => "percentage",
        }
    }

    /// Exact match against the allow-list.
    pub fn parse(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    // ---
    /// Case-insensitive; anything other than ASC/DESC is DESC.
    pub fn normalize(direction: &str) -> Self {
        match direction.trim().to_uppercase().as_str() {
            "ASC" => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// `ORDER BY <field> <dir>`, falling back to `created_at` and `DESC`.
pub fn build_sort(field: &str, direction: &str) -> String {
    // ---
    let field = SortField::parse(field).unwrap_or(DEFAULT_SORT_FIELD);
    let direction = SortDirection::normalize(direction);
    format!("ORDER BY {} {}", field.as_str(), direction.as_str())
}
