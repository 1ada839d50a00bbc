use crate::model::AccessError;

/// ordered list of accepted column names for one logical field. matching
/// is case-sensitive and the first alias present in the source wins.
#[derive(Debug, Clone, Copy)]
pub struct ColumnAlias {
    pub field: &'static str,
    pub aliases: &'static [&'static str],
}

pub const FACILITY_NAME: ColumnAlias = ColumnAlias {
    field: "name",
    aliases: &["name", "facility_name", "Name", "Facility_Name", "FACILITY_NAME"],
};

pub const FACILITY_LATITUDE: ColumnAlias = ColumnAlias {
    field: "latitude",
    aliases: &["latitude", "lat", "Latitude", "Lat", "LAT"],
};

pub const FACILITY_LONGITUDE: ColumnAlias = ColumnAlias {
    field: "longitude",
    aliases: &["longitude", "lon", "long", "Longitude", "Lon", "Long", "LON"],
};

pub const DISTRICT_NAME: ColumnAlias = ColumnAlias {
    field: "district name",
    aliases: &[
        "shapeName",
        "name",
        "NAME",
        "ADM2_EN",
        "ADM1_EN",
        "district",
        "District",
    ],
};

pub const DISTRICT_ID: ColumnAlias = ColumnAlias {
    field: "district id",
    aliases: &["shapeID", "id", "ID", "district_id"],
};

impl ColumnAlias {
    /// position of the first alias found in `headers`.
    pub fn find<'a, I>(&self, headers: I) -> Option<(usize, &'static str)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let headers = headers.into_iter().collect::<Vec<_>>();
        self.aliases.iter().find_map(|alias| {
            headers
                .iter()
                .position(|h| h == alias)
                .map(|idx| (idx, *alias))
        })
    }

    /// position of the first alias found in `headers`, failing with an
    /// input validation error that lists every accepted alias.
    pub fn resolve<'a, I>(&self, headers: I, source: &str) -> Result<usize, AccessError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.find(headers).map(|(idx, _)| idx).ok_or_else(|| {
            AccessError::InputValidation(format!(
                "{source} has no {} column, expected one of [{}]",
                self.field,
                self.aliases.join(", ")
            ))
        })
    }

    /// the first alias for which `has_field` returns true.
    pub fn find_by<F>(&self, has_field: F) -> Option<&'static str>
    where
        F: Fn(&str) -> bool,
    {
        self.aliases.iter().copied().find(|a| has_field(a))
    }
}
