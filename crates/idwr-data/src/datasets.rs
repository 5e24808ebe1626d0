use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The canonical datasets every release must provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dataset {
    /// Confirmed cases by sex and prefecture (1999-2023).
    SexPrefecture,
    /// Confirmed cases by place of infection and prefecture (2001-2023).
    PlacePrefecture,
    /// Weekly rapid bulletin counts.
    Bullet,
    /// Sentinel surveillance counts.
    Sentinel,
    /// All sources combined.
    Unified,
    /// English prefecture names.
    PrefectureEn,
}

impl Dataset {
    pub const ALL: [Dataset; 6] = [
        Dataset::SexPrefecture,
        Dataset::PlacePrefecture,
        Dataset::Bullet,
        Dataset::Sentinel,
        Dataset::Unified,
        Dataset::PrefectureEn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dataset::SexPrefecture => "sex_prefecture",
            Dataset::PlacePrefecture => "place_prefecture",
            Dataset::Bullet => "bullet",
            Dataset::Sentinel => "sentinel",
            Dataset::Unified => "unified",
            Dataset::PrefectureEn => "prefecture_en",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Dataset::SexPrefecture => "sex_prefecture.parquet",
            Dataset::PlacePrefecture => "place_prefecture.parquet",
            Dataset::Bullet => "bullet.parquet",
            Dataset::Sentinel => "sentinel.parquet",
            Dataset::Unified => "unified.parquet",
            Dataset::PrefectureEn => "prefecture_en.parquet",
        }
    }
}

/// File names of all datasets in sorted order.
pub fn expected_file_names() -> Vec<&'static str> {
    let mut names: Vec<_> = Dataset::ALL.iter().map(|d| d.file_name()).collect();
    names.sort_unstable();
    names
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Dataset {
    type Err = Error;

    /// Accepts canonical names, the `sex` / `place` shorthands, and file names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_suffix(".parquet").unwrap_or(name);
        match name {
            "sex" => Ok(Dataset::SexPrefecture),
            "place" => Ok(Dataset::PlacePrefecture),
            _ => Dataset::ALL
                .into_iter()
                .find(|d| d.name() == name)
                .ok_or_else(|| Error::UnknownDataset { name: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve() {
        assert_eq!("sex".parse::<Dataset>().unwrap(), Dataset::SexPrefecture);
        assert_eq!("place".parse::<Dataset>().unwrap(), Dataset::PlacePrefecture);
        assert_eq!("unified.parquet".parse::<Dataset>().unwrap(), Dataset::Unified);
        for dataset in Dataset::ALL {
            assert_eq!(dataset.name().parse::<Dataset>().unwrap(), dataset);
        }
    }

    #[test]
    fn unknown_dataset() {
        let err = "weekly".parse::<Dataset>().unwrap_err();
        assert!(matches!(err, Error::UnknownDataset { name } if name == "weekly"));
    }

    #[test]
    fn expected_names_are_sorted_and_complete() {
        assert_eq!(expected_file_names(), vec![
            "bullet.parquet",
            "place_prefecture.parquet",
            "prefecture_en.parquet",
            "sentinel.parquet",
            "sex_prefecture.parquet",
            "unified.parquet",
        ]);
    }
}
