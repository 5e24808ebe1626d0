//! URL rules for the upstream files the datasets are built from.
//!
//! Annual confirmed-case workbooks moved between three hosts over the years,
//! and the weekly rapid bulletin CSVs exist in English and Japanese layouts.

use std::fmt;
use std::str::FromStr;

use idwr_fetch::{Fetcher, HttpClient, Probe};
use tracing::{debug, warn};

use crate::error::{Error, Result};

const BASE_KAKO: &str = "https://idsc.niid.go.jp/idwr/CDROM/Kako/";
const BASE_YDATA: &str = "https://id-info.jihs.go.jp/niid/images/idwr/ydata/";
const BASE_ANNUAL: &str = "https://id-info.jihs.go.jp/surveillance/idwr/annual/";

const BULLET_EN: &str = "https://id-info.jihs.go.jp/surveillance/idwr/en/rapid/";
const BULLET_JA: &str = "https://id-info.jihs.go.jp/surveillance/idwr/rapid/";
const BULLET_JA_NEW: &str = "https://id-info.jihs.go.jp/surveillance/idwr/jp/rapid/";

/// First year of the Heisei era minus one.
const HEISEI_OFFSET: u16 = 1988;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmedKind {
    Sex,
    Place,
}

impl ConfirmedKind {
    fn as_str(self) -> &'static str {
        match self {
            ConfirmedKind::Sex => "sex",
            ConfirmedKind::Place => "place",
        }
    }
}

impl fmt::Display for ConfirmedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ConfirmedKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sex" => Ok(ConfirmedKind::Sex),
            "place" => Ok(ConfirmedKind::Place),
            other => Err(format!("expected 'sex' or 'place', got '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    En,
    Ja,
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "en" => Ok(Lang::En),
            "ja" => Ok(Lang::Ja),
            other => Err(format!("expected 'en' or 'ja', got '{other}'")),
        }
    }
}

struct Rule {
    start:   u16,
    end:     u16,
    base:    &'static str,
    /// `{year}` and `{h}` (two digit Heisei year) are substituted.
    pattern: &'static str,
}

const RULES_SEX: &[Rule] = &[
    Rule { start: 1999, end: 2000, base: BASE_KAKO, pattern: "H{h}/Syuukei/Syu_11.xls" },
    Rule { start: 2001, end: 2010, base: BASE_KAKO, pattern: "H{h}/Syuukei/Syu_01_1.xls" },
    Rule { start: 2011, end: 2013, base: BASE_YDATA, pattern: "{year}/Syuukei/Syu_01_1.xls" },
    Rule { start: 2014, end: 2020, base: BASE_YDATA, pattern: "{year}/Syuukei/Syu_01_1.xlsx" },
    Rule { start: 2021, end: u16::MAX, base: BASE_ANNUAL, pattern: "{year}/syulist/Syu_01_1.xlsx" },
];

const RULES_PLACE: &[Rule] = &[
    Rule { start: 2001, end: 2010, base: BASE_KAKO, pattern: "H{h}/Syuukei/Syu_02_1.xls" },
    Rule { start: 2011, end: 2013, base: BASE_YDATA, pattern: "{year}/Syuukei/Syu_02_1.xls" },
    Rule { start: 2014, end: 2020, base: BASE_YDATA, pattern: "{year}/Syuukei/Syu_02_1.xlsx" },
    Rule { start: 2021, end: u16::MAX, base: BASE_ANNUAL, pattern: "{year}/syulist/Syu_02_1.xlsx" },
];

/// URL of the annual confirmed-case workbook for `year`.
pub fn confirmed_url(year: u16, kind: ConfirmedKind) -> Result<String> {
    let rules = match kind {
        ConfirmedKind::Sex => RULES_SEX,
        ConfirmedKind::Place => {
            if year <= 2000 {
                return Err(Error::InvalidYear {
                    year,
                    reason: "place data starts in 2001",
                });
            }
            RULES_PLACE
        }
    };

    let rule = rules
        .iter()
        .find(|r| (r.start..=r.end).contains(&year))
        .ok_or(Error::NoUrlRule {
            year,
            kind: kind.as_str(),
        })?;

    let path = rule
        .pattern
        .replace("{year}", &year.to_string())
        .replace("{h}", &format!("{:02}", year - HEISEI_OFFSET));
    Ok(format!("{}{path}", rule.base))
}

/// Candidate bulletin CSV URLs for `year`.
///
/// Without `weeks` all of 1..=53 are listed; weeks outside that range are
/// dropped, and nothing left is an error.
pub fn bullet_urls(year: u16, weeks: Option<&[u8]>, lang: Lang) -> Result<Vec<String>> {
    if year <= 2023 {
        return Err(Error::InvalidYear {
            year,
            reason: "bulletin data starts in 2024",
        });
    }

    let weeks: Vec<u8> = match weeks {
        Some(weeks) => weeks.iter().copied().filter(|w| (1..=53).contains(w)).collect(),
        None => (1..=53).collect(),
    };
    if weeks.is_empty() {
        return Err(Error::InvalidWeek);
    }

    Ok(weeks.into_iter().map(|week| bullet_url(year, week, lang)).collect())
}

fn bullet_url(year: u16, week: u8, lang: Lang) -> String {
    match lang {
        Lang::En => format!("{BULLET_EN}{year}/{week:02}/zensu{week:02}.csv"),
        Lang::Ja => {
            let base = if year >= 2025 && week >= 11 { BULLET_JA_NEW } else { BULLET_JA };
            format!("{base}{year}/{week}/{year}-{week:02}-zensu.csv")
        }
    }
}

/// Probe outcome for a set of bulletin URLs.
///
/// A URL is available only when the server reports a non-empty body. Request
/// failures land in `failed`, never in `absent`.
#[derive(Debug, Default)]
pub struct BulletAvailability {
    pub available: Vec<String>,
    pub absent:    Vec<String>,
    pub failed:    Vec<(String, idwr_fetch::Error)>,
}

/// Probe every candidate from [`bullet_urls`].
pub async fn probe_bullet_urls<C: HttpClient>(
    fetcher: &Fetcher<C>,
    year: u16,
    weeks: Option<&[u8]>,
    lang: Lang,
) -> Result<BulletAvailability> {
    let mut availability = BulletAvailability::default();
    for url in bullet_urls(year, weeks, lang)? {
        match fetcher.probe(&url).await {
            Ok(probe) if probe.has_content() => availability.available.push(url),
            Ok(Probe::Present { .. }) | Ok(Probe::Absent) => {
                debug!(url, "no bulletin published");
                availability.absent.push(url);
            }
            Err(err) => {
                warn!(url, error = %err, "bulletin probe failed");
                availability.failed.push((url, err));
            }
        }
    }
    Ok(availability)
}
