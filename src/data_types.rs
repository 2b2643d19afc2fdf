/*!
 * Data type definitions for PBJ staffing records
 *
 * This module contains type-safe representations of the quarterly
 * Payroll-Based Journal aggregates, facility rows, provider profiles and the
 * side tables (region membership, state minimums, regulatory-status feed)
 * that the summary engine consumes.
 */

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::{FACILITY_ID_WIDTH, REGION_COUNT};
use crate::{Result, WrappedError};

/// CMS Certification Number, canonicalized to a fixed-width string
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityId(String);

impl FacilityId {
    /// Canonicalize a raw facility identifier
    ///
    /// Numeric identifiers are left-padded with zeros to the fixed width, so
    /// `"15009"`, `"015009"` and `"15009.0"` all become `"015009"`.
    pub fn canonicalize(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_suffix(".0").unwrap_or(trimmed);
        let cleaned: String = trimmed
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' ' | '.'))
            .collect();

        if cleaned.is_empty()
            || cleaned.len() > FACILITY_ID_WIDTH
            || !cleaned.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(WrappedError::invalid_facility_id(raw));
        }

        if cleaned.chars().all(|c| c.is_ascii_digit()) {
            Ok(FacilityId(format!("{:0>width$}", cleaned, width = FACILITY_ID_WIDTH)))
        } else if cleaned.len() == FACILITY_ID_WIDTH {
            Ok(FacilityId(cleaned.to_ascii_uppercase()))
        } else {
            Err(WrappedError::invalid_facility_id(raw))
        }
    }

    /// Get the identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Calendar quarter in the `YYYYQ[1-4]` shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuarterTag {
    year: u16,
    quarter: u8,
}

impl QuarterTag {
    pub fn new(year: u16, quarter: u8) -> Result<Self> {
        if !(1..=4).contains(&quarter) || !(1000..=9999).contains(&year) {
            return Err(WrappedError::invalid_quarter(&format!("{}Q{}", year, quarter)));
        }
        Ok(Self { year, quarter })
    }

    /// Parse a tag such as `2025Q2`
    pub fn parse(value: &str) -> Result<Self> {
        let upper = value.trim().to_ascii_uppercase();
        let bytes = upper.as_bytes();
        if bytes.len() != 6
            || !bytes[..4].iter().all(u8::is_ascii_digit)
            || bytes[4] != b'Q'
            || !(b'1'..=b'4').contains(&bytes[5])
        {
            return Err(WrappedError::invalid_quarter(value));
        }
        let year: u16 = upper[..4].parse().map_err(|_| WrappedError::invalid_quarter(value))?;
        Self::new(year, bytes[5] - b'0')
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// The quarter immediately before this one
    pub fn previous(&self) -> Self {
        if self.quarter == 1 {
            Self { year: self.year - 1, quarter: 4 }
        } else {
            Self { year: self.year, quarter: self.quarter - 1 }
        }
    }

    /// Last calendar day of the quarter
    pub fn end_date(&self) -> NaiveDate {
        let (year, month) = if self.quarter == 4 {
            (self.year as i32 + 1, 1)
        } else {
            (self.year as i32, self.quarter as u32 * 3 + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }
}

impl fmt::Display for QuarterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for QuarterTag {
    type Err = WrappedError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for QuarterTag {
    type Error = WrappedError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<QuarterTag> for String {
    fn from(tag: QuarterTag) -> Self {
        tag.to_string()
    }
}

/// The two quarters compared by one computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuarterPair {
    pub current: QuarterTag,
    pub prior: QuarterTag,
}

impl QuarterPair {
    pub fn new(current: QuarterTag, prior: QuarterTag) -> Result<Self> {
        if prior >= current {
            return Err(WrappedError::QuarterMismatch {
                message: format!("prior quarter {} must precede current quarter {}", prior, current),
            });
        }
        Ok(Self { current, prior })
    }
}

/// State Code (US states, DC, territories, ZZ)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StateCode {
    AK, AL, AR, AS, AZ, CA, CO, CT, DC, DE, FL, FM, GA, GU, HI, IA, ID, IL, IN, KS, KY, LA, MA, MD, ME, MH, MI, MN, MO, MP, MS, MT, NC, ND, NE, NH, NJ, NM, NV, NY, OH, OK, OR, PA, PR, PW, RI, SC, SD, TN, TX, UT, VA, VI, VT, WA, WI, WV, WY, ZZ,
}

impl StateCode {
    pub const ALL: [StateCode; 60] = {
        use StateCode::*;
        [
            AK, AL, AR, AS, AZ, CA, CO, CT, DC, DE, FL, FM, GA, GU, HI, IA, ID, IL, IN, KS,
            KY, LA, MA, MD, ME, MH, MI, MN, MO, MP, MS, MT, NC, ND, NE, NH, NJ, NM, NV, NY,
            OH, OK, OR, PA, PR, PW, RI, SC, SD, TN, TX, UT, VA, VI, VT, WA, WI, WV, WY, ZZ,
        ]
    };

    pub fn from_code(code: &str) -> Option<Self> {
        let upper = code.trim().to_ascii_uppercase();
        Self::ALL.iter().copied().find(|s| s.as_code() == upper)
    }

    pub fn as_code(&self) -> &'static str {
        use StateCode::*;
        match self {
            AK => "AK", AL => "AL", AR => "AR", AS => "AS", AZ => "AZ", CA => "CA", CO => "CO", CT => "CT", DC => "DC", DE => "DE", FL => "FL", FM => "FM", GA => "GA", GU => "GU", HI => "HI", IA => "IA", ID => "ID", IL => "IL", IN => "IN", KS => "KS", KY => "KY", LA => "LA", MA => "MA", MD => "MD", ME => "ME", MH => "MH", MI => "MI", MN => "MN", MO => "MO", MP => "MP", MS => "MS", MT => "MT", NC => "NC", ND => "ND", NE => "NE", NH => "NH", NJ => "NJ", NM => "NM", NV => "NV", NY => "NY", OH => "OH", OK => "OK", OR => "OR", PA => "PA", PR => "PR", PW => "PW", RI => "RI", SC => "SC", SD => "SD", TN => "TN", TX => "TX", UT => "UT", VA => "VA", VI => "VI", VT => "VT", WA => "WA", WI => "WI", WV => "WV", WY => "WY", ZZ => "ZZ",
        }
    }

    /// Full English name
    pub fn name(&self) -> &'static str {
        use StateCode::*;
        match self {
            AK => "Alaska", AL => "Alabama", AR => "Arkansas", AS => "American Samoa", AZ => "Arizona",
            CA => "California", CO => "Colorado", CT => "Connecticut", DC => "District of Columbia",
            DE => "Delaware", FL => "Florida", FM => "Federated States of Micronesia", GA => "Georgia",
            GU => "Guam", HI => "Hawaii", IA => "Iowa", ID => "Idaho", IL => "Illinois", IN => "Indiana",
            KS => "Kansas", KY => "Kentucky", LA => "Louisiana", MA => "Massachusetts", MD => "Maryland",
            ME => "Maine", MH => "Marshall Islands", MI => "Michigan", MN => "Minnesota", MO => "Missouri",
            MP => "Northern Mariana Islands", MS => "Mississippi", MT => "Montana", NC => "North Carolina",
            ND => "North Dakota", NE => "Nebraska", NH => "New Hampshire", NJ => "New Jersey",
            NM => "New Mexico", NV => "Nevada", NY => "New York", OH => "Ohio", OK => "Oklahoma",
            OR => "Oregon", PA => "Pennsylvania", PR => "Puerto Rico", PW => "Palau", RI => "Rhode Island",
            SC => "South Carolina", SD => "South Dakota", TN => "Tennessee", TX => "Texas", UT => "Utah",
            VA => "Virginia", VI => "U.S. Virgin Islands", VT => "Vermont", WA => "Washington",
            WI => "Wisconsin", WV => "West Virginia", WY => "Wyoming", ZZ => "Unknown",
        }
    }

    /// Look up by full name; `name` must already be lowercase with single spaces
    pub fn from_normalized_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| {
            let candidate = s.name().to_ascii_lowercase().replace('.', "");
            candidate == name || (*s == StateCode::VI && name == "virgin islands")
        })
    }

    /// Territories and the unknown code sit outside state peer comparisons
    pub fn is_territory(&self) -> bool {
        use StateCode::*;
        matches!(self, AS | FM | GU | MH | MP | PR | PW | VI | ZZ)
    }

    /// The 50 states plus DC
    pub fn states_and_dc() -> impl Iterator<Item = StateCode> {
        Self::ALL.iter().copied().filter(|s| !s.is_territory())
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// One of the ten CMS administrative regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionNumber(u8);

impl RegionNumber {
    pub fn new(number: u8) -> Option<Self> {
        (1..=REGION_COUNT).contains(&number).then_some(Self(number))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = RegionNumber> {
        (1..=REGION_COUNT).map(RegionNumber)
    }

    /// City of the regional office
    pub fn office(&self) -> &'static str {
        match self.0 {
            1 => "Boston",
            2 => "New York",
            3 => "Philadelphia",
            4 => "Atlanta",
            5 => "Chicago",
            6 => "Dallas",
            7 => "Kansas City",
            8 => "Denver",
            9 => "San Francisco",
            _ => "Seattle",
        }
    }

    pub fn display_name(&self) -> String {
        format!("Region {} ({})", self.0, self.office())
    }
}

impl fmt::Display for RegionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region{}", self.0)
    }
}

/// Scope granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    Usa,
    State,
    Region,
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeType::Usa => write!(f, "usa"),
            ScopeType::State => write!(f, "state"),
            ScopeType::Region => write!(f, "region"),
        }
    }
}

/// A resolved summary scope; also the key of pre-aggregated entity rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    Usa,
    State(StateCode),
    Region(RegionNumber),
}

impl Scope {
    pub fn scope_type(&self) -> ScopeType {
        match self {
            Scope::Usa => ScopeType::Usa,
            Scope::State(_) => ScopeType::State,
            Scope::Region(_) => ScopeType::Region,
        }
    }

    /// Canonical key such as `usa`, `ny` or `region2`
    pub fn canonical_key(&self) -> String {
        match self {
            Scope::Usa => "usa".to_string(),
            Scope::State(state) => state.as_code().to_ascii_lowercase(),
            Scope::Region(region) => region.to_string(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Scope::Usa => "United States".to_string(),
            Scope::State(state) => state.name().to_string(),
            Scope::Region(region) => region.display_name(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_key())
    }
}

/// Staffing hours by category
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StaffingHours {
    pub total: f64,
    pub rn: f64,
    pub direct_care: f64,
    pub rn_direct_care: f64,
    pub nurse_aide: f64,
    pub contract: f64,
}

/// Hours per resident per day by category
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HprdFamily {
    pub total: f64,
    pub direct_care: f64,
    pub rn: f64,
    pub rn_direct_care: f64,
    pub nurse_aide: Option<f64>,
}

/// Pre-aggregated national, state or region row for one quarter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyEntityMetrics {
    pub entity: Scope,
    pub quarter: QuarterTag,
    pub facility_count: u32,
    pub avg_days_reported: Option<f64>,
    pub total_resident_days: Option<f64>,
    pub avg_daily_census: f64,
    pub hours: StaffingHours,
    pub hprd: HprdFamily,
    pub contract_percent: f64,
    pub direct_care_percent: f64,
}

impl QuarterlyEntityMetrics {
    /// Average daily residents, falling back to the census figure
    pub fn avg_daily_residents(&self) -> f64 {
        match (self.total_resident_days, self.avg_days_reported) {
            (Some(resident_days), Some(days)) if days > 0.0 => resident_days / days,
            _ => self.avg_daily_census,
        }
    }
}

/// Outcome of the column-shift check applied at ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffingQuality {
    Valid,
    Repaired,
    /// Staffing values were unrecoverable and have been zeroed
    Zeroed,
}

/// Per-facility staffing for one quarter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityMetrics {
    pub facility_id: FacilityId,
    pub quarter: QuarterTag,
    pub state: StateCode,
    pub total_hprd: f64,
    pub direct_care_hprd: f64,
    pub rn_hprd: f64,
    pub rn_direct_care_hprd: f64,
    pub contract_percent: f64,
    pub census: f64,
    pub quality: StaffingQuality,
}

impl FacilityMetrics {
    /// Whether staffing values may feed rankings, extremes and medians
    pub fn has_usable_staffing(&self) -> bool {
        self.quality != StaffingQuality::Zeroed && self.total_hprd > 0.0
    }
}

/// Provider profile row for one facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub facility_id: FacilityId,
    pub quarter: QuarterTag,
    pub name: String,
    pub state: StateCode,
    pub city: Option<String>,
    pub county: Option<String>,
    pub ownership_raw: String,
    pub regulatory_status_raw: String,
    pub case_mix_expected_hprd: Option<f64>,
    pub overall_rating: Option<u8>,
    pub staffing_rating: Option<u8>,
    pub avg_residents_per_day: Option<f64>,
}

impl ProviderProfile {
    /// Reported staffing as a percentage of the case-mix benchmark
    pub fn percent_of_expected(&self, total_hprd: f64) -> Option<f64> {
        match self.case_mix_expected_hprd {
            Some(expected) if expected > 0.0 => Some(total_hprd / expected * 100.0),
            _ => None,
        }
    }
}

/// Minimum staffing rule of a jurisdiction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateMinimumStandard {
    pub min_hprd: f64,
    pub max_hprd: Option<f64>,
    pub is_range: bool,
}

impl StateMinimumStandard {
    pub fn display_label(&self) -> String {
        match (self.is_range, self.max_hprd) {
            (true, Some(max)) => format!("{:.2}-{:.2} HPRD", self.min_hprd, max),
            _ => format!("{:.2} HPRD", self.min_hprd),
        }
    }
}

/// Ownership category of a facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OwnershipCategory {
    ForProfit,
    NonProfit,
    Government,
}

/// Enforcement category of a facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegulatoryCategory {
    Sff,
    Candidate,
    Graduate,
    Terminated,
    None,
}

impl RegulatoryCategory {
    pub const ALL: [RegulatoryCategory; 5] = [
        RegulatoryCategory::Sff,
        RegulatoryCategory::Candidate,
        RegulatoryCategory::Graduate,
        RegulatoryCategory::Terminated,
        RegulatoryCategory::None,
    ];
}

/// Entry of the richer special-focus status feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryFeedEntry {
    pub facility_id: FacilityId,
    pub category: RegulatoryCategory,
    pub months_as_sff: Option<u32>,
    pub designated_on: Option<NaiveDate>,
    pub last_inspection: Option<NaiveDate>,
}

impl RegulatoryFeedEntry {
    /// Months in the current designation as of `as_of`
    pub fn tenure_months(&self, as_of: NaiveDate) -> Option<u32> {
        if let Some(months) = self.months_as_sff {
            return Some(months);
        }
        let start = self.designated_on?;
        if start > as_of {
            return Some(0);
        }
        let months = (as_of.year() - start.year()) * 12 + as_of.month() as i32 - start.month() as i32;
        Some(months.max(0) as u32)
    }
}

/// Region number to member jurisdictions; each jurisdiction belongs to one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMembership {
    members: BTreeMap<RegionNumber, BTreeSet<StateCode>>,
}

impl RegionMembership {
    /// The standard CMS regional office assignment
    pub fn standard() -> Self {
        use StateCode::*;
        let table: [(u8, &[StateCode]); 10] = [
            (1, &[CT, ME, MA, NH, RI, VT]),
            (2, &[NJ, NY, PR, VI]),
            (3, &[DE, DC, MD, PA, VA, WV]),
            (4, &[AL, FL, GA, KY, MS, NC, SC, TN]),
            (5, &[IL, IN, MI, MN, OH, WI]),
            (6, &[AR, LA, NM, OK, TX]),
            (7, &[IA, KS, MO, NE]),
            (8, &[CO, MT, ND, SD, UT, WY]),
            (9, &[AZ, CA, HI, NV, AS, GU, MP]),
            (10, &[AK, ID, OR, WA]),
        ];
        let members = table
            .iter()
            .map(|(number, states)| (RegionNumber(*number), states.iter().copied().collect()))
            .collect();
        Self { members }
    }

    /// Build from `(region, jurisdiction)` pairs
    ///
    /// The table must place every state and DC in exactly one region.
    /// Territories are optional.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (RegionNumber, StateCode)>,
    {
        let mut members: BTreeMap<RegionNumber, BTreeSet<StateCode>> = BTreeMap::new();
        let mut seen: BTreeMap<StateCode, RegionNumber> = BTreeMap::new();
        for (region, state) in pairs {
            if let Some(existing) = seen.insert(state, region) {
                if existing != region {
                    return Err(WrappedError::DataValidation {
                        message: format!("{} is assigned to both {} and {}", state, existing, region),
                        field: Some("region".to_string()),
                        value: Some(state.to_string()),
                        context: Default::default(),
                    });
                }
            }
            members.entry(region).or_default().insert(state);
        }

        let missing: Vec<String> = StateCode::states_and_dc()
            .filter(|state| !seen.contains_key(state))
            .map(|state| state.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(WrappedError::DataValidation {
                message: format!("region membership does not cover {}", missing.join(", ")),
                field: Some("state".to_string()),
                value: None,
                context: Default::default(),
            });
        }
        Ok(Self { members })
    }

    pub fn members(&self, region: RegionNumber) -> Option<&BTreeSet<StateCode>> {
        self.members.get(&region)
    }

    pub fn region_of(&self, state: StateCode) -> Option<RegionNumber> {
        self.members
            .iter()
            .find(|(_, states)| states.contains(&state))
            .map(|(region, _)| *region)
    }
}

impl Default for RegionMembership {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_id_canonicalization() {
        assert_eq!(FacilityId::canonicalize("15009").unwrap().as_str(), "015009");
        assert_eq!(FacilityId::canonicalize(" 015009 ").unwrap().as_str(), "015009");
        assert_eq!(FacilityId::canonicalize("15009.0").unwrap().as_str(), "015009");
        assert_eq!(FacilityId::canonicalize("45a123").unwrap().as_str(), "45A123");
        assert!(FacilityId::canonicalize("").is_err());
        assert!(FacilityId::canonicalize("1234567").is_err());
        assert!(FacilityId::canonicalize("12#45").is_err());
        assert!(FacilityId::canonicalize("A12").is_err());
    }

    #[test]
    fn test_quarter_tag_shape() {
        let tag = QuarterTag::parse("2025Q2").unwrap();
        assert_eq!(tag.year(), 2025);
        assert_eq!(tag.quarter(), 2);
        assert_eq!(QuarterTag::parse("2025q2").unwrap(), tag);
        assert!(QuarterTag::parse("2025Q5").is_err());
        assert!(QuarterTag::parse("2025Q0").is_err());
        assert!(QuarterTag::parse("25Q1").is_err());
        assert!(QuarterTag::parse("2025-Q1").is_err());
        assert_eq!(tag.to_string(), "2025Q2");
    }

    #[test]
    fn test_quarter_previous_and_end_date() {
        let q1 = QuarterTag::parse("2025Q1").unwrap();
        assert_eq!(q1.previous(), QuarterTag::parse("2024Q4").unwrap());
        assert_eq!(q1.end_date(), NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
        let q4 = QuarterTag::parse("2024Q4").unwrap();
        assert_eq!(q4.end_date(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_quarter_pair_ordering() {
        let current = QuarterTag::parse("2025Q2").unwrap();
        let prior = QuarterTag::parse("2025Q1").unwrap();
        assert!(QuarterPair::new(current, prior).is_ok());
        assert!(QuarterPair::new(prior, current).is_err());
        assert!(QuarterPair::new(current, current).is_err());
    }

    #[test]
    fn test_standard_regions_partition_states() {
        let membership = RegionMembership::standard();
        for state in StateCode::states_and_dc() {
            assert!(membership.region_of(state).is_some(), "{} has no region", state);
        }
        let region2 = membership.members(RegionNumber::new(2).unwrap()).unwrap();
        let expected: BTreeSet<_> = [StateCode::NY, StateCode::NJ, StateCode::PR, StateCode::VI].into_iter().collect();
        assert_eq!(region2, &expected);
    }

    #[test]
    fn test_region_membership_rejects_double_assignment() {
        let r1 = RegionNumber::new(1).unwrap();
        let r2 = RegionNumber::new(2).unwrap();
        let mut pairs = standard_pairs();
        pairs.push((r1, StateCode::NY));
        assert!(matches!(
            RegionMembership::from_pairs(pairs),
            Err(WrappedError::DataValidation { .. })
        ));

        // the same assignment twice is harmless
        let mut pairs = standard_pairs();
        pairs.push((r2, StateCode::NY));
        assert_eq!(RegionMembership::from_pairs(pairs).unwrap(), RegionMembership::standard());
    }

    fn standard_pairs() -> Vec<(RegionNumber, StateCode)> {
        let standard = RegionMembership::standard();
        RegionNumber::all()
            .flat_map(|region| {
                standard
                    .members(region)
                    .into_iter()
                    .flatten()
                    .map(move |state| (region, *state))
            })
            .collect()
    }

    #[test]
    fn test_region_membership_requires_full_coverage() {
        let mut pairs = standard_pairs();
        pairs.retain(|(_, state)| *state != StateCode::WY && *state != StateCode::DC);
        let err = RegionMembership::from_pairs(pairs).unwrap_err();
        match err {
            WrappedError::DataValidation { message, .. } => {
                assert!(message.contains("DC"), "{message}");
                assert!(message.contains("WY"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }

        // territories may be left out
        let mut pairs = standard_pairs();
        pairs.retain(|(_, state)| !state.is_territory());
        assert!(RegionMembership::from_pairs(pairs).is_ok());
    }

    #[test]
    fn test_tenure_months_from_designation_date() {
        let entry = RegulatoryFeedEntry {
            facility_id: FacilityId::canonicalize("1").unwrap(),
            category: RegulatoryCategory::Sff,
            months_as_sff: None,
            designated_on: NaiveDate::from_ymd_opt(2025, 4, 15),
            last_inspection: None,
        };
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        assert_eq!(entry.tenure_months(as_of), Some(2));
    }

    #[test]
    fn test_avg_daily_residents_fallback() {
        let mut row = QuarterlyEntityMetrics {
            entity: Scope::Usa,
            quarter: QuarterTag::parse("2025Q1").unwrap(),
            facility_count: 10,
            avg_days_reported: Some(90.0),
            total_resident_days: Some(9000.0),
            avg_daily_census: 95.0,
            hours: StaffingHours::default(),
            hprd: HprdFamily::default(),
            contract_percent: 0.0,
            direct_care_percent: 0.0,
        };
        assert_eq!(row.avg_daily_residents(), 100.0);
        row.avg_days_reported = None;
        assert_eq!(row.avg_daily_residents(), 95.0);
    }
}
