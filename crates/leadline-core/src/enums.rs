//! Closed vocabularies for lead fields. Wire strings are exact: parsing is
//! strict and unknown values are rejected, never coerced.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    Chandigarh,
    Mohali,
    Zirakpur,
    Panchkula,
    Other,
}

impl City {
    pub const ALL: [City; 5] = [
        City::Chandigarh,
        City::Mohali,
        City::Zirakpur,
        City::Panchkula,
        City::Other,
    ];
}

impl std::fmt::Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chandigarh => write!(f, "Chandigarh"),
            Self::Mohali => write!(f, "Mohali"),
            Self::Zirakpur => write!(f, "Zirakpur"),
            Self::Panchkula => write!(f, "Panchkula"),
            Self::Other => write!(f, "Other"),
        }
    }
}

impl std::str::FromStr for City {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Chandigarh" => Ok(Self::Chandigarh),
            "Mohali" => Ok(Self::Mohali),
            "Zirakpur" => Ok(Self::Zirakpur),
            "Panchkula" => Ok(Self::Panchkula),
            "Other" => Ok(Self::Other),
            other => Err(format!("unknown city: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Apartment,
    Villa,
    Plot,
    Office,
    Retail,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::Apartment,
        PropertyType::Villa,
        PropertyType::Plot,
        PropertyType::Office,
        PropertyType::Retail,
    ];

    /// Residential types require a BHK category on the lead.
    pub fn is_residential(&self) -> bool {
        matches!(self, Self::Apartment | Self::Villa)
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apartment => write!(f, "Apartment"),
            Self::Villa => write!(f, "Villa"),
            Self::Plot => write!(f, "Plot"),
            Self::Office => write!(f, "Office"),
            Self::Retail => write!(f, "Retail"),
        }
    }
}

impl std::str::FromStr for PropertyType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Apartment" => Ok(Self::Apartment),
            "Villa" => Ok(Self::Villa),
            "Plot" => Ok(Self::Plot),
            "Office" => Ok(Self::Office),
            "Retail" => Ok(Self::Retail),
            other => Err(format!("unknown property type: {other}")),
        }
    }
}

/// Bedroom-count category. The wire strings for the numeric variants are
/// bare digits ("1".."4"), not variant names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bhk {
    Studio,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
}

impl Bhk {
    pub const ALL: [Bhk; 5] = [Bhk::Studio, Bhk::One, Bhk::Two, Bhk::Three, Bhk::Four];
}

impl std::fmt::Display for Bhk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Studio => write!(f, "Studio"),
            Self::One => write!(f, "1"),
            Self::Two => write!(f, "2"),
            Self::Three => write!(f, "3"),
            Self::Four => write!(f, "4"),
        }
    }
}

impl std::str::FromStr for Bhk {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Studio" => Ok(Self::Studio),
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            "3" => Ok(Self::Three),
            "4" => Ok(Self::Four),
            other => Err(format!("unknown bhk: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purpose {
    Buy,
    Rent,
}

impl Purpose {
    pub const ALL: [Purpose; 2] = [Purpose::Buy, Purpose::Rent];
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Rent => write!(f, "Rent"),
        }
    }
}

impl std::str::FromStr for Purpose {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buy" => Ok(Self::Buy),
            "Rent" => Ok(Self::Rent),
            other => Err(format!("unknown purpose: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeline {
    #[serde(rename = "0-3m")]
    ZeroToThreeMonths,
    #[serde(rename = "3-6m")]
    ThreeToSixMonths,
    #[serde(rename = ">6m")]
    MoreThanSixMonths,
    Exploring,
}

impl Timeline {
    pub const ALL: [Timeline; 4] = [
        Timeline::ZeroToThreeMonths,
        Timeline::ThreeToSixMonths,
        Timeline::MoreThanSixMonths,
        Timeline::Exploring,
    ];
}

impl std::fmt::Display for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroToThreeMonths => write!(f, "0-3m"),
            Self::ThreeToSixMonths => write!(f, "3-6m"),
            Self::MoreThanSixMonths => write!(f, ">6m"),
            Self::Exploring => write!(f, "Exploring"),
        }
    }
}

impl std::str::FromStr for Timeline {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0-3m" => Ok(Self::ZeroToThreeMonths),
            "3-6m" => Ok(Self::ThreeToSixMonths),
            ">6m" => Ok(Self::MoreThanSixMonths),
            "Exploring" => Ok(Self::Exploring),
            other => Err(format!("unknown timeline: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Website,
    Referral,
    #[serde(rename = "Walk-in")]
    WalkIn,
    Call,
    Other,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::Website,
        Source::Referral,
        Source::WalkIn,
        Source::Call,
        Source::Other,
    ];
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Website => write!(f, "Website"),
            Self::Referral => write!(f, "Referral"),
            Self::WalkIn => write!(f, "Walk-in"),
            Self::Call => write!(f, "Call"),
            Self::Other => write!(f, "Other"),
        }
    }
}

impl std::str::FromStr for Source {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Website" => Ok(Self::Website),
            "Referral" => Ok(Self::Referral),
            "Walk-in" => Ok(Self::WalkIn),
            "Call" => Ok(Self::Call),
            "Other" => Ok(Self::Other),
            other => Err(format!("unknown source: {other}")),
        }
    }
}

/// Funnel stage. `ALL` is the canonical display order used for per-status
/// counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    New,
    Qualified,
    Contacted,
    Visited,
    Negotiation,
    Converted,
    Dropped,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::New,
        Status::Qualified,
        Status::Contacted,
        Status::Visited,
        Status::Negotiation,
        Status::Converted,
        Status::Dropped,
    ];
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "New"),
            Self::Qualified => write!(f, "Qualified"),
            Self::Contacted => write!(f, "Contacted"),
            Self::Visited => write!(f, "Visited"),
            Self::Negotiation => write!(f, "Negotiation"),
            Self::Converted => write!(f, "Converted"),
            Self::Dropped => write!(f, "Dropped"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Qualified" => Ok(Self::Qualified),
            "Contacted" => Ok(Self::Contacted),
            "Visited" => Ok(Self::Visited),
            "Negotiation" => Ok(Self::Negotiation),
            "Converted" => Ok(Self::Converted),
            "Dropped" => Ok(Self::Dropped),
            other => Err(format!("unknown status: {other}")),
        }
    }
}
