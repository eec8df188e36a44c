//! Coverage selections and issued document handles
//!
//! A rental can carry any combination of four independent add-ons. The
//! selection is captured once at quote time and replayed verbatim during
//! payment recovery.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Coverage add-ons offered by the underwriting provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageCode {
    /// Collision damage waiver
    Cdw,
    /// Rental car liability insurance
    Rcli,
    /// Supplemental liability insurance
    Sli,
    /// Personal accident insurance
    Pai,
}

impl CoverageCode {
    /// All coverage codes in a stable order
    pub const ALL: [CoverageCode; 4] = [
        CoverageCode::Cdw,
        CoverageCode::Rcli,
        CoverageCode::Sli,
        CoverageCode::Pai,
    ];

    /// Wire code used by the provider and in persisted snapshots
    pub fn code(&self) -> &'static str {
        match self {
            CoverageCode::Cdw => "cdw",
            CoverageCode::Rcli => "rcli",
            CoverageCode::Sli => "sli",
            CoverageCode::Pai => "pai",
        }
    }

    /// Human-readable name used in notifications
    pub fn display_name(&self) -> &'static str {
        match self {
            CoverageCode::Cdw => "Collision Damage Waiver",
            CoverageCode::Rcli => "Rental Car Liability",
            CoverageCode::Sli => "Supplemental Liability",
            CoverageCode::Pai => "Personal Accident",
        }
    }
}

impl fmt::Display for CoverageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which coverages the renter selected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSelection {
    #[serde(default)]
    pub cdw: bool,
    #[serde(default)]
    pub rcli: bool,
    #[serde(default)]
    pub sli: bool,
    #[serde(default)]
    pub pai: bool,
}

impl CoverageSelection {
    /// Builds a selection from the given codes
    pub fn of(codes: &[CoverageCode]) -> Self {
        let mut selection = Self::default();
        for code in codes {
            selection.set(*code, true);
        }
        selection
    }

    /// Returns whether the given coverage is selected
    pub fn is_selected(&self, code: CoverageCode) -> bool {
        match code {
            CoverageCode::Cdw => self.cdw,
            CoverageCode::Rcli => self.rcli,
            CoverageCode::Sli => self.sli,
            CoverageCode::Pai => self.pai,
        }
    }

    /// Sets the flag for one coverage
    pub fn set(&mut self, code: CoverageCode, selected: bool) {
        match code {
            CoverageCode::Cdw => self.cdw = selected,
            CoverageCode::Rcli => self.rcli = selected,
            CoverageCode::Sli => self.sli = selected,
            CoverageCode::Pai => self.pai = selected,
        }
    }

    /// Selected coverage codes in stable order
    pub fn selected(&self) -> Vec<CoverageCode> {
        CoverageCode::ALL
            .into_iter()
            .filter(|code| self.is_selected(*code))
            .collect()
    }

    /// True when at least one coverage flag is set
    pub fn any(&self) -> bool {
        CoverageCode::ALL.iter().any(|code| self.is_selected(*code))
    }
}

/// Provider document handles per issued coverage
pub type DocumentHandles = BTreeMap<CoverageCode, String>;

/// Persisted coverage snapshot: the selection plus any documents issued
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageTypes {
    pub selection: CoverageSelection,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub documents: DocumentHandles,
}

impl CoverageTypes {
    pub fn new(selection: CoverageSelection) -> Self {
        Self {
            selection,
            documents: DocumentHandles::new(),
        }
    }

    /// Merges document handles, keeping existing ones the update omits
    pub fn merge_documents(&mut self, documents: &DocumentHandles) {
        for (code, handle) in documents {
            self.documents.insert(*code, handle.clone());
        }
    }
}
