//! Grading schemes: one immutable policy object per institution scheme year.
//!
//! A [`GradingScheme`] bundles everything that changes between scheme
//! revisions: the canonical credit table, the fallback credit rules, the
//! grade ladder, the pass mark, subject denominators, and the code and
//! identifier patterns. Schemes are injected into the pipeline through
//! [`crate::config::GpaConfig`]; nothing in the pipeline reads a global
//! table.
//!
//! Custom schemes are plain JSON:
//!
//! ```json
//! {
//!   "name": "vtu-2022-ec",
//!   "credit_table": { "BEC302": 4, "BECL305": 1 },
//!   "grade_ladder": {
//!     "bands": [
//!       { "letter": "O", "min_percentage": 90, "points": 10 },
//!       { "letter": "P", "min_percentage": 40, "points": 4 }
//!     ]
//!   }
//! }
//! ```
//!
//! Omitted fields take the VTU defaults.

use crate::error::Pdf2GpaError;
use crate::pipeline::credit::CreditRule;
use crate::pipeline::grade::GradeLadder;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the built-in scheme.
pub const VTU_2022: &str = "vtu-2022";

/// Letter prefix of 2–5 letters, three digits, optional trailing letter.
pub const DEFAULT_CODE_PATTERN: &str = r"\b[A-Z]{2,5}\d{3}[A-Z]?\b";

/// VTU university seat number, e.g. `1AA21EC045`.
pub const DEFAULT_IDENTIFIER_PATTERN: &str = r"\b[1-4][A-Z]{2}\d{2}[A-Z]{2,3}\d{3}\b";

/// A versioned, immutable grading policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingScheme {
    /// Identifier such as `vtu-2022`.
    pub name: String,

    /// Canonical credits per subject code.
    #[serde(default)]
    pub credit_table: BTreeMap<String, u32>,

    /// Ordered fallbacks for codes missing from `credit_table`.
    #[serde(default = "CreditRule::vtu_defaults")]
    pub credit_rules: Vec<CreditRule>,

    /// Credits when no rule matches.
    #[serde(default = "default_credits")]
    pub default_credits: u32,

    #[serde(default = "GradeLadder::vtu")]
    pub grade_ladder: GradeLadder,

    /// Minimum percentage that counts as a pass when the line carries no
    /// explicit P/F token.
    #[serde(default = "default_pass_percentage")]
    pub pass_percentage: f64,

    /// Maximum marks for subjects not graded out of 100 (e.g. 200 for the
    /// major project). Marks are rescaled to a 100-point basis before
    /// grading.
    #[serde(default)]
    pub denominators: BTreeMap<String, u16>,

    #[serde(default = "default_code_pattern")]
    pub code_pattern: String,

    #[serde(default = "default_identifier_pattern")]
    pub identifier_pattern: String,
}

fn default_credits() -> u32 {
    3
}

fn default_pass_percentage() -> f64 {
    40.0
}

fn default_code_pattern() -> String {
    DEFAULT_CODE_PATTERN.to_string()
}

fn default_identifier_pattern() -> String {
    DEFAULT_IDENTIFIER_PATTERN.to_string()
}

impl Default for GradingScheme {
    fn default() -> Self {
        Self::vtu_2022()
    }
}

impl GradingScheme {
    /// The VTU 2022 scheme with the electronics & communication table.
    pub fn vtu_2022() -> Self {
        #[rustfmt::skip]
        let table: &[(&str, u32)] = &[
            // First year: common courses
            ("BMATE101", 4), ("BPHYE102", 4), ("BCHEE102", 4), ("BCEDK103", 3),
            ("BENGK106", 1), ("BICOK107", 1), ("BIDTK158", 1),
            ("BMATE201", 4), ("BPHYE202", 4), ("BCHEE202", 4), ("BBEE203", 3),
            ("BPWSK206", 1), ("BKSKK207", 1), ("BSFHK258", 1),
            // Second year
            ("BMATE301", 4), ("BEC302", 4), ("BEC303", 3), ("BEC304", 3), ("BECL305", 1),
            ("BSCK306B", 1), ("BKSKK307", 1), ("BNSAK358", 1),
            ("BEC401", 3), ("BEC402", 4), ("BEC403", 3), ("BEC404", 3), ("BECL405", 1),
            ("BUHVK406", 1), ("BKSKK407", 1), ("BBOK408", 1), ("BAECK409", 1),
            // Third year
            ("BKSKK507", 1), ("BAECK508", 1), ("BAECK608", 1),
            // Final year
            ("BEC701", 3), ("BEC702", 3), ("BEC703", 3),
            ("BEC801", 1), ("BEC802", 1), ("BEC803", 8), ("BEC804", 1),
        ];

        Self {
            name: VTU_2022.to_string(),
            credit_table: table
                .iter()
                .map(|(code, credits)| (code.to_string(), *credits))
                .collect(),
            credit_rules: CreditRule::vtu_defaults(),
            default_credits: default_credits(),
            grade_ladder: GradeLadder::vtu(),
            pass_percentage: default_pass_percentage(),
            denominators: BTreeMap::from([("BEC803".to_string(), 200)]),
            code_pattern: default_code_pattern(),
            identifier_pattern: default_identifier_pattern(),
        }
    }

    /// Look up a built-in scheme by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            VTU_2022 | "vtu2022" | "vtu" => Some(Self::vtu_2022()),
            _ => None,
        }
    }

    /// Names accepted by [`GradingScheme::builtin`].
    pub fn builtin_names() -> &'static [&'static str] {
        &[VTU_2022]
    }

    /// Parse and validate a JSON scheme.
    pub fn from_json_str(json: &str) -> Result<Self, Pdf2GpaError> {
        let scheme: Self = serde_json::from_str(json).map_err(|e| Pdf2GpaError::InvalidScheme {
            name: "<json>".into(),
            reason: e.to_string(),
        })?;
        scheme.validate()?;
        Ok(scheme)
    }

    /// Read, parse and validate a JSON scheme file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Pdf2GpaError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Pdf2GpaError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Pdf2GpaError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Pdf2GpaError::InvalidScheme {
                name: path.display().to_string(),
                reason: e.to_string(),
            },
        })?;
        Self::from_json_str(&json).map_err(|e| match e {
            Pdf2GpaError::InvalidScheme { reason, .. } => Pdf2GpaError::InvalidScheme {
                name: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Check every invariant the pipeline relies on.
    pub fn validate(&self) -> Result<(), Pdf2GpaError> {
        let invalid = |reason: String| Pdf2GpaError::InvalidScheme {
            name: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("scheme name is empty".into()));
        }
        self.grade_ladder.validate().map_err(invalid)?;

        if self.default_credits == 0 {
            return Err(invalid("default credits must be positive".into()));
        }
        if let Some((code, _)) = self.credit_table.iter().find(|(_, &c)| c == 0) {
            return Err(invalid(format!("credit table gives {code} zero credits")));
        }
        if let Some(rule) = self.credit_rules.iter().find(|r| r.credits() == 0) {
            return Err(invalid(format!("{} rule gives zero credits", rule.kind())));
        }
        if let Some((code, _)) = self.denominators.iter().find(|(_, &d)| d == 0) {
            return Err(invalid(format!("denominator for {code} is zero")));
        }
        if !(0.0..=100.0).contains(&self.pass_percentage) {
            return Err(invalid(format!(
                "pass percentage {} is outside 0–100",
                self.pass_percentage
            )));
        }

        Regex::new(&self.code_pattern)
            .map_err(|e| invalid(format!("code pattern does not compile: {e}")))?;
        Regex::new(&self.identifier_pattern)
            .map_err(|e| invalid(format!("identifier pattern does not compile: {e}")))?;

        Ok(())
    }
}
