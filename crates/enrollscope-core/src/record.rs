//! Enrollment records and the typed attribute accessors used to group them.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One student-program-year entry, as stored in the enrollment CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    #[serde(rename = "Person ID")]
    pub person_id: String,
    #[serde(rename = "Program (name)", default)]
    pub program_name: Option<String>,
    #[serde(rename = "Code")]
    pub program_code: String,
    #[serde(rename = "Acad Yr (start)")]
    pub academic_year: i32,
    #[serde(rename = "Grade at Time of Activity")]
    pub grade: u8,
    #[serde(rename = "Program (Gender)", default)]
    pub gender_qualifier: Option<String>,
    #[serde(rename = "Program (Level)", default)]
    pub level_qualifier: Option<String>,
    #[serde(rename = "Gender code", default)]
    pub gender: Option<String>,
    #[serde(rename = "Race/ethnicity", default)]
    pub race_ethnicity: Option<String>,
    #[serde(rename = "FA", default)]
    pub financial_aid: Option<String>,
}

impl EnrollmentRecord {
    /// Minimal record with no qualifiers or demographics.
    pub fn new(
        person_id: impl Into<String>,
        program_name: impl Into<String>,
        program_code: impl Into<String>,
        academic_year: i32,
        grade: u8,
    ) -> Self {
        Self {
            person_id: person_id.into(),
            program_name: Some(program_name.into()),
            program_code: program_code.into(),
            academic_year,
            grade,
            gender_qualifier: None,
            level_qualifier: None,
            gender: None,
            race_ethnicity: None,
            financial_aid: None,
        }
    }

    pub fn with_gender_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.gender_qualifier = Some(qualifier.into());
        self
    }

    pub fn with_level_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.level_qualifier = Some(qualifier.into());
        self
    }

    /// Display key of the program variant: gender qualifier, level qualifier
    /// and program name, space-joined as given, skipping absent or empty parts.
    ///
    /// Pure: the same record always yields the same string.
    pub fn full_name(&self) -> String {
        [
            self.gender_qualifier.as_deref(),
            self.level_qualifier.as_deref(),
            self.program_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// A record paired with its derived full program name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    #[serde(flatten)]
    pub record: EnrollmentRecord,
    #[serde(rename = "Full name")]
    pub full_name: String,
}

impl Enrollment {
    pub fn new(record: EnrollmentRecord) -> Self {
        let full_name = record.full_name();
        Self { record, full_name }
    }

    pub fn person_id(&self) -> &str {
        &self.record.person_id
    }
}

impl From<EnrollmentRecord> for Enrollment {
    fn from(record: EnrollmentRecord) -> Self {
        Self::new(record)
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// A groupable column of an enrollment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Gender,
    RaceEthnicity,
    FinancialAid,
    Grade,
    ProgramLevel,
    ProgramCode,
    ProgramName,
    AcademicYear,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::Gender,
        Attribute::RaceEthnicity,
        Attribute::FinancialAid,
        Attribute::Grade,
        Attribute::ProgramLevel,
        Attribute::ProgramCode,
        Attribute::ProgramName,
        Attribute::AcademicYear,
    ];

    /// Parse a short key (`gender`, `race`, `fa`, `grade`, `level`, `code`,
    /// `program`, `year`).
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "gender" => Some(Self::Gender),
            "race" | "race_ethnicity" | "ethnicity" => Some(Self::RaceEthnicity),
            "fa" | "financial_aid" => Some(Self::FinancialAid),
            "grade" => Some(Self::Grade),
            "level" | "program_level" => Some(Self::ProgramLevel),
            "code" | "program_code" => Some(Self::ProgramCode),
            "program" | "program_name" | "name" => Some(Self::ProgramName),
            "year" | "academic_year" => Some(Self::AcademicYear),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::RaceEthnicity => "race",
            Self::FinancialAid => "fa",
            Self::Grade => "grade",
            Self::ProgramLevel => "level",
            Self::ProgramCode => "code",
            Self::ProgramName => "program",
            Self::AcademicYear => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Gender => "Gender",
            Self::RaceEthnicity => "Race/Ethnicity",
            Self::FinancialAid => "Financial Aid Status",
            Self::Grade => "Grade",
            Self::ProgramLevel => "Program Level",
            Self::ProgramCode => "Program Code",
            Self::ProgramName => "Program",
            Self::AcademicYear => "Academic Year",
        }
    }

    /// The attribute's value on a record, or `None` when absent.
    pub fn value(self, record: &EnrollmentRecord) -> Option<String> {
        let text = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        match self {
            Self::Gender => text(&record.gender),
            Self::RaceEthnicity => text(&record.race_ethnicity),
            Self::FinancialAid => text(&record.financial_aid),
            Self::Grade => Some(record.grade.to_string()),
            Self::ProgramLevel => text(&record.level_qualifier),
            Self::ProgramCode => Some(record.program_code.clone()),
            Self::ProgramName => text(&record.program_name),
            Self::AcademicYear => Some(record.academic_year.to_string()),
        }
    }

    /// Like [`Attribute::value`], with absent values grouped as `"Unknown"`.
    pub fn group_value(self, record: &EnrollmentRecord) -> String {
        self.value(record).unwrap_or_else(|| UNKNOWN_GROUP.to_string())
    }
}

/// Group label for records missing a grouping attribute.
pub const UNKNOWN_GROUP: &str = "Unknown";
