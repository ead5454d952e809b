use serde::Deserialize;

use crate::shared::{PgConnectionConfig, PipelineConfig, ValidationError};

/// Upper bound on the number of schools a single run may generate.
pub const MAX_SCHOOLS: u64 = 10_000;

/// Where generated records are persisted.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationConfig {
    /// In-memory destination, useful for dry runs and tests.
    Memory,
    /// Postgres destination with one table per school.
    Postgres {
        #[serde(flatten)]
        connection: PgConnectionConfig,
    },
}

/// Shape of the data set to generate: how many schools, and how each school
/// is subdivided into classes, sections, and students.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PlanConfig {
    /// Number of schools to generate, capped at [`MAX_SCHOOLS`].
    pub schools: u64,
    /// Number of classes per school (class 1 through `classes`).
    pub classes: u32,
    /// Number of sections per class (section A onward).
    pub sections: u32,
    /// Number of students per section.
    pub students_per_section: u32,
}

impl PlanConfig {
    /// Total number of students across all schools.
    pub fn total_students(&self) -> u64 {
        self.schools
            * u64::from(self.classes)
            * u64::from(self.sections)
            * u64::from(self.students_per_section)
    }

    /// Validates plan settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schools == 0 || self.schools > MAX_SCHOOLS {
            return Err(ValidationError::invalid(
                "plan.schools",
                "must be between 1 and 10000",
            ));
        }

        for (field, value) in [
            ("plan.classes", self.classes),
            ("plan.sections", self.sections),
            ("plan.students_per_section", self.students_per_section),
        ] {
            if value == 0 {
                return Err(ValidationError::invalid(field, "must be greater than 0"));
            }
        }

        // Section letters run A..Z.
        if self.sections > 26 {
            return Err(ValidationError::invalid("plan.sections", "must be at most 26"));
        }

        Ok(())
    }
}

/// Top-level configuration for the seeder binary.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SeederConfig {
    /// Ingestion pipeline settings.
    pub pipeline: PipelineConfig,
    /// Destination selection and credentials.
    pub destination: DestinationConfig,
    /// Generation plan.
    pub plan: PlanConfig,
}

impl SeederConfig {
    /// Validates the whole seeder configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pipeline.validate()?;
        self.plan.validate()?;

        if let DestinationConfig::Postgres { connection } = &self.destination {
            connection.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_totals_multiply_out() {
        let plan = PlanConfig {
            schools: 3,
            classes: 12,
            sections: 4,
            students_per_section: 30,
        };
        assert_eq!(plan.total_students(), 3 * 12 * 4 * 30);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn school_cap_is_enforced() {
        let plan = PlanConfig {
            schools: MAX_SCHOOLS + 1,
            classes: 1,
            sections: 1,
            students_per_section: 1,
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn sections_beyond_alphabet_are_rejected() {
        let plan = PlanConfig {
            schools: 1,
            classes: 1,
            sections: 27,
            students_per_section: 1,
        };
        assert!(plan.validate().is_err());
    }
}
