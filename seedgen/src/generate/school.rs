//! School generation: unique names, registry records and table naming.

use std::collections::HashSet;

use rand::Rng;
use uuid::Uuid;

use crate::types::{FieldValue, Record, TableName};

const NAME_PREFIXES: &[&str] = &[
    "St.", "Holy", "Sacred", "Divine", "Blessed", "Mount", "Little", "Bright", "Golden",
    "Silver", "Green", "Blue", "Red", "New", "Modern", "Progressive", "Advanced", "Premier",
    "Elite", "Excellence", "Victory", "Success", "Wisdom", "Knowledge", "Learning", "Future",
    "Hope", "Dream", "Star", "Sun", "Moon", "Rainbow", "Crystal", "Diamond", "Pearl", "Emerald",
    "Ruby", "Sapphire", "Lotus", "Rose",
];

const NAME_MIDDLES: &[&str] = &[
    "Angels", "Mary", "Xavier", "Francis", "Joseph", "Michael", "Gabriel", "Paul", "Peter",
    "John", "Thomas", "Anthony", "Stephen", "Lawrence", "Vincent", "Augustine", "Benedict",
    "Dominic", "Carmel", "Teresa", "Agnes", "Catherine", "Margaret", "Elizabeth", "Anne",
    "Grace", "Faith", "Hope", "Joy", "Peace", "Light", "Dawn", "Morning", "Evening", "Spring",
    "Summer", "Autumn", "Winter", "Valley", "Hills", "Heights", "Gardens", "Park", "Grove",
    "Woods", "Forest", "River", "Lake", "Ocean",
];

const NAME_SUFFIXES: &[&str] = &[
    "Public School", "Higher Secondary School", "High School", "Senior Secondary School",
    "English Medium School", "Model School", "International School", "Academy", "Institute",
    "Educational Institute", "Learning Center", "Study Center", "Knowledge Hub", "Vidyalaya",
    "Vidya Mandir", "Vidya Niketan", "Vidya Bhawan", "Vidya Kendra", "Shiksha Niketan",
    "Bal Vidyalaya", "Convent School", "Mission School", "Memorial School", "Foundation School",
];

/// Probability that a school name skips its middle part.
const SKIP_MIDDLE_PROBABILITY: f64 = 0.3;

/// A generated school and its per-school student table.
#[derive(Debug, Clone)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub student_table: TableName,
}

impl School {
    /// The school's row in the school registry table.
    pub fn registry_record(&self, table: TableName) -> Record {
        Record::new(
            table,
            vec![
                ("school_uuid", FieldValue::Uuid(self.id)),
                ("school_name", FieldValue::Text(self.name.clone())),
            ],
        )
    }
}

/// Derives the per-school student table name from the school's display name.
///
/// Lowercases, replaces every non-alphanumeric run with a single underscore
/// and strips leading and trailing underscores, so `St. Mary's Academy`
/// becomes `students_st_mary_s_academy`.
pub fn student_table_name(school_name: &str) -> TableName {
    let mut sanitized = String::with_capacity(school_name.len());
    let mut last_was_underscore = false;
    for c in school_name.chars() {
        if c.is_ascii_alphanumeric() {
            sanitized.extend(c.to_lowercase());
            last_was_underscore = false;
        } else if !last_was_underscore && !sanitized.is_empty() {
            sanitized.push('_');
            last_was_underscore = true;
        }
    }
    if sanitized.ends_with('_') {
        sanitized.pop();
    }

    TableName::new(format!("students_{sanitized}"))
}

/// Generates schools with unique display names.
#[derive(Debug, Default)]
pub struct SchoolGenerator {
    used_names: HashSet<String>,
}

impl SchoolGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates one school, retrying name collisions.
    ///
    /// The name space (40 prefixes x 48 middles x 24 suffixes) is far larger
    /// than the school cap, so collisions stay rare and this terminates
    /// quickly in practice.
    pub fn generate<R: Rng>(&mut self, rng: &mut R) -> School {
        let name = loop {
            let candidate = random_name(rng);
            if self.used_names.insert(candidate.clone()) {
                break candidate;
            }
        };

        let student_table = student_table_name(&name);
        School {
            id: Uuid::new_v4(),
            name,
            student_table,
        }
    }
}

fn random_name<R: Rng>(rng: &mut R) -> String {
    let prefix = NAME_PREFIXES[rng.gen_range(0..NAME_PREFIXES.len())];
    let suffix = NAME_SUFFIXES[rng.gen_range(0..NAME_SUFFIXES.len())];

    if rng.gen_bool(SKIP_MIDDLE_PROBABILITY) {
        format!("{prefix} {suffix}")
    } else {
        let middle = NAME_MIDDLES[rng.gen_range(0..NAME_MIDDLES.len())];
        format!("{prefix} {middle} {suffix}")
    }
}
