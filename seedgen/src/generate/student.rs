//! Student record generation with weighted demographics and unique
//! identifiers.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use rand::Rng;

use schoolseed_config::shared::CacheConfig;

use crate::bail;
use crate::cache::UniquenessCache;
use crate::error::{ErrorKind, SeedResult};
use crate::generate::names::{FIRST_NAMES, LAST_NAMES};
use crate::generate::school::School;
use crate::generate::SeatAssignment;
use crate::types::{FieldValue, Record};

/// Class 1 admission age; each higher class adds one year.
const BASE_ADMISSION_AGE: i32 = 5;

const BLOOD_GROUPS: &[(&str, f64)] = &[
    ("A+", 0.15),
    ("A-", 0.05),
    ("B+", 0.15),
    ("B-", 0.05),
    ("AB+", 0.10),
    ("AB-", 0.02),
    ("O+", 0.45),
    ("O-", 0.03),
];

const RELIGIONS: &[(&str, f64)] = &[
    ("Hindu", 0.80),
    ("Muslim", 0.14),
    ("Christian", 0.02),
    ("Sikh", 0.02),
    ("Buddhist", 0.008),
    ("Jain", 0.004),
    ("Other", 0.028),
];

const OCCUPATIONS: &[&str] = &[
    "Software Engineer", "Doctor", "Teacher", "Businessman", "Government Employee", "Lawyer",
    "Engineer", "Accountant", "Banker", "Consultant", "Manager", "Sales Executive",
    "Marketing Manager", "Farmer", "Police Officer", "Army Officer", "Nurse", "Pharmacist",
    "Architect", "Civil Engineer", "Mechanical Engineer", "Electrical Engineer", "CA",
    "Professor", "Principal", "Shopkeeper", "Contractor", "Real Estate Agent",
    "Insurance Agent", "Chef", "Driver", "Technician", "Artist", "Writer", "Journalist",
    "Photographer",
];

const CONCESSION_PROBABILITY: f64 = 0.25;

const CONCESSION_TYPES: &[&str] = &[
    "SC/ST Quota", "OBC Quota", "EWS Quota", "Physically Disabled", "Single Parent",
    "Below Poverty Line", "Merit Scholarship", "Sports Quota", "Defence Personnel",
    "Ex-Serviceman",
];

const MEDICAL_CONDITION_PROBABILITY: f64 = 0.15;

const MEDICAL_CONDITIONS: &[&str] = &[
    "Asthma", "Diabetes Type 1", "Epilepsy", "ADHD", "Dyslexia", "Heart Condition", "Allergies",
    "Vision Impairment", "Hearing Impairment", "Autism Spectrum", "Learning Disability",
    "Speech Disorder",
];

/// The uniqueness caches shared by every producer of one pipeline run.
#[derive(Debug)]
pub struct GenerationCaches {
    phones: UniquenessCache,
    national_ids: UniquenessCache,
    name_pairs: UniquenessCache,
    max_attempts: u32,
}

impl GenerationCaches {
    pub fn new(config: &CacheConfig) -> Arc<Self> {
        Arc::new(Self {
            phones: UniquenessCache::new("phone", config.phone_capacity),
            national_ids: UniquenessCache::new("national_id", config.national_id_capacity),
            name_pairs: UniquenessCache::new("name_pair", config.name_pair_capacity),
            max_attempts: config.max_generation_attempts,
        })
    }
}

/// Generates complete student records for a seat in a school.
#[derive(Debug, Clone)]
pub struct StudentGenerator {
    caches: Arc<GenerationCaches>,
}

impl StudentGenerator {
    pub fn new(caches: Arc<GenerationCaches>) -> Self {
        Self { caches }
    }

    /// Generates one student record targeting the school's student table.
    ///
    /// Field order matches the student table's column order.
    pub fn generate<R: Rng>(
        &self,
        rng: &mut R,
        school: &School,
        seat: SeatAssignment,
    ) -> SeedResult<Record> {
        let max_attempts = self.caches.max_attempts;

        let full_name = self.caches.name_pairs.generate_unique(max_attempts, || {
            format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES))
        })?;
        let guardian_name = guardian_name(rng, &full_name)?;

        let student_uuid = uuid_from_rng(rng);
        let gender = if rng.gen_bool(0.5) { "Male" } else { "Female" };
        let blood_group = pick_weighted(rng, BLOOD_GROUPS);
        let birth_date = date_of_birth(rng, seat.class)?;
        let national_id = self
            .caches
            .national_ids
            .generate_unique(max_attempts, || random_national_id(rng))?;
        let religion = pick_weighted(rng, RELIGIONS);
        let parent_occupation = pick(rng, OCCUPATIONS);

        let concession_needed = rng.gen_bool(CONCESSION_PROBABILITY);
        let concession_type = concession_needed.then(|| pick(rng, CONCESSION_TYPES).to_owned());
        let medical_condition = rng
            .gen_bool(MEDICAL_CONDITION_PROBABILITY)
            .then(|| pick(rng, MEDICAL_CONDITIONS).to_owned());

        let student_phone = self
            .caches
            .phones
            .generate_unique(max_attempts, || random_phone(rng))?;
        let guardian_phone = self
            .caches
            .phones
            .generate_unique(max_attempts, || random_phone(rng))?;

        let image_url = image_url(&school.name, &student_uuid);

        Ok(Record::new(
            school.student_table.clone(),
            vec![
                ("student_uuid", FieldValue::Uuid(student_uuid)),
                ("full_name", FieldValue::Text(full_name)),
                ("guardian_name", FieldValue::Text(guardian_name)),
                ("gender", FieldValue::Text(gender.to_owned())),
                ("blood_group", FieldValue::Text(blood_group.to_owned())),
                ("birth_date", FieldValue::Date(birth_date)),
                ("national_id", FieldValue::Text(national_id)),
                ("class_name", FieldValue::Text(format!("Class {}", seat.class))),
                ("section", FieldValue::Text(seat.section.to_string())),
                ("roll_no", FieldValue::Int(seat.roll_no)),
                ("religion", FieldValue::Text(religion.to_owned())),
                (
                    "parent_occupation",
                    FieldValue::Text(parent_occupation.to_owned()),
                ),
                ("concession_needed", FieldValue::Bool(concession_needed)),
                ("concession_type", FieldValue::OptionalText(concession_type)),
                (
                    "medical_condition",
                    FieldValue::OptionalText(medical_condition),
                ),
                ("student_phone", FieldValue::Text(student_phone)),
                ("guardian_phone", FieldValue::Text(guardian_phone)),
                ("image_url", FieldValue::Text(image_url)),
            ],
        ))
    }
}

fn uuid_from_rng<R: Rng>(rng: &mut R) -> uuid::Uuid {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

fn pick<'a, R: Rng>(rng: &mut R, pool: &'a [&'a str]) -> &'a str {
    pool[rng.gen_range(0..pool.len())]
}

fn pick_weighted<'a, R: Rng>(rng: &mut R, table: &'a [(&'a str, f64)]) -> &'a str {
    let roll: f64 = rng.r#gen();
    let mut cumulative = 0.0;
    for (value, weight) in table {
        cumulative += weight;
        if roll <= cumulative {
            return value;
        }
    }

    // Weights may sum to slightly under 1.0; fall back to the last entry.
    table[table.len() - 1].0
}

/// The guardian shares the student's surname but has a different first name.
fn guardian_name<R: Rng>(rng: &mut R, full_name: &str) -> SeedResult<String> {
    let Some((first, last)) = full_name.split_once(' ') else {
        bail!(
            ErrorKind::InvalidRecord,
            "Malformed student name",
            format!("'{full_name}' is not a first/last pair")
        );
    };

    let guardian_first = loop {
        let candidate = pick(rng, FIRST_NAMES);
        if candidate != first {
            break candidate;
        }
    };

    Ok(format!("{guardian_first} {last}"))
}

/// Birth date consistent with the student's class: class 1 students are 5,
/// each higher class adds a year. Day of month respects month lengths and
/// leap years.
fn date_of_birth<R: Rng>(rng: &mut R, class: u32) -> SeedResult<NaiveDate> {
    let age = BASE_ADMISSION_AGE + class as i32 - 1;
    let birth_year = Utc::now().year() - age;

    let month = rng.gen_range(1..=12u32);
    let max_day = match month {
        2 if is_leap_year(birth_year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    };
    let day = rng.gen_range(1..=max_day);

    match NaiveDate::from_ymd_opt(birth_year, month, day) {
        Some(date) => Ok(date),
        None => bail!(
            ErrorKind::InvalidRecord,
            "Generated an invalid birth date",
            format!("{birth_year:04}-{month:02}-{day:02}")
        ),
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// A ten digit Indian mobile number with country code, e.g. `+919876543210`.
fn random_phone<R: Rng>(rng: &mut R) -> String {
    let mut phone = String::with_capacity(13);
    phone.push_str("+91");
    phone.push(char::from(b'0' + rng.gen_range(6..=9u8)));
    for _ in 0..9 {
        phone.push(char::from(b'0' + rng.gen_range(0..=9u8)));
    }
    phone
}

/// Twelve random digits grouped as `XXXX XXXX XXXX`.
fn random_national_id<R: Rng>(rng: &mut R) -> String {
    let mut id = String::with_capacity(14);
    for group in 0..3 {
        if group > 0 {
            id.push(' ');
        }
        for _ in 0..4 {
            id.push(char::from(b'0' + rng.gen_range(0..=9u8)));
        }
    }
    id
}

fn image_url(school_name: &str, student_uuid: &uuid::Uuid) -> String {
    let encoded: String = school_name
        .chars()
        .filter_map(|c| match c {
            ' ' => Some("%20".to_owned()),
            '.' | '\'' => None,
            other => Some(other.to_string()),
        })
        .collect();

    format!("minio.studentdata.tech/{encoded}/{student_uuid}/profile.png")
}
