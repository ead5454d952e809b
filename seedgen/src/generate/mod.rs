//! Synthetic data generation: schools, students and seat assignment.

pub mod names;
pub mod school;
pub mod student;

pub use school::{School, SchoolGenerator, student_table_name};
pub use student::{GenerationCaches, StudentGenerator};

use schoolseed_config::shared::PlanConfig;

/// The class, section and roll number assigned to one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatAssignment {
    /// 1-based class number.
    pub class: u32,
    /// Section letter, `A` onwards.
    pub section: char,
    pub roll_no: i32,
}

/// Walks the seating plan in deterministic order.
///
/// Roll numbers advance fastest, then sections, then classes, then schools:
/// school 0 is filled completely before school 1 receives its first student.
/// The cursor wraps back to the first school if asked for more seats than the
/// plan holds.
#[derive(Debug)]
pub struct PlanCursor {
    classes: u32,
    sections: u32,
    students_per_section: u32,
    schools: u64,
    school_index: u64,
    class: u32,
    section_index: u32,
    roll_no: u32,
}

impl PlanCursor {
    pub fn new(plan: &PlanConfig) -> Self {
        Self {
            classes: plan.classes,
            sections: plan.sections,
            students_per_section: plan.students_per_section,
            schools: plan.schools,
            school_index: 0,
            class: 1,
            section_index: 0,
            roll_no: 1,
        }
    }

    /// Returns the next seat and advances the cursor.
    pub fn next_seat(&mut self) -> (u64, SeatAssignment) {
        let seat = (
            self.school_index,
            SeatAssignment {
                class: self.class,
                section: section_letter(self.section_index),
                roll_no: self.roll_no as i32,
            },
        );

        self.roll_no += 1;
        if self.roll_no > self.students_per_section {
            self.roll_no = 1;
            self.section_index += 1;
            if self.section_index >= self.sections {
                self.section_index = 0;
                self.class += 1;
                if self.class > self.classes {
                    self.class = 1;
                    self.school_index += 1;
                    if self.school_index >= self.schools {
                        self.school_index = 0;
                    }
                }
            }
        }

        seat
    }
}

fn section_letter(index: u32) -> char {
    // Sections are validated to stay within A..=Z.
    char::from(b'A' + (index % 26) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(schools: u64, classes: u32, sections: u32, students_per_section: u32) -> PlanConfig {
        PlanConfig {
            schools,
            classes,
            sections,
            students_per_section,
        }
    }

    #[test]
    fn roll_numbers_advance_first() {
        let mut cursor = PlanCursor::new(&plan(2, 2, 2, 2));

        let (school, seat) = cursor.next_seat();
        assert_eq!((school, seat.class, seat.section, seat.roll_no), (0, 1, 'A', 1));
        let (school, seat) = cursor.next_seat();
        assert_eq!((school, seat.class, seat.section, seat.roll_no), (0, 1, 'A', 2));
        let (school, seat) = cursor.next_seat();
        assert_eq!((school, seat.class, seat.section, seat.roll_no), (0, 1, 'B', 1));
    }

    #[test]
    fn sections_then_classes_then_schools_advance() {
        let plan = plan(2, 2, 2, 1);
        let mut cursor = PlanCursor::new(&plan);

        let seats: Vec<_> = (0..plan.total_students()).map(|_| cursor.next_seat()).collect();
        assert_eq!(seats[0], (0, SeatAssignment { class: 1, section: 'A', roll_no: 1 }));
        assert_eq!(seats[1], (0, SeatAssignment { class: 1, section: 'B', roll_no: 1 }));
        assert_eq!(seats[2], (0, SeatAssignment { class: 2, section: 'A', roll_no: 1 }));
        assert_eq!(seats[3], (0, SeatAssignment { class: 2, section: 'B', roll_no: 1 }));
        assert_eq!(seats[4], (1, SeatAssignment { class: 1, section: 'A', roll_no: 1 }));
    }

    #[test]
    fn cursor_wraps_past_the_last_school() {
        let plan = plan(1, 1, 1, 1);
        let mut cursor = PlanCursor::new(&plan);
        cursor.next_seat();
        assert_eq!(cursor.next_seat().0, 0);
    }
}
